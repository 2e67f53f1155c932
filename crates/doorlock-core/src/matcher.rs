//! Sequence matcher: turns a stream of gesture symbols into match events
//! against a fixed target sequence.

use crate::clock::{Clock, MonotonicClock};
use crate::error::{DoorlockError, Result};
use crate::types::GestureSymbol;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// TargetSequence
// ---------------------------------------------------------------------------

/// The secret sequence of finger counts. Never empty, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct TargetSequence(Vec<u8>);

impl TargetSequence {
    pub fn new(symbols: Vec<u8>) -> Result<Self> {
        if symbols.is_empty() {
            return Err(DoorlockError::EmptySequence);
        }
        Ok(Self(symbols))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Default for TargetSequence {
    fn default() -> Self {
        Self(vec![0, 1, 0, 5])
    }
}

impl TryFrom<Vec<u8>> for TargetSequence {
    type Error = DoorlockError;

    fn try_from(value: Vec<u8>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TargetSequence> for Vec<u8> {
    fn from(value: TargetSequence) -> Self {
        value.0
    }
}

impl fmt::Display for TargetSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// MatchEvent / Progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "cursor", rename_all = "snake_case")]
pub enum MatchEvent {
    NoChange,
    Advanced(usize),
    Matched,
    Mismatched,
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchEvent::NoChange => f.write_str("no_change"),
            MatchEvent::Advanced(cursor) => write!(f, "advanced({cursor})"),
            MatchEvent::Matched => f.write_str("matched"),
            MatchEvent::Mismatched => f.write_str("mismatched"),
        }
    }
}

/// How far into the target the user currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub cursor: usize,
    pub len: usize,
}

// ---------------------------------------------------------------------------
// SequenceMatcher
// ---------------------------------------------------------------------------

pub struct SequenceMatcher<C: Clock = MonotonicClock> {
    target: TargetSequence,
    cursor: usize,
    last_accepted: Option<u8>,
    last_accepted_at: Duration,
    idle_timeout: Option<Duration>,
    clock: C,
}

impl SequenceMatcher<MonotonicClock> {
    pub fn new(target: TargetSequence) -> Self {
        Self::with_clock(target, MonotonicClock::new())
    }
}

impl<C: Clock> SequenceMatcher<C> {
    pub fn with_clock(target: TargetSequence, clock: C) -> Self {
        let now = clock.now();
        Self {
            target,
            cursor: 0,
            last_accepted: None,
            last_accepted_at: now,
            idle_timeout: None,
            clock,
        }
    }

    /// Abandon partial progress when no accepted symbol arrives within `window`.
    pub fn with_idle_timeout(mut self, window: Option<Duration>) -> Self {
        self.idle_timeout = window;
        self
    }

    pub fn target(&self) -> &TargetSequence {
        &self.target
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn progress(&self) -> Progress {
        Progress {
            cursor: self.cursor,
            len: self.target.len(),
        }
    }

    /// Drop all progress and debounce history.
    fn reset(&mut self) {
        self.cursor = 0;
        self.last_accepted = None;
    }

    pub fn observe(&mut self, symbol: GestureSymbol) -> MatchEvent {
        let now = self.clock.now();

        if self.idle_expired(now) {
            info!(
                cursor = self.cursor,
                "sequence idle timeout, discarding progress"
            );
            self.reset();
            // A gesture arriving after the timeout opens a fresh attempt.
            if symbol.is_none() {
                return MatchEvent::Mismatched;
            }
        }

        let GestureSymbol::Fingers(n) = symbol else {
            return MatchEvent::NoChange;
        };
        if self.last_accepted == Some(n) {
            return MatchEvent::NoChange;
        }

        self.last_accepted = Some(n);
        self.last_accepted_at = now;

        if self.target.get(self.cursor) == Some(n) {
            self.cursor += 1;
            if self.cursor == self.target.len() {
                info!(target_len = self.target.len(), "sequence matched");
                self.cursor = 0;
                MatchEvent::Matched
            } else {
                debug!(
                    symbol = n,
                    cursor = self.cursor,
                    remaining = self.target.len() - self.cursor,
                    "partial match"
                );
                MatchEvent::Advanced(self.cursor)
            }
        } else {
            debug!(symbol = n, cursor = self.cursor, "wrong symbol, resetting");
            self.cursor = 0;
            MatchEvent::Mismatched
        }
    }

    fn idle_expired(&self, now: Duration) -> bool {
        match self.idle_timeout {
            Some(window) if self.cursor > 0 => now.saturating_sub(self.last_accepted_at) > window,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
