//! Majority-vote smoothing of raw per-frame finger counts.

use crate::types::GestureSymbol;
use std::collections::VecDeque;
use tracing::{debug, warn};

pub const DEFAULT_BUFFER_SIZE: usize = 10;
pub const DEFAULT_VOTE_WINDOW: usize = 5;

/// Turns noisy per-frame counts into a stable [`GestureSymbol`].
///
/// The stable count is the most frequent value among the last `vote_window`
/// readings. Nothing is reported until that many readings have arrived since
/// the hand appeared.
#[derive(Debug, Clone)]
pub struct GestureStabilizer {
    buffer: VecDeque<u8>,
    buffer_size: usize,
    vote_window: usize,
    max_fingers: u8,
    stable: Option<u8>,
    changes: u64,
}

impl GestureStabilizer {
    pub fn new(buffer_size: usize, vote_window: usize, max_fingers: u8) -> Self {
        let buffer_size = buffer_size.max(1);
        Self {
            buffer: VecDeque::with_capacity(buffer_size),
            buffer_size,
            vote_window: vote_window.clamp(1, buffer_size),
            max_fingers,
            stable: None,
            changes: 0,
        }
    }

    pub fn stable(&self) -> GestureSymbol {
        self.stable.into()
    }

    /// Number of times the stable count moved to a new value.
    pub fn changes(&self) -> u64 {
        self.changes
    }

    pub fn feed(&mut self, raw: Option<u8>) -> GestureSymbol {
        let Some(count) = raw else {
            if self.stable.is_some() || !self.buffer.is_empty() {
                debug!("hand withdrawn");
            }
            self.clear();
            return GestureSymbol::None;
        };

        if count > self.max_fingers {
            warn!(count, max = self.max_fingers, "finger count out of range, ignoring frame");
            return self.stable();
        }

        if self.buffer.len() == self.buffer_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(count);

        if self.buffer.len() >= self.vote_window {
            let winner = self.vote();
            if self.stable != Some(winner) {
                debug!(from = ?self.stable, to = winner, "stable finger count changed");
                self.stable = Some(winner);
                self.changes += 1;
            }
        }

        self.stable()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.stable = None;
    }

    fn vote(&self) -> u8 {
        let recent: Vec<u8> = self
            .buffer
            .iter()
            .skip(self.buffer.len() - self.vote_window)
            .copied()
            .collect();

        let mut tally = [0usize; 256];
        for n in &recent {
            tally[*n as usize] += 1;
        }
        let best = recent.iter().map(|n| tally[*n as usize]).max().unwrap_or(0);

        // Ties keep the current value, otherwise the newest contender wins.
        if let Some(current) = self.stable {
            if tally[current as usize] == best {
                return current;
            }
        }
        recent
            .iter()
            .rev()
            .copied()
            .find(|n| tally[*n as usize] == best)
            .unwrap_or(0)
    }
}

impl Default for GestureStabilizer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE, DEFAULT_VOTE_WINDOW, 5)
    }
}
