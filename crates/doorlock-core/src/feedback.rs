//! What the indicator should show for each observation.
//!
//! Rendering is someone else's job; this module only decides the mode.

use crate::matcher::{MatchEvent, Progress};
use crate::types::GestureSymbol;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FeedbackState {
    /// Nobody at the door.
    Idle,
    /// A hand is visible showing this many fingers.
    FingerCount { fingers: u8 },
    /// Hand withdrawn mid-sequence; show how far along the entry is.
    Sequence { entered: usize, len: usize },
    /// Sequence accepted.
    Success,
}

impl FeedbackState {
    pub fn from_observation(symbol: GestureSymbol, event: MatchEvent, progress: Progress) -> Self {
        match (event, symbol) {
            (MatchEvent::Matched, _) => FeedbackState::Success,
            (MatchEvent::Mismatched, _) => FeedbackState::Idle,
            (_, GestureSymbol::Fingers(fingers)) => FeedbackState::FingerCount { fingers },
            (_, GestureSymbol::None) if progress.cursor > 0 => FeedbackState::Sequence {
                entered: progress.cursor,
                len: progress.len,
            },
            _ => FeedbackState::Idle,
        }
    }
}

/// Consumer of matcher output, called once per observation.
pub trait FeedbackSink {
    fn observe(&mut self, symbol: GestureSymbol, event: MatchEvent, progress: Progress);
}

/// Logs feedback mode changes.
#[derive(Debug, Default)]
pub struct TracingFeedback {
    last: Option<FeedbackState>,
}

impl TracingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<FeedbackState> {
        self.last
    }
}

impl FeedbackSink for TracingFeedback {
    fn observe(&mut self, symbol: GestureSymbol, event: MatchEvent, progress: Progress) {
        let state = FeedbackState::from_observation(symbol, event, progress);
        if self.last == Some(state) {
            return;
        }
        match state {
            FeedbackState::Success => info!("feedback: success"),
            FeedbackState::Sequence { entered, len } => {
                info!(entered, remaining = len - entered, "feedback: sequence progress")
            }
            other => debug!(state = ?other, "feedback"),
        }
        self.last = Some(state);
    }
}
