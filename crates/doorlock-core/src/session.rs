use crate::matcher::{MatchEvent, Progress};
use crate::types::GestureSymbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters for one run of the host process. Nothing is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub started_at: DateTime<Utc>,
    pub observations: u64,
    pub hand_frames: u64,
    /// Stable gesture changes reported by the stabilizer.
    pub gesture_changes: u64,
    pub entries: u64,
    pub matches: u64,
    pub mismatches: u64,
    pub unlocks_sent: u64,
    pub relocks_sent: u64,
    pub last_progress: Option<Progress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub gesture_changes: u64,
    pub entries: u64,
    pub matches: u64,
    pub mismatches: u64,
    pub door_opened: bool,
    /// Progress of an attempt still in flight when the session ended.
    pub unfinished_attempt: Option<Progress>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            observations: 0,
            hand_frames: 0,
            gesture_changes: 0,
            entries: 0,
            matches: 0,
            mismatches: 0,
            unlocks_sent: 0,
            relocks_sent: 0,
            last_progress: None,
        }
    }

    pub fn record(&mut self, symbol: GestureSymbol, event: MatchEvent, progress: Progress) {
        self.observations += 1;
        if !symbol.is_none() {
            self.hand_frames += 1;
        }
        match event {
            MatchEvent::NoChange => {}
            MatchEvent::Advanced(_) => self.entries += 1,
            MatchEvent::Matched => {
                self.entries += 1;
                self.matches += 1;
            }
            MatchEvent::Mismatched => self.mismatches += 1,
        }
        self.last_progress = Some(progress);
    }

    pub fn record_unlock(&mut self) {
        self.unlocks_sent += 1;
    }

    pub fn record_relock(&mut self) {
        self.relocks_sent += 1;
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary_at(Utc::now())
    }

    pub fn summary_at(&self, now: DateTime<Utc>) -> SessionSummary {
        let duration = now - self.started_at;
        SessionSummary {
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds().max(0) as f64 / 1000.0,
            gesture_changes: self.gesture_changes,
            entries: self.entries,
            matches: self.matches,
            mismatches: self.mismatches,
            door_opened: self.unlocks_sent > 0,
            unfinished_attempt: self.last_progress.filter(|p| p.cursor > 0),
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
