//! Host side glue: raw readings in, actuator commands out.
//!
//! ```text
//! Option<u8> ─▶ GestureStabilizer ─▶ SequenceMatcher ─▶ FeedbackSink
//!                                          │ Matched
//!                                          ▼
//!                                     CommandSink (#on, later #off)
//! ```

use crate::clock::Clock;
use crate::config::Config;
use crate::feedback::FeedbackSink;
use crate::matcher::{MatchEvent, Progress, SequenceMatcher};
use crate::protocol::ActuatorCommand;
use crate::session::SessionStats;
use crate::stabilizer::GestureStabilizer;
use crate::types::GestureSymbol;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Where host commands go. Failures are the caller's to handle.
pub trait CommandSink {
    type Error;

    fn send(&mut self, command: &ActuatorCommand) -> Result<(), Self::Error>;
}

/// The result of one observation tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStep {
    pub symbol: GestureSymbol,
    pub event: MatchEvent,
    pub progress: Progress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent: Option<ActuatorCommand>,
}

pub struct DoorHost<L: CommandSink, F: FeedbackSink, C: Clock + Clone> {
    stabilizer: GestureStabilizer,
    matcher: SequenceMatcher<C>,
    link: L,
    feedback: F,
    clock: C,
    cooldown: Duration,
    relock_after: Option<Duration>,
    last_unlock: Option<Duration>,
    relock_due: Option<Duration>,
    stats: SessionStats,
}

impl<L: CommandSink, F: FeedbackSink, C: Clock + Clone> DoorHost<L, F, C> {
    pub fn new(config: &Config, link: L, feedback: F, clock: C) -> Self {
        let matcher = SequenceMatcher::with_clock(config.sequence.target.clone(), clock.clone())
            .with_idle_timeout(config.sequence.idle_timeout());
        Self {
            stabilizer: config.stabilizer.build(config.sequence.max_fingers),
            matcher,
            link,
            feedback,
            clock,
            cooldown: Duration::from_millis(config.host.unlock_cooldown_ms),
            relock_after: config.host.relock_after_ms.map(Duration::from_millis),
            last_unlock: None,
            relock_due: None,
            stats: SessionStats::new(),
        }
    }

    pub fn matcher(&self) -> &SequenceMatcher<C> {
        &self.matcher
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Feed one raw per-frame finger count (`None` = no hand) through the
    /// stabilizer and on into the matcher.
    pub fn observe_raw(&mut self, reading: Option<u8>) -> Result<HostStep, L::Error> {
        let symbol = self.stabilizer.feed(reading);
        self.stats.gesture_changes = self.stabilizer.changes();
        self.observe(symbol)
    }

    /// Feed an already-stable symbol straight to the matcher.
    ///
    /// Matching, feedback and stats always run before the link is touched,
    /// so a link error never loses the observation itself. A failed relock
    /// stays pending and is retried on the next call.
    pub fn observe(&mut self, symbol: GestureSymbol) -> Result<HostStep, L::Error> {
        let event = self.matcher.observe(symbol);
        let progress = self.matcher.progress();
        self.stats.record(symbol, event, progress);
        self.feedback.observe(symbol, event, progress);

        let mut sent = None;
        if event == MatchEvent::Matched {
            sent = self.unlock()?;
        }
        if sent.is_none() {
            sent = self.poll_relock()?;
        }

        Ok(HostStep {
            symbol,
            event,
            progress,
            sent,
        })
    }

    fn unlock(&mut self) -> Result<Option<ActuatorCommand>, L::Error> {
        let now = self.clock.now();
        if let Some(at) = self.last_unlock {
            if now.saturating_sub(at) < self.cooldown {
                warn!("sequence matched during unlock cooldown, not resending");
                return Ok(None);
            }
        }

        info!("door unlocked, sending 'on'");
        let cmd = ActuatorCommand::On;
        self.link.send(&cmd)?;
        self.stats.record_unlock();
        self.last_unlock = Some(now);
        self.relock_due = self.relock_after.map(|d| now + d);
        Ok(Some(cmd))
    }

    fn poll_relock(&mut self) -> Result<Option<ActuatorCommand>, L::Error> {
        let Some(due) = self.relock_due else {
            return Ok(None);
        };
        if self.clock.now() < due {
            return Ok(None);
        }
        info!("relock delay elapsed, sending 'off'");
        let cmd = ActuatorCommand::Off;
        self.link.send(&cmd)?;
        self.relock_due = None;
        self.stats.record_relock();
        Ok(Some(cmd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::feedback::{FeedbackState, TracingFeedback};
    use GestureSymbol::{Fingers, None as NoHand};

    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<ActuatorCommand>,
        fail: bool,
    }

    impl CommandSink for RecordingSink {
        type Error = String;

        fn send(&mut self, command: &ActuatorCommand) -> Result<(), String> {
            if self.fail {
                return Err("link down".to_string());
            }
            self.sent.push(command.clone());
            Ok(())
        }
    }

    fn host(config: &Config) -> (DoorHost<RecordingSink, TracingFeedback, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let host = DoorHost::new(
            config,
            RecordingSink::default(),
            TracingFeedback::new(),
            clock.clone(),
        );
        (host, clock)
    }

    fn enter(
        host: &mut DoorHost<RecordingSink, TracingFeedback, ManualClock>,
        symbols: &[GestureSymbol],
    ) -> Vec<HostStep> {
        symbols.iter().map(|s| host.observe(*s).unwrap()).collect()
    }

    #[test]
    fn correct_sequence_sends_on() {
        let (mut host, _) = host(&Config::default());
        let steps = enter(
            &mut host,
            &[NoHand, Fingers(0), NoHand, Fingers(1), NoHand, Fingers(0), NoHand, Fingers(5)],
        );
        let last = steps.last().unwrap();
        assert_eq!(last.event, MatchEvent::Matched);
        assert_eq!(last.sent, Some(ActuatorCommand::On));
        assert_eq!(host.link().sent, vec![ActuatorCommand::On]);
        assert_eq!(host.feedback().current(), Some(FeedbackState::Success));
        assert!(host.stats().summary().door_opened);
    }

    #[test]
    fn wrong_sequence_sends_nothing() {
        let (mut host, _) = host(&Config::default());
        let steps = enter(&mut host, &[Fingers(0), Fingers(1), Fingers(0), Fingers(3)]);
        assert_eq!(steps.last().unwrap().event, MatchEvent::Mismatched);
        assert_eq!(host.matcher().cursor(), 0);
        assert!(host.link().sent.is_empty());
    }

    #[test]
    fn raw_frames_are_stabilized_before_matching() {
        let mut config = Config::default();
        config.sequence.target = crate::matcher::TargetSequence::new(vec![2, 4]).unwrap();
        let (mut host, _) = host(&config);

        let mut frames = vec![Some(2); 6];
        frames.push(Some(3)); // glitch
        frames.extend([None, None]);
        frames.extend(vec![Some(4); 5]);

        let events: Vec<MatchEvent> = frames
            .into_iter()
            .map(|f| host.observe_raw(f).unwrap().event)
            .filter(|e| *e != MatchEvent::NoChange)
            .collect();
        assert_eq!(events, vec![MatchEvent::Advanced(1), MatchEvent::Matched]);
        assert_eq!(host.stats().gesture_changes, 2);
    }

    #[test]
    fn cooldown_suppresses_repeat_unlock() {
        let mut config = Config::default();
        config.sequence.target = crate::matcher::TargetSequence::new(vec![1, 2]).unwrap();
        let (mut host, clock) = host(&config);

        enter(&mut host, &[Fingers(1), Fingers(2)]);
        clock.advance(Duration::from_secs(1));
        let steps = enter(&mut host, &[Fingers(1), Fingers(2)]);
        assert_eq!(steps[1].event, MatchEvent::Matched);
        assert_eq!(steps[1].sent, None);

        clock.advance(Duration::from_secs(5));
        let steps = enter(&mut host, &[Fingers(1), Fingers(2)]);
        assert_eq!(steps[1].sent, Some(ActuatorCommand::On));
        assert_eq!(host.link().sent.len(), 2);
    }

    #[test]
    fn relock_sends_off_after_delay() {
        let mut config = Config::default();
        config.host.relock_after_ms = Some(10_000);
        let (mut host, clock) = host(&config);

        enter(&mut host, &[Fingers(0), Fingers(1), Fingers(0), Fingers(5)]);
        clock.advance(Duration::from_secs(9));
        assert_eq!(host.observe(NoHand).unwrap().sent, None);
        clock.advance(Duration::from_secs(1));
        assert_eq!(host.observe(NoHand).unwrap().sent, Some(ActuatorCommand::Off));
        assert_eq!(host.observe(NoHand).unwrap().sent, None);
        assert_eq!(
            host.link().sent,
            vec![ActuatorCommand::On, ActuatorCommand::Off]
        );
    }

    #[test]
    fn pending_relock_on_dead_link_does_not_freeze_entry() {
        let mut config = Config::default();
        config.host.relock_after_ms = Some(1000);
        let (mut host, clock) = host(&config);

        enter(&mut host, &[Fingers(0), Fingers(1), Fingers(0), Fingers(5)]);
        clock.advance(Duration::from_secs(2));
        host.link_mut().fail = true;

        assert_eq!(host.observe(Fingers(0)).unwrap_err(), "link down");
        assert_eq!(host.observe(Fingers(1)).unwrap_err(), "link down");
        assert_eq!(host.matcher().cursor(), 2);
        assert_eq!(
            host.feedback().current(),
            Some(FeedbackState::FingerCount { fingers: 1 })
        );
        assert_eq!(host.stats().entries, 6);

        host.link_mut().fail = false;
        assert_eq!(host.observe(NoHand).unwrap().sent, Some(ActuatorCommand::Off));
        assert_eq!(host.stats().relocks_sent, 1);
    }

    #[test]
    fn link_failure_surfaces_to_caller() {
        let (mut host, _) = host(&Config::default());
        host.link_mut().fail = true;
        enter(&mut host, &[Fingers(0), Fingers(1), Fingers(0)]);
        let err = host.observe(Fingers(5)).unwrap_err();
        assert_eq!(err, "link down");
        assert!(!host.stats().summary().door_opened);
    }
}
