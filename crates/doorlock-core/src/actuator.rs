//! Device-side actuator controller.
//!
//! A single [`ActuatorPhase`] replaces independent running/rewinding/waiting
//! flags, so only valid combinations are representable:
//!
//! ```text
//!            on                 motion done            hold expired
//! Disabled ─────▶ Advancing ─────────────▶ Holding ─────────────▶ Disabled
//!    │               │ off (abort)            │ off (abort)
//!    │ off           ▼                        ▼
//!    └──────────▶ Rewinding ◀─────────────────┘
//!                    │ motion done
//!                    ▼
//!                 Disabled
//! ```
//!
//! Nothing here blocks. The owner calls [`ActuatorController::service`] once
//! per loop iteration with whatever commands arrived since the last one.

use crate::clock::{Clock, Timer};
use crate::config::ActuatorConfig;
use crate::protocol::ActuatorCommand;
use crate::stepper::{Stepper, StepperDriver};
use crate::types::ActuatorPhase;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{error, info, warn};

/// What the controller did with one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "phase", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// Applied; the controller is now in this phase.
    Accepted(ActuatorPhase),
    /// Valid, but the current phase cannot take it.
    Busy(ActuatorPhase),
    /// The requested motion is already under way.
    Redundant(ActuatorPhase),
    /// Not a recognised token.
    Unknown,
}

pub struct ActuatorController<D: StepperDriver, C: Clock + Clone> {
    phase: ActuatorPhase,
    driver: D,
    driver_enabled: bool,
    stepper: Stepper,
    clock: C,
    hold_timer: Option<Timer<C>>,
    steps: i64,
    hold: Duration,
    outbox: VecDeque<String>,
}

impl<D: StepperDriver, C: Clock + Clone> ActuatorController<D, C> {
    pub fn new(mut driver: D, config: &ActuatorConfig, clock: C) -> Self {
        driver.set_enabled(false);
        let mut ctrl = Self {
            phase: ActuatorPhase::Disabled,
            driver,
            driver_enabled: false,
            stepper: Stepper::new(config.motion),
            clock,
            hold_timer: None,
            steps: i64::from(config.steps),
            hold: config.hold(),
            outbox: VecDeque::new(),
        };
        ctrl.say("Actuator controller ready".to_string());
        ctrl.say(format!(
            "Send '#on' to advance {} steps, hold {} ms, then auto-disable",
            ctrl.steps,
            ctrl.hold.as_millis()
        ));
        ctrl.say(format!("Send '#off' to rewind {} steps and disable", ctrl.steps));
        ctrl
    }

    pub fn phase(&self) -> ActuatorPhase {
        self.phase
    }

    pub fn position(&self) -> i64 {
        self.stepper.position()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Time left before auto-disable, while holding.
    pub fn hold_remaining(&self) -> Option<Duration> {
        self.hold_timer.as_ref().map(Timer::remaining)
    }

    /// Status lines produced since the last drain, oldest first.
    pub fn drain_messages(&mut self) -> Vec<String> {
        self.outbox.drain(..).collect()
    }

    /// One loop iteration: apply every command, then service motion and the
    /// hold timer. Commands always win over a timer expiring in the same
    /// iteration.
    pub fn service<I>(&mut self, commands: I) -> Vec<CommandOutcome>
    where
        I: IntoIterator<Item = ActuatorCommand>,
    {
        let outcomes = commands.into_iter().map(|c| self.handle(&c)).collect();
        self.tick();
        outcomes
    }

    pub fn handle(&mut self, command: &ActuatorCommand) -> CommandOutcome {
        match command {
            ActuatorCommand::On => self.on(),
            ActuatorCommand::Off => self.off(),
            ActuatorCommand::Unknown(raw) => {
                warn!(command = %raw, "unknown actuator command");
                self.say(format!("Unknown command '{raw}'. Use '#on' or '#off'"));
                CommandOutcome::Unknown
            }
        }
    }

    /// Advance motion and timers without blocking.
    pub fn tick(&mut self) {
        if self.phase.is_moving() && !self.driver.is_enabled() {
            error!(phase = %self.phase, "driver disabled during motion, forcing stop");
            self.say("Fault: driver disabled during motion. Motor stopped.".to_string());
            self.stepper.halt();
            self.hold_timer = None;
            self.driver.set_enabled(false);
            self.driver_enabled = false;
            self.transition(ActuatorPhase::Disabled);
            return;
        }

        match self.phase {
            ActuatorPhase::Disabled => {}
            ActuatorPhase::Advancing => {
                if !self.stepper.run(self.clock.now(), &mut self.driver) {
                    self.hold_timer = Some(Timer::start(self.clock.clone(), self.hold));
                    self.say(format!(
                        "{} steps completed. Holding for {} ms...",
                        self.steps,
                        self.hold.as_millis()
                    ));
                    self.transition(ActuatorPhase::Holding);
                }
            }
            ActuatorPhase::Holding => {
                if self.hold_timer.as_ref().map_or(true, Timer::expired) {
                    self.hold_timer = None;
                    self.disable_driver();
                    self.say("Hold complete. Motor OFF - disabled".to_string());
                    self.transition(ActuatorPhase::Disabled);
                }
            }
            ActuatorPhase::Rewinding => {
                if !self.stepper.run(self.clock.now(), &mut self.driver) {
                    self.disable_driver();
                    self.say("Rewind complete. Motor disabled.".to_string());
                    self.transition(ActuatorPhase::Disabled);
                }
            }
        }
    }

    fn on(&mut self) -> CommandOutcome {
        match self.phase {
            ActuatorPhase::Disabled => {
                self.enable_driver();
                self.stepper.move_by(self.steps);
                self.say(format!("Motor ON - advancing {} steps", self.steps));
                self.transition(ActuatorPhase::Advancing);
                CommandOutcome::Accepted(self.phase)
            }
            ActuatorPhase::Advancing => {
                self.say("Motor is already advancing".to_string());
                warn!("redundant 'on' while advancing");
                CommandOutcome::Redundant(self.phase)
            }
            ActuatorPhase::Holding | ActuatorPhase::Rewinding => {
                self.say(format!("Motor is busy ({}), 'on' ignored", self.phase));
                warn!(phase = %self.phase, "'on' rejected, actuator busy");
                CommandOutcome::Busy(self.phase)
            }
        }
    }

    fn off(&mut self) -> CommandOutcome {
        match self.phase {
            ActuatorPhase::Disabled => {
                self.enable_driver();
                self.stepper.move_by(-self.steps);
                self.say(format!("Motor OFF - rewinding {} steps", self.steps));
                self.transition(ActuatorPhase::Rewinding);
                CommandOutcome::Accepted(self.phase)
            }
            ActuatorPhase::Advancing | ActuatorPhase::Holding => {
                self.hold_timer = None;
                let from = self.stepper.position();
                self.stepper.move_to(from - self.steps);
                self.say(format!(
                    "Abort - rewinding {} steps from position {from}",
                    self.steps
                ));
                self.transition(ActuatorPhase::Rewinding);
                CommandOutcome::Accepted(self.phase)
            }
            ActuatorPhase::Rewinding => {
                self.say("Motor is already rewinding".to_string());
                warn!("redundant 'off' while rewinding");
                CommandOutcome::Redundant(self.phase)
            }
        }
    }

    fn enable_driver(&mut self) {
        if !self.driver_enabled {
            self.driver.set_enabled(true);
            self.driver_enabled = true;
        }
    }

    fn disable_driver(&mut self) {
        if self.driver_enabled {
            self.driver.set_enabled(false);
            self.driver_enabled = false;
        }
    }

    fn transition(&mut self, to: ActuatorPhase) {
        info!(
            from = %self.phase,
            to = %to,
            position = self.stepper.position(),
            "actuator phase change"
        );
        self.phase = to;
    }

    fn say(&mut self, line: String) {
        self.outbox.push_back(line);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
