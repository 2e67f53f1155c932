//! Stepper motion with a trapezoidal speed profile.
//!
//! Step timing follows the per-step interval recurrence from D. Austin,
//! "Generate stepper-motor speed profiles in real time" (2005): each step's
//! interval is derived from the previous one, so acceleration and
//! deceleration cost no floating-point square roots after the first step.
//! [`Stepper::run`] never blocks; call it as often as possible.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Reverse,
}

/// The physical driver: one enable line and one step pulse per call.
pub trait StepperDriver {
    fn set_enabled(&mut self, enabled: bool);
    fn is_enabled(&self) -> bool;
    fn step(&mut self, direction: Direction);
}

// ---------------------------------------------------------------------------
// MotionProfile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    /// Steps per second.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    /// Steps per second squared.
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
}

fn default_max_speed() -> f64 {
    1000.0
}

fn default_acceleration() -> f64 {
    500.0
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            max_speed: default_max_speed(),
            acceleration: default_acceleration(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stepper
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Stepper {
    position: i64,
    target: i64,
    /// Signed steps/s; negative while moving in reverse.
    speed: f64,
    acceleration: f64,
    direction: Direction,
    /// Step counter of the current ramp; negative while decelerating.
    n: i64,
    /// Initial, current and minimum step interval in microseconds.
    c0: f64,
    cn: f64,
    cmin: f64,
    step_interval: Duration,
    last_step: Duration,
}

impl Stepper {
    pub fn new(profile: MotionProfile) -> Self {
        let acceleration = profile.acceleration.max(f64::EPSILON);
        let max_speed = profile.max_speed.max(f64::EPSILON);
        Self {
            position: 0,
            target: 0,
            speed: 0.0,
            acceleration,
            direction: Direction::Forward,
            n: 0,
            // 0.676 corrects the first-step error of the recurrence.
            c0: 0.676 * (2.0 / acceleration).sqrt() * 1_000_000.0,
            cn: 0.0,
            cmin: 1_000_000.0 / max_speed,
            step_interval: Duration::ZERO,
            last_step: Duration::ZERO,
        }
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn distance_to_go(&self) -> i64 {
        self.target - self.position
    }

    /// True once the target is reached and the motor has come to rest.
    pub fn is_settled(&self) -> bool {
        self.distance_to_go() == 0 && self.speed == 0.0
    }

    pub fn move_to(&mut self, target: i64) {
        if self.target != target {
            self.target = target;
            self.compute_new_speed();
        }
    }

    pub fn move_by(&mut self, delta: i64) {
        self.move_to(self.position + delta);
    }

    /// Stop dead at the current position, discarding the profile.
    pub fn halt(&mut self) {
        self.target = self.position;
        self.speed = 0.0;
        self.n = 0;
        self.step_interval = Duration::ZERO;
    }

    /// Emit at most one step if it is due. Returns true while motion remains.
    pub fn run<D: StepperDriver>(&mut self, now: Duration, driver: &mut D) -> bool {
        if self.run_speed(now, driver) {
            self.compute_new_speed();
        }
        self.speed != 0.0 || self.distance_to_go() != 0
    }

    fn run_speed<D: StepperDriver>(&mut self, now: Duration, driver: &mut D) -> bool {
        if self.step_interval.is_zero() {
            return false;
        }
        if now.saturating_sub(self.last_step) < self.step_interval {
            return false;
        }
        match self.direction {
            Direction::Forward => self.position += 1,
            Direction::Reverse => self.position -= 1,
        }
        driver.step(self.direction);
        self.last_step = now;
        true
    }

    fn compute_new_speed(&mut self) {
        let distance_to = self.distance_to_go();
        let steps_to_stop = ((self.speed * self.speed) / (2.0 * self.acceleration)) as i64;

        if distance_to == 0 && steps_to_stop <= 1 {
            self.step_interval = Duration::ZERO;
            self.speed = 0.0;
            self.n = 0;
            return;
        }

        if distance_to > 0 {
            if self.n > 0 {
                // Too close to stop in time, or heading the wrong way.
                if steps_to_stop >= distance_to || self.direction == Direction::Reverse {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0
                && steps_to_stop < distance_to
                && self.direction == Direction::Forward
            {
                self.n = -self.n;
            }
        } else if distance_to < 0 {
            if self.n > 0 {
                if steps_to_stop >= -distance_to || self.direction == Direction::Forward {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0
                && steps_to_stop < -distance_to
                && self.direction == Direction::Reverse
            {
                self.n = -self.n;
            }
        }

        if self.n == 0 {
            self.cn = self.c0;
            self.direction = if distance_to > 0 {
                Direction::Forward
            } else {
                Direction::Reverse
            };
        } else {
            self.cn -= (2.0 * self.cn) / (4.0 * self.n as f64 + 1.0);
            self.cn = self.cn.max(self.cmin);
        }
        self.n += 1;
        self.step_interval = Duration::from_micros(self.cn as u64);
        self.speed = 1_000_000.0 / self.cn;
        if self.direction == Direction::Reverse {
            self.speed = -self.speed;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Driver double that records enable changes and counts pulses.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingDriver {
        pub enabled: bool,
        pub enable_changes: Vec<bool>,
        pub forward_steps: u64,
        pub reverse_steps: u64,
    }

    impl StepperDriver for RecordingDriver {
        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
            self.enable_changes.push(enabled);
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn step(&mut self, direction: Direction) {
            match direction {
                Direction::Forward => self.forward_steps += 1,
                Direction::Reverse => self.reverse_steps += 1,
            }
        }
    }

    /// Run until settled, returning the step intervals observed.
    fn run_to_rest(stepper: &mut Stepper, driver: &mut RecordingDriver) -> Vec<Duration> {
        let tick = Duration::from_micros(50);
        let mut now = Duration::from_secs(1);
        let mut intervals = Vec::new();
        let mut last_pos = stepper.position();
        let mut last_step_at = now;
        for _ in 0..2_000_000 {
            if !stepper.run(now, driver) {
                break;
            }
            if stepper.position() != last_pos {
                intervals.push(now - last_step_at);
                last_step_at = now;
                last_pos = stepper.position();
            }
            now += tick;
        }
        intervals
    }

    #[test]
    fn reaches_target_exactly() {
        let mut stepper = Stepper::new(MotionProfile::default());
        let mut driver = RecordingDriver::default();
        stepper.move_by(50);
        run_to_rest(&mut stepper, &mut driver);
        assert_eq!(stepper.position(), 50);
        assert!(stepper.is_settled());
        assert_eq!(driver.forward_steps, 50);
        assert_eq!(driver.reverse_steps, 0);
    }

    #[test]
    fn speed_ramps_up_then_down() {
        let mut stepper = Stepper::new(MotionProfile {
            max_speed: 1000.0,
            acceleration: 5000.0,
        });
        let mut driver = RecordingDriver::default();
        stepper.move_by(400);
        let intervals = run_to_rest(&mut stepper, &mut driver);
        // The first step fires immediately; measure the ramp after it.
        let ramp = &intervals[1..];
        let fastest = *ramp.iter().min().unwrap();
        assert!(ramp[0] > fastest);
        assert!(ramp[ramp.len() - 1] > fastest);
        // Cruises at max_speed (1000 steps/s => 1 ms), within one tick.
        assert!(fastest >= Duration::from_micros(1000));
        assert!(fastest <= Duration::from_micros(1050));
        assert_eq!(stepper.position(), 400);
    }

    #[test]
    fn reversal_mid_move_returns_to_new_target() {
        let mut stepper = Stepper::new(MotionProfile::default());
        let mut driver = RecordingDriver::default();
        stepper.move_by(100);
        let tick = Duration::from_micros(50);
        let mut now = Duration::from_secs(1);
        while stepper.position() < 40 {
            stepper.run(now, &mut driver);
            now += tick;
        }
        stepper.move_to(0);
        while stepper.run(now, &mut driver) {
            now += tick;
        }
        assert_eq!(stepper.position(), 0);
        assert!(stepper.position() <= 100);
        assert!(driver.reverse_steps >= 40);
    }

    #[test]
    fn halt_stops_immediately() {
        let mut stepper = Stepper::new(MotionProfile::default());
        let mut driver = RecordingDriver::default();
        stepper.move_by(30);
        let mut now = Duration::from_secs(1);
        while stepper.position() < 5 {
            stepper.run(now, &mut driver);
            now += Duration::from_micros(50);
        }
        stepper.halt();
        assert!(!stepper.run(now + Duration::from_secs(1), &mut driver));
        assert_eq!(stepper.position(), 5);
        assert!(stepper.is_settled());
    }
}
