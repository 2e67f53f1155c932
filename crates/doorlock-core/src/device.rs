//! The device's cooperative poll loop: link bytes in, status lines out.

use crate::actuator::{ActuatorController, CommandOutcome};
use crate::clock::Clock;
use crate::error::Result;
use crate::protocol::{ActuatorCommand, LineBuffer};
use crate::stepper::StepperDriver;
use crate::types::ActuatorPhase;
use tracing::debug;

/// Device end of the actuator link. Both calls must return promptly; a read
/// with nothing pending yields an empty buffer.
pub trait DevicePort {
    fn read_available(&mut self) -> std::io::Result<Vec<u8>>;
    fn write_line(&mut self, line: &str) -> std::io::Result<()>;
}

pub struct DeviceLoop<P: DevicePort, D: StepperDriver, C: Clock + Clone> {
    port: P,
    controller: ActuatorController<D, C>,
    lines: LineBuffer,
}

impl<P: DevicePort, D: StepperDriver, C: Clock + Clone> DeviceLoop<P, D, C> {
    pub fn new(port: P, controller: ActuatorController<D, C>) -> Self {
        Self {
            port,
            controller,
            lines: LineBuffer::new(),
        }
    }

    pub fn controller(&self) -> &ActuatorController<D, C> {
        &self.controller
    }

    pub fn phase(&self) -> ActuatorPhase {
        self.controller.phase()
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// One iteration: read what is there, apply commands, service motion,
    /// then report. Returns the outcome of each command received.
    pub fn poll(&mut self) -> Result<Vec<CommandOutcome>> {
        let bytes = self.port.read_available()?;
        let commands: Vec<ActuatorCommand> = self
            .lines
            .push(&bytes)
            .iter()
            .map(|line| ActuatorCommand::parse(line))
            .collect();
        for command in &commands {
            debug!(%command, "command received");
        }

        let outcomes = self.controller.service(commands);

        for line in self.controller.drain_messages() {
            self.port.write_line(&line)?;
        }
        Ok(outcomes)
    }
}
