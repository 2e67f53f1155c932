use crate::locate;
use doorlock_core::actuator::ActuatorController;
use doorlock_core::clock::MonotonicClock;
use doorlock_core::device::{DeviceLoop, DevicePort};
use doorlock_core::stepper::{Direction, StepperDriver};
use doorlock_core::types::ActuatorPhase;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Simulated hardware
// ---------------------------------------------------------------------------

/// Counts steps instead of pulsing a pin.
#[derive(Debug, Default)]
struct SimulatedDriver {
    enabled: bool,
    position: i64,
}

impl StepperDriver for SimulatedDriver {
    fn set_enabled(&mut self, enabled: bool) {
        debug!(enabled, "driver enable line");
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn step(&mut self, direction: Direction) {
        match direction {
            Direction::Forward => self.position += 1,
            Direction::Reverse => self.position -= 1,
        }
    }
}

/// stdin through a reader thread so polls never block; stdout for replies.
struct StdioPort {
    rx: Receiver<Vec<u8>>,
    closed: bool,
}

impl StdioPort {
    fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut stdin = io::stdin();
            let mut buf = [0u8; 256];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        });
        Self { rx, closed: false }
    }
}

impl DevicePort for StdioPort {
    fn read_available(&mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(chunk) => bytes.extend(chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        Ok(bytes)
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Runs until stdin closes and the actuator has come to rest.
pub fn run(explicit: Option<&Path>, tick_us: u64) -> anyhow::Result<()> {
    let config = locate::load_config(explicit)?;
    if config.has_errors() {
        anyhow::bail!("invalid config; run `doorlock config validate` for details");
    }

    let controller = ActuatorController::new(
        SimulatedDriver::default(),
        &config.actuator,
        MonotonicClock::new(),
    );
    let mut device = DeviceLoop::new(StdioPort::spawn(), controller);
    let tick = Duration::from_micros(tick_us);

    loop {
        for outcome in device.poll()? {
            debug!(?outcome, "command handled");
        }
        if device.port().closed && device.phase() == ActuatorPhase::Disabled {
            break;
        }
        thread::sleep(tick);
    }

    info!(
        position = device.controller().driver().position,
        "input closed, actuator at rest"
    );
    Ok(())
}
