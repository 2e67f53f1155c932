use std::thread;
use std::time::{Duration, Instant};

use doorlock_core::config::LinkConfig;
use doorlock_core::protocol::ActuatorCommand;
use serialport::SerialPort;
use tracing::{debug, info};

use crate::link::ActuatorLink;
use crate::reconnect::Connector;
use crate::{LinkError, Result};

/// Open the configured serial port and wait out the device reset.
///
/// Opening the port toggles DTR, which reboots most boards; anything written
/// before `open_settle_ms` has passed is lost.
pub fn open_serial(config: &LinkConfig) -> Result<ActuatorLink<Box<dyn SerialPort>>> {
    let port = serialport::new(&config.port, config.baud_rate)
        .timeout(Duration::from_millis(config.read_timeout_ms))
        .open()
        .map_err(|source| LinkError::Open {
            port: config.port.clone(),
            source,
        })?;
    info!(port = %config.port, baud = config.baud_rate, "serial port opened");
    if config.open_settle_ms > 0 {
        debug!(ms = config.open_settle_ms, "waiting for device reset");
        thread::sleep(Duration::from_millis(config.open_settle_ms));
    }
    Ok(ActuatorLink::new(port))
}

/// One-shot: open the port, send one command, and collect whatever the
/// device prints during `listen`.
pub fn send_command(
    config: &LinkConfig,
    command: &ActuatorCommand,
    listen: Duration,
) -> Result<Vec<String>> {
    let mut link = open_serial(config)?;
    // The boot banner arrives during the settle delay; discard it.
    let banner = link.read_status()?;
    debug!(lines = banner.len(), "discarded boot output");

    link.send(command)?;
    let deadline = Instant::now() + listen;
    let mut lines = Vec::new();
    while Instant::now() < deadline {
        lines.extend(link.read_status()?);
    }
    Ok(lines)
}

// ─── SerialConnector ──────────────────────────────────────────────────────

/// Reopens the configured serial port on demand.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    config: LinkConfig,
}

impl SerialConnector {
    pub fn new(config: LinkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }
}

impl Connector for SerialConnector {
    type Transport = Box<dyn SerialPort>;

    fn connect(&mut self) -> Result<ActuatorLink<Self::Transport>> {
        open_serial(&self.config)
    }
}
