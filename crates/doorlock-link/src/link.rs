use std::io::{ErrorKind, Read, Write};

use doorlock_core::host::CommandSink;
use doorlock_core::protocol::{ActuatorCommand, LineBuffer};
use tracing::{debug, info};

use crate::{LinkError, Result};

/// Status lines from the device can be longer than command lines.
const STATUS_LINE_LIMIT: usize = 256;

const READ_CHUNK: usize = 256;

// ─── ActuatorLink ─────────────────────────────────────────────────────────

/// One open connection to the actuator.
///
/// Commands are written whole and flushed. Anything the device sends back is
/// split into lines and logged; the host never acts on it.
pub struct ActuatorLink<T> {
    transport: T,
    inbound: LineBuffer,
    sent: u64,
}

impl<T: Read + Write> ActuatorLink<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            inbound: LineBuffer::with_limit(STATUS_LINE_LIMIT),
            sent: 0,
        }
    }

    pub fn send(&mut self, command: &ActuatorCommand) -> Result<()> {
        let line = command.to_line();
        self.transport.write_all(line.as_bytes())?;
        self.transport.flush()?;
        self.sent += 1;
        info!(command = %command, "sent to actuator");
        Ok(())
    }

    /// Read whatever status text is waiting without blocking past the
    /// transport's own read timeout.
    ///
    /// A zero-length read means the peer hung up.
    pub fn read_status(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.transport.read(&mut chunk) {
                Ok(0) => return Err(LinkError::Closed),
                Ok(n) => {
                    lines.extend(self.inbound.push(&chunk[..n]));
                    if n < chunk.len() {
                        break;
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        for line in &lines {
            debug!(line = %line, "device");
        }
        Ok(lines)
    }

    /// Commands written on this connection.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Read + Write> CommandSink for ActuatorLink<T> {
    type Error = LinkError;

    fn send(&mut self, command: &ActuatorCommand) -> Result<()> {
        ActuatorLink::send(self, command)
    }
}
