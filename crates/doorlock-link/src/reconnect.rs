use std::io::{Read, Write};

use doorlock_core::host::CommandSink;
use doorlock_core::protocol::ActuatorCommand;
use tracing::{info, warn};

use crate::link::ActuatorLink;
use crate::{LinkError, Result};

/// Opens fresh connections to the actuator.
pub trait Connector {
    type Transport: Read + Write;

    fn connect(&mut self) -> Result<ActuatorLink<Self::Transport>>;
}

// ─── ReconnectingLink ─────────────────────────────────────────────────────

/// A link that reopens its connection when a send fails.
///
/// Each `send` makes at most `attempts` tries, reconnecting before each one
/// if needed. Once they are spent the command is dropped and
/// [`LinkError::Exhausted`] is returned; the next `send` starts over.
pub struct ReconnectingLink<K: Connector> {
    connector: K,
    link: Option<ActuatorLink<K::Transport>>,
    attempts: u32,
    opened: u64,
}

impl<K: Connector> ReconnectingLink<K> {
    pub fn new(connector: K, attempts: u32) -> Self {
        Self {
            connector,
            link: None,
            attempts: attempts.max(1),
            opened: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Connections opened after the first one.
    pub fn reconnects(&self) -> u64 {
        self.opened.saturating_sub(1)
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    pub fn send(&mut self, command: &ActuatorCommand) -> Result<()> {
        let mut last = String::new();
        for attempt in 1..=self.attempts {
            let link = match self.ensure_connected() {
                Ok(link) => link,
                Err(e) => {
                    warn!(attempt, error = %e, "actuator connect failed");
                    last = e.to_string();
                    continue;
                }
            };
            match link.send(command) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(attempt, error = %e, "actuator send failed, dropping connection");
                    last = e.to_string();
                    self.link = None;
                }
            }
        }
        Err(LinkError::Exhausted {
            attempts: self.attempts,
            last,
        })
    }

    /// Status lines from the current connection, if there is one. A read
    /// failure drops the connection; the next `send` reopens it.
    pub fn read_status(&mut self) -> Result<Vec<String>> {
        let Some(link) = self.link.as_mut() else {
            return Ok(Vec::new());
        };
        match link.read_status() {
            Ok(lines) => Ok(lines),
            Err(e) => {
                self.link = None;
                Err(e)
            }
        }
    }

    fn ensure_connected(&mut self) -> Result<&mut ActuatorLink<K::Transport>> {
        if self.link.is_none() {
            let fresh = self.connector.connect()?;
            if self.opened > 0 {
                info!("actuator link re-established");
            }
            self.opened += 1;
            self.link = Some(fresh);
        }
        self.link.as_mut().ok_or(LinkError::Closed)
    }
}

impl<K: Connector> CommandSink for ReconnectingLink<K> {
    type Error = LinkError;

    fn send(&mut self, command: &ActuatorCommand) -> Result<()> {
        ReconnectingLink::send(self, command)
    }
}
