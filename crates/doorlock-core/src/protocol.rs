//! Actuator link wire protocol: newline-terminated ASCII commands.
//!
//! ```text
//! host → device   "#on\n" | "#off\n"     (case-insensitive, '#' optional)
//! device → host   free-form status text, one line at a time
//! ```
//!
//! Raw text is parsed exactly once, at the boundary, into [`ActuatorCommand`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest accepted command line, excluding the terminator.
pub const MAX_LINE_LEN: usize = 64;

const COMMAND_PREFIX: char = '#';

// ---------------------------------------------------------------------------
// ActuatorCommand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorCommand {
    On,
    Off,
    Unknown(String),
}

impl ActuatorCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let token = trimmed
            .strip_prefix(COMMAND_PREFIX)
            .unwrap_or(trimmed)
            .trim()
            .to_ascii_lowercase();
        match token.as_str() {
            "on" => ActuatorCommand::On,
            "off" => ActuatorCommand::Off,
            _ => ActuatorCommand::Unknown(trimmed.to_string()),
        }
    }

    /// Wire form, including the prefix and terminator.
    pub fn to_line(&self) -> String {
        match self {
            ActuatorCommand::On => "#on\n".to_string(),
            ActuatorCommand::Off => "#off\n".to_string(),
            ActuatorCommand::Unknown(raw) => format!("{raw}\n"),
        }
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorCommand::On => f.write_str("on"),
            ActuatorCommand::Off => f.write_str("off"),
            ActuatorCommand::Unknown(raw) => write!(f, "unknown({raw})"),
        }
    }
}

// ---------------------------------------------------------------------------
// LineBuffer
// ---------------------------------------------------------------------------

/// Reassembles newline-terminated lines from arbitrarily split byte chunks.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl LineBuffer {
    /// A buffer sized for command lines.
    pub fn new() -> Self {
        Self::with_limit(MAX_LINE_LEN)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            limit: limit.max(1),
            overflowed: false,
        }
    }

    /// Append bytes and return every line they complete. Blank lines are
    /// dropped; an overlong line is returned as `"<overlong>"`.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in bytes {
            if b == b'\n' {
                if self.overflowed {
                    lines.push("<overlong>".to_string());
                } else {
                    let text = String::from_utf8_lossy(&self.pending);
                    let text = text.trim_end_matches('\r');
                    if !text.trim().is_empty() {
                        lines.push(text.to_string());
                    }
                }
                self.pending.clear();
                self.overflowed = false;
            } else if self.pending.len() >= self.limit {
                self.overflowed = true;
            } else {
                self.pending.push(b);
            }
        }
        lines
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
