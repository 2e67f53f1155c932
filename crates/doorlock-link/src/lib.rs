//! `doorlock-link`: host side of the serial link to the actuator.
//!
//! # Architecture
//!
//! ```text
//! DoorHost ──CommandSink──▶ ReconnectingLink<SerialConnector>
//!                                │  connect / retry
//!                                ▼
//!                           ActuatorLink<Box<dyn SerialPort>>
//!                                │  "#on\n" / "#off\n" out
//!                                ▼  status lines in (logged only)
//!                             device
//! ```
//!
//! The transport is any `Read + Write`, so tests drive the link over an
//! in-memory pipe instead of a real port.

pub mod error;
pub mod link;
pub mod reconnect;
pub mod serial;

#[cfg(test)]
mod tests;

pub use error::LinkError;
pub use link::ActuatorLink;
pub use reconnect::{Connector, ReconnectingLink};
pub use serial::{open_serial, send_command, SerialConnector};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, LinkError>;
