pub mod actuator;
pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod feedback;
pub mod host;
pub mod matcher;
pub mod protocol;
pub mod session;
pub mod stabilizer;
pub mod stepper;
pub mod types;

pub use error::{DoorlockError, Result};
