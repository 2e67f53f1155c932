use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("actuator link closed by peer")]
    Closed,

    #[error("actuator link unavailable after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: String },
}
