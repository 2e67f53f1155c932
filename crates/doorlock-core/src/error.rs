use thiserror::Error;

#[derive(Debug, Error)]
pub enum DoorlockError {
    #[error("config not found: {0}")]
    ConfigNotFound(String),

    #[error("target sequence must contain at least one symbol")]
    EmptySequence,

    #[error("gesture symbol {symbol} out of range: max is {max}")]
    SymbolOutOfRange { symbol: u32, max: u8 },

    #[error("invalid gesture symbol '{0}': expected a finger count or 'none'")]
    InvalidSymbol(String),

    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, DoorlockError>;
