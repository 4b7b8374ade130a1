use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Input errors
    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unknown access reason: {0}")]
    UnknownReason(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
