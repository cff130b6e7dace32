use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Codec errors
    #[error("Malformed hex string: {reason}")]
    MalformedHex { reason: String },

    // Card model errors
    #[error("Invalid Mifare key: {message}")]
    InvalidKey { message: String },

    #[error("Unknown card size: {0} bytes")]
    UnknownCardSize(usize),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new malformed hex error.
    pub fn malformed_hex(reason: impl Into<String>) -> Self {
        Self::MalformedHex {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
