//! Errors raised by NFC adapters, card sessions and haptic devices.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Hardware failure.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// No NFC adapter on this host.
    #[error("NFC adapter not present")]
    NotSupported,

    /// The adapter is present but switched off.
    #[error("NFC adapter disabled")]
    Disabled,

    /// The reader went away, or the mock adapter was dropped.
    #[error("Reader disconnected: {device}")]
    Disconnected { device: String },

    /// The tag left the field mid-operation.
    #[error("Tag lost: {message}")]
    TagLost { message: String },

    /// The reader gave up waiting on the tag.
    #[error("Reader timed out")]
    Timeout,

    /// The device lacks the capability, e.g. a vibrate on a host without a
    /// vibrator.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// The reader or the tag answered with a failure status.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// A frame that does not fit the Classic command set.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// The blocking reader task died before returning.
    #[error("Reader task failed: {0}")]
    ReaderTask(String),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn tag_lost(message: impl Into<String>) -> Self {
        Self::TagLost {
            message: message.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}
