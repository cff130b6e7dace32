//! Error types for the acquisition controller.

use tapdump_hardware::HardwareError;

/// Result type alias for acquisition operations.
pub type Result<T> = std::result::Result<T, AcquisitionError>;

/// Errors that stop the acquisition lifecycle.
///
/// Per-tap problems (debounced or malformed tags, failed reads, haptic
/// faults) are not errors; they are logged or reported as events.
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    /// The adapter failed to switch discovery on or off, or stopped
    /// delivering tags.
    #[error("Adapter error: {0}")]
    Adapter(#[from] HardwareError),

    /// Nobody is listening for events any more.
    #[error("Event channel closed")]
    EventChannelClosed,

    /// The background task panicked or was aborted.
    #[error("Acquisition task failed: {0}")]
    Task(String),
}
