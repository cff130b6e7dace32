//! Error types for card reads.
//!
//! Only connectivity-level faults are errors. Refused keys and faulted
//! blocks are recorded in the snapshot instead.

use crate::snapshot::CardSnapshot;
use tapdump_hardware::{HardwareError, Technology};

/// Result type alias for card reads.
pub type Result<T> = std::result::Result<T, CardReadError>;

/// Errors that abort a card read.
#[derive(Debug, thiserror::Error)]
pub enum CardReadError {
    /// The tag does not expose the Mifare Classic technology.
    #[error("Unsupported card: {technologies:?} does not include Mifare Classic")]
    UnsupportedCard { technologies: Vec<Technology> },

    /// The session could not be connected; no sector was attempted.
    #[error("Session error: {0}")]
    Session(#[source] HardwareError),

    /// The read completed but the session could not be released.
    ///
    /// The snapshot is still handed back so the recovered data is not lost.
    #[error("Session release failed: {source}")]
    Release {
        #[source]
        source: HardwareError,
        snapshot: Box<CardSnapshot>,
    },
}

impl CardReadError {
    /// Create a new unsupported card error.
    pub fn unsupported(technologies: Vec<Technology>) -> Self {
        Self::UnsupportedCard { technologies }
    }

    /// Snapshot recovered before the failure, if any.
    pub fn into_snapshot(self) -> Option<CardSnapshot> {
        match self {
            Self::Release { snapshot, .. } => Some(*snapshot),
            _ => None,
        }
    }

    /// Check whether the read never touched the card.
    pub fn is_pre_connect(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedCard { .. } | Self::Session(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let error = CardReadError::unsupported(vec![Technology::MifareUltralight]);
        assert_eq!(
            error.to_string(),
            "Unsupported card: [MifareUltralight] does not include Mifare Classic"
        );
        assert!(error.is_pre_connect());
    }

    #[test]
    fn test_session_error() {
        let session = CardReadError::Session(HardwareError::tag_lost("gone"));
        assert_eq!(session.to_string(), "Session error: Tag lost: gone");
        assert!(session.is_pre_connect());
        assert!(session.into_snapshot().is_none());
    }
}
