//! Events emitted by the acquisition controller.

use serde::Serialize;
use tapdump_core::{CardIdentity, CardType};
use tapdump_mifare::{CardReadError, CardSnapshot};

/// An accepted (non-debounced) tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardDetection {
    pub identity: CardIdentity,
    pub card_type: CardType,
}

/// Output of the controller, delivered over its event channel.
#[derive(Debug)]
#[non_exhaustive]
pub enum AcquisitionEvent {
    /// A new tap was accepted.
    CardDetected(CardDetection),

    /// No NFC adapter is present.
    NotSupported,

    /// The adapter is present but switched off.
    Disabled,

    /// Full dump of the card just detected.
    CardRead(Box<CardSnapshot>),

    /// The dump of the card just detected failed.
    ReadFailed {
        identity: CardIdentity,
        error: CardReadError,
    },
}

impl AcquisitionEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CardDetected(_) => "card_detected",
            Self::NotSupported => "not_supported",
            Self::Disabled => "disabled",
            Self::CardRead(_) => "card_read",
            Self::ReadFailed { .. } => "read_failed",
        }
    }
}
