//! Tag acquisition for tapdump.
//!
//! This crate sits between an NFC adapter and the application. It owns the
//! discovery lifecycle, suppresses repeated taps of the same card, classifies
//! each accepted tag, pulses the haptic device, and optionally dumps Mifare
//! Classic cards with the [`tapdump_mifare`] engine.
//!
//! # Examples
//!
//! ```
//! use tapdump_acquisition::{AcquisitionConfig, AcquisitionController, AcquisitionEvent};
//! use tapdump_hardware::{AnyHapticDevice, AnyNfcAdapter, NoHaptic};
//! use tapdump_hardware::mock::{MockAdapter, MockClassicCard};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (adapter, cards) = MockAdapter::new();
//!     let mut handle = AcquisitionController::spawn(
//!         AnyNfcAdapter::Mock(adapter),
//!         AnyHapticDevice::None(NoHaptic),
//!         AcquisitionConfig::default(),
//!     );
//!
//!     cards.tap(MockClassicCard::classic_1k(vec![0x04, 0xA2, 0x5F, 0x11])).await?;
//!
//!     if let Some(AcquisitionEvent::CardDetected(detection)) = handle.recv().await {
//!         assert_eq!(detection.identity.uid_string(), "04:A2:5F:11");
//!     }
//!
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod events;

pub use classify::classify;
pub use config::{AcquisitionConfig, AcquisitionMode};
pub use controller::{
    AcquisitionCommand, AcquisitionController, AcquisitionHandle, ListenerState, TagDisposition,
};
pub use debounce::DebounceState;
pub use error::{AcquisitionError, Result};
pub use events::{AcquisitionEvent, CardDetection};
