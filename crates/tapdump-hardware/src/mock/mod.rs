//! Mock device implementations for testing and development.
//!
//! This module provides simulated adapters, cards and haptic devices that can
//! be controlled programmatically without requiring physical hardware.

pub mod adapter;
pub mod card;
pub mod haptic;

// Re-export commonly used types
pub use adapter::{MockAdapter, MockAdapterHandle};
pub use card::{MockClassicCard, MockSession, SessionCall, SessionJournal};
pub use haptic::{MockHaptic, MockHapticHandle};
