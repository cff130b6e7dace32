//! Acquisition configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tapdump_core::constants::{DEBOUNCE_WINDOW_MS, DEFAULT_EVENT_CAPACITY, HAPTIC_PULSE_MS};
use tapdump_mifare::ReaderConfig;

/// What the controller does with an accepted Classic tap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// Emit the detection only (uid, type, timestamp).
    #[default]
    IdentityOnly,

    /// Emit the detection, then dump the card with the authentication engine.
    FullDump,
}

/// Controller configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tapdump_acquisition::{AcquisitionConfig, AcquisitionMode};
///
/// let config = AcquisitionConfig::default()
///     .with_mode(AcquisitionMode::FullDump)
///     .with_debounce_window(Duration::from_millis(1500));
///
/// assert_eq!(config.haptic_pulse_ms, 200);
/// assert_eq!(config.debounce_window, Duration::from_millis(1500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionConfig {
    pub mode: AcquisitionMode,

    /// Repeat detections of the same UID within this window are dropped.
    pub debounce_window: Duration,

    /// Length of the feedback pulse on an accepted tap.
    pub haptic_pulse_ms: u16,

    /// Capacity of the event channel.
    pub event_capacity: usize,

    /// Candidate keys used in [`AcquisitionMode::FullDump`].
    pub reader: ReaderConfig,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            mode: AcquisitionMode::default(),
            debounce_window: Duration::from_millis(DEBOUNCE_WINDOW_MS),
            haptic_pulse_ms: HAPTIC_PULSE_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            reader: ReaderConfig::default(),
        }
    }
}

impl AcquisitionConfig {
    pub fn with_mode(mut self, mode: AcquisitionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    pub fn with_haptic_pulse_ms(mut self, duration_ms: u16) -> Self {
        self.haptic_pulse_ms = duration_ms;
        self
    }

    /// Set the event channel capacity (at least 1).
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }
}
