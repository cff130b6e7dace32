//! Mock haptic device.

use crate::{HardwareError, Result, traits::HapticDevice};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct HapticState {
    pulses: Mutex<Vec<u16>>,
    failing: AtomicBool,
}

/// Mock vibrator that records every pulse.
///
/// # Examples
///
/// ```
/// use tapdump_hardware::mock::MockHaptic;
/// use tapdump_hardware::traits::HapticDevice;
///
/// #[tokio::main]
/// async fn main() -> tapdump_hardware::Result<()> {
///     let (mut haptic, handle) = MockHaptic::new();
///     haptic.vibrate(200).await?;
///     assert_eq!(handle.pulses(), vec![200]);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockHaptic {
    present: bool,
    state: Arc<HapticState>,
}

impl MockHaptic {
    /// Create a working mock vibrator.
    pub fn new() -> (Self, MockHapticHandle) {
        let state = Arc::new(HapticState::default());
        let haptic = Self {
            present: true,
            state: Arc::clone(&state),
        };
        (haptic, MockHapticHandle { state })
    }

    /// Create a mock describing a host without a vibrator.
    pub fn absent() -> (Self, MockHapticHandle) {
        let (mut haptic, handle) = Self::new();
        haptic.present = false;
        (haptic, handle)
    }
}

impl Default for MockHaptic {
    fn default() -> Self {
        Self::new().0
    }
}

impl HapticDevice for MockHaptic {
    fn has_vibrator(&self) -> bool {
        self.present
    }

    async fn vibrate(&mut self, duration_ms: u16) -> Result<()> {
        if !self.present {
            return Err(HardwareError::unsupported("vibrate"));
        }
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(HardwareError::communication("mock vibrator failure"));
        }
        self.state
            .pulses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(duration_ms);
        Ok(())
    }
}

/// Handle for inspecting and scripting a [`MockHaptic`].
#[derive(Debug, Clone)]
pub struct MockHapticHandle {
    state: Arc<HapticState>,
}

impl MockHapticHandle {
    /// Durations of every successful pulse, in order.
    pub fn pulses(&self) -> Vec<u16> {
        self.state
            .pulses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Make subsequent pulses fail.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }
}
