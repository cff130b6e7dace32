//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits (RPITIT - Rust Edition 2024) are not
//! object-safe, so `Box<dyn NfcAdapter>` is unavailable. These enums provide
//! concrete type dispatch instead, with hardware backends behind feature
//! flags.
//!
//! # Examples
//!
//! ```
//! use tapdump_hardware::devices::AnyNfcAdapter;
//! use tapdump_hardware::mock::MockAdapter;
//! use tapdump_hardware::traits::NfcAdapter;
//!
//! let (adapter, _handle) = MockAdapter::new();
//! let any_adapter = AnyNfcAdapter::Mock(adapter);
//! assert!(any_adapter.is_available());
//! ```

use crate::mock::{MockAdapter, MockHaptic, MockSession};
use crate::traits::{ClassicSession, HapticDevice, NfcAdapter};
use crate::{AdapterInfo, Result, TagInfo};
use tapdump_core::{MifareKey, constants::BLOCK_SIZE};

#[cfg(feature = "hardware-pcsc")]
use crate::pcsc::{PcscAdapter, PcscSession};

/// Enum wrapper for NFC adapter dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyNfcAdapter {
    /// Mock adapter for development and testing.
    Mock(MockAdapter),

    /// PC/SC contactless reader.
    #[cfg(feature = "hardware-pcsc")]
    Pcsc(PcscAdapter),
}

impl NfcAdapter for AnyNfcAdapter {
    type Session = AnyClassicSession;

    fn is_available(&self) -> bool {
        match self {
            Self::Mock(adapter) => adapter.is_available(),
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(adapter) => adapter.is_available(),
        }
    }

    fn is_enabled(&self) -> bool {
        match self {
            Self::Mock(adapter) => adapter.is_enabled(),
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(adapter) => adapter.is_enabled(),
        }
    }

    async fn begin_listening(&mut self) -> Result<()> {
        match self {
            Self::Mock(adapter) => adapter.begin_listening().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(adapter) => adapter.begin_listening().await,
        }
    }

    async fn end_listening(&mut self) -> Result<()> {
        match self {
            Self::Mock(adapter) => adapter.end_listening().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(adapter) => adapter.end_listening().await,
        }
    }

    async fn next_tag(&mut self) -> Result<TagInfo> {
        match self {
            Self::Mock(adapter) => adapter.next_tag().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(adapter) => adapter.next_tag().await,
        }
    }

    async fn open_session(&mut self, tag: &TagInfo) -> Result<AnyClassicSession> {
        match self {
            Self::Mock(adapter) => adapter.open_session(tag).await.map(AnyClassicSession::Mock),
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(adapter) => adapter.open_session(tag).await.map(AnyClassicSession::Pcsc),
        }
    }

    async fn get_adapter_info(&self) -> Result<AdapterInfo> {
        match self {
            Self::Mock(adapter) => adapter.get_adapter_info().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(adapter) => adapter.get_adapter_info().await,
        }
    }
}

/// Enum wrapper for Classic session dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyClassicSession {
    /// Session on a mock card.
    Mock(MockSession),

    /// Session on a card held by a PC/SC reader.
    #[cfg(feature = "hardware-pcsc")]
    Pcsc(PcscSession),
}

impl ClassicSession for AnyClassicSession {
    fn tag(&self) -> &TagInfo {
        match self {
            Self::Mock(session) => session.tag(),
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(session) => session.tag(),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        match self {
            Self::Mock(session) => session.connect().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(session) => session.connect().await,
        }
    }

    async fn authenticate_key_a(&mut self, sector: u16, key: &MifareKey) -> Result<bool> {
        match self {
            Self::Mock(session) => session.authenticate_key_a(sector, key).await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(session) => session.authenticate_key_a(sector, key).await,
        }
    }

    async fn authenticate_key_b(&mut self, sector: u16, key: &MifareKey) -> Result<bool> {
        match self {
            Self::Mock(session) => session.authenticate_key_b(sector, key).await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(session) => session.authenticate_key_b(sector, key).await,
        }
    }

    async fn read_block(&mut self, block: u16) -> Result<[u8; BLOCK_SIZE]> {
        match self {
            Self::Mock(session) => session.read_block(block).await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(session) => session.read_block(block).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            Self::Mock(session) => session.close().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(session) => session.close().await,
        }
    }
}

/// Haptic device for hosts that have none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptic;

impl HapticDevice for NoHaptic {
    fn has_vibrator(&self) -> bool {
        false
    }

    async fn vibrate(&mut self, _duration_ms: u16) -> Result<()> {
        Ok(())
    }
}

/// Enum wrapper for haptic device dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyHapticDevice {
    /// Mock vibrator for development and testing.
    Mock(MockHaptic),

    /// No feedback hardware.
    None(NoHaptic),
}

impl HapticDevice for AnyHapticDevice {
    fn has_vibrator(&self) -> bool {
        match self {
            Self::Mock(device) => device.has_vibrator(),
            Self::None(device) => device.has_vibrator(),
        }
    }

    async fn vibrate(&mut self, duration_ms: u16) -> Result<()> {
        match self {
            Self::Mock(device) => device.vibrate(duration_ms).await,
            Self::None(device) => device.vibrate(duration_ms).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClassicCard;

    #[tokio::test]
    async fn test_any_adapter_dispatches_to_mock() {
        let (adapter, handle) = MockAdapter::new();
        let mut adapter = AnyNfcAdapter::Mock(adapter);
        handle
            .tap(MockClassicCard::classic_1k(vec![0x0A, 0x0B, 0x0C, 0x0D]))
            .await
            .unwrap();

        adapter.begin_listening().await.unwrap();
        let tag = adapter.next_tag().await.unwrap();
        let mut session = adapter.open_session(&tag).await.unwrap();
        session.connect().await.unwrap();
        assert!(
            session
                .authenticate_key_a(0, &MifareKey::defaults()[0])
                .await
                .unwrap()
        );
        assert_eq!(session.read_block(0).await.unwrap(), [0u8; BLOCK_SIZE]);
        session.close().await.unwrap();
        assert_eq!(handle.begin_count(), 1);
    }

    #[tokio::test]
    async fn test_any_haptic() {
        let (haptic, handle) = MockHaptic::new();
        let mut haptic = AnyHapticDevice::Mock(haptic);
        haptic.vibrate(200).await.unwrap();
        assert_eq!(handle.pulses(), vec![200]);

        let mut none = AnyHapticDevice::None(NoHaptic);
        assert!(!none.has_vibrator());
        assert!(none.vibrate(200).await.is_ok());
    }
}
