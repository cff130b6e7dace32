//! Hardware abstraction layer for tapdump.
//!
//! This crate defines the platform contract used by the acquisition
//! pipeline: an NFC adapter that announces tags, a session on a Mifare
//! Classic tag that authenticates sectors and reads blocks, and an optional
//! haptic device. Mock implementations make the whole pipeline testable
//! without hardware; a PC/SC backend is available behind the
//! `hardware-pcsc` feature.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: Traits are not object-safe; [`devices`] provides
//!   `Any*` enums for concrete dispatch.
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Error-aware**: All operations return `Result<T>` with [`HardwareError`].
//!
//! # Reading a block
//!
//! ```no_run
//! use tapdump_hardware::traits::{ClassicSession, NfcAdapter};
//! use tapdump_hardware::error::Result;
//! use tapdump_core::MifareKey;
//!
//! async fn first_block<A: NfcAdapter>(adapter: &mut A) -> Result<Option<[u8; 16]>> {
//!     let tag = adapter.next_tag().await?;
//!     let mut session = adapter.open_session(&tag).await?;
//!     session.connect().await?;
//!
//!     let key = MifareKey::defaults()[0];
//!     let block = if session.authenticate_key_a(0, &key).await? {
//!         Some(session.read_block(0).await?)
//!     } else {
//!         None
//!     };
//!
//!     session.close().await?;
//!     Ok(block)
//! }
//! ```

pub mod apdu;
pub mod atr;
pub mod devices;
pub mod error;
pub mod mock;
#[cfg(feature = "hardware-pcsc")]
pub mod pcsc;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::{AnyClassicSession, AnyHapticDevice, AnyNfcAdapter, NoHaptic};
pub use error::{HardwareError, Result};
pub use traits::{ClassicSession, HapticDevice, NfcAdapter};
pub use types::{AdapterInfo, ClassicInfo, TagInfo, Technology};
