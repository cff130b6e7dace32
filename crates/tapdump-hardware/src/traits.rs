//! Hardware trait definitions.
//!
//! This module defines the contract between the acquisition pipeline and the
//! platform: an adapter that can be switched into listening mode and yields
//! discovered tags, a Classic card session that exposes authentication and
//! block reads, and an optional haptic device for tap feedback.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{AdapterInfo, ClassicInfo, TagInfo};
use tapdump_core::{MifareKey, constants::BLOCK_SIZE, geometry};

/// NFC adapter capability.
///
/// Keeps tag handling hardware-agnostic: the controller only needs to know
/// whether an adapter exists, whether it is switched on, how to start and
/// stop discovery, and how to open a session on a discovered tag.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`, which is an opaque type that cannot be used in trait objects
/// (Edition 2024 RPITIT). You cannot use `Box<dyn NfcAdapter>`.
///
/// Use generic parameters, or [`AnyNfcAdapter`](crate::devices::AnyNfcAdapter)
/// for concrete dispatch.
///
/// # Examples
///
/// ```no_run
/// use tapdump_hardware::traits::NfcAdapter;
/// use tapdump_hardware::error::Result;
///
/// async fn first_uid<A: NfcAdapter>(adapter: &mut A) -> Result<String> {
///     adapter.begin_listening().await?;
///     let tag = adapter.next_tag().await?;
///     adapter.end_listening().await?;
///     Ok(tag.id_string())
/// }
/// ```
pub trait NfcAdapter: Send + Sync {
    /// Session type opened on discovered tags.
    type Session: ClassicSession;

    /// Check whether an adapter is present at all.
    fn is_available(&self) -> bool;

    /// Check whether the adapter is switched on.
    fn is_enabled(&self) -> bool;

    /// Start tag discovery.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter refuses to enter discovery mode.
    async fn begin_listening(&mut self) -> Result<()>;

    /// Stop tag discovery.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter cannot be switched out of discovery.
    async fn end_listening(&mut self) -> Result<()>;

    /// Wait for the next discovered tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter is disconnected or its event source
    /// closes.
    async fn next_tag(&mut self) -> Result<TagInfo>;

    /// Open an unconnected session on a discovered tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is unknown to the adapter.
    async fn open_session(&mut self, tag: &TagInfo) -> Result<Self::Session>;

    /// Get adapter information.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter cannot be queried.
    async fn get_adapter_info(&self) -> Result<AdapterInfo>;
}

/// A session on a single Mifare Classic tag.
///
/// A session starts unconnected. `connect` must succeed before any
/// authentication or read; `close` releases the link. Authentication state is
/// session-global: reading a block requires that its sector was the last one
/// authenticated.
///
/// Authentication methods distinguish a refused key (`Ok(false)`) from a
/// transport fault (`Err`).
pub trait ClassicSession: Send + Sync {
    /// Tag this session was opened on.
    fn tag(&self) -> &TagInfo;

    /// Declared Classic details, `None` if the tag is not Classic-capable.
    fn classic_info(&self) -> Option<ClassicInfo> {
        self.tag().classic
    }

    /// Number of blocks in `sector`.
    fn blocks_in_sector(&self, sector: u16) -> u16 {
        geometry::blocks_in_sector(sector)
    }

    /// Absolute index of the first block of `sector`.
    fn sector_to_block(&self, sector: u16) -> u16 {
        geometry::sector_to_block(sector)
    }

    /// Open the radio link to the tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be reached.
    async fn connect(&mut self) -> Result<()>;

    /// Authenticate `sector` with `key` as Key A.
    ///
    /// # Errors
    ///
    /// Returns an error on transport faults; a refused key is `Ok(false)`.
    async fn authenticate_key_a(&mut self, sector: u16, key: &MifareKey) -> Result<bool>;

    /// Authenticate `sector` with `key` as Key B.
    ///
    /// # Errors
    ///
    /// Returns an error on transport faults; a refused key is `Ok(false)`.
    async fn authenticate_key_b(&mut self, sector: u16, key: &MifareKey) -> Result<bool>;

    /// Read one 16-byte block by absolute index.
    ///
    /// # Errors
    ///
    /// Returns an error if the block cannot be read (tag lost, sector not
    /// authenticated, reader fault).
    async fn read_block(&mut self, block: u16) -> Result<[u8; BLOCK_SIZE]>;

    /// Release the radio link.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be released cleanly.
    async fn close(&mut self) -> Result<()>;
}

/// Haptic (or audible) feedback on an accepted tap.
pub trait HapticDevice: Send + Sync {
    /// Check whether the device can produce feedback at all.
    fn has_vibrator(&self) -> bool;

    /// Pulse for `duration_ms` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the pulse could not be produced.
    async fn vibrate(&mut self, duration_ms: u16) -> Result<()>;
}
