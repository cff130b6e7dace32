//! Core constants for Mifare Classic acquisition.
//!
//! This module centralises the values that the engine, the acquisition
//! controller and the hardware backends must agree on: block and key sizes,
//! the fixed candidate key list, the debounce window and the diagnostic
//! strings used when a block cannot be read.
//!
//! # Memory Layout
//!
//! A Mifare Classic card is divided into sectors, each made of 16-byte
//! blocks. The last block of every sector is the sector trailer that holds
//! Key A, the access bits and Key B:
//!
//! ```text
//! | Key A (6) | Access bits (4) | Key B (6) |
//! ```
//!
//! # Usage
//!
//! ```
//! use tapdump_core::constants::*;
//!
//! assert_eq!(BLOCK_SIZE, 16);
//! assert_eq!(KEY_LENGTH, 6);
//! assert_eq!(DEFAULT_KEYS.len(), 4);
//! ```

// ============================================================================
// Memory Layout
// ============================================================================

/// Size of a single Mifare Classic block in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Length of a Mifare Classic sector key (Key A or Key B) in bytes.
pub const KEY_LENGTH: usize = 6;

/// Number of blocks in a "small" sector (every sector on 1K/2K cards and
/// sectors 0-31 on 4K cards).
pub const SMALL_SECTOR_BLOCKS: u16 = 4;

/// Number of blocks in a "large" sector (sectors 32-39 on 4K cards).
pub const LARGE_SECTOR_BLOCKS: u16 = 16;

/// Number of small sectors before the large sectors start.
pub const SMALL_SECTOR_COUNT: u16 = 32;

/// Declared size of a Mifare Mini card in bytes.
pub const SIZE_MINI: usize = 320;

/// Declared size of a Mifare Classic 1K card in bytes.
pub const SIZE_1K: usize = 1024;

/// Declared size of a Mifare Classic 2K card in bytes.
pub const SIZE_2K: usize = 2048;

/// Declared size of a Mifare Classic 4K card in bytes.
pub const SIZE_4K: usize = 4096;

// ============================================================================
// Card Identity
// ============================================================================

/// Separator used when rendering a UID canonically (`04:A2:5F:11`).
pub const UID_SEPARATOR: &str = ":";

/// Separator used when rendering block contents (`00 11 22 ...`).
pub const BLOCK_HEX_SEPARATOR: &str = " ";

// ============================================================================
// Authentication
// ============================================================================

/// Candidate keys tried against every sector, in this exact order.
///
/// These are factory and transport defaults found on most blank or
/// lightly provisioned cards:
///
/// 1. `FF FF FF FF FF FF` - factory default
/// 2. `A0 A1 A2 A3 A4 A5` - MAD key A
/// 3. `D3 F7 D3 F7 D3 F7` - NDEF public key A
/// 4. `00 00 00 00 00 00` - all-zero
///
/// This list is a convenience heuristic, not a security boundary.
pub const DEFAULT_KEYS: [[u8; KEY_LENGTH]; 4] = [
    [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
    [0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5],
    [0xD3, 0xF7, 0xD3, 0xF7, 0xD3, 0xF7],
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
];

// ============================================================================
// Read Faults
// ============================================================================

/// Hex rendering stored in a block record when the block read faulted.
///
/// The block keeps its position in the sector and carries zero-filled
/// bytes; this string replaces the hex rendering so the fault stays visible
/// in dumps.
pub const BLOCK_READ_ERROR: &str = "Error reading block";

// ============================================================================
// Acquisition
// ============================================================================

/// Debounce window for repeated detections of the same UID (milliseconds).
///
/// Readers re-announce a tag several times while it stays in the field.
/// A second detection of the same UID inside this window is dropped.
///
/// # Value: 2000ms
///
/// # Examples
///
/// ```
/// use tapdump_core::constants::DEBOUNCE_WINDOW_MS;
/// use std::time::Duration;
///
/// let window = Duration::from_millis(DEBOUNCE_WINDOW_MS);
/// assert_eq!(window.as_secs(), 2);
/// ```
pub const DEBOUNCE_WINDOW_MS: u64 = 2000;

/// Duration of the haptic pulse fired on an accepted detection (milliseconds).
pub const HAPTIC_PULSE_MS: u16 = 200;

/// Default capacity of the acquisition event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 32;
