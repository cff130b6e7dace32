//! Core types for the tapdump Mifare Classic acquisition pipeline.
//!
//! This crate holds everything the other crates agree on: the hex codec,
//! card identity and type model, Mifare Classic memory geometry, the
//! authentication key type and the shared constants.

pub mod constants;
pub mod error;
pub mod geometry;
pub mod hex;
pub mod types;

pub use error::{Error, Result};
pub use geometry::ClassicGeometry;
pub use hex::{bytes_to_hex, bytes_to_hex_with, bytes_to_printable_ascii, hex_to_bytes};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
