//! Mifare Classic authentication engine.
//!
//! Given a session on a Classic card, [`MifareReader`] recovers as much of
//! the card's memory as a fixed, ordered list of candidate keys unlocks and
//! returns it as a [`CardSnapshot`].
//!
//! Failure policy:
//!
//! - A sector no key unlocks is recorded with `authenticated = false` and
//!   no blocks. The read continues.
//! - A block read that faults is recorded with zero bytes and the
//!   `"Error reading block"` marker. The sector continues.
//! - Only an unsupported tag or a failed connect aborts the
//!   read. A failed close after a complete dump is reported together with
//!   the snapshot.

pub mod config;
pub mod engine;
pub mod error;
pub mod snapshot;

pub use config::ReaderConfig;
pub use engine::{MifareReader, read_card};
pub use error::{CardReadError, Result};
pub use snapshot::{BlockRecord, BlockStatus, CardSnapshot, SectorKey, SectorRecord};
