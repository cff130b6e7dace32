//! Records produced by a card read.
//!
//! A [`CardSnapshot`] is assembled once per connected read and never changes
//! afterwards. Its shape always matches the card's geometry: locked sectors
//! are present with no blocks, and faulted blocks are present with sentinel
//! contents.

use serde::Serialize;
use std::fmt::Write as _;
use tapdump_core::{
    CardIdentity, CardType, ClassicGeometry, KeySlot, MifareKey, bytes_to_hex_with,
    bytes_to_printable_ascii,
    constants::{BLOCK_HEX_SEPARATOR, BLOCK_READ_ERROR, BLOCK_SIZE},
};

/// Outcome of a single block read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    Read,
    Faulted,
}

/// One 16-byte block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRecord {
    index: u16,
    data: [u8; BLOCK_SIZE],
    hex: String,
    ascii: String,
    status: BlockStatus,
}

impl BlockRecord {
    /// Record a successfully read block.
    ///
    /// ```
    /// use tapdump_mifare::BlockRecord;
    ///
    /// let block = BlockRecord::read(4, *b"Hello, Mifare!\x00\x01");
    /// assert_eq!(block.ascii(), "Hello, Mifare!..");
    /// assert!(block.hex().starts_with("48 65 6C"));
    /// ```
    pub fn read(index: u16, data: [u8; BLOCK_SIZE]) -> Self {
        Self {
            index,
            hex: bytes_to_hex_with(&data, BLOCK_HEX_SEPARATOR),
            ascii: bytes_to_printable_ascii(&data),
            data,
            status: BlockStatus::Read,
        }
    }

    /// Record a block whose read faulted: zero bytes and a diagnostic marker.
    pub fn faulted(index: u16) -> Self {
        let data = [0u8; BLOCK_SIZE];
        Self {
            index,
            hex: BLOCK_READ_ERROR.to_string(),
            ascii: bytes_to_printable_ascii(&data),
            data,
            status: BlockStatus::Faulted,
        }
    }

    /// Absolute block index.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Block contents (zeros when faulted).
    pub fn data(&self) -> &[u8; BLOCK_SIZE] {
        &self.data
    }

    /// Space-separated hex, or the diagnostic marker when faulted.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Printable ASCII rendering of the contents.
    pub fn ascii(&self) -> &str {
        &self.ascii
    }

    pub fn status(&self) -> BlockStatus {
        self.status
    }

    pub fn is_faulted(&self) -> bool {
        self.status == BlockStatus::Faulted
    }
}

/// Key that unlocked a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectorKey {
    pub slot: KeySlot,
    pub key: MifareKey,
}

/// One sector. Locked sectors never carry blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectorRecord {
    index: u16,
    authenticated: bool,
    unlocked_by: Option<SectorKey>,
    blocks: Vec<BlockRecord>,
}

impl SectorRecord {
    /// A sector no candidate key unlocked.
    pub fn locked(index: u16) -> Self {
        Self {
            index,
            authenticated: false,
            unlocked_by: None,
            blocks: Vec::new(),
        }
    }

    /// A sector unlocked by `key`, with its blocks in ascending order.
    pub fn unlocked(index: u16, key: SectorKey, blocks: Vec<BlockRecord>) -> Self {
        Self {
            index,
            authenticated: true,
            unlocked_by: Some(key),
            blocks,
        }
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Slot and key that unlocked this sector, if any.
    pub fn unlocked_by(&self) -> Option<&SectorKey> {
        self.unlocked_by.as_ref()
    }

    pub fn blocks(&self) -> &[BlockRecord] {
        &self.blocks
    }
}

/// Everything recovered from one connected read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardSnapshot {
    identity: CardIdentity,
    card_type: CardType,
    size_bytes: usize,
    sector_count: u16,
    block_count: u16,
    sectors: Vec<SectorRecord>,
    raw_dump: String,
}

impl CardSnapshot {
    /// Assemble a snapshot and render its raw dump.
    pub fn new(
        identity: CardIdentity,
        card_type: CardType,
        geometry: ClassicGeometry,
        sectors: Vec<SectorRecord>,
    ) -> Self {
        let raw_dump = render_dump(&sectors, false);
        Self {
            identity,
            card_type,
            size_bytes: geometry.size_bytes,
            sector_count: geometry.sector_count,
            block_count: geometry.block_count,
            sectors,
            raw_dump,
        }
    }

    pub fn identity(&self) -> &CardIdentity {
        &self.identity
    }

    pub fn card_type(&self) -> CardType {
        self.card_type
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn sector_count(&self) -> u16 {
        self.sector_count
    }

    pub fn block_count(&self) -> u16 {
        self.block_count
    }

    /// Sectors indexed by sector number.
    pub fn sectors(&self) -> &[SectorRecord] {
        &self.sectors
    }

    /// Number of sectors a candidate key unlocked.
    pub fn authenticated_sectors(&self) -> usize {
        self.sectors.iter().filter(|s| s.is_authenticated()).count()
    }

    /// Number of blocks that faulted on read.
    pub fn faulted_blocks(&self) -> usize {
        self.sectors
            .iter()
            .flat_map(|s| s.blocks())
            .filter(|b| b.is_faulted())
            .count()
    }

    /// Plain-text dump: `Sector N:` headers followed by `  Block M: <hex>`
    /// lines, one blank line after each sector.
    pub fn raw_dump(&self) -> &str {
        &self.raw_dump
    }

    /// Raw dump with a printable ASCII column after each read block.
    pub fn annotated_dump(&self) -> String {
        render_dump(&self.sectors, true)
    }
}

fn render_dump(sectors: &[SectorRecord], with_ascii: bool) -> String {
    let mut out = String::new();
    for sector in sectors {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "Sector {}:", sector.index());
        for block in sector.blocks() {
            if with_ascii && !block.is_faulted() {
                let _ = writeln!(out, "  Block {}: {}  |{}|", block.index(), block.hex(), block.ascii());
            } else {
                let _ = writeln!(out, "  Block {}: {}", block.index(), block.hex());
            }
        }
        out.push('\n');
    }
    out
}
