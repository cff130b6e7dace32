//! Mifare Classic memory geometry.
//!
//! Every Classic variant uses 4-block sectors for its first 32 sectors. The
//! 4K variant adds 8 more sectors of 16 blocks each, so block addressing is
//! not uniform and has to go through [`sector_to_block`] and
//! [`blocks_in_sector`].
//!
//! ```text
//! 1K: 16 sectors x 4 blocks                   =  64 blocks
//! 2K: 32 sectors x 4 blocks                   = 128 blocks
//! 4K: 32 sectors x 4 blocks + 8 x 16 blocks   = 256 blocks
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{
    BLOCK_SIZE, LARGE_SECTOR_BLOCKS, SIZE_1K, SIZE_2K, SIZE_4K, SIZE_MINI, SMALL_SECTOR_BLOCKS,
    SMALL_SECTOR_COUNT,
};
use crate::{Error, Result};

/// Number of blocks in `sector`.
pub fn blocks_in_sector(sector: u16) -> u16 {
    if sector < SMALL_SECTOR_COUNT {
        SMALL_SECTOR_BLOCKS
    } else {
        LARGE_SECTOR_BLOCKS
    }
}

/// Absolute index of the first block of `sector`.
///
/// ```
/// use tapdump_core::geometry::sector_to_block;
///
/// assert_eq!(sector_to_block(1), 4);
/// assert_eq!(sector_to_block(32), 128);
/// assert_eq!(sector_to_block(33), 144);
/// ```
pub fn sector_to_block(sector: u16) -> u16 {
    if sector < SMALL_SECTOR_COUNT {
        sector * SMALL_SECTOR_BLOCKS
    } else {
        SMALL_SECTOR_COUNT * SMALL_SECTOR_BLOCKS + (sector - SMALL_SECTOR_COUNT) * LARGE_SECTOR_BLOCKS
    }
}

/// Sector that contains absolute block `block`.
pub fn block_to_sector(block: u16) -> u16 {
    let small_blocks = SMALL_SECTOR_COUNT * SMALL_SECTOR_BLOCKS;
    if block < small_blocks {
        block / SMALL_SECTOR_BLOCKS
    } else {
        SMALL_SECTOR_COUNT + (block - small_blocks) / LARGE_SECTOR_BLOCKS
    }
}

/// Check whether `block` is the trailer (keys + access bits) of its sector.
pub fn is_sector_trailer(block: u16) -> bool {
    let sector = block_to_sector(block);
    block == sector_to_block(sector) + blocks_in_sector(sector) - 1
}

/// Declared topology of a Classic card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassicGeometry {
    /// Declared memory size in bytes.
    pub size_bytes: usize,

    /// Number of sectors.
    pub sector_count: u16,

    /// Total number of blocks across all sectors.
    pub block_count: u16,
}

impl ClassicGeometry {
    /// Derive the standard topology for a declared card size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCardSize`] for sizes other than Mini, 1K, 2K
    /// and 4K.
    ///
    /// ```
    /// use tapdump_core::ClassicGeometry;
    ///
    /// let g = ClassicGeometry::from_size(4096).unwrap();
    /// assert_eq!(g.sector_count, 40);
    /// assert_eq!(g.block_count, 256);
    /// ```
    pub fn from_size(size_bytes: usize) -> Result<Self> {
        let sector_count = match size_bytes {
            SIZE_MINI => 5,
            SIZE_1K => 16,
            SIZE_2K => 32,
            SIZE_4K => 40,
            other => return Err(Error::UnknownCardSize(other)),
        };

        Ok(Self {
            size_bytes,
            sector_count,
            block_count: (size_bytes / BLOCK_SIZE) as u16,
        })
    }

    /// Mifare Classic 1K topology.
    pub fn classic_1k() -> Self {
        Self {
            size_bytes: SIZE_1K,
            sector_count: 16,
            block_count: 64,
        }
    }

    /// Mifare Classic 4K topology.
    pub fn classic_4k() -> Self {
        Self {
            size_bytes: SIZE_4K,
            sector_count: 40,
            block_count: 256,
        }
    }

    /// Human readable size, e.g. `"1K (1024 bytes)"`.
    pub fn size_name(&self) -> String {
        match self.size_bytes {
            SIZE_MINI => format!("Mini ({SIZE_MINI} bytes)"),
            SIZE_1K => format!("1K ({SIZE_1K} bytes)"),
            SIZE_2K => format!("2K ({SIZE_2K} bytes)"),
            SIZE_4K => format!("4K ({SIZE_4K} bytes)"),
            other => format!("Unknown ({other} bytes)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, 4)]
    #[case(15, 60, 4)]
    #[case(31, 124, 4)]
    #[case(32, 128, 16)]
    #[case(39, 240, 16)]
    fn test_sector_layout(#[case] sector: u16, #[case] first: u16, #[case] count: u16) {
        assert_eq!(sector_to_block(sector), first);
        assert_eq!(blocks_in_sector(sector), count);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(7, 1)]
    #[case(127, 31)]
    #[case(128, 32)]
    #[case(143, 32)]
    #[case(144, 33)]
    #[case(255, 39)]
    fn test_block_to_sector(#[case] block: u16, #[case] sector: u16) {
        assert_eq!(block_to_sector(block), sector);
    }

    #[test]
    fn test_sector_trailers() {
        assert!(is_sector_trailer(3));
        assert!(!is_sector_trailer(4));
        assert!(is_sector_trailer(127));
        assert!(!is_sector_trailer(131));
        assert!(is_sector_trailer(143));
        assert!(is_sector_trailer(255));
    }

    #[rstest]
    #[case(SIZE_MINI, 5, 20)]
    #[case(SIZE_1K, 16, 64)]
    #[case(SIZE_2K, 32, 128)]
    #[case(SIZE_4K, 40, 256)]
    fn test_geometry_from_size(#[case] size: usize, #[case] sectors: u16, #[case] blocks: u16) {
        let g = ClassicGeometry::from_size(size).unwrap();
        assert_eq!(g.sector_count, sectors);
        assert_eq!(g.block_count, blocks);

        let last = sectors - 1;
        assert_eq!(sector_to_block(last) + blocks_in_sector(last), blocks);
    }

    #[test]
    fn test_geometry_unknown_size() {
        assert_eq!(
            ClassicGeometry::from_size(512),
            Err(Error::UnknownCardSize(512))
        );
    }

    #[test]
    fn test_size_name() {
        assert_eq!(ClassicGeometry::classic_1k().size_name(), "1K (1024 bytes)");
        assert_eq!(ClassicGeometry::classic_4k().size_name(), "4K (4096 bytes)");
    }
}
