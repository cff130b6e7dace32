//! Card identification from PC/SC storage-card ATRs.
//!
//! Contactless readers synthesize an ATR for storage cards that embeds the
//! PC/SC registered application provider (RID `A0 00 00 03 06`), the card
//! standard and a two-byte card name. Only the card name is needed here.

use crate::types::{TagInfo, Technology};
use tapdump_core::{
    ClassicGeometry, ClassicSubtype,
    constants::{SIZE_1K, SIZE_4K, SIZE_MINI},
};

/// PC/SC registered application provider identifier.
const PCSC_RID: [u8; 5] = [0xA0, 0x00, 0x00, 0x03, 0x06];

/// Offset of the RID inside the ATR historical bytes.
const RID_OFFSET: usize = 7;

/// Offset of the card name bytes.
const CARD_NAME_OFFSET: usize = 13;

/// Card family announced by an ATR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtrCard {
    /// Mifare Classic with the given topology.
    Classic(ClassicGeometry),

    /// Mifare Ultralight.
    Ultralight,

    /// A storage card this crate does not read.
    Other(u16),

    /// Not a PC/SC storage-card ATR.
    Unrecognized,
}

/// Identify the card behind `atr`.
///
/// # Examples
///
/// ```
/// use tapdump_hardware::atr::{identify, AtrCard};
/// use tapdump_core::ClassicGeometry;
///
/// let atr = [
///     0x3B, 0x8F, 0x80, 0x01, 0x80, 0x4F, 0x0C, 0xA0, 0x00, 0x00, 0x03, 0x06,
///     0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x6A,
/// ];
/// assert_eq!(identify(&atr), AtrCard::Classic(ClassicGeometry::classic_1k()));
/// ```
pub fn identify(atr: &[u8]) -> AtrCard {
    if atr.len() < CARD_NAME_OFFSET + 2 || atr[RID_OFFSET..RID_OFFSET + 5] != PCSC_RID {
        return AtrCard::Unrecognized;
    }

    let name = u16::from_be_bytes([atr[CARD_NAME_OFFSET], atr[CARD_NAME_OFFSET + 1]]);
    let classic = |size| {
        ClassicGeometry::from_size(size)
            .map(AtrCard::Classic)
            .unwrap_or(AtrCard::Other(name))
    };

    match name {
        0x0001 => classic(SIZE_1K),
        0x0002 => classic(SIZE_4K),
        0x0003 => AtrCard::Ultralight,
        0x0026 => classic(SIZE_MINI),
        other => AtrCard::Other(other),
    }
}

/// Build the tag description for a card with `uid` and `atr`.
pub fn tag_info(uid: Vec<u8>, atr: &[u8]) -> TagInfo {
    match identify(atr) {
        AtrCard::Classic(geometry) => TagInfo::new(uid, vec![Technology::NfcA])
            .with_classic(ClassicSubtype::Classic, geometry),
        AtrCard::Ultralight => TagInfo::new(
            uid,
            vec![Technology::MifareUltralight, Technology::NfcA],
        ),
        AtrCard::Other(_) => TagInfo::new(uid, vec![Technology::NfcA]),
        AtrCard::Unrecognized => TagInfo::new(uid, Vec::new()),
    }
}
