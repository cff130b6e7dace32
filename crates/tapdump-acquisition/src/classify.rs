//! Card type classification from advertised technologies.

use tapdump_core::CardType;
use tapdump_hardware::{TagInfo, Technology};

/// Label a tag by the first technology it matches.
///
/// Classic tags are labelled by sub-type and size, falling back to the
/// generic Classic label; then Ultralight, NFC-A, NFC-B, and finally
/// `Unknown`.
///
/// # Examples
///
/// ```
/// use tapdump_acquisition::classify;
/// use tapdump_core::{CardType, ClassicGeometry, ClassicSubtype};
/// use tapdump_hardware::{TagInfo, Technology};
///
/// let tag = TagInfo::new(vec![1, 2, 3, 4], vec![Technology::NfcA])
///     .with_classic(ClassicSubtype::Classic, ClassicGeometry::classic_4k());
/// assert_eq!(classify(&tag), CardType::Classic4K);
/// ```
pub fn classify(tag: &TagInfo) -> CardType {
    if tag.supports(Technology::MifareClassic) {
        return match tag.classic {
            Some(info) => CardType::from_classic(info.subtype, info.geometry.size_bytes),
            None => CardType::ClassicGeneric,
        };
    }

    if tag.supports(Technology::MifareUltralight) {
        CardType::Ultralight
    } else if tag.supports(Technology::NfcA) {
        CardType::GenericNfcA
    } else if tag.supports(Technology::NfcB) {
        CardType::GenericNfcB
    } else {
        CardType::Unknown
    }
}
