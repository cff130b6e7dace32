//! Common types shared across hardware implementations.
//!
//! This module defines the tag description reported on discovery and the
//! adapter metadata returned by readers.

use serde::{Deserialize, Serialize};
use tapdump_core::{ClassicGeometry, ClassicSubtype, bytes_to_hex_with, constants::UID_SEPARATOR};

/// Radio technology a tag advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Technology {
    /// Mifare Classic (and Plus/Pro in Classic mode).
    MifareClassic,

    /// Mifare Ultralight / NTAG.
    MifareUltralight,

    /// ISO 14443-3A.
    NfcA,

    /// ISO 14443-3B.
    NfcB,

    /// JIS 6319-4 (FeliCa).
    NfcF,

    /// ISO 15693.
    NfcV,

    /// ISO 14443-4.
    IsoDep,

    /// NDEF formatted content.
    Ndef,
}

/// Classic-specific details reported for tags that expose [`Technology::MifareClassic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicInfo {
    /// Declared sub-type.
    pub subtype: ClassicSubtype,

    /// Declared memory topology.
    pub geometry: ClassicGeometry,
}

/// A tag as announced by the reader on discovery.
///
/// # Examples
///
/// ```
/// use tapdump_hardware::types::{TagInfo, Technology};
/// use tapdump_core::{ClassicGeometry, ClassicSubtype};
///
/// let tag = TagInfo::new(vec![0x04, 0xA2, 0x5F, 0x11], vec![Technology::NfcA])
///     .with_classic(ClassicSubtype::Classic, ClassicGeometry::classic_1k());
///
/// assert!(tag.supports(Technology::MifareClassic));
/// assert_eq!(tag.id_string(), "04:A2:5F:11");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    /// Hardware identifier (UID).
    pub id: Vec<u8>,

    /// Advertised technologies, in the order the reader reported them.
    pub technologies: Vec<Technology>,

    /// Classic details, present only for Classic-capable tags.
    pub classic: Option<ClassicInfo>,
}

impl TagInfo {
    /// Create a tag description.
    pub fn new(id: Vec<u8>, technologies: Vec<Technology>) -> Self {
        Self {
            id,
            technologies,
            classic: None,
        }
    }

    /// Attach Classic details, adding the Classic technology if missing.
    pub fn with_classic(mut self, subtype: ClassicSubtype, geometry: ClassicGeometry) -> Self {
        if !self.supports(Technology::MifareClassic) {
            self.technologies.insert(0, Technology::MifareClassic);
        }
        self.classic = Some(ClassicInfo { subtype, geometry });
        self
    }

    /// Check whether the tag advertises `technology`.
    pub fn supports(&self, technology: Technology) -> bool {
        self.technologies.contains(&technology)
    }

    /// UID as colon-separated uppercase hex.
    pub fn id_string(&self) -> String {
        bytes_to_hex_with(&self.id, UID_SEPARATOR)
    }
}

/// NFC adapter information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    /// Adapter name (e.g., "ACS ACR122U PICC Interface").
    pub name: String,

    /// Supported technologies.
    pub technologies: Vec<Technology>,
}

impl AdapterInfo {
    /// Create a new AdapterInfo.
    pub fn new(name: impl Into<String>, technologies: Vec<Technology>) -> Self {
        Self {
            name: name.into(),
            technologies,
        }
    }
}
