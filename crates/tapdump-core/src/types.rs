use crate::{
    Result,
    constants::{
        DEFAULT_KEYS, KEY_LENGTH, SIZE_1K, SIZE_2K, SIZE_4K, UID_SEPARATOR,
    },
    error::Error,
    hex::{bytes_to_hex, bytes_to_hex_with, hex_to_bytes},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a detected card: its UID and when it was seen.
///
/// Immutable once built. The UID keeps whatever length the hardware
/// reported and is rendered canonically as colon-separated uppercase hex
/// (`04:A2:5F:11`), also when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardIdentity {
    #[serde(with = "canonical_uid")]
    uid: Vec<u8>,
    discovered_at: DateTime<Utc>,
}

impl CardIdentity {
    /// Create an identity stamped with the current time.
    ///
    /// # Examples
    ///
    /// ```
    /// use tapdump_core::CardIdentity;
    ///
    /// let id = CardIdentity::new(vec![0x04, 0xA2, 0x5F, 0x11]);
    /// assert_eq!(id.uid_string(), "04:A2:5F:11");
    /// ```
    pub fn new(uid: Vec<u8>) -> Self {
        Self::with_timestamp(uid, Utc::now())
    }

    /// Create an identity with an explicit discovery time.
    pub fn with_timestamp(uid: Vec<u8>, discovered_at: DateTime<Utc>) -> Self {
        Self { uid, discovered_at }
    }

    /// Raw UID bytes.
    pub fn uid(&self) -> &[u8] {
        &self.uid
    }

    /// When the card was detected.
    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }

    /// Canonical UID rendering, colon-separated uppercase hex.
    pub fn uid_string(&self) -> String {
        bytes_to_hex_with(&self.uid, UID_SEPARATOR)
    }

    /// UID as plain hex without separators, handy for file names.
    pub fn uid_compact(&self) -> String {
        bytes_to_hex(&self.uid)
    }
}

impl fmt::Display for CardIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.uid_string())
    }
}

mod canonical_uid {
    use super::{UID_SEPARATOR, bytes_to_hex_with, hex_to_bytes};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(uid: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bytes_to_hex_with(uid, UID_SEPARATOR))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex_to_bytes(&text).map_err(D::Error::custom)
    }
}

/// Sub-type a Classic-compatible card reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassicSubtype {
    Classic,
    Plus,
    Pro,
    Unknown,
}

/// Card family label derived once per detection.
///
/// This is a closed set; every detection maps to exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    #[serde(rename = "classic_1k")]
    Classic1K,
    #[serde(rename = "classic_2k")]
    Classic2K,
    #[serde(rename = "classic_4k")]
    Classic4K,
    ClassicGeneric,
    Plus,
    Pro,
    Ultralight,
    GenericNfcA,
    GenericNfcB,
    Unknown,
}

impl CardType {
    /// Label for a card that exposes the Classic technology.
    ///
    /// Size-specific labels win over the generic Classic label; Plus and Pro
    /// sub-types are labelled regardless of size.
    ///
    /// # Examples
    ///
    /// ```
    /// use tapdump_core::{CardType, ClassicSubtype};
    ///
    /// assert_eq!(CardType::from_classic(ClassicSubtype::Classic, 1024), CardType::Classic1K);
    /// assert_eq!(CardType::from_classic(ClassicSubtype::Classic, 320), CardType::ClassicGeneric);
    /// assert_eq!(CardType::from_classic(ClassicSubtype::Plus, 4096), CardType::Plus);
    /// ```
    pub fn from_classic(subtype: ClassicSubtype, size_bytes: usize) -> Self {
        match subtype {
            ClassicSubtype::Classic => match size_bytes {
                SIZE_1K => Self::Classic1K,
                SIZE_2K => Self::Classic2K,
                SIZE_4K => Self::Classic4K,
                _ => Self::ClassicGeneric,
            },
            ClassicSubtype::Plus => Self::Plus,
            ClassicSubtype::Pro => Self::Pro,
            ClassicSubtype::Unknown => Self::ClassicGeneric,
        }
    }

    /// Get a human-readable name for the card type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Classic1K => "Mifare Classic 1K",
            Self::Classic2K => "Mifare Classic 2K",
            Self::Classic4K => "Mifare Classic 4K",
            Self::ClassicGeneric => "Mifare Classic",
            Self::Plus => "Mifare Plus",
            Self::Pro => "Mifare Pro",
            Self::Ultralight => "Mifare Ultralight",
            Self::GenericNfcA => "NFC-A Tag",
            Self::GenericNfcB => "NFC-B Tag",
            Self::Unknown => "Unknown NFC Tag",
        }
    }

    /// Check if this label belongs to the Classic family (including Plus/Pro
    /// running in Classic compatibility mode).
    pub fn is_classic_family(&self) -> bool {
        matches!(
            self,
            Self::Classic1K
                | Self::Classic2K
                | Self::Classic4K
                | Self::ClassicGeneric
                | Self::Plus
                | Self::Pro
        )
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which sector key slot an authentication used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySlot {
    A,
    B,
}

impl fmt::Display for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeySlot::A => write!(f, "Key A"),
            KeySlot::B => write!(f, "Key B"),
        }
    }
}

/// A 6-byte Mifare Classic sector key.
///
/// Parses from and renders to 12 hex digits (separators allowed on input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MifareKey([u8; KEY_LENGTH]);

impl MifareKey {
    /// Wrap raw key bytes.
    pub const fn new(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// The candidate keys in their fixed trial order.
    ///
    /// ```
    /// use tapdump_core::MifareKey;
    ///
    /// let keys = MifareKey::defaults();
    /// assert_eq!(keys[0].to_string(), "FFFFFFFFFFFF");
    /// assert_eq!(keys[3].to_string(), "000000000000");
    /// ```
    pub fn defaults() -> Vec<Self> {
        DEFAULT_KEYS.iter().copied().map(Self).collect()
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Display for MifareKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&bytes_to_hex(&self.0))
    }
}

impl std::str::FromStr for MifareKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex_to_bytes(s).map_err(|e| Error::InvalidKey {
            message: e.to_string(),
        })?;
        let key: [u8; KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| Error::InvalidKey {
            message: format!("expected {KEY_LENGTH} bytes, got {}", b.len()),
        })?;
        Ok(Self(key))
    }
}

impl TryFrom<String> for MifareKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MifareKey> for String {
    fn from(key: MifareKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[test]
    fn test_identity_renders_canonical_uid() {
        let id = CardIdentity::new(vec![0x04, 0xA2, 0x5F, 0x11]);
        assert_eq!(id.uid_string(), "04:A2:5F:11");
        assert_eq!(id.uid_compact(), "04A25F11");
        assert_eq!(id.to_string(), "04:A2:5F:11");
    }

    #[test]
    fn test_identity_keeps_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 10, 30, 14, 35, 22).unwrap();
        let id = CardIdentity::with_timestamp(vec![1, 2, 3, 4, 5, 6, 7], at);
        assert_eq!(id.discovered_at(), at);
        assert_eq!(id.uid().len(), 7);
    }

    #[rstest]
    #[case(vec![0x01, 0x02, 0x03], "01:02:03")]
    #[case(vec![0xAB; 12], "AB:AB:AB:AB:AB:AB:AB:AB:AB:AB:AB:AB")]
    fn test_identity_accepts_any_uid_length(#[case] uid: Vec<u8>, #[case] expected: &str) {
        let id = CardIdentity::new(uid);
        assert_eq!(id.uid_string(), expected);
    }

    #[test]
    fn test_identity_serializes_canonical_uid() {
        let at = Utc.with_ymd_and_hms(2025, 10, 30, 14, 35, 22).unwrap();
        let id = CardIdentity::with_timestamp(vec![0xDE, 0xAD, 0xBE, 0xEF], at);

        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json["uid"], "DE:AD:BE:EF");

        let back: CardIdentity = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[rstest]
    #[case(ClassicSubtype::Classic, 1024, CardType::Classic1K)]
    #[case(ClassicSubtype::Classic, 2048, CardType::Classic2K)]
    #[case(ClassicSubtype::Classic, 4096, CardType::Classic4K)]
    #[case(ClassicSubtype::Classic, 320, CardType::ClassicGeneric)]
    #[case(ClassicSubtype::Plus, 2048, CardType::Plus)]
    #[case(ClassicSubtype::Pro, 1024, CardType::Pro)]
    #[case(ClassicSubtype::Unknown, 1024, CardType::ClassicGeneric)]
    fn test_card_type_from_classic(
        #[case] subtype: ClassicSubtype,
        #[case] size: usize,
        #[case] expected: CardType,
    ) {
        assert_eq!(CardType::from_classic(subtype, size), expected);
    }

    #[test]
    fn test_card_type_names() {
        assert_eq!(CardType::Classic1K.name(), "Mifare Classic 1K");
        assert_eq!(CardType::GenericNfcA.to_string(), "NFC-A Tag");
        assert_eq!(CardType::Unknown.name(), "Unknown NFC Tag");
    }

    #[test]
    fn test_card_type_family() {
        assert!(CardType::Classic4K.is_classic_family());
        assert!(CardType::Pro.is_classic_family());
        assert!(!CardType::Ultralight.is_classic_family());
        assert!(!CardType::Unknown.is_classic_family());
    }

    #[test]
    fn test_card_type_serialization() {
        let json = serde_json::to_string(&CardType::Classic1K).unwrap();
        assert_eq!(json, "\"classic_1k\"");
        let back: CardType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CardType::Classic1K);
    }

    #[test]
    fn test_default_keys_order() {
        let keys: Vec<String> = MifareKey::defaults().iter().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec!["FFFFFFFFFFFF", "A0A1A2A3A4A5", "D3F7D3F7D3F7", "000000000000"]
        );
    }

    #[rstest]
    #[case("a0a1a2a3a4a5")]
    #[case("A0:A1:A2:A3:A4:A5")]
    #[case("A0 A1 A2 A3 A4 A5")]
    fn test_key_parse(#[case] input: &str) {
        let key: MifareKey = input.parse().unwrap();
        assert_eq!(key.as_bytes(), &[0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5]);
    }

    #[rstest]
    #[case("FFFFFFFFFF")]
    #[case("FFFFFFFFFFFFFF")]
    #[case("not a key")]
    fn test_key_parse_invalid(#[case] input: &str) {
        assert!(matches!(
            input.parse::<MifareKey>(),
            Err(Error::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_key_serde_as_string() {
        let key = MifareKey::new([0xD3, 0xF7, 0xD3, 0xF7, 0xD3, 0xF7]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"D3F7D3F7D3F7\"");
        let back: MifareKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
