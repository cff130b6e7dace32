//! Reader configuration.

use serde::{Deserialize, Serialize};
use tapdump_core::MifareKey;

/// Candidate keys the engine tries on every sector.
///
/// # Examples
///
/// ```
/// use tapdump_mifare::ReaderConfig;
/// use tapdump_core::MifareKey;
///
/// let extra: MifareKey = "B0B1B2B3B4B5".parse().unwrap();
/// let config = ReaderConfig::default().with_extra_keys([extra]);
///
/// assert_eq!(config.keys.len(), 5);
/// assert_eq!(config.keys[0], MifareKey::defaults()[0]);
/// assert_eq!(config.keys[4], extra);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Keys in trial order. Each is tried as Key A, then as Key B.
    pub keys: Vec<MifareKey>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            keys: MifareKey::defaults(),
        }
    }
}

impl ReaderConfig {
    /// Replace the candidate list entirely.
    pub fn with_keys(mut self, keys: Vec<MifareKey>) -> Self {
        self.keys = keys;
        self
    }

    /// Append keys after the current list, skipping ones already present.
    pub fn with_extra_keys(mut self, keys: impl IntoIterator<Item = MifareKey>) -> Self {
        for key in keys {
            if !self.keys.contains(&key) {
                self.keys.push(key);
            }
        }
        self
    }
}
