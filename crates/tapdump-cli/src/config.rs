//! Configuration file for the `tapdump` binary.
//!
//! ```toml
//! [acquisition]
//! mode = "full_dump"
//! debounce_ms = 2000
//! haptic_pulse_ms = 200
//! event_capacity = 32
//!
//! [reader]
//! extra_keys = ["B0B1B2B3B4B5"]
//!
//! [pcsc]
//! reader = "ACR122"
//! poll_interval_ms = 500
//! ```
//!
//! Every field is optional. Command-line flags win over file values.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tapdump_acquisition::{AcquisitionConfig, AcquisitionMode};
use tapdump_core::{Error, MifareKey, Result};
use tapdump_mifare::ReaderConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub acquisition: AcquisitionSection,
    pub reader: ReaderSection,
    pub pcsc: PcscSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcquisitionSection {
    pub mode: Option<AcquisitionMode>,
    pub debounce_ms: Option<u64>,
    pub haptic_pulse_ms: Option<u16>,
    pub event_capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderSection {
    /// Tried after the default keys.
    pub extra_keys: Vec<MifareKey>,

    /// Drop the default keys and use `extra_keys` alone.
    pub replace_defaults: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PcscSection {
    /// Substring of the reader name to use.
    pub reader: Option<String>,
    pub poll_interval_ms: Option<u64>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub mode: Option<AcquisitionMode>,
    pub extra_keys: Vec<MifareKey>,
}

impl FileConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or names unknown fields.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load `path` if given, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a given file cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    pub fn reader_config(&self, overrides: &Overrides) -> ReaderConfig {
        let base = if self.reader.replace_defaults {
            ReaderConfig::default().with_keys(Vec::new())
        } else {
            ReaderConfig::default()
        };
        base.with_extra_keys(self.reader.extra_keys.iter().copied())
            .with_extra_keys(overrides.extra_keys.iter().copied())
    }

    pub fn acquisition_config(&self, overrides: &Overrides) -> AcquisitionConfig {
        let section = &self.acquisition;
        let mut config = AcquisitionConfig::default().with_reader(self.reader_config(overrides));

        if let Some(mode) = overrides.mode.or(section.mode) {
            config = config.with_mode(mode);
        }
        if let Some(ms) = section.debounce_ms {
            config = config.with_debounce_window(Duration::from_millis(ms));
        }
        if let Some(ms) = section.haptic_pulse_ms {
            config = config.with_haptic_pulse_ms(ms);
        }
        if let Some(capacity) = section.event_capacity {
            config = config.with_event_capacity(capacity);
        }
        config
    }

    #[cfg_attr(not(feature = "hardware-pcsc"), allow(dead_code))]
    pub fn poll_interval(&self) -> Option<Duration> {
        self.pcsc.poll_interval_ms.map(Duration::from_millis)
    }
}
