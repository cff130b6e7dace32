//! `tapdump listen`: acquire cards from a PC/SC reader.

use crate::config::{FileConfig, Overrides};
use crate::output::OutputFormat;
use anyhow::Result;

/// Options of the `listen` command.
#[cfg_attr(not(feature = "hardware-pcsc"), allow(dead_code))]
#[derive(Debug, Clone)]
pub struct ListenOptions {
    pub reader: Option<String>,
    pub overrides: Overrides,
    pub format: OutputFormat,
}

#[cfg(feature = "hardware-pcsc")]
pub async fn run(config: &FileConfig, options: ListenOptions) -> Result<()> {
    use tapdump_acquisition::AcquisitionController;
    use tapdump_hardware::{AnyHapticDevice, AnyNfcAdapter, NoHaptic, pcsc::PcscAdapter};

    let reader = options.reader.as_deref().or(config.pcsc.reader.as_deref());
    let mut adapter = PcscAdapter::open(reader);
    if let Some(interval) = config.poll_interval() {
        adapter = adapter.with_poll_interval(interval);
    }

    let acquisition = config.acquisition_config(&options.overrides);
    tracing::info!(mode = ?acquisition.mode, keys = acquisition.reader.keys.len(), "listening for cards");

    let handle = AcquisitionController::spawn(
        AnyNfcAdapter::Pcsc(adapter),
        AnyHapticDevice::None(NoHaptic),
        acquisition,
    );
    super::print_until_interrupted(handle, options.format).await
}

#[cfg(not(feature = "hardware-pcsc"))]
pub async fn run(_config: &FileConfig, _options: ListenOptions) -> Result<()> {
    anyhow::bail!("tapdump was built without reader support; rebuild with --features hardware-pcsc")
}
