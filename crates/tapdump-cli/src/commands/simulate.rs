//! `tapdump simulate`: run the pipeline against a scripted card.

use crate::config::{FileConfig, Overrides};
use crate::output::OutputFormat;
use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use std::time::Duration;
use tapdump_acquisition::{AcquisitionController, AcquisitionEvent};
use tapdump_core::{
    ClassicGeometry, KeySlot, MifareKey, hex_to_bytes,
    constants::{SIZE_1K, SIZE_2K, SIZE_4K, SIZE_MINI},
};
use tapdump_hardware::{
    AnyHapticDevice, AnyNfcAdapter,
    mock::{MockAdapter, MockClassicCard, MockHaptic},
};
use tokio::time::timeout;

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CardSize {
    Mini,
    #[value(name = "1k")]
    OneK,
    #[value(name = "2k")]
    TwoK,
    #[value(name = "4k")]
    FourK,
}

impl CardSize {
    fn bytes(self) -> usize {
        match self {
            CardSize::Mini => SIZE_MINI,
            CardSize::OneK => SIZE_1K,
            CardSize::TwoK => SIZE_2K,
            CardSize::FourK => SIZE_4K,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Slot {
    A,
    B,
}

impl From<Slot> for KeySlot {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::A => KeySlot::A,
            Slot::B => KeySlot::B,
        }
    }
}

/// Description of the simulated card.
#[derive(Debug, Clone)]
pub struct SimulatedCard {
    pub uid: String,
    pub size: CardSize,
    pub card_key: Option<MifareKey>,
    pub slot: Slot,
    pub locked: Vec<u16>,
    pub faulty_blocks: Vec<u16>,
}

impl SimulatedCard {
    fn build(&self) -> Result<MockClassicCard> {
        let uid = hex_to_bytes(&self.uid).with_context(|| format!("invalid UID '{}'", self.uid))?;
        let geometry = ClassicGeometry::from_size(self.size.bytes())?;

        let mut card = MockClassicCard::classic(uid, geometry);
        if let Some(key) = self.card_key {
            card = card.with_all_sectors_key(self.slot.into(), key);
        }
        for &sector in &self.locked {
            if sector >= geometry.sector_count {
                bail!("sector {sector} is out of range for a {}", geometry.size_name());
            }
            card = card.with_locked_sector(sector);
        }
        for &block in &self.faulty_blocks {
            if block >= geometry.block_count {
                bail!("block {block} is out of range for a {}", geometry.size_name());
            }
            card = card.with_faulty_block(block);
        }
        Ok(card)
    }
}

pub async fn run(
    config: &FileConfig,
    card: &SimulatedCard,
    overrides: Overrides,
    format: OutputFormat,
) -> Result<()> {
    let card = card.build()?;
    let acquisition = config.acquisition_config(&overrides);
    let dumping = acquisition.mode == tapdump_acquisition::AcquisitionMode::FullDump;

    let (adapter, cards) = MockAdapter::with_name("Simulated reader");
    let (haptic, pulses) = MockHaptic::new();
    let mut handle = AcquisitionController::spawn(
        AnyNfcAdapter::Mock(adapter),
        AnyHapticDevice::Mock(haptic),
        acquisition,
    );

    cards.tap(card.clone()).await?;

    // A tap yields a detection, followed by the dump when one was requested.
    let expected = if dumping { 2 } else { 1 };
    let mut seen = 0;
    while seen < expected {
        let event = timeout(EVENT_TIMEOUT, handle.recv())
            .await
            .context("simulated card produced no event")?;
        let Some(event) = event else { break };

        super::print_event(&event, format)?;
        match event {
            AcquisitionEvent::NotSupported | AcquisitionEvent::Disabled => break,
            _ => seen += 1,
        }
    }

    handle.shutdown().await?;
    tracing::debug!(
        pulses = pulses.pulses().len(),
        closes = card.journal().close_count(),
        "simulation finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapdump_acquisition::AcquisitionMode;

    fn card() -> SimulatedCard {
        SimulatedCard {
            uid: "04:A2:5F:11".to_string(),
            size: CardSize::OneK,
            card_key: None,
            slot: Slot::A,
            locked: Vec::new(),
            faulty_blocks: Vec::new(),
        }
    }

    #[test]
    fn test_build_default_card() {
        let mock = card().build().unwrap();
        assert_eq!(mock.tag().id, vec![0x04, 0xA2, 0x5F, 0x11]);
    }

    #[test]
    fn test_build_rejects_out_of_range_sector() {
        let mut description = card();
        description.size = CardSize::Mini;
        description.locked = vec![5];
        assert!(description.build().is_err());
    }

    #[test]
    fn test_build_rejects_bad_uid() {
        let mut description = card();
        description.uid = "04:A2:5".to_string();
        assert!(description.build().is_err());
    }

    #[tokio::test]
    async fn test_simulated_dump_runs() {
        let overrides = Overrides {
            mode: Some(AcquisitionMode::FullDump),
            ..Overrides::default()
        };
        let mut description = card();
        description.locked = vec![2];
        description.faulty_blocks = vec![5];

        run(&FileConfig::default(), &description, overrides, OutputFormat::Json)
            .await
            .unwrap();
    }
}
