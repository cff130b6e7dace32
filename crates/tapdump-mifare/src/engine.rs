//! Sector-by-sector authentication and dump.
//!
//! The engine connects once, walks every sector in order, tries each
//! candidate key as Key A and then Key B, reads every block of an unlocked
//! sector and closes the session exactly once. Refused keys and faulted
//! blocks degrade the snapshot; only connect failures abort the read.

use crate::{
    config::ReaderConfig,
    error::{CardReadError, Result},
    snapshot::{BlockRecord, CardSnapshot, SectorKey, SectorRecord},
};
use tapdump_core::{CardIdentity, CardType, KeySlot};
use tapdump_hardware::traits::ClassicSession;
use tracing::{debug, warn};

/// Mifare Classic dump engine.
///
/// # Examples
///
/// ```
/// use tapdump_mifare::MifareReader;
/// use tapdump_hardware::mock::MockClassicCard;
///
/// #[tokio::main]
/// async fn main() -> tapdump_mifare::Result<()> {
///     let card = MockClassicCard::classic_1k(vec![0x04, 0xA2, 0x5F, 0x11]);
///     let mut session = card.session();
///
///     let snapshot = MifareReader::default().read_card(&mut session).await?;
///     assert_eq!(snapshot.sector_count(), 16);
///     assert_eq!(snapshot.authenticated_sectors(), 16);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MifareReader {
    config: ReaderConfig,
}

impl MifareReader {
    /// Create a reader with the given candidate keys.
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read everything the candidate keys unlock.
    ///
    /// # Errors
    ///
    /// - [`CardReadError::UnsupportedCard`] if the tag is not Classic-capable.
    /// - [`CardReadError::Session`] if `connect` fails. `close` is not called.
    /// - [`CardReadError::Release`] if the dump completed but `close` failed;
    ///   the error carries the snapshot.
    pub async fn read_card<S: ClassicSession>(&self, session: &mut S) -> Result<CardSnapshot> {
        let Some(info) = session.classic_info() else {
            return Err(CardReadError::unsupported(session.tag().technologies.clone()));
        };
        let identity = CardIdentity::new(session.tag().id.clone());
        let card_type = CardType::from_classic(info.subtype, info.geometry.size_bytes);

        session.connect().await.map_err(CardReadError::Session)?;

        debug!(
            uid = %identity,
            card_type = %card_type,
            sectors = info.geometry.sector_count,
            "reading card"
        );

        let mut sectors = Vec::with_capacity(usize::from(info.geometry.sector_count));
        for sector in 0..info.geometry.sector_count {
            sectors.push(self.read_sector(session, sector).await);
        }

        let snapshot = CardSnapshot::new(identity, card_type, info.geometry, sectors);

        match session.close().await {
            Ok(()) => Ok(snapshot),
            Err(source) => {
                warn!(error = %source, "failed to release card session");
                Err(CardReadError::Release {
                    source,
                    snapshot: Box::new(snapshot),
                })
            }
        }
    }

    async fn read_sector<S: ClassicSession>(&self, session: &mut S, sector: u16) -> SectorRecord {
        let Some(key) = self.unlock_sector(session, sector).await else {
            warn!(sector, "could not authenticate sector");
            return SectorRecord::locked(sector);
        };

        let first = session.sector_to_block(sector);
        let count = session.blocks_in_sector(sector);
        let mut blocks = Vec::with_capacity(usize::from(count));

        for block in first..first + count {
            match session.read_block(block).await {
                Ok(data) => blocks.push(BlockRecord::read(block, data)),
                Err(e) => {
                    warn!(sector, block, error = %e, "error reading block");
                    blocks.push(BlockRecord::faulted(block));
                }
            }
        }

        SectorRecord::unlocked(sector, key, blocks)
    }

    /// Try every candidate key, Key A before Key B, until one is accepted.
    async fn unlock_sector<S: ClassicSession>(&self, session: &mut S, sector: u16) -> Option<SectorKey> {
        for key in &self.config.keys {
            for slot in [KeySlot::A, KeySlot::B] {
                let outcome = match slot {
                    KeySlot::A => session.authenticate_key_a(sector, key).await,
                    KeySlot::B => session.authenticate_key_b(sector, key).await,
                };

                match outcome {
                    Ok(true) => {
                        debug!(sector, %slot, %key, "sector authenticated");
                        return Some(SectorKey { slot, key: *key });
                    }
                    Ok(false) => {}
                    Err(e) => debug!(sector, %slot, error = %e, "authentication attempt faulted"),
                }
            }
        }
        None
    }
}

/// Read `session` with the default candidate keys.
///
/// # Errors
///
/// See [`MifareReader::read_card`].
pub async fn read_card<S: ClassicSession>(session: &mut S) -> Result<CardSnapshot> {
    MifareReader::default().read_card(session).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::BlockStatus;
    use rstest::rstest;
    use tapdump_core::{MifareKey, constants::BLOCK_SIZE};
    use tapdump_hardware::{
        HardwareError, TagInfo, Technology,
        mock::{MockClassicCard, SessionCall},
    };

    const UID: [u8; 4] = [0x04, 0xA2, 0x5F, 0x11];

    fn card() -> MockClassicCard {
        MockClassicCard::classic_1k(UID.to_vec())
    }

    #[tokio::test]
    async fn test_full_1k_dump() {
        let card = card();
        let snapshot = read_card(&mut card.session()).await.unwrap();

        assert_eq!(snapshot.identity().uid_string(), "04:A2:5F:11");
        assert_eq!(snapshot.card_type(), CardType::Classic1K);
        assert_eq!(snapshot.size_bytes(), 1024);
        assert_eq!(snapshot.sector_count(), 16);
        assert_eq!(snapshot.block_count(), 64);
        assert!(snapshot.sectors().iter().all(|s| s.is_authenticated()));
        assert!(snapshot.sectors().iter().all(|s| s.blocks().len() == 4));

        let dump = snapshot.raw_dump();
        assert_eq!(dump.matches("Sector ").count(), 16);
        assert_eq!(dump.matches("  Block ").count(), 64);
        assert!(dump.starts_with("Sector 0:\n  Block 0: 00 00"));
    }

    #[tokio::test]
    async fn test_third_key_as_key_b() {
        let third = MifareKey::defaults()[2];
        let card = card().with_sector_key(2, KeySlot::B, third);
        let journal = card.journal();

        let snapshot = read_card(&mut card.session()).await.unwrap();

        let defaults = MifareKey::defaults();
        assert_eq!(
            journal.auth_attempts(2),
            vec![
                (KeySlot::A, defaults[0]),
                (KeySlot::B, defaults[0]),
                (KeySlot::A, defaults[1]),
                (KeySlot::B, defaults[1]),
                (KeySlot::A, defaults[2]),
                (KeySlot::B, defaults[2]),
            ]
        );

        let sector = &snapshot.sectors()[2];
        assert!(sector.is_authenticated());
        assert_eq!(
            sector.unlocked_by(),
            Some(&SectorKey {
                slot: KeySlot::B,
                key: third
            })
        );
    }

    #[tokio::test]
    async fn test_key_a_success_skips_key_b() {
        let card = card();
        let journal = card.journal();
        read_card(&mut card.session()).await.unwrap();

        assert_eq!(
            journal.auth_attempts(0),
            vec![(KeySlot::A, MifareKey::defaults()[0])]
        );
    }

    #[tokio::test]
    async fn test_exhausted_sector_is_local() {
        let card = card().with_locked_sector(0);
        let journal = card.journal();

        let snapshot = read_card(&mut card.session()).await.unwrap();

        let sector = &snapshot.sectors()[0];
        assert_eq!(sector.index(), 0);
        assert!(!sector.is_authenticated());
        assert!(sector.blocks().is_empty());

        assert_eq!(journal.auth_attempts(0).len(), 8);
        assert!(!journal.auth_attempts(1).is_empty());
        assert!(snapshot.sectors()[1].is_authenticated());
        assert!(journal.blocks_read().iter().all(|&b| b >= 4));
    }

    #[tokio::test]
    async fn test_every_sector_locked_still_succeeds() {
        let card = card().with_all_sectors_locked();
        let journal = card.journal();

        let snapshot = read_card(&mut card.session()).await.unwrap();

        assert_eq!(snapshot.authenticated_sectors(), 0);
        assert_eq!(snapshot.sectors().len(), 16);
        assert!(journal.blocks_read().is_empty());
        assert_eq!(journal.close_count(), 1);
    }

    fn full_trial_order() -> Vec<(KeySlot, MifareKey)> {
        MifareKey::defaults()
            .into_iter()
            .flat_map(|key| [(KeySlot::A, key), (KeySlot::B, key)])
            .collect()
    }

    #[tokio::test]
    async fn test_auth_fault_falls_through() {
        let card = card().with_auth_fault(1);
        let journal = card.journal();

        let snapshot = read_card(&mut card.session()).await.unwrap();

        assert_eq!(journal.auth_attempts(1), full_trial_order());
        assert!(!snapshot.sectors()[1].is_authenticated());
        assert!(snapshot.sectors()[1].blocks().is_empty());
        assert!(snapshot.sectors()[2].is_authenticated());
    }

    #[tokio::test]
    async fn test_key_a_fault_retries_same_key_as_b() {
        let card = card().with_slot_fault(1, KeySlot::A);
        let journal = card.journal();

        let snapshot = read_card(&mut card.session()).await.unwrap();

        let factory = MifareKey::defaults()[0];
        assert_eq!(
            journal.auth_attempts(1),
            vec![(KeySlot::A, factory), (KeySlot::B, factory)]
        );
        let sector = &snapshot.sectors()[1];
        assert!(sector.is_authenticated());
        assert_eq!(sector.unlocked_by().map(|k| k.slot), Some(KeySlot::B));
        assert_eq!(sector.blocks().len(), 4);
    }

    #[tokio::test]
    async fn test_partial_block_fault() {
        let card = card()
            .with_block(4, [0x44; BLOCK_SIZE])
            .with_faulty_block(5)
            .with_block(6, [0x66; BLOCK_SIZE]);

        let snapshot = read_card(&mut card.session()).await.unwrap();
        let blocks = snapshot.sectors()[1].blocks();

        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].data(), &[0x44; BLOCK_SIZE]);
        assert_eq!(blocks[1].index(), 5);
        assert_eq!(blocks[1].status(), BlockStatus::Faulted);
        assert_eq!(blocks[1].data(), &[0u8; BLOCK_SIZE]);
        assert_eq!(blocks[1].hex(), "Error reading block");
        assert_eq!(blocks[2].data(), &[0x66; BLOCK_SIZE]);
        assert!(snapshot.raw_dump().contains("  Block 5: Error reading block\n"));
    }

    #[tokio::test]
    async fn test_unsupported_tag_never_connects() {
        let tag = TagInfo::new(vec![1, 2, 3, 4, 5, 6, 7], vec![Technology::MifareUltralight]);
        let card = MockClassicCard::new(tag);
        let journal = card.journal();

        let result = read_card(&mut card.session()).await;

        assert!(matches!(result, Err(CardReadError::UnsupportedCard { .. })));
        assert!(journal.calls().is_empty());
    }

    #[tokio::test]
    async fn test_short_uid_is_read() {
        let card = MockClassicCard::classic_1k(vec![0x01, 0x02, 0x03]);

        let snapshot = read_card(&mut card.session()).await.unwrap();

        assert_eq!(snapshot.identity().uid_string(), "01:02:03");
        assert_eq!(snapshot.authenticated_sectors(), 16);
    }

    #[tokio::test]
    async fn test_connect_failure_is_fatal_without_close() {
        let card = card().with_connect_failure();
        let journal = card.journal();

        let result = read_card(&mut card.session()).await;

        assert!(matches!(
            result,
            Err(CardReadError::Session(HardwareError::TagLost { .. }))
        ));
        assert_eq!(journal.calls(), vec![SessionCall::Connect]);
    }

    #[rstest]
    #[case::healthy(card())]
    #[case::locked(card().with_all_sectors_locked())]
    #[case::faulty(card().with_faulty_block(0).with_auth_fault(3))]
    #[case::removed(card().removed_after_reads(10))]
    #[case::close_fails(card().with_close_failure())]
    #[tokio::test]
    async fn test_close_called_exactly_once(#[case] card: MockClassicCard) {
        let journal = card.journal();
        let _ = read_card(&mut card.session()).await;

        assert_eq!(journal.close_count(), 1);
        assert_eq!(journal.calls().last(), Some(&SessionCall::Close));
    }

    #[tokio::test]
    async fn test_close_failure_surfaces_with_snapshot() {
        let card = card().with_close_failure();

        let error = read_card(&mut card.session()).await.unwrap_err();

        assert!(matches!(error, CardReadError::Release { .. }));
        let snapshot = error.into_snapshot().unwrap();
        assert_eq!(snapshot.authenticated_sectors(), 16);
    }

    #[tokio::test]
    async fn test_custom_key_list() {
        let custom: MifareKey = "B0B1B2B3B4B5".parse().unwrap();
        let card = card().with_all_sectors_key(KeySlot::A, custom);
        let reader = MifareReader::new(ReaderConfig::default().with_extra_keys([custom]));

        let snapshot = reader.read_card(&mut card.session()).await.unwrap();

        assert_eq!(snapshot.authenticated_sectors(), 16);
        assert_eq!(snapshot.sectors()[0].unlocked_by().unwrap().key, custom);
    }
}
