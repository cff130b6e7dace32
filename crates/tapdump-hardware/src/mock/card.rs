//! Mock Mifare Classic card for testing and development.
//!
//! A [`MockClassicCard`] describes a card: its tag, which keys each sector
//! accepts, which blocks fault on read and whether connect/close fail. Each
//! call to [`MockClassicCard::session`] opens a fresh [`MockSession`] on it.
//! Every session operation is recorded in a [`SessionJournal`] shared by all
//! clones of the card, so tests can assert the exact call order.

use crate::{
    HardwareError, Result,
    traits::ClassicSession,
    types::{TagInfo, Technology},
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tapdump_core::{
    ClassicGeometry, ClassicSubtype, KeySlot, MifareKey,
    constants::{BLOCK_SIZE, KEY_LENGTH},
    geometry::{block_to_sector, blocks_in_sector, sector_to_block},
};

/// Access bits written by the factory (transport configuration).
const TRANSPORT_ACCESS_BITS: [u8; 4] = [0xFF, 0x07, 0x80, 0x69];

/// One recorded session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    Connect,
    Authenticate {
        sector: u16,
        slot: KeySlot,
        key: MifareKey,
    },
    ReadBlock(u16),
    Close,
}

/// Shared, append-only log of session operations.
#[derive(Debug, Clone, Default)]
pub struct SessionJournal {
    calls: Arc<Mutex<Vec<SessionCall>>>,
}

impl SessionJournal {
    fn record(&self, call: SessionCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }

    /// All recorded calls in order.
    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Authentication attempts made against `sector`, in order.
    pub fn auth_attempts(&self, sector: u16) -> Vec<(KeySlot, MifareKey)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SessionCall::Authenticate { sector: s, slot, key } if s == sector => {
                    Some((slot, key))
                }
                _ => None,
            })
            .collect()
    }

    /// Blocks read, in order.
    pub fn blocks_read(&self) -> Vec<u16> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SessionCall::ReadBlock(block) => Some(block),
                _ => None,
            })
            .collect()
    }

    /// Number of times `close` was called.
    pub fn close_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SessionCall::Close))
            .count()
    }

    /// Number of times `connect` was called.
    pub fn connect_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SessionCall::Connect))
            .count()
    }
}

/// Keys a sector accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SectorKeys {
    key_a: Option<MifareKey>,
    key_b: Option<MifareKey>,
}

/// Scriptable Mifare Classic card.
///
/// By default every sector accepts the factory key `FFFFFFFFFFFF` as both
/// Key A and Key B, every block reads back zeros except sector trailers, and
/// connect/close succeed.
///
/// # Examples
///
/// ```
/// use tapdump_hardware::mock::MockClassicCard;
/// use tapdump_hardware::traits::ClassicSession;
/// use tapdump_core::MifareKey;
///
/// #[tokio::main]
/// async fn main() -> tapdump_hardware::Result<()> {
///     let card = MockClassicCard::classic_1k(vec![0x04, 0xA2, 0x5F, 0x11]);
///     let mut session = card.session();
///
///     session.connect().await?;
///     assert!(session.authenticate_key_a(0, &MifareKey::defaults()[0]).await?);
///     let block = session.read_block(1).await?;
///     session.close().await?;
///
///     assert_eq!(block, [0u8; 16]);
///     assert_eq!(card.journal().close_count(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockClassicCard {
    tag: TagInfo,
    sector_keys: HashMap<u16, SectorKeys>,
    auth_faults: HashSet<(u16, KeySlot)>,
    block_data: HashMap<u16, [u8; BLOCK_SIZE]>,
    faulty_blocks: HashSet<u16>,
    fail_connect: bool,
    fail_close: bool,
    removed_after_reads: Option<usize>,
    read_delay: Option<Duration>,
    journal: SessionJournal,
}

impl MockClassicCard {
    /// Create a card with the given tag description.
    ///
    /// Tags without Classic details produce sessions that the engine will
    /// reject as unsupported.
    pub fn new(tag: TagInfo) -> Self {
        let factory = SectorKeys {
            key_a: Some(MifareKey::defaults()[0]),
            key_b: Some(MifareKey::defaults()[0]),
        };
        let sector_count = tag.classic.map(|c| c.geometry.sector_count).unwrap_or(0);
        let sector_keys = (0..sector_count).map(|s| (s, factory)).collect();

        Self {
            tag,
            sector_keys,
            auth_faults: HashSet::new(),
            block_data: HashMap::new(),
            faulty_blocks: HashSet::new(),
            fail_connect: false,
            fail_close: false,
            removed_after_reads: None,
            read_delay: None,
            journal: SessionJournal::default(),
        }
    }

    /// Classic 1K card with factory keys.
    pub fn classic_1k(uid: Vec<u8>) -> Self {
        Self::classic(uid, ClassicGeometry::classic_1k())
    }

    /// Classic 4K card with factory keys.
    pub fn classic_4k(uid: Vec<u8>) -> Self {
        Self::classic(uid, ClassicGeometry::classic_4k())
    }

    /// Classic card with an arbitrary topology and factory keys.
    pub fn classic(uid: Vec<u8>, geometry: ClassicGeometry) -> Self {
        let tag = TagInfo::new(uid, vec![Technology::NfcA])
            .with_classic(ClassicSubtype::Classic, geometry);
        Self::new(tag)
    }

    /// Make `sector` accept only `key` in `slot` (the other slot refuses all keys).
    pub fn with_sector_key(mut self, sector: u16, slot: KeySlot, key: MifareKey) -> Self {
        let keys = match slot {
            KeySlot::A => SectorKeys {
                key_a: Some(key),
                key_b: None,
            },
            KeySlot::B => SectorKeys {
                key_a: None,
                key_b: Some(key),
            },
        };
        self.sector_keys.insert(sector, keys);
        self
    }

    /// Make every sector accept only `key` in `slot`.
    pub fn with_all_sectors_key(mut self, slot: KeySlot, key: MifareKey) -> Self {
        let sectors: Vec<u16> = self.sector_keys.keys().copied().collect();
        for sector in sectors {
            self = self.with_sector_key(sector, slot, key);
        }
        self
    }

    /// Make `sector` refuse every key.
    pub fn with_locked_sector(mut self, sector: u16) -> Self {
        self.sector_keys.insert(sector, SectorKeys::default());
        self
    }

    /// Make every sector refuse every key.
    pub fn with_all_sectors_locked(mut self) -> Self {
        for keys in self.sector_keys.values_mut() {
            *keys = SectorKeys::default();
        }
        self
    }

    /// Make authentication of `sector` fail with a transport fault in both slots.
    pub fn with_auth_fault(self, sector: u16) -> Self {
        self.with_slot_fault(sector, KeySlot::A)
            .with_slot_fault(sector, KeySlot::B)
    }

    /// Make authentication of `sector` in `slot` fail with a transport fault.
    pub fn with_slot_fault(mut self, sector: u16, slot: KeySlot) -> Self {
        self.auth_faults.insert((sector, slot));
        self
    }

    /// Set the contents of absolute block `block`.
    pub fn with_block(mut self, block: u16, data: [u8; BLOCK_SIZE]) -> Self {
        self.block_data.insert(block, data);
        self
    }

    /// Make reads of absolute block `block` fault.
    pub fn with_faulty_block(mut self, block: u16) -> Self {
        self.faulty_blocks.insert(block);
        self
    }

    /// Make `connect` fail.
    pub fn with_connect_failure(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Make `close` fail.
    pub fn with_close_failure(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Simulate the card leaving the field after `reads` successful block reads.
    pub fn removed_after_reads(mut self, reads: usize) -> Self {
        self.removed_after_reads = Some(reads);
        self
    }

    /// Make every block read take `delay`.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Tag description of this card.
    pub fn tag(&self) -> &TagInfo {
        &self.tag
    }

    /// Shared journal of every session opened on this card.
    pub fn journal(&self) -> SessionJournal {
        self.journal.clone()
    }

    /// Open a fresh, unconnected session.
    pub fn session(&self) -> MockSession {
        MockSession {
            card: self.clone(),
            connected: false,
            authenticated_sector: None,
            reads: 0,
        }
    }

    fn accepts(&self, sector: u16, slot: KeySlot, key: &MifareKey) -> bool {
        let Some(keys) = self.sector_keys.get(&sector) else {
            return false;
        };
        match slot {
            KeySlot::A => keys.key_a.as_ref() == Some(key),
            KeySlot::B => keys.key_b.as_ref() == Some(key),
        }
    }

    fn contents(&self, block: u16) -> [u8; BLOCK_SIZE] {
        if let Some(data) = self.block_data.get(&block) {
            return *data;
        }

        let sector = block_to_sector(block);
        let trailer = sector_to_block(sector) + blocks_in_sector(sector) - 1;
        if block != trailer {
            return [0u8; BLOCK_SIZE];
        }

        // Key A always reads back as zeros; Key B is readable under transport bits.
        let mut data = [0u8; BLOCK_SIZE];
        data[KEY_LENGTH..KEY_LENGTH + 4].copy_from_slice(&TRANSPORT_ACCESS_BITS);
        if let Some(key_b) = self.sector_keys.get(&sector).and_then(|k| k.key_b) {
            data[KEY_LENGTH + 4..].copy_from_slice(key_b.as_bytes());
        }
        data
    }
}

/// Session opened on a [`MockClassicCard`].
#[derive(Debug)]
pub struct MockSession {
    card: MockClassicCard,
    connected: bool,
    authenticated_sector: Option<u16>,
    reads: usize,
}

impl MockSession {
    fn ensure_in_field(&self) -> Result<()> {
        if !self.connected {
            return Err(HardwareError::disconnected("mock session not connected"));
        }
        if self
            .card
            .removed_after_reads
            .is_some_and(|limit| self.reads >= limit)
        {
            return Err(HardwareError::tag_lost("mock card left the field"));
        }
        Ok(())
    }

    fn authenticate(&mut self, sector: u16, slot: KeySlot, key: &MifareKey) -> Result<bool> {
        self.card.journal.record(SessionCall::Authenticate {
            sector,
            slot,
            key: *key,
        });
        self.ensure_in_field()?;

        if self.card.auth_faults.contains(&(sector, slot)) {
            self.authenticated_sector = None;
            return Err(HardwareError::communication(format!(
                "mock transceive failed while authenticating sector {sector}"
            )));
        }

        if self.card.accepts(sector, slot, key) {
            self.authenticated_sector = Some(sector);
            Ok(true)
        } else {
            self.authenticated_sector = None;
            Ok(false)
        }
    }
}

impl ClassicSession for MockSession {
    fn tag(&self) -> &TagInfo {
        &self.card.tag
    }

    async fn connect(&mut self) -> Result<()> {
        self.card.journal.record(SessionCall::Connect);
        if self.card.fail_connect {
            return Err(HardwareError::tag_lost("mock card not reachable"));
        }
        self.connected = true;
        Ok(())
    }

    async fn authenticate_key_a(&mut self, sector: u16, key: &MifareKey) -> Result<bool> {
        self.authenticate(sector, KeySlot::A, key)
    }

    async fn authenticate_key_b(&mut self, sector: u16, key: &MifareKey) -> Result<bool> {
        self.authenticate(sector, KeySlot::B, key)
    }

    async fn read_block(&mut self, block: u16) -> Result<[u8; BLOCK_SIZE]> {
        self.card.journal.record(SessionCall::ReadBlock(block));
        if let Some(delay) = self.card.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.ensure_in_field()?;

        if self.authenticated_sector != Some(block_to_sector(block)) {
            return Err(HardwareError::communication(format!(
                "block {block} read without sector authentication"
            )));
        }
        if self.card.faulty_blocks.contains(&block) {
            return Err(HardwareError::communication(format!(
                "mock read of block {block} failed"
            )));
        }

        self.reads += 1;
        Ok(self.card.contents(block))
    }

    async fn close(&mut self) -> Result<()> {
        self.card.journal.record(SessionCall::Close);
        self.connected = false;
        self.authenticated_sector = None;
        if self.card.fail_close {
            return Err(HardwareError::communication("mock close failed"));
        }
        Ok(())
    }
}
