//! Mock NFC adapter implementation for testing and development.
//!
//! This module provides a simulated adapter that can be controlled
//! programmatically: cards are registered on a handle and "tapped" onto the
//! adapter, which then yields them from [`NfcAdapter::next_tag`].

use crate::{
    HardwareError, Result,
    mock::card::{MockClassicCard, MockSession},
    traits::NfcAdapter,
    types::{AdapterInfo, TagInfo, Technology},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// State shared between a [`MockAdapter`] and its handles.
#[derive(Debug)]
struct SharedState {
    enabled: AtomicBool,
    begin_calls: AtomicUsize,
    end_calls: AtomicUsize,
    cards: Mutex<HashMap<Vec<u8>, MockClassicCard>>,
}

impl SharedState {
    fn cards(&self) -> std::sync::MutexGuard<'_, HashMap<Vec<u8>, MockClassicCard>> {
        self.cards.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Mock NFC adapter for testing and development.
///
/// # Examples
///
/// ```
/// use tapdump_hardware::mock::{MockAdapter, MockClassicCard};
/// use tapdump_hardware::traits::NfcAdapter;
///
/// #[tokio::main]
/// async fn main() -> tapdump_hardware::Result<()> {
///     let (mut adapter, handle) = MockAdapter::new();
///
///     let card = MockClassicCard::classic_1k(vec![0x04, 0xA2, 0x5F, 0x11]);
///     handle.tap(card).await?;
///
///     let tag = adapter.next_tag().await?;
///     assert_eq!(tag.id_string(), "04:A2:5F:11");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockAdapter {
    /// Channel receiver for discovered tags
    tag_rx: mpsc::Receiver<TagInfo>,

    /// Adapter name
    name: String,

    /// Whether an adapter exists at all
    available: bool,

    /// Whether discovery is currently active
    listening: bool,

    shared: Arc<SharedState>,
}

impl MockAdapter {
    /// Create a new, enabled mock adapter with the default name.
    ///
    /// Returns a tuple of (MockAdapter, MockAdapterHandle) where the handle
    /// is used to simulate taps.
    pub fn new() -> (Self, MockAdapterHandle) {
        Self::with_name("Mock NFC Adapter")
    }

    /// Create a new mock adapter with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockAdapterHandle) {
        let (tag_tx, tag_rx) = mpsc::channel(32);
        let shared = Arc::new(SharedState {
            enabled: AtomicBool::new(true),
            begin_calls: AtomicUsize::new(0),
            end_calls: AtomicUsize::new(0),
            cards: Mutex::new(HashMap::new()),
        });

        let adapter = Self {
            tag_rx,
            name: name.into(),
            available: true,
            listening: false,
            shared: Arc::clone(&shared),
        };
        let handle = MockAdapterHandle { tag_tx, shared };

        (adapter, handle)
    }

    /// Create a mock describing a host with no NFC hardware.
    pub fn unavailable() -> (Self, MockAdapterHandle) {
        let (mut adapter, handle) = Self::with_name("Absent NFC Adapter");
        adapter.available = false;
        (adapter, handle)
    }

    /// Whether discovery is currently active.
    pub fn is_listening(&self) -> bool {
        self.listening
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new().0
    }
}

impl NfcAdapter for MockAdapter {
    type Session = MockSession;

    fn is_available(&self) -> bool {
        self.available
    }

    fn is_enabled(&self) -> bool {
        self.available && self.shared.enabled.load(Ordering::SeqCst)
    }

    async fn begin_listening(&mut self) -> Result<()> {
        if !self.available {
            return Err(HardwareError::NotSupported);
        }
        if !self.is_enabled() {
            return Err(HardwareError::Disabled);
        }
        self.shared.begin_calls.fetch_add(1, Ordering::SeqCst);
        self.listening = true;
        Ok(())
    }

    async fn end_listening(&mut self) -> Result<()> {
        self.shared.end_calls.fetch_add(1, Ordering::SeqCst);
        self.listening = false;
        Ok(())
    }

    async fn next_tag(&mut self) -> Result<TagInfo> {
        self.tag_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("mock tag channel closed"))
    }

    async fn open_session(&mut self, tag: &TagInfo) -> Result<MockSession> {
        let card = self
            .shared
            .cards()
            .get(&tag.id)
            .cloned()
            .unwrap_or_else(|| MockClassicCard::new(tag.clone()));
        Ok(card.session())
    }

    async fn get_adapter_info(&self) -> Result<AdapterInfo> {
        Ok(AdapterInfo::new(
            self.name.clone(),
            vec![
                Technology::NfcA,
                Technology::NfcB,
                Technology::MifareClassic,
                Technology::MifareUltralight,
            ],
        ))
    }
}

/// Handle for controlling a mock adapter.
///
/// Clones share the card registry and the adapter's enabled flag.
#[derive(Debug, Clone)]
pub struct MockAdapterHandle {
    /// Channel sender for discovered tags
    tag_tx: mpsc::Sender<TagInfo>,

    shared: Arc<SharedState>,
}

impl MockAdapterHandle {
    /// Register a card so later sessions on its UID use its behavior.
    pub fn insert_card(&self, card: MockClassicCard) {
        self.shared.cards().insert(card.tag().id.clone(), card);
    }

    /// Register `card` and present it to the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter has been dropped.
    pub async fn tap(&self, card: MockClassicCard) -> Result<()> {
        let tag = card.tag().clone();
        self.insert_card(card);
        self.present(tag).await
    }

    /// Present an arbitrary tag description.
    ///
    /// Unregistered tags open sessions backed by a factory-default card.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter has been dropped.
    pub async fn present(&self, tag: TagInfo) -> Result<()> {
        self.tag_tx
            .send(tag)
            .await
            .map_err(|_| HardwareError::disconnected("mock adapter dropped"))
    }

    /// Switch the adapter on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Number of `begin_listening` calls that succeeded.
    pub fn begin_count(&self) -> usize {
        self.shared.begin_calls.load(Ordering::SeqCst)
    }

    /// Number of `end_listening` calls.
    pub fn end_count(&self) -> usize {
        self.shared.end_calls.load(Ordering::SeqCst)
    }

    /// Number of registered cards.
    pub fn card_count(&self) -> usize {
        self.shared.cards().len()
    }
}
