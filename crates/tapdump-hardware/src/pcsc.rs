//! PC/SC backed NFC adapter.
//!
//! Drives any PC/SC contactless reader that understands the storage-card
//! pseudo-APDUs in [`crate::apdu`]. The `pcsc` crate is blocking, so every
//! call into it runs on tokio's blocking pool; discovery polls with a short
//! timeout so that dropping the `next_tag` future stops the loop at the next
//! poll boundary.

use crate::{
    HardwareError, Result, apdu, atr,
    traits::{ClassicSession, NfcAdapter},
    types::{AdapterInfo, TagInfo, Technology},
};
use pcsc::{Card, Context, Disposition, MAX_BUFFER_SIZE, Protocols, ReaderState, Scope, ShareMode, State};
use std::ffi::CString;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tapdump_core::{KeySlot, MifareKey, constants::BLOCK_SIZE};
use tracing::{debug, warn};

/// Default wait per discovery poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

fn map_pcsc_error(error: pcsc::Error) -> HardwareError {
    match error {
        pcsc::Error::RemovedCard | pcsc::Error::ResetCard | pcsc::Error::NoSmartcard => {
            HardwareError::tag_lost(error.to_string())
        }
        pcsc::Error::Timeout => HardwareError::Timeout,
        pcsc::Error::NoService | pcsc::Error::ServiceStopped => HardwareError::NotSupported,
        pcsc::Error::ReaderUnavailable | pcsc::Error::UnknownReader => {
            HardwareError::disconnected(error.to_string())
        }
        other => HardwareError::communication(other.to_string()),
    }
}

async fn blocking<T, F>(op: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| HardwareError::ReaderTask(e.to_string()))?
}

fn transmit(card: &Card, command: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = [0u8; MAX_BUFFER_SIZE];
    card.transmit(command, &mut buffer)
        .map(<[u8]>::to_vec)
        .map_err(map_pcsc_error)
}

/// NFC adapter backed by a PC/SC reader.
pub struct PcscAdapter {
    context: Option<Context>,
    reader: Option<CString>,
    last_state: State,
    poll_interval: Duration,
    listening: bool,
}

impl std::fmt::Debug for PcscAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcscAdapter")
            .field("service", &self.context.is_some())
            .field("reader", &self.reader)
            .field("listening", &self.listening)
            .finish()
    }
}

impl PcscAdapter {
    /// Connect to the PC/SC service and pick a reader.
    ///
    /// With `reader_name` set, the first reader whose name contains it is
    /// used; otherwise the first reader reported. A missing service or reader
    /// is not an error here: the adapter then reports itself unavailable.
    pub fn open(reader_name: Option<&str>) -> Self {
        let context = match Context::establish(Scope::User) {
            Ok(context) => Some(context),
            Err(e) => {
                warn!(error = %e, "PC/SC service unavailable");
                None
            }
        };

        let reader = context.as_ref().and_then(|ctx| {
            let readers = ctx
                .list_readers_owned()
                .map_err(|e| warn!(error = %e, "failed to list PC/SC readers"))
                .ok()?;
            readers.into_iter().find(|name| {
                reader_name.is_none_or(|wanted| name.to_string_lossy().contains(wanted))
            })
        });

        if let Some(reader) = &reader {
            debug!(reader = %reader.to_string_lossy(), "selected PC/SC reader");
        }

        Self {
            context,
            reader,
            last_state: State::UNAWARE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            listening: false,
        }
    }

    /// Set the wait per discovery poll.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn target(&self) -> Result<(Context, CString)> {
        let context = self.context.clone().ok_or(HardwareError::NotSupported)?;
        let reader = self.reader.clone().ok_or(HardwareError::NotSupported)?;
        Ok((context, reader))
    }
}

/// Wait up to `timeout` for the reader state to change; report a newly
/// arrived card.
fn poll_reader(
    context: &Context,
    reader: &CString,
    last_state: State,
    timeout: Duration,
) -> Result<(State, Option<TagInfo>)> {
    let mut states = [ReaderState::new(reader.clone(), last_state)];
    match context.get_status_change(timeout, &mut states) {
        Ok(()) => {}
        Err(pcsc::Error::Timeout) => return Ok((last_state, None)),
        Err(e) => return Err(map_pcsc_error(e)),
    }

    let event = states[0].event_state();
    let arrived = event.contains(State::PRESENT) && !last_state.contains(State::PRESENT);
    if !arrived {
        return Ok((event, None));
    }

    let card_atr = states[0].atr().to_vec();
    let card = context
        .connect(reader, ShareMode::Shared, Protocols::ANY)
        .map_err(map_pcsc_error)?;
    let uid = apdu::expect_success(&transmit(&card, &apdu::get_uid())?)?.to_vec();
    if let Err((_, e)) = card.disconnect(Disposition::LeaveCard) {
        debug!(error = %e, "failed to release card after UID read");
    }

    Ok((event, Some(atr::tag_info(uid, &card_atr))))
}

impl NfcAdapter for PcscAdapter {
    type Session = PcscSession;

    fn is_available(&self) -> bool {
        self.context.is_some() && self.reader.is_some()
    }

    fn is_enabled(&self) -> bool {
        self.is_available()
    }

    async fn begin_listening(&mut self) -> Result<()> {
        self.target()?;
        self.last_state = State::UNAWARE;
        self.listening = true;
        Ok(())
    }

    async fn end_listening(&mut self) -> Result<()> {
        self.listening = false;
        Ok(())
    }

    async fn next_tag(&mut self) -> Result<TagInfo> {
        let (context, reader) = self.target()?;
        loop {
            let (ctx, name, last, timeout) =
                (context.clone(), reader.clone(), self.last_state, self.poll_interval);
            let (state, tag) = blocking(move || poll_reader(&ctx, &name, last, timeout)).await?;
            self.last_state = state;
            if let Some(tag) = tag {
                return Ok(tag);
            }
        }
    }

    async fn open_session(&mut self, tag: &TagInfo) -> Result<PcscSession> {
        let (context, reader) = self.target()?;
        Ok(PcscSession {
            context,
            reader,
            tag: tag.clone(),
            card: Arc::new(Mutex::new(None)),
        })
    }

    async fn get_adapter_info(&self) -> Result<AdapterInfo> {
        let (_, reader) = self.target()?;
        Ok(AdapterInfo::new(
            reader.to_string_lossy(),
            vec![
                Technology::NfcA,
                Technology::MifareClassic,
                Technology::MifareUltralight,
            ],
        ))
    }
}

/// Session on a card sitting on a PC/SC reader.
pub struct PcscSession {
    context: Context,
    reader: CString,
    tag: TagInfo,
    card: Arc<Mutex<Option<Card>>>,
}

impl std::fmt::Debug for PcscSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcscSession")
            .field("reader", &self.reader)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

impl PcscSession {
    async fn with_card<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Card) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let card = Arc::clone(&self.card);
        blocking(move || {
            let guard = card.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let card = guard
                .as_ref()
                .ok_or_else(|| HardwareError::disconnected("card session not connected"))?;
            op(card)
        })
        .await
    }

    async fn authenticate(&mut self, sector: u16, slot: KeySlot, key: &MifareKey) -> Result<bool> {
        let block = self.sector_to_block(sector);
        let load = apdu::load_key(key);
        let auth = apdu::general_authenticate(block, slot)?;
        self.with_card(move |card| {
            apdu::expect_success(&transmit(card, &load)?)?;
            apdu::authentication_outcome(&transmit(card, &auth)?)
        })
        .await
    }
}

impl ClassicSession for PcscSession {
    fn tag(&self) -> &TagInfo {
        &self.tag
    }

    async fn connect(&mut self) -> Result<()> {
        let (context, reader, slot) = (self.context.clone(), self.reader.clone(), Arc::clone(&self.card));
        blocking(move || {
            let card = context
                .connect(&reader, ShareMode::Shared, Protocols::ANY)
                .map_err(map_pcsc_error)?;
            *slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(card);
            Ok(())
        })
        .await
    }

    async fn authenticate_key_a(&mut self, sector: u16, key: &MifareKey) -> Result<bool> {
        self.authenticate(sector, KeySlot::A, key).await
    }

    async fn authenticate_key_b(&mut self, sector: u16, key: &MifareKey) -> Result<bool> {
        self.authenticate(sector, KeySlot::B, key).await
    }

    async fn read_block(&mut self, block: u16) -> Result<[u8; BLOCK_SIZE]> {
        let command = apdu::read_binary(block)?;
        self.with_card(move |card| apdu::block_data(&transmit(card, &command)?))
            .await
    }

    async fn close(&mut self) -> Result<()> {
        let slot = Arc::clone(&self.card);
        blocking(move || {
            let card = slot
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .take();
            match card {
                Some(card) => card
                    .disconnect(Disposition::LeaveCard)
                    .map_err(|(_, e)| map_pcsc_error(e)),
                None => Ok(()),
            }
        })
        .await
    }
}
