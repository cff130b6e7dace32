//! Tag acquisition controller.
//!
//! The controller owns the discovery lifecycle and the debounce state. It
//! turns raw tag announcements from an [`NfcAdapter`] into
//! [`AcquisitionEvent`]s:
//!
//! ```text
//! ┌──────────┐  TagInfo  ┌────────────────────────┐  AcquisitionEvent  ┌──────────┐
//! │ Adapter  │──────────►│ uid → debounce →       │───────────────────►│ Consumer │
//! │          │           │ classify → haptic →    │     (mpsc)         │          │
//! └──────────┘           │ detect [→ dump]        │◄───────────────────│          │
//!                        └────────────────────────┘  AcquisitionCommand└──────────┘
//! ```
//!
//! The controller can be driven by hand ([`AcquisitionController::handle_tag`])
//! or run on a background task with [`AcquisitionController::spawn`].

use crate::{
    classify::classify,
    config::{AcquisitionConfig, AcquisitionMode},
    debounce::DebounceState,
    error::{AcquisitionError, Result},
    events::{AcquisitionEvent, CardDetection},
};
use std::fmt;
use tapdump_core::{CardIdentity, CardType};
use tapdump_hardware::{
    AnyHapticDevice, AnyNfcAdapter, HardwareError, TagInfo,
    traits::{ClassicSession, HapticDevice, NfcAdapter},
};
use tapdump_mifare::{CardReadError, MifareReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Capacity of the command channel of a spawned controller.
const COMMAND_CAPACITY: usize = 8;

/// Discovery lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerState {
    /// Not listening for tags.
    Idle,

    /// Discovery active; tags are processed.
    Listening,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerState::Idle => write!(f, "Idle"),
            ListenerState::Listening => write!(f, "Listening"),
        }
    }
}

/// What happened to a single tag announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagDisposition {
    /// Accepted and reported.
    Accepted(CardDetection),

    /// Same UID as the last accepted tap, inside the window.
    Debounced,

    /// The controller is not listening.
    Ignored,
}

/// Commands accepted by a spawned controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionCommand {
    /// Forget the debounce state so the next tap of any card is fresh.
    ClearHistory,

    /// Stop listening and end the task.
    Shutdown,
}

/// Tag acquisition controller.
///
/// # Examples
///
/// ```
/// use tapdump_acquisition::{AcquisitionConfig, AcquisitionController, TagDisposition};
/// use tapdump_hardware::mock::{MockAdapter, MockClassicCard, MockHaptic};
///
/// #[tokio::main]
/// async fn main() -> tapdump_acquisition::Result<()> {
///     let (adapter, _adapter_handle) = MockAdapter::new();
///     let (haptic, _haptic_handle) = MockHaptic::new();
///     let (mut controller, mut events) =
///         AcquisitionController::new(adapter, haptic, AcquisitionConfig::default());
///
///     controller.start_listening().await?;
///     let card = MockClassicCard::classic_1k(vec![0x04, 0xA2, 0x5F, 0x11]);
///     let outcome = controller.handle_tag(card.tag().clone()).await?;
///
///     assert!(matches!(outcome, TagDisposition::Accepted(_)));
///     assert!(events.recv().await.is_some());
///     Ok(())
/// }
/// ```
pub struct AcquisitionController<A: NfcAdapter, H: HapticDevice> {
    adapter: A,
    haptic: H,
    config: AcquisitionConfig,
    reader: MifareReader,
    debounce: DebounceState,
    state: ListenerState,
    events: mpsc::Sender<AcquisitionEvent>,
}

impl<A: NfcAdapter, H: HapticDevice> AcquisitionController<A, H> {
    /// Create an idle controller and the receiving end of its event channel.
    pub fn new(
        adapter: A,
        haptic: H,
        config: AcquisitionConfig,
    ) -> (Self, mpsc::Receiver<AcquisitionEvent>) {
        let (events, event_rx) = mpsc::channel(config.event_capacity.max(1));
        let controller = Self {
            adapter,
            haptic,
            reader: MifareReader::new(config.reader.clone()),
            config,
            debounce: DebounceState::new(),
            state: ListenerState::Idle,
            events,
        };
        (controller, event_rx)
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Whether an adapter is present at all.
    pub fn is_available(&self) -> bool {
        self.adapter.is_available()
    }

    /// Whether the adapter is present and switched on.
    pub fn is_enabled(&self) -> bool {
        self.adapter.is_enabled()
    }

    /// Start discovery.
    ///
    /// Emits [`AcquisitionEvent::NotSupported`] when no adapter is present
    /// and [`AcquisitionEvent::Disabled`] when it is switched off; the
    /// controller then stays idle. Returns whether the controller is now
    /// listening.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter refuses to begin discovery or the
    /// event channel is closed.
    pub async fn start_listening(&mut self) -> Result<bool> {
        if self.state == ListenerState::Listening {
            return Ok(true);
        }

        if !self.adapter.is_available() {
            warn!("NFC not supported on this host");
            self.emit(AcquisitionEvent::NotSupported).await?;
            return Ok(false);
        }

        if !self.adapter.is_enabled() {
            warn!("NFC adapter is disabled");
            self.emit(AcquisitionEvent::Disabled).await?;
            return Ok(false);
        }

        self.adapter.begin_listening().await?;
        self.state = ListenerState::Listening;
        debug!("tag discovery enabled");
        Ok(true)
    }

    /// Stop discovery. Does nothing when already idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter cannot leave discovery mode; the
    /// controller is idle either way.
    pub async fn stop_listening(&mut self) -> Result<()> {
        if self.state == ListenerState::Idle {
            return Ok(());
        }
        self.state = ListenerState::Idle;
        self.adapter.end_listening().await?;
        debug!("tag discovery disabled");
        Ok(())
    }

    /// Forget the last accepted tap.
    pub fn clear_debounce_state(&mut self) {
        self.debounce.clear();
        debug!("debounce state cleared");
    }

    /// Process one tag announcement.
    ///
    /// In [`AcquisitionMode::FullDump`] the card is read before this
    /// returns and the snapshot follows the detection on the event channel.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::EventChannelClosed`] if the event
    /// receiver has been dropped.
    pub async fn handle_tag(&mut self, tag: TagInfo) -> Result<TagDisposition> {
        let disposition = self.detect(&tag).await?;
        match &disposition {
            TagDisposition::Accepted(detection) if self.wants_dump(&tag, detection.card_type) => {
                let job = self.open_dump(&tag, detection.identity.clone()).await;
                let event = job.run().await;
                self.emit(event).await?;
            }
            _ => {}
        }
        Ok(disposition)
    }

    /// Listen until the command channel says otherwise.
    ///
    /// Returns after emitting `NotSupported`/`Disabled` if discovery cannot
    /// start, on [`AcquisitionCommand::Shutdown`], when the command sender
    /// is dropped, or when the event receiver is dropped.
    ///
    /// A card read runs alongside command handling. New tags wait until it
    /// finishes, and a shutdown abandons it.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter fails; discovery is stopped first.
    pub async fn run(mut self, mut commands: mpsc::Receiver<AcquisitionCommand>) -> Result<()> {
        match self.start_listening().await {
            Ok(true) => {}
            Ok(false) | Err(AcquisitionError::EventChannelClosed) => return Ok(()),
            Err(e) => return Err(e),
        }

        // Empty slot for the card read in flight.
        let mut dump = std::pin::pin!(None::<DumpJob<A::Session>>.map(DumpJob::run));

        let outcome = loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(AcquisitionCommand::ClearHistory) => self.clear_debounce_state(),
                    Some(AcquisitionCommand::Shutdown) | None => break Ok(()),
                },
                Some(event) = async {
                    match dump.as_mut().as_pin_mut() {
                        Some(job) => Some(job.await),
                        None => None,
                    }
                }, if dump.is_some() => {
                    dump.set(None);
                    match self.emit(event).await {
                        Ok(()) => {}
                        Err(AcquisitionError::EventChannelClosed) => break Ok(()),
                        Err(e) => break Err(e),
                    }
                },
                tag = self.adapter.next_tag(), if dump.is_none() => match tag {
                    Ok(tag) => match self.detect(&tag).await {
                        Ok(TagDisposition::Accepted(detection))
                            if self.wants_dump(&tag, detection.card_type) =>
                        {
                            let job = self.open_dump(&tag, detection.identity).await;
                            dump.set(Some(job.run()));
                        }
                        Ok(_) => {}
                        Err(AcquisitionError::EventChannelClosed) => break Ok(()),
                        Err(e) => break Err(e),
                    },
                    Err(e) => {
                        warn!(error = %e, "adapter stopped delivering tags");
                        break Err(AcquisitionError::Adapter(e));
                    }
                },
            }
        };

        if dump.is_some() {
            debug!("abandoning card read in flight");
        }
        if let Err(e) = self.stop_listening().await {
            warn!(error = %e, "failed to stop tag discovery");
        }
        outcome
    }

    /// Debounce, classify and report a tag.
    async fn detect(&mut self, tag: &TagInfo) -> Result<TagDisposition> {
        if self.state != ListenerState::Listening {
            debug!(uid = %tag.id_string(), "tag ignored while idle");
            return Ok(TagDisposition::Ignored);
        }

        let identity = CardIdentity::new(tag.id.clone());

        if !self
            .debounce
            .accept(identity.uid(), Instant::now(), self.config.debounce_window)
        {
            debug!(uid = %identity, "debouncing read");
            return Ok(TagDisposition::Debounced);
        }

        let card_type = classify(tag);
        info!(uid = %identity, card_type = %card_type, "card detected");

        self.pulse().await;

        let detection = CardDetection {
            identity,
            card_type,
        };
        self.emit(AcquisitionEvent::CardDetected(detection.clone()))
            .await?;

        Ok(TagDisposition::Accepted(detection))
    }

    fn wants_dump(&self, tag: &TagInfo, card_type: CardType) -> bool {
        if self.config.mode != AcquisitionMode::FullDump || !card_type.is_classic_family() {
            return false;
        }
        if tag.classic.is_none() {
            debug!(uid = %tag.id_string(), "no Classic details announced, skipping dump");
            return false;
        }
        true
    }

    async fn open_dump(&mut self, tag: &TagInfo, identity: CardIdentity) -> DumpJob<A::Session> {
        DumpJob {
            session: self.adapter.open_session(tag).await,
            identity,
            reader: self.reader.clone(),
        }
    }

    async fn pulse(&mut self) {
        if !self.haptic.has_vibrator() {
            return;
        }
        if let Err(e) = self.haptic.vibrate(self.config.haptic_pulse_ms).await {
            warn!(error = %e, "error vibrating");
        }
    }

    async fn emit(&self, event: AcquisitionEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| AcquisitionError::EventChannelClosed)
    }
}

/// A card read that owns its session.
struct DumpJob<S> {
    identity: CardIdentity,
    session: std::result::Result<S, HardwareError>,
    reader: MifareReader,
}

impl<S: ClassicSession> DumpJob<S> {
    async fn run(self) -> AcquisitionEvent {
        let Self {
            identity,
            session,
            reader,
        } = self;

        let mut session = match session {
            Ok(session) => session,
            Err(e) => {
                return AcquisitionEvent::ReadFailed {
                    identity,
                    error: CardReadError::Session(e),
                };
            }
        };

        match reader.read_card(&mut session).await {
            Ok(snapshot) => {
                info!(
                    uid = %identity,
                    authenticated = snapshot.authenticated_sectors(),
                    sectors = snapshot.sector_count(),
                    "card dumped"
                );
                AcquisitionEvent::CardRead(Box::new(snapshot))
            }
            Err(error) => {
                warn!(uid = %identity, error = %error, "error reading card");
                AcquisitionEvent::ReadFailed { identity, error }
            }
        }
    }
}

impl AcquisitionController<AnyNfcAdapter, AnyHapticDevice> {
    /// Run a controller on a background task.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tapdump_acquisition::{AcquisitionConfig, AcquisitionController, AcquisitionEvent};
    /// use tapdump_hardware::{AnyHapticDevice, AnyNfcAdapter, NoHaptic, mock::MockAdapter};
    ///
    /// #[tokio::main]
    /// async fn main() -> tapdump_acquisition::Result<()> {
    ///     let (adapter, _handle) = MockAdapter::new();
    ///     let mut handle = AcquisitionController::spawn(
    ///         AnyNfcAdapter::Mock(adapter),
    ///         AnyHapticDevice::None(NoHaptic),
    ///         AcquisitionConfig::default(),
    ///     );
    ///
    ///     while let Some(event) = handle.recv().await {
    ///         if let AcquisitionEvent::CardDetected(detection) = event {
    ///             println!("{} {}", detection.identity, detection.card_type);
    ///         }
    ///     }
    ///
    ///     handle.shutdown().await
    /// }
    /// ```
    pub fn spawn(
        adapter: AnyNfcAdapter,
        haptic: AnyHapticDevice,
        config: AcquisitionConfig,
    ) -> AcquisitionHandle {
        let (controller, events) = Self::new(adapter, haptic, config);
        let (commands, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let task = tokio::spawn(controller.run(command_rx));
        AcquisitionHandle {
            events,
            commands,
            task,
        }
    }
}

/// Handle to a spawned controller.
pub struct AcquisitionHandle {
    events: mpsc::Receiver<AcquisitionEvent>,
    commands: mpsc::Sender<AcquisitionCommand>,
    task: JoinHandle<Result<()>>,
}

impl AcquisitionHandle {
    /// Receive the next event. Returns `None` once the controller has stopped.
    pub async fn recv(&mut self) -> Option<AcquisitionEvent> {
        self.events.recv().await
    }

    /// Ask the controller to forget its debounce state.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::Task`] if the controller has stopped.
    pub async fn clear_history(&self) -> Result<()> {
        self.commands
            .send(AcquisitionCommand::ClearHistory)
            .await
            .map_err(|_| AcquisitionError::Task("controller stopped".to_string()))
    }

    /// Stop the controller and wait for it.
    ///
    /// # Errors
    ///
    /// Returns the error the controller stopped with, or
    /// [`AcquisitionError::Task`] if it panicked.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            events,
            commands,
            task,
        } = self;

        // Unblock a controller waiting on a full event channel.
        drop(events);
        // A controller that already stopped has dropped its receiver.
        let _ = commands.send(AcquisitionCommand::Shutdown).await;

        task.await
            .map_err(|e| AcquisitionError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tapdump_core::CardType;
    use tapdump_hardware::{
        Technology,
        mock::{MockAdapter, MockAdapterHandle, MockClassicCard, MockHaptic, MockHapticHandle},
    };

    type MockController = AcquisitionController<MockAdapter, MockHaptic>;

    struct Fixture {
        controller: MockController,
        events: mpsc::Receiver<AcquisitionEvent>,
        adapter: MockAdapterHandle,
        haptic: MockHapticHandle,
    }

    fn fixture(config: AcquisitionConfig) -> Fixture {
        let (adapter, adapter_handle) = MockAdapter::new();
        let (haptic, haptic_handle) = MockHaptic::new();
        let (controller, events) = AcquisitionController::new(adapter, haptic, config);
        Fixture {
            controller,
            events,
            adapter: adapter_handle,
            haptic: haptic_handle,
        }
    }

    async fn listening(config: AcquisitionConfig) -> Fixture {
        let mut fixture = fixture(config);
        assert!(fixture.controller.start_listening().await.unwrap());
        fixture
    }

    fn classic_tag(uid: &[u8]) -> TagInfo {
        MockClassicCard::classic_1k(uid.to_vec()).tag().clone()
    }

    const UID_A: &[u8] = &[0x04, 0xA2, 0x5F, 0x11];
    const UID_B: &[u8] = &[0x04, 0xA2, 0x5F, 0x12];

    fn detected_count(events: &mut mpsc::Receiver<AcquisitionEvent>) -> usize {
        let mut count = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, AcquisitionEvent::CardDetected(_)) {
                count += 1;
            }
        }
        count
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_uid_within_window_fires_once() {
        let mut f = listening(AcquisitionConfig::default()).await;

        f.controller.handle_tag(classic_tag(UID_A)).await.unwrap();
        tokio::time::advance(Duration::from_millis(1999)).await;
        let second = f.controller.handle_tag(classic_tag(UID_A)).await.unwrap();

        assert_eq!(second, TagDisposition::Debounced);
        assert_eq!(detected_count(&mut f.events), 1);
        assert_eq!(f.haptic.pulses(), vec![200]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_uid_after_window_fires_twice() {
        let mut f = listening(AcquisitionConfig::default()).await;

        f.controller.handle_tag(classic_tag(UID_A)).await.unwrap();
        tokio::time::advance(Duration::from_millis(2000)).await;
        let second = f.controller.handle_tag(classic_tag(UID_A)).await.unwrap();

        assert!(matches!(second, TagDisposition::Accepted(_)));
        assert_eq!(detected_count(&mut f.events), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_uid_fires_immediately() {
        let mut f = listening(AcquisitionConfig::default()).await;

        f.controller.handle_tag(classic_tag(UID_A)).await.unwrap();
        f.controller.handle_tag(classic_tag(UID_B)).await.unwrap();
        f.controller.handle_tag(classic_tag(UID_A)).await.unwrap();

        assert_eq!(detected_count(&mut f.events), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_debounce_state() {
        let mut f = listening(AcquisitionConfig::default()).await;

        f.controller.handle_tag(classic_tag(UID_A)).await.unwrap();
        f.controller.clear_debounce_state();
        let second = f.controller.handle_tag(classic_tag(UID_A)).await.unwrap();

        assert!(matches!(second, TagDisposition::Accepted(_)));
        assert_eq!(detected_count(&mut f.events), 2);
    }

    #[tokio::test]
    async fn test_detection_carries_identity_and_type() {
        let mut f = listening(AcquisitionConfig::default()).await;
        let tag = TagInfo::new(UID_A.to_vec(), vec![Technology::NfcB]);

        f.controller.handle_tag(tag).await.unwrap();

        match f.events.recv().await {
            Some(AcquisitionEvent::CardDetected(detection)) => {
                assert_eq!(detection.identity.uid_string(), "04:A2:5F:11");
                assert_eq!(detection.card_type, CardType::GenericNfcB);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_short_uid_accepted() {
        let mut f = listening(AcquisitionConfig::default()).await;

        let outcome = f.controller.handle_tag(classic_tag(&[0x01, 0x02, 0x03])).await.unwrap();

        match outcome {
            TagDisposition::Accepted(detection) => {
                assert_eq!(detection.identity.uid_string(), "01:02:03");
            }
            other => panic!("unexpected disposition: {other:?}"),
        }
        assert_eq!(detected_count(&mut f.events), 1);
        assert_eq!(f.haptic.pulses(), vec![200]);
    }

    #[tokio::test]
    async fn test_idle_controller_ignores_tags() {
        let mut f = fixture(AcquisitionConfig::default());

        let outcome = f.controller.handle_tag(classic_tag(UID_A)).await.unwrap();

        assert_eq!(outcome, TagDisposition::Ignored);
        assert_eq!(detected_count(&mut f.events), 0);
    }

    #[tokio::test]
    async fn test_haptic_failure_is_swallowed() {
        let mut f = listening(AcquisitionConfig::default()).await;
        f.haptic.set_failing(true);

        let outcome = f.controller.handle_tag(classic_tag(UID_A)).await.unwrap();

        assert!(matches!(outcome, TagDisposition::Accepted(_)));
        assert_eq!(detected_count(&mut f.events), 1);
    }

    #[tokio::test]
    async fn test_not_supported() {
        let (adapter, handle) = MockAdapter::unavailable();
        let (haptic, _) = MockHaptic::new();
        let (mut controller, mut events) =
            AcquisitionController::new(adapter, haptic, AcquisitionConfig::default());

        assert!(!controller.start_listening().await.unwrap());
        assert_eq!(controller.state(), ListenerState::Idle);
        assert!(matches!(events.recv().await, Some(AcquisitionEvent::NotSupported)));
        assert_eq!(handle.begin_count(), 0);
    }

    #[tokio::test]
    async fn test_disabled_still_available() {
        let mut f = fixture(AcquisitionConfig::default());
        f.adapter.set_enabled(false);

        assert!(!f.controller.start_listening().await.unwrap());
        assert!(f.controller.is_available());
        assert!(!f.controller.is_enabled());
        assert_eq!(f.controller.state(), ListenerState::Idle);
        assert!(matches!(f.events.recv().await, Some(AcquisitionEvent::Disabled)));
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let mut f = fixture(AcquisitionConfig::default());

        assert!(f.controller.start_listening().await.unwrap());
        assert!(f.controller.start_listening().await.unwrap());
        assert_eq!(f.controller.state(), ListenerState::Listening);
        assert_eq!(f.adapter.begin_count(), 1);

        f.controller.stop_listening().await.unwrap();
        f.controller.stop_listening().await.unwrap();
        assert_eq!(f.controller.state(), ListenerState::Idle);
        assert_eq!(f.adapter.end_count(), 1);
    }

    #[tokio::test]
    async fn test_full_dump_emits_snapshot() {
        let config = AcquisitionConfig::default().with_mode(AcquisitionMode::FullDump);
        let mut f = listening(config).await;
        let card = MockClassicCard::classic_1k(UID_A.to_vec()).with_locked_sector(3);
        f.adapter.insert_card(card.clone());

        f.controller.handle_tag(card.tag().clone()).await.unwrap();

        assert!(matches!(f.events.recv().await, Some(AcquisitionEvent::CardDetected(_))));
        match f.events.recv().await {
            Some(AcquisitionEvent::CardRead(snapshot)) => {
                assert_eq!(snapshot.authenticated_sectors(), 15);
                assert!(!snapshot.sectors()[3].is_authenticated());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(card.journal().close_count(), 1);
    }

    #[tokio::test]
    async fn test_full_dump_reports_failure() {
        let config = AcquisitionConfig::default().with_mode(AcquisitionMode::FullDump);
        let mut f = listening(config).await;
        let card = MockClassicCard::classic_1k(UID_A.to_vec()).with_connect_failure();
        f.adapter.insert_card(card.clone());

        f.controller.handle_tag(card.tag().clone()).await.unwrap();

        assert!(matches!(f.events.recv().await, Some(AcquisitionEvent::CardDetected(_))));
        assert!(matches!(
            f.events.recv().await,
            Some(AcquisitionEvent::ReadFailed {
                error: CardReadError::Session(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_full_dump_skips_non_classic() {
        let config = AcquisitionConfig::default().with_mode(AcquisitionMode::FullDump);
        let mut f = listening(config).await;
        let tag = TagInfo::new(vec![1, 2, 3, 4, 5, 6, 7], vec![Technology::MifareUltralight]);

        f.controller.handle_tag(tag).await.unwrap();

        assert!(matches!(f.events.try_recv(), Ok(AcquisitionEvent::CardDetected(_))));
        assert!(f.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_dump_needs_classic_details() {
        let config = AcquisitionConfig::default().with_mode(AcquisitionMode::FullDump);
        let mut f = listening(config).await;
        let tag = TagInfo::new(UID_A.to_vec(), vec![Technology::MifareClassic]);

        f.controller.handle_tag(tag).await.unwrap();

        match f.events.try_recv() {
            Ok(AcquisitionEvent::CardDetected(detection)) => {
                assert_eq!(detection.card_type, CardType::ClassicGeneric);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(f.events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_card_read() {
        let config = AcquisitionConfig::default().with_mode(AcquisitionMode::FullDump);
        let Fixture {
            controller,
            mut events,
            adapter,
            ..
        } = fixture(config);
        let card =
            MockClassicCard::classic_1k(UID_A.to_vec()).with_read_delay(Duration::from_secs(1));
        let (commands, command_rx) = mpsc::channel(4);
        let task = tokio::spawn(controller.run(command_rx));
        let started = Instant::now();

        adapter.tap(card.clone()).await.unwrap();
        assert!(matches!(events.recv().await, Some(AcquisitionEvent::CardDetected(_))));

        commands.send(AcquisitionCommand::Shutdown).await.unwrap();
        task.await.unwrap().unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(events.recv().await.is_none());
        assert!(card.journal().blocks_read().len() < 64);
        assert_eq!(card.journal().close_count(), 0);
        assert_eq!(adapter.end_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reads_queued_tags_after_dump() {
        let config = AcquisitionConfig::default().with_mode(AcquisitionMode::FullDump);
        let Fixture {
            controller,
            mut events,
            adapter,
            ..
        } = fixture(config);
        let slow =
            MockClassicCard::classic_1k(UID_A.to_vec()).with_read_delay(Duration::from_millis(10));
        let (commands, command_rx) = mpsc::channel(4);
        let task = tokio::spawn(controller.run(command_rx));

        adapter.tap(slow.clone()).await.unwrap();
        adapter.tap(MockClassicCard::classic_1k(UID_B.to_vec())).await.unwrap();

        let kinds: Vec<_> = [
            events.recv().await.unwrap(),
            events.recv().await.unwrap(),
            events.recv().await.unwrap(),
            events.recv().await.unwrap(),
        ]
        .iter()
        .map(|event| match event {
            AcquisitionEvent::CardDetected(d) => format!("detected {}", d.identity),
            AcquisitionEvent::CardRead(s) => format!("read {}", s.identity()),
            other => format!("{other:?}"),
        })
        .collect();
        assert_eq!(
            kinds,
            vec![
                "detected 04:A2:5F:11",
                "read 04:A2:5F:11",
                "detected 04:A2:5F:12",
                "read 04:A2:5F:12",
            ]
        );
        assert_eq!(slow.journal().close_count(), 1);

        drop(commands);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_closed_event_channel() {
        let Fixture {
            mut controller,
            events,
            ..
        } = listening(AcquisitionConfig::default()).await;
        drop(events);

        let result = controller.handle_tag(classic_tag(UID_A)).await;
        assert!(matches!(result, Err(AcquisitionError::EventChannelClosed)));
    }
}
