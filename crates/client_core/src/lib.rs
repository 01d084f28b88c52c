use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    time::Duration,
};

use chrono::Utc;
use serde::Deserialize;
use shared::{domain::Message, error::ValidationError, protocol::NewMessage};
use tokio::{
    sync::broadcast,
    task::{JoinHandle, JoinSet},
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use url::Url;

pub mod error;
pub mod transport;
pub mod view;

pub use error::{ErrorCategory, Operation, SyncError};
pub use transport::{BoardTransport, HttpBoardTransport};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How overlapping fetches are reconciled when their responses arrive out of
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOrdering {
    /// Every successful response replaces the list, so a slow early request
    /// can overwrite a newer snapshot.
    #[default]
    LastResolved,
    /// Responses to requests issued before the newest applied snapshot are
    /// dropped.
    LatestIssued,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub endpoint: Url,
    pub poll_interval: Duration,
    pub ordering: FetchOrdering,
    /// `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

impl SyncConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            poll_interval: DEFAULT_POLL_INTERVAL,
            ordering: FetchOrdering::default(),
            request_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusyFlags {
    pub loading_initial: bool,
    pub refreshing: bool,
    pub submitting: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusyFlag {
    LoadingInitial,
    Refreshing,
    Submitting,
}

impl BusyFlags {
    fn slot(&mut self, flag: BusyFlag) -> &mut bool {
        match flag {
            BusyFlag::LoadingInitial => &mut self.loading_initial,
            BusyFlag::Refreshing => &mut self.refreshing,
            BusyFlag::Submitting => &mut self.submitting,
        }
    }
}

/// Form contents as last handed to the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Validation,
    FetchFailed,
    SubmitFailed,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub detail: String,
}

impl Alert {
    fn validation(err: ValidationError) -> Self {
        Self {
            kind: AlertKind::Validation,
            title: "Validation".into(),
            detail: err.to_string(),
        }
    }

    fn fetch_failed(err: &SyncError) -> Self {
        Self {
            kind: AlertKind::FetchFailed,
            title: "Failed to fetch messages".into(),
            detail: err.to_string(),
        }
    }

    fn submit_failed(err: &SyncError) -> Self {
        Self {
            kind: AlertKind::SubmitFailed,
            title: "Failed to send".into(),
            detail: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    MessagesReplaced(Vec<Message>),
    BusyChanged(BusyFlags),
    DraftChanged(Draft),
    Alert(Alert),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Replaced(usize),
    /// The response belonged to a request older than the applied snapshot.
    Stale,
    Failed(SyncError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    Rejected(ValidationError),
    Failed(SyncError),
}

#[derive(Default)]
struct ControllerState {
    messages: Vec<Message>,
    busy: BusyFlags,
    draft: Draft,
    last_alert: Option<Alert>,
    applied_seq: u64,
}

/// Owns the board snapshot and drives fetch, refresh, submit and polling.
///
/// Failures never escape the controller: they are logged, recorded as the
/// last alert and broadcast as [`SyncEvent::Alert`]. The outcome values
/// returned by each operation are informational.
pub struct SyncController {
    transport: Arc<dyn BoardTransport>,
    config: SyncConfig,
    inner: Mutex<ControllerState>,
    fetch_seq: AtomicU64,
    polling: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncController {
    pub fn connect(config: SyncConfig) -> anyhow::Result<Arc<Self>> {
        let transport =
            HttpBoardTransport::new(config.endpoint.clone(), config.request_timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: SyncConfig, transport: Arc<dyn BoardTransport>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            transport,
            config,
            inner: Mutex::new(ControllerState::default()),
            fetch_seq: AtomicU64::new(0),
            polling: Mutex::new(None),
            events,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    pub fn busy(&self) -> BusyFlags {
        self.state().busy
    }

    pub fn draft(&self) -> Draft {
        self.state().draft.clone()
    }

    pub fn last_alert(&self) -> Option<Alert> {
        self.state().last_alert.clone()
    }

    pub fn set_draft(&self, name: &str, text: &str) {
        let draft = Draft {
            name: name.to_string(),
            text: text.to_string(),
        };
        self.state().draft = draft.clone();
        self.emit(SyncEvent::DraftChanged(draft));
    }

    /// Initial load followed by the repeating poll timer.
    pub async fn mount(self: &Arc<Self>) -> FetchOutcome {
        let outcome = self.fetch_all().await;
        self.start_polling();
        outcome
    }

    pub fn unmount(&self) {
        self.stop_polling();
    }

    /// Replaces the snapshot with the server's full list.
    pub async fn fetch_all(&self) -> FetchOutcome {
        let ticket = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let _busy = self.busy_guard(BusyFlag::LoadingInitial);

        match self.transport.list_messages().await {
            Ok(messages) => self.apply_snapshot(ticket, messages),
            Err(err) => {
                warn!(endpoint = %self.config.endpoint, error = %err, "failed to fetch messages");
                self.raise(Alert::fetch_failed(&err));
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Manual pull-to-refresh; same request as [`Self::fetch_all`].
    pub async fn refresh(&self) -> FetchOutcome {
        let _busy = self.busy_guard(BusyFlag::Refreshing);
        self.fetch_all().await
    }

    /// Validates and posts a new message, then re-fetches the board.
    ///
    /// The new message is never inserted locally; it shows up once the
    /// follow-up fetch returns it. On success only the message text is
    /// cleared from the draft.
    pub async fn submit(&self, name: &str, text: &str) -> SubmitOutcome {
        let payload = match NewMessage::compose(name, text, Utc::now()) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(error = %err, "submit rejected by validation");
                self.raise(Alert::validation(err));
                return SubmitOutcome::Rejected(err);
            }
        };
        self.set_draft(name, text);

        let _busy = self.busy_guard(BusyFlag::Submitting);
        if let Err(err) = self.transport.post_message(&payload).await {
            warn!(endpoint = %self.config.endpoint, error = %err, "failed to submit message");
            self.raise(Alert::submit_failed(&err));
            return SubmitOutcome::Failed(err);
        }

        info!(nome = %payload.nome, "message submitted");
        self.set_draft(name, "");
        self.fetch_all().await;
        SubmitOutcome::Sent
    }

    /// Installs the repeating fetch timer, replacing any running one. The
    /// first tick fires one full interval after the call.
    pub fn start_polling(self: &Arc<Self>) {
        let period = self.config.poll_interval;
        let controller = Arc::downgrade(self);
        let task = tokio::spawn(poll_loop(controller, period));

        if let Some(previous) = self.polling_slot().replace(task) {
            previous.abort();
        }
        info!(?period, "polling started");
    }

    /// Cancels the timer along with any fetches it still has in flight.
    pub fn stop_polling(&self) {
        if let Some(task) = self.polling_slot().take() {
            task.abort();
            info!("polling stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.polling_slot()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn apply_snapshot(&self, ticket: u64, messages: Vec<Message>) -> FetchOutcome {
        let count = messages.len();
        {
            let mut state = self.state();
            if self.config.ordering == FetchOrdering::LatestIssued && ticket < state.applied_seq {
                debug!(ticket, applied = state.applied_seq, "dropping stale snapshot");
                return FetchOutcome::Stale;
            }
            state.applied_seq = state.applied_seq.max(ticket);
            state.messages = messages.clone();
        }
        debug!(count, "message snapshot replaced");
        self.emit(SyncEvent::MessagesReplaced(messages));
        FetchOutcome::Replaced(count)
    }

    fn raise(&self, alert: Alert) {
        self.state().last_alert = Some(alert.clone());
        self.emit(SyncEvent::Alert(alert));
    }

    fn set_busy(&self, flag: BusyFlag, value: bool) {
        let busy = {
            let mut state = self.state();
            *state.busy.slot(flag) = value;
            state.busy
        };
        self.emit(SyncEvent::BusyChanged(busy));
    }

    fn busy_guard(&self, flag: BusyFlag) -> BusyGuard<'_> {
        self.set_busy(flag, true);
        BusyGuard {
            controller: self,
            flag,
        }
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn polling_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.polling.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        let slot = self
            .polling
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

/// Clears a busy flag when the owning operation finishes or is cancelled.
struct BusyGuard<'a> {
    controller: &'a SyncController,
    flag: BusyFlag,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.controller.set_busy(self.flag, false);
    }
}

async fn poll_loop(controller: Weak<SyncController>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Dropping the set on abort cancels fetches still in flight.
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                in_flight.spawn(async move {
                    controller.fetch_all().await;
                });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
