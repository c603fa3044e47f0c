//! Poll cycle orchestration: sequences the endpoint calls, folds failures
//! into one verdict and announces newly discovered entities.

pub mod scheduler;

use crate::client::{ClientError, ClientResult, Endpoint, LedFxClient, ReqwestTransport};
use crate::config::Config;
use crate::data::{FlatData, STATE};
use crate::registry::{
    icons, Binding, EntityCategory, EntityDescriptor, EntityKind, NewEntityCallback, StaticMetadata, Subscribers,
};
use crate::schema::{self, LiveState, Normalizer, Version};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;

pub use scheduler::{Command, Scheduler};

pub const AUDIO_INPUT_NAME: &str = "Audio input";
pub const MEDIA_PLAYER_KEY: &str = "media_player";
pub const MEDIA_PLAYER_NAME: &str = "LedFx media player";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    Success,
    /// Transport failure, bad JSON or similar.
    Unreachable,
    /// The server answered but refused the request.
    Rejected,
    /// A cycle was already running, or the updater is stopped.
    Skipped,
}

impl CycleOutcome {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CycleOutcome::Success => Some(StatusCode::OK),
            CycleOutcome::Unreachable => Some(StatusCode::NOT_FOUND),
            CycleOutcome::Rejected => Some(StatusCode::FORBIDDEN),
            CycleOutcome::Skipped => None,
        }
    }

    fn from_result(result: &ClientResult<()>) -> Self {
        match result {
            Ok(()) => CycleOutcome::Success,
            Err(ClientError::Request(_)) => CycleOutcome::Rejected,
            Err(_) => CycleOutcome::Unreachable,
        }
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Instance handle for one LedFx server. Everything else borrows state
/// through it.
#[derive(Debug)]
pub struct Updater {
    client: LedFxClient,
    state: RwLock<LiveState>,
    normalizer: RwLock<Option<Arc<dyn Normalizer>>>,
    subscribers: Subscribers,
    /// Held while announcing and while subscribing.
    announce: Mutex<()>,
    code: AtomicU16,
    busy: AtomicBool,
    stopped: AtomicBool,
    check_only: bool,
    scan_interval: Duration,
    changes: watch::Sender<u64>,
}

impl Updater {
    pub fn new(client: LedFxClient, scan_interval: Duration, check_only: bool) -> Self {
        let mut state = LiveState::new(client.address());
        register_static_entities(&mut state);
        state.discovered.clear();

        let (changes, _) = watch::channel(0);

        Self {
            client,
            state: RwLock::new(state),
            normalizer: RwLock::new(None),
            subscribers: Subscribers::new(),
            announce: Mutex::new(()),
            code: AtomicU16::new(StatusCode::BAD_GATEWAY.as_u16()),
            busy: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            check_only,
            scan_interval,
            changes,
        }
    }

    pub fn from_config(config: &Config, check_only: bool) -> ClientResult<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        let client = LedFxClient::new(transport, &config.host, config.port, config.auth(), config.timeout())?;

        Ok(Self::new(client, config.scan_interval(), check_only))
    }

    pub fn client(&self) -> &LedFxClient {
        &self.client
    }

    pub fn address(&self) -> String {
        self.client.address()
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    /// Status of the last finished cycle; `502` before the first one.
    pub fn code(&self) -> StatusCode {
        StatusCode::from_u16(self.code.load(Ordering::Acquire)).unwrap_or(StatusCode::BAD_GATEWAY)
    }

    pub fn version(&self) -> Option<Version> {
        self.read(|state| state.version)
    }

    pub fn is_virtual(&self) -> bool {
        self.normalizer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|n| n.is_virtual())
            .unwrap_or(false)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn read<R>(&self, f: impl FnOnce(&LiveState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut LiveState) -> R) -> R {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Copy of the flat data map.
    pub fn data(&self) -> FlatData {
        self.read(|state| state.data.clone())
    }

    /// Receives a new generation number after every cycle and every
    /// applied action.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn notify_listeners(&self) {
        self.changes.send_modify(|generation| *generation += 1);
    }

    /// Registers the "new entity" callback of a kind and returns the
    /// descriptors already known, which the callback will not see.
    ///
    /// Descriptors still waiting to be announced are left to the callback.
    /// Callbacks must not subscribe.
    pub fn subscribe(&self, kind: EntityKind, callback: NewEntityCallback) -> Vec<EntityDescriptor> {
        let _announce = self.announce.lock().unwrap_or_else(PoisonError::into_inner);
        self.subscribers.subscribe(kind, callback);
        self.read(|state| {
            state
                .registry
                .descriptors(kind)
                .into_iter()
                .filter(|known| {
                    !state
                        .discovered
                        .iter()
                        .any(|pending| pending.kind == known.kind && pending.key == known.key)
                })
                .collect()
        })
    }

    /// Drops every subscriber; results of cycles still in flight are
    /// discarded.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            tracing::info!("Stopping updater for {}", self.address());
        }
        self.subscribers.unsubscribe_all();
    }

    pub async fn refresh(&self) -> CycleOutcome {
        if self.is_stopped() {
            return CycleOutcome::Skipped;
        }
        if self.busy.swap(true, Ordering::AcqRel) {
            tracing::debug!("Update of {} already running, skipping", self.address());
            return CycleOutcome::Skipped;
        }
        let _guard = BusyGuard(&self.busy);

        let result = self.run_cycle().await;
        if self.is_stopped() {
            return CycleOutcome::Skipped;
        }

        let outcome = CycleOutcome::from_result(&result);
        if let Err(err) = &result {
            tracing::warn!("Update of {} failed: {}", self.address(), err);
        }
        if let Some(status) = outcome.status() {
            self.code.store(status.as_u16(), Ordering::Release);
        }

        self.write(|state| state.data.insert(STATE, outcome == CycleOutcome::Success));
        self.dispatch_discovered();
        self.notify_listeners();

        outcome
    }

    async fn run_cycle(&self) -> ClientResult<()> {
        let config = self.client.config().await?;
        let normalizer = self.normalizer_for(&config)?;
        self.apply(normalizer.as_ref(), Endpoint::Config, &config);

        if self.check_only {
            return Ok(());
        }

        for endpoint in normalizer.sequence() {
            let response = self.client.fetch(*endpoint).await?;
            self.apply(normalizer.as_ref(), *endpoint, &response);
        }

        Ok(())
    }

    fn normalizer_for(&self, config: &Value) -> ClientResult<Arc<dyn Normalizer>> {
        let detected = Version::detect(config);

        let mut current = self.normalizer.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(normalizer) = current.as_ref() {
            if detected.is_some_and(|v| v != normalizer.version()) {
                tracing::warn!(
                    "Server now reports a {} config, keeping the {} schema",
                    detected.map(|v| v.to_string()).unwrap_or_default(),
                    normalizer.version()
                );
            }
            return Ok(normalizer.clone());
        }

        let version = detected.ok_or_else(|| ClientError::Request("unrecognised config response".to_string()))?;
        tracing::info!("Detected LedFx {} API at {}", version, self.address());

        let normalizer = schema::for_version(version);
        *current = Some(normalizer.clone());
        drop(current);

        self.write(|state| state.version = Some(version));
        Ok(normalizer)
    }

    fn apply(&self, normalizer: &dyn Normalizer, endpoint: Endpoint, response: &Value) {
        if self.is_stopped() {
            return;
        }
        self.write(|state| normalizer.apply(endpoint, response, state));
        self.dispatch_discovered();
    }

    fn dispatch_discovered(&self) {
        let _announce = self.announce.lock().unwrap_or_else(PoisonError::into_inner);
        let pending = self.write(|state| state.take_discovered());
        for descriptor in pending {
            if !self.subscribers.notify(&descriptor) {
                tracing::trace!("No subscriber for {} '{}'", descriptor.kind, descriptor.key);
            }
        }
    }
}

/// The audio input select and the media player exist for every server.
pub(crate) fn register_static_entities(state: &mut LiveState) {
    let info = state.service_info();

    state.discover(EntityDescriptor::global(
        EntityKind::Select,
        Binding::AudioInput,
        crate::data::AUDIO_INPUT,
        StaticMetadata::new(AUDIO_INPUT_NAME)
            .icon(icons::AUDIO_INPUT)
            .category(EntityCategory::Config),
        info.clone(),
    ));
    state.discover(EntityDescriptor::global(
        EntityKind::MediaPlayer,
        Binding::MediaPlayer,
        MEDIA_PLAYER_KEY,
        StaticMetadata::new(MEDIA_PLAYER_NAME),
        info,
    ));
}

/// Runs one config-only cycle and reports the resulting status code.
pub async fn verify_access(config: &Config) -> StatusCode {
    let updater = match Updater::from_config(config, true) {
        Ok(updater) => updater,
        Err(err) => {
            tracing::warn!("Cannot reach {}: {}", config.address(), err);
            return StatusCode::NOT_FOUND;
        }
    };

    updater.refresh().await;
    updater.stop();

    updater.code()
}
