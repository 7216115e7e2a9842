// ── Synchronization engine ──
//
// Owns the device client and all engine state. Runs the poll loop, routes
// operator commands to the device and publishes a snapshot after every
// change. State lives behind a std mutex that is never held across an
// await; a separate async lock keeps at most one fetch in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use stillctl_api::{Ack, DeviceClient, SubmitEncoding, TransportConfig};

use crate::command::{Command, Endpoint};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::lookup::{RateClass, TankLevel};
use crate::model::{ConfigSnapshot, TelemetrySnapshot};
use crate::poll::PollState;
use crate::state::{EngineSnapshot, EngineState, failure_outcome};

/// Handle to a running (or not yet started) synchronization engine.
///
/// Cheaply cloneable via `Arc<EngineInner>`; clones share one state, one
/// client and one poll task.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    client: DeviceClient,
    state: Mutex<EngineState>,
    /// Held for the duration of each `/data` round-trip.
    fetch_lock: tokio::sync::Mutex<()>,
    snapshot_tx: watch::Sender<Arc<EngineSnapshot>>,
    poll_task: tokio::sync::Mutex<Option<PollTask>>,
}

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SyncEngine {
    /// Create an engine for the configured device. Does NOT start polling:
    /// call [`start()`](Self::start) or drive it with
    /// [`poll_once()`](Self::poll_once).
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = DeviceClient::new(config.device_url.clone(), &transport)?;
        Ok(Self::with_client(config, client))
    }

    /// Create an engine around an existing client.
    pub fn with_client(config: EngineConfig, client: DeviceClient) -> Self {
        let state = EngineState::new(
            PollState::new(config.default_poll_interval),
            config.flow_scaling,
        );
        let (snapshot_tx, _) = watch::channel(Arc::new(state.snapshot()));

        Self {
            inner: Arc::new(EngineInner {
                config,
                client,
                state: Mutex::new(state),
                fetch_lock: tokio::sync::Mutex::new(()),
                snapshot_tx,
                poll_task: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the background poll loop. A second call while the loop is
    /// running is a no-op.
    pub async fn start(&self) {
        let mut slot = self.inner.poll_task.lock().await;
        if slot.is_some() {
            debug!("poll loop already running");
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_task(self.clone(), cancel.clone()));
        *slot = Some(PollTask { cancel, handle });
        info!(device = %self.inner.config.device_url, "poll loop started");
    }

    /// Cancel the poll loop and wait for it to finish. A fetch in flight is
    /// abandoned without touching state.
    pub async fn stop(&self) {
        let task = self.inner.poll_task.lock().await.take();
        if let Some(PollTask { cancel, handle }) = task {
            cancel.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "poll task ended abnormally");
            }
            info!("poll loop stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.inner.poll_task.lock().await.is_some()
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// Run one fetch-and-apply cycle.
    ///
    /// The failure is returned for the caller's information only: engine
    /// state records it and the loop carries on regardless.
    pub async fn poll_once(&self) -> Result<(), CoreError> {
        let _in_flight = self.inner.fetch_lock.lock().await;

        let ticket = self.lock_state().begin_fetch();
        debug!(want_config = ticket.want_config, "fetching device data");

        let result = self.inner.client.fetch_data(ticket.want_config).await;

        let settled = {
            let mut state = self.lock_state();
            match result {
                Ok(response) => {
                    state.apply_response(ticket, response);
                    Ok(())
                }
                Err(e) => {
                    state.apply_failure(failure_outcome(&e));
                    Err(CoreError::from(e))
                }
            }
        };
        self.publish();
        settled
    }

    /// The interval the loop will sleep after the current fetch.
    pub fn poll_interval(&self) -> Duration {
        self.lock_state().poll().interval()
    }

    pub fn needs_config(&self) -> bool {
        self.lock_state().poll().needs_config()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Send a command and wait for the device's acknowledgement.
    ///
    /// Config-changing commands re-arm the config fetch before anything
    /// goes on the wire and again once the post settles, so the next poll
    /// always observes the submission. The cache is never touched here.
    pub async fn dispatch(&self, command: Command) -> Result<Ack, CoreError> {
        command.validate()?;
        let changes_config = command.changes_config();
        if changes_config {
            self.rearm();
        }

        let result = send(&self.inner.client, &command, self.inner.config.encoding).await;

        if changes_config {
            self.rearm();
        }
        result
    }

    /// Fire-and-forget form of [`dispatch()`](Self::dispatch). The re-arm
    /// happens before this returns; delivery failures are logged.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn fire(&self, command: Command) -> Result<(), CoreError> {
        command.validate()?;
        if command.changes_config() {
            self.rearm();
        }

        let engine = self.clone();
        tokio::spawn(async move {
            let action = command.action();
            let result = send(&engine.inner.client, &command, engine.inner.config.encoding).await;
            if command.changes_config() {
                engine.rearm();
            }
            match result {
                Ok(_) => debug!(action, "command delivered"),
                Err(e) => warn!(action, error = %e, "command not delivered"),
            }
        });
        Ok(())
    }

    /// Fetch the device's operation log. Never part of the poll loop.
    pub async fn fetch_log(&self) -> Result<String, CoreError> {
        Ok(self.inner.client.fetch_log().await?)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Subscribe to engine snapshots. The receiver starts with the current
    /// snapshot marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Arc<EngineSnapshot>> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        Arc::clone(&self.inner.snapshot_tx.borrow())
    }

    pub fn config_snapshot(&self) -> Option<ConfigSnapshot> {
        self.lock_state().config().cloned()
    }

    pub fn telemetry(&self) -> Option<TelemetrySnapshot> {
        self.lock_state().telemetry().cloned()
    }

    pub fn flow_lookup(&self, rate: RateClass, valve: usize) -> Option<f64> {
        self.lock_state().flow_lookup(rate, valve)
    }

    pub fn tank_lookup(&self, level: TankLevel, tank: usize) -> Option<f64> {
        self.lock_state().tank_lookup(level, tank)
    }

    /// Select a sensor in the selector. `false` if the index is not listed.
    pub fn select_sensor(&self, index: usize) -> bool {
        let selected = self.lock_state().select_sensor(index);
        if selected {
            self.publish();
        }
        selected
    }

    // ── Internals ────────────────────────────────────────────────────

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn rearm(&self) {
        self.lock_state().rearm();
        self.publish();
    }

    fn publish(&self) {
        let snapshot = Arc::new(self.lock_state().snapshot());
        self.inner.snapshot_tx.send_replace(snapshot);
    }
}

/// Post a command's payload to its endpoint. Every failure, whatever the
/// device generation, becomes `SubmissionFailed`.
async fn send(
    client: &DeviceClient,
    command: &Command,
    encoding: SubmitEncoding,
) -> Result<Ack, CoreError> {
    let payload = command.to_payload();
    debug!(action = command.action(), fields = payload.len(), "sending command");

    let result = match command.endpoint() {
        Endpoint::Config => client.submit_config(&payload, encoding).await,
        Endpoint::Run => client.submit_command(&payload, encoding).await,
    };

    result.map_err(|e| CoreError::SubmissionFailed {
        action: command.action().into(),
        reason: e.to_string(),
    })
}

// ── Background tasks ─────────────────────────────────────────────

/// Fetch, settle, apply, sleep. The next fetch is only issued after the
/// previous one has settled, and a failure never ends the loop.
async fn poll_task(engine: SyncEngine, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = engine.poll_once() => {
                if let Err(e) = result {
                    warn!(error = %e, "poll failed");
                }
            }
        }

        let interval = engine.poll_interval();
        debug!(interval_ms = interval.as_millis(), "next poll scheduled");

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }
}
