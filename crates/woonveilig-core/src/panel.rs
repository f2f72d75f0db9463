// ── Panel facade ──
//
// The host-facing handle for one alarm panel. Owns the HTTP client and the
// fact channels; every poll cycle runs through `run_cycle`, and mode
// commands go through the `CommandDriver`.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, broadcast, watch};
use tracing::{debug, info};

use woonveilig_api::PanelClient;

use crate::classify::Classifier;
use crate::command::{CommandDriver, CommandOutcome};
use crate::config::PanelConfig;
use crate::error::CoreError;
use crate::model::{AlarmState, Fact, Watermark};
use crate::poller::{Poller, WatermarkStore};
use crate::reconcile::{Reconciliation, reconcile};

const FACT_CHANNEL_CAPACITY: usize = 64;

// ── Panel ────────────────────────────────────────────────────────

/// Handle to a WoonVeilig panel.
///
/// Cheaply cloneable via `Arc<PanelInner>`. Clones share the HTTP client,
/// the fact channels and the poll lock.
#[derive(Clone)]
pub struct Panel {
    inner: Arc<PanelInner>,
}

struct PanelInner {
    config: PanelConfig,
    client: PanelClient,
    fact_tx: broadcast::Sender<Fact>,
    mode: watch::Sender<Option<AlarmState>>,
    alarm: watch::Sender<Option<bool>>,
    /// Held for the whole of a poll cycle: load, fetch, reconcile, store.
    poll_lock: Mutex<()>,
}

impl Panel {
    /// Build a panel handle. Does no I/O.
    ///
    /// Rejects a zero `timeout` or `poll_interval` with `CoreError::Config`.
    pub fn new(config: PanelConfig) -> Result<Self, CoreError> {
        if config.timeout.is_zero() {
            return Err(CoreError::Config {
                message: "timeout must be greater than zero".into(),
            });
        }
        if config.poll_interval.is_zero() {
            return Err(CoreError::Config {
                message: "poll_interval must be greater than zero".into(),
            });
        }

        let client = PanelClient::new(config.credentials(), &config.transport())?;
        let (fact_tx, _) = broadcast::channel(FACT_CHANNEL_CAPACITY);
        let (mode, _) = watch::channel(None);
        let (alarm, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(PanelInner {
                config,
                client,
                fact_tx,
                mode,
                alarm,
                poll_lock: Mutex::new(()),
            }),
        })
    }

    pub fn config(&self) -> &PanelConfig {
        &self.inner.config
    }

    // ── Operations ───────────────────────────────────────────────

    /// Check the credentials against the panel.
    pub async fn login(&self) -> Result<(), CoreError> {
        self.inner.client.login().await?;
        info!(host = %self.inner.config.host, "logged in to panel");
        Ok(())
    }

    /// Switch the panel to `state`, retrying per the configured policy.
    ///
    /// No fact is published here; the next poll picks up the change from
    /// the panel's log.
    pub async fn set_state(&self, state: AlarmState) -> CommandOutcome {
        CommandDriver::new(&self.inner.client, self.inner.config.retry)
            .set_mode(state)
            .await
    }

    /// Run one poll cycle against `watermark` and return the watermark to
    /// keep. Fails with `CoreError::Busy`, without contacting the panel,
    /// while another cycle is in flight.
    pub async fn process_new_logs(&self, watermark: Watermark) -> Result<Watermark, CoreError> {
        let Some(_guard) = self.try_begin_cycle() else {
            debug!("poll cycle already running, dropping request");
            return Err(CoreError::Busy);
        };

        let result = self.run_cycle(watermark).await?;
        self.publish(&result);
        Ok(result.watermark)
    }

    // ── Subscriptions ────────────────────────────────────────────

    /// Stream of facts as they are derived.
    pub fn subscribe(&self) -> broadcast::Receiver<Fact> {
        self.inner.fact_tx.subscribe()
    }

    /// Last known mode, `None` until a mode change has been logged.
    pub fn mode(&self) -> watch::Receiver<Option<AlarmState>> {
        self.inner.mode.subscribe()
    }

    /// Last known alarm flag, `None` until the log says anything about it.
    pub fn alarm(&self) -> watch::Receiver<Option<bool>> {
        self.inner.alarm.subscribe()
    }

    /// A poll scheduler for this panel backed by `store`.
    pub fn poller<S: WatermarkStore>(&self, store: S) -> Poller<S> {
        Poller::new(self.clone(), store)
    }

    // ── Internals ────────────────────────────────────────────────

    /// The poll lock, if no cycle is running.
    pub(crate) fn try_begin_cycle(&self) -> Option<MutexGuard<'_, ()>> {
        self.inner.poll_lock.try_lock().ok()
    }

    /// Fetch, classify and reconcile. Caller holds the poll lock and
    /// publishes the result once it is safe to.
    pub(crate) async fn run_cycle(&self, watermark: Watermark) -> Result<Reconciliation, CoreError> {
        let rows = self.inner.client.history().await?;
        let classifier = self
            .inner
            .config
            .log_year
            .map_or_else(Classifier::current_year, Classifier::new);
        let events = classifier.classify_all(&rows)?;
        let result = reconcile(&events, watermark);

        debug!(
            rows = rows.len(),
            new = result.new_events,
            watermark = %result.watermark,
            "poll cycle complete"
        );
        Ok(result)
    }

    pub(crate) fn publish(&self, result: &Reconciliation) {
        for fact in result.facts() {
            info!(?fact, "panel state changed");
            match fact {
                Fact::ModeChanged(state) => {
                    self.inner.mode.send_replace(Some(state));
                }
                Fact::AlarmChanged(raised) => {
                    self.inner.alarm.send_replace(Some(raised));
                }
            }
            // No receivers is fine: the watch channels keep the state.
            let _ = self.inner.fact_tx.send(fact);
        }
    }
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("host", &self.inner.config.host)
            .field("mode", &*self.inner.mode.borrow())
            .field("alarm", &*self.inner.alarm.borrow())
            .finish_non_exhaustive()
    }
}
