// ── Poll scheduling ──
//
// A `Poller` runs the panel's poll cycle against a host-owned watermark
// store, either on demand (`poll_once`) or on an interval (`spawn`). At most
// one cycle runs per panel; a tick that lands while one is in flight is
// dropped rather than queued.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Fact, Watermark};
use crate::panel::Panel;

/// Where the watermark lives between cycles. Owned by the host.
pub trait WatermarkStore: Send + Sync + 'static {
    /// The last stored watermark, or the default if none was stored.
    fn load(&self) -> impl Future<Output = Result<Watermark, CoreError>> + Send;

    fn store(&self, watermark: Watermark) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// In-process store. Clones share the same watermark.
#[derive(Debug, Clone, Default)]
pub struct MemoryWatermarkStore {
    watermark: Arc<Mutex<Watermark>>,
}

impl MemoryWatermarkStore {
    pub fn new(initial: Watermark) -> Self {
        Self {
            watermark: Arc::new(Mutex::new(initial)),
        }
    }

    pub async fn current(&self) -> Watermark {
        *self.watermark.lock().await
    }
}

impl WatermarkStore for MemoryWatermarkStore {
    async fn load(&self) -> Result<Watermark, CoreError> {
        Ok(self.current().await)
    }

    async fn store(&self, watermark: Watermark) -> Result<(), CoreError> {
        *self.watermark.lock().await = watermark;
        Ok(())
    }
}

/// How a single poll went.
#[derive(Debug)]
pub enum PollOutcome {
    /// The cycle ran and `watermark` was stored.
    Completed {
        watermark: Watermark,
        facts: Vec<Fact>,
    },
    /// Another cycle was still running.
    Skipped,
    /// The cycle aborted; the stored watermark is unchanged.
    Failed(CoreError),
}

impl PollOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Drives poll cycles for one panel.
#[derive(Debug)]
pub struct Poller<S> {
    panel: Panel,
    store: S,
}

impl<S: WatermarkStore> Poller<S> {
    pub fn new(panel: Panel, store: S) -> Self {
        Self { panel, store }
    }

    /// Run one cycle now, unless one is already in flight.
    pub async fn poll_once(&self) -> PollOutcome {
        let Some(_guard) = self.panel.try_begin_cycle() else {
            debug!("poll cycle already running, skipping");
            return PollOutcome::Skipped;
        };

        match self.cycle().await {
            Ok((watermark, facts)) => PollOutcome::Completed { watermark, facts },
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "poll cycle failed");
                PollOutcome::Failed(e)
            }
        }
    }

    async fn cycle(&self) -> Result<(Watermark, Vec<Fact>), CoreError> {
        let watermark = self.store.load().await?;
        let result = self.panel.run_cycle(watermark).await?;
        self.store.store(result.watermark).await?;
        // Facts go out only once the watermark that covers them is stored.
        self.panel.publish(&result);
        Ok((result.watermark, result.facts()))
    }

    /// Poll every `interval` until `cancel` fires. The first poll runs
    /// immediately. A zero `interval` falls back to the panel's configured
    /// `poll_interval`.
    pub fn spawn(self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let interval = if interval.is_zero() {
            let fallback = self.panel.config().poll_interval;
            warn!(
                fallback_secs = fallback.as_secs_f64(),
                "zero poll interval, using configured interval"
            );
            fallback
        } else {
            interval
        };

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.poll_once().await;
                    }
                }
            }
            debug!("poller stopped");
        })
    }
}
