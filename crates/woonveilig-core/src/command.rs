// ── Mode commands ──
//
// Drives a mode change through the panel with bounded retries. The driver
// only reports whether the panel confirmed the change; the resulting state
// is picked up by the next poll cycle like any other log entry.

use std::future::Future;

use tracing::{info, warn};

use woonveilig_api::{PanelClient, PanelMode};

use crate::config::RetryPolicy;
use crate::error::CoreError;
use crate::model::AlarmState;

/// Something that can ask the panel to change mode, once.
pub trait ModeSink: Send + Sync {
    /// `Ok(true)` when the panel confirmed the change.
    fn send_mode(
        &self,
        mode: PanelMode,
    ) -> impl Future<Output = Result<bool, woonveilig_api::Error>> + Send;
}

impl ModeSink for PanelClient {
    fn send_mode(
        &self,
        mode: PanelMode,
    ) -> impl Future<Output = Result<bool, woonveilig_api::Error>> + Send {
        self.set_mode(mode)
    }
}

/// How a mode change ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The panel confirmed the change on attempt `attempts`.
    Applied { attempts: u32 },
    /// Every attempt failed. `last_error` describes the final one.
    Failed {
        attempts: u32,
        last_error: Option<String>,
    },
}

impl CommandOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Applied { attempts } | Self::Failed { attempts, .. } => *attempts,
        }
    }

    /// Attempts used on success, `CoreError::CommandFailed` otherwise.
    pub fn into_result(self) -> Result<u32, CoreError> {
        match self {
            Self::Applied { attempts } => Ok(attempts),
            Self::Failed {
                attempts,
                last_error,
            } => Err(CoreError::CommandFailed {
                attempts,
                last_error,
            }),
        }
    }
}

/// Sends mode changes through a [`ModeSink`] under a [`RetryPolicy`].
#[derive(Debug)]
pub struct CommandDriver<'a, S> {
    sink: &'a S,
    retry: RetryPolicy,
}

impl<'a, S: ModeSink> CommandDriver<'a, S> {
    pub fn new(sink: &'a S, retry: RetryPolicy) -> Self {
        Self { sink, retry }
    }

    /// Ask the panel to enter `state`, retrying until it confirms or the
    /// policy runs out.
    pub async fn set_mode(&self, state: AlarmState) -> CommandOutcome {
        let mode = state.panel_mode();
        let attempts = self.retry.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.sink.send_mode(mode).await {
                Ok(true) => {
                    info!(%state, attempt, "panel confirmed mode change");
                    return CommandOutcome::Applied { attempts: attempt };
                }
                Ok(false) => {
                    warn!(%state, attempt, attempts, "panel did not confirm mode change");
                    last_error = Some("panel did not confirm the mode change".to_owned());
                }
                Err(e) => {
                    warn!(%state, attempt, attempts, error = %e, "mode change request failed");
                    last_error = Some(e.to_string());
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.retry.backoff).await;
            }
        }

        warn!(%state, attempts, "giving up on mode change");
        CommandOutcome::Failed {
            attempts,
            last_error,
        }
    }
}
