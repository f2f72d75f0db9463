//! Panel state layer between `woonveilig-api` and a home-automation host.
//!
//! This crate turns the panel's history log into state changes and drives
//! mode commands:
//!
//! - **[`Panel`]**: host-facing facade. [`login()`](Panel::login) checks
//!   credentials, [`set_state()`](Panel::set_state) switches mode with
//!   retries, and [`process_new_logs()`](Panel::process_new_logs) runs one
//!   poll cycle. Derived [`Fact`]s go out on a broadcast channel
//!   ([`subscribe()`](Panel::subscribe)) and are mirrored into watch
//!   channels ([`mode()`](Panel::mode), [`alarm()`](Panel::alarm)).
//!
//! - **[`Classifier`]**: assigns a year and a typed action/outcome to each
//!   raw history row.
//!
//! - **[`reconcile()`]**: pure function from classified events plus a
//!   [`Watermark`] to the new watermark, mode and alarm flag.
//!
//! - **[`CommandDriver`]**: bounded-retry mode changes over any
//!   [`ModeSink`].
//!
//! - **[`Poller`]**: runs cycles against a host-owned [`WatermarkStore`],
//!   on demand or on an interval, dropping ticks that overlap a running
//!   cycle.

pub mod classify;
pub mod command;
pub mod config;
pub mod error;
pub mod model;
pub mod panel;
pub mod poller;
pub mod reconcile;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::Classifier;
pub use command::{CommandDriver, CommandOutcome, ModeSink};
pub use config::{PanelConfig, RetryPolicy};
pub use error::CoreError;
pub use panel::Panel;
pub use poller::{MemoryWatermarkStore, PollOutcome, Poller, WatermarkStore};
pub use reconcile::{Reconciliation, reconcile};

// ── Model re-exports ────────────────────────────────────────────────
pub use model::{AlarmState, Fact, LogAction, LogEvent, LogOutcome, Watermark};

pub use woonveilig_api::{PanelMode, RequestRetry};
