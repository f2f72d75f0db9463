// ── Log event domain types ──

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use woonveilig_api::PanelMode;

/// What kind of entry a log row is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogAction {
    /// Arm, home or disarm.
    ModeChanged,
    /// A timer ran out (entry/exit delay).
    Timeout,
    Unknown,
}

/// How the logged action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogOutcome {
    Success,
    /// A sensor tripped while armed.
    BurglarAlarm,
    /// The door was opened and nobody entered the code in time.
    EntryTimeout,
    /// The row carried no action code.
    Other,
}

/// One classified entry of the panel's history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Panel-local wall clock, minute precision.
    pub timestamp: NaiveDateTime,
    pub action: LogAction,
    pub outcome: LogOutcome,
    pub mode: Option<PanelMode>,
    /// Device or user that caused the entry.
    pub source: String,
}

impl LogEvent {
    /// A successful arm/home/disarm.
    pub fn is_mode_change(&self) -> bool {
        self.action == LogAction::ModeChanged
            && self.outcome == LogOutcome::Success
            && self.mode.is_some()
    }

    pub fn is_disarm(&self) -> bool {
        self.is_mode_change() && self.mode == Some(PanelMode::Disarm)
    }

    /// A burglary, or an entry delay that expired without a code.
    pub fn is_alarm(&self) -> bool {
        self.outcome == LogOutcome::BurglarAlarm
            || (self.action == LogAction::Timeout && self.outcome == LogOutcome::EntryTimeout)
    }
}
