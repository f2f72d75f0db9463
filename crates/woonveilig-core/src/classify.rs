// ── Log classification ──
//
// Turns raw history rows into typed `LogEvent`s. The panel logs only
// `MM/DD` and `HH:MM`; the year is supplied by the classifier, so a batch
// that spans New Year puts December entries in the wrong year.

use chrono::{Datelike, Local, NaiveDateTime};

use woonveilig_api::{PanelMode, RawLogRecord};

use crate::error::CoreError;
use crate::model::{LogAction, LogEvent, LogOutcome};

/// Classifies history rows against a fixed calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    year: i32,
}

impl Classifier {
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    /// Classifier for the current year on the local clock.
    pub fn current_year() -> Self {
        Self::new(Local::now().year())
    }

    /// Classify every row, keeping the panel's order. The first bad row
    /// fails the whole batch.
    pub fn classify_all(self, records: &[RawLogRecord]) -> Result<Vec<LogEvent>, CoreError> {
        records.iter().map(|r| self.classify(r)).collect()
    }

    pub fn classify(self, record: &RawLogRecord) -> Result<LogEvent, CoreError> {
        let code = record.action.trim();
        let mode = PanelMode::from_action_code(code);

        Ok(LogEvent {
            timestamp: self.timestamp(&record.date, &record.time)?,
            action: classify_action(code, mode),
            outcome: classify_outcome(code),
            mode,
            source: record.source.clone(),
        })
    }

    /// Build `{year}-MM-DDTHH:MM:00` from the row's date and time fragments.
    pub fn timestamp(self, date: &str, time: &str) -> Result<NaiveDateTime, CoreError> {
        let date = date.trim().replace('/', "-");
        let time = time.trim();
        let stamp = format!("{}-{date}T{time}:00", self.year);

        NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%dT%H:%M:%S").map_err(|e| {
            CoreError::Parse {
                field: "timestamp",
                value: format!("{date} {time}"),
                reason: e.to_string(),
            }
        })
    }
}

fn classify_action(code: &str, mode: Option<PanelMode>) -> LogAction {
    if mode.is_some() {
        LogAction::ModeChanged
    } else if code.contains("Timeout") {
        LogAction::Timeout
    } else {
        LogAction::Unknown
    }
}

fn classify_outcome(code: &str) -> LogOutcome {
    if code.contains("Burglary") {
        LogOutcome::BurglarAlarm
    } else if code.contains("Entry Timeout") {
        LogOutcome::EntryTimeout
    } else if code.is_empty() {
        LogOutcome::Other
    } else {
        LogOutcome::Success
    }
}
