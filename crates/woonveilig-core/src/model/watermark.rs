// ── Watermark ──
//
// Boundary between log entries already processed and new ones. Persisted
// by the host between poll cycles.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp of the newest log entry seen so far.
///
/// Defaults to 1970-01-01T00:00:00, which admits every entry.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Watermark(NaiveDateTime);

impl Watermark {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self(timestamp)
    }

    pub fn timestamp(self) -> NaiveDateTime {
        self.0
    }

    /// Whether an entry at `timestamp` is new relative to this watermark.
    pub fn admits(self, timestamp: NaiveDateTime) -> bool {
        timestamp > self.0
    }

    /// Move forward to `timestamp`; never moves backwards.
    pub fn advance_to(self, timestamp: NaiveDateTime) -> Self {
        Self(self.0.max(timestamp))
    }
}

impl From<NaiveDateTime> for Watermark {
    fn from(timestamp: NaiveDateTime) -> Self {
        Self(timestamp)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}
