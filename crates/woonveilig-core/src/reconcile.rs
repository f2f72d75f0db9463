// ── State reconciliation ──
//
// Derives the panel's mode and alarm flag from the log entries that are
// newer than the watermark. Pure: facts come back as values and the caller
// decides how to publish them.
//
// Ordering: events arrive newest-first. Timestamps only have minute
// resolution, so recency is (timestamp, position), with an earlier position
// meaning more recent among equal timestamps.

use std::cmp::Reverse;

use tracing::trace;

use crate::model::{AlarmState, Fact, LogEvent, Watermark};

/// Result of reconciling one batch of log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Watermark to persist for the next cycle.
    pub watermark: Watermark,
    /// Latest mode, if a new mode change was logged.
    pub mode: Option<AlarmState>,
    /// Alarm flag, if the new entries say anything about it.
    pub alarm: Option<bool>,
    /// How many events passed the watermark.
    pub new_events: usize,
}

impl Reconciliation {
    /// The facts to publish, alarm first.
    pub fn facts(&self) -> Vec<Fact> {
        self.alarm
            .map(Fact::AlarmChanged)
            .into_iter()
            .chain(self.mode.map(Fact::ModeChanged))
            .collect()
    }

    pub fn is_noop(&self) -> bool {
        self.mode.is_none() && self.alarm.is_none()
    }
}

/// Recency key: later timestamp wins, then earlier position in the log.
fn recency((position, event): &(usize, &LogEvent)) -> (chrono::NaiveDateTime, Reverse<usize>) {
    (event.timestamp, Reverse(*position))
}

/// Reconcile `events` (panel order, newest first) against `watermark`.
pub fn reconcile(events: &[LogEvent], watermark: Watermark) -> Reconciliation {
    let next_watermark = events
        .iter()
        .map(|e| e.timestamp)
        .max()
        .map_or(watermark, |newest| watermark.advance_to(newest));

    let fresh: Vec<(usize, &LogEvent)> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| watermark.admits(e.timestamp))
        .collect();

    if fresh.is_empty() {
        return Reconciliation {
            watermark: next_watermark,
            mode: None,
            alarm: None,
            new_events: 0,
        };
    }

    let latest_alarm = fresh
        .iter()
        .filter(|(_, e)| e.is_alarm())
        .copied()
        .max_by_key(recency);
    let latest_disarm = fresh
        .iter()
        .filter(|(_, e)| e.is_disarm())
        .copied()
        .max_by_key(recency);

    let alarm = match (latest_alarm, latest_disarm) {
        // Raised unless the disarm is strictly more recent.
        (Some(alarm), Some(disarm)) => Some(recency(&disarm) <= recency(&alarm)),
        (Some(_), None) => Some(true),
        // The alarm went off in an earlier window and was disarmed now.
        (None, Some(_)) => Some(false),
        (None, None) => None,
    };

    let mode = fresh
        .iter()
        .find(|(_, e)| e.is_mode_change())
        .and_then(|(_, e)| e.mode)
        .map(AlarmState::from);

    trace!(
        fresh = fresh.len(),
        ?mode,
        ?alarm,
        watermark = %next_watermark,
        "reconciled log batch"
    );

    Reconciliation {
        watermark: next_watermark,
        mode,
        alarm,
        new_events: fresh.len(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;
    use woonveilig_api::PanelMode;

    use super::*;
    use crate::model::{LogAction, LogOutcome};

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 14)
            .unwrap()
            .and_hms_opt(12, minute, 0)
            .unwrap()
    }

    fn mark(minute: u32) -> Watermark {
        Watermark::new(at(minute))
    }

    fn mode_event(minute: u32, mode: PanelMode) -> LogEvent {
        LogEvent {
            timestamp: at(minute),
            action: LogAction::ModeChanged,
            outcome: LogOutcome::Success,
            mode: Some(mode),
            source: "Keypad".into(),
        }
    }

    fn burglary(minute: u32) -> LogEvent {
        LogEvent {
            timestamp: at(minute),
            action: LogAction::Unknown,
            outcome: LogOutcome::BurglarAlarm,
            mode: None,
            source: "PIR hallway".into(),
        }
    }

    fn entry_timeout(minute: u32) -> LogEvent {
        LogEvent {
            timestamp: at(minute),
            action: LogAction::Timeout,
            outcome: LogOutcome::EntryTimeout,
            mode: None,
            source: "Front door".into(),
        }
    }

    fn noise(minute: u32) -> LogEvent {
        LogEvent {
            timestamp: at(minute),
            action: LogAction::Unknown,
            outcome: LogOutcome::Success,
            mode: None,
            source: "Door contact".into(),
        }
    }

    #[test]
    fn disarm_after_alarm_clears_it() {
        let events = [mode_event(10, PanelMode::Disarm), burglary(5)];
        let result = reconcile(&events, mark(0));

        assert_eq!(result.alarm, Some(false));
        assert_eq!(result.mode, Some(AlarmState::Disarmed));
        assert_eq!(result.watermark, mark(10));
        assert_eq!(result.new_events, 2);
    }

    #[test]
    fn lone_alarm_raises_flag_without_mode() {
        let result = reconcile(&[burglary(10)], mark(0));

        assert_eq!(result.alarm, Some(true));
        assert_eq!(result.mode, None);
        assert_eq!(result.facts(), vec![Fact::AlarmChanged(true)]);
    }

    #[test]
    fn alarm_after_disarm_stays_raised() {
        let events = [
            burglary(20),
            mode_event(15, PanelMode::Disarm),
            mode_event(10, PanelMode::Arm),
        ];
        let result = reconcile(&events, mark(0));

        assert_eq!(result.alarm, Some(true));
        assert_eq!(result.mode, Some(AlarmState::Disarmed));
    }

    #[test]
    fn alarm_comparison_uses_timestamps_not_positions() {
        // Out-of-order delivery: the disarm is listed last but happened last.
        let events = [burglary(5), noise(3), mode_event(10, PanelMode::Disarm)];
        let result = reconcile(&events, mark(0));

        assert_eq!(result.alarm, Some(false));
    }

    #[test]
    fn same_minute_ties_follow_log_order() {
        let cleared = reconcile(&[mode_event(10, PanelMode::Disarm), burglary(10)], mark(0));
        assert_eq!(cleared.alarm, Some(false));

        let raised = reconcile(&[burglary(10), mode_event(10, PanelMode::Disarm)], mark(0));
        assert_eq!(raised.alarm, Some(true));
    }

    #[test]
    fn entry_timeout_counts_as_alarm() {
        let result = reconcile(&[entry_timeout(7)], mark(0));
        assert_eq!(result.alarm, Some(true));
    }

    #[test]
    fn late_disarm_clears_alarm_from_previous_window() {
        let events = [mode_event(30, PanelMode::Disarm), burglary(10)];
        let result = reconcile(&events, mark(20));

        assert_eq!(result.alarm, Some(false));
        assert_eq!(result.new_events, 1);
    }

    #[test]
    fn newest_mode_event_wins() {
        let events = [
            mode_event(30, PanelMode::Home),
            mode_event(20, PanelMode::Disarm),
            mode_event(10, PanelMode::Arm),
        ];
        let result = reconcile(&events, mark(0));

        assert_eq!(result.mode, Some(AlarmState::PartiallyArmed));
        assert_eq!(result.alarm, Some(false));
    }

    #[test]
    fn arm_without_alarm_leaves_flag_unset() {
        let result = reconcile(&[mode_event(5, PanelMode::Arm)], mark(0));

        assert_eq!(result.mode, Some(AlarmState::Armed));
        assert_eq!(result.alarm, None);
        assert_eq!(result.facts(), vec![Fact::ModeChanged(AlarmState::Armed)]);
    }

    #[test]
    fn noise_produces_no_facts() {
        let result = reconcile(&[noise(5), noise(4)], mark(0));

        assert!(result.is_noop());
        assert_eq!(result.new_events, 2);
        assert_eq!(result.watermark, mark(5));
    }

    #[test]
    fn nothing_new_is_a_noop() {
        let events = [mode_event(10, PanelMode::Arm), burglary(5)];
        let result = reconcile(&events, mark(10));

        assert!(result.is_noop());
        assert!(result.facts().is_empty());
        assert_eq!(result.new_events, 0);
        assert_eq!(result.watermark, mark(10));
    }

    #[test]
    fn empty_batch_keeps_watermark() {
        let result = reconcile(&[], mark(42));

        assert!(result.is_noop());
        assert_eq!(result.watermark, mark(42));
    }

    #[test]
    fn watermark_never_regresses() {
        let result = reconcile(&[mode_event(5, PanelMode::Arm)], mark(50));
        assert_eq!(result.watermark, mark(50));
    }

    #[test]
    fn watermark_advances_to_batch_maximum() {
        // Newest entry is not first in the list.
        let events = [noise(12), mode_event(40, PanelMode::Arm), burglary(3)];
        let result = reconcile(&events, mark(0));
        assert_eq!(result.watermark, mark(40));
    }

    #[test]
    fn facts_list_alarm_before_mode() {
        let events = [mode_event(10, PanelMode::Disarm), burglary(5)];
        assert_eq!(
            reconcile(&events, mark(0)).facts(),
            vec![
                Fact::AlarmChanged(false),
                Fact::ModeChanged(AlarmState::Disarmed)
            ]
        );
    }
}
