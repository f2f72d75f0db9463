// ── Alarm state and facts ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use woonveilig_api::PanelMode;

/// The panel's confirmed arming state.
///
/// Strings follow the host's capability vocabulary
/// (`disarmed`, `armed`, `partially_armed`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlarmState {
    Disarmed,
    Armed,
    PartiallyArmed,
}

impl AlarmState {
    /// The panel mode that puts the panel into this state.
    pub fn panel_mode(self) -> PanelMode {
        match self {
            Self::Disarmed => PanelMode::Disarm,
            Self::Armed => PanelMode::Arm,
            Self::PartiallyArmed => PanelMode::Home,
        }
    }
}

impl From<PanelMode> for AlarmState {
    fn from(mode: PanelMode) -> Self {
        match mode {
            PanelMode::Arm => Self::Armed,
            PanelMode::Home => Self::PartiallyArmed,
            PanelMode::Disarm => Self::Disarmed,
        }
    }
}

/// A derived, externally observable state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fact", content = "value", rename_all = "snake_case")]
pub enum Fact {
    /// The panel switched arming mode.
    ModeChanged(AlarmState),
    /// The intrusion alarm went off (`true`) or was cleared (`false`).
    AlarmChanged(bool),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mode_maps_to_exactly_one_state() {
        assert_eq!(AlarmState::from(PanelMode::Arm), AlarmState::Armed);
        assert_eq!(AlarmState::from(PanelMode::Home), AlarmState::PartiallyArmed);
        assert_eq!(AlarmState::from(PanelMode::Disarm), AlarmState::Disarmed);
    }

    #[test]
    fn panel_mode_inverts_the_mapping() {
        for state in [
            AlarmState::Disarmed,
            AlarmState::Armed,
            AlarmState::PartiallyArmed,
        ] {
            assert_eq!(AlarmState::from(state.panel_mode()), state);
        }
    }

    #[test]
    fn capability_strings() {
        assert_eq!(AlarmState::PartiallyArmed.to_string(), "partially_armed");
        assert_eq!(
            "disarmed".parse::<AlarmState>().unwrap(),
            AlarmState::Disarmed
        );
        assert!("away".parse::<AlarmState>().is_err());
    }
}
