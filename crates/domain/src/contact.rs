//! Contact sensors and the pause state they drive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::SensorId;
use crate::mode::HvacMode;
use crate::time::Timestamp;

/// Kind of opening a contact sensor watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Door,
    Window,
}

impl ContactKind {
    /// Infer the kind from a host entity id. Anything that does not mention
    /// a window counts as a door, matching how open-door/open-window counts
    /// were historically derived from entity naming.
    #[must_use]
    pub fn infer(entity_id: &str) -> Self {
        if entity_id.to_lowercase().contains("window") {
            Self::Window
        } else {
            Self::Door
        }
    }
}

/// Live view of one monitored contact sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSensor {
    pub id: SensorId,
    pub kind: ContactKind,
    pub is_open: bool,
}

impl ContactSensor {
    /// Create a closed sensor of the given kind.
    #[must_use]
    pub fn new(id: impl Into<SensorId>, kind: ContactKind) -> Self {
        Self {
            id: id.into(),
            kind,
            is_open: false,
        }
    }

    /// Create a closed sensor, inferring the kind from the entity id.
    #[must_use]
    pub fn inferred(id: impl Into<SensorId>) -> Self {
        let id = id.into();
        let kind = ContactKind::infer(id.as_str());
        Self {
            id,
            kind,
            is_open: false,
        }
    }
}

/// Phase of the contact-sensor pause/resume state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PausePhase {
    #[default]
    Running,
    PendingPause,
    Paused,
    PendingResume,
}

impl PausePhase {
    /// Whether the thermostat is currently forced off by the pause machine.
    #[must_use]
    pub fn is_paused(self) -> bool {
        self == Self::Paused
    }
}

impl std::fmt::Display for PausePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::PendingPause => f.write_str("pending_pause"),
            Self::Paused => f.write_str("paused"),
            Self::PendingResume => f.write_str("pending_resume"),
        }
    }
}

/// Serializable snapshot of the pause state machine, persisted across
/// restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PauseState {
    pub phase: PausePhase,
    pub previous_hvac_mode: Option<HvacMode>,
    pub triggered_by: Option<SensorId>,
    /// When each currently-open sensor opened.
    #[serde(default)]
    pub open_since: BTreeMap<SensorId, Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_infer_window_kind_from_entity_id() {
        assert_eq!(
            ContactKind::infer("binary_sensor.kitchen_window"),
            ContactKind::Window
        );
        assert_eq!(
            ContactKind::infer("binary_sensor.front_door"),
            ContactKind::Door
        );
        assert_eq!(
            ContactKind::infer("binary_sensor.hallway_contact"),
            ContactKind::Door
        );
    }

    #[test]
    fn should_create_closed_sensor() {
        let sensor = ContactSensor::inferred("binary_sensor.bay_window");
        assert_eq!(sensor.kind, ContactKind::Window);
        assert!(!sensor.is_open);
    }

    #[test]
    fn should_default_phase_to_running() {
        assert_eq!(PausePhase::default(), PausePhase::Running);
        assert!(!PausePhase::Running.is_paused());
        assert!(PausePhase::Paused.is_paused());
    }

    #[test]
    fn should_roundtrip_pause_state_through_serde_json() {
        let mut state = PauseState {
            phase: PausePhase::Paused,
            previous_hvac_mode: Some(HvacMode::Heat),
            triggered_by: Some(SensorId::from("binary_sensor.front_door")),
            open_since: BTreeMap::new(),
        };
        state
            .open_since
            .insert(SensorId::from("binary_sensor.front_door"), crate::time::now());

        let json = serde_json::to_string(&state).unwrap();
        let parsed: PauseState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
