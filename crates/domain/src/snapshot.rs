//! Host-facing entity state snapshots and change events.
//!
//! A [`StateSnapshot`] mirrors what the host platform reports for one entity:
//! a primary state string plus free-form attributes. `unknown` and
//! `unavailable` states are normalised to an absent state so callers never
//! mistake them for real readings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{EntityId, EventId};
use crate::mode::HvacMode;

/// State strings the host uses for entities it cannot currently read.
const UNAVAILABLE_STATES: [&str; 2] = ["unknown", "unavailable"];

/// A point-in-time view of one host entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Primary state string, `None` when unknown/unavailable.
    pub state: Option<String>,
    /// Free-form entity attributes.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attributes: serde_json::Map<String, Value>,
}

impl StateSnapshot {
    /// Create a snapshot with the given state, normalising
    /// unknown/unavailable markers to `None`.
    #[must_use]
    pub fn new(state: impl Into<String>) -> Self {
        let state = state.into();
        let state = if UNAVAILABLE_STATES.contains(&state.as_str()) {
            None
        } else {
            Some(state)
        };
        Self {
            state,
            attributes: serde_json::Map::new(),
        }
    }

    /// Builder-style attribute insertion.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether the host could not read this entity.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.state.is_none()
    }

    /// Whether the primary state is the literal `on`.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state.as_deref() == Some("on")
    }

    /// Parse the primary state as a temperature or other numeric reading.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.state.as_deref().and_then(|s| s.parse().ok())
    }

    /// Parse the primary state as an HVAC mode.
    #[must_use]
    pub fn hvac_mode(&self) -> Option<HvacMode> {
        self.state.as_deref().and_then(HvacMode::parse)
    }

    /// Look up an attribute by key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Parse an attribute as a float (accepts numbers and numeric strings).
    #[must_use]
    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// A state-change event delivered by the host platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    #[serde(default)]
    pub id: EventId,
    /// The entity that changed.
    pub entity_id: EntityId,
    /// State before the change, when the host knows it.
    pub old: Option<StateSnapshot>,
    /// State after the change.
    pub new: StateSnapshot,
}

impl StateChange {
    /// Create a change event without a prior state.
    #[must_use]
    pub fn new(entity_id: impl Into<EntityId>, new: StateSnapshot) -> Self {
        Self {
            id: EventId::new(),
            entity_id: entity_id.into(),
            old: None,
            new,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_normalise_unknown_state_to_none() {
        assert!(StateSnapshot::new("unknown").is_unavailable());
        assert!(StateSnapshot::new("unavailable").is_unavailable());
        assert!(!StateSnapshot::new("on").is_unavailable());
    }

    #[test]
    fn should_report_on_only_for_on_state() {
        assert!(StateSnapshot::new("on").is_on());
        assert!(!StateSnapshot::new("off").is_on());
        assert!(!StateSnapshot::new("unavailable").is_on());
    }

    #[test]
    fn should_parse_numeric_state() {
        assert_eq!(StateSnapshot::new("19.5").as_f64(), Some(19.5));
        assert_eq!(StateSnapshot::new("warm").as_f64(), None);
        assert_eq!(StateSnapshot::new("unknown").as_f64(), None);
    }

    #[test]
    fn should_parse_hvac_mode_state() {
        assert_eq!(StateSnapshot::new("heat").hvac_mode(), Some(HvacMode::Heat));
        assert_eq!(StateSnapshot::new("unavailable").hvac_mode(), None);
    }

    #[test]
    fn should_read_numeric_attributes_from_numbers_and_strings() {
        let snap = StateSnapshot::new("heat")
            .with_attribute("target_temp_low", 20.0)
            .with_attribute("target_temp_high", "24.5");
        assert_eq!(snap.attribute_f64("target_temp_low"), Some(20.0));
        assert_eq!(snap.attribute_f64("target_temp_high"), Some(24.5));
        assert_eq!(snap.attribute_f64("missing"), None);
    }

    #[test]
    fn should_roundtrip_change_through_serde_json() {
        let change = StateChange::new("binary_sensor.door", StateSnapshot::new("on"));
        let json = serde_json::to_string(&change).unwrap();
        let parsed: StateChange = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, change);
    }
}
