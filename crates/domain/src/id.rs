//! Typed identifier newtypes backed by host entity-id strings.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an identifier string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Access the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Identifier for a configuration entry (one thermostat and its rooms).
    EntryId
);

define_id!(
    /// Identifier for a [`Room`](crate::room::Room).
    RoomId
);

define_id!(
    /// Host entity identifier for a sensor (contact, occupancy, temperature)
    /// or the thermostat itself.
    SensorId
);

define_id!(
    /// Host entity identifier for a vent (cover) or vent group.
    VentId
);

define_id!(
    /// Host entity identifier of unknown kind, as carried by state-change
    /// events before the coordinator routes them.
    EntityId
);

/// Unique identifier for a [`StateChange`](crate::snapshot::StateChange)
/// event, backed by a random UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(uuid::Uuid);

impl Default for EventId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl EventId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(self) -> uuid::Uuid {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_expose_inner_string() {
        let id = SensorId::new("binary_sensor.front_door");
        assert_eq!(id.as_str(), "binary_sensor.front_door");
    }

    #[test]
    fn should_display_as_inner_string() {
        let id = RoomId::from("bedroom");
        assert_eq!(id.to_string(), "bedroom");
    }

    #[test]
    fn should_compare_equal_for_same_identifier() {
        assert_eq!(VentId::from("cover.vent_a"), VentId::new("cover.vent_a"));
        assert_ne!(VentId::from("cover.vent_a"), VentId::from("cover.vent_b"));
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let id = EntryId::new("entry-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"entry-1\"");
        let parsed: EntryId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_order_lexicographically() {
        let a = RoomId::from("attic");
        let b = RoomId::from("bedroom");
        assert!(a < b);
    }

    #[test]
    fn should_generate_unique_event_ids() {
        assert_ne!(EventId::new(), EventId::new());
    }
}
