//! Room — one conditioned space: its occupancy sensors, temperature sensors,
//! and vents.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ZoneHubError};
use crate::id::{RoomId, SensorId, VentId};
use crate::time::Duration;

/// How an occupancy sensor reports presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancySensorKind {
    /// A live boolean: state `on` means present.
    #[default]
    Binary,
    /// Presence is carried by a `previous_valid_state` attribute instead of
    /// the live state; a missing attribute means absent.
    Derived,
}

/// One occupancy sensor feeding a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySensor {
    pub id: SensorId,
    #[serde(default)]
    pub kind: OccupancySensorKind,
}

impl OccupancySensor {
    #[must_use]
    pub fn binary(id: impl Into<SensorId>) -> Self {
        Self {
            id: id.into(),
            kind: OccupancySensorKind::Binary,
        }
    }

    #[must_use]
    pub fn derived(id: impl Into<SensorId>) -> Self {
        Self {
            id: id.into(),
            kind: OccupancySensorKind::Derived,
        }
    }
}

/// A vent (cover) or vent group serving a room.
///
/// A group entity is commanded as a single unit but counts as `members`
/// vents for the minimum-vents-open floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vent {
    pub id: VentId,
    /// Number of physical vents this entity represents.
    #[serde(default = "default_members")]
    pub members: u32,
}

fn default_members() -> u32 {
    1
}

impl Vent {
    #[must_use]
    pub fn single(id: impl Into<VentId>) -> Self {
        Self {
            id: id.into(),
            members: 1,
        }
    }

    #[must_use]
    pub fn group(id: impl Into<VentId>, members: u32) -> Self {
        Self {
            id: id.into(),
            members,
        }
    }
}

/// Static per-room configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub occupancy_sensors: Vec<OccupancySensor>,
    #[serde(default)]
    pub temperature_sensors: Vec<SensorId>,
    #[serde(default)]
    pub vents: Vec<Vent>,
    /// Whether eco SELECT tracking includes this room.
    #[serde(default)]
    pub tracked_for_eco: bool,
    /// Whether selected-room tracking includes this room.
    #[serde(default)]
    pub tracked_for_tsr: bool,
    /// Include this room whenever it is critical, overriding every filter.
    #[serde(default)]
    pub force_track_when_critical: bool,
    /// Per-room override of the vent open delay, in seconds.
    #[serde(default)]
    pub vent_open_delay_seconds: Option<u32>,
}

impl Room {
    /// Create a builder for constructing a [`Room`].
    #[must_use]
    pub fn builder(id: impl Into<RoomId>) -> RoomBuilder {
        RoomBuilder::new(id)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::Validation`] when the id is empty or a vent
    /// group declares zero members.
    pub fn validate(&self) -> Result<(), ZoneHubError> {
        if self.id.as_str().is_empty() {
            return Err(ValidationError::EmptyId.into());
        }
        for vent in &self.vents {
            if vent.members == 0 {
                return Err(ValidationError::EmptyVentGroup(vent.id.to_string()).into());
            }
        }
        Ok(())
    }

    /// Total vents in this room, counting group members.
    #[must_use]
    pub fn vent_count(&self) -> u32 {
        self.vents.iter().map(|v| v.members).sum()
    }

    /// The room's vent open delay, if it overrides the entry default.
    #[must_use]
    pub fn vent_open_delay(&self) -> Option<Duration> {
        self.vent_open_delay_seconds
            .map(|s| Duration::seconds(i64::from(s)))
    }
}

/// Step-by-step builder for [`Room`].
#[derive(Debug)]
pub struct RoomBuilder {
    room: Room,
}

impl RoomBuilder {
    fn new(id: impl Into<RoomId>) -> Self {
        let id = id.into();
        let name = id.to_string();
        Self {
            room: Room {
                id,
                name,
                occupancy_sensors: Vec::new(),
                temperature_sensors: Vec::new(),
                vents: Vec::new(),
                tracked_for_eco: false,
                tracked_for_tsr: false,
                force_track_when_critical: false,
                vent_open_delay_seconds: None,
            },
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.room.name = name.into();
        self
    }

    #[must_use]
    pub fn occupancy_sensor(mut self, sensor: OccupancySensor) -> Self {
        self.room.occupancy_sensors.push(sensor);
        self
    }

    #[must_use]
    pub fn temperature_sensor(mut self, id: impl Into<SensorId>) -> Self {
        self.room.temperature_sensors.push(id.into());
        self
    }

    #[must_use]
    pub fn vent(mut self, vent: Vent) -> Self {
        self.room.vents.push(vent);
        self
    }

    #[must_use]
    pub fn tracked_for_eco(mut self, tracked: bool) -> Self {
        self.room.tracked_for_eco = tracked;
        self
    }

    #[must_use]
    pub fn tracked_for_tsr(mut self, tracked: bool) -> Self {
        self.room.tracked_for_tsr = tracked;
        self
    }

    #[must_use]
    pub fn force_track_when_critical(mut self, force: bool) -> Self {
        self.room.force_track_when_critical = force;
        self
    }

    #[must_use]
    pub fn vent_open_delay_seconds(mut self, seconds: u32) -> Self {
        self.room.vent_open_delay_seconds = Some(seconds);
        self
    }

    /// Consume the builder, validate, and return a [`Room`].
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::Validation`] if invariants fail.
    pub fn build(self) -> Result<Room, ZoneHubError> {
        self.room.validate()?;
        Ok(self.room)
    }
}
