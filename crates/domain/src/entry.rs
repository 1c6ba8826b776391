//! Entry configuration — one thermostat, its contact sensors, rooms, and
//! policies.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::contact::ContactSensor;
use crate::error::{ValidationError, ZoneHubError};
use crate::id::{EntryId, SensorId};
use crate::policy::{EcoPolicy, TsrPolicy};
use crate::room::Room;
use crate::settings::ControlSettings;

/// Full configuration for one control loop instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryConfig {
    pub id: EntryId,
    pub name: String,
    /// The climate entity this entry controls.
    pub thermostat: SensorId,
    /// Optional binary sensor that is `on` while the household is away.
    #[serde(default)]
    pub away_sensor: Option<SensorId>,
    #[serde(default)]
    pub contact_sensors: Vec<ContactSensor>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub settings: ControlSettings,
    #[serde(default)]
    pub eco: EcoPolicy,
    #[serde(default)]
    pub tsr: TsrPolicy,
    /// When set, a resume never overrides a thermostat the user turned off.
    #[serde(default)]
    pub respect_user_off: bool,
}

impl EntryConfig {
    /// Check configuration invariants. Invalid configuration is rejected
    /// here, at setup time, never at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::Validation`] when ids are empty or duplicated,
    /// settings are out of range, or the minimum-vents-open floor can never
    /// be met.
    pub fn validate(&self) -> Result<(), ZoneHubError> {
        if self.id.as_str().is_empty() || self.thermostat.as_str().is_empty() {
            return Err(ValidationError::EmptyId.into());
        }
        self.settings.validate()?;

        let mut seen = BTreeSet::new();
        for room in &self.rooms {
            room.validate()?;
            if !seen.insert(&room.id) {
                return Err(ValidationError::DuplicateRoomId(room.id.to_string()).into());
            }
        }

        let available = self.total_vents();
        if self.settings.min_vents_open > 0 && available == 0 {
            return Err(ValidationError::MinVentsUnsatisfiable {
                required: self.settings.min_vents_open,
                available,
            }
            .into());
        }
        Ok(())
    }

    /// Total vents across all rooms, counting group members.
    #[must_use]
    pub fn total_vents(&self) -> u32 {
        self.rooms.iter().map(Room::vent_count).sum()
    }
}
