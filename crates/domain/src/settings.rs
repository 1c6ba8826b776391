//! Entry-level control settings: timeouts, deadbands, thresholds, and the
//! vent safety floor.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::mode::HvacMode;
use crate::time::Duration;

/// Grace periods shorter than this are clamped up; a room that just emptied
/// must keep its vents and activity for at least a couple of minutes.
const MIN_GRACE_PERIOD_MINUTES: u32 = 2;

/// Heating and cooling target temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Setpoints {
    /// Heating setpoint (`target_temp_low`).
    pub heat: f64,
    /// Cooling setpoint (`target_temp_high`).
    pub cool: f64,
}

impl Setpoints {
    #[must_use]
    pub fn new(heat: f64, cool: f64) -> Self {
        Self { heat, cool }
    }

    /// The single target relevant to `mode`; the band midpoint for
    /// heat/cool.
    #[must_use]
    pub fn target_for(self, mode: HvacMode) -> f64 {
        match mode {
            HvacMode::Heat => self.heat,
            HvacMode::Cool => self.cool,
            HvacMode::HeatCool | HvacMode::Off => f64::midpoint(self.heat, self.cool),
        }
    }
}

/// Tunable control parameters for one configuration entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Minutes a contact sensor may stay open before the thermostat pauses.
    pub open_timeout_minutes: u32,
    /// Minutes all sensors must stay closed before the thermostat resumes.
    pub close_timeout_minutes: u32,
    /// Minutes of continuous occupancy before a room becomes active.
    pub min_occupancy_minutes: u32,
    /// Minutes an active room stays active after becoming unoccupied.
    pub grace_period_minutes: u32,
    /// Degrees of hysteresis around targets when judging satiation.
    pub temperature_deadband: f64,
    /// Minimum minutes the thermostat must stay on once started.
    pub min_cycle_on_minutes: u32,
    /// Minimum minutes the thermostat must stay off once stopped.
    pub min_cycle_off_minutes: u32,
    /// Degrees below the heat target that makes an unoccupied room critical.
    pub unoccupied_heating_threshold: f64,
    /// Degrees above the cool target that makes an unoccupied room critical.
    pub unoccupied_cooling_threshold: f64,
    /// Minimum number of vents (counting group members) that must stay open.
    pub min_vents_open: u32,
    /// Default seconds between a room becoming desired-open and its vents
    /// opening; rooms may override.
    pub vent_open_delay_seconds: u32,
    /// Minimum seconds between commands to the same vent.
    pub vent_debounce_seconds: u32,
    /// Targets substituted for satiation checks when away with
    /// `use_eco_away_targets`.
    pub away_targets: Option<Setpoints>,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            open_timeout_minutes: 5,
            close_timeout_minutes: 5,
            min_occupancy_minutes: 5,
            grace_period_minutes: 5,
            temperature_deadband: 0.5,
            min_cycle_on_minutes: 5,
            min_cycle_off_minutes: 5,
            unoccupied_heating_threshold: 3.0,
            unoccupied_cooling_threshold: 3.0,
            min_vents_open: 3,
            vent_open_delay_seconds: 30,
            vent_debounce_seconds: 30,
            away_targets: None,
        }
    }
}

impl ControlSettings {
    /// Check value-range invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the deadband or a critical
    /// threshold is negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.temperature_deadband < 0.0 {
            return Err(ValidationError::NegativeDeadband);
        }
        if self.unoccupied_heating_threshold < 0.0 || self.unoccupied_cooling_threshold < 0.0 {
            return Err(ValidationError::NegativeCriticalThreshold);
        }
        Ok(())
    }

    #[must_use]
    pub fn open_timeout(&self) -> Duration {
        Duration::minutes(i64::from(self.open_timeout_minutes))
    }

    #[must_use]
    pub fn close_timeout(&self) -> Duration {
        Duration::minutes(i64::from(self.close_timeout_minutes))
    }

    #[must_use]
    pub fn min_occupancy(&self) -> Duration {
        Duration::minutes(i64::from(self.min_occupancy_minutes))
    }

    /// Grace period, clamped to the minimum.
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::minutes(i64::from(
            self.grace_period_minutes.max(MIN_GRACE_PERIOD_MINUTES),
        ))
    }

    #[must_use]
    pub fn min_cycle_on(&self) -> Duration {
        Duration::minutes(i64::from(self.min_cycle_on_minutes))
    }

    #[must_use]
    pub fn min_cycle_off(&self) -> Duration {
        Duration::minutes(i64::from(self.min_cycle_off_minutes))
    }

    #[must_use]
    pub fn vent_open_delay(&self) -> Duration {
        Duration::seconds(i64::from(self.vent_open_delay_seconds))
    }

    #[must_use]
    pub fn vent_debounce(&self) -> Duration {
        Duration::seconds(i64::from(self.vent_debounce_seconds))
    }
}
