//! The per-cycle room evaluation record.
//!
//! Produced once per evaluation cycle and shared by the decision engine, the
//! vent selector, and status projections, so every consumer sees the same
//! view within a cycle.

use serde::{Deserialize, Serialize};

use crate::id::{RoomId, SensorId};

/// How a room participates in the current evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// The room's satiation drives the run/idle decision.
    ActiveEval,
    /// Only the room's criticality drives the decision.
    CriticalOnly,
    /// The room does not participate this cycle.
    Excluded,
}

impl Classification {
    /// Whether the room participates at all.
    #[must_use]
    pub fn is_included(self) -> bool {
        self != Self::Excluded
    }
}

/// Derived, per-cycle view of one room. Recomputed every cycle, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomEvaluation {
    pub room_id: RoomId,
    pub classification: Classification,
    pub is_satiated: bool,
    pub is_critical: bool,
    /// The reading the satiation/criticality judgement rests on.
    pub determining_temperature: Option<f64>,
    /// The sensor that produced it.
    pub determining_sensor: Option<SensorId>,
    /// `|determining − target|`, used for vent priority ordering.
    pub distance_from_target: Option<f64>,
    /// The name of the inclusion rule that classified the room.
    pub inclusion_rule: &'static str,
}

impl RoomEvaluation {
    /// An excluded evaluation for a room without usable readings.
    #[must_use]
    pub fn excluded(room_id: RoomId, rule: &'static str) -> Self {
        Self {
            room_id,
            classification: Classification::Excluded,
            is_satiated: false,
            is_critical: false,
            determining_temperature: None,
            determining_sensor: None,
            distance_from_target: None,
            inclusion_rule: rule,
        }
    }

    /// Whether the room participates in this cycle.
    #[must_use]
    pub fn included(&self) -> bool {
        self.classification.is_included()
    }

    /// Whether this room, as classified, asks the thermostat to run.
    #[must_use]
    pub fn calls_for_conditioning(&self) -> bool {
        match self.classification {
            Classification::ActiveEval => !self.is_satiated || self.is_critical,
            Classification::CriticalOnly => self.is_critical,
            Classification::Excluded => false,
        }
    }
}
