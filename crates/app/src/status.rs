//! Read-only status projections — pure views of coordinator state for
//! sensors, dashboards, and the HTTP surface.

use serde::Serialize;

use zonehub_domain::contact::PausePhase;
use zonehub_domain::evaluation::{Classification, RoomEvaluation};
use zonehub_domain::id::{EntryId, RoomId, SensorId, VentId};
use zonehub_domain::mode::HvacMode;
use zonehub_domain::time::Timestamp;

/// Pause-machine projection.
#[derive(Debug, Clone, Serialize)]
pub struct PauseStatus {
    pub phase: PausePhase,
    pub paused: bool,
    pub previous_hvac_mode: Option<HvacMode>,
    pub triggered_by: Option<SensorId>,
    pub open_count: u32,
    pub open_doors: u32,
    pub open_windows: u32,
}

/// Per-room projection.
#[derive(Debug, Clone, Serialize)]
pub struct RoomStatus {
    pub room_id: RoomId,
    pub name: String,
    pub occupied: bool,
    pub active: bool,
    pub in_grace_period: bool,
    pub occupancy_minutes: Option<i64>,
    pub classification: Classification,
    pub included: bool,
    pub is_satiated: bool,
    pub is_critical: bool,
    pub determining_temperature: Option<f64>,
}

impl RoomStatus {
    /// Merge the static room config, live occupancy, and the cycle's
    /// evaluation record.
    #[must_use]
    pub fn from_parts(
        name: String,
        occupied: bool,
        active: bool,
        in_grace_period: bool,
        occupancy_minutes: Option<i64>,
        evaluation: &RoomEvaluation,
    ) -> Self {
        Self {
            room_id: evaluation.room_id.clone(),
            name,
            occupied,
            active,
            in_grace_period,
            occupancy_minutes,
            classification: evaluation.classification,
            included: evaluation.included(),
            is_satiated: evaluation.is_satiated,
            is_critical: evaluation.is_critical,
            determining_temperature: evaluation.determining_temperature,
        }
    }
}

/// Per-vent projection.
#[derive(Debug, Clone, Serialize)]
pub struct VentStatus {
    pub vent_id: VentId,
    pub room_id: RoomId,
    pub members: u32,
    pub commanded_open: bool,
    pub confirmed: bool,
    pub degraded: bool,
}

/// Full status surface for one configuration entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryStatus {
    pub entry_id: EntryId,
    pub name: String,
    pub generated_at: Timestamp,
    pub pause: PauseStatus,
    pub hvac_mode: Option<HvacMode>,
    /// Mode inferred from temperatures while the thermostat is off.
    pub inferred_hvac_mode: Option<HvacMode>,
    /// Human-readable summary of the last decision.
    pub control_status: String,
    pub rooms: Vec<RoomStatus>,
    pub vents: Vec<VentStatus>,
    pub open_vents: u32,
    pub min_vents_open: u32,
}
