//! Per-room occupancy state record.
//!
//! The tracking logic lives in the `app` crate; this record is the shared,
//! persistable shape.

use serde::{Deserialize, Serialize};

use crate::time::{Duration, Timestamp};

/// Occupancy state for one room.
///
/// Invariant: while `active` and occupied, `occupied_since` is set and the
/// room has been occupied for at least the minimum occupancy time. During a
/// grace period `active` may hold while `occupied` is false, until
/// `grace_deadline`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomOccupancyState {
    pub occupied: bool,
    pub active: bool,
    pub occupied_since: Option<Timestamp>,
    pub active_since: Option<Timestamp>,
    pub grace_deadline: Option<Timestamp>,
}

impl RoomOccupancyState {
    /// How long the room has been continuously occupied, `None` when
    /// unoccupied.
    #[must_use]
    pub fn occupancy_duration(&self, now: Timestamp) -> Option<Duration> {
        if !self.occupied {
            return None;
        }
        self.occupied_since.map(|since| now - since)
    }

    /// Whether the room is unoccupied but still active pending the grace
    /// deadline.
    #[must_use]
    pub fn in_grace_period(&self) -> bool {
        !self.occupied && self.active && self.grace_deadline.is_some()
    }
}
