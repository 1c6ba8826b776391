//! Room occupancy tracker — occupied → active with minimum-duration and
//! grace-period timing.
//!
//! A room is occupied while ANY of its occupancy sensors reports presence.
//! Continuous occupancy for the minimum time makes the room active; when an
//! active room empties, a grace period keeps it active a little longer so a
//! brief absence does not drop the room out of climate control.

use std::collections::BTreeSet;

use tracing::debug;

use zonehub_domain::id::{RoomId, SensorId};
use zonehub_domain::occupancy::RoomOccupancyState;
use zonehub_domain::room::{OccupancySensor, OccupancySensorKind};
use zonehub_domain::snapshot::StateSnapshot;
use zonehub_domain::time::{Duration, Timestamp};

use crate::timers::{TimerArena, TimerKey};

/// Whether a sensor snapshot indicates presence.
///
/// Binary sensors use their live state. Derived sensors carry presence in a
/// `previous_valid_state` attribute; a missing attribute means absent, never
/// an error.
#[must_use]
pub fn sensor_present(kind: OccupancySensorKind, snapshot: &StateSnapshot) -> bool {
    if snapshot.is_unavailable() {
        return false;
    }
    match kind {
        OccupancySensorKind::Binary => snapshot.is_on(),
        OccupancySensorKind::Derived => snapshot
            .attribute("previous_valid_state")
            .and_then(|v| v.as_str())
            == Some("on"),
    }
}

/// Occupancy tracking for one room.
#[derive(Debug)]
pub struct RoomOccupancy {
    room_id: RoomId,
    sensors: Vec<OccupancySensor>,
    present: BTreeSet<SensorId>,
    state: RoomOccupancyState,
    min_occupancy: Duration,
    grace_period: Duration,
}

impl RoomOccupancy {
    #[must_use]
    pub fn new(
        room_id: RoomId,
        sensors: Vec<OccupancySensor>,
        min_occupancy: Duration,
        grace_period: Duration,
    ) -> Self {
        Self {
            room_id,
            sensors,
            present: BTreeSet::new(),
            state: RoomOccupancyState::default(),
            min_occupancy,
            grace_period,
        }
    }

    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    #[must_use]
    pub fn state(&self) -> &RoomOccupancyState {
        &self.state
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.state.occupied
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Whether `sensor` feeds this room.
    #[must_use]
    pub fn watches(&self, sensor: &SensorId) -> bool {
        self.sensors.iter().any(|s| &s.id == sensor)
    }

    /// Apply a sensor snapshot. Returns `true` when the room's occupancy
    /// changed.
    pub fn sensor_changed(
        &mut self,
        id: &SensorId,
        snapshot: &StateSnapshot,
        now: Timestamp,
        timers: &mut TimerArena,
    ) -> bool {
        let Some(sensor) = self.sensors.iter().find(|s| &s.id == id) else {
            return false;
        };
        let present = sensor_present(sensor.kind, snapshot);
        if present {
            self.present.insert(id.clone());
        } else {
            self.present.remove(id);
        }

        let was_occupied = self.state.occupied;
        let occupied = !self.present.is_empty();
        self.state.occupied = occupied;

        if occupied && !was_occupied {
            self.became_occupied(now, timers);
            true
        } else if !occupied && was_occupied {
            self.became_unoccupied(now, timers);
            true
        } else {
            false
        }
    }

    fn became_occupied(&mut self, now: Timestamp, timers: &mut TimerArena) {
        if self.state.active && self.state.grace_deadline.is_some() {
            // back during the grace period: stay active, and back-date the
            // start so active ⇒ occupied-long-enough still holds
            timers.cancel(&TimerKey::OccupancyGrace(self.room_id.clone()));
            self.state.grace_deadline = None;
            self.state.occupied_since = Some(now - self.min_occupancy);
            debug!(room = %self.room_id, "reoccupied during grace period, staying active");
        } else if let Some(since) = self.state.occupied_since {
            // a restored start time from persistence keeps counting
            if !self.state.active {
                timers.arm(
                    TimerKey::OccupancyMinimum(self.room_id.clone()),
                    since + self.min_occupancy,
                );
            }
            debug!(room = %self.room_id, since = %since, "occupied with restored start time");
        } else {
            self.state.occupied_since = Some(now);
            if !self.state.active {
                timers.arm(
                    TimerKey::OccupancyMinimum(self.room_id.clone()),
                    now + self.min_occupancy,
                );
            }
            debug!(room = %self.room_id, "became occupied");
        }
    }

    fn became_unoccupied(&mut self, now: Timestamp, timers: &mut TimerArena) {
        self.state.occupied_since = None;
        timers.cancel(&TimerKey::OccupancyMinimum(self.room_id.clone()));
        if self.state.active {
            let deadline = now + self.grace_period;
            self.state.grace_deadline = Some(deadline);
            timers.arm(TimerKey::OccupancyGrace(self.room_id.clone()), deadline);
            debug!(room = %self.room_id, "became unoccupied while active, grace period started");
        } else {
            debug!(room = %self.room_id, "became unoccupied");
        }
    }

    /// The minimum-occupancy timer fired. Returns `true` when the room
    /// became active; stale firings are no-ops.
    pub fn handle_minimum_timer(&mut self, now: Timestamp) -> bool {
        if self.state.occupied
            && !self.state.active
            && let Some(since) = self.state.occupied_since
            && now - since >= self.min_occupancy
        {
            self.state.active = true;
            self.state.active_since = Some(now);
            debug!(room = %self.room_id, "became active");
            true
        } else {
            false
        }
    }

    /// The grace timer fired. Returns `true` when the room deactivated;
    /// stale firings (room reoccupied) are no-ops.
    pub fn handle_grace_timer(&mut self, now: Timestamp) -> bool {
        if !self.state.occupied
            && self.state.active
            && let Some(deadline) = self.state.grace_deadline
            && now >= deadline
        {
            self.state.active = false;
            self.state.active_since = None;
            self.state.occupied_since = None;
            self.state.grace_deadline = None;
            debug!(room = %self.room_id, "grace period expired, deactivated");
            true
        } else {
            false
        }
    }

    /// Adopt persisted state. Call before the initial sensor scan and
    /// finish with [`after_scan`](Self::after_scan).
    pub fn restore(&mut self, persisted: RoomOccupancyState) {
        self.state.active = persisted.active;
        self.state.active_since = persisted.active_since;
        self.state.occupied_since = persisted.occupied_since;
        self.state.grace_deadline = persisted.grace_deadline;
    }

    /// Reconcile restored state with the scanned sensor picture and re-arm
    /// the timers a restart lost.
    pub fn after_scan(&mut self, now: Timestamp, timers: &mut TimerArena) {
        if self.state.occupied {
            if self.state.grace_deadline.take().is_some() {
                timers.cancel(&TimerKey::OccupancyGrace(self.room_id.clone()));
            }
        } else {
            self.state.occupied_since = None;
            timers.cancel(&TimerKey::OccupancyMinimum(self.room_id.clone()));
            if self.state.active {
                // the room was active before the restart and is empty now:
                // give it a fresh grace period rather than dropping it cold
                let deadline = self
                    .state
                    .grace_deadline
                    .unwrap_or_else(|| now + self.grace_period);
                self.state.grace_deadline = Some(deadline);
                timers.arm(TimerKey::OccupancyGrace(self.room_id.clone()), deadline);
            }
        }
    }
}
