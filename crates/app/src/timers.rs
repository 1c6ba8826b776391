//! Timer arena — every delayed action in the control loop as one cancelable
//! deadline, keyed by purpose and owning entity.
//!
//! Keeping timers as plain data (instead of scattered runtime handles) means
//! cancellation is always an idempotent map removal, re-arming replaces
//! atomically, rooms can be removed without leaking timers, and tests drive
//! time explicitly. The driver only needs [`TimerArena::next_deadline`] to
//! know when to wake up, and [`TimerArena::due`] to collect what fired.

use std::collections::HashMap;

use zonehub_domain::id::{RoomId, SensorId};
use zonehub_domain::time::Timestamp;

/// Identity of one scheduled action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// A contact sensor's open timeout is running.
    ContactOpen(SensorId),
    /// The all-closed resume timeout is running.
    ContactClose,
    /// A room is occupied and waiting to become active.
    OccupancyMinimum(RoomId),
    /// An active room is unoccupied and waiting to deactivate.
    OccupancyGrace(RoomId),
    /// A room became desired-open and its vents are waiting to open.
    VentOpenDelay(RoomId),
    /// A blocked transition (cycle protection, debounce, failed command)
    /// wants another evaluation pass.
    Reevaluate,
}

/// Arena of pending deadlines.
#[derive(Debug, Default)]
pub struct TimerArena {
    deadlines: HashMap<TimerKey, Timestamp>,
}

impl TimerArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to fire at `deadline`, replacing any existing deadline
    /// for the same key.
    pub fn arm(&mut self, key: TimerKey, deadline: Timestamp) {
        self.deadlines.insert(key, deadline);
    }

    /// Schedule `key` at `deadline`, keeping an earlier existing deadline.
    pub fn arm_earliest(&mut self, key: TimerKey, deadline: Timestamp) {
        self.deadlines
            .entry(key)
            .and_modify(|existing| {
                if deadline < *existing {
                    *existing = deadline;
                }
            })
            .or_insert(deadline);
    }

    /// Cancel `key`. Safe to call for a timer that already fired or was
    /// never armed.
    pub fn cancel(&mut self, key: &TimerKey) {
        self.deadlines.remove(key);
    }

    /// Cancel every timer owned by `room`. Used when rooms are removed by
    /// reconfiguration.
    pub fn cancel_room(&mut self, room: &RoomId) {
        self.deadlines.retain(|key, _| match key {
            TimerKey::OccupancyMinimum(r)
            | TimerKey::OccupancyGrace(r)
            | TimerKey::VentOpenDelay(r) => r != room,
            _ => true,
        });
    }

    #[must_use]
    pub fn is_armed(&self, key: &TimerKey) -> bool {
        self.deadlines.contains_key(key)
    }

    #[must_use]
    pub fn deadline(&self, key: &TimerKey) -> Option<Timestamp> {
        self.deadlines.get(key).copied()
    }

    /// The earliest pending deadline, for the wakeup driver.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every key whose deadline has passed, earliest
    /// first (ties broken deterministically by key order of insertion into
    /// the result sort).
    pub fn due(&mut self, now: Timestamp) -> Vec<TimerKey> {
        let mut fired: Vec<(Timestamp, TimerKey)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, deadline)| (*deadline, key.clone()))
            .collect();
        fired.sort_by_key(|(deadline, _)| *deadline);
        for (_, key) in &fired {
            self.deadlines.remove(key);
        }
        fired.into_iter().map(|(_, key)| key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonehub_domain::time::{Duration, now};

    #[test]
    fn should_fire_due_timers_in_deadline_order() {
        let mut arena = TimerArena::new();
        let base = now();
        arena.arm(TimerKey::ContactClose, base + Duration::minutes(2));
        arena.arm(
            TimerKey::OccupancyGrace(RoomId::from("bedroom")),
            base + Duration::minutes(1),
        );
        arena.arm(TimerKey::Reevaluate, base + Duration::minutes(10));

        let fired = arena.due(base + Duration::minutes(5));
        assert_eq!(
            fired,
            vec![
                TimerKey::OccupancyGrace(RoomId::from("bedroom")),
                TimerKey::ContactClose,
            ]
        );
        assert!(arena.is_armed(&TimerKey::Reevaluate));
    }

    #[test]
    fn should_treat_cancel_as_idempotent() {
        let mut arena = TimerArena::new();
        let key = TimerKey::ContactOpen(SensorId::from("binary_sensor.door"));
        arena.cancel(&key);
        arena.arm(key.clone(), now());
        arena.cancel(&key);
        arena.cancel(&key);
        assert!(!arena.is_armed(&key));
    }

    #[test]
    fn should_replace_deadline_when_rearmed() {
        let mut arena = TimerArena::new();
        let base = now();
        let key = TimerKey::OccupancyMinimum(RoomId::from("office"));
        arena.arm(key.clone(), base + Duration::minutes(5));
        arena.arm(key.clone(), base + Duration::minutes(1));
        assert_eq!(arena.deadline(&key), Some(base + Duration::minutes(1)));
    }

    #[test]
    fn should_keep_earliest_deadline_with_arm_earliest() {
        let mut arena = TimerArena::new();
        let base = now();
        arena.arm_earliest(TimerKey::Reevaluate, base + Duration::minutes(1));
        arena.arm_earliest(TimerKey::Reevaluate, base + Duration::minutes(5));
        assert_eq!(
            arena.deadline(&TimerKey::Reevaluate),
            Some(base + Duration::minutes(1))
        );
        arena.arm_earliest(TimerKey::Reevaluate, base + Duration::seconds(10));
        assert_eq!(
            arena.deadline(&TimerKey::Reevaluate),
            Some(base + Duration::seconds(10))
        );
    }

    #[test]
    fn should_report_next_deadline() {
        let mut arena = TimerArena::new();
        assert_eq!(arena.next_deadline(), None);
        let base = now();
        arena.arm(TimerKey::ContactClose, base + Duration::minutes(3));
        arena.arm(TimerKey::Reevaluate, base + Duration::minutes(1));
        assert_eq!(arena.next_deadline(), Some(base + Duration::minutes(1)));
    }

    #[test]
    fn should_cancel_all_room_timers() {
        let mut arena = TimerArena::new();
        let base = now();
        let room = RoomId::from("bedroom");
        arena.arm(TimerKey::OccupancyMinimum(room.clone()), base);
        arena.arm(TimerKey::OccupancyGrace(room.clone()), base);
        arena.arm(TimerKey::VentOpenDelay(room.clone()), base);
        arena.arm(TimerKey::ContactClose, base);

        arena.cancel_room(&room);
        assert!(!arena.is_armed(&TimerKey::OccupancyMinimum(room.clone())));
        assert!(!arena.is_armed(&TimerKey::OccupancyGrace(room.clone())));
        assert!(!arena.is_armed(&TimerKey::VentOpenDelay(room)));
        assert!(arena.is_armed(&TimerKey::ContactClose));
    }
}
