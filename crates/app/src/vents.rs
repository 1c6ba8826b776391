//! Vent selector — turns room states into concrete vent commands, subject
//! to per-room open delays, a debounce window, and the minimum-vents-open
//! safety floor.
//!
//! A room's vents are desired-open when the room is critical, needs
//! conditioning, or is simply occupied; that order is the tie-break
//! priority, never the inclusion test. Vent groups are commanded as one
//! unit but count as their member total everywhere vents are counted.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use zonehub_domain::id::{RoomId, VentId};
use zonehub_domain::room::Vent;
use zonehub_domain::time::{Duration, Timestamp};

use crate::timers::{TimerArena, TimerKey};

/// Why a vent is (to be) open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpenReason {
    /// The room is critically cold/hot.
    Critical,
    /// The room is active and not satiated.
    Conditioning,
    /// The room is occupied.
    Occupied,
    /// Forced open to satisfy the minimum-vents-open floor.
    MinimumFloor,
}

/// Tracked state of one vent or vent group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VentRecord {
    pub vent_id: VentId,
    pub room_id: RoomId,
    pub members: u32,
    /// Last state we commanded (or observed at startup).
    pub commanded_open: bool,
    /// When the last command was dispatched.
    pub last_change: Option<Timestamp>,
    /// Whether the host confirmed the commanded state.
    pub confirmed: bool,
    /// Unknown to the host; excluded from commands and floor accounting.
    pub degraded: bool,
}

/// Per-room facts the selector works from, for one cycle.
#[derive(Debug, Clone)]
pub struct RoomVentInput {
    pub room_id: RoomId,
    pub is_critical: bool,
    /// Active-eval and not satiated.
    pub needs_conditioning: bool,
    pub occupied: bool,
    pub distance_from_target: Option<f64>,
    pub open_delay: Duration,
}

impl RoomVentInput {
    fn desired(&self) -> Option<OpenReason> {
        if self.is_critical {
            Some(OpenReason::Critical)
        } else if self.needs_conditioning {
            Some(OpenReason::Conditioning)
        } else if self.occupied {
            Some(OpenReason::Occupied)
        } else {
            None
        }
    }
}

/// A command the coordinator should dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VentCommandPlan {
    pub vent_id: VentId,
    pub open: bool,
    pub reason: Option<OpenReason>,
    /// Forced by the safety floor; overrides debounce.
    pub forced: bool,
}

/// Vent selection for one configuration entry.
#[derive(Debug)]
pub struct VentSelector {
    vents: BTreeMap<VentId, VentRecord>,
    /// When each room first became desired-open (for the open delay).
    desired_since: BTreeMap<RoomId, Timestamp>,
    min_vents_open: u32,
    debounce: Duration,
}

impl VentSelector {
    #[must_use]
    pub fn new(min_vents_open: u32, debounce: Duration) -> Self {
        Self {
            vents: BTreeMap::new(),
            desired_since: BTreeMap::new(),
            min_vents_open,
            debounce,
        }
    }

    /// Register a configured vent.
    pub fn add_vent(&mut self, room_id: RoomId, vent: &Vent) {
        self.vents.insert(
            vent.id.clone(),
            VentRecord {
                vent_id: vent.id.clone(),
                room_id,
                members: vent.members,
                commanded_open: false,
                last_change: None,
                confirmed: false,
                degraded: false,
            },
        );
    }

    /// Seed a vent's state from the host at startup. `None` marks the vent
    /// degraded.
    pub fn seed(&mut self, vent: &VentId, open: Option<bool>) {
        if let Some(record) = self.vents.get_mut(vent) {
            match open {
                Some(open) => {
                    record.commanded_open = open;
                    record.confirmed = true;
                    record.degraded = false;
                }
                None => record.degraded = true,
            }
        }
    }

    /// The host reported a vent state change.
    pub fn host_state_changed(&mut self, vent: &VentId, open: Option<bool>) {
        if let Some(record) = self.vents.get_mut(vent) {
            match open {
                Some(open) => {
                    record.degraded = false;
                    if open == record.commanded_open {
                        record.confirmed = true;
                    }
                }
                None => record.degraded = true,
            }
        }
    }

    /// A dispatched command was accepted by the host.
    pub fn dispatched(&mut self, vent: &VentId, open: bool, now: Timestamp) {
        if let Some(record) = self.vents.get_mut(vent) {
            record.commanded_open = open;
            record.last_change = Some(now);
            record.confirmed = false;
        }
    }

    /// A dispatch failed; the commanded state stays unconfirmed and the
    /// command is retried on the next cycle.
    pub fn dispatch_failed(&mut self, vent: &VentId) {
        if let Some(record) = self.vents.get_mut(vent) {
            record.confirmed = false;
        }
    }

    /// Whether `vent` is configured here.
    #[must_use]
    pub fn knows(&self, vent: &VentId) -> bool {
        self.vents.contains_key(vent)
    }

    /// Currently-open member count (degraded vents excluded).
    #[must_use]
    pub fn open_member_count(&self) -> u32 {
        self.vents
            .values()
            .filter(|v| !v.degraded && v.commanded_open)
            .map(|v| v.members)
            .sum()
    }

    /// All tracked vent records, for status projection.
    pub fn records(&self) -> impl Iterator<Item = &VentRecord> {
        self.vents.values()
    }

    /// Compute the commands for this cycle.
    pub fn plan(
        &mut self,
        rooms: &[RoomVentInput],
        now: Timestamp,
        timers: &mut TimerArena,
    ) -> Vec<VentCommandPlan> {
        let mut eligible: BTreeMap<RoomId, OpenReason> = BTreeMap::new();

        for room in rooms {
            if let Some(reason) = room.desired() {
                let since = *self
                    .desired_since
                    .entry(room.room_id.clone())
                    .or_insert_with(|| {
                        timers.arm(
                            TimerKey::VentOpenDelay(room.room_id.clone()),
                            now + room.open_delay,
                        );
                        now
                    });
                if now - since >= room.open_delay {
                    eligible.insert(room.room_id.clone(), reason);
                }
                // not yet past the delay: the armed timer brings us back
            } else if self.desired_since.remove(&room.room_id).is_some() {
                // stopped being desired before the delay elapsed: the
                // pending open is cancelled
                timers.cancel(&TimerKey::VentOpenDelay(room.room_id.clone()));
            }
        }

        let mut target_open: BTreeMap<VentId, OpenReason> = BTreeMap::new();
        for record in self.vents.values() {
            if record.degraded {
                continue;
            }
            if let Some(reason) = eligible.get(&record.room_id) {
                target_open.insert(record.vent_id.clone(), *reason);
            }
        }

        let open_total: u32 = self
            .vents
            .values()
            .filter(|v| target_open.contains_key(&v.vent_id))
            .map(|v| v.members)
            .sum();

        if open_total < self.min_vents_open {
            self.fill_floor(rooms, &mut target_open, self.min_vents_open - open_total);
        }

        let mut commands = Vec::new();
        for record in self.vents.values() {
            if record.degraded {
                continue;
            }
            let reason = target_open.get(&record.vent_id).copied();
            let desired_open = reason.is_some();
            if desired_open == record.commanded_open {
                continue;
            }
            let forced = reason == Some(OpenReason::MinimumFloor);
            if !forced
                && let Some(last) = record.last_change
                && now - last < self.debounce
            {
                // retried once the debounce window passes
                timers.arm_earliest(TimerKey::Reevaluate, last + self.debounce);
                debug!(vent = %record.vent_id, "vent command debounced");
                continue;
            }
            commands.push(VentCommandPlan {
                vent_id: record.vent_id.clone(),
                open: desired_open,
                reason,
                forced,
            });
        }
        commands
    }

    /// Force-open the best candidates until the floor is met: rooms
    /// furthest from their target first, ties broken by room then vent
    /// identifier for determinism.
    fn fill_floor(
        &self,
        rooms: &[RoomVentInput],
        target_open: &mut BTreeMap<VentId, OpenReason>,
        mut needed: u32,
    ) {
        let distances: BTreeMap<&RoomId, f64> = rooms
            .iter()
            .map(|r| (&r.room_id, r.distance_from_target.unwrap_or(f64::NEG_INFINITY)))
            .collect();

        let mut candidates: Vec<&VentRecord> = self
            .vents
            .values()
            .filter(|v| !v.degraded && !target_open.contains_key(&v.vent_id))
            .collect();
        candidates.sort_by(|a, b| {
            let da = distances.get(&a.room_id).copied().unwrap_or(f64::NEG_INFINITY);
            let db = distances.get(&b.room_id).copied().unwrap_or(f64::NEG_INFINITY);
            db.partial_cmp(&da)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.room_id.cmp(&b.room_id))
                .then_with(|| a.vent_id.cmp(&b.vent_id))
        });

        for record in candidates {
            if needed == 0 {
                break;
            }
            debug!(vent = %record.vent_id, room = %record.room_id, "force-opening vent for minimum floor");
            target_open.insert(record.vent_id.clone(), OpenReason::MinimumFloor);
            needed = needed.saturating_sub(record.members);
        }
    }
}
