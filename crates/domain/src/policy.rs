//! Energy-saving and room-tracking policies.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::id::RoomId;

/// Which inactive rooms eco mode still watches for critical temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalTracking {
    /// Inactive rooms are never evaluated.
    None,
    /// Every inactive room is evaluated for criticality.
    #[default]
    All,
    /// Only the rooms in [`EcoPolicy::tracked_room_ids`] are evaluated.
    Select,
}

/// How eco mode behaves while the household is away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwayBehavior {
    /// Switch the eco inclusion path off; only force-track-when-critical and
    /// active-room rules apply.
    #[default]
    DisableEco,
    /// Leave eco evaluation unchanged.
    KeepEcoActive,
    /// Keep inclusion unchanged but substitute away targets into satiation
    /// checks.
    UseEcoAwayTargets,
}

/// Eco-mode room inclusion policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EcoPolicy {
    pub enabled: bool,
    pub critical_tracking: CriticalTracking,
    /// Rooms evaluated when `critical_tracking` is
    /// [`Select`](CriticalTracking::Select).
    pub tracked_room_ids: BTreeSet<RoomId>,
    pub away_behavior: AwayBehavior,
}

impl EcoPolicy {
    /// Whether the eco inclusion path applies, given the away flag.
    #[must_use]
    pub fn applies(&self, away: bool) -> bool {
        if !self.enabled {
            return false;
        }
        !(away && self.away_behavior == AwayBehavior::DisableEco)
    }

    /// Whether this policy includes `room` for critical-only evaluation.
    #[must_use]
    pub fn includes(&self, room: &RoomId) -> bool {
        match self.critical_tracking {
            CriticalTracking::None => false,
            CriticalTracking::All => true,
            CriticalTracking::Select => self.tracked_room_ids.contains(room),
        }
    }
}

/// Track-selected-rooms policy: when enabled, only the tracked rooms
/// participate in active-room evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TsrPolicy {
    pub enabled: bool,
    pub tracked_room_ids: BTreeSet<RoomId>,
}

impl TsrPolicy {
    /// Whether an active `room` passes this filter.
    #[must_use]
    pub fn includes(&self, room: &RoomId) -> bool {
        !self.enabled || self.tracked_room_ids.contains(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eco(enabled: bool, tracking: CriticalTracking, away_behavior: AwayBehavior) -> EcoPolicy {
        EcoPolicy {
            enabled,
            critical_tracking: tracking,
            tracked_room_ids: BTreeSet::from([RoomId::from("kitchen")]),
            away_behavior,
        }
    }

    #[test]
    fn should_not_apply_when_disabled() {
        let policy = eco(false, CriticalTracking::All, AwayBehavior::KeepEcoActive);
        assert!(!policy.applies(false));
        assert!(!policy.applies(true));
    }

    #[test]
    fn should_stop_applying_when_away_disables_eco() {
        let policy = eco(true, CriticalTracking::All, AwayBehavior::DisableEco);
        assert!(policy.applies(false));
        assert!(!policy.applies(true));
    }

    #[test]
    fn should_keep_applying_when_away_behavior_keeps_eco() {
        let policy = eco(true, CriticalTracking::All, AwayBehavior::KeepEcoActive);
        assert!(policy.applies(true));
    }

    #[test]
    fn should_keep_applying_when_away_behavior_swaps_targets() {
        let policy = eco(true, CriticalTracking::All, AwayBehavior::UseEcoAwayTargets);
        assert!(policy.applies(true));
    }

    #[test]
    fn should_include_no_rooms_under_none_tracking() {
        let policy = eco(true, CriticalTracking::None, AwayBehavior::KeepEcoActive);
        assert!(!policy.includes(&RoomId::from("kitchen")));
    }

    #[test]
    fn should_include_every_room_under_all_tracking() {
        let policy = eco(true, CriticalTracking::All, AwayBehavior::KeepEcoActive);
        assert!(policy.includes(&RoomId::from("pantry")));
    }

    #[test]
    fn should_include_only_tracked_rooms_under_select_tracking() {
        let policy = eco(true, CriticalTracking::Select, AwayBehavior::KeepEcoActive);
        assert!(policy.includes(&RoomId::from("kitchen")));
        assert!(!policy.includes(&RoomId::from("pantry")));
    }

    #[test]
    fn should_include_every_active_room_when_tsr_disabled() {
        let policy = TsrPolicy::default();
        assert!(policy.includes(&RoomId::from("anything")));
    }

    #[test]
    fn should_filter_active_rooms_when_tsr_enabled() {
        let policy = TsrPolicy {
            enabled: true,
            tracked_room_ids: BTreeSet::from([RoomId::from("office")]),
        };
        assert!(policy.includes(&RoomId::from("office")));
        assert!(!policy.includes(&RoomId::from("bedroom")));
    }
}
