//! Room inclusion policy — the ordered rule pipeline deciding whether a
//! room participates in the current evaluation cycle, and how.
//!
//! The eco × TSR × force-track-when-critical matrix is expressed as an
//! explicit ordered list of predicate→outcome rules so each precedence is
//! independently testable. The first rule that matches wins.

use zonehub_domain::evaluation::Classification;
use zonehub_domain::id::RoomId;
use zonehub_domain::policy::{EcoPolicy, TsrPolicy};

/// Policy context shared across rooms for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct InclusionContext<'a> {
    pub eco: &'a EcoPolicy,
    pub tsr: &'a TsrPolicy,
    /// Whether the household is away.
    pub away: bool,
}

/// Per-room facts the rules judge.
#[derive(Debug, Clone)]
pub struct RoomFacts {
    pub room_id: RoomId,
    pub active: bool,
    pub is_critical: bool,
    pub force_track_when_critical: bool,
}

struct Rule {
    name: &'static str,
    apply: fn(&RoomFacts, &InclusionContext<'_>) -> Option<Classification>,
}

/// Ordered rules; the order IS the precedence.
const RULES: &[Rule] = &[
    Rule {
        name: "force-track-when-critical",
        apply: |facts, _ctx| {
            (facts.force_track_when_critical && facts.is_critical).then(|| {
                if facts.active {
                    Classification::ActiveEval
                } else {
                    Classification::CriticalOnly
                }
            })
        },
    },
    Rule {
        name: "active-room-tracking",
        apply: |facts, ctx| {
            facts.active.then(|| {
                if ctx.tsr.includes(&facts.room_id) {
                    Classification::ActiveEval
                } else {
                    Classification::Excluded
                }
            })
        },
    },
    Rule {
        name: "eco-critical-tracking",
        apply: |facts, ctx| {
            ctx.eco.applies(ctx.away).then(|| {
                if ctx.eco.includes(&facts.room_id) {
                    Classification::CriticalOnly
                } else {
                    Classification::Excluded
                }
            })
        },
    },
    Rule {
        name: "inactive-without-eco",
        apply: |_facts, _ctx| Some(Classification::Excluded),
    },
];

/// Run the pipeline for one room. Returns the classification and the name
/// of the rule that produced it.
#[must_use]
pub fn classify_room(facts: &RoomFacts, ctx: &InclusionContext<'_>) -> (Classification, &'static str) {
    RULES
        .iter()
        .find_map(|rule| (rule.apply)(facts, ctx).map(|c| (c, rule.name)))
        .unwrap_or((Classification::Excluded, "inactive-without-eco"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use zonehub_domain::policy::{AwayBehavior, CriticalTracking};

    fn facts(active: bool, critical: bool, ftcr: bool) -> RoomFacts {
        RoomFacts {
            room_id: RoomId::from("kitchen"),
            active,
            is_critical: critical,
            force_track_when_critical: ftcr,
        }
    }

    fn eco(enabled: bool, tracking: CriticalTracking) -> EcoPolicy {
        EcoPolicy {
            enabled,
            critical_tracking: tracking,
            tracked_room_ids: BTreeSet::from([RoomId::from("kitchen")]),
            away_behavior: AwayBehavior::KeepEcoActive,
        }
    }

    fn tsr(enabled: bool, tracked: &[&str]) -> TsrPolicy {
        TsrPolicy {
            enabled,
            tracked_room_ids: tracked.iter().map(|r| RoomId::from(*r)).collect(),
        }
    }

    #[test]
    fn should_always_include_critical_ftcr_room_across_policy_cross_product() {
        // FTCR precedence must hold for the full eco × TSR cross-product
        let eco_variants = [
            eco(false, CriticalTracking::None),
            eco(true, CriticalTracking::None),
            eco(true, CriticalTracking::All),
            eco(true, CriticalTracking::Select),
        ];
        let tsr_variants = [tsr(false, &[]), tsr(true, &[]), tsr(true, &["kitchen"])];

        for eco_policy in &eco_variants {
            for tsr_policy in &tsr_variants {
                let ctx = InclusionContext {
                    eco: eco_policy,
                    tsr: tsr_policy,
                    away: false,
                };
                let (classification, rule) = classify_room(&facts(false, true, true), &ctx);
                assert_eq!(classification, Classification::CriticalOnly);
                assert_eq!(rule, "force-track-when-critical");
            }
        }
    }

    #[test]
    fn should_classify_active_ftcr_critical_room_as_active_eval() {
        let ctx = InclusionContext {
            eco: &eco(true, CriticalTracking::None),
            tsr: &tsr(true, &[]),
            away: false,
        };
        let (classification, rule) = classify_room(&facts(true, true, true), &ctx);
        assert_eq!(classification, Classification::ActiveEval);
        assert_eq!(rule, "force-track-when-critical");
    }

    #[test]
    fn should_not_trigger_ftcr_when_room_is_not_critical() {
        let ctx = InclusionContext {
            eco: &eco(false, CriticalTracking::None),
            tsr: &tsr(false, &[]),
            away: false,
        };
        let (_, rule) = classify_room(&facts(true, false, true), &ctx);
        assert_eq!(rule, "active-room-tracking");
    }

    #[test]
    fn should_include_active_room_when_tsr_disabled() {
        let ctx = InclusionContext {
            eco: &eco(false, CriticalTracking::None),
            tsr: &tsr(false, &[]),
            away: false,
        };
        let (classification, _) = classify_room(&facts(true, false, false), &ctx);
        assert_eq!(classification, Classification::ActiveEval);
    }

    #[test]
    fn should_exclude_active_room_outside_tsr_tracking() {
        let ctx = InclusionContext {
            eco: &eco(true, CriticalTracking::All),
            tsr: &tsr(true, &["office"]),
            away: false,
        };
        let (classification, rule) = classify_room(&facts(true, false, false), &ctx);
        assert_eq!(classification, Classification::Excluded);
        // the active-room rule decides; the eco path never sees the room
        assert_eq!(rule, "active-room-tracking");
    }

    #[test]
    fn should_include_inactive_room_under_eco_all() {
        let ctx = InclusionContext {
            eco: &eco(true, CriticalTracking::All),
            tsr: &tsr(false, &[]),
            away: false,
        };
        let (classification, rule) = classify_room(&facts(false, true, false), &ctx);
        assert_eq!(classification, Classification::CriticalOnly);
        assert_eq!(rule, "eco-critical-tracking");
    }

    #[test]
    fn should_filter_inactive_rooms_under_eco_select() {
        let ctx = InclusionContext {
            eco: &eco(true, CriticalTracking::Select),
            tsr: &tsr(false, &[]),
            away: false,
        };
        let (tracked, _) = classify_room(&facts(false, true, false), &ctx);
        assert_eq!(tracked, Classification::CriticalOnly);

        let pantry = RoomFacts {
            room_id: RoomId::from("pantry"),
            active: false,
            is_critical: true,
            force_track_when_critical: false,
        };
        let (untracked, _) = classify_room(&pantry, &ctx);
        assert_eq!(untracked, Classification::Excluded);
    }

    #[test]
    fn should_exclude_inactive_rooms_under_eco_none() {
        let ctx = InclusionContext {
            eco: &eco(true, CriticalTracking::None),
            tsr: &tsr(false, &[]),
            away: false,
        };
        let (classification, _) = classify_room(&facts(false, true, false), &ctx);
        assert_eq!(classification, Classification::Excluded);
    }

    #[test]
    fn should_exclude_inactive_rooms_when_eco_disabled() {
        let ctx = InclusionContext {
            eco: &eco(false, CriticalTracking::All),
            tsr: &tsr(false, &[]),
            away: false,
        };
        let (classification, rule) = classify_room(&facts(false, true, false), &ctx);
        assert_eq!(classification, Classification::Excluded);
        assert_eq!(rule, "inactive-without-eco");
    }

    #[test]
    fn should_turn_eco_path_off_when_away_disables_eco() {
        let away_disable = EcoPolicy {
            enabled: true,
            critical_tracking: CriticalTracking::All,
            tracked_room_ids: BTreeSet::new(),
            away_behavior: AwayBehavior::DisableEco,
        };
        let ctx = InclusionContext {
            eco: &away_disable,
            tsr: &tsr(false, &[]),
            away: true,
        };
        let (classification, rule) = classify_room(&facts(false, true, false), &ctx);
        assert_eq!(classification, Classification::Excluded);
        assert_eq!(rule, "inactive-without-eco");

        // FTCR still wins while away
        let (ftcr, _) = classify_room(&facts(false, true, true), &ctx);
        assert_eq!(ftcr, Classification::CriticalOnly);
    }

    #[test]
    fn should_keep_eco_path_when_away_behavior_keeps_eco() {
        let ctx = InclusionContext {
            eco: &eco(true, CriticalTracking::All),
            tsr: &tsr(false, &[]),
            away: true,
        };
        let (classification, _) = classify_room(&facts(false, false, false), &ctx);
        assert_eq!(classification, Classification::CriticalOnly);
    }
}
