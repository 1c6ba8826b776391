//! Thermostat decision engine — aggregates room evaluations into a single
//! run/idle decision, guarded by minimum-on/off cycle protection.

use tracing::debug;

use zonehub_domain::evaluation::RoomEvaluation;
use zonehub_domain::mode::HvacMode;
use zonehub_domain::time::{Duration, Timestamp};

/// Equipment-protection timing: transitions are deferred, never dropped,
/// until the respective minimum has elapsed.
#[derive(Debug, Clone)]
pub struct CycleProtection {
    last_on: Option<Timestamp>,
    last_off: Option<Timestamp>,
    min_on: Duration,
    min_off: Duration,
}

impl CycleProtection {
    #[must_use]
    pub fn new(min_on: Duration, min_off: Duration) -> Self {
        Self {
            last_on: None,
            last_off: None,
            min_on,
            min_off,
        }
    }

    /// `Ok` when an idle→run transition is allowed, otherwise the time it
    /// becomes allowed.
    ///
    /// # Errors
    ///
    /// Returns the retry time while the minimum off-time still runs.
    pub fn can_turn_on(&self, now: Timestamp) -> Result<(), Timestamp> {
        match self.last_off {
            Some(last_off) if now - last_off < self.min_off => Err(last_off + self.min_off),
            _ => Ok(()),
        }
    }

    /// `Ok` when a run→idle transition is allowed, otherwise the time it
    /// becomes allowed.
    ///
    /// # Errors
    ///
    /// Returns the retry time while the minimum on-time still runs.
    pub fn can_turn_off(&self, now: Timestamp) -> Result<(), Timestamp> {
        match self.last_on {
            Some(last_on) if now - last_on < self.min_on => Err(last_on + self.min_on),
            _ => Ok(()),
        }
    }

    pub fn record_on(&mut self, now: Timestamp) {
        self.last_on = Some(now);
    }

    pub fn record_off(&mut self, now: Timestamp) {
        self.last_off = Some(now);
    }

    #[must_use]
    pub fn last_on(&self) -> Option<Timestamp> {
        self.last_on
    }

    #[must_use]
    pub fn last_off(&self) -> Option<Timestamp> {
        self.last_off
    }
}

/// What the engine wants done with the thermostat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAction {
    /// Nothing to do.
    None,
    /// Start conditioning in `mode`.
    TurnOn { mode: HvacMode },
    /// Stop conditioning.
    TurnOff,
    /// Wants to turn off but the minimum on-time still runs.
    WaitCycleOn { retry_at: Timestamp },
    /// Wants to turn on but the minimum off-time still runs.
    WaitCycleOff { retry_at: Timestamp },
}

/// A decision with its human-readable rationale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: EngineAction,
    pub reason: String,
}

impl Decision {
    fn none(reason: impl Into<String>) -> Self {
        Self {
            action: EngineAction::None,
            reason: reason.into(),
        }
    }
}

/// Inputs for one decision pass.
#[derive(Debug, Clone, Copy)]
pub struct EngineInput<'a> {
    /// The authoritative per-room records for this cycle.
    pub evaluations: &'a [RoomEvaluation],
    /// Thermostat mode as the host reports it; `None` when unavailable.
    pub current_mode: Option<HvacMode>,
    /// Mode inferred from temperatures, used when turning on from off.
    pub inferred_mode: Option<HvacMode>,
    /// Contact-sensor pause: forces idle without resetting cycle timers.
    pub paused: bool,
    /// Honor an off state the engine did not command.
    pub respect_user_off: bool,
    pub now: Timestamp,
}

/// Run/idle decision engine for one thermostat.
#[derive(Debug)]
pub struct DecisionEngine {
    cycle: CycleProtection,
    /// Whether the engine itself commanded the current off state.
    we_turned_off: bool,
    /// Last externally-observed conditioning mode.
    last_known_mode: Option<HvacMode>,
}

impl DecisionEngine {
    #[must_use]
    pub fn new(min_cycle_on: Duration, min_cycle_off: Duration) -> Self {
        Self {
            cycle: CycleProtection::new(min_cycle_on, min_cycle_off),
            we_turned_off: false,
            last_known_mode: None,
        }
    }

    #[must_use]
    pub fn cycle(&self) -> &CycleProtection {
        &self.cycle
    }

    /// An external actor changed the thermostat mode; the current state is
    /// theirs, not ours.
    pub fn note_external_mode(&mut self, mode: HvacMode) {
        if mode.is_on() {
            self.last_known_mode = Some(mode);
        }
        self.we_turned_off = false;
    }

    /// The engine's turn-on command was dispatched.
    pub fn record_turn_on(&mut self, mode: HvacMode, now: Timestamp) {
        self.cycle.record_on(now);
        self.last_known_mode = Some(mode);
        self.we_turned_off = false;
    }

    /// The engine's turn-off command was dispatched.
    pub fn record_turn_off(&mut self, now: Timestamp) {
        self.cycle.record_off(now);
        self.we_turned_off = true;
    }

    /// Decide run vs. idle for the current cycle.
    #[must_use]
    pub fn decide(&self, input: EngineInput<'_>) -> Decision {
        if input.paused {
            // cycle timers keep accruing toward the eventual legitimate
            // transition; the override must not reset them
            return Decision::none("paused by open contact sensors");
        }

        let Some(current_mode) = input.current_mode else {
            return Decision::none("thermostat unavailable");
        };
        let is_on = current_mode.is_on();

        let callers = input
            .evaluations
            .iter()
            .filter(|e| e.calls_for_conditioning())
            .count();
        let included = input.evaluations.iter().filter(|e| e.included()).count();

        if !is_on && !self.we_turned_off && input.respect_user_off {
            return Decision::none("thermostat off by user choice");
        }

        if callers > 0 {
            if is_on {
                return Decision::none(format!("already running, {callers} room(s) calling"));
            }
            match self.cycle.can_turn_on(input.now) {
                Ok(()) => {
                    let mode = input
                        .inferred_mode
                        .or(self.last_known_mode)
                        .unwrap_or(HvacMode::Heat);
                    debug!(mode = %mode, callers, "engine decided to turn on");
                    Decision {
                        action: EngineAction::TurnOn { mode },
                        reason: format!("{callers} room(s) calling for conditioning"),
                    }
                }
                Err(retry_at) => Decision {
                    action: EngineAction::WaitCycleOff { retry_at },
                    reason: "want to turn on, waiting out minimum off-time".to_string(),
                },
            }
        } else if is_on {
            if included == 0 {
                // nothing participates in evaluation; leave a manually-run
                // thermostat alone rather than fighting the user
                return Decision::none("no rooms participating");
            }
            match self.cycle.can_turn_off(input.now) {
                Ok(()) => {
                    debug!("engine decided to turn off");
                    Decision {
                        action: EngineAction::TurnOff,
                        reason: "all included rooms satiated, none critical".to_string(),
                    }
                }
                Err(retry_at) => Decision {
                    action: EngineAction::WaitCycleOn { retry_at },
                    reason: "want to turn off, waiting out minimum on-time".to_string(),
                },
            }
        } else {
            Decision::none("idle, no rooms calling")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonehub_domain::evaluation::Classification;
    use zonehub_domain::id::RoomId;
    use zonehub_domain::time::now;

    fn evaluation(
        room: &str,
        classification: Classification,
        satiated: bool,
        critical: bool,
    ) -> RoomEvaluation {
        RoomEvaluation {
            room_id: RoomId::from(room),
            classification,
            is_satiated: satiated,
            is_critical: critical,
            determining_temperature: Some(20.0),
            determining_sensor: None,
            distance_from_target: Some(1.0),
            inclusion_rule: "test",
        }
    }

    fn engine() -> DecisionEngine {
        DecisionEngine::new(Duration::minutes(5), Duration::minutes(5))
    }

    fn input<'a>(
        evaluations: &'a [RoomEvaluation],
        current_mode: Option<HvacMode>,
        now: Timestamp,
    ) -> EngineInput<'a> {
        EngineInput {
            evaluations,
            current_mode,
            inferred_mode: Some(HvacMode::Heat),
            paused: false,
            respect_user_off: false,
            now,
        }
    }

    #[test]
    fn should_turn_on_when_active_room_is_unsatiated() {
        let evals = vec![evaluation("bedroom", Classification::ActiveEval, false, false)];
        let decision = engine().decide(input(&evals, Some(HvacMode::Off), now()));
        assert_eq!(
            decision.action,
            EngineAction::TurnOn {
                mode: HvacMode::Heat
            }
        );
    }

    #[test]
    fn should_turn_on_when_critical_only_room_is_critical() {
        let evals = vec![evaluation("basement", Classification::CriticalOnly, false, true)];
        let decision = engine().decide(input(&evals, Some(HvacMode::Off), now()));
        assert!(matches!(decision.action, EngineAction::TurnOn { .. }));
    }

    #[test]
    fn should_not_run_for_unsatiated_critical_only_room() {
        // critical-only rooms contribute criticality, not satiation
        let evals = vec![evaluation("basement", Classification::CriticalOnly, false, false)];
        let decision = engine().decide(input(&evals, Some(HvacMode::Off), now()));
        assert_eq!(decision.action, EngineAction::None);
    }

    #[test]
    fn should_turn_off_when_every_included_room_is_satiated() {
        let evals = vec![
            evaluation("bedroom", Classification::ActiveEval, true, false),
            evaluation("office", Classification::ActiveEval, true, false),
        ];
        let decision = engine().decide(input(&evals, Some(HvacMode::Heat), now()));
        assert_eq!(decision.action, EngineAction::TurnOff);
    }

    #[test]
    fn should_defer_turn_on_until_minimum_off_time() {
        let mut e = engine();
        let t0 = now();
        e.record_turn_off(t0);

        let evals = vec![evaluation("bedroom", Classification::ActiveEval, false, false)];
        let blocked = e.decide(input(&evals, Some(HvacMode::Off), t0 + Duration::minutes(2)));
        assert_eq!(
            blocked.action,
            EngineAction::WaitCycleOff {
                retry_at: t0 + Duration::minutes(5)
            }
        );

        // the deferred transition is retried, not dropped
        let allowed = e.decide(input(&evals, Some(HvacMode::Off), t0 + Duration::minutes(5)));
        assert!(matches!(allowed.action, EngineAction::TurnOn { .. }));
    }

    #[test]
    fn should_defer_turn_off_until_minimum_on_time() {
        let mut e = engine();
        let t0 = now();
        e.record_turn_on(HvacMode::Heat, t0);

        let evals = vec![evaluation("bedroom", Classification::ActiveEval, true, false)];
        let blocked = e.decide(input(&evals, Some(HvacMode::Heat), t0 + Duration::minutes(1)));
        assert_eq!(
            blocked.action,
            EngineAction::WaitCycleOn {
                retry_at: t0 + Duration::minutes(5)
            }
        );

        let allowed = e.decide(input(&evals, Some(HvacMode::Heat), t0 + Duration::minutes(6)));
        assert_eq!(allowed.action, EngineAction::TurnOff);
    }

    #[test]
    fn should_force_idle_while_paused_without_resetting_cycle_timers() {
        let mut e = engine();
        let t0 = now();
        e.record_turn_on(HvacMode::Heat, t0);

        let evals = vec![evaluation("bedroom", Classification::ActiveEval, false, false)];
        let mut paused_input = input(&evals, Some(HvacMode::Heat), t0 + Duration::minutes(1));
        paused_input.paused = true;
        let decision = e.decide(paused_input);
        assert_eq!(decision.action, EngineAction::None);

        // protection timing continued accruing during the pause
        assert!(e.cycle().can_turn_off(t0 + Duration::minutes(6)).is_ok());
    }

    #[test]
    fn should_respect_user_off() {
        let mut e = engine();
        e.note_external_mode(HvacMode::Off);

        let evals = vec![evaluation("bedroom", Classification::ActiveEval, false, false)];
        let mut user_off = input(&evals, Some(HvacMode::Off), now());
        user_off.respect_user_off = true;
        let decision = e.decide(user_off);
        assert_eq!(decision.action, EngineAction::None);
        assert_eq!(decision.reason, "thermostat off by user choice");
    }

    #[test]
    fn should_turn_on_from_own_off_even_when_respecting_user_off() {
        let mut e = engine();
        let t0 = now();
        e.record_turn_off(t0);

        let evals = vec![evaluation("bedroom", Classification::ActiveEval, false, false)];
        let mut own_off = input(&evals, Some(HvacMode::Off), t0 + Duration::minutes(6));
        own_off.respect_user_off = true;
        let decision = e.decide(own_off);
        assert!(matches!(decision.action, EngineAction::TurnOn { .. }));
    }

    #[test]
    fn should_leave_running_thermostat_alone_when_no_rooms_participate() {
        let evals = vec![evaluation("bedroom", Classification::Excluded, false, false)];
        let decision = engine().decide(input(&evals, Some(HvacMode::Heat), now()));
        assert_eq!(decision.action, EngineAction::None);
        assert_eq!(decision.reason, "no rooms participating");
    }

    #[test]
    fn should_report_unavailable_thermostat() {
        let evals = vec![evaluation("bedroom", Classification::ActiveEval, false, false)];
        let decision = engine().decide(input(&evals, None, now()));
        assert_eq!(decision.action, EngineAction::None);
        assert_eq!(decision.reason, "thermostat unavailable");
    }

    #[test]
    fn should_pick_last_known_mode_when_no_inferred_mode() {
        let mut e = engine();
        e.note_external_mode(HvacMode::Cool);
        e.note_external_mode(HvacMode::Off);

        let evals = vec![evaluation("bedroom", Classification::ActiveEval, false, false)];
        let mut no_inference = input(&evals, Some(HvacMode::Off), now());
        no_inference.inferred_mode = None;
        let decision = e.decide(no_inference);
        assert_eq!(
            decision.action,
            EngineAction::TurnOn {
                mode: HvacMode::Cool
            }
        );
    }
}
