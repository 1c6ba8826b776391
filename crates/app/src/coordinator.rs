//! Coordinator — per-entry orchestrator.
//!
//! Owns one instance of every control component and serialises all inputs:
//! host state changes, timer firings, and the `pause`/`resume`/`recalculate`
//! operations all pass through here, so no component ever observes a
//! partially-updated sibling. Each evaluation cycle produces one
//! authoritative set of room evaluations shared by the decision engine, the
//! vent selector, and status projections.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use zonehub_domain::entry::EntryConfig;
use zonehub_domain::error::ZoneHubError;
use zonehub_domain::evaluation::{Classification, RoomEvaluation};
use zonehub_domain::id::{RoomId, SensorId, VentId};
use zonehub_domain::mode::HvacMode;
use zonehub_domain::notify::ControlNotification;
use zonehub_domain::persistence::PersistedState;
use zonehub_domain::policy::AwayBehavior;
use zonehub_domain::settings::Setpoints;
use zonehub_domain::snapshot::{StateChange, StateSnapshot};
use zonehub_domain::time::{Duration, Timestamp};

use crate::classify::{self, CriticalThresholds};
use crate::contact::{ContactMonitor, PauseTransition};
use crate::engine::{DecisionEngine, EngineAction, EngineInput};
use crate::inclusion::{self, InclusionContext, RoomFacts};
use crate::occupancy::RoomOccupancy;
use crate::ports::{ClimateCommands, Notifier, StateProvider, StateStore, VentCommands};
use crate::status::{EntryStatus, PauseStatus, RoomStatus, VentStatus};
use crate::timers::{TimerArena, TimerKey};
use crate::vents::{RoomVentInput, VentSelector};

/// How soon a failed actuator dispatch is retried.
fn command_retry() -> Duration {
    Duration::seconds(30)
}

/// Which component a host entity feeds.
#[derive(Debug, Clone)]
enum Route {
    Contact(SensorId),
    Occupancy(RoomId, SensorId),
    Temperature,
    Thermostat,
    Vent(VentId),
    Away,
}

/// Per-entry control loop orchestrator.
pub struct Coordinator<S, C, V, N, P> {
    config: EntryConfig,
    provider: S,
    climate: C,
    vent_port: V,
    notifier: N,
    store: P,

    monitor: ContactMonitor,
    rooms: BTreeMap<RoomId, RoomOccupancy>,
    engine: DecisionEngine,
    selector: VentSelector,
    timers: TimerArena,
    routes: HashMap<String, Route>,

    away: bool,
    stored_setpoints: Option<Setpoints>,
    /// Mode we just commanded; used to tell our own echo from an external
    /// override.
    expected_mode: Option<HvacMode>,
    last_evaluations: Vec<RoomEvaluation>,
    last_inferred_mode: Option<HvacMode>,
    control_status: String,
}

impl<S, C, V, N, P> Coordinator<S, C, V, N, P>
where
    S: StateProvider,
    C: ClimateCommands,
    V: VentCommands,
    N: Notifier,
    P: StateStore,
{
    /// Build a coordinator from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::Validation`] when the configuration breaks an
    /// invariant; runtime never sees an invalid configuration.
    pub fn new(
        config: EntryConfig,
        provider: S,
        climate: C,
        vent_port: V,
        notifier: N,
        store: P,
    ) -> Result<Self, ZoneHubError> {
        config.validate()?;

        let monitor = ContactMonitor::new(
            config.contact_sensors.clone(),
            config.settings.open_timeout(),
            config.settings.close_timeout(),
        );
        let engine = DecisionEngine::new(
            config.settings.min_cycle_on(),
            config.settings.min_cycle_off(),
        );
        let mut selector = VentSelector::new(
            config.settings.min_vents_open,
            config.settings.vent_debounce(),
        );

        let mut rooms = BTreeMap::new();
        let mut routes = HashMap::new();
        for sensor in &config.contact_sensors {
            routes.insert(
                sensor.id.to_string(),
                Route::Contact(sensor.id.clone()),
            );
        }
        routes.insert(config.thermostat.to_string(), Route::Thermostat);
        if let Some(away) = &config.away_sensor {
            routes.insert(away.to_string(), Route::Away);
        }
        for room in &config.rooms {
            rooms.insert(
                room.id.clone(),
                RoomOccupancy::new(
                    room.id.clone(),
                    room.occupancy_sensors.clone(),
                    config.settings.min_occupancy(),
                    config.settings.grace_period(),
                ),
            );
            for sensor in &room.occupancy_sensors {
                routes.insert(
                    sensor.id.to_string(),
                    Route::Occupancy(room.id.clone(), sensor.id.clone()),
                );
            }
            for sensor in &room.temperature_sensors {
                routes.insert(sensor.to_string(), Route::Temperature);
            }
            for vent in &room.vents {
                selector.add_vent(room.id.clone(), vent);
                routes.insert(vent.id.to_string(), Route::Vent(vent.id.clone()));
            }
        }

        Ok(Self {
            config,
            provider,
            climate,
            vent_port,
            notifier,
            store,
            monitor,
            rooms,
            engine,
            selector,
            timers: TimerArena::new(),
            routes,
            away: false,
            stored_setpoints: None,
            expected_mode: None,
            last_evaluations: Vec::new(),
            last_inferred_mode: None,
            control_status: String::new(),
        })
    }

    #[must_use]
    pub fn entry_id(&self) -> &zonehub_domain::id::EntryId {
        &self.config.id
    }

    /// Whether the household is away.
    pub fn set_away(&mut self, away: bool) {
        self.away = away;
    }

    /// The earliest pending timer deadline, for the wakeup driver.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.next_deadline()
    }

    /// Drain timers due at `now`, for the wakeup driver.
    pub fn due_timers(&mut self, now: Timestamp) -> Vec<TimerKey> {
        self.timers.due(now)
    }

    /// Restore persisted state, scan current sensor states, and run the
    /// first evaluation.
    pub async fn setup(&mut self, now: Timestamp) {
        match self.store.load(&self.config.id).await {
            Ok(Some(persisted)) => {
                info!(entry = %self.config.id, saved_at = %persisted.saved_at, "restoring persisted state");
                self.monitor.restore(persisted.pause);
                for (room_id, state) in persisted.rooms {
                    if let Some(room) = self.rooms.get_mut(&room_id) {
                        room.restore(state);
                    }
                }
            }
            Ok(None) => debug!(entry = %self.config.id, "no persisted state"),
            Err(err) => warn!(entry = %self.config.id, error = %err, "failed to load persisted state"),
        }

        // initial contact sensor scan
        let contact_ids: Vec<SensorId> = self
            .config
            .contact_sensors
            .iter()
            .map(|s| s.id.clone())
            .collect();
        for id in contact_ids {
            if let Some(snapshot) = self.provider.snapshot(id.as_str()).await
                && !snapshot.is_unavailable()
            {
                self.monitor
                    .sensor_changed(&id, snapshot.is_on(), now, &mut self.timers);
            }
        }
        self.monitor.ensure_timers(now, &mut self.timers);

        // initial occupancy scan
        let room_sensors: Vec<(RoomId, SensorId)> = self
            .config
            .rooms
            .iter()
            .flat_map(|room| {
                room.occupancy_sensors
                    .iter()
                    .map(|s| (room.id.clone(), s.id.clone()))
            })
            .collect();
        for (room_id, sensor_id) in room_sensors {
            let snapshot = self
                .provider
                .snapshot(sensor_id.as_str())
                .await
                .unwrap_or_default();
            if let Some(room) = self.rooms.get_mut(&room_id) {
                room.sensor_changed(&sensor_id, &snapshot, now, &mut self.timers);
            }
        }
        for room in self.rooms.values_mut() {
            room.after_scan(now, &mut self.timers);
        }

        // away seed
        if let Some(away) = self.config.away_sensor.clone()
            && let Some(snapshot) = self.provider.snapshot(away.as_str()).await
        {
            self.away = snapshot.is_on();
        }

        // thermostat seed
        if let Some(snapshot) = self.provider.snapshot(self.config.thermostat.as_str()).await {
            self.update_setpoints(&snapshot);
            if let Some(mode) = snapshot.hvac_mode() {
                self.monitor.external_mode_changed(mode, &mut self.timers);
                self.engine.note_external_mode(mode);
            }
        }

        // vent seed
        let vent_ids: Vec<VentId> = self
            .config
            .rooms
            .iter()
            .flat_map(|r| r.vents.iter().map(|v| v.id.clone()))
            .collect();
        for vent_id in vent_ids {
            let open = match self.provider.snapshot(vent_id.as_str()).await {
                Some(snapshot) => vent_open(&snapshot),
                None => None,
            };
            if open.is_none() {
                warn!(vent = %vent_id, "vent unknown to host, marking degraded");
            }
            self.selector.seed(&vent_id, open);
        }

        self.evaluate(now).await;
    }

    /// Handle a host state-change event.
    pub async fn handle_change(&mut self, change: &StateChange, now: Timestamp) {
        let Some(route) = self.routes.get(change.entity_id.as_str()).cloned() else {
            return;
        };
        match route {
            Route::Contact(sensor) => {
                if change.new.is_unavailable() {
                    return;
                }
                self.monitor
                    .sensor_changed(&sensor, change.new.is_on(), now, &mut self.timers);
                self.evaluate(now).await;
            }
            Route::Occupancy(room_id, sensor) => {
                let changed = self
                    .rooms
                    .get_mut(&room_id)
                    .is_some_and(|room| room.sensor_changed(&sensor, &change.new, now, &mut self.timers));
                if changed {
                    self.evaluate(now).await;
                }
            }
            Route::Temperature => {
                self.evaluate(now).await;
            }
            Route::Thermostat => {
                self.update_setpoints(&change.new);
                let Some(mode) = change.new.hvac_mode() else {
                    return;
                };
                if self.expected_mode == Some(mode) {
                    // our own command coming back
                    self.expected_mode = None;
                    return;
                }
                let cleared = self.monitor.external_mode_changed(mode, &mut self.timers);
                self.engine.note_external_mode(mode);
                if cleared {
                    info!(entry = %self.config.id, mode = %mode, "pause cleared by manual override");
                }
                self.evaluate(now).await;
            }
            Route::Vent(vent) => {
                self.selector.host_state_changed(&vent, vent_open(&change.new));
            }
            Route::Away => {
                if change.new.is_unavailable() {
                    return;
                }
                let away = change.new.is_on();
                if away != self.away {
                    info!(entry = %self.config.id, away, "away state changed");
                    self.away = away;
                    self.evaluate(now).await;
                }
            }
        }
    }

    /// Handle a fired timer.
    pub async fn handle_timer(&mut self, key: TimerKey, now: Timestamp) {
        match key {
            TimerKey::ContactOpen(sensor) => {
                let mode = self.thermostat_mode().await;
                if let Some(PauseTransition::Paused { triggered_by, .. }) =
                    self.monitor.handle_open_timeout(&sensor, mode)
                {
                    self.execute_pause(triggered_by, now).await;
                    self.evaluate(now).await;
                }
            }
            TimerKey::ContactClose => {
                if let Some(PauseTransition::Resumed { restore_mode }) = self
                    .monitor
                    .handle_close_timeout(self.config.respect_user_off)
                {
                    self.execute_resume(restore_mode, now).await;
                    self.evaluate(now).await;
                }
            }
            TimerKey::OccupancyMinimum(room_id) => {
                let changed = self
                    .rooms
                    .get_mut(&room_id)
                    .is_some_and(|room| room.handle_minimum_timer(now));
                if changed {
                    self.evaluate(now).await;
                }
            }
            TimerKey::OccupancyGrace(room_id) => {
                let changed = self
                    .rooms
                    .get_mut(&room_id)
                    .is_some_and(|room| room.handle_grace_timer(now));
                if changed {
                    self.evaluate(now).await;
                }
            }
            TimerKey::VentOpenDelay(_) | TimerKey::Reevaluate => {
                self.evaluate(now).await;
            }
        }
    }

    /// Force an immediate pause (service call).
    pub async fn pause(&mut self, now: Timestamp) {
        let mode = self.thermostat_mode().await;
        if let Some(PauseTransition::Paused { triggered_by, .. }) =
            self.monitor.force_pause(mode, &mut self.timers)
        {
            self.execute_pause(triggered_by, now).await;
            self.evaluate(now).await;
        }
    }

    /// Force an immediate resume (service call).
    pub async fn resume(&mut self, now: Timestamp) {
        if let Some(PauseTransition::Resumed { restore_mode }) = self
            .monitor
            .force_resume(self.config.respect_user_off, &mut self.timers)
        {
            self.execute_resume(restore_mode, now).await;
        }
        self.evaluate(now).await;
    }

    /// Force a full re-evaluation from current inputs. Idempotent: with no
    /// input change, decisions repeat and no commands are issued.
    pub async fn recalculate(&mut self, now: Timestamp) {
        self.evaluate(now).await;
    }

    /// Persist state for the next start.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::Storage`] when the snapshot cannot be saved.
    pub async fn shutdown(&mut self, now: Timestamp) -> Result<(), ZoneHubError> {
        let rooms = self
            .rooms
            .iter()
            .map(|(id, room)| (id.clone(), room.state().clone()))
            .collect();
        let state = PersistedState::new(now, self.monitor.snapshot(), rooms);
        self.store.save(&self.config.id, &state).await
    }

    /// Build the read-only status projection.
    pub async fn status(&self, now: Timestamp) -> EntryStatus {
        let hvac_mode = self.thermostat_mode().await;
        let rooms = self
            .config
            .rooms
            .iter()
            .filter_map(|room| {
                let occupancy = self.rooms.get(&room.id)?;
                let evaluation = self
                    .last_evaluations
                    .iter()
                    .find(|e| e.room_id == room.id)?;
                Some(RoomStatus::from_parts(
                    room.name.clone(),
                    occupancy.is_occupied(),
                    occupancy.is_active(),
                    occupancy.state().in_grace_period(),
                    occupancy
                        .state()
                        .occupancy_duration(now)
                        .map(|d| d.num_minutes()),
                    evaluation,
                ))
            })
            .collect();
        let vents = self
            .selector
            .records()
            .map(|record| VentStatus {
                vent_id: record.vent_id.clone(),
                room_id: record.room_id.clone(),
                members: record.members,
                commanded_open: record.commanded_open,
                confirmed: record.confirmed,
                degraded: record.degraded,
            })
            .collect();

        EntryStatus {
            entry_id: self.config.id.clone(),
            name: self.config.name.clone(),
            generated_at: now,
            pause: PauseStatus {
                phase: self.monitor.phase(),
                paused: self.monitor.is_paused(),
                previous_hvac_mode: self.monitor.previous_hvac_mode(),
                triggered_by: self.monitor.triggered_by().cloned(),
                open_count: self.monitor.open_count(),
                open_doors: self.monitor.open_door_count(),
                open_windows: self.monitor.open_window_count(),
            },
            hvac_mode,
            inferred_hvac_mode: self.last_inferred_mode,
            control_status: self.control_status.clone(),
            rooms,
            vents,
            open_vents: self.selector.open_member_count(),
            min_vents_open: self.config.settings.min_vents_open,
        }
    }

    async fn thermostat_mode(&self) -> Option<HvacMode> {
        self.provider
            .snapshot(self.config.thermostat.as_str())
            .await
            .and_then(|s| s.hvac_mode())
    }

    fn update_setpoints(&mut self, snapshot: &StateSnapshot) {
        let low = snapshot.attribute_f64("target_temp_low");
        let high = snapshot.attribute_f64("target_temp_high");
        if let (Some(heat), Some(cool)) = (low, high) {
            self.stored_setpoints = Some(Setpoints::new(heat, cool));
        } else if let Some(target) = snapshot.attribute_f64("temperature") {
            let mut setpoints = self
                .stored_setpoints
                .unwrap_or_else(|| Setpoints::new(target, target));
            match snapshot.hvac_mode() {
                Some(HvacMode::Heat) => setpoints.heat = target,
                Some(HvacMode::Cool) => setpoints.cool = target,
                _ => {
                    setpoints.heat = target;
                    setpoints.cool = target;
                }
            }
            self.stored_setpoints = Some(setpoints);
        }
    }

    async fn execute_pause(&mut self, triggered_by: Option<SensorId>, now: Timestamp) {
        self.expected_mode = Some(HvacMode::Off);
        if let Err(err) = self
            .climate
            .set_hvac_mode(&self.config.thermostat, HvacMode::Off)
            .await
        {
            warn!(entry = %self.config.id, error = %err, "failed to turn thermostat off for pause");
            self.expected_mode = None;
            self.timers.arm_earliest(TimerKey::Reevaluate, now + command_retry());
        }
        let notification = ControlNotification::Paused {
            entry_id: self.config.id.clone(),
            triggered_by,
            open_count: self.monitor.open_count(),
            open_timeout_minutes: self.config.settings.open_timeout_minutes,
        };
        if let Err(err) = self.notifier.notify(notification).await {
            warn!(entry = %self.config.id, error = %err, "failed to send pause notification");
        }
    }

    async fn execute_resume(&mut self, restore_mode: Option<HvacMode>, now: Timestamp) {
        if let Some(mode) = restore_mode {
            self.expected_mode = Some(mode);
            if let Err(err) = self.climate.set_hvac_mode(&self.config.thermostat, mode).await {
                warn!(entry = %self.config.id, error = %err, "failed to restore thermostat mode");
                self.expected_mode = None;
                self.timers.arm_earliest(TimerKey::Reevaluate, now + command_retry());
            }
        }
        let notification = ControlNotification::Resumed {
            entry_id: self.config.id.clone(),
            restored_mode: restore_mode,
            close_timeout_minutes: self.config.settings.close_timeout_minutes,
        };
        if let Err(err) = self.notifier.notify(notification).await {
            warn!(entry = %self.config.id, error = %err, "failed to send resume notification");
        }
    }

    /// One full evaluation cycle: classify every room, decide run/idle,
    /// select vents.
    async fn evaluate(&mut self, now: Timestamp) {
        let thermostat_snapshot = self.provider.snapshot(self.config.thermostat.as_str()).await;
        if let Some(snapshot) = &thermostat_snapshot {
            self.update_setpoints(snapshot);
        }
        let current_mode = thermostat_snapshot.as_ref().and_then(StateSnapshot::hvac_mode);
        let setpoints = self.stored_setpoints;

        // gather readings per room
        let mut room_readings: BTreeMap<RoomId, BTreeMap<SensorId, f64>> = BTreeMap::new();
        let mut all_temps: Vec<f64> = Vec::new();
        for room in &self.config.rooms {
            let mut readings = BTreeMap::new();
            for sensor in &room.temperature_sensors {
                if let Some(snapshot) = self.provider.snapshot(sensor.as_str()).await {
                    if let Some(value) = snapshot.as_f64() {
                        readings.insert(sensor.clone(), value);
                        all_temps.push(value);
                    } else if !snapshot.is_unavailable() {
                        debug!(sensor = %sensor, "non-numeric temperature reading ignored");
                    }
                }
            }
            if readings.is_empty() && !room.temperature_sensors.is_empty() {
                warn!(room = %room.id, "no usable temperature readings, room degraded this cycle");
            }
            room_readings.insert(room.id.clone(), readings);
        }

        // evaluation mode: the thermostat's own mode, or inferred while off
        let inferred = match (current_mode, setpoints) {
            (Some(mode), _) if mode.is_on() => None,
            (_, Some(sp)) => classify::infer_hvac_mode(&all_temps, sp),
            _ => None,
        };
        let evaluation_mode = match current_mode {
            Some(mode) if mode.is_on() => mode,
            _ => inferred.unwrap_or(HvacMode::Heat),
        };

        let thresholds = CriticalThresholds {
            heating: self.config.settings.unoccupied_heating_threshold,
            cooling: self.config.settings.unoccupied_cooling_threshold,
        };
        let satiation_setpoints = setpoints.map(|sp| {
            if self.away && self.config.eco.away_behavior == AwayBehavior::UseEcoAwayTargets {
                self.config.settings.away_targets.unwrap_or(sp)
            } else {
                sp
            }
        });

        let ctx = InclusionContext {
            eco: &self.config.eco,
            tsr: &self.config.tsr,
            away: self.away,
        };
        let mut evaluations = Vec::with_capacity(self.config.rooms.len());
        for room in &self.config.rooms {
            let readings = room_readings
                .get(&room.id)
                .cloned()
                .unwrap_or_default();
            let active = self.rooms.get(&room.id).is_some_and(RoomOccupancy::is_active);

            let assessment = match (satiation_setpoints, setpoints) {
                (Some(satiation), Some(critical)) => classify::assess(
                    &readings,
                    evaluation_mode,
                    satiation,
                    critical,
                    self.config.settings.temperature_deadband,
                    thresholds,
                ),
                _ => None,
            };

            let evaluation = match assessment {
                Some(assessment) => {
                    let facts = RoomFacts {
                        room_id: room.id.clone(),
                        active,
                        is_critical: assessment.is_critical,
                        force_track_when_critical: room.force_track_when_critical,
                    };
                    let (classification, rule) = inclusion::classify_room(&facts, &ctx);
                    RoomEvaluation {
                        room_id: room.id.clone(),
                        classification,
                        is_satiated: assessment.is_satiated,
                        is_critical: assessment.is_critical,
                        determining_temperature: Some(assessment.determining_temperature),
                        determining_sensor: Some(assessment.determining_sensor),
                        distance_from_target: Some(assessment.distance_from_target),
                        inclusion_rule: rule,
                    }
                }
                None => RoomEvaluation::excluded(room.id.clone(), "no-readings"),
            };
            evaluations.push(evaluation);
        }
        self.last_evaluations = evaluations;
        self.last_inferred_mode = inferred;

        if self.monitor.is_paused() {
            // the pause short-circuits the engine: thermostat stays off and
            // vents stay at their last commanded state
            self.control_status = "paused by open contact sensors".to_string();
            return;
        }

        let decision = self.engine.decide(EngineInput {
            evaluations: &self.last_evaluations,
            current_mode,
            inferred_mode: inferred,
            paused: false,
            respect_user_off: self.config.respect_user_off,
            now,
        });
        self.control_status = decision.reason.clone();

        match decision.action {
            EngineAction::TurnOn { mode } => {
                self.expected_mode = Some(mode);
                match self.climate.set_hvac_mode(&self.config.thermostat, mode).await {
                    Ok(()) => {
                        self.engine.record_turn_on(mode, now);
                        info!(entry = %self.config.id, mode = %mode, reason = %decision.reason, "thermostat on");
                        if let Some(setpoints) = satiation_setpoints
                            && let Err(err) = self
                                .climate
                                .set_temperature(&self.config.thermostat, setpoints)
                                .await
                        {
                            warn!(entry = %self.config.id, error = %err, "failed to push setpoints");
                        }
                    }
                    Err(err) => {
                        warn!(entry = %self.config.id, error = %err, "turn-on dispatch failed, will retry");
                        self.expected_mode = None;
                        self.timers.arm_earliest(TimerKey::Reevaluate, now + command_retry());
                    }
                }
            }
            EngineAction::TurnOff => {
                self.expected_mode = Some(HvacMode::Off);
                match self
                    .climate
                    .set_hvac_mode(&self.config.thermostat, HvacMode::Off)
                    .await
                {
                    Ok(()) => {
                        self.engine.record_turn_off(now);
                        info!(entry = %self.config.id, reason = %decision.reason, "thermostat off");
                    }
                    Err(err) => {
                        warn!(entry = %self.config.id, error = %err, "turn-off dispatch failed, will retry");
                        self.expected_mode = None;
                        self.timers.arm_earliest(TimerKey::Reevaluate, now + command_retry());
                    }
                }
            }
            EngineAction::WaitCycleOn { retry_at } | EngineAction::WaitCycleOff { retry_at } => {
                // the deferred transition is re-attempted even if no sensor
                // event arrives in the meantime
                self.timers.arm_earliest(TimerKey::Reevaluate, retry_at);
            }
            EngineAction::None => {}
        }

        self.select_vents(now).await;
    }

    async fn select_vents(&mut self, now: Timestamp) {
        let default_delay = self.config.settings.vent_open_delay();
        let inputs: Vec<RoomVentInput> = self
            .config
            .rooms
            .iter()
            .filter(|room| !room.vents.is_empty())
            .filter_map(|room| {
                let evaluation = self
                    .last_evaluations
                    .iter()
                    .find(|e| e.room_id == room.id)?;
                let occupied = self
                    .rooms
                    .get(&room.id)
                    .is_some_and(RoomOccupancy::is_occupied);
                Some(RoomVentInput {
                    room_id: room.id.clone(),
                    is_critical: evaluation.is_critical,
                    needs_conditioning: evaluation.classification == Classification::ActiveEval
                        && !evaluation.is_satiated,
                    occupied,
                    distance_from_target: evaluation.distance_from_target,
                    open_delay: room.vent_open_delay().unwrap_or(default_delay),
                })
            })
            .collect();

        let plans = self.selector.plan(&inputs, now, &mut self.timers);
        for plan in plans {
            let result = if plan.open {
                self.vent_port.open_vent(&plan.vent_id).await
            } else {
                self.vent_port.close_vent(&plan.vent_id).await
            };
            match result {
                Ok(()) => {
                    debug!(vent = %plan.vent_id, open = plan.open, reason = ?plan.reason, "vent command dispatched");
                    self.selector.dispatched(&plan.vent_id, plan.open, now);
                }
                Err(err) => {
                    warn!(vent = %plan.vent_id, error = %err, "vent command failed, will retry");
                    self.selector.dispatch_failed(&plan.vent_id);
                    self.timers.arm_earliest(TimerKey::Reevaluate, now + command_retry());
                }
            }
        }
    }
}

/// Interpret a cover snapshot as open/closed; `None` when unreadable.
fn vent_open(snapshot: &StateSnapshot) -> Option<bool> {
    if snapshot.is_unavailable() {
        return None;
    }
    if snapshot.state.as_deref() == Some("open") {
        return Some(true);
    }
    if let Some(tilt) = snapshot.attribute_f64("current_tilt_position") {
        return Some(tilt > 50.0);
    }
    Some(snapshot.state.as_deref() != Some("closed"))
}
