//! Contact sensor monitor — the pause/resume state machine.
//!
//! Watches a set of door/window sensors. When one stays open past the open
//! timeout the thermostat is paused (forced off, previous mode captured);
//! once every sensor has stayed closed for the close timeout the previous
//! mode is restored. Timer firings are validated against current state, so
//! a firing that raced a cancellation is a no-op.

use std::collections::BTreeMap;

use tracing::{debug, info};

use zonehub_domain::contact::{ContactKind, ContactSensor, PausePhase, PauseState};
use zonehub_domain::id::SensorId;
use zonehub_domain::mode::HvacMode;
use zonehub_domain::time::{Duration, Timestamp};

use crate::timers::{TimerArena, TimerKey};

/// A completed pause or resume transition, to be executed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PauseTransition {
    /// Turn the thermostat off and announce the pause.
    Paused {
        /// The sensor whose timeout elapsed; `None` for a forced pause.
        triggered_by: Option<SensorId>,
        /// Mode captured at the moment of transition, before forcing off.
        previous_mode: Option<HvacMode>,
    },
    /// Restore the thermostat and announce the resume.
    Resumed {
        /// Mode to restore; `None` leaves the thermostat off.
        restore_mode: Option<HvacMode>,
    },
}

/// The pause/resume state machine over a set of contact sensors.
#[derive(Debug)]
pub struct ContactMonitor {
    sensors: Vec<ContactSensor>,
    open_since: BTreeMap<SensorId, Timestamp>,
    phase: PausePhase,
    /// The sensor whose open timeout is currently armed.
    pending_trigger: Option<SensorId>,
    previous_hvac_mode: Option<HvacMode>,
    /// Last externally-observed conditioning mode, for resumes that must
    /// not leave the thermostat off.
    last_known_mode: Option<HvacMode>,
    triggered_by: Option<SensorId>,
    open_timeout: Duration,
    close_timeout: Duration,
}

impl ContactMonitor {
    #[must_use]
    pub fn new(sensors: Vec<ContactSensor>, open_timeout: Duration, close_timeout: Duration) -> Self {
        Self {
            sensors,
            open_since: BTreeMap::new(),
            phase: PausePhase::Running,
            pending_trigger: None,
            previous_hvac_mode: None,
            last_known_mode: None,
            triggered_by: None,
            open_timeout,
            close_timeout,
        }
    }

    #[must_use]
    pub fn phase(&self) -> PausePhase {
        self.phase
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    #[must_use]
    pub fn previous_hvac_mode(&self) -> Option<HvacMode> {
        self.previous_hvac_mode
    }

    #[must_use]
    pub fn triggered_by(&self) -> Option<&SensorId> {
        self.triggered_by.as_ref()
    }

    /// Number of currently open sensors.
    #[must_use]
    pub fn open_count(&self) -> u32 {
        u32::try_from(self.open_since.len()).unwrap_or(u32::MAX)
    }

    /// Number of currently open door sensors.
    #[must_use]
    pub fn open_door_count(&self) -> u32 {
        self.count_open(ContactKind::Door)
    }

    /// Number of currently open window sensors.
    #[must_use]
    pub fn open_window_count(&self) -> u32 {
        self.count_open(ContactKind::Window)
    }

    fn count_open(&self, kind: ContactKind) -> u32 {
        let count = self
            .sensors
            .iter()
            .filter(|s| s.kind == kind && self.open_since.contains_key(&s.id))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Apply a sensor's current open/closed state.
    pub fn sensor_changed(
        &mut self,
        id: &SensorId,
        open: bool,
        now: Timestamp,
        timers: &mut TimerArena,
    ) {
        let Some(sensor) = self.sensors.iter_mut().find(|s| &s.id == id) else {
            return;
        };
        sensor.is_open = open;

        if open {
            self.open_since.entry(id.clone()).or_insert(now);
            debug!(sensor = %id, phase = %self.phase, "contact sensor opened");

            match self.phase {
                PausePhase::Running => {
                    self.phase = PausePhase::PendingPause;
                    self.pending_trigger = Some(id.clone());
                    timers.arm(TimerKey::ContactOpen(id.clone()), now + self.open_timeout);
                }
                PausePhase::PendingResume => {
                    // a reopen voids the pending resume
                    timers.cancel(&TimerKey::ContactClose);
                    self.phase = PausePhase::Paused;
                }
                PausePhase::PendingPause | PausePhase::Paused => {}
            }
        } else {
            self.open_since.remove(id);
            debug!(sensor = %id, phase = %self.phase, "contact sensor closed");

            match self.phase {
                PausePhase::PendingPause => {
                    if self.pending_trigger.as_ref() == Some(id) {
                        timers.cancel(&TimerKey::ContactOpen(id.clone()));
                        if let Some((next, since)) = self.earliest_open() {
                            // another sensor is still open: its own open
                            // duration keeps counting toward the timeout
                            self.pending_trigger = Some(next.clone());
                            timers.arm(TimerKey::ContactOpen(next), since + self.open_timeout);
                        } else {
                            self.pending_trigger = None;
                            self.phase = PausePhase::Running;
                        }
                    }
                }
                PausePhase::Paused => {
                    if self.open_since.is_empty() {
                        self.phase = PausePhase::PendingResume;
                        timers.arm(TimerKey::ContactClose, now + self.close_timeout);
                    }
                }
                PausePhase::Running | PausePhase::PendingResume => {}
            }
        }
    }

    fn earliest_open(&self) -> Option<(SensorId, Timestamp)> {
        self.open_since
            .iter()
            .min_by_key(|(_, since)| **since)
            .map(|(id, since)| (id.clone(), *since))
    }

    /// The open timeout fired for `sensor`. Returns the pause transition, or
    /// `None` when the firing is stale (sensor closed again, trigger moved).
    pub fn handle_open_timeout(
        &mut self,
        sensor: &SensorId,
        current_mode: Option<HvacMode>,
    ) -> Option<PauseTransition> {
        if self.phase != PausePhase::PendingPause
            || self.pending_trigger.as_ref() != Some(sensor)
            || !self.open_since.contains_key(sensor)
        {
            return None;
        }

        self.phase = PausePhase::Paused;
        self.pending_trigger = None;
        self.previous_hvac_mode = current_mode.or(self.previous_hvac_mode);
        if let Some(mode) = current_mode
            && mode.is_on()
        {
            self.last_known_mode = Some(mode);
        }
        self.triggered_by = Some(sensor.clone());

        info!(
            sensor = %sensor,
            previous_mode = ?self.previous_hvac_mode,
            "open timeout expired, pausing thermostat"
        );
        Some(PauseTransition::Paused {
            triggered_by: Some(sensor.clone()),
            previous_mode: self.previous_hvac_mode,
        })
    }

    /// The close timeout fired. Returns the resume transition, or `None`
    /// when the firing is stale (a sensor reopened).
    pub fn handle_close_timeout(&mut self, respect_user_off: bool) -> Option<PauseTransition> {
        if self.phase != PausePhase::PendingResume || !self.open_since.is_empty() {
            return None;
        }

        self.phase = PausePhase::Running;
        self.triggered_by = None;
        let restore_mode = self.restore_mode(respect_user_off);
        info!(restore_mode = ?restore_mode, "close timeout expired, resuming thermostat");
        Some(PauseTransition::Resumed { restore_mode })
    }

    fn restore_mode(&self, respect_user_off: bool) -> Option<HvacMode> {
        match self.previous_hvac_mode {
            Some(mode) if mode.is_on() => Some(mode),
            // the thermostat was off before the pause
            _ if respect_user_off => None,
            _ => self.last_known_mode,
        }
    }

    /// An external actor changed the thermostat mode. Returns `true` when
    /// this cleared an active pause (the user overrode us).
    pub fn external_mode_changed(&mut self, mode: HvacMode, timers: &mut TimerArena) -> bool {
        if mode.is_on() {
            self.last_known_mode = Some(mode);
        }
        match self.phase {
            PausePhase::Running | PausePhase::PendingPause | PausePhase::PendingResume => {
                // keep the stored mode fresh so a later resume does not
                // fight the user
                self.previous_hvac_mode = Some(mode);
                false
            }
            PausePhase::Paused => {
                if mode.is_on() {
                    info!(mode = %mode, "user overrode pause, returning to running");
                    timers.cancel(&TimerKey::ContactClose);
                    self.phase = PausePhase::Running;
                    self.previous_hvac_mode = None;
                    self.triggered_by = None;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Force an immediate pause, bypassing timers. `None` when already
    /// paused.
    pub fn force_pause(
        &mut self,
        current_mode: Option<HvacMode>,
        timers: &mut TimerArena,
    ) -> Option<PauseTransition> {
        if self.phase == PausePhase::Paused {
            return None;
        }
        self.cancel_timers(timers);
        self.phase = PausePhase::Paused;
        self.previous_hvac_mode = current_mode.or(self.previous_hvac_mode);
        if let Some(mode) = current_mode
            && mode.is_on()
        {
            self.last_known_mode = Some(mode);
        }
        self.triggered_by = None;
        info!(previous_mode = ?self.previous_hvac_mode, "paused by service call");
        Some(PauseTransition::Paused {
            triggered_by: None,
            previous_mode: self.previous_hvac_mode,
        })
    }

    /// Force an immediate resume, bypassing timers. `None` when already
    /// running or when only a pending pause was cancelled.
    pub fn force_resume(
        &mut self,
        respect_user_off: bool,
        timers: &mut TimerArena,
    ) -> Option<PauseTransition> {
        if self.phase == PausePhase::Running {
            return None;
        }
        let was_paused = matches!(self.phase, PausePhase::Paused | PausePhase::PendingResume);
        self.cancel_timers(timers);
        self.phase = PausePhase::Running;
        self.triggered_by = None;
        if was_paused {
            let restore_mode = self.restore_mode(respect_user_off);
            info!(restore_mode = ?restore_mode, "resumed by service call");
            Some(PauseTransition::Resumed { restore_mode })
        } else {
            None
        }
    }

    fn cancel_timers(&mut self, timers: &mut TimerArena) {
        if let Some(trigger) = self.pending_trigger.take() {
            timers.cancel(&TimerKey::ContactOpen(trigger));
        }
        timers.cancel(&TimerKey::ContactClose);
    }

    /// Serializable snapshot for persistence.
    #[must_use]
    pub fn snapshot(&self) -> PauseState {
        PauseState {
            phase: self.phase,
            previous_hvac_mode: self.previous_hvac_mode,
            triggered_by: self.triggered_by.clone(),
            open_since: self.open_since.clone(),
        }
    }

    /// Adopt a persisted snapshot. Call before the initial sensor scan;
    /// [`ensure_timers`](Self::ensure_timers) re-arms what a restart lost.
    pub fn restore(&mut self, state: PauseState) {
        self.phase = state.phase;
        self.previous_hvac_mode = state.previous_hvac_mode;
        if let Some(mode) = state.previous_hvac_mode
            && mode.is_on()
        {
            self.last_known_mode = Some(mode);
        }
        self.triggered_by = state.triggered_by;
        self.open_since = state
            .open_since
            .into_iter()
            .filter(|(id, _)| self.sensors.iter().any(|s| &s.id == id))
            .collect();
        for sensor in &mut self.sensors {
            sensor.is_open = self.open_since.contains_key(&sensor.id);
        }
        if self.phase == PausePhase::PendingPause {
            self.pending_trigger = self.earliest_open().map(|(id, _)| id);
            if self.pending_trigger.is_none() {
                self.phase = PausePhase::Running;
            }
        }
    }

    /// Re-arm timers implied by the current phase, after a restore.
    pub fn ensure_timers(&mut self, now: Timestamp, timers: &mut TimerArena) {
        match self.phase {
            PausePhase::PendingPause => {
                if let Some(trigger) = self.pending_trigger.clone()
                    && !timers.is_armed(&TimerKey::ContactOpen(trigger.clone()))
                {
                    let since = self.open_since.get(&trigger).copied().unwrap_or(now);
                    timers.arm(TimerKey::ContactOpen(trigger), since + self.open_timeout);
                }
            }
            PausePhase::PendingResume => {
                if !timers.is_armed(&TimerKey::ContactClose) {
                    timers.arm(TimerKey::ContactClose, now + self.close_timeout);
                }
            }
            PausePhase::Running | PausePhase::Paused => {}
        }
    }
}
