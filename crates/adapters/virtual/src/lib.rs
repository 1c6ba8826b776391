//! # zonehub-adapter-virtual
//!
//! A simulated host platform: an in-memory entity state table plus a
//! broadcast channel of state changes. Actuator commands mutate the
//! simulated entities and publish the resulting change, so a coordinator
//! wired to a [`VirtualHost`] sees the same feedback loop a real host
//! would provide. Used by the daemon's demo mode and by integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::info;

use zonehub_app::ports::{ClimateCommands, Notifier, StateProvider, VentCommands};
use zonehub_domain::error::{CommandError, ZoneHubError};
use zonehub_domain::id::{EventId, SensorId, VentId};
use zonehub_domain::mode::HvacMode;
use zonehub_domain::notify::ControlNotification;
use zonehub_domain::settings::Setpoints;
use zonehub_domain::snapshot::{StateChange, StateSnapshot};

/// Simulated host platform. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct VirtualHost {
    states: Arc<Mutex<HashMap<String, StateSnapshot>>>,
    events: broadcast::Sender<StateChange>,
    notifications: Arc<Mutex<Vec<ControlNotification>>>,
}

impl VirtualHost {
    /// Create a host with the given event channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            events,
            notifications: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Subscribe to state changes published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.events.subscribe()
    }

    /// Current snapshot of an entity.
    #[must_use]
    pub fn get(&self, entity_id: &str) -> Option<StateSnapshot> {
        self.states.lock().expect("state table poisoned").get(entity_id).cloned()
    }

    /// Set an entity's state and publish the change.
    pub fn set_state(&self, entity_id: &str, snapshot: StateSnapshot) {
        let old = self
            .states
            .lock()
            .expect("state table poisoned")
            .insert(entity_id.to_string(), snapshot.clone());
        let change = StateChange {
            id: EventId::new(),
            entity_id: entity_id.into(),
            old,
            new: snapshot,
        };
        // send fails only with zero subscribers, which is fine
        let _ = self.events.send(change);
    }

    /// Notifications delivered so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<ControlNotification> {
        self.notifications
            .lock()
            .expect("notification log poisoned")
            .clone()
    }

    /// Mutate an existing entity, preserving attributes the update does not
    /// touch. Errors when the entity is unknown.
    fn update_entity(
        &self,
        entity_id: &str,
        service: &'static str,
        update: impl FnOnce(&mut StateSnapshot),
    ) -> Result<(), ZoneHubError> {
        let updated = {
            let mut states = self.states.lock().expect("state table poisoned");
            match states.get_mut(entity_id) {
                Some(snapshot) => {
                    let old = snapshot.clone();
                    update(snapshot);
                    Some((old, snapshot.clone()))
                }
                None => None,
            }
        };
        match updated {
            Some((old, new)) => {
                let _ = self.events.send(StateChange {
                    id: EventId::new(),
                    entity_id: entity_id.into(),
                    old: Some(old),
                    new,
                });
                Ok(())
            }
            None => Err(CommandError {
                entity: entity_id.to_string(),
                service,
                reason: "unknown entity".to_string(),
            }
            .into()),
        }
    }
}

impl StateProvider for VirtualHost {
    fn snapshot(&self, entity_id: &str) -> impl Future<Output = Option<StateSnapshot>> + Send {
        let result = self.get(entity_id);
        async move { result }
    }
}

impl ClimateCommands for VirtualHost {
    fn set_hvac_mode(
        &self,
        thermostat: &SensorId,
        mode: HvacMode,
    ) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
        let result = self.update_entity(thermostat.as_str(), "set_hvac_mode", |snapshot| {
            snapshot.state = Some(mode.to_string());
        });
        async move { result }
    }

    fn set_temperature(
        &self,
        thermostat: &SensorId,
        setpoints: Setpoints,
    ) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
        let result = self.update_entity(thermostat.as_str(), "set_temperature", |snapshot| {
            snapshot
                .attributes
                .insert("target_temp_low".to_string(), setpoints.heat.into());
            snapshot
                .attributes
                .insert("target_temp_high".to_string(), setpoints.cool.into());
        });
        async move { result }
    }
}

impl VentCommands for VirtualHost {
    fn open_vent(&self, vent: &VentId) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
        let result = self.update_entity(vent.as_str(), "open_vent", |snapshot| {
            snapshot.state = Some("open".to_string());
            snapshot
                .attributes
                .insert("current_tilt_position".to_string(), 100.into());
        });
        async move { result }
    }

    fn close_vent(&self, vent: &VentId) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
        let result = self.update_entity(vent.as_str(), "close_vent", |snapshot| {
            snapshot.state = Some("closed".to_string());
            snapshot
                .attributes
                .insert("current_tilt_position".to_string(), 0.into());
        });
        async move { result }
    }
}

impl Notifier for VirtualHost {
    fn notify(
        &self,
        notification: ControlNotification,
    ) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
        info!(entry = %notification.entry_id(), notification = ?notification, "notification");
        self.notifications
            .lock()
            .expect("notification log poisoned")
            .push(notification);
        async { Ok(()) }
    }
}

use std::future::Future;
