//! Host platform ports: state reads, actuator commands, notifications.
//!
//! Command ports dispatch and return as soon as the host has accepted the
//! command; they never wait for the device to reach the commanded state. A
//! returned error means the dispatch itself failed and the commanded state
//! must be treated as unconfirmed.

use std::future::Future;

use zonehub_domain::error::ZoneHubError;
use zonehub_domain::id::{SensorId, VentId};
use zonehub_domain::mode::HvacMode;
use zonehub_domain::notify::ControlNotification;
use zonehub_domain::settings::Setpoints;
use zonehub_domain::snapshot::StateSnapshot;

/// Read-only view of host entity states.
pub trait StateProvider: Send + Sync {
    /// Current snapshot of an entity, `None` when the host does not know
    /// the entity at all.
    fn snapshot(&self, entity_id: &str) -> impl Future<Output = Option<StateSnapshot>> + Send;
}

/// Commands for the controlled thermostat.
pub trait ClimateCommands: Send + Sync {
    /// Set the thermostat's HVAC mode.
    fn set_hvac_mode(
        &self,
        thermostat: &SensorId,
        mode: HvacMode,
    ) -> impl Future<Output = Result<(), ZoneHubError>> + Send;

    /// Push target temperatures to the thermostat.
    fn set_temperature(
        &self,
        thermostat: &SensorId,
        setpoints: Setpoints,
    ) -> impl Future<Output = Result<(), ZoneHubError>> + Send;
}

/// Tilt commands for vents and vent groups.
pub trait VentCommands: Send + Sync {
    /// Open a vent (or every member of a group).
    fn open_vent(&self, vent: &VentId) -> impl Future<Output = Result<(), ZoneHubError>> + Send;

    /// Close a vent (or every member of a group).
    fn close_vent(&self, vent: &VentId) -> impl Future<Output = Result<(), ZoneHubError>> + Send;
}

/// Delivery of pause/resume notifications through the host's notify service.
pub trait Notifier: Send + Sync {
    /// Deliver a notification. Failures are logged by the caller and never
    /// block control decisions.
    fn notify(
        &self,
        notification: ControlNotification,
    ) -> impl Future<Output = Result<(), ZoneHubError>> + Send;
}
