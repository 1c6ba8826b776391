//! Operations the control loop exposes to the host and operators.

use std::future::Future;

use zonehub_domain::error::ZoneHubError;
use zonehub_domain::id::EntryId;

use crate::status::EntryStatus;

/// The three invocable operations plus the read-only status surface, keyed
/// by configuration entry. Every method fails with
/// [`ZoneHubError::NotFound`] for an unknown entry.
pub trait ControlService: Send + Sync {
    /// Force-pause the entry's thermostat.
    fn pause(&self, entry: &EntryId) -> impl Future<Output = Result<(), ZoneHubError>> + Send;

    /// Force-resume the entry's thermostat.
    fn resume(&self, entry: &EntryId) -> impl Future<Output = Result<(), ZoneHubError>> + Send;

    /// Force a full synchronous re-evaluation from current inputs.
    fn recalculate(&self, entry: &EntryId)
    -> impl Future<Output = Result<(), ZoneHubError>> + Send;

    /// Read the entry's status projection.
    fn status(
        &self,
        entry: &EntryId,
    ) -> impl Future<Output = Result<EntryStatus, ZoneHubError>> + Send;

    /// List the configured entries.
    fn entries(&self) -> impl Future<Output = Vec<EntryId>> + Send;
}
