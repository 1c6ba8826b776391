//! Persistence port for state that must survive restarts.

use std::future::Future;

use zonehub_domain::error::ZoneHubError;
use zonehub_domain::id::EntryId;
use zonehub_domain::persistence::PersistedState;

/// Durable store for per-entry pause and occupancy state.
pub trait StateStore: Send + Sync {
    /// Load the persisted state for an entry, `None` when nothing was
    /// saved yet.
    fn load(
        &self,
        entry: &EntryId,
    ) -> impl Future<Output = Result<Option<PersistedState>, ZoneHubError>> + Send;

    /// Persist the state for an entry, replacing any previous snapshot.
    fn save(
        &self,
        entry: &EntryId,
        state: &PersistedState,
    ) -> impl Future<Output = Result<(), ZoneHubError>> + Send;
}
