//! Per-entry state persisted across restarts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contact::PauseState;
use crate::id::RoomId;
use crate::occupancy::RoomOccupancyState;
use crate::time::Timestamp;

/// Format version of the persisted payload.
pub const STORAGE_VERSION: u32 = 1;

/// Snapshot of everything that must survive a restart: the pause machine and
/// each room's occupancy state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub saved_at: Timestamp,
    pub pause: PauseState,
    #[serde(default)]
    pub rooms: BTreeMap<RoomId, RoomOccupancyState>,
}

impl PersistedState {
    /// Create a current-version snapshot.
    #[must_use]
    pub fn new(
        saved_at: Timestamp,
        pause: PauseState,
        rooms: BTreeMap<RoomId, RoomOccupancyState>,
    ) -> Self {
        Self {
            version: STORAGE_VERSION,
            saved_at,
            pause,
            rooms,
        }
    }
}
