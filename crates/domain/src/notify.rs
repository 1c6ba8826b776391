//! Notification events emitted by the control loop.
//!
//! Rendering (templates, localisation, delivery tags) is the notification
//! adapter's concern; the core only states what happened.

use serde::{Deserialize, Serialize};

use crate::id::{EntryId, SensorId};
use crate::mode::HvacMode;

/// A pause/resume event worth telling the household about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ControlNotification {
    /// The thermostat was paused because a contact sensor stayed open.
    Paused {
        entry_id: EntryId,
        /// The sensor whose open timeout elapsed; `None` for a manual pause.
        triggered_by: Option<SensorId>,
        open_count: u32,
        open_timeout_minutes: u32,
    },
    /// The thermostat resumed after all sensors stayed closed.
    Resumed {
        entry_id: EntryId,
        /// The mode that was restored; `None` when the thermostat was left
        /// off.
        restored_mode: Option<HvacMode>,
        close_timeout_minutes: u32,
    },
}

impl ControlNotification {
    /// The configuration entry this notification belongs to.
    #[must_use]
    pub fn entry_id(&self) -> &EntryId {
        match self {
            Self::Paused { entry_id, .. } | Self::Resumed { entry_id, .. } => entry_id,
        }
    }
}
