//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for occupancy tracking, timer deadlines, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Signed duration between two [`Timestamp`]s.
pub type Duration = chrono::Duration;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
