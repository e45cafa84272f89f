//! Clock helpers shared by every layer.

use chrono::{DateTime, Utc};

/// UTC timestamp recorded as a device's `last_changed`.
pub type Timestamp = DateTime<Utc>;

/// Current wall-clock time in UTC.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
