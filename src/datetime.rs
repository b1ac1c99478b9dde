//! Date/time utilities for logfollow.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::feed::Timestamp;

/// Convert a unix timestamp in seconds to a UTC datetime.
pub fn to_utc(ts: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

/// Format a unix timestamp in the given timezone.
///
/// # Arguments
///
/// * `ts` - Unix timestamp in seconds
/// * `timezone` - Timezone name (e.g., "Europe/Stockholm", "UTC")
/// * `format` - Output format string (e.g., "%Y-%m-%d %H:%M:%S")
///
/// # Returns
///
/// Formatted datetime string. Falls back to UTC for an unknown timezone and
/// to the raw number for an out-of-range timestamp.
pub fn format_timestamp(ts: Timestamp, timezone: &str, format: &str) -> String {
    let Some(dt) = to_utc(ts) else {
        return ts.to_string();
    };

    match timezone.parse::<Tz>() {
        Ok(tz) => dt.with_timezone(&tz).format(format).to_string(),
        Err(_) => dt.format(format).to_string(),
    }
}
