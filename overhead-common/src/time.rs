//! Timestamp utilities
//!
//! Position history is stored as second-precision local timestamps at a fixed
//! offset from UTC (`YYYY-MM-DDTHH:MM:SS`, no offset suffix). Fixed width means
//! lexical order equals chronological order, so range scans can compare text.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::{Error, Result};

/// Storage format for `locations.timestamp`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Lower bound that sorts before every stored timestamp
pub const EARLIEST_TIMESTAMP: &str = "0000-01-01T00:00:00";

/// Upper bound that sorts after every stored timestamp
pub const LATEST_TIMESTAMP: &str = "9999-12-31T23:59:59";

/// Build a fixed offset from minutes east of UTC
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(minutes * 60)
        .ok_or_else(|| Error::Config(format!("UTC offset out of range: {} minutes", minutes)))
}

/// Current time at the given offset
pub fn now_at(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// Format a timestamp for storage
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a strictly `yyyy-mm-dd` shaped date
///
/// The shape is checked before calendar validity so inputs like `2024-1-05`
/// or `24-01-05` are rejected even though a lenient parser would accept them.
pub fn parse_day(input: &str) -> Result<NaiveDate> {
    let bytes = input.as_bytes();
    let well_shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !well_shaped {
        return Err(Error::InvalidInput(format!(
            "Invalid date '{}': expected yyyy-mm-dd",
            input
        )));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("Invalid date '{}': {}", input, e)))
}

/// Inclusive storage bounds covering one local calendar day
pub fn day_bounds(day: NaiveDate) -> (String, String) {
    let date = day.format("%Y-%m-%d");
    (format!("{}T00:00:00", date), format!("{}T23:59:59", date))
}
