//! Wire formats for dates and timestamps.
//!
//! Timestamps go out as UTC with millisecond precision
//! (`2025-01-01T08:30:00.000Z`), due dates as plain `YYYY-MM-DD`.

use time::{OffsetDateTime, UtcOffset};

time::serde::format_description!(
    pub iso_millis,
    OffsetDateTime,
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Normalizes a stored timestamp to UTC before it is rendered with a literal `Z`.
pub fn utc(ts: OffsetDateTime) -> OffsetDateTime {
    ts.to_offset(UtcOffset::UTC)
}
