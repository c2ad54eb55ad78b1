//! 06:00-to-06:00 convective day assignment.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike as _};

/// Local hour at which one convective day ends and the next begins.
pub const DAY_BOUNDARY_HOUR: u32 = 6;

/// Returns the convective day an event belongs to.
///
/// Events before 06:00 local belong to the previous calendar day's storm
/// system; everything else belongs to its own calendar day.
#[must_use]
pub fn convective_day(timestamp: NaiveDateTime) -> NaiveDate {
    if timestamp.hour() < DAY_BOUNDARY_HOUR {
        (timestamp - Duration::hours(24)).date()
    } else {
        (timestamp - Duration::hours(i64::from(DAY_BOUNDARY_HOUR))).date()
    }
}
