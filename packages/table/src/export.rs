//! CSV exports of screen profiles and annual summaries.

use std::io;

use outbreak_correlation::ScreenProfile;
use outbreak_days::YearSummary;
use serde::Serialize;

use crate::TableError;

/// Writes one row per angle: `angle_deg,r,p_value,ci_low,ci_high`.
/// Undefined statistics are written as `NaN`.
///
/// # Errors
///
/// Returns [`TableError::Csv`] if writing fails.
pub fn write_screen_profile<W: io::Write>(
    profile: &ScreenProfile,
    writer: W,
) -> Result<(), TableError> {
    let mut csv = csv::Writer::from_writer(writer);
    for point in &profile.points {
        csv.serialize(point)?;
    }
    csv.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct AnnualRow {
    year: i32,
    medium_days: usize,
    big_days: usize,
    big_day_events: usize,
    big_day_energy: f64,
    mean_events_per_big_day: Option<f64>,
}

/// Writes one row per year.
///
/// # Errors
///
/// Returns [`TableError::Csv`] if writing fails.
pub fn write_annual_summaries<W: io::Write>(
    summaries: &[YearSummary],
    writer: W,
) -> Result<(), TableError> {
    let mut csv = csv::Writer::from_writer(writer);
    for summary in summaries {
        csv.serialize(AnnualRow {
            year: summary.year,
            medium_days: summary.medium_days,
            big_days: summary.big_days,
            big_day_events: summary.big_day_events,
            big_day_energy: summary.big_day_energy,
            mean_events_per_big_day: summary.mean_events_per_big_day(),
        })?;
    }
    csv.flush()?;
    Ok(())
}
