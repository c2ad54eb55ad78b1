//! Catalog record normalization.
//!
//! Turns [`RawEvent`]s into [`Event`]s ready for the energy model:
//!
//! 1. unrated events get a rating from their path length (short paths are
//!    EF0, longer paths EF1),
//! 2. path dimensions are converted to meters,
//! 3. zero lengths and widths are replaced by the smallest positive value
//!    of that column across the whole catalog,
//! 4. widths recorded under the mean-width convention (from the cutoff
//!    year on) are scaled by π/4 to match the earlier maximum-width
//!    convention.

use chrono::Datelike as _;
use outbreak_event_models::{
    DamageRating, Event, RawEvent, miles_to_meters, yards_to_meters,
};

use crate::EnergyError;

/// Unrated events with a path at most this long (statute miles) are EF0.
pub const SHORT_PATH_MILES: f64 = 5.0;

/// First year whose widths are recorded as a mean rather than a maximum.
pub const WIDTH_ERA_CUTOFF_YEAR: i32 = 1995;

/// Scale applied to mean-convention widths.
pub const WIDTH_ERA_FACTOR: f64 = std::f64::consts::FRAC_PI_4;

/// Tunable normalization parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    /// Path-length cutoff (statute miles) for imputing unrated events.
    pub short_path_miles: f64,
    /// First year whose widths need the π/4 correction.
    pub width_era_cutoff_year: i32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            short_path_miles: SHORT_PATH_MILES,
            width_era_cutoff_year: WIDTH_ERA_CUTOFF_YEAR,
        }
    }
}

/// Counts of the corrections applied during normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Events normalized.
    pub events: usize,
    /// Unrated events that received an imputed rating.
    pub unrated_imputed: usize,
    /// Zero lengths replaced with the catalog minimum.
    pub zero_lengths_filled: usize,
    /// Zero widths replaced with the catalog minimum.
    pub zero_widths_filled: usize,
    /// Widths scaled for the mean-width convention.
    pub widths_corrected: usize,
}

/// Resolves a catalog rating, imputing unrated events from path length.
///
/// # Errors
///
/// Returns [`EnergyError::InvalidRating`] if the rating is outside 0-5.
pub fn resolve_rating(
    rating: Option<i32>,
    length_mi: f64,
    short_path_miles: f64,
) -> Result<DamageRating, EnergyError> {
    let value = rating.unwrap_or(if length_mi <= short_path_miles { 0 } else { 1 });
    Ok(DamageRating::from_value(value)?)
}

/// Converts a width in meters to the maximum-width convention.
#[must_use]
pub fn correct_width(width_m: f64, year: i32, cutoff_year: i32) -> f64 {
    if year >= cutoff_year {
        width_m * WIDTH_ERA_FACTOR
    } else {
        width_m
    }
}

/// Normalizes a full catalog.
///
/// The zero-fill minimums are taken over the whole input, so this must be
/// called once on the complete record set rather than per chunk.
///
/// # Errors
///
/// Returns [`EnergyError`] if a rating is out of range after imputation,
/// or a column has zero entries but no positive value to fill them with.
pub fn normalize(
    raw: &[RawEvent],
    options: &NormalizeOptions,
) -> Result<(Vec<Event>, NormalizationReport), EnergyError> {
    let mut report = NormalizationReport {
        events: raw.len(),
        ..NormalizationReport::default()
    };

    let min_length = min_positive(raw.iter().map(|r| r.length_mi));
    let min_width = min_positive(raw.iter().map(|r| r.width_yd));

    let mut events = Vec::with_capacity(raw.len());

    for record in raw {
        if record.is_unrated() {
            report.unrated_imputed += 1;
        }
        let rating = resolve_rating(record.rating, record.length_mi, options.short_path_miles)?;

        let length_mi = if record.length_mi > 0.0 {
            record.length_mi
        } else {
            report.zero_lengths_filled += 1;
            min_length.ok_or(EnergyError::NoPositiveValue { column: "length" })?
        };

        let width_yd = if record.width_yd > 0.0 {
            record.width_yd
        } else {
            report.zero_widths_filled += 1;
            min_width.ok_or(EnergyError::NoPositiveValue { column: "width" })?
        };

        let year = record.timestamp.year();
        if year >= options.width_era_cutoff_year {
            report.widths_corrected += 1;
        }
        let width_m = correct_width(
            yards_to_meters(width_yd),
            year,
            options.width_era_cutoff_year,
        );

        events.push(Event {
            timestamp: record.timestamp,
            state: record.state.clone(),
            rating,
            injuries: record.injuries,
            fatalities: record.fatalities,
            longitude: record.longitude,
            latitude: record.latitude,
            length_m: miles_to_meters(length_mi),
            width_m,
        });
    }

    log::info!(
        "Normalized {} events ({} unrated imputed, {} zero lengths and {} zero widths filled, \
         {} widths corrected)",
        report.events,
        report.unrated_imputed,
        report.zero_lengths_filled,
        report.zero_widths_filled,
        report.widths_corrected,
    );

    Ok((events, report))
}

fn min_positive(values: impl Iterator<Item = f64>) -> Option<f64> {
    values
        .filter(|v| *v > 0.0 && v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.min(v))))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn raw(year: i32, rating: Option<i32>, length_mi: f64, width_yd: f64) -> RawEvent {
        RawEvent {
            timestamp: NaiveDate::from_ymd_opt(year, 4, 27)
                .unwrap()
                .and_hms_opt(16, 20, 0)
                .unwrap(),
            state: "AL".to_string(),
            rating,
            injuries: 0,
            fatalities: 0,
            longitude: -87.5,
            latitude: 33.2,
            length_mi,
            width_yd,
        }
    }

    #[test]
    fn imputes_short_unrated_paths_as_ef0() {
        assert_eq!(
            resolve_rating(None, 5.0, SHORT_PATH_MILES).unwrap(),
            DamageRating::Ef0
        );
        assert_eq!(
            resolve_rating(None, 0.2, SHORT_PATH_MILES).unwrap(),
            DamageRating::Ef0
        );
    }

    #[test]
    fn imputes_long_unrated_paths_as_ef1() {
        assert_eq!(
            resolve_rating(None, 5.01, SHORT_PATH_MILES).unwrap(),
            DamageRating::Ef1
        );
    }

    #[test]
    fn keeps_catalog_rating() {
        assert_eq!(
            resolve_rating(Some(4), 1.0, SHORT_PATH_MILES).unwrap(),
            DamageRating::Ef4
        );
    }

    #[test]
    fn rejects_out_of_range_rating() {
        assert!(matches!(
            resolve_rating(Some(7), 1.0, SHORT_PATH_MILES),
            Err(EnergyError::InvalidRating(_))
        ));
    }

    #[test]
    fn corrects_widths_from_cutoff_year() {
        let corrected = correct_width(100.0, 2011, WIDTH_ERA_CUTOFF_YEAR);
        assert!((corrected - 78.539_816).abs() < 1e-6);
        assert!((correct_width(100.0, 1995, WIDTH_ERA_CUTOFF_YEAR) - corrected).abs() < 1e-12);
        assert!((correct_width(100.0, 1994, WIDTH_ERA_CUTOFF_YEAR) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fills_zero_dimensions_with_catalog_minimum() {
        let records = vec![
            raw(1980, Some(1), 0.0, 100.0),
            raw(1980, Some(2), 3.0, 0.0),
            raw(1980, Some(0), 0.5, 20.0),
        ];
        let (events, report) = normalize(&records, &NormalizeOptions::default()).unwrap();

        assert_eq!(report.zero_lengths_filled, 1);
        assert_eq!(report.zero_widths_filled, 1);
        assert!((events[0].length_m - miles_to_meters(0.5)).abs() < 1e-9);
        assert!((events[1].width_m - yards_to_meters(20.0)).abs() < 1e-9);
    }

    #[test]
    fn normalizes_modern_widths_and_unrated_events() {
        let records = vec![raw(2012, None, 8.0, 100.0)];
        let (events, report) = normalize(&records, &NormalizeOptions::default()).unwrap();

        assert_eq!(report.unrated_imputed, 1);
        assert_eq!(report.widths_corrected, 1);
        assert_eq!(events[0].rating, DamageRating::Ef1);
        let expected = yards_to_meters(100.0) * std::f64::consts::FRAC_PI_4;
        assert!((events[0].width_m - expected).abs() < 1e-9);
    }

    #[test]
    fn fails_when_column_has_no_positive_value() {
        let records = vec![raw(1980, Some(1), 1.0, 0.0)];
        assert!(matches!(
            normalize(&records, &NormalizeOptions::default()),
            Err(EnergyError::NoPositiveValue { column: "width" })
        ));
    }
}
