//! Rating-to-energy conversion.
//!
//! Each damage rating implies a distribution of the damage path area over
//! six contiguous wind-speed bins. The energy weight of a rating is the
//! expectation of the cubed bin-midpoint wind speed under that
//! distribution, and an event's energy dissipation is that weight times
//! its path area.

use outbreak_event_models::{DamageRating, Event, TaggedEvent};

use crate::EnergyError;

/// Number of wind-speed bins (one per rating).
pub const BIN_COUNT: usize = 6;

/// Lower wind-speed bound of each rating's bin in m/s (EF0 through EF5).
pub const WIND_THRESHOLDS: [f64; BIN_COUNT] = [29.06, 38.45, 49.62, 60.8, 74.21, 89.41];

/// Added to the last threshold to obtain the open-ended top bin's midpoint.
pub const LAST_BIN_OFFSET: f64 = 7.5;

/// Fraction of a rating's path area in each wind-speed bin. Row `r` is
/// rating `r`; every row sums to one.
pub const AREA_FRACTIONS: [[f64; BIN_COUNT]; BIN_COUNT] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.772, 0.228, 0.0, 0.0, 0.0, 0.0],
    [0.616, 0.268, 0.116, 0.0, 0.0, 0.0],
    [0.529, 0.271, 0.133, 0.067, 0.0, 0.0],
    [0.543, 0.238, 0.131, 0.056, 0.032, 0.0],
    [0.538, 0.223, 0.119, 0.07, 0.033, 0.017],
];

const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Precomputed energy weights for every rating.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyModel {
    midpoints: [f64; BIN_COUNT],
    weights: [f64; BIN_COUNT],
}

impl Default for EnergyModel {
    fn default() -> Self {
        Self::from_parts(&WIND_THRESHOLDS, &AREA_FRACTIONS)
    }
}

impl EnergyModel {
    /// Builds the model from the standard threshold and area tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a model from custom tables.
    ///
    /// # Errors
    ///
    /// Returns [`EnergyError::InvalidTable`] if the thresholds are not
    /// strictly increasing, or any area-fraction row contains a negative
    /// entry or does not sum to one.
    pub fn with_tables(
        thresholds: &[f64; BIN_COUNT],
        fractions: &[[f64; BIN_COUNT]; BIN_COUNT],
    ) -> Result<Self, EnergyError> {
        if thresholds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(EnergyError::InvalidTable {
                message: format!("wind thresholds must increase strictly: {thresholds:?}"),
            });
        }
        for (rating, row) in fractions.iter().enumerate() {
            if row.iter().any(|f| *f < 0.0) {
                return Err(EnergyError::InvalidTable {
                    message: format!("negative area fraction for rating {rating}"),
                });
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(EnergyError::InvalidTable {
                    message: format!("area fractions for rating {rating} sum to {sum}"),
                });
            }
        }
        Ok(Self::from_parts(thresholds, fractions))
    }

    fn from_parts(
        thresholds: &[f64; BIN_COUNT],
        fractions: &[[f64; BIN_COUNT]; BIN_COUNT],
    ) -> Self {
        let midpoints = bin_midpoints(thresholds);
        let mut weights = [0.0; BIN_COUNT];
        for (weight, row) in weights.iter_mut().zip(fractions) {
            *weight = midpoints
                .iter()
                .zip(row)
                .map(|(speed, fraction)| speed.powi(3) * fraction)
                .sum();
        }
        Self { midpoints, weights }
    }

    /// Midpoint wind speed of each bin in m/s.
    #[must_use]
    pub const fn midpoints(&self) -> &[f64; BIN_COUNT] {
        &self.midpoints
    }

    /// Expected cubed wind speed for a rating (m³/s³).
    #[must_use]
    pub const fn energy_weight(&self, rating: DamageRating) -> f64 {
        self.weights[rating.index()]
    }

    /// Energy dissipation for a rating over a path of the given metric
    /// length and width.
    #[must_use]
    pub fn dissipation(&self, rating: DamageRating, length_m: f64, width_m: f64) -> f64 {
        self.energy_weight(rating) * length_m * width_m
    }

    /// Energy dissipation of a normalized event.
    ///
    /// # Errors
    ///
    /// Returns [`EnergyError::NonPositiveArea`] if the event's path area
    /// is zero, negative, or not finite.
    pub fn energy(&self, event: &Event) -> Result<f64, EnergyError> {
        let area = event.path_area_m2();
        if !area.is_finite() || area <= 0.0 {
            return Err(EnergyError::NonPositiveArea {
                timestamp: event.timestamp,
                area,
            });
        }
        Ok(self.energy_weight(event.rating) * area)
    }

    /// Tags every event with its energy dissipation.
    ///
    /// # Errors
    ///
    /// Fails on the first event with a non-positive path area.
    pub fn tag(&self, events: Vec<Event>) -> Result<Vec<TaggedEvent>, EnergyError> {
        let tagged = events
            .into_iter()
            .map(|event| {
                let energy = self.energy(&event)?;
                Ok(TaggedEvent { event, energy })
            })
            .collect::<Result<Vec<_>, EnergyError>>()?;
        log::debug!("Tagged {} events with energy dissipation", tagged.len());
        Ok(tagged)
    }
}

/// Midpoint of each threshold interval; the top bin is open-ended and uses
/// the last threshold plus [`LAST_BIN_OFFSET`].
#[must_use]
pub fn bin_midpoints(thresholds: &[f64; BIN_COUNT]) -> [f64; BIN_COUNT] {
    let mut midpoints = [0.0; BIN_COUNT];
    for i in 0..BIN_COUNT - 1 {
        midpoints[i] = thresholds[i] + (thresholds[i + 1] - thresholds[i]) / 2.0;
    }
    midpoints[BIN_COUNT - 1] = thresholds[BIN_COUNT - 1] + LAST_BIN_OFFSET;
    midpoints
}
