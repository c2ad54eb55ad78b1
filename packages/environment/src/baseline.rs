//! Selection of non-outbreak baseline days.
//!
//! Candidate dates are drawn with the month picked from the outbreak-day
//! month distribution and the year and day of month picked uniformly, so
//! the baseline set shares the seasonality of the outbreak set. Dates that
//! are medium days, out of the study interval, or already drawn are
//! discarded until enough distinct days are found.

use std::collections::BTreeSet;

use chrono::{Datelike as _, NaiveDate};
use rand::Rng;
use rand::distr::Distribution as _;
use rand::distr::weighted::WeightedIndex;

use crate::SamplingError;

/// Candidate draws allowed per requested day before giving up.
pub const ATTEMPTS_PER_DAY: usize = 1_000;

/// Normalizes month counts into 12 weights summing to 1.
///
/// Months without outbreak days keep their slot with weight 0.
///
/// # Errors
///
/// Returns [`SamplingError::InvalidWeights`] if every count is zero.
pub fn month_weights(counts: &[usize; 12]) -> Result<[f64; 12], SamplingError> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return Err(SamplingError::InvalidWeights {
            message: "no outbreak days to take month frequencies from".to_string(),
        });
    }
    #[allow(clippy::cast_precision_loss)]
    let weights = counts.map(|c| c as f64 / total as f64);
    Ok(weights)
}

/// Draws baseline days from a study interval.
#[derive(Debug, Clone)]
pub struct BaselineSampler {
    start: NaiveDate,
    end: NaiveDate,
    months: WeightedIndex<f64>,
    excluded: BTreeSet<NaiveDate>,
}

impl BaselineSampler {
    /// Creates a sampler over `start..=end` that never returns a date in
    /// `excluded`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::InvalidWeights`] if the interval is empty
    /// or the weights are negative, non-finite, or all zero.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        weights: &[f64; 12],
        excluded: BTreeSet<NaiveDate>,
    ) -> Result<Self, SamplingError> {
        if start > end {
            return Err(SamplingError::InvalidWeights {
                message: format!("study interval {start} to {end} is empty"),
            });
        }
        let months = WeightedIndex::new(weights).map_err(|e| SamplingError::InvalidWeights {
            message: e.to_string(),
        })?;
        Ok(Self {
            start,
            end,
            months,
            excluded,
        })
    }

    /// Draws `count` distinct eligible dates, returned in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::BaselineExhausted`] if fewer than `count`
    /// dates are found within `count * ATTEMPTS_PER_DAY` draws.
    pub fn draw(&self, count: usize, rng: &mut impl Rng) -> Result<Vec<NaiveDate>, SamplingError> {
        let max_attempts = count.saturating_mul(ATTEMPTS_PER_DAY);
        let mut drawn = BTreeSet::new();
        let mut attempts = 0;

        while drawn.len() < count {
            if attempts >= max_attempts {
                return Err(SamplingError::BaselineExhausted {
                    requested: count,
                    drawn: drawn.len(),
                    attempts,
                });
            }
            attempts += 1;

            let Some(candidate) = self.candidate(rng) else {
                continue;
            };
            if candidate < self.start || candidate > self.end || self.excluded.contains(&candidate)
            {
                continue;
            }
            drawn.insert(candidate);
        }

        log::debug!(
            "Drew {count} baseline days in {attempts} attempts ({} excluded dates)",
            self.excluded.len()
        );
        Ok(drawn.into_iter().collect())
    }

    fn candidate(&self, rng: &mut impl Rng) -> Option<NaiveDate> {
        #[allow(clippy::cast_possible_truncation)]
        let month = self.months.sample(rng) as u32 + 1;
        let year = rng.random_range(self.start.year()..=self.end.year());
        let day = rng.random_range(1..=days_in_month(year, month)?);
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weights_keep_empty_months() {
        let mut counts = [0; 12];
        counts[3] = 3;
        counts[4] = 1;
        let weights = month_weights(&counts).unwrap();
        assert_eq!(weights.len(), 12);
        assert!((weights[3] - 0.75).abs() < 1e-12);
        assert!((weights[4] - 0.25).abs() < 1e-12);
        assert!(weights[0].abs() < f64::EPSILON);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(month_weights(&[0; 12]).is_err());
    }

    #[test]
    fn draws_only_weighted_months() {
        let mut counts = [0; 12];
        counts[4] = 1;
        let sampler = BaselineSampler::new(
            date(1994, 1, 1),
            date(2013, 12, 31),
            &month_weights(&counts).unwrap(),
            BTreeSet::new(),
        )
        .unwrap();
        let days = sampler.draw(200, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(days.len(), 200);
        assert!(days.iter().all(|d| d.month() == 5));
        assert!(days.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn skips_excluded_dates_and_interval_edges() {
        let mut counts = [0; 12];
        counts[5] = 1;
        let start = date(2000, 6, 10);
        let end = date(2000, 6, 20);
        let excluded: BTreeSet<NaiveDate> = [date(2000, 6, 12), date(2000, 6, 15)].into();
        let sampler =
            BaselineSampler::new(start, end, &month_weights(&counts).unwrap(), excluded.clone())
                .unwrap();

        // Nine eligible days in the interval.
        let days = sampler.draw(9, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(days.len(), 9);
        assert!(days.iter().all(|d| *d >= start && *d <= end));
        assert!(days.iter().all(|d| !excluded.contains(d)));

        let err = sampler.draw(10, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(
            err,
            SamplingError::BaselineExhausted {
                requested: 10,
                drawn: 9,
                ..
            }
        ));
    }

    #[test]
    fn same_seed_same_days() {
        let weights = month_weights(&[1; 12]).unwrap();
        let sampler =
            BaselineSampler::new(date(1994, 1, 1), date(2013, 12, 31), &weights, BTreeSet::new())
                .unwrap();
        let a = sampler.draw(50, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = sampler.draw(50, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2000, 2), Some(29));
        assert_eq!(days_in_month(1900, 2), Some(28));
        assert_eq!(days_in_month(2011, 12), Some(31));
    }
}
