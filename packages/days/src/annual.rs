//! Per-year outbreak summaries for trend analysis.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::Datelike as _;
use serde::{Deserialize, Serialize};

use crate::Outbreaks;

/// Outbreak activity in one calendar year (by convective-day date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    /// Calendar year.
    pub year: i32,
    /// Number of medium days.
    pub medium_days: usize,
    /// Number of big days.
    pub big_days: usize,
    /// Events on big days.
    pub big_day_events: usize,
    /// Sum of ATE over big days.
    pub big_day_energy: f64,
}

impl YearSummary {
    const fn empty(year: i32) -> Self {
        Self {
            year,
            medium_days: 0,
            big_days: 0,
            big_day_events: 0,
            big_day_energy: 0.0,
        }
    }

    /// Mean number of events per big day, `None` in years without one.
    #[must_use]
    pub fn mean_events_per_big_day(&self) -> Option<f64> {
        (self.big_days > 0).then(|| self.big_day_events as f64 / self.big_days as f64)
    }
}

/// Summarizes every year in `years`, including years without outbreaks.
#[must_use]
pub fn annual_summaries(outbreaks: &Outbreaks, years: RangeInclusive<i32>) -> Vec<YearSummary> {
    let mut by_year: BTreeMap<i32, YearSummary> = years
        .clone()
        .map(|year| (year, YearSummary::empty(year)))
        .collect();
    let big = outbreaks.thresholds().big();

    for group in outbreaks.med_days() {
        let Some(summary) = by_year.get_mut(&group.day.date.year()) else {
            continue;
        };
        summary.medium_days += 1;
        if group.stats.count >= big {
            summary.big_days += 1;
            summary.big_day_events += group.stats.count;
            summary.big_day_energy += group.stats.total_energy;
        }
    }

    by_year.into_values().collect()
}
