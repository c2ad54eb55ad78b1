#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Convective-day grouping and outbreak-day statistics.
//!
//! Events are assigned to 06:00-to-06:00 local "convective days", grouped,
//! summarized (count, total/geometric-mean/median/upper-quantile energy),
//! and filtered into medium and big outbreak days by event-count
//! thresholds.

pub mod aggregate;
pub mod annual;
pub mod convective;
pub mod stats;

pub use aggregate::{
    ConvectiveDay, DayGroup, DayStats, OutbreakAggregator, Outbreaks, Thresholds,
    group_by_convective_day,
};
pub use annual::{YearSummary, annual_summaries};
pub use convective::convective_day;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while grouping and summarizing days.
#[derive(Debug, Error)]
pub enum DaysError {
    /// The big-day threshold is below the medium-day threshold.
    #[error("Invalid thresholds: big ({big}) must be >= medium ({medium}) and medium >= 1")]
    InvalidThresholds {
        /// Medium-day event count threshold.
        medium: usize,
        /// Big-day event count threshold.
        big: usize,
    },

    /// An energy value feeding a geometric mean was not positive.
    #[error("Data integrity error: non-positive energy {energy} on {date}")]
    NonPositiveEnergy {
        /// Convective day containing the event.
        date: NaiveDate,
        /// Offending energy value.
        energy: f64,
    },

    /// Statistics were requested for a day with no events.
    #[error("Convective day {date} has no events")]
    EmptyDay {
        /// The empty day.
        date: NaiveDate,
    },
}
