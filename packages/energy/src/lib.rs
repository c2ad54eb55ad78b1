#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tornado energy dissipation model.
//!
//! Converts catalog records into normalized [`Event`]s (rating imputation,
//! metric units, zero-value filling, width-convention correction) and
//! tags each event with an energy dissipation estimate derived from its
//! damage rating's wind-speed distribution and its path area.
//!
//! [`Event`]: outbreak_event_models::Event

pub mod model;
pub mod normalize;

pub use model::EnergyModel;
pub use normalize::{NormalizationReport, NormalizeOptions, normalize};

use outbreak_event_models::InvalidRatingError;
use thiserror::Error;

/// Errors raised by the energy model. All of them indicate corrupted
/// input and abort the pipeline.
#[derive(Debug, Error)]
pub enum EnergyError {
    /// A rating outside 0-5 survived imputation.
    #[error("Data integrity error: {0}")]
    InvalidRating(#[from] InvalidRatingError),

    /// A column had no positive value to fill zero entries with.
    #[error("Data integrity error: no positive {column} in catalog to fill zero values")]
    NoPositiveValue {
        /// Name of the column.
        column: &'static str,
    },

    /// An event's path area was not strictly positive.
    #[error("Data integrity error: non-positive path area {area} for event at {timestamp}")]
    NonPositiveArea {
        /// Event timestamp, for locating the record.
        timestamp: chrono::NaiveDateTime,
        /// Offending area in square meters.
        area: f64,
    },

    /// A wind-speed distribution table was malformed.
    #[error("Invalid energy table: {message}")]
    InvalidTable {
        /// Description of what went wrong.
        message: String,
    },
}
