#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Correlation statistics for outbreak-environment analysis.
//!
//! The centerpiece is [`screen`]: two standardized series `X` and `Y` are
//! rotated through a range of angles as `cos(θ)·X + sin(θ)·Y` and each
//! combination is correlated with a reference series. Confidence bounds and
//! p-values use Fisher's z-transform under a normal approximation.

pub mod fisher;
pub mod screen;
pub mod stats;
pub mod trend;

pub use fisher::{CorrelationTest, fisher_test};
pub use screen::{AngleRange, MAX_ANGLES, ScreenPoint, ScreenProfile, screen};
pub use stats::{log_standardize, mean, pearson, standardize};
pub use trend::{LinearTrend, linear_trend};

use thiserror::Error;

/// Errors from correlation computations.
#[derive(Debug, Error)]
pub enum CorrelationError {
    /// Paired series differ in length.
    #[error("Series lengths differ: {left} vs {right}")]
    LengthMismatch {
        /// Length of the first series.
        left: usize,
        /// Length of the second series.
        right: usize,
    },

    /// A logarithm was requested of a non-positive value.
    #[error("Cannot take the log of non-positive value {value}")]
    NonPositive {
        /// Offending value.
        value: f64,
    },

    /// An angle range cannot be scanned.
    #[error("Invalid angle range: {message}")]
    InvalidAngleRange {
        /// Description of what went wrong.
        message: String,
    },

    /// A significance level outside `(0, 1)`.
    #[error("Significance level {0} must lie strictly between 0 and 1")]
    InvalidSignificance(f64),

    /// A reference distribution could not be built.
    #[error("Distribution error: {message}")]
    Distribution {
        /// Description of what went wrong.
        message: String,
    },
}
