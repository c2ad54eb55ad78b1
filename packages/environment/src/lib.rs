#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Environmental sampling of outbreak and baseline days.
//!
//! Fetches the gridded analysis fields of each day from a [`GridSource`]
//! (with retry), derives the sampled fields (sign-flipped inhibition,
//! bulk-shear magnitude), and reduces them over each day's footprint.
//! Days are sampled concurrently with a bounded number of in-flight
//! fetches; a day whose data is unavailable is recorded as missing rather
//! than failing the run.

pub mod baseline;
pub mod batch;
pub mod fields;
pub mod progress;
pub mod retry;
pub mod sampler;
pub mod source;

pub use baseline::{BaselineSampler, month_weights};
pub use batch::{BatchOptions, DayRequest, sample_days};
pub use fields::{FieldCatalog, ScalarField, VectorField};
pub use progress::{NullProgress, ProgressCallback, null_progress};
pub use retry::{RetryPolicy, fetch_with_retry};
pub use sampler::EnvironmentalSampler;
pub use source::{
    ArchiveWindow, DirectoryGridSource, GridSource, HttpGridSource, MemoryGridSource,
};

use chrono::NaiveDate;
use outbreak_environment_models::GridShapeError;
use outbreak_spatial::SpatialError;
use thiserror::Error;

/// Errors raised while retrieving grid data for a date.
#[derive(Debug, Error)]
pub enum GridSourceError {
    /// The source has no data for this date. Not retried.
    #[error("Grid data unavailable for {date}: {reason}")]
    Unavailable {
        /// Requested date.
        date: NaiveDate,
        /// Why the data is unavailable.
        reason: String,
    },

    /// A failure that may succeed on retry (timeout, server error).
    #[error("Transient grid source error: {message}")]
    Transient {
        /// Description of what went wrong.
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading a local grid file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The grid payload could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The grid payload had inconsistent dimensions.
    #[error("Grid shape error: {0}")]
    Shape(#[from] GridShapeError),
}

impl GridSourceError {
    /// Whether retrying the same request might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient { .. } | Self::Io(_) => true,
            Self::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
            }
            Self::Unavailable { .. } | Self::Json(_) | Self::Shape(_) => false,
        }
    }
}

/// Errors raised while sampling fields over a footprint.
#[derive(Debug, Error)]
pub enum SamplingError {
    /// No grid cell with a finite value fell inside the footprint.
    #[error("No data: {what}")]
    NoData {
        /// What had no data.
        what: String,
    },

    /// A field required by the catalog was not in the grid payload.
    #[error("Field {field} missing from grid data")]
    MissingField {
        /// Source field name.
        field: String,
    },

    /// Month weights could not be built or used.
    #[error("Invalid month weights: {message}")]
    InvalidWeights {
        /// Description of what went wrong.
        message: String,
    },

    /// The study interval ran out of eligible baseline dates.
    #[error("Drew only {drawn} of {requested} baseline days after {attempts} attempts")]
    BaselineExhausted {
        /// Requested sample size.
        requested: usize,
        /// Distinct days found.
        drawn: usize,
        /// Candidate dates tried.
        attempts: usize,
    },

    /// Grid data had inconsistent dimensions.
    #[error("Grid shape error: {0}")]
    Shape(#[from] GridShapeError),

    /// Fetching grid data failed.
    #[error(transparent)]
    Source(#[from] GridSourceError),

    /// Building the footprint failed.
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}
