#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end tornado outbreak climatology.
//!
//! Stages, each usable on its own:
//!
//! 1. [`pipeline::prepare_events`]: normalize catalog records and tag each
//!    event with its energy dissipation.
//! 2. [`pipeline::classify`]: group events into convective days and keep
//!    the medium and big outbreak days.
//! 3. [`pipeline::plan_sampling`]: build each big day's footprint and draw
//!    the baseline days.
//! 4. [`pipeline::sample`]: fetch grids and fill the day table.
//! 5. [`pipeline::run_screens`]: correlation screens against each field.
//! 6. [`pipeline::annual_trends`]: per-year summaries and their trends.
//!
//! [`pipeline::run`] chains all of them and writes the outputs.

pub mod config;
pub mod pipeline;
pub mod report;

pub use config::AnalysisConfig;
pub use report::RunReport;

use thiserror::Error;

/// Errors that abort an analysis run.
///
/// Failures local to one day (grid unavailable, no cells in a footprint)
/// never surface here; they are recorded in the day table.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The configuration file is not valid TOML for [`AnalysisConfig`].
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration parsed but is inconsistent.
    #[error("Invalid config: {message}")]
    InvalidConfig {
        /// Description of what went wrong.
        message: String,
    },

    /// No events fall in the study interval.
    #[error("No events between {start} and {end}")]
    NoEvents {
        /// First day of the interval.
        start: chrono::NaiveDate,
        /// Last day of the interval.
        end: chrono::NaiveDate,
    },

    /// The catalog could not be read.
    #[error(transparent)]
    Ingest(#[from] outbreak_ingest::IngestError),

    /// Event normalization or the energy model rejected the data.
    #[error(transparent)]
    Energy(#[from] outbreak_energy::EnergyError),

    /// Day grouping or statistics failed.
    #[error(transparent)]
    Days(#[from] outbreak_days::DaysError),

    /// The sampling region could not be built.
    #[error(transparent)]
    Spatial(#[from] outbreak_spatial::SpatialError),

    /// Baseline selection failed.
    #[error(transparent)]
    Sampling(#[from] outbreak_environment::SamplingError),

    /// A correlation statistic could not be computed.
    #[error(transparent)]
    Correlation(#[from] outbreak_correlation::CorrelationError),

    /// Reading or writing a table failed.
    #[error(transparent)]
    Table(#[from] outbreak_table::TableError),

    /// The HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// File system access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
