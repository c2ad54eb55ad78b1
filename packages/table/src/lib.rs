#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tabular persistence for outbreak analysis.
//!
//! The day table holds one row per sampled day (outbreak or baseline) with
//! its energy statistics, footprint, sampling status, and every footprint
//! sample pivoted into a `{field}_{aggregation}` column. It is written as
//! CSV so later runs can screen correlations without re-fetching grids.

pub mod day_table;
pub mod export;
pub mod paths;

pub use day_table::{DayRecord, DayTable};
pub use export::{write_annual_summaries, write_screen_profile};

use thiserror::Error;

/// Errors reading or writing tables.
#[derive(Debug, Error)]
pub enum TableError {
    /// CSV encoding or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File system access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is absent from the header.
    #[error("Missing column {0}")]
    MissingColumn(&'static str),

    /// A cell could not be parsed.
    #[error("Row {row}, column {column}: cannot parse {value:?}")]
    InvalidValue {
        /// 1-based data row.
        row: usize,
        /// Column name.
        column: String,
        /// Cell text.
        value: String,
    },
}
