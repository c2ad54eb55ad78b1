#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial footprints for environmental sampling.
//!
//! Projects event locations into an equal-area plane, builds the convex
//! hull of each outbreak day, decides which footprint a day is sampled
//! over, and finds the grid cells whose centers fall inside a footprint
//! using an R-tree over projected cell centers.

pub mod cells;
pub mod footprint;
pub mod hull;
pub mod projection;
pub mod region;

pub use cells::CellIndex;
pub use footprint::{Footprint, FootprintPolicy};
pub use hull::{DayHull, build_hull, hull_for_events};
pub use projection::AlbersEqualArea;
pub use region::SamplingRegion;

use thiserror::Error;

/// Errors that can occur while building footprints.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// A hull was requested for an empty point set.
    #[error("Geometry error: cannot build a footprint from zero points")]
    EmptyPointSet,

    /// A coordinate was NaN or infinite.
    #[error("Geometry error: non-finite coordinate ({x}, {y})")]
    NonFiniteCoordinate {
        /// First coordinate.
        x: f64,
        /// Second coordinate.
        y: f64,
    },

    /// A region definition could not be used.
    #[error("Invalid sampling region: {message}")]
    InvalidRegion {
        /// Description of what went wrong.
        message: String,
    },

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Reading a region file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
