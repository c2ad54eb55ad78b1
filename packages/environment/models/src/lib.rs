#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Gridded field and footprint sample types.
//!
//! A grid source returns one [`GridFields`] per date: a set of named 2-D
//! scalar fields sharing a single [`GridGeometry`]. The sampler reduces
//! each field over a footprint into [`FootprintSample`]s, collected per
//! day into a [`DaySamples`] record.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Spatial reduction applied to the cells inside a footprint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Aggregation {
    /// Arithmetic mean of cell values.
    Mean,
    /// Largest cell value.
    Max,
    /// Smallest cell value.
    Min,
}

impl Aggregation {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Mean, Self::Max, Self::Min]
    }
}

/// Error returned when grid dimensions and data lengths disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridShapeError {
    /// What was being validated.
    pub what: String,
    /// Expected element count (`rows * cols`).
    pub expected: usize,
    /// Actual element count.
    pub actual: usize,
}

impl std::fmt::Display for GridShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} has {} values, expected {}",
            self.what, self.actual, self.expected
        )
    }
}

impl std::error::Error for GridShapeError {}

/// Cell-center coordinates of a row-major grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridGeometry {
    rows: usize,
    cols: usize,
    longitudes: Vec<f64>,
    latitudes: Vec<f64>,
}

impl GridGeometry {
    /// Creates a geometry from per-cell longitudes and latitudes.
    ///
    /// # Errors
    ///
    /// Returns [`GridShapeError`] if either coordinate array does not have
    /// `rows * cols` entries.
    pub fn new(
        rows: usize,
        cols: usize,
        longitudes: Vec<f64>,
        latitudes: Vec<f64>,
    ) -> Result<Self, GridShapeError> {
        let expected = rows * cols;
        for (what, len) in [("longitudes", longitudes.len()), ("latitudes", latitudes.len())] {
            if len != expected {
                return Err(GridShapeError {
                    what: what.to_string(),
                    expected,
                    actual: len,
                });
            }
        }
        Ok(Self {
            rows,
            cols,
            longitudes,
            latitudes,
        })
    }

    /// Regular longitude/latitude grid; rows follow `lats`, columns `lons`.
    #[must_use]
    pub fn regular(lons: &[f64], lats: &[f64]) -> Self {
        let mut longitudes = Vec::with_capacity(lons.len() * lats.len());
        let mut latitudes = Vec::with_capacity(lons.len() * lats.len());
        for lat in lats {
            for lon in lons {
                longitudes.push(*lon);
                latitudes.push(*lat);
            }
        }
        Self {
            rows: lats.len(),
            cols: lons.len(),
            longitudes,
            latitudes,
        }
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total cell count.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Whether the grid has no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell-center longitudes, row-major.
    #[must_use]
    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// Cell-center latitudes, row-major.
    #[must_use]
    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }
}

/// One named scalar field on a grid, row-major. Missing cells are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid2D {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Grid2D {
    /// Creates a field from row-major values.
    ///
    /// # Errors
    ///
    /// Returns [`GridShapeError`] if `values` does not have `rows * cols`
    /// entries.
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, GridShapeError> {
        if values.len() != rows * cols {
            return Err(GridShapeError {
                what: "field".to_string(),
                expected: rows * cols,
                actual: values.len(),
            });
        }
        Ok(Self { rows, cols, values })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Values, row-major.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `(row, col)`, `None` if out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.values[row * self.cols + col])
    }

    /// Applies `f` to every cell.
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            values: self.values.iter().map(|v| f(*v)).collect(),
        }
    }
}

/// All fields decoded for one date at the fixed analysis hour.
#[derive(Debug, Clone, PartialEq)]
pub struct GridFields {
    /// Analysis date.
    pub date: NaiveDate,
    /// Analysis hour (UTC).
    pub hour: u32,
    /// Shared cell geometry.
    pub geometry: Arc<GridGeometry>,
    /// Fields by name.
    pub fields: BTreeMap<String, Grid2D>,
}

impl GridFields {
    /// Creates a field set, checking every field matches the geometry.
    ///
    /// # Errors
    ///
    /// Returns [`GridShapeError`] for the first field whose shape differs
    /// from the geometry.
    pub fn new(
        date: NaiveDate,
        hour: u32,
        geometry: Arc<GridGeometry>,
        fields: BTreeMap<String, Grid2D>,
    ) -> Result<Self, GridShapeError> {
        for (name, grid) in &fields {
            if grid.rows() != geometry.rows() || grid.cols() != geometry.cols() {
                return Err(GridShapeError {
                    what: format!("field {name}"),
                    expected: geometry.len(),
                    actual: grid.values().len(),
                });
            }
        }
        Ok(Self {
            date,
            hour,
            geometry,
            fields,
        })
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Grid2D> {
        self.fields.get(name)
    }
}

/// One reduced value of one field over one day's footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintSample {
    /// Field name (e.g. `cape`).
    pub field: String,
    /// Reduction applied.
    pub aggregation: Aggregation,
    /// Reduced value.
    pub value: f64,
}

impl FootprintSample {
    /// Column name used when samples are pivoted into a table.
    #[must_use]
    pub fn column(&self) -> String {
        sample_column(&self.field, self.aggregation)
    }
}

/// Column name of a `(field, aggregation)` pair, e.g. `cape_max`.
#[must_use]
pub fn sample_column(field: &str, aggregation: Aggregation) -> String {
    format!("{field}_{aggregation}")
}

/// Whether a day's environment was sampled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SampleStatus {
    /// Every requested sample was computed.
    Sampled,
    /// Sampling failed for this day (source unavailable, empty footprint).
    Missing {
        /// Why the day has no samples.
        reason: String,
    },
    /// The date lies outside the grid archive and was never requested.
    OutOfRange,
}

impl SampleStatus {
    /// Short label: `sampled`, `missing`, or `out_of_range`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Sampled => "sampled",
            Self::Missing { .. } => "missing",
            Self::OutOfRange => "out_of_range",
        }
    }

    /// Failure reason for missing days.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Missing { reason } => Some(reason),
            Self::Sampled | Self::OutOfRange => None,
        }
    }
}

/// Whether a sampled day is an outbreak day or a baseline day.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DayKind {
    /// Day meeting the big outbreak threshold, sampled over its hull.
    Outbreak,
    /// Randomly drawn non-outbreak day, sampled over the fixed region.
    Baseline,
}

/// Environmental samples of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySamples {
    /// Calendar (convective) date.
    pub date: NaiveDate,
    /// Outbreak or baseline.
    pub kind: DayKind,
    /// Sampling outcome.
    pub status: SampleStatus,
    /// One entry per `(field, aggregation)`; empty unless sampled.
    pub samples: Vec<FootprintSample>,
}

impl DaySamples {
    /// Value of a `(field, aggregation)` sample.
    #[must_use]
    pub fn value(&self, field: &str, aggregation: Aggregation) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| s.field == field && s.aggregation == aggregation)
            .map(|s| s.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_geometry_is_row_major() {
        let geometry = GridGeometry::regular(&[-100.0, -99.0, -98.0], &[30.0, 31.0]);
        assert_eq!(geometry.rows(), 2);
        assert_eq!(geometry.cols(), 3);
        assert!((geometry.longitudes()[4] + 99.0).abs() < f64::EPSILON);
        assert!((geometry.latitudes()[4] - 31.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_mismatched_field_shape() {
        assert!(Grid2D::new(2, 2, vec![1.0, 2.0, 3.0]).is_err());

        let geometry = Arc::new(GridGeometry::regular(&[0.0, 1.0], &[0.0, 1.0]));
        let mut fields = BTreeMap::new();
        fields.insert("cape".to_string(), Grid2D::new(1, 4, vec![0.0; 4]).unwrap());
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert!(GridFields::new(date, 18, geometry, fields).is_err());
    }

    #[test]
    fn grid_lookup_is_bounds_checked() {
        let grid = Grid2D::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(grid.get(1, 0), Some(3.0));
        assert_eq!(grid.get(2, 0), None);
    }

    #[test]
    fn sample_columns_join_field_and_aggregation() {
        assert_eq!(sample_column("cape", Aggregation::Max), "cape_max");
        assert_eq!("min".parse::<Aggregation>().unwrap(), Aggregation::Min);
    }

    #[test]
    fn status_labels() {
        assert_eq!(SampleStatus::Sampled.label(), "sampled");
        let missing = SampleStatus::Missing {
            reason: "unavailable".to_string(),
        };
        assert_eq!(missing.label(), "missing");
        assert_eq!(missing.reason(), Some("unavailable"));
        assert_eq!(SampleStatus::OutOfRange.label(), "out_of_range");
    }
}
