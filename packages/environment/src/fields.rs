//! Derived fields sampled from raw grid payloads.
//!
//! The catalog maps the archive's field names onto the names used in the
//! day table. Scalar fields are copied (optionally sign-flipped, which is
//! how convective inhibition is stored as a positive magnitude) and vector
//! fields are collapsed to their pointwise Euclidean norm on the full grid
//! before any spatial aggregation.

use std::collections::BTreeMap;

use outbreak_environment_models::{Grid2D, GridFields, GridShapeError};
use serde::{Deserialize, Serialize};

use crate::SamplingError;

/// A field copied from one source field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarField {
    /// Name in the day table.
    pub name: String,
    /// Name in the grid payload.
    pub source: String,
    /// Flip the sign at ingestion.
    #[serde(default)]
    pub negate: bool,
}

impl ScalarField {
    fn new(name: &str, source: &str, negate: bool) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            negate,
        }
    }
}

/// Magnitude of a two-component vector field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorField {
    /// Name in the day table.
    pub name: String,
    /// Source name of the u component.
    pub u: String,
    /// Source name of the v component.
    pub v: String,
}

/// The set of fields sampled for every day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldCatalog {
    /// Fields taken directly from one source grid.
    pub scalar: Vec<ScalarField>,
    /// Magnitudes of `(u, v)` component pairs, computed per cell.
    pub vector: Vec<VectorField>,
}

impl Default for FieldCatalog {
    /// CAPE, storm-relative helicity, inhibition magnitude, and bulk shear.
    fn default() -> Self {
        Self {
            scalar: vec![
                ScalarField::new("cape", "CAPE", false),
                ScalarField::new("hlcy", "HLCY", false),
                ScalarField::new("cin", "CIN", true),
            ],
            vector: vec![VectorField {
                name: "shear".to_string(),
                u: "USTM".to_string(),
                v: "VSTM".to_string(),
            }],
        }
    }
}

impl FieldCatalog {
    /// Output field names in catalog order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.scalar
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.vector.iter().map(|f| f.name.as_str()))
            .collect()
    }

    /// Builds the sampled fields from a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::MissingField`] if a source field is absent
    /// and [`SamplingError::Shape`] if vector components differ in shape.
    pub fn prepare(&self, raw: &GridFields) -> Result<GridFields, SamplingError> {
        let mut fields = BTreeMap::new();

        for field in &self.scalar {
            let grid = lookup(raw, &field.source)?;
            let grid = if field.negate {
                grid.map(|v| -v)
            } else {
                grid.clone()
            };
            fields.insert(field.name.clone(), grid);
        }

        for field in &self.vector {
            let u = lookup(raw, &field.u)?;
            let v = lookup(raw, &field.v)?;
            fields.insert(field.name.clone(), magnitude(u, v)?);
        }

        Ok(GridFields::new(
            raw.date,
            raw.hour,
            raw.geometry.clone(),
            fields,
        )?)
    }
}

fn lookup<'a>(raw: &'a GridFields, name: &str) -> Result<&'a Grid2D, SamplingError> {
    raw.get(name).ok_or_else(|| SamplingError::MissingField {
        field: name.to_string(),
    })
}

/// Pointwise `sqrt(u² + v²)`. NaN in either component gives NaN.
///
/// # Errors
///
/// Returns [`SamplingError::Shape`] if the components differ in shape.
pub fn magnitude(u: &Grid2D, v: &Grid2D) -> Result<Grid2D, SamplingError> {
    if u.rows() != v.rows() || u.cols() != v.cols() {
        return Err(GridShapeError {
            what: "vector v component".to_string(),
            expected: u.values().len(),
            actual: v.values().len(),
        }
        .into());
    }
    let values = u
        .values()
        .iter()
        .zip(v.values())
        .map(|(a, b)| a.hypot(*b))
        .collect();
    Ok(Grid2D::new(u.rows(), u.cols(), values)?)
}
