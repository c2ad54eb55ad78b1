//! Footprint reductions of gridded fields.

use outbreak_environment_models::{Aggregation, FootprintSample, GridFields, GridShapeError};
use outbreak_spatial::{CellIndex, Footprint};

use crate::SamplingError;

/// Reduces every field of a day over the cells inside a footprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentalSampler {
    aggregations: Vec<Aggregation>,
}

impl Default for EnvironmentalSampler {
    fn default() -> Self {
        Self::new(Aggregation::all().to_vec())
    }
}

impl EnvironmentalSampler {
    /// Sampler producing one value per field for each of `aggregations`.
    #[must_use]
    pub const fn new(aggregations: Vec<Aggregation>) -> Self {
        Self { aggregations }
    }

    /// Aggregations applied over each footprint, in output order.
    #[must_use]
    pub fn aggregations(&self) -> &[Aggregation] {
        &self.aggregations
    }

    /// One sample per `(field, aggregation)`, fields in name order.
    ///
    /// Cells are those whose centers lie inside `footprint`; NaN cells are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::NoData`] if no cell center falls inside the
    /// footprint or a field has no finite value there, and
    /// [`SamplingError::Shape`] if `index` was built for another grid.
    pub fn sample(
        &self,
        fields: &GridFields,
        index: &CellIndex,
        footprint: &Footprint,
    ) -> Result<Vec<FootprintSample>, SamplingError> {
        if index.len() != fields.geometry.len() {
            return Err(GridShapeError {
                what: "cell index".to_string(),
                expected: fields.geometry.len(),
                actual: index.len(),
            }
            .into());
        }

        let cells = index.cells_within(footprint);
        if cells.is_empty() {
            return Err(SamplingError::NoData {
                what: format!("no grid cells inside {} footprint", footprint.kind()),
            });
        }
        log::trace!(
            "{} of {} cells inside {} footprint on {}",
            cells.len(),
            index.len(),
            footprint.kind(),
            fields.date
        );

        let mut samples = Vec::with_capacity(fields.fields.len() * self.aggregations.len());
        for (name, grid) in &fields.fields {
            for aggregation in &self.aggregations {
                let value = aggregate(grid.values(), &cells, *aggregation).ok_or_else(|| {
                    SamplingError::NoData {
                        what: format!("{name} has no finite values inside footprint"),
                    }
                })?;
                samples.push(FootprintSample {
                    field: name.clone(),
                    aggregation: *aggregation,
                    value,
                });
            }
        }
        Ok(samples)
    }
}

/// Reduces the finite values at `cells`; `None` if there are none.
#[must_use]
pub fn aggregate(values: &[f64], cells: &[usize], aggregation: Aggregation) -> Option<f64> {
    let mut finite = cells
        .iter()
        .filter_map(|i| values.get(*i).copied())
        .filter(|v| v.is_finite())
        .peekable();
    finite.peek()?;

    Some(match aggregation {
        Aggregation::Mean => {
            let (sum, count) = finite.fold((0.0, 0_u32), |(s, n), v| (s + v, n + 1));
            sum / f64::from(count)
        }
        Aggregation::Max => finite.fold(f64::NEG_INFINITY, f64::max),
        Aggregation::Min => finite.fold(f64::INFINITY, f64::min),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use geo::Point;
    use outbreak_environment_models::{Grid2D, GridGeometry};
    use outbreak_spatial::{AlbersEqualArea, SamplingRegion};

    use super::*;

    fn day_fields() -> GridFields {
        let lons: Vec<f64> = (-105..=-90).map(f64::from).collect();
        let lats: Vec<f64> = (30..=40).map(f64::from).collect();
        let geometry = GridGeometry::regular(&lons, &lats);
        // cape = 100 * (lon + 110), hlcy = lat.
        let cape: Vec<f64> = geometry
            .longitudes()
            .iter()
            .map(|lon| 100.0 * (lon + 110.0))
            .collect();
        let mut hlcy = geometry.latitudes().to_vec();
        hlcy[0] = f64::NAN;
        let mut fields = BTreeMap::new();
        fields.insert(
            "cape".to_string(),
            Grid2D::new(geometry.rows(), geometry.cols(), cape).unwrap(),
        );
        fields.insert(
            "hlcy".to_string(),
            Grid2D::new(geometry.rows(), geometry.cols(), hlcy).unwrap(),
        );
        GridFields::new(
            NaiveDate::from_ymd_opt(2011, 4, 27).unwrap(),
            18,
            Arc::new(geometry),
            fields,
        )
        .unwrap()
    }

    fn index(fields: &GridFields, proj: &AlbersEqualArea) -> CellIndex {
        CellIndex::new(fields.geometry.longitudes(), fields.geometry.latitudes(), proj)
    }

    #[test]
    fn aggregates_cells_inside_region() {
        let proj = AlbersEqualArea::conus();
        let fields = day_fields();
        let region = SamplingRegion::BoundingBox {
            min_lon: -100.5,
            min_lat: 34.5,
            max_lon: -97.5,
            max_lat: 36.5,
        };
        let footprint = region.footprint(&proj).unwrap();
        let samples = EnvironmentalSampler::default()
            .sample(&fields, &index(&fields, &proj), &footprint)
            .unwrap();
        assert_eq!(samples.len(), 6);

        let get = |field: &str, agg: Aggregation| {
            samples
                .iter()
                .find(|s| s.field == field && s.aggregation == agg)
                .unwrap()
                .value
        };
        // Longitudes -100..=-98 give cape 1000, 1100, 1200.
        assert!((get("cape", Aggregation::Mean) - 1100.0).abs() < 1e-9);
        assert!((get("cape", Aggregation::Max) - 1200.0).abs() < 1e-9);
        assert!((get("cape", Aggregation::Min) - 1000.0).abs() < 1e-9);
        assert!((get("hlcy", Aggregation::Mean) - 35.5).abs() < 1e-9);
        assert_eq!(samples[0].column(), "cape_mean");
    }

    #[test]
    fn empty_footprint_is_no_data() {
        let proj = AlbersEqualArea::conus();
        let fields = day_fields();
        let footprint = Footprint::Disc {
            center: Point::from(proj.project(-80.0, 45.0)),
            radius_m: 10_000.0,
        };
        let result = EnvironmentalSampler::default().sample(&fields, &index(&fields, &proj), &footprint);
        assert!(matches!(result, Err(SamplingError::NoData { .. })));
    }

    #[test]
    fn all_nan_field_is_no_data() {
        let proj = AlbersEqualArea::conus();
        let fields = day_fields();
        // Only the south-west corner cell, whose hlcy is NaN.
        let footprint = Footprint::Disc {
            center: Point::from(proj.project(-105.0, 30.0)),
            radius_m: 20_000.0,
        };
        let result = EnvironmentalSampler::new(vec![Aggregation::Max]).sample(
            &fields,
            &index(&fields, &proj),
            &footprint,
        );
        assert!(matches!(result, Err(SamplingError::NoData { ref what }) if what.starts_with("hlcy")));
    }

    #[test]
    fn aggregate_skips_nan() {
        let values = [1.0, f64::NAN, 5.0, 3.0];
        assert_eq!(aggregate(&values, &[0, 1, 2], Aggregation::Mean), Some(3.0));
        assert_eq!(aggregate(&values, &[0, 1, 2, 3], Aggregation::Max), Some(5.0));
        assert_eq!(aggregate(&values, &[1], Aggregation::Min), None);
        assert_eq!(aggregate(&values, &[], Aggregation::Mean), None);
    }
}
