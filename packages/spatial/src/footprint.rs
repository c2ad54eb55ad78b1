//! Sampling footprints and the policy choosing one for each day.

use geo::{BoundingRect as _, Contains as _, MultiPolygon, Point};
use rstar::AABB;
use serde::{Deserialize, Serialize};

use crate::{DayHull, SpatialError};

/// Default minimum hull area (km²) sampled as a polygon.
pub const DEFAULT_MIN_HULL_AREA_KM2: f64 = 2_500.0;

/// Default radius (km) of the disc used for hulls below the minimum area.
pub const DEFAULT_FALLBACK_RADIUS_KM: f64 = 100.0;

/// A planar region over which grid cells are aggregated.
#[derive(Debug, Clone, PartialEq)]
pub enum Footprint {
    /// Hull polygon or a fixed multi-state region.
    Area(MultiPolygon<f64>),
    /// Disc around a point, for hulls too small to hold any cell center.
    Disc {
        /// Disc center in projected meters.
        center: Point<f64>,
        /// Disc radius in meters.
        radius_m: f64,
    },
}

impl Footprint {
    /// Whether a projected point lies strictly inside the footprint.
    #[must_use]
    pub fn contains(&self, point: &Point<f64>) -> bool {
        match self {
            Self::Area(polygons) => polygons.contains(point),
            Self::Disc { center, radius_m } => {
                (point.x() - center.x()).hypot(point.y() - center.y()) < *radius_m
            }
        }
    }

    /// Axis-aligned bounding box, `None` for an empty polygon set.
    #[must_use]
    pub fn envelope(&self) -> Option<AABB<[f64; 2]>> {
        match self {
            Self::Area(polygons) => polygons.bounding_rect().map(|rect| {
                AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
            }),
            Self::Disc { center, radius_m } => Some(AABB::from_corners(
                [center.x() - radius_m, center.y() - radius_m],
                [center.x() + radius_m, center.y() + radius_m],
            )),
        }
    }

    /// Short label for logs and reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Area(_) => "area",
            Self::Disc { .. } => "disc",
        }
    }
}

/// Chooses the footprint an outbreak day is sampled over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct FootprintPolicy {
    /// Hulls at least this large (km²) are sampled as polygons.
    pub min_hull_area_km2: f64,
    /// Radius (km) of the disc around the centroid used otherwise.
    pub fallback_radius_km: f64,
}

impl Default for FootprintPolicy {
    fn default() -> Self {
        Self {
            min_hull_area_km2: DEFAULT_MIN_HULL_AREA_KM2,
            fallback_radius_km: DEFAULT_FALLBACK_RADIUS_KM,
        }
    }
}

impl FootprintPolicy {
    /// Footprint for a day's hull.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NonFiniteCoordinate`] if the hull centroid
    /// is not finite, or [`SpatialError::InvalidRegion`] if a fallback
    /// disc is needed but the radius is not positive.
    pub fn select(&self, hull: &DayHull) -> Result<Footprint, SpatialError> {
        if hull.area_km2() >= self.min_hull_area_km2 && !hull.is_degenerate() {
            return Ok(Footprint::Area(MultiPolygon(vec![hull.polygon.clone()])));
        }

        let (x, y) = (hull.centroid.x(), hull.centroid.y());
        if !x.is_finite() || !y.is_finite() {
            return Err(SpatialError::NonFiniteCoordinate { x, y });
        }
        if self.fallback_radius_km <= 0.0 {
            return Err(SpatialError::InvalidRegion {
                message: format!(
                    "hull of {:.1} km² is below the {} km² minimum and the fallback radius is {}",
                    hull.area_km2(),
                    self.min_hull_area_km2,
                    self.fallback_radius_km
                ),
            });
        }

        log::debug!(
            "Hull area {:.1} km² below {} km², sampling a {} km disc instead",
            hull.area_km2(),
            self.min_hull_area_km2,
            self.fallback_radius_km
        );
        Ok(Footprint::Disc {
            center: hull.centroid,
            radius_m: self.fallback_radius_km * 1000.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_hull;

    fn square_hull(side_m: f64) -> DayHull {
        build_hull(&[
            Point::new(0.0, 0.0),
            Point::new(side_m, 0.0),
            Point::new(side_m, side_m),
            Point::new(0.0, side_m),
        ])
        .unwrap()
    }

    #[test]
    fn large_hulls_are_sampled_as_polygons() {
        let footprint = FootprintPolicy::default()
            .select(&square_hull(100_000.0))
            .unwrap();
        assert_eq!(footprint.kind(), "area");
        assert!(footprint.contains(&Point::new(50_000.0, 50_000.0)));
        assert!(!footprint.contains(&Point::new(150_000.0, 50_000.0)));
    }

    #[test]
    fn small_and_degenerate_hulls_fall_back_to_disc() {
        let policy = FootprintPolicy::default();
        let small = policy.select(&square_hull(1_000.0)).unwrap();
        assert_eq!(small.kind(), "disc");

        let point = build_hull(&[Point::new(5.0, 5.0)]).unwrap();
        let footprint = policy.select(&point).unwrap();
        assert!(footprint.contains(&Point::new(50_000.0, 5.0)));
        assert!(!footprint.contains(&Point::new(150_000.0, 5.0)));
    }

    #[test]
    fn zero_radius_cannot_sample_degenerate_hull() {
        let policy = FootprintPolicy {
            min_hull_area_km2: 1.0,
            fallback_radius_km: 0.0,
        };
        let hull = build_hull(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).unwrap();
        assert!(matches!(
            policy.select(&hull),
            Err(SpatialError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn disc_envelope_bounds_the_disc() {
        let footprint = Footprint::Disc {
            center: Point::new(10.0, -10.0),
            radius_m: 5.0,
        };
        let envelope = footprint.envelope().unwrap();
        assert_eq!(envelope.lower(), [5.0, -15.0]);
        assert_eq!(envelope.upper(), [15.0, -5.0]);
    }
}
