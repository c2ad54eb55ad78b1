//! Convex hull, area, and centroid of an outbreak day's event locations.

use geo::{Area as _, Centroid as _, ConvexHull as _, MultiPoint, Point, Polygon};
use outbreak_event_models::TaggedEvent;

use crate::{AlbersEqualArea, SpatialError};

/// Hull of one day's projected event locations.
///
/// One point gives a zero-area polygon at that point and two points (or
/// any collinear set) give a zero-area polygon along the segment. Both are
/// valid hulls.
#[derive(Debug, Clone, PartialEq)]
pub struct DayHull {
    /// Closed hull polygon in projected meters.
    pub polygon: Polygon<f64>,
    /// Unsigned polygon area in square meters.
    pub area_m2: f64,
    /// Area-weighted centroid of the hull polygon (falls back to the
    /// segment midpoint or the point for degenerate hulls).
    pub centroid: Point<f64>,
    /// Number of points the hull was built from.
    pub point_count: usize,
}

impl DayHull {
    /// Hull area in square kilometers.
    #[must_use]
    pub fn area_km2(&self) -> f64 {
        self.area_m2 / 1e6
    }

    /// Whether the hull encloses no area.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.area_m2 <= 0.0
    }
}

/// Builds the convex hull of planar points.
///
/// # Errors
///
/// Returns [`SpatialError::EmptyPointSet`] for an empty slice and
/// [`SpatialError::NonFiniteCoordinate`] if any coordinate is NaN or
/// infinite.
pub fn build_hull(points: &[Point<f64>]) -> Result<DayHull, SpatialError> {
    if points.is_empty() {
        return Err(SpatialError::EmptyPointSet);
    }
    if let Some(bad) = points.iter().find(|p| !p.x().is_finite() || !p.y().is_finite()) {
        return Err(SpatialError::NonFiniteCoordinate {
            x: bad.x(),
            y: bad.y(),
        });
    }

    let polygon = MultiPoint::from(points.to_vec()).convex_hull();
    let area_m2 = polygon.unsigned_area();
    let centroid = polygon.centroid().unwrap_or(points[0]);

    Ok(DayHull {
        polygon,
        area_m2,
        centroid,
        point_count: points.len(),
    })
}

/// Projects each event's touchdown point and builds the day's hull.
///
/// # Errors
///
/// See [`build_hull`].
pub fn hull_for_events(
    events: &[TaggedEvent],
    projection: &AlbersEqualArea,
) -> Result<DayHull, SpatialError> {
    let points: Vec<Point<f64>> = events
        .iter()
        .map(|e| Point::from(projection.project(e.event.longitude, e.event.latitude)))
        .collect();
    build_hull(&points)
}
