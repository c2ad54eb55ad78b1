//! Albers equal-area conic projection on the authalic sphere.
//!
//! Hull areas and footprint containment are computed in this plane so
//! that areas are comparable across latitudes. The default parameters are
//! the contiguous-US standard parallels (29.5°N, 45.5°N) with origin at
//! 23°N, 96°W.

use geo::{Coord, MapCoords as _, MultiPolygon, Point};

/// Authalic radius of the GRS80 ellipsoid in meters.
pub const AUTHALIC_RADIUS_M: f64 = 6_371_007.2;

/// Spherical Albers equal-area conic projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlbersEqualArea {
    lon0: f64,
    n: f64,
    c: f64,
    rho0: f64,
    radius: f64,
}

impl Default for AlbersEqualArea {
    fn default() -> Self {
        Self::conus()
    }
}

impl AlbersEqualArea {
    /// Projection with the given standard parallels and origin, in degrees.
    #[must_use]
    pub fn new(lat1: f64, lat2: f64, lat0: f64, lon0: f64) -> Self {
        let (phi1, phi2, phi0) = (lat1.to_radians(), lat2.to_radians(), lat0.to_radians());
        let n = (phi1.sin() + phi2.sin()) / 2.0;
        let c = phi1.cos().powi(2) + 2.0 * n * phi1.sin();
        let rho0 = AUTHALIC_RADIUS_M * (c - 2.0 * n * phi0.sin()).sqrt() / n;
        Self {
            lon0: lon0.to_radians(),
            n,
            c,
            rho0,
            radius: AUTHALIC_RADIUS_M,
        }
    }

    /// Contiguous-US parameters.
    #[must_use]
    pub fn conus() -> Self {
        Self::new(29.5, 45.5, 23.0, -96.0)
    }

    /// Projects a longitude/latitude pair (degrees) to planar meters.
    #[must_use]
    pub fn project(&self, lon: f64, lat: f64) -> Coord<f64> {
        let rho = self.radius * (self.c - 2.0 * self.n * lat.to_radians().sin()).sqrt() / self.n;
        let theta = self.n * (lon.to_radians() - self.lon0);
        Coord {
            x: rho * theta.sin(),
            y: self.rho0 - rho * theta.cos(),
        }
    }

    /// Projects a longitude/latitude point.
    #[must_use]
    pub fn project_point(&self, point: Point<f64>) -> Point<f64> {
        Point::from(self.project(point.x(), point.y()))
    }

    /// Projects every vertex of a longitude/latitude multipolygon.
    #[must_use]
    pub fn project_multi_polygon(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        geometry.map_coords(|c| self.project(c.x, c.y))
    }
}
