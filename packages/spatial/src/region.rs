//! Fixed sampling regions for baseline (non-outbreak) days.
//!
//! The region is configurable: a longitude/latitude bounding box, or a
//! `GeoJSON` file holding one or more polygons (e.g. a union of states).

use std::path::{Path, PathBuf};

use geo::{MultiPolygon, Polygon, Rect, coord};
use geojson::GeoJson;
use serde::{Deserialize, Serialize};

use crate::{AlbersEqualArea, Footprint, SpatialError};

/// Where baseline days are sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplingRegion {
    /// Longitude/latitude box in degrees.
    BoundingBox {
        /// Western edge.
        min_lon: f64,
        /// Southern edge.
        min_lat: f64,
        /// Eastern edge.
        max_lon: f64,
        /// Northern edge.
        max_lat: f64,
    },
    /// Polygons read from a `GeoJSON` file (geometry, feature, or
    /// feature collection).
    GeoJson {
        /// Path to the file.
        path: PathBuf,
    },
}

impl Default for SamplingRegion {
    /// The contiguous United States.
    fn default() -> Self {
        Self::BoundingBox {
            min_lon: -125.0,
            min_lat: 24.5,
            max_lon: -66.9,
            max_lat: 49.4,
        }
    }
}

impl SamplingRegion {
    /// Loads the region as a longitude/latitude multipolygon.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the box is inverted, or the file cannot
    /// be read, parsed, or contains no polygons.
    pub fn load(&self) -> Result<MultiPolygon<f64>, SpatialError> {
        match self {
            Self::BoundingBox {
                min_lon,
                min_lat,
                max_lon,
                max_lat,
            } => {
                if min_lon >= max_lon || min_lat >= max_lat {
                    return Err(SpatialError::InvalidRegion {
                        message: format!(
                            "bounding box ({min_lon}, {min_lat})-({max_lon}, {max_lat}) is empty"
                        ),
                    });
                }
                let rect = Rect::new(
                    coord! { x: *min_lon, y: *min_lat },
                    coord! { x: *max_lon, y: *max_lat },
                );
                Ok(MultiPolygon(vec![densify(&rect.to_polygon(), 1.0)]))
            }
            Self::GeoJson { path } => load_geojson(path),
        }
    }

    /// Loads the region and projects it into a sampling footprint.
    ///
    /// # Errors
    ///
    /// See [`SamplingRegion::load`].
    pub fn footprint(&self, projection: &AlbersEqualArea) -> Result<Footprint, SpatialError> {
        let polygons = self.load()?;
        Ok(Footprint::Area(projection.project_multi_polygon(&polygons)))
    }
}

/// Reads polygons from a `GeoJSON` file.
///
/// # Errors
///
/// Returns [`SpatialError`] if the file cannot be read or parsed, or holds
/// no polygon geometry.
pub fn load_geojson(path: &Path) -> Result<MultiPolygon<f64>, SpatialError> {
    let text = std::fs::read_to_string(path)?;
    let polygons = parse_geojson_polygons(&text)?;
    log::info!(
        "Loaded {} sampling-region polygons from {}",
        polygons.0.len(),
        path.display()
    );
    Ok(polygons)
}

/// Collects every polygon in a `GeoJSON` document into one multipolygon.
///
/// # Errors
///
/// Returns [`SpatialError`] if the text is not valid `GeoJSON` or holds no
/// polygon geometry.
pub fn parse_geojson_polygons(text: &str) -> Result<MultiPolygon<f64>, SpatialError> {
    let geometries: Vec<geojson::Geometry> = match text.parse::<GeoJson>()? {
        GeoJson::Geometry(geometry) => vec![geometry],
        GeoJson::Feature(feature) => feature.geometry.into_iter().collect(),
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .filter_map(|f| f.geometry)
            .collect(),
    };

    let mut polygons = Vec::new();
    for geometry in geometries {
        let geometry: geo::Geometry<f64> = match geometry.try_into() {
            Ok(g) => g,
            Err(e) => {
                log::warn!("Skipping unconvertible GeoJSON geometry: {e}");
                continue;
            }
        };
        match geometry {
            geo::Geometry::Polygon(p) => polygons.push(p),
            geo::Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
            other => log::debug!("Ignoring non-polygon geometry {other:?}"),
        }
    }

    if polygons.is_empty() {
        return Err(SpatialError::InvalidRegion {
            message: "GeoJSON contains no polygons".to_string(),
        });
    }
    Ok(MultiPolygon(polygons))
}

/// Inserts vertices so no edge spans more than `step` degrees. Box edges
/// along parallels are curves once projected.
fn densify(polygon: &Polygon<f64>, step: f64) -> Polygon<f64> {
    let ring = polygon.exterior();
    let mut coords = Vec::new();
    for line in ring.lines() {
        let span = (line.end.x - line.start.x)
            .abs()
            .max((line.end.y - line.start.y).abs());
        let pieces = (span / step).ceil().max(1.0) as usize;
        for i in 0..pieces {
            let t = i as f64 / pieces as f64;
            coords.push(coord! {
                x: line.start.x + t * (line.end.x - line.start.x),
                y: line.start.y + t * (line.end.y - line.start.y),
            });
        }
    }
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    Polygon::new(coords.into(), vec![])
}
