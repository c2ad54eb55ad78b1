//! R-tree over projected grid-cell centers.

use geo::Point;
use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::{AlbersEqualArea, Footprint};

type CellCenter = GeomWithData<[f64; 2], usize>;

/// Spatial index of grid-cell centers, keyed by flat cell index.
///
/// Built once per grid geometry and queried for every footprint sampled
/// on that grid.
pub struct CellIndex {
    tree: RTree<CellCenter>,
    cells: usize,
}

impl CellIndex {
    /// Indexes cell centers given as parallel longitude/latitude slices.
    /// Cells with non-finite coordinates are left out of the index.
    #[must_use]
    pub fn new(longitudes: &[f64], latitudes: &[f64], projection: &AlbersEqualArea) -> Self {
        let entries: Vec<CellCenter> = longitudes
            .iter()
            .zip(latitudes)
            .enumerate()
            .filter(|(_, (lon, lat))| lon.is_finite() && lat.is_finite())
            .map(|(i, (lon, lat))| {
                let c = projection.project(*lon, *lat);
                GeomWithData::new([c.x, c.y], i)
            })
            .collect();
        let cells = longitudes.len().min(latitudes.len());
        log::debug!("Indexed {} of {cells} grid cell centers", entries.len());
        Self {
            tree: RTree::bulk_load(entries),
            cells,
        }
    }

    /// Number of cells in the grid (indexed or not).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.cells
    }

    /// Whether the grid has no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cells == 0
    }

    /// Flat indices of the cells whose centers fall inside `footprint`,
    /// in ascending order.
    #[must_use]
    pub fn cells_within(&self, footprint: &Footprint) -> Vec<usize> {
        let Some(envelope) = footprint.envelope() else {
            return Vec::new();
        };
        let mut cells: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .filter(|cell| {
                let [x, y] = *cell.geom();
                footprint.contains(&Point::new(x, y))
            })
            .map(|cell| cell.data)
            .collect();
        cells.sort_unstable();
        cells
    }
}

#[cfg(test)]
mod tests {
    use geo::MultiPolygon;

    use super::*;
    use crate::SamplingRegion;

    fn lat_lon_grid() -> (Vec<f64>, Vec<f64>) {
        let mut lons = Vec::new();
        let mut lats = Vec::new();
        for lat in 30..=40 {
            for lon in -105..=-90 {
                lons.push(f64::from(lon));
                lats.push(f64::from(lat));
            }
        }
        (lons, lats)
    }

    #[test]
    fn selects_cells_inside_a_region() {
        let proj = AlbersEqualArea::conus();
        let (lons, lats) = lat_lon_grid();
        let index = CellIndex::new(&lons, &lats, &proj);

        let region = SamplingRegion::BoundingBox {
            min_lon: -100.5,
            min_lat: 34.5,
            max_lon: -97.5,
            max_lat: 36.5,
        };
        let cells = index.cells_within(&region.footprint(&proj).unwrap());

        // Longitudes -100..=-98 and latitudes 35..=36.
        assert_eq!(cells.len(), 6);
        for i in cells {
            assert!((-100.0..=-98.0).contains(&lons[i]));
            assert!((35.0..=36.0).contains(&lats[i]));
        }
    }

    #[test]
    fn disc_selects_nearby_cells() {
        let proj = AlbersEqualArea::conus();
        let (lons, lats) = lat_lon_grid();
        let index = CellIndex::new(&lons, &lats, &proj);

        let center = Point::from(proj.project(-97.0, 35.0));
        let cells = index.cells_within(&Footprint::Disc {
            center,
            radius_m: 50_000.0,
        });
        assert_eq!(cells.len(), 1);
        assert!((lons[cells[0]] + 97.0).abs() < 1e-12);
        assert!((lats[cells[0]] - 35.0).abs() < 1e-12);
    }

    #[test]
    fn empty_footprint_selects_nothing() {
        let proj = AlbersEqualArea::conus();
        let (lons, lats) = lat_lon_grid();
        let index = CellIndex::new(&lons, &lats, &proj);
        assert!(
            index
                .cells_within(&Footprint::Area(MultiPolygon(vec![])))
                .is_empty()
        );
    }

    #[test]
    fn skips_non_finite_cells() {
        let proj = AlbersEqualArea::conus();
        let index = CellIndex::new(&[-97.0, f64::NAN], &[35.0, 35.0], &proj);
        assert_eq!(index.len(), 2);
        let cells = index.cells_within(&Footprint::Disc {
            center: Point::from(proj.project(-97.0, 35.0)),
            radius_m: 1_000_000.0,
        });
        assert_eq!(cells, vec![0]);
    }
}
