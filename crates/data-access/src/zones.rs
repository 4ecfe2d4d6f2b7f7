//! Boolean masks of geographic zones on model grids.
//!
//! A zone is a polygon stored as `{zone}.csv` (columns `longitude`,
//! `latitude`) in the zones directory. Its mask on a grid is cached next to
//! it as a `uint8` Zarr array `{zone}_{grid}.zarr` of shape `(lon, lat)`.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{DataError, Result};
use crate::loaders::read_table;
use crate::paths::ProjectPaths;

/// Human-readable name of a zone code; unknown codes are returned as is.
pub fn zone_display_name(zone: &str) -> &str {
    match zone {
        "SCS" => "South China Sea",
        "SULU" => "Sulu Sea",
        "MAK" => "Makassar Strait",
        "CEL" => "Celebes Sea",
        "NORDMOL" => "Molucca Sea",
        "SUDMOL" => "Banda Sea",
        "WESTIND" => "Eastern Indian",
        other => other,
    }
}

/// Closed polygon in longitude/latitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<(f64, f64)>,
}

impl Polygon {
    pub fn new(vertices: Vec<(f64, f64)>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(DataError::invalid_config(format!(
                "a polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Self { vertices })
    }

    /// Read a polygon from a CSV file with `longitude` and `latitude` columns.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let table = read_table(path, ',', true)?;
        let lons = table.numeric("longitude")?;
        let lats = table.numeric("latitude")?;
        Self::new(lons.iter().copied().zip(lats.iter().copied()).collect())
    }

    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    /// Even-odd ray casting.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for (i, &(xi, yi)) in self.vertices.iter().enumerate() {
            let (xj, yj) = self.vertices[j];
            if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Mask of shape `(lons.len(), lats.len())`, true inside `polygon`.
///
/// Longitude rows are evaluated in parallel.
pub fn compute_mask(polygon: &Polygon, lons: &[f64], lats: &[f64]) -> Array2<bool> {
    let cells: Vec<bool> = lons
        .par_iter()
        .flat_map_iter(|&lon| lats.iter().map(move |&lat| polygon.contains(lon, lat)))
        .collect();
    Array2::from_shape_fn((lons.len(), lats.len()), |(i, j)| cells[i * lats.len() + j])
}

/// Zone polygons and their cached masks.
#[derive(Debug, Clone)]
pub struct ZoneMasks {
    dir: PathBuf,
}

impl ZoneMasks {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Zones directory of a project.
    pub fn from_paths(paths: &ProjectPaths) -> Self {
        Self::new(paths.zones())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn polygon_path(&self, zone: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", zone))
    }

    pub fn cache_path(&self, zone: &str, grid_name: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.zarr", zone, grid_name))
    }

    pub fn polygon(&self, zone: &str) -> Result<Polygon> {
        let path = self.polygon_path(zone);
        if !path.is_file() {
            return Err(DataError::NotFound {
                searched: vec![path.clone()],
                path,
            });
        }
        Polygon::from_csv(&path)
    }

    /// Mask of `zone` on the grid `grid_name` with the given axes.
    ///
    /// Reads the cached mask when it exists and has the right shape;
    /// otherwise computes it from the polygon and stores it.
    pub fn mask(&self, zone: &str, grid_name: &str, lons: &[f64], lats: &[f64]) -> Result<Array2<bool>> {
        let cache = self.cache_path(zone, grid_name);
        let shape = [lons.len(), lats.len()];

        if cache.exists() {
            let cached = zarr_store::read_array(&cache)?;
            if cached.shape() == shape {
                debug!(zone = %zone, grid = %grid_name, "Zone mask cache hit");
                let values = Array2::from_shape_vec((shape[0], shape[1]), cached.values())
                    .map_err(ocean_common::DatasetError::from)?;
                return Ok(values.mapv(|v| v != 0.0));
            }
            warn!(
                zone = %zone,
                grid = %grid_name,
                cached = ?cached.shape(),
                expected = ?shape,
                "Cached zone mask has the wrong shape, recomputing"
            );
            std::fs::remove_dir_all(&cache)?;
        }

        let polygon = self.polygon(zone)?;
        let mask = compute_mask(&polygon, lons, lats);
        std::fs::create_dir_all(&self.dir)?;
        zarr_store::write_mask(&cache, mask.view(), ["lon", "lat"])?;

        info!(
            zone = %zone,
            name = zone_display_name(zone),
            grid = %grid_name,
            cells = mask.iter().filter(|&&inside| inside).count(),
            "Computed zone mask"
        );
        Ok(mask)
    }
}
