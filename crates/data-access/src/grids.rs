//! Lookup of auxiliary staggered-grid description files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ocean_common::Dataset;
use tracing::debug;

use crate::error::{DataError, Result};

/// Configuration used when a cleaner is given none.
pub const DEFAULT_CONFIGURATION: &str = "SEA_312";

/// File name of a grid: `grid_{configuration}[_{coordinates}].nc`.
pub fn grid_file_name(configuration: &str, coordinates: Option<&str>) -> String {
    match coordinates.filter(|c| !c.is_empty()) {
        Some(coords) => format!("grid_{}_{}.nc", configuration, coords),
        None => format!("grid_{}.nc", configuration),
    }
}

/// Source of grid description datasets.
pub trait GridProvider: Send + Sync {
    fn grid(&self, configuration: &str, coordinates: Option<&str>) -> Result<Dataset>;
}

/// Grid files in a directory (the project's `GRIDS` folder).
#[derive(Debug, Clone)]
pub struct FilesystemGrids {
    dir: PathBuf,
}

impl FilesystemGrids {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl GridProvider for FilesystemGrids {
    fn grid(&self, configuration: &str, coordinates: Option<&str>) -> Result<Dataset> {
        let path = self.dir.join(grid_file_name(configuration, coordinates));
        if !path.is_file() {
            return Err(DataError::NotFound {
                searched: vec![path.clone()],
                path,
            });
        }
        debug!(path = %path.display(), "Reading grid file");
        Ok(netcdf_parser::read_dataset(&path)?)
    }
}

/// Grids held in memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct StaticGrids {
    grids: HashMap<String, Dataset>,
}

impl StaticGrids {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grid(mut self, configuration: &str, coordinates: Option<&str>, grid: Dataset) -> Self {
        self.insert(configuration, coordinates, grid);
        self
    }

    pub fn insert(&mut self, configuration: &str, coordinates: Option<&str>, grid: Dataset) {
        self.grids
            .insert(grid_file_name(configuration, coordinates), grid);
    }
}

impl GridProvider for StaticGrids {
    fn grid(&self, configuration: &str, coordinates: Option<&str>) -> Result<Dataset> {
        let name = grid_file_name(configuration, coordinates);
        self.grids.get(&name).cloned().ok_or_else(|| DataError::NotFound {
            path: PathBuf::from(&name),
            searched: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_file_name() {
        assert_eq!(grid_file_name("SEA_312", None), "grid_SEA_312.nc");
        assert_eq!(grid_file_name("SEA_312", Some("")), "grid_SEA_312.nc");
        assert_eq!(grid_file_name("SEA_312", Some("VQS")), "grid_SEA_312_VQS.nc");
    }

    #[test]
    fn test_missing_grid_file() {
        let dir = tempfile::tempdir().unwrap();
        let grids = FilesystemGrids::new(dir.path());
        assert!(matches!(
            grids.grid(DEFAULT_CONFIGURATION, None),
            Err(DataError::NotFound { .. })
        ));
    }

    #[test]
    fn test_static_grids_lookup() {
        let grids = StaticGrids::new().with_grid("SEA_312", Some("VQS"), Dataset::new());
        assert!(grids.grid("SEA_312", Some("VQS")).is_ok());
        assert!(grids.grid("SEA_312", None).is_err());
    }
}
