//! Filesystem layout of a project.
//!
//! Every directory is derived from two roots: the project root (sources,
//! configuration, figures, logs) and the work data root (data by processing
//! level). Both can be set through the environment.

use std::path::{Path, PathBuf};

/// Environment variable holding the project root.
pub const PROJECT_ROOT_ENV: &str = "OCEAN_PROJECT_ROOT";
/// Environment variable holding the work data root.
pub const DATA_ROOT_ENV: &str = "OCEAN_DATA_ROOT";

/// Named directories of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    project_root: PathBuf,
    work_data: PathBuf,
}

impl ProjectPaths {
    pub fn new(project_root: impl Into<PathBuf>, work_data: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            work_data: work_data.into(),
        }
    }

    /// Project rooted at `project_root` with work data in `<root>/data`.
    pub fn at(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let work_data = project_root.join("data");
        Self::new(project_root, work_data)
    }

    /// Roots from `OCEAN_PROJECT_ROOT` (default: current directory) and
    /// `OCEAN_DATA_ROOT` (default: `<root>/data`).
    pub fn from_env() -> std::io::Result<Self> {
        let project_root = match std::env::var(PROJECT_ROOT_ENV) {
            Ok(val) if !val.is_empty() => PathBuf::from(val),
            _ => std::env::current_dir()?,
        };
        let mut paths = Self::at(project_root);
        if let Ok(val) = std::env::var(DATA_ROOT_ENV) {
            if !val.is_empty() {
                paths.work_data = PathBuf::from(val);
            }
        }
        Ok(paths)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn work_data(&self) -> &Path {
        &self.work_data
    }

    pub fn source(&self) -> PathBuf {
        self.project_root.join("src")
    }

    pub fn figures(&self) -> PathBuf {
        self.project_root.join("figures")
    }

    pub fn logs(&self) -> PathBuf {
        self.project_root.join("logs")
    }

    pub fn config(&self) -> PathBuf {
        self.project_root.join("conf")
    }

    /// Directory of the data-source catalogs.
    pub fn catalog_dir(&self) -> PathBuf {
        self.config().join("data_sources")
    }

    pub fn styles(&self) -> PathBuf {
        self.source().join("plotting").join("styles")
    }

    pub fn raw(&self) -> PathBuf {
        self.work_data.join("01_raw")
    }

    pub fn intermediate(&self) -> PathBuf {
        self.work_data.join("02_intermediate")
    }

    pub fn primary(&self) -> PathBuf {
        self.work_data.join("03_primary")
    }

    /// Staggered grid description files.
    pub fn grids(&self) -> PathBuf {
        self.raw().join("GRIDS")
    }

    /// Zone polygons and cached zone masks.
    pub fn zones(&self) -> PathBuf {
        self.raw().join("ZONES")
    }

    /// Roots tried, in order, when resolving a logical data path.
    pub fn search_roots(&self) -> Vec<PathBuf> {
        vec![
            PathBuf::new(),
            self.work_data.clone(),
            self.raw(),
            self.intermediate(),
            self.primary(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = ProjectPaths::new("/project", "/scratch/data");
        assert_eq!(paths.raw(), PathBuf::from("/scratch/data/01_raw"));
        assert_eq!(paths.grids(), PathBuf::from("/scratch/data/01_raw/GRIDS"));
        assert_eq!(paths.zones(), PathBuf::from("/scratch/data/01_raw/ZONES"));
        assert_eq!(paths.catalog_dir(), PathBuf::from("/project/conf/data_sources"));
        assert_eq!(paths.styles(), PathBuf::from("/project/src/plotting/styles"));
    }

    #[test]
    fn test_search_roots_order() {
        let paths = ProjectPaths::at("/project");
        let roots = paths.search_roots();
        assert_eq!(roots[0], PathBuf::new());
        assert_eq!(roots[1], PathBuf::from("/project/data"));
        assert_eq!(roots[4], PathBuf::from("/project/data/03_primary"));
    }
}
