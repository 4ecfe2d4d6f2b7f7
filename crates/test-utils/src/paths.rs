//! Scratch project trees for tests that touch the filesystem.
//!
//! A [`ScratchProject`] mirrors the layout of a real project: a `conf/`
//! directory with the data-source catalogs and a `data/` work directory with
//! its processing levels. Everything lives in a temporary directory that is
//! removed on drop.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Processing-level directories created under the work data root.
pub const LEVELS: [&str; 3] = ["01_raw", "02_intermediate", "03_primary"];

/// A temporary project tree.
pub struct ScratchProject {
    dir: TempDir,
}

impl ScratchProject {
    /// Create the tree: `conf/data_sources`, `data/{01_raw,02_intermediate,03_primary}`,
    /// `data/01_raw/GRIDS` and `data/01_raw/ZONES`.
    pub fn new() -> Self {
        let dir = temp_test_dir_with_prefix("ocean_project_");
        let project = Self { dir };
        for level in LEVELS {
            project.create_dir(&format!("data/{}", level));
        }
        project.create_dir("data/01_raw/GRIDS");
        project.create_dir("data/01_raw/ZONES");
        project.create_dir("conf/data_sources");
        project
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Work data root (`<root>/data`).
    pub fn data_root(&self) -> PathBuf {
        self.root().join("data")
    }

    pub fn raw(&self) -> PathBuf {
        self.data_root().join("01_raw")
    }

    pub fn grids(&self) -> PathBuf {
        self.raw().join("GRIDS")
    }

    pub fn zones(&self) -> PathBuf {
        self.raw().join("ZONES")
    }

    /// Data-source catalog directory (`<root>/conf/data_sources`).
    pub fn catalog_dir(&self) -> PathBuf {
        self.root().join("conf").join("data_sources")
    }

    /// Create a directory relative to the root, with its parents.
    pub fn create_dir(&self, relative: &str) -> PathBuf {
        let path = self.root().join(relative);
        std::fs::create_dir_all(&path).expect("Failed to create scratch directory");
        path
    }

    /// Write a file relative to the root, creating parent directories.
    pub fn write_file(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create scratch directory");
        }
        std::fs::write(&path, contents).expect("Failed to write scratch file");
        path
    }

    /// Write a catalog file into `conf/data_sources`.
    pub fn write_catalog(&self, file_name: &str, yaml: &str) -> PathBuf {
        self.write_file(&format!("conf/data_sources/{}", file_name), yaml)
    }
}

impl Default for ScratchProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a temporary directory with a specific prefix.
pub fn temp_test_dir_with_prefix(prefix: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temporary test directory")
}
