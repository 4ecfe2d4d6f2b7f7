//! Resolve, load and clean in one call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ocean_common::Payload;
use tracing::debug;

use crate::cleaners::{get_cleaner, Cleaner, CleaningStrategy};
use crate::config::{CleaningOptions, LoadOptions, SourceDescriptor};
use crate::error::Result;
use crate::grids::{FilesystemGrids, GridProvider};
use crate::loaders::{get_loader, FileFormat, Loader};
use crate::paths::ProjectPaths;
use crate::resolve::resolve;

/// A loader and a cleaner bound to their options.
///
/// `get` runs path resolution, loading and cleaning, stopping at the first
/// error.
pub struct DataGetter {
    loader: Box<dyn Loader>,
    cleaner: Box<dyn Cleaner>,
    loading: LoadOptions,
    cleaning: CleaningOptions,
    search_roots: Vec<PathBuf>,
    grids: Arc<dyn GridProvider>,
}

impl DataGetter {
    /// Build a getter from loader and cleaner tags.
    ///
    /// Search roots and the grid directory default to the project layout
    /// taken from the environment.
    pub fn new(
        file_type: &str,
        cleaning: Option<&str>,
        loading_options: LoadOptions,
        cleaning_options: CleaningOptions,
    ) -> Result<Self> {
        let format = FileFormat::from_tag(file_type)?;
        let strategy = cleaning.map(CleaningStrategy::from_tag).transpose()?;
        let paths = ProjectPaths::from_env()?;
        Ok(Self::build(format, strategy, loading_options, cleaning_options, &paths))
    }

    /// Build a getter for a catalog entry within `paths`.
    pub fn from_descriptor(descriptor: &SourceDescriptor, paths: &ProjectPaths) -> Result<Self> {
        Ok(Self::build(
            descriptor.format()?,
            descriptor.strategy()?,
            descriptor.loading_kwargs.clone(),
            descriptor.cleaning_kwargs.clone(),
            paths,
        ))
    }

    fn build(
        format: FileFormat,
        strategy: Option<CleaningStrategy>,
        loading: LoadOptions,
        cleaning: CleaningOptions,
        paths: &ProjectPaths,
    ) -> Self {
        Self {
            loader: get_loader(format),
            cleaner: get_cleaner(strategy),
            loading,
            cleaning,
            search_roots: paths.search_roots(),
            grids: Arc::new(FilesystemGrids::new(paths.grids())),
        }
    }

    pub fn with_search_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.search_roots = roots;
        self
    }

    pub fn with_grids(mut self, grids: Arc<dyn GridProvider>) -> Self {
        self.grids = grids;
        self
    }

    pub fn format(&self) -> FileFormat {
        self.loader.format()
    }

    pub fn cleaner_name(&self) -> &'static str {
        self.cleaner.name()
    }

    pub fn search_roots(&self) -> &[PathBuf] {
        &self.search_roots
    }

    pub fn loading_options(&self) -> &LoadOptions {
        &self.loading
    }

    pub fn cleaning_options(&self) -> &CleaningOptions {
        &self.cleaning
    }

    /// Adjust loader options after construction.
    pub fn loading_options_mut(&mut self) -> &mut LoadOptions {
        &mut self.loading
    }

    /// Adjust cleaner options after construction.
    pub fn cleaning_options_mut(&mut self) -> &mut CleaningOptions {
        &mut self.cleaning
    }

    /// Resolve `logical_path`, load it and clean the result.
    pub fn get(&self, logical_path: impl AsRef<Path>, filter_pattern: &str) -> Result<Payload> {
        let path = resolve(logical_path, &self.search_roots)?;
        debug!(
            path = %path.display(),
            loader = %self.loader.format(),
            cleaner = self.cleaner.name(),
            pattern = %filter_pattern,
            "Fetching data"
        );

        let raw = self.loader.load(&path, filter_pattern, &self.loading)?;
        self.cleaner.clean(raw, &self.cleaning, self.grids.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::grids::StaticGrids;
    use test_utils::{ostia_sst, ScratchProject};

    fn getter(file_type: &str, cleaning: Option<&str>, project: &ScratchProject) -> DataGetter {
        let paths = ProjectPaths::at(project.root());
        DataGetter::build(
            FileFormat::from_tag(file_type).unwrap(),
            cleaning.map(|c| CleaningStrategy::from_tag(c).unwrap()),
            LoadOptions::default(),
            CleaningOptions::default(),
            &paths,
        )
    }

    #[test]
    fn test_unknown_tags() {
        assert!(matches!(
            DataGetter::new("grib", None, LoadOptions::default(), CleaningOptions::default()),
            Err(DataError::UnknownFormat { .. })
        ));
        assert!(matches!(
            DataGetter::new("netcdf", Some("mercator"), LoadOptions::default(), CleaningOptions::default()),
            Err(DataError::UnknownStrategy { .. })
        ));
    }

    #[test]
    fn test_get_resolves_under_raw() {
        let project = ScratchProject::new();
        let file = project.raw().join("OSTIA").join("sst.nc");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        netcdf_parser::write_dataset(&file, &ostia_sst(&[300.15])).unwrap();

        let payload = getter("netcdf", Some("ostia"), &project)
            .get("OSTIA/sst.nc", "")
            .unwrap();
        let tem = payload.as_grid().unwrap().get("tem").unwrap().values();
        test_utils::assert_approx_eq!(tem[0], 27.0, 1e-9);
    }

    #[test]
    fn test_get_missing_path() {
        let project = ScratchProject::new();
        let result = getter("netcdf", None, &project).get("OSTIA/absent.nc", "");
        match result {
            Err(DataError::NotFound { searched, .. }) => assert_eq!(searched.len(), 6),
            other => panic!("expected NotFound, got {:?}", other.map(|p| p.kind())),
        }
    }

    #[test]
    fn test_options_can_be_adjusted() {
        let project = ScratchProject::new();
        let mut getter = getter("mfd", Some("sea312"), &project)
            .with_grids(Arc::new(StaticGrids::new()))
            .with_search_roots(vec![project.raw()]);
        getter.loading_options_mut().concat_dim = Some("time_counter".to_string());
        getter.cleaning_options_mut().configuration = Some("SEA_312".to_string());

        assert_eq!(getter.format(), FileFormat::MultiFile);
        assert_eq!(getter.cleaner_name(), "sea312");
        assert_eq!(getter.search_roots(), &[project.raw()]);
        assert_eq!(getter.loading_options().concat_dim.as_deref(), Some("time_counter"));
        assert_eq!(getter.cleaning_options().configuration.as_deref(), Some("SEA_312"));
    }
}
