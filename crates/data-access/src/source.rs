//! Named data sources with lazily loaded, cached payloads.
//!
//! A [`DataSource`] is either unloaded or holds the cleaned payload of its
//! last fetch. [`GriddedSource`] adds memoised horizontal coordinates per
//! staggered-grid placement.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ocean_common::{Dataset, Payload, Placement, Variable};
use tracing::{debug, info};

use crate::config::{DataKind, SourceDescriptor};
use crate::error::{DataError, Result};
use crate::getter::DataGetter;
use crate::grids::GridProvider;
use crate::paths::ProjectPaths;

/// Cache state of a source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceState {
    Unloaded,
    Loaded(Payload),
}

/// One catalog entry together with its cached data.
#[derive(Clone)]
pub struct DataSource {
    descriptor: SourceDescriptor,
    paths: Arc<ProjectPaths>,
    grids: Option<Arc<dyn GridProvider>>,
    state: SourceState,
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.descriptor.name)
            .field("file_type", &self.descriptor.file_type)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl DataSource {
    pub fn new(descriptor: SourceDescriptor, paths: Arc<ProjectPaths>) -> Self {
        Self {
            descriptor,
            paths,
            grids: None,
            state: SourceState::Unloaded,
        }
    }

    /// Use `grids` instead of the grid files of the project.
    pub fn with_grids(mut self, grids: Arc<dyn GridProvider>) -> Self {
        self.grids = Some(grids);
        self
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, SourceState::Loaded(_))
    }

    /// The cached payload; `NotLoaded` before the first fetch.
    pub fn payload(&self) -> Result<&Payload> {
        match &self.state {
            SourceState::Loaded(payload) => Ok(payload),
            SourceState::Unloaded => Err(DataError::NotLoaded(self.descriptor.name.clone())),
        }
    }

    /// The cached payload as a gridded dataset.
    pub fn dataset(&self) -> Result<&Dataset> {
        let payload = self.payload()?;
        payload.as_grid().ok_or_else(|| {
            DataError::invalid_config(format!(
                "data source '{}' holds a {}, not gridded data",
                self.descriptor.name,
                payload.kind()
            ))
        })
    }

    /// Getter configured from the descriptor.
    pub fn getter(&self) -> Result<DataGetter> {
        let getter = DataGetter::from_descriptor(&self.descriptor, &self.paths)?;
        Ok(match &self.grids {
            Some(grids) => getter.with_grids(Arc::clone(grids)),
            None => getter,
        })
    }

    /// Fetch the data, replacing whatever was cached.
    pub fn get_data(&mut self, filter_pattern: &str) -> Result<&Payload> {
        info!(
            source = %self.descriptor.name,
            file_type = %self.descriptor.file_type,
            path = %self.descriptor.file_path.display(),
            pattern = %filter_pattern,
            "Loading data source"
        );
        let payload = self
            .getter()?
            .get(&self.descriptor.file_path, filter_pattern)?;
        self.state = SourceState::Loaded(payload);
        self.payload()
    }

    /// Fetch the data unless it is already cached.
    pub fn ensure_loaded(&mut self) -> Result<&Payload> {
        if !self.is_loaded() {
            self.get_data("")?;
        }
        self.payload()
    }

    /// Drop the cached data.
    pub fn reset(&mut self) {
        self.state = SourceState::Unloaded;
    }

    /// Same descriptor, with `payload` or a copy of the cached data.
    pub fn duplicate(&self, payload: Option<Payload>) -> DataSource {
        DataSource {
            descriptor: self.descriptor.clone(),
            paths: Arc::clone(&self.paths),
            grids: self.grids.clone(),
            state: match payload {
                Some(payload) => SourceState::Loaded(payload),
                None => self.state.clone(),
            },
        }
    }

    /// New source holding `f` applied to the cached data.
    pub fn apply(&self, f: impl FnOnce(&Payload) -> Result<Payload>) -> Result<DataSource> {
        let payload = f(self.payload()?)?;
        Ok(self.duplicate(Some(payload)))
    }

    /// Replace the cached data with `f` applied to it.
    pub fn apply_in_place(&mut self, f: impl FnOnce(Payload) -> Result<Payload>) -> Result<()> {
        match std::mem::replace(&mut self.state, SourceState::Unloaded) {
            SourceState::Loaded(payload) => {
                self.state = SourceState::Loaded(f(payload)?);
                Ok(())
            }
            SourceState::Unloaded => Err(DataError::NotLoaded(self.descriptor.name.clone())),
        }
    }

    /// `self - other` on the variables both hold.
    pub fn difference(&self, other: &DataSource) -> Result<DataSource> {
        self.combine(other, |a, b| a - b)
    }

    /// `self + other` on the variables both hold.
    pub fn sum(&self, other: &DataSource) -> Result<DataSource> {
        self.combine(other, |a, b| a + b)
    }

    fn combine(&self, other: &DataSource, op: impl Fn(f64, f64) -> f64) -> Result<DataSource> {
        let combined = self.dataset()?.zip_with(other.dataset()?, op)?;
        Ok(self.duplicate(Some(Payload::Grid(combined))))
    }
}

/// Fetch every source with the same filter pattern, stopping at the first error.
pub fn load_sources(sources: &mut [DataSource], filter_pattern: &str) -> Result<()> {
    for source in sources.iter_mut() {
        source.get_data(filter_pattern)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Lon,
    Lat,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Lon => "lon",
            Axis::Lat => "lat",
        })
    }
}

/// Models whose cleaned output carries per-placement coordinates.
const STAGGERED_MODELS: [&str; 2] = ["SYMPHONIE", "NEMO"];

/// A data source on a horizontal grid.
///
/// Coordinates are computed once per placement and shared; they stay cached
/// until [`GriddedSource::reset_coordinates`] or [`GriddedSource::reload`].
#[derive(Debug)]
pub struct GriddedSource {
    source: DataSource,
    lon: HashMap<Placement, Arc<Variable>>,
    lat: HashMap<Placement, Arc<Variable>>,
}

impl GriddedSource {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            lon: HashMap::new(),
            lat: HashMap::new(),
        }
    }

    pub fn inner(&self) -> &DataSource {
        &self.source
    }

    pub fn inner_mut(&mut self) -> &mut DataSource {
        &mut self.source
    }

    pub fn into_inner(self) -> DataSource {
        self.source
    }

    /// Longitudes at `placement`, loading the data if needed.
    pub fn lon(&mut self, placement: Placement) -> Result<Arc<Variable>> {
        self.coordinate(Axis::Lon, placement)
    }

    /// Latitudes at `placement`, loading the data if needed.
    pub fn lat(&mut self, placement: Placement) -> Result<Arc<Variable>> {
        self.coordinate(Axis::Lat, placement)
    }

    /// Forget memoised coordinates; the next lookup recomputes them.
    pub fn reset_coordinates(&mut self) {
        self.lon.clear();
        self.lat.clear();
    }

    /// Fetch the data again and forget memoised coordinates.
    pub fn reload(&mut self, filter_pattern: &str) -> Result<&Payload> {
        self.reset_coordinates();
        self.source.get_data(filter_pattern)
    }

    fn coordinate(&mut self, axis: Axis, placement: Placement) -> Result<Arc<Variable>> {
        let cached = match axis {
            Axis::Lon => self.lon.get(&placement),
            Axis::Lat => self.lat.get(&placement),
        };
        if let Some(var) = cached {
            return Ok(Arc::clone(var));
        }

        let descriptor = self.source.descriptor().clone();
        let dataset = match self.source.ensure_loaded()? {
            Payload::Grid(ds) => ds,
            Payload::Table(_) => {
                return Err(DataError::coordinate(format!(
                    "data source '{}' holds a table",
                    descriptor.name
                )))
            }
        };
        let name = coordinate_name(&descriptor, dataset, axis, placement)?;
        let var = dataset.variable(&name).map_err(|_| {
            DataError::coordinate(format!(
                "data source '{}' has no coordinate '{}'",
                descriptor.name, name
            ))
        })?;
        let var = Arc::new(var.clone());
        debug!(source = %descriptor.name, coordinate = %name, "Memoised coordinate");

        match axis {
            Axis::Lon => self.lon.insert(placement, Arc::clone(&var)),
            Axis::Lat => self.lat.insert(placement, Arc::clone(&var)),
        };
        Ok(var)
    }
}

/// Variable holding the `axis` coordinate of a source at `placement`.
fn coordinate_name(
    descriptor: &SourceDescriptor,
    dataset: &Dataset,
    axis: Axis,
    placement: Placement,
) -> Result<String> {
    match descriptor.data_type {
        DataKind::Satellite => Ok(axis.to_string()),
        DataKind::Model | DataKind::Grid => {
            let staggered = descriptor
                .model
                .as_deref()
                .is_some_and(|m| STAGGERED_MODELS.iter().any(|s| s.eq_ignore_ascii_case(m)));
            if staggered {
                Ok(format!("{}_{}", axis, placement))
            } else if dataset.contains(&axis.to_string()) {
                Ok(axis.to_string())
            } else {
                Err(DataError::coordinate(format!(
                    "model '{}' of source '{}' has no '{}' coordinate",
                    descriptor.model.as_deref().unwrap_or("unknown"),
                    descriptor.name,
                    axis
                )))
            }
        }
        DataKind::Observation => Err(DataError::coordinate(format!(
            "source '{}' of type {} has no grid coordinates",
            descriptor.name, descriptor.data_type
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CleaningOptions, LoadOptions, ProcessingLevel};
    use ndarray::Array1;
    use std::path::PathBuf;
    use test_utils::{glorys_output, ScratchProject};

    fn descriptor(data_type: DataKind, model: Option<&str>) -> SourceDescriptor {
        SourceDescriptor {
            name: "test".to_string(),
            file_type: "netcdf".to_string(),
            file_path: PathBuf::from("test.nc"),
            data_type,
            cleaning: None,
            loading_kwargs: LoadOptions::default(),
            cleaning_kwargs: CleaningOptions::default(),
            model: model.map(str::to_string),
            processing_level: ProcessingLevel::default(),
        }
    }

    fn loaded(data_type: DataKind, model: Option<&str>, ds: Dataset) -> DataSource {
        DataSource::new(descriptor(data_type, model), Arc::new(ProjectPaths::at("/nowhere")))
            .duplicate(Some(Payload::Grid(ds)))
    }

    fn lonlat(lon: &str, lat: &str) -> Dataset {
        Dataset::new()
            .with_variable(lon, Variable::coordinate(lon, Array1::from_vec(vec![100.0, 100.5])))
            .unwrap()
            .with_variable(lat, Variable::coordinate(lat, Array1::from_vec(vec![5.0])))
            .unwrap()
    }

    #[test]
    fn test_unloaded_source() {
        let source = DataSource::new(
            descriptor(DataKind::Model, None),
            Arc::new(ProjectPaths::at("/nowhere")),
        );
        assert!(!source.is_loaded());
        assert!(matches!(source.payload(), Err(DataError::NotLoaded(_))));
        assert!(matches!(source.apply(|p| Ok(p.clone())), Err(DataError::NotLoaded(_))));
    }

    #[test]
    fn test_get_data_missing_file() {
        let project = ScratchProject::new();
        let mut source = DataSource::new(
            descriptor(DataKind::Model, None),
            Arc::new(ProjectPaths::at(project.root())),
        );
        assert!(matches!(source.get_data(""), Err(DataError::NotFound { .. })));
        assert!(!source.is_loaded());
    }

    #[test]
    fn test_duplicate_and_reset() {
        let mut source = loaded(DataKind::Satellite, None, lonlat("lon", "lat"));
        let copy = source.duplicate(None);
        source.reset();
        assert!(!source.is_loaded());
        assert!(copy.is_loaded());
    }

    #[test]
    fn test_apply_and_arithmetic() {
        let a = loaded(DataKind::Model, Some("GLORYS"), glorys_output(2, 2, 1));
        let b = a.apply(|p| {
            let mut ds = p.as_grid().cloned().unwrap_or_default();
            ds.map_variable("thetao", |v| v - 1.0)?;
            Ok(Payload::Grid(ds))
        })
        .unwrap();

        let diff = a.difference(&b).unwrap();
        for v in diff.dataset().unwrap().get("thetao").unwrap().values() {
            test_utils::assert_approx_eq!(v, 1.0, 1e-12);
        }
        let total = a.sum(&b).unwrap();
        let first = total.dataset().unwrap().get("thetao").unwrap().values()[0];
        test_utils::assert_approx_eq!(first, 2.0 * 28.0 - 1.0, 1e-12);

        let mut c = a.duplicate(None);
        c.apply_in_place(|_| Ok(Payload::Grid(Dataset::new()))).unwrap();
        assert!(c.dataset().unwrap().is_empty());
    }

    #[test]
    fn test_coordinate_dispatch() {
        let mut satellite = GriddedSource::new(loaded(DataKind::Satellite, None, lonlat("lon", "lat")));
        assert_eq!(satellite.lon(Placement::U).unwrap().values(), vec![100.0, 100.5]);

        let mut symphonie =
            GriddedSource::new(loaded(DataKind::Model, Some("SYMPHONIE"), lonlat("lon_u", "lat_u")));
        assert_eq!(symphonie.lat(Placement::U).unwrap().values(), vec![5.0]);
        assert!(matches!(symphonie.lon(Placement::T), Err(DataError::Coordinate(_))));

        let mut grid = GriddedSource::new(loaded(DataKind::Grid, Some("nemo"), lonlat("lon_t", "lat_t")));
        assert!(grid.lon(Placement::T).is_ok());

        let mut other = GriddedSource::new(loaded(DataKind::Model, Some("HYCOM"), lonlat("lon", "lat")));
        assert!(other.lat(Placement::T).is_ok());
        let mut missing = GriddedSource::new(loaded(DataKind::Model, Some("HYCOM"), Dataset::new()));
        assert!(matches!(missing.lat(Placement::T), Err(DataError::Coordinate(_))));

        let mut argo = GriddedSource::new(loaded(DataKind::Observation, None, lonlat("lon", "lat")));
        assert!(matches!(argo.lon(Placement::T), Err(DataError::Coordinate(_))));
    }

    #[test]
    fn test_coordinates_are_memoised() {
        let mut source = GriddedSource::new(loaded(DataKind::Satellite, None, lonlat("lon", "lat")));
        let first = source.lon(Placement::T).unwrap();
        source
            .inner_mut()
            .apply_in_place(|_| Ok(Payload::Grid(Dataset::new())))
            .unwrap();
        let second = source.lon(Placement::T).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        source.reset_coordinates();
        assert!(matches!(source.lon(Placement::T), Err(DataError::Coordinate(_))));
    }
}
