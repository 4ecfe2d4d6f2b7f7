//! Cleaner registry: normalises raw payloads to the canonical schema.
//!
//! Canonical names put the staggered-grid placement in a suffix: `lon_t`,
//! `lat_u`, `depth_w`, and physical fields are `tem` (°C) and `sal` (psu).
//! Each cleaner maps one raw layout onto that schema.
//!
//! A cleaner that meets data outside its expected layout raises
//! [`DataError::SchemaAdaptation`]. The [`SchemaPolicy`] in the cleaning
//! options decides whether that is fatal or whether the raw data is returned
//! unchanged with a warning; only the surface cleaner defaults to the latter.

use std::fmt;

use ndarray::{Array1, Ix1};
use ocean_common::{Dataset, DatasetError, Payload, Placement, Variable};
use tracing::{debug, warn};

use crate::config::{CleaningOptions, SchemaPolicy};
use crate::error::{DataError, Result};
use crate::grids::{GridProvider, DEFAULT_CONFIGURATION};

/// Index dimensions of SYMPHONIE output and their canonical names.
const STAGGERED_RENAMES: [(&str, &str); 8] = [
    ("ni_t", "lon_t"),
    ("nj_t", "lat_t"),
    ("ni_u", "lon_u"),
    ("nj_u", "lat_u"),
    ("ni_v", "lon_v"),
    ("nj_v", "lat_v"),
    ("ni_w", "lon_w"),
    ("nj_w", "lat_w"),
];

/// Fields of raw SYMPHONIE output that carry no information once cleaned.
const LEGACY_FIELDS: [&str; 9] = [
    "cumulativetime",
    "longitude_t",
    "latitude_t",
    "longitude_u",
    "longitude_v",
    "latitude_u",
    "latitude_v",
    "longitude_w",
    "latitude_w",
];

const DEPTH_FIELDS: [&str; 4] = ["depth_t", "depth_u", "depth_v", "depth_w"];

/// Kelvin to Celsius offset.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Default source field of the satellite cleaner.
pub const DEFAULT_SST_FIELD: &str = "analysed_sst";

/// Registered cleaning strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleaningStrategy {
    /// SYMPHONIE 3-D output on the SEA_312 staggered grid
    Sea312,
    /// SYMPHONIE surface output on the SEA_312 staggered grid
    Sea312Surface,
    /// OSTIA satellite SST
    Ostia,
    /// GLORYS reanalysis
    Glorys,
    /// SYMPHONIE grid description file
    SymphonieGrid,
    /// NEMO output
    Nemo,
}

impl CleaningStrategy {
    pub const ALL: [CleaningStrategy; 6] = [
        CleaningStrategy::Sea312,
        CleaningStrategy::Sea312Surface,
        CleaningStrategy::Ostia,
        CleaningStrategy::Glorys,
        CleaningStrategy::SymphonieGrid,
        CleaningStrategy::Nemo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CleaningStrategy::Sea312 => "sea312",
            CleaningStrategy::Sea312Surface => "sea312surface",
            CleaningStrategy::Ostia => "ostia",
            CleaningStrategy::Glorys => "glorys",
            CleaningStrategy::SymphonieGrid => "sym_grd",
            CleaningStrategy::Nemo => "nemo",
        }
    }

    /// Parse a cleaner tag, case-insensitively.
    pub fn from_tag(tag: &str) -> Result<Self> {
        let wanted = tag.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == wanted)
            .ok_or_else(|| DataError::UnknownStrategy {
                tag: tag.to_string(),
                valid: Self::ALL.map(|s| s.as_str()).join(", "),
            })
    }

    /// Policy applied when the options do not set one.
    pub fn default_policy(&self) -> SchemaPolicy {
        match self {
            CleaningStrategy::Sea312Surface => SchemaPolicy::Passthrough,
            _ => SchemaPolicy::Strict,
        }
    }
}

impl fmt::Display for CleaningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalises one payload.
pub trait Cleaner: Send + Sync {
    fn name(&self) -> &'static str;

    fn clean(
        &self,
        payload: Payload,
        options: &CleaningOptions,
        grids: &dyn GridProvider,
    ) -> Result<Payload>;
}

/// Cleaner for a strategy; `None` gives the identity cleaner.
pub fn get_cleaner(strategy: Option<CleaningStrategy>) -> Box<dyn Cleaner> {
    match strategy {
        None => Box::new(IdentityCleaner),
        Some(CleaningStrategy::Sea312) => Box::new(Sea312Cleaner),
        Some(CleaningStrategy::Sea312Surface) => Box::new(Sea312SurfaceCleaner),
        Some(CleaningStrategy::Ostia) => Box::new(OstiaCleaner),
        Some(CleaningStrategy::Glorys) => Box::new(GlorysCleaner),
        Some(CleaningStrategy::SymphonieGrid) => Box::new(SymphonieGridCleaner),
        Some(CleaningStrategy::Nemo) => Box::new(NemoCleaner),
    }
}

/// Cleaner for an optional tag, failing with `UnknownStrategy`.
pub fn cleaner_for_tag(tag: Option<&str>) -> Result<Box<dyn Cleaner>> {
    let strategy = tag.map(CleaningStrategy::from_tag).transpose()?;
    Ok(get_cleaner(strategy))
}

/// Run `adapt` on a gridded payload under the schema policy of `strategy`.
fn adapt_grid(
    strategy: CleaningStrategy,
    payload: Payload,
    options: &CleaningOptions,
    adapt: impl FnOnce(Dataset) -> Result<Dataset>,
) -> Result<Payload> {
    let cleaner = strategy.as_str();
    let dataset = match payload {
        Payload::Grid(ds) => ds,
        Payload::Table(_) => {
            return Err(DataError::schema(cleaner, "expected gridded data, got a table"))
        }
    };

    let policy = options
        .on_schema_error
        .unwrap_or_else(|| strategy.default_policy());
    let raw = match policy {
        SchemaPolicy::Passthrough => Some(dataset.clone()),
        SchemaPolicy::Strict => None,
    };

    match adapt(dataset) {
        Ok(cleaned) => Ok(Payload::Grid(cleaned)),
        Err(err @ DataError::SchemaAdaptation { .. }) => match raw {
            Some(raw) => {
                warn!(cleaner = %cleaner, error = %err, "Cleaning failed, returning raw data");
                Ok(Payload::Grid(raw))
            }
            None => Err(err),
        },
        Err(err) => Err(err),
    }
}

/// Turn a dataset error into a schema adaptation failure of `cleaner`.
fn schema(cleaner: CleaningStrategy) -> impl Fn(DatasetError) -> DataError {
    move |err| DataError::schema(cleaner.as_str(), err.to_string())
}

/// Returns the data unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityCleaner;

impl Cleaner for IdentityCleaner {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn clean(&self, payload: Payload, _: &CleaningOptions, _: &dyn GridProvider) -> Result<Payload> {
        Ok(payload)
    }
}

/// 1-D longitudes and latitudes of each placement found in `grid`.
///
/// Longitudes average the 2-D field over its first axis, latitudes over its
/// second, ignoring NaN. Returns `(ni_p, values)` and `(nj_p, values)` pairs
/// plus the placements actually found.
fn horizontal_coordinates(
    strategy: CleaningStrategy,
    grid: &Dataset,
    placements: &[Placement],
) -> Result<(Vec<(String, Array1<f64>)>, Vec<Placement>)> {
    let mut coords = Vec::new();
    let mut found = Vec::new();
    for &p in placements {
        let (Some(lon), Some(lat)) = (
            grid.get(&format!("longitude_{}", p)),
            grid.get(&format!("latitude_{}", p)),
        ) else {
            debug!(cleaner = %strategy, placement = %p, "Placement absent from grid, skipping");
            continue;
        };
        let lon = collapse(strategy, lon, 0)?;
        let lat = collapse(strategy, lat, 1)?;
        coords.push((format!("ni_{}", p), lon));
        coords.push((format!("nj_{}", p), lat));
        found.push(p);
    }
    Ok((coords, found))
}

/// NaN-aware mean of a 2-D field over `axis`.
fn collapse(strategy: CleaningStrategy, field: &Variable, axis: usize) -> Result<Array1<f64>> {
    if field.ndim() != 2 {
        return Err(DataError::schema(
            strategy.as_str(),
            format!("grid coordinate has {} dimensions, expected 2", field.ndim()),
        ));
    }
    let mean = field
        .nanmean_over(&field.dims[axis])
        .map_err(schema(strategy))?;
    mean.data
        .into_dimensionality::<Ix1>()
        .map_err(|e| DataError::schema(strategy.as_str(), e.to_string()))
}

fn fetch_grid(options: &CleaningOptions, grids: &dyn GridProvider) -> Result<Dataset> {
    let configuration = options
        .configuration
        .as_deref()
        .unwrap_or(DEFAULT_CONFIGURATION);
    grids.grid(configuration, options.coordinates.as_deref())
}

/// SYMPHONIE 3-D output: index dimensions become explicit coordinates.
///
/// Horizontal coordinates for `t`, `u` and `v` come from the grid file
/// (`w` reuses `t`), depth fields `depth_{t,u,v,w}` are copied from it, the
/// index dimensions are renamed and legacy fields dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sea312Cleaner;

impl Cleaner for Sea312Cleaner {
    fn name(&self) -> &'static str {
        CleaningStrategy::Sea312.as_str()
    }

    fn clean(
        &self,
        payload: Payload,
        options: &CleaningOptions,
        grids: &dyn GridProvider,
    ) -> Result<Payload> {
        let strategy = CleaningStrategy::Sea312;
        let grid = fetch_grid(options, grids)?;

        adapt_grid(strategy, payload, options, |mut ds| {
            let (mut coords, found) =
                horizontal_coordinates(strategy, &grid, &[Placement::T, Placement::U, Placement::V])?;
            if found.contains(&Placement::T) {
                let lookup = |name: &str| {
                    coords
                        .iter()
                        .find(|(n, _)| n == name)
                        .map(|(_, values)| values.clone())
                };
                if let (Some(lon), Some(lat)) = (lookup("ni_t"), lookup("nj_t")) {
                    coords.push(("ni_w".to_string(), lon));
                    coords.push(("nj_w".to_string(), lat));
                }
            }

            // Depths go in first so the index dimensions already exist when
            // the horizontal coordinates are assigned
            for name in DEPTH_FIELDS {
                let depth = grid.variable(name).map_err(schema(strategy))?;
                ds.insert(name, depth.clone()).map_err(schema(strategy))?;
            }
            for (name, values) in coords.iter() {
                ds.assign_coord(name, values.clone()).map_err(schema(strategy))?;
            }

            let renames: Vec<(&str, &str)> = STAGGERED_RENAMES
                .into_iter()
                .filter(|(from, _)| coords.iter().any(|(name, _)| name == from))
                .collect();
            ds.rename_all(&renames).map_err(schema(strategy))?;

            let dropped = ds.drop_vars(&LEGACY_FIELDS);
            debug!(cleaner = %strategy, dropped = ?dropped, "Dropped legacy fields");
            Ok(ds)
        })
    }
}

/// SYMPHONIE surface output; tolerant of partial grids and renames.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sea312SurfaceCleaner;

impl Cleaner for Sea312SurfaceCleaner {
    fn name(&self) -> &'static str {
        CleaningStrategy::Sea312Surface.as_str()
    }

    fn clean(
        &self,
        payload: Payload,
        options: &CleaningOptions,
        grids: &dyn GridProvider,
    ) -> Result<Payload> {
        let strategy = CleaningStrategy::Sea312Surface;
        let grid = fetch_grid(options, grids)?;

        adapt_grid(strategy, payload, options, |mut ds| {
            let (coords, _) = horizontal_coordinates(
                strategy,
                &grid,
                &[Placement::T, Placement::U, Placement::V, Placement::W],
            )?;
            for (name, values) in coords {
                ds.assign_coord(&name, values).map_err(schema(strategy))?;
            }

            for (from, to) in STAGGERED_RENAMES {
                if let Err(e) = ds.rename(from, to) {
                    debug!(cleaner = %strategy, from = %from, to = %to, error = %e, "Rename skipped");
                }
            }
            ds.drop_vars(&LEGACY_FIELDS);
            ds.squeeze();
            Ok(ds)
        })
    }
}

/// OSTIA satellite SST: Kelvin field converted to `tem` in °C.
#[derive(Debug, Default, Clone, Copy)]
pub struct OstiaCleaner;

impl Cleaner for OstiaCleaner {
    fn name(&self) -> &'static str {
        CleaningStrategy::Ostia.as_str()
    }

    fn clean(
        &self,
        payload: Payload,
        options: &CleaningOptions,
        _grids: &dyn GridProvider,
    ) -> Result<Payload> {
        let strategy = CleaningStrategy::Ostia;
        let field = options.field.as_deref().unwrap_or(DEFAULT_SST_FIELD);

        adapt_grid(strategy, payload, options, |mut ds| {
            if ds.contains("tem") {
                return Err(schema(strategy)(DatasetError::NameConflict("tem".to_string())));
            }
            let mut sst = ds
                .remove(field)
                .ok_or_else(|| schema(strategy)(DatasetError::MissingVariable(field.to_string())))?;
            sst.data.mapv_inplace(|k| k - KELVIN_OFFSET);
            sst.attrs.insert("units".to_string(), "degC".to_string());
            ds.insert("tem", sst).map_err(schema(strategy))?;
            Ok(ds)
        })
    }
}

/// GLORYS reanalysis names.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlorysCleaner;

const GLORYS_RENAMES: [(&str, &str); 5] = [
    ("latitude", "lat_t"),
    ("longitude", "lon_t"),
    ("depth", "depth_t"),
    ("thetao", "tem"),
    ("so", "sal"),
];

impl Cleaner for GlorysCleaner {
    fn name(&self) -> &'static str {
        CleaningStrategy::Glorys.as_str()
    }

    fn clean(
        &self,
        payload: Payload,
        options: &CleaningOptions,
        _grids: &dyn GridProvider,
    ) -> Result<Payload> {
        let strategy = CleaningStrategy::Glorys;
        adapt_grid(strategy, payload, options, |mut ds| {
            ds.rename_all(&GLORYS_RENAMES).map_err(schema(strategy))?;
            Ok(ds)
        })
    }
}

/// SYMPHONIE grid file: `{longitude,latitude}_{t,u,v,f}` → `{lon,lat}_{t,u,v,f}`.
///
/// Names already canonical, or absent altogether, are left alone, so
/// cleaning twice gives the same result.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphonieGridCleaner;

impl Cleaner for SymphonieGridCleaner {
    fn name(&self) -> &'static str {
        CleaningStrategy::SymphonieGrid.as_str()
    }

    fn clean(
        &self,
        payload: Payload,
        options: &CleaningOptions,
        _grids: &dyn GridProvider,
    ) -> Result<Payload> {
        let strategy = CleaningStrategy::SymphonieGrid;
        adapt_grid(strategy, payload, options, |mut ds| {
            for (long, short) in [("longitude", "lon"), ("latitude", "lat")] {
                for p in [Placement::T, Placement::U, Placement::V, Placement::F] {
                    let from = format!("{}_{}", long, p);
                    if ds.contains(&from) {
                        ds.rename(&from, &format!("{}_{}", short, p))
                            .map_err(schema(strategy))?;
                    }
                }
            }
            Ok(ds)
        })
    }
}

/// NEMO output names, per configuration and placement.
#[derive(Debug, Default, Clone, Copy)]
pub struct NemoCleaner;

impl NemoCleaner {
    /// `(raw, canonical)` pairs for a configuration and placement.
    pub fn renames(nemo_config: Option<&str>, placement: Placement) -> Vec<(String, String)> {
        let pairs: Vec<(String, String)> = if nemo_config == Some("SEAsia") {
            [
                ("y", "lat_t"),
                ("x", "lon_t"),
                ("deptht", "depth_t"),
                ("time_counter", "time"),
                ("toce_e3t", "tem_w"),
                ("soce_e3t", "sal_w"),
            ]
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
        } else {
            let p = placement.as_str();
            let mut pairs = vec![
                ("y".to_string(), format!("lat_{}", p)),
                ("x".to_string(), format!("lon_{}", p)),
                (format!("depth{}", p), format!("depth_{}", p)),
                ("time_counter".to_string(), "time".to_string()),
            ];
            if placement == Placement::T {
                pairs.push(("thetao".to_string(), "tem".to_string()));
                pairs.push(("so".to_string(), "sal".to_string()));
            }
            pairs
        };
        pairs
    }
}

impl Cleaner for NemoCleaner {
    fn name(&self) -> &'static str {
        CleaningStrategy::Nemo.as_str()
    }

    fn clean(
        &self,
        payload: Payload,
        options: &CleaningOptions,
        _grids: &dyn GridProvider,
    ) -> Result<Payload> {
        let strategy = CleaningStrategy::Nemo;
        let placement = options.placement.unwrap_or(Placement::T);
        let renames = Self::renames(options.nemo_config.as_deref(), placement);

        adapt_grid(strategy, payload, options, |mut ds| {
            for (from, to) in &renames {
                if ds.contains(from) || ds.has_dim(from) {
                    ds.rename(from, to).map_err(schema(strategy))?;
                }
            }
            Ok(ds)
        })
    }
}
