//! Catalog-driven access to ocean model, satellite and observation data.
//!
//! A data source is declared once in the YAML catalog under
//! `conf/data_sources/` and fetched by name:
//!
//! ```ignore
//! use data_access::{Catalog, ProjectPaths};
//! use ocean_common::Placement;
//!
//! let catalog = Catalog::from_paths(ProjectPaths::from_env()?)?;
//! let mut run = catalog.gridded("run01")?;
//! let lon = run.lon(Placement::T)?;
//! ```
//!
//! # Pipeline
//!
//! Fetching a source runs three stages, stopping at the first error:
//!
//! 1. [`resolve`] finds the logical path under the project search roots
//! 2. a [`Loader`] reads it (NetCDF, Zarr, CSV or a multi-file directory)
//! 3. a [`Cleaner`] renames and reshapes the raw data to the canonical schema
//!
//! [`DataGetter`] bundles the three; [`DataSource`] caches the result.

pub mod catalog;
pub mod cleaners;
pub mod config;
pub mod error;
pub mod getter;
pub mod grids;
pub mod interpolation;
pub mod loaders;
pub mod paths;
pub mod resolve;
pub mod source;
pub mod zones;

pub use catalog::Catalog;
pub use cleaners::{cleaner_for_tag, get_cleaner, Cleaner, CleaningStrategy};
pub use config::{CleaningOptions, DataKind, LoadOptions, ProcessingLevel, SchemaPolicy, SourceDescriptor};
pub use error::{DataError, Result};
pub use getter::DataGetter;
pub use grids::{FilesystemGrids, GridProvider, StaticGrids};
pub use interpolation::{interp_to_levels, interpolate_variable};
pub use loaders::{get_loader, loader_for_tag, FileFormat, Loader};
pub use paths::ProjectPaths;
pub use resolve::resolve;
pub use source::{load_sources, DataSource, GriddedSource, SourceState};
pub use zones::{compute_mask, zone_display_name, Polygon, ZoneMasks};
