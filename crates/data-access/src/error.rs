//! Error types for the data-access crate.

use std::path::PathBuf;

use netcdf_parser::NetCdfError;
use ocean_common::DatasetError;
use thiserror::Error;
use zarr_store::ZarrStoreError;

/// Errors that can occur while resolving, loading or cleaning data.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("cannot find data at {}; searched {:?}", path.display(), searched)]
    NotFound { path: PathBuf, searched: Vec<PathBuf> },

    #[error("unknown loader '{tag}', expected one of: {valid}")]
    UnknownFormat { tag: String, valid: String },

    #[error("unknown cleaning strategy '{tag}', expected one of: {valid}")]
    UnknownStrategy { tag: String, valid: String },

    #[error("location {} is empty", .0.display())]
    EmptyLocation(PathBuf),

    #[error("no data source named '{name}' in configuration; available: {available}")]
    MissingConfigKey { name: String, available: String },

    #[error("{cleaner} cleaner cannot adapt data: {message}")]
    SchemaAdaptation { cleaner: String, message: String },

    #[error("coordinate error: {0}")]
    Coordinate(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("data source '{0}' is not loaded")]
    NotLoaded(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid filter pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    NetCdf(#[from] NetCdfError),

    #[error(transparent)]
    Zarr(#[from] ZarrStoreError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl DataError {
    /// Create a SchemaAdaptation error.
    pub fn schema(cleaner: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaAdaptation {
            cleaner: cleaner.into(),
            message: message.into(),
        }
    }

    /// Create a Coordinate error.
    pub fn coordinate(msg: impl Into<String>) -> Self {
        Self::Coordinate(msg.into())
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type for data-access operations.
pub type Result<T> = std::result::Result<T, DataError>;
