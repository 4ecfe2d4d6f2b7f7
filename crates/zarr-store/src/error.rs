//! Error types for Zarr store access.

use ocean_common::DatasetError;
use thiserror::Error;

/// Errors that can occur while reading or writing a Zarr store.
#[derive(Error, Debug)]
pub enum ZarrStoreError {
    /// The store or one of its arrays could not be opened.
    #[error("failed to open zarr store: {0}")]
    Open(String),

    /// Reading array elements failed.
    #[error("failed to read zarr array: {0}")]
    Read(String),

    /// Creating or writing an array failed.
    #[error("failed to write zarr array: {0}")]
    Write(String),

    /// The array element type has no `f64` representation.
    #[error("unsupported zarr data type '{data_type}' for array '{array}'")]
    UnsupportedType { array: String, data_type: String },

    /// The path exists but holds neither a group nor an array.
    #[error("not a zarr store: {0}")]
    NotAStore(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl ZarrStoreError {
    pub fn open(msg: impl Into<String>) -> Self {
        Self::Open(msg.into())
    }

    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }
}

/// Result type for Zarr store operations.
pub type Result<T> = std::result::Result<T, ZarrStoreError>;
