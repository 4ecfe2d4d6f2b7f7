//! Error types for NetCDF reading and writing.

use ocean_common::DatasetError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Failure while creating or filling a file
    #[error("Write failed: {0}")]
    WriteError(String),

    /// Variables read from the file do not form a consistent dataset
    #[error("Inconsistent dataset: {0}")]
    Dataset(#[from] DatasetError),
}
