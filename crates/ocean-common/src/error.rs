//! Error types for in-memory dataset operations.

use thiserror::Error;

/// Result type alias using DatasetError.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors raised while building or reshaping datasets and tables.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("variable not found: {0}")]
    MissingVariable(String),

    #[error("no variable or dimension named '{0}'")]
    MissingName(String),

    #[error("name already in use: {0}")]
    NameConflict(String),

    #[error("conflicting sizes for dimension '{dim}': {existing} vs {found}")]
    DimensionConflict {
        dim: String,
        existing: usize,
        found: usize,
    },

    #[error("shape error: {0}")]
    Shape(String),

    #[error("invalid chunk size for dimension '{0}'")]
    InvalidChunk(String),

    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),
}

impl From<ndarray::ShapeError> for DatasetError {
    fn from(err: ndarray::ShapeError) -> Self {
        DatasetError::Shape(err.to_string())
    }
}
