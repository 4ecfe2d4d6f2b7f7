//! Common types shared across the ocean-data crates.
//!
//! Everything a loader produces and a cleaner consumes lives here: gridded
//! [`Dataset`]s of named [`Variable`]s, column [`Table`]s for profile
//! observations, and the [`Payload`] enum that carries either one.

pub mod dataset;
pub mod error;
pub mod placement;
pub mod reduce;
pub mod table;
pub mod units;

pub use dataset::{Dataset, Variable};
pub use error::{DatasetError, DatasetResult};
pub use placement::Placement;
pub use reduce::nanmean_axis;
pub use table::{Column, Table};
pub use units::Unit;

/// In-memory result of loading (and cleaning) one data source.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Array data on named dimensions (NetCDF, Zarr).
    Grid(Dataset),
    /// Column data (CSV profile tables).
    Table(Table),
}

impl Payload {
    /// Short name of the payload kind, used in log fields and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Grid(_) => "grid",
            Payload::Table(_) => "table",
        }
    }

    pub fn as_grid(&self) -> Option<&Dataset> {
        match self {
            Payload::Grid(ds) => Some(ds),
            Payload::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Payload::Table(table) => Some(table),
            Payload::Grid(_) => None,
        }
    }

    pub fn into_grid(self) -> Option<Dataset> {
        match self {
            Payload::Grid(ds) => Some(ds),
            Payload::Table(_) => None,
        }
    }
}

impl From<Dataset> for Payload {
    fn from(ds: Dataset) -> Self {
        Payload::Grid(ds)
    }
}

impl From<Table> for Payload {
    fn from(table: Table) -> Self {
        Payload::Table(table)
    }
}
