//! NetCDF reader and writer for ocean model output.
//!
//! Files are read whole into an [`ocean_common::Dataset`]: every numeric
//! variable becomes a `f64` array on its named dimensions, with CF packing
//! (`scale_factor`, `add_offset`) applied and `_FillValue` / `missing_value`
//! cells mapped to NaN. String and character variables are skipped.
//!
//! Gzip-compressed files (`*.nc.gz`) are inflated to a temporary file first,
//! since libnetcdf needs a real path to open.
//!
//! # Implementation Notes
//!
//! This wraps the `netcdf` crate (libnetcdf + HDF5). Call
//! [`silence_hdf5_errors`] early in a binary to keep HDF5 diagnostics for
//! gracefully handled lookups off stderr; the readers call it as well.

pub mod error;
pub mod native;
pub mod writer;

pub use error::{NetCdfError, NetCdfResult};
pub use native::{read_any, read_dataset, read_dataset_from_bytes, read_gzip_dataset, silence_hdf5_errors};
pub use writer::write_dataset;
