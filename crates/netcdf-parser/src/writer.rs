//! NetCDF writer for cleaned datasets.

use std::path::Path;

use ocean_common::Dataset;
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::silence_hdf5_errors;

fn write_err(e: netcdf::Error) -> NetCdfError {
    NetCdfError::WriteError(e.to_string())
}

/// Write a dataset to a new NetCDF-4 file, replacing any existing file.
///
/// Every variable is stored as `f64`; string attributes are preserved.
pub fn write_dataset<P: AsRef<Path>>(path: P, dataset: &Dataset) -> NetCdfResult<()> {
    silence_hdf5_errors();

    let path = path.as_ref();
    let mut file = netcdf::create(path).map_err(write_err)?;

    for (dim, len) in dataset.dims() {
        file.add_dimension(&dim, len).map_err(write_err)?;
    }
    for (key, value) in dataset.attrs() {
        file.add_attribute(key, value.as_str()).map_err(write_err)?;
    }

    for (name, var) in dataset.variables() {
        let dims: Vec<&str> = var.dims.iter().map(String::as_str).collect();
        let mut nc_var = file.add_variable::<f64>(name, &dims).map_err(write_err)?;
        for (key, value) in &var.attrs {
            nc_var.put_attribute(key, value.as_str()).map_err(write_err)?;
        }
        let values = var.values();
        nc_var.put_values(&values, ..).map_err(write_err)?;
    }

    debug!(
        path = %path.display(),
        variables = dataset.len(),
        "Wrote NetCDF dataset"
    );
    Ok(())
}
