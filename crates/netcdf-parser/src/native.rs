//! Native NetCDF reading using the netcdf library.
//!
//! The netcdf library requires a file path (it wraps libnetcdf/HDF5 which need
//! file handles). When reading from bytes, we write to a temp file first.
//!
//! On Linux, we use `/dev/shm` (memory-backed tmpfs) to minimize I/O latency.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;

use flate2::read::GzDecoder;
use ndarray::{ArrayD, IxDyn};
use ocean_common::{Dataset, Variable};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist, or probing a variable's storage type).
///
/// It only needs to be called once per process, but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Read every numeric variable of a NetCDF file.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> NetCdfResult<Dataset> {
    silence_hdf5_errors();

    let path = path.as_ref();
    let nc_file = netcdf::open(path).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let mut dataset = Dataset::new();
    for attr in nc_file.attributes() {
        if let Ok(netcdf::AttributeValue::Str(text)) = attr.value() {
            dataset.set_attr(attr.name().to_string(), text);
        }
    }

    for var in nc_file.variables() {
        let name = var.name().to_string();
        match read_variable(&var) {
            Ok(variable) => dataset.insert(name, variable)?,
            Err(e) => debug!(variable = %name, error = %e, "Skipping non-numeric variable"),
        }
    }

    debug!(
        path = %path.display(),
        variables = dataset.len(),
        "Read NetCDF dataset"
    );
    Ok(dataset)
}

/// Read a gzip-compressed NetCDF file.
pub fn read_gzip_dataset<P: AsRef<Path>>(path: P) -> NetCdfResult<Dataset> {
    let mut decoder = GzDecoder::new(File::open(path.as_ref())?);
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    read_dataset_from_bytes(&bytes)
}

/// Read a NetCDF file held in memory.
pub fn read_dataset_from_bytes(data: &[u8]) -> NetCdfResult<Dataset> {
    let temp_file = get_optimal_temp_dir().join(generate_temp_filename());
    std::fs::write(&temp_file, data)?;

    let result = read_dataset(&temp_file);

    // Clean up
    let _ = std::fs::remove_file(&temp_file);
    result
}

/// Read a plain or gzip-compressed NetCDF file, chosen by extension.
pub fn read_any<P: AsRef<Path>>(path: P) -> NetCdfResult<Dataset> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => read_gzip_dataset(path),
        _ => read_dataset(path),
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Read one variable as `f64`, unpacking CF scale/offset and fill values.
fn read_variable(var: &netcdf::Variable) -> NetCdfResult<Variable> {
    let dims: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

    let raw = read_values_as_f64(var)?;

    let fill = get_f64_attr(var, "_FillValue").or_else(|| get_f64_attr(var, "missing_value"));
    let scale = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);

    let values: Vec<f64> = raw
        .into_iter()
        .map(|v| {
            if Some(v) == fill {
                f64::NAN
            } else {
                v * scale + offset
            }
        })
        .collect();

    let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| NetCdfError::InvalidFormat(format!("{}: {}", var.name(), e)))?;
    let mut variable = Variable::new(dims, data)?;

    for attr in var.attributes() {
        if let Ok(netcdf::AttributeValue::Str(text)) = attr.value() {
            variable.attrs.insert(attr.name().to_string(), text);
        }
    }
    Ok(variable)
}

/// Read all values of a variable, converting from its storage type.
///
/// Tries the widest types first; character and string variables fail every
/// attempt and are reported as invalid.
fn read_values_as_f64(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    macro_rules! try_read {
        ($t:ty) => {
            let values: Result<Vec<$t>, _> = var.get_values(..);
            if let Ok(values) = values {
                return Ok(values.into_iter().map(|v| v as f64).collect());
            }
        };
    }

    let values: Result<Vec<f64>, _> = var.get_values(..);
    if let Ok(values) = values {
        return Ok(values);
    }
    try_read!(f32);
    try_read!(i64);
    try_read!(i32);
    try_read!(i16);
    try_read!(i8);
    try_read!(u64);
    try_read!(u32);
    try_read!(u16);
    try_read!(u8);

    Err(NetCdfError::InvalidFormat(format!(
        "variable {} has no numeric representation",
        var.name()
    )))
}

/// Get the optimal temp directory for NetCDF file operations.
///
/// On Linux, uses /dev/shm (memory-backed tmpfs) if available for faster I/O.
/// Falls back to the system temp directory on other platforms or if /dev/shm is unavailable.
fn get_optimal_temp_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let shm_path = Path::new("/dev/shm");
        if shm_path.exists() && shm_path.is_dir() {
            // Verify we can write to /dev/shm
            let test_path = shm_path.join(format!(".netcdf_test_{}", std::process::id()));
            if std::fs::write(&test_path, b"test").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return shm_path.to_path_buf();
            }
        }
    }

    std::env::temp_dir()
}

/// Generate a unique temp file name for concurrent safety.
/// Uses process ID, thread ID, and a counter to ensure uniqueness.
fn generate_temp_filename() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let pid = std::process::id();
    let tid = std::thread::current().id();
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("ocean_nc_{}_{:?}_{}.nc", pid, tid, count)
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get an attribute as f64.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimal_temp_dir() {
        let dir = get_optimal_temp_dir();
        assert!(dir.exists(), "Temp dir should exist");
    }

    #[test]
    fn test_temp_filename_uniqueness() {
        let name1 = generate_temp_filename();
        let name2 = generate_temp_filename();
        assert_ne!(name1, name2, "Temp filenames should be unique");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let result = read_dataset("/nonexistent/file.nc");
        assert!(matches!(result, Err(NetCdfError::InvalidFormat(_))));
    }
}
