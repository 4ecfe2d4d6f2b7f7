//! Reading Zarr groups and arrays from the local filesystem.

use std::path::Path;
use std::sync::Arc;

use ndarray::{ArrayD, IxDyn};
use ocean_common::{Dataset, Variable};
use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;
use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use crate::error::{Result, ZarrStoreError};

/// Attributes consumed while decoding and not copied onto the variable.
const RESERVED_ATTRS: &[&str] = &["_ARRAY_DIMENSIONS", "scale_factor", "add_offset", "_FillValue"];

/// Read a Zarr store into a dataset.
///
/// A group yields one variable per child array, in name order. A store whose
/// root is itself an array yields a single variable named after the store
/// (`sst.zarr` → `sst`).
pub fn read_store<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Err(ZarrStoreError::NotAStore(path.display().to_string()));
    }

    let store = open_store(path)?;
    let mut dataset = Dataset::new();

    if is_array_dir(path) {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("data")
            .to_string();
        dataset.insert(name.clone(), open_variable(store, path, "/", &name)?)?;
        return Ok(dataset);
    }

    let mut children: Vec<String> = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir() && is_array_dir(entry.path()))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    children.sort();

    if children.is_empty() && !is_group_dir(path) {
        return Err(ZarrStoreError::NotAStore(path.display().to_string()));
    }

    for name in children {
        let var = open_variable(store.clone(), &path.join(&name), &format!("/{}", name), &name)?;
        dataset.insert(name, var)?;
    }

    debug!(
        path = %path.display(),
        variables = dataset.len(),
        "Read Zarr store"
    );
    Ok(dataset)
}

/// Read the single array stored at `path`.
pub fn read_array<P: AsRef<Path>>(path: P) -> Result<Variable> {
    let path = path.as_ref();
    if !is_array_dir(path) {
        return Err(ZarrStoreError::NotAStore(path.display().to_string()));
    }
    let name = path.display().to_string();
    open_variable(open_store(path)?, path, "/", &name)
}

fn open_store(path: &Path) -> Result<Arc<FilesystemStore>> {
    let store = FilesystemStore::new(path)
        .map_err(|e| ZarrStoreError::open(format!("{}: {}", path.display(), e)))?;
    Ok(Arc::new(store))
}

fn is_array_dir(path: &Path) -> bool {
    path.join(".zarray").is_file() || node_type(path).as_deref() == Some("array")
}

fn is_group_dir(path: &Path) -> bool {
    path.join(".zgroup").is_file() || node_type(path).as_deref() == Some("group")
}

/// `node_type` of a V3 `zarr.json`, if any.
fn node_type(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path.join("zarr.json")).ok()?;
    let meta: Value = serde_json::from_str(&text).ok()?;
    meta.get("node_type")?.as_str().map(str::to_string)
}

/// `fill_value` of a V2 `.zarray`, where xarray keeps the missing-value marker.
///
/// V3 fill values only initialise unwritten chunks and are not a mask.
fn v2_fill_value(dir: &Path) -> Option<f64> {
    let text = std::fs::read_to_string(dir.join(".zarray")).ok()?;
    let meta: Value = serde_json::from_str(&text).ok()?;
    meta.get("fill_value")?.as_f64().filter(|v| !v.is_nan())
}

fn open_variable(
    store: Arc<FilesystemStore>,
    dir: &Path,
    array_path: &str,
    name: &str,
) -> Result<Variable> {
    let array = Array::open(store, array_path)
        .map_err(|e| ZarrStoreError::open(format!("{}: {}", name, e)))?;

    let shape: Vec<usize> = array.shape().iter().map(|&n| n as usize).collect();
    let subset = ArraySubset::new_with_shape(array.shape().to_vec());

    macro_rules! retrieve_as_f64 {
        ($t:ty) => {
            array
                .retrieve_array_subset_elements::<$t>(&subset)
                .map_err(|e| ZarrStoreError::read(format!("{}: {}", name, e)))?
                .into_iter()
                .map(|v| v as f64)
                .collect::<Vec<f64>>()
        };
    }

    let raw = match array.data_type() {
        DataType::Float64 => retrieve_as_f64!(f64),
        DataType::Float32 => retrieve_as_f64!(f32),
        DataType::Int64 => retrieve_as_f64!(i64),
        DataType::Int32 => retrieve_as_f64!(i32),
        DataType::Int16 => retrieve_as_f64!(i16),
        DataType::Int8 => retrieve_as_f64!(i8),
        DataType::UInt64 => retrieve_as_f64!(u64),
        DataType::UInt32 => retrieve_as_f64!(u32),
        DataType::UInt16 => retrieve_as_f64!(u16),
        DataType::UInt8 => retrieve_as_f64!(u8),
        DataType::Bool => array
            .retrieve_array_subset_elements::<bool>(&subset)
            .map_err(|e| ZarrStoreError::read(format!("{}: {}", name, e)))?
            .into_iter()
            .map(|v| if v { 1.0 } else { 0.0 })
            .collect(),
        other => {
            return Err(ZarrStoreError::UnsupportedType {
                array: name.to_string(),
                data_type: format!("{:?}", other),
            })
        }
    };

    let attrs = array.attributes();
    let number = |key: &str| attrs.get(key).and_then(Value::as_f64);
    let fill = number("_FillValue").or_else(|| v2_fill_value(dir));
    let scale = number("scale_factor").unwrap_or(1.0);
    let offset = number("add_offset").unwrap_or(0.0);
    let values: Vec<f64> = raw
        .into_iter()
        .map(|v| if Some(v) == fill { f64::NAN } else { v * scale + offset })
        .collect();

    let dims = dimension_names(&array, shape.len());
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| ZarrStoreError::read(format!("{}: {}", name, e)))?;
    let mut variable = Variable::new(dims, data)?;

    for (key, value) in attrs {
        if RESERVED_ATTRS.contains(&key.as_str()) {
            continue;
        }
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        variable.attrs.insert(key.clone(), text);
    }
    Ok(variable)
}

/// Dimension names of an array: V3 metadata, then `_ARRAY_DIMENSIONS`, then `dim_{i}`.
fn dimension_names(array: &Array<FilesystemStore>, ndim: usize) -> Vec<String> {
    if let Some(names) = array.dimension_names() {
        let names: Option<Vec<String>> = names
            .iter()
            .map(|n| n.as_str().map(str::to_string))
            .collect();
        if let Some(names) = names.filter(|n| n.len() == ndim) {
            return names;
        }
    }

    if let Some(Value::Array(items)) = array.attributes().get("_ARRAY_DIMENSIONS") {
        let names: Option<Vec<String>> = items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect();
        if let Some(names) = names.filter(|n| n.len() == ndim) {
            return names;
        }
    }

    (0..ndim).map(|i| format!("dim_{}", i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_is_not_a_store() {
        let result = read_store("/nonexistent/store.zarr");
        assert!(matches!(result, Err(ZarrStoreError::NotAStore(_))));
    }

    #[test]
    fn test_plain_directory_is_not_a_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("not_an_array")).unwrap();
        let result = read_store(dir.path());
        assert!(matches!(result, Err(ZarrStoreError::NotAStore(_))));
    }

    #[test]
    fn test_node_type_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("zarr.json"),
            r#"{"zarr_format": 3, "node_type": "group", "attributes": {}}"#,
        )
        .unwrap();
        assert!(is_group_dir(dir.path()));
        assert!(!is_array_dir(dir.path()));
    }

    #[test]
    fn test_v2_fill_value() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(v2_fill_value(dir.path()), None);

        std::fs::write(dir.path().join(".zarray"), r#"{"zarr_format": 2, "fill_value": -32768}"#).unwrap();
        assert_eq!(v2_fill_value(dir.path()), Some(-32768.0));

        std::fs::write(dir.path().join(".zarray"), r#"{"zarr_format": 2, "fill_value": null}"#).unwrap();
        assert_eq!(v2_fill_value(dir.path()), None);

        std::fs::write(dir.path().join(".zarray"), r#"{"zarr_format": 2, "fill_value": "NaN"}"#).unwrap();
        assert_eq!(v2_fill_value(dir.path()), None);
    }
}
