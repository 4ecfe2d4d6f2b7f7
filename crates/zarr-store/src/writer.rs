//! Writing datasets and masks as Zarr V3 stores.

use std::path::Path;
use std::sync::Arc;

use ndarray::ArrayView2;
use ocean_common::{Dataset, Variable};
use serde_json::json;
use tracing::debug;
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

use crate::error::{Result, ZarrStoreError};

/// Write every variable of `dataset` as a `float64` array in a new group.
pub fn write_dataset<P: AsRef<Path>>(path: P, dataset: &Dataset) -> Result<()> {
    let path = path.as_ref();
    let store = create_store(path)?;

    let mut attrs = serde_json::Map::new();
    for (key, value) in dataset.attrs() {
        attrs.insert(key.clone(), json!(value));
    }
    let group = GroupBuilder::new()
        .attributes(attrs)
        .build(store.clone(), "/")
        .map_err(|e| ZarrStoreError::write(e.to_string()))?;
    group
        .store_metadata()
        .map_err(|e| ZarrStoreError::write(e.to_string()))?;

    for (name, var) in dataset.variables() {
        write_variable(&store, &format!("/{}", name), var)?;
    }

    debug!(
        path = %path.display(),
        variables = dataset.len(),
        "Wrote Zarr store"
    );
    Ok(())
}

/// Write a boolean mask as a single `uint8` array at the store root.
pub fn write_mask<P: AsRef<Path>>(path: P, mask: ArrayView2<bool>, dims: [&str; 2]) -> Result<()> {
    let path = path.as_ref();
    let store = create_store(path)?;
    let shape: Vec<u64> = mask.shape().iter().map(|&n| n as u64).collect();

    let mut attrs = serde_json::Map::new();
    attrs.insert("_ARRAY_DIMENSIONS".to_string(), json!(dims));

    let array = build_array(&store, "/", &shape, DataType::UInt8, FillValue::from(0u8), attrs)?;
    let values: Vec<u8> = mask.iter().map(|&inside| u8::from(inside)).collect();
    array
        .store_array_subset_elements(&ArraySubset::new_with_shape(shape), &values)
        .map_err(|e| ZarrStoreError::write(e.to_string()))?;

    debug!(path = %path.display(), "Wrote Zarr mask");
    Ok(())
}

fn create_store(path: &Path) -> Result<Arc<FilesystemStore>> {
    std::fs::create_dir_all(path)?;
    let store = FilesystemStore::new(path)
        .map_err(|e| ZarrStoreError::open(format!("{}: {}", path.display(), e)))?;
    Ok(Arc::new(store))
}

fn write_variable(store: &Arc<FilesystemStore>, array_path: &str, var: &Variable) -> Result<()> {
    let shape: Vec<u64> = var.shape().iter().map(|&n| n as u64).collect();

    let mut attrs = serde_json::Map::new();
    attrs.insert("_ARRAY_DIMENSIONS".to_string(), json!(var.dims));
    for (key, value) in &var.attrs {
        attrs.insert(key.clone(), json!(value));
    }

    let array = build_array(
        store,
        array_path,
        &shape,
        DataType::Float64,
        FillValue::from(f64::NAN),
        attrs,
    )?;
    array
        .store_array_subset_elements(&ArraySubset::new_with_shape(shape), &var.values())
        .map_err(|e| ZarrStoreError::write(format!("{}: {}", array_path, e)))?;
    Ok(())
}

/// Create a single-chunk array and store its metadata.
fn build_array(
    store: &Arc<FilesystemStore>,
    array_path: &str,
    shape: &[u64],
    data_type: DataType,
    fill_value: FillValue,
    attrs: serde_json::Map<String, serde_json::Value>,
) -> Result<Array<FilesystemStore>> {
    // Chunk extents must be non-zero even for empty dimensions
    let chunk_shape: Vec<u64> = shape.iter().map(|&n| n.max(1)).collect();
    let chunk_grid: zarrs::array::ChunkGrid = chunk_shape
        .try_into()
        .map_err(|e| ZarrStoreError::write(format!("{:?}", e)))?;

    let array = ArrayBuilder::new(shape.to_vec(), data_type, chunk_grid, fill_value)
        .attributes(attrs)
        .build(store.clone(), array_path)
        .map_err(|e| ZarrStoreError::write(format!("{}: {}", array_path, e)))?;
    array
        .store_metadata()
        .map_err(|e| ZarrStoreError::write(format!("{}: {}", array_path, e)))?;
    Ok(array)
}
