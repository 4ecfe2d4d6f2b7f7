//! Zarr directory stores as [`ocean_common::Dataset`]s.
//!
//! Reads either a group (every child array becomes a variable) or a single
//! array at the store root. Both Zarr V3 (`zarr.json`) and V2 (`.zarray`)
//! layouts are understood. Dimension names come from the V3
//! `dimension_names` field, falling back to the xarray `_ARRAY_DIMENSIONS`
//! attribute.
//!
//! Writing produces a V3 group of `float64` arrays, plus `uint8` arrays for
//! boolean masks.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{Result, ZarrStoreError};
pub use reader::{read_array, read_store};
pub use writer::{write_dataset, write_mask};
