//! Typed data-source descriptors.
//!
//! A descriptor is one entry of the merged YAML catalog:
//!
//! ```yaml
//! run01:
//!   file_type: mfd
//!   file_path: SYMPHONIE/run01
//!   data_type: model
//!   model: SYMPHONIE
//!   cleaning: sea312
//!   loading_kwargs:
//!     chunks: {time: 1}
//!   cleaning_kwargs:
//!     configuration: SEA_312
//! ```
//!
//! Unknown keys are rejected at every level.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use ocean_common::Placement;
use serde::{Deserialize, Serialize};

use crate::cleaners::CleaningStrategy;
use crate::error::{DataError, Result};
use crate::loaders::FileFormat;

/// Broad family of a data source; drives coordinate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Satellite,
    Model,
    Grid,
    Observation,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Satellite => "satellite",
            DataKind::Model => "model",
            DataKind::Grid => "grid",
            DataKind::Observation => "observation",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far a source has been processed: a step count or a level name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessingLevel {
    Steps(u32),
    Named(String),
}

impl Default for ProcessingLevel {
    fn default() -> Self {
        ProcessingLevel::Steps(0)
    }
}

impl fmt::Display for ProcessingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingLevel::Steps(n) => write!(f, "{}", n),
            ProcessingLevel::Named(name) => f.write_str(name),
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDescriptor {
    /// Defaults to the catalog key
    #[serde(default)]
    pub name: String,
    /// Loader tag (`netcdf`, `zarr`, `csv`, `mfd`)
    pub file_type: String,
    /// Logical path, resolved against the project search roots
    pub file_path: PathBuf,
    pub data_type: DataKind,
    /// Cleaner tag; absent means no cleaning
    #[serde(default, alias = "cleaning_strategy")]
    pub cleaning: Option<String>,
    #[serde(default)]
    pub loading_kwargs: LoadOptions,
    #[serde(default)]
    pub cleaning_kwargs: CleaningOptions,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub processing_level: ProcessingLevel,
}

impl SourceDescriptor {
    /// Check that the loader and cleaner tags are registered.
    pub fn validate(&self) -> Result<()> {
        self.format()?;
        self.strategy()?;
        if self.file_path.as_os_str().is_empty() {
            return Err(DataError::invalid_config(format!(
                "source '{}' has an empty file_path",
                self.name
            )));
        }
        Ok(())
    }

    pub fn format(&self) -> Result<FileFormat> {
        FileFormat::from_tag(&self.file_type)
    }

    pub fn strategy(&self) -> Result<Option<CleaningStrategy>> {
        self.cleaning
            .as_deref()
            .map(CleaningStrategy::from_tag)
            .transpose()
    }
}

/// Loader options (`loading_kwargs`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadOptions {
    /// Chunk size per dimension, recorded on the loaded dataset
    pub chunks: BTreeMap<String, usize>,
    /// Dimension along which multi-file datasets are joined (default `time`)
    pub concat_dim: Option<String>,
    /// File name endings kept by the multi-file loader (default `.nc`, `.gz`)
    pub extensions: Option<Vec<String>>,
    /// Variables (or columns) to keep
    pub variables: Option<Vec<String>>,
    /// CSV field delimiter (default `,`)
    pub delimiter: Option<char>,
    /// Whether the CSV file has a header row (default true)
    pub has_headers: Option<bool>,
}

/// What a cleaner does when the raw data does not fit its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPolicy {
    /// Fail with a SchemaAdaptation error
    Strict,
    /// Log a warning and return the raw data unchanged
    Passthrough,
}

/// Cleaner options (`cleaning_kwargs`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleaningOptions {
    /// Grid configuration name (default `SEA_312`)
    pub configuration: Option<String>,
    /// Grid coordinates variant, appended to the grid file name
    pub coordinates: Option<String>,
    /// Source field of the satellite cleaner (default `analysed_sst`)
    pub field: Option<String>,
    /// NEMO configuration name (`SEAsia` or other)
    pub nemo_config: Option<String>,
    /// Placement of NEMO output files (default `t`)
    pub placement: Option<Placement>,
    /// Overrides the cleaner's default schema policy
    pub on_schema_error: Option<SchemaPolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_descriptor() {
        let yaml = r#"
file_type: mfd
file_path: SYMPHONIE/run01
data_type: model
model: SYMPHONIE
cleaning_strategy: sea312
processing_level: 1
loading_kwargs:
  chunks: {time: 2}
  extensions: [".nc"]
cleaning_kwargs:
  configuration: SEA_312
  on_schema_error: passthrough
"#;
        let desc: SourceDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(desc.cleaning.as_deref(), Some("sea312"));
        assert_eq!(desc.loading_kwargs.chunks.get("time"), Some(&2));
        assert_eq!(desc.processing_level, ProcessingLevel::Steps(1));
        assert_eq!(
            desc.cleaning_kwargs.on_schema_error,
            Some(SchemaPolicy::Passthrough)
        );
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let yaml = "file_type: netcdf\nfile_path: a.nc\ndata_type: grid\ncolour: blue\n";
        assert!(serde_yaml::from_str::<SourceDescriptor>(yaml).is_err());

        let yaml = "file_type: netcdf\nfile_path: a.nc\ndata_type: grid\nloading_kwargs: {engine: h5}\n";
        assert!(serde_yaml::from_str::<SourceDescriptor>(yaml).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_tags() {
        let yaml = "file_type: grib\nfile_path: a.grb\ndata_type: model\n";
        let desc: SourceDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(desc.validate(), Err(DataError::UnknownFormat { .. })));

        let yaml = "file_type: netcdf\nfile_path: a.nc\ndata_type: model\ncleaning: mercator\n";
        let desc: SourceDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(desc.validate(), Err(DataError::UnknownStrategy { .. })));
    }

    #[test]
    fn test_named_processing_level() {
        let yaml = "file_type: zarr\nfile_path: a.zarr\ndata_type: satellite\nprocessing_level: raw\n";
        let desc: SourceDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(desc.processing_level.to_string(), "raw");
    }
}
