//! Data-source catalog merged from YAML files.
//!
//! Every `*.yml` / `*.yaml` file of the catalog directory is read in
//! lexicographic order and merged by top-level key, later files winning.
//! `${VAR}` and `${VAR:-default}` are expanded before parsing.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_yaml::Value;
use tracing::{debug, info};

use crate::config::SourceDescriptor;
use crate::error::{DataError, Result};
use crate::grids::GridProvider;
use crate::paths::ProjectPaths;
use crate::source::{DataSource, GriddedSource};

/// Merged catalog of data-source descriptors.
#[derive(Clone)]
pub struct Catalog {
    entries: BTreeMap<String, Value>,
    paths: Arc<ProjectPaths>,
    grids: Option<Arc<dyn GridProvider>>,
}

impl Catalog {
    /// Merge the catalog files of `dir`.
    pub fn load(dir: impl AsRef<Path>, paths: ProjectPaths) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DataError::NotFound {
                path: dir.to_path_buf(),
                searched: vec![dir.to_path_buf()],
            });
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        files.retain(|p| {
            p.is_file()
                && matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yml") | Some("yaml")
                )
        });
        files.sort();

        let mut entries = BTreeMap::new();
        for file in &files {
            let content = fs::read_to_string(file)?;
            let added = merge_document(&mut entries, &content, file)?;
            debug!(file = %file.display(), entries = added, "Merged catalog file");
        }

        info!(
            dir = %dir.display(),
            files = files.len(),
            sources = entries.len(),
            "Loaded data-source catalog"
        );
        Ok(Self::with_entries(entries, paths))
    }

    /// Catalog of the project's configuration directory.
    pub fn from_paths(paths: ProjectPaths) -> Result<Self> {
        let dir = paths.catalog_dir();
        Self::load(dir, paths)
    }

    /// Catalog from a single YAML document.
    pub fn from_yaml_str(yaml: &str, paths: ProjectPaths) -> Result<Self> {
        let mut entries = BTreeMap::new();
        merge_document(&mut entries, yaml, Path::new("<inline>"))?;
        Ok(Self::with_entries(entries, paths))
    }

    fn with_entries(entries: BTreeMap<String, Value>, paths: ProjectPaths) -> Self {
        Self {
            entries,
            paths: Arc::new(paths),
            grids: None,
        }
    }

    /// Sources created from this catalog use `grids` instead of grid files.
    pub fn with_grids(mut self, grids: Arc<dyn GridProvider>) -> Self {
        self.grids = Some(grids);
        self
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Source names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Typed, validated descriptor of `name`.
    pub fn descriptor(&self, name: &str) -> Result<SourceDescriptor> {
        let value = self
            .entries
            .get(name)
            .ok_or_else(|| DataError::MissingConfigKey {
                name: name.to_string(),
                available: self.names().join(", "),
            })?;

        let mut descriptor: SourceDescriptor = serde_yaml::from_value(value.clone())
            .map_err(|e| DataError::invalid_config(format!("source '{}': {}", name, e)))?;
        if descriptor.name.is_empty() {
            descriptor.name = name.to_string();
        }
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Unloaded source for `name`.
    pub fn source(&self, name: &str) -> Result<DataSource> {
        let source = DataSource::new(self.descriptor(name)?, Arc::clone(&self.paths));
        Ok(match &self.grids {
            Some(grids) => source.with_grids(Arc::clone(grids)),
            None => source,
        })
    }

    /// Unloaded gridded source for `name`.
    pub fn gridded(&self, name: &str) -> Result<GriddedSource> {
        Ok(GriddedSource::new(self.source(name)?))
    }

    /// Unloaded sources for several names, in order.
    pub fn create_sources<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<DataSource>> {
        names.iter().map(|n| self.source(n.as_ref())).collect()
    }
}

/// Merge one YAML document into `entries`, returning its number of keys.
fn merge_document(entries: &mut BTreeMap<String, Value>, content: &str, origin: &Path) -> Result<usize> {
    let expanded = expand_env_vars(content)?;
    let document: Value = serde_yaml::from_str(&expanded)?;
    let mapping = match document {
        Value::Null => return Ok(0),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(DataError::invalid_config(format!(
                "{} is not a mapping of data sources",
                origin.display()
            )))
        }
    };

    let added = mapping.len();
    for (key, value) in mapping {
        let key = key.as_str().map(str::to_string).ok_or_else(|| {
            DataError::invalid_config(format!("{}: source names must be strings", origin.display()))
        })?;
        entries.insert(key, value);
    }
    Ok(added)
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content.
/// Supports ${VAR} and ${VAR:-default} syntax.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => {
                        return Err(DataError::invalid_config(format!(
                            "unclosed variable substitution: ${{{}",
                            var_expr
                        )))
                    }
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve a variable expression (`VAR` or `VAR:-default`).
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).map_err(|_| {
            DataError::invalid_config(format!("environment variable {} not set", expr))
        })
    }
}
