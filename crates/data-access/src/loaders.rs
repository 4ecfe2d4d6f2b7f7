//! Loader registry: turns a resolved path into a [`Payload`].
//!
//! Four formats are registered:
//!
//! | tag | loader |
//! |-----|--------|
//! | `netcdf` | single NetCDF file (plain or `.gz`) |
//! | `zarr` | Zarr directory store |
//! | `csv` | delimited text table |
//! | `mfd` / `multi-file-netcdf` | directory of NetCDF files joined along one dimension |
//!
//! Every loader accepts the same `(path, filter_pattern, options)` triple;
//! only the multi-file loader uses the pattern.

use std::fmt;
use std::path::{Path, PathBuf};

use ocean_common::{Dataset, Payload, Table};
use regex::Regex;
use tracing::{debug, info};

use crate::config::LoadOptions;
use crate::error::{DataError, Result};

/// Default file endings kept by the multi-file loader.
pub const DEFAULT_EXTENSIONS: [&str; 2] = [".nc", ".gz"];

/// Default concatenation dimension of the multi-file loader.
pub const DEFAULT_CONCAT_DIM: &str = "time";

/// Registered on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    NetCdf,
    Zarr,
    Csv,
    MultiFile,
}

impl FileFormat {
    pub const ALL: [FileFormat; 4] = [
        FileFormat::NetCdf,
        FileFormat::Zarr,
        FileFormat::Csv,
        FileFormat::MultiFile,
    ];

    /// Canonical tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::NetCdf => "netcdf",
            FileFormat::Zarr => "zarr",
            FileFormat::Csv => "csv",
            FileFormat::MultiFile => "mfd",
        }
    }

    /// Parse a loader tag, case-insensitively.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag.trim().to_lowercase().as_str() {
            "netcdf" => Ok(FileFormat::NetCdf),
            "zarr" => Ok(FileFormat::Zarr),
            "csv" => Ok(FileFormat::Csv),
            "mfd" | "multi-file-netcdf" => Ok(FileFormat::MultiFile),
            _ => Err(DataError::UnknownFormat {
                tag: tag.to_string(),
                valid: Self::ALL.map(|f| f.as_str()).join(", "),
            }),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads one data location.
pub trait Loader: Send + Sync {
    fn format(&self) -> FileFormat;

    /// Load the data at `path`. `filter_pattern` selects files inside a
    /// directory and is ignored by single-file loaders.
    fn load(&self, path: &Path, filter_pattern: &str, options: &LoadOptions) -> Result<Payload>;
}

/// Loader for a registered format.
pub fn get_loader(format: FileFormat) -> Box<dyn Loader> {
    match format {
        FileFormat::NetCdf => Box::new(NetCdfLoader),
        FileFormat::Zarr => Box::new(ZarrLoader),
        FileFormat::Csv => Box::new(CsvLoader),
        FileFormat::MultiFile => Box::new(MultiFileLoader),
    }
}

/// Loader for a tag, failing with `UnknownFormat`.
pub fn loader_for_tag(tag: &str) -> Result<Box<dyn Loader>> {
    Ok(get_loader(FileFormat::from_tag(tag)?))
}

/// Single NetCDF file.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetCdfLoader;

impl Loader for NetCdfLoader {
    fn format(&self) -> FileFormat {
        FileFormat::NetCdf
    }

    fn load(&self, path: &Path, _filter_pattern: &str, options: &LoadOptions) -> Result<Payload> {
        let dataset = netcdf_parser::read_any(path)?;
        Ok(Payload::Grid(finish_dataset(dataset, options)?))
    }
}

/// Zarr directory store.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZarrLoader;

impl Loader for ZarrLoader {
    fn format(&self) -> FileFormat {
        FileFormat::Zarr
    }

    fn load(&self, path: &Path, _filter_pattern: &str, options: &LoadOptions) -> Result<Payload> {
        let dataset = zarr_store::read_store(path)?;
        Ok(Payload::Grid(finish_dataset(dataset, options)?))
    }
}

/// Delimited text table.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvLoader;

impl Loader for CsvLoader {
    fn format(&self) -> FileFormat {
        FileFormat::Csv
    }

    fn load(&self, path: &Path, _filter_pattern: &str, options: &LoadOptions) -> Result<Payload> {
        let table = read_table(
            path,
            options.delimiter.unwrap_or(','),
            options.has_headers.unwrap_or(true),
        )?;
        let table = match &options.variables {
            Some(columns) => table.select(columns)?,
            None => table,
        };
        Ok(Payload::Table(table))
    }
}

/// Directory of NetCDF files concatenated along one dimension.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultiFileLoader;

impl Loader for MultiFileLoader {
    fn format(&self) -> FileFormat {
        FileFormat::MultiFile
    }

    fn load(&self, path: &Path, filter_pattern: &str, options: &LoadOptions) -> Result<Payload> {
        let extensions: Vec<String> = match &options.extensions {
            Some(exts) => exts.clone(),
            None => DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        };
        let files = select_files(path, filter_pattern, &extensions)?;
        let concat_dim = options.concat_dim.as_deref().unwrap_or(DEFAULT_CONCAT_DIM);

        info!(
            path = %path.display(),
            files = files.len(),
            concat_dim = %concat_dim,
            "Loading multi-file dataset"
        );

        let parts = files
            .iter()
            .map(|file| netcdf_parser::read_any(file).map_err(DataError::from))
            .collect::<Result<Vec<Dataset>>>()?;
        let dataset = Dataset::concat(parts, concat_dim)?;
        Ok(Payload::Grid(finish_dataset(dataset, options)?))
    }
}

/// List the files of `dir` (non-recursively) whose name ends with one of
/// `extensions` and contains a match of `pattern`, sorted by name.
///
/// An empty pattern matches every name. Fails with `EmptyLocation` when
/// nothing is selected.
pub fn select_files(dir: &Path, pattern: &str, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let regex = Regex::new(pattern)?;

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if extensions.iter().any(|ext| name.ends_with(ext.as_str())) && regex.is_match(name) {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(DataError::EmptyLocation(dir.to_path_buf()));
    }
    files.sort();

    debug!(
        dir = %dir.display(),
        pattern = %pattern,
        selected = files.len(),
        "Selected files"
    );
    Ok(files)
}

/// Read a delimited text file into a [`Table`].
///
/// Without a header row, columns are named by position (`0`, `1`, ...).
pub fn read_table(path: &Path, delimiter: char, has_headers: bool) -> Result<Table> {
    let delimiter = u8::try_from(delimiter).map_err(|_| {
        DataError::invalid_config(format!("CSV delimiter '{}' is not a single byte", delimiter))
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .from_path(path)?;

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let headers: Vec<String> = if has_headers {
        reader.headers()?.iter().map(str::to_string).collect()
    } else {
        let width = records.first().map_or(0, Vec::len);
        (0..width).map(|i| i.to_string()).collect()
    };

    debug!(path = %path.display(), rows = records.len(), "Read CSV table");
    Ok(Table::from_records(headers, records)?)
}

/// Apply the variable subset and chunk layout of `options`.
fn finish_dataset(dataset: Dataset, options: &LoadOptions) -> Result<Dataset> {
    let mut dataset = match &options.variables {
        Some(names) => dataset.select(names)?,
        None => dataset,
    };
    if !options.chunks.is_empty() {
        dataset.set_chunks(&options.chunks)?;
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.nc", "b.gz", "c.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        dir
    }

    fn defaults() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_every_tag_resolves() {
        for tag in ["netcdf", "zarr", "csv", "mfd", "MFD", "multi-file-netcdf"] {
            let loader = loader_for_tag(tag).unwrap();
            assert_eq!(loader.format(), FileFormat::from_tag(tag).unwrap());
        }
        for format in FileFormat::ALL {
            assert_eq!(get_loader(format).format(), format);
            assert_eq!(FileFormat::from_tag(format.as_str()).unwrap(), format);
        }
    }

    #[test]
    fn test_unknown_tag_lists_valid_ones() {
        let err = FileFormat::from_tag("grib2").unwrap_err();
        assert!(err.to_string().contains("netcdf, zarr, csv, mfd"));
    }

    #[test]
    fn test_select_files_by_extension() {
        let dir = listing();
        let files = select_files(dir.path(), "", &defaults()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.nc", "b.gz"]);
    }

    #[test]
    fn test_select_files_pattern_matching_none() {
        let dir = listing();
        let result = select_files(dir.path(), "^z", &defaults());
        assert!(matches!(result, Err(DataError::EmptyLocation(_))));
    }

    #[test]
    fn test_select_files_pattern_matching_a_only() {
        let dir = listing();
        let files = select_files(dir.path(), "a", &defaults()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.nc")]);
    }

    #[test]
    fn test_select_files_invalid_pattern() {
        let dir = listing();
        assert!(matches!(
            select_files(dir.path(), "(", &defaults()),
            Err(DataError::Regex(_))
        ));
    }

    #[test]
    fn test_read_table_without_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.csv");
        std::fs::write(&path, "1;2\n3;4\n").unwrap();
        let table = read_table(&path, ';', false).unwrap();
        assert_eq!(table.column_names(), &["0", "1"]);
        assert_eq!(table.numeric("1").unwrap(), &[2.0, 4.0]);
    }
}
