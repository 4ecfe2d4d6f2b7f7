//! Common test fixtures for ocean-data tests.
//!
//! Pre-defined configuration snippets and polygons that mirror the files of
//! a real project tree.

/// Grid configurations used by the staggered-grid cleaners.
pub mod grid {
    /// Default SYMPHONIE configuration name
    pub const SEA_312: &str = "SEA_312";

    /// Grid file name of the default configuration
    pub const SEA_312_FILE: &str = "grid_SEA_312.nc";

    /// Placements a grid file can describe horizontally
    pub const PLACEMENTS: [&str; 4] = ["t", "u", "v", "f"];
}

/// Zone polygons.
pub mod zones {
    /// A unit square around (100.5°E, 5.5°N), as stored under `ZONES/`
    pub const SQUARE_CSV: &str = "\
longitude,latitude
100.0,5.0
101.0,5.0
101.0,6.0
100.0,6.0
";

    /// A triangle with its apex to the north
    pub const TRIANGLE_CSV: &str = "\
longitude,latitude
100.0,0.0
110.0,0.0
105.0,10.0
";

    /// Polygon file without the required columns
    pub const BAD_HEADERS_CSV: &str = "\
x,y
100.0,5.0
";
}

/// YAML data-source catalogs.
pub mod catalogs {
    /// Satellite and reanalysis sources
    pub const OBSERVATIONS_YML: &str = r#"
OSTIA:
  file_type: zarr
  file_path: OSTIA/sst.zarr
  data_type: satellite
  cleaning: ostia
  processing_level: raw

GLORYS:
  file_type: netcdf
  file_path: GLORYS/glorys.nc
  data_type: model
  model: GLORYS
  cleaning: glorys
"#;

    /// SYMPHONIE runs and their grid
    pub const SYMPHONIE_YML: &str = r#"
run01:
  file_type: mfd
  file_path: SYMPHONIE/run01
  data_type: model
  model: SYMPHONIE
  cleaning: sea312
  loading_kwargs:
    concat_dim: time
    chunks:
      time: 1
  cleaning_kwargs:
    configuration: SEA_312

grid312:
  file_type: netcdf
  file_path: GRIDS/grid_SEA_312.nc
  data_type: grid
  model: SYMPHONIE
  cleaning: sym_grd
"#;

    /// A later file overriding `OSTIA`
    pub const OVERRIDE_YML: &str = r#"
OSTIA:
  file_type: netcdf
  file_path: OSTIA/sst.nc
  data_type: satellite
  cleaning: ostia
"#;

    /// An ARGO float table
    pub const ARGO_YML: &str = r#"
argo:
  file_type: csv
  file_path: ARGO/profiles.csv
  data_type: observation
"#;
}
