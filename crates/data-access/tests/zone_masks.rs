//! Zone masks computed from polygons and cached as Zarr arrays.

use data_access::{DataError, ProjectPaths, ZoneMasks};
use test_utils::{zones, ScratchProject};

fn axes() -> (Vec<f64>, Vec<f64>) {
    let lons: Vec<f64> = (0..6).map(|i| 99.25 + 0.5 * i as f64).collect();
    let lats: Vec<f64> = (0..4).map(|j| 4.75 + 0.5 * j as f64).collect();
    (lons, lats)
}

#[test]
fn test_mask_is_computed_then_cached() {
    let project = ScratchProject::new();
    project.write_file("data/01_raw/ZONES/SQ.csv", zones::SQUARE_CSV);
    let masks = ZoneMasks::from_paths(&ProjectPaths::at(project.root()));
    let (lons, lats) = axes();

    let mask = masks.mask("SQ", "SEA_312", &lons, &lats).unwrap();
    assert_eq!(mask.shape(), &[6, 4]);
    // 100.25 and 100.75 by 5.25 and 5.75
    assert_eq!(mask.iter().filter(|&&m| m).count(), 4);
    assert!(mask[[2, 1]]);
    assert!(!mask[[0, 0]]);
    assert!(masks.cache_path("SQ", "SEA_312").exists());

    // The cache no longer needs the polygon
    std::fs::remove_file(masks.polygon_path("SQ")).unwrap();
    let cached = masks.mask("SQ", "SEA_312", &lons, &lats).unwrap();
    assert_eq!(cached, mask);
}

#[test]
fn test_stale_cache_is_recomputed() {
    let project = ScratchProject::new();
    project.write_file("data/01_raw/ZONES/TRI.csv", zones::TRIANGLE_CSV);
    let masks = ZoneMasks::new(project.zones());

    masks.mask("TRI", "coarse", &[105.0], &[1.0, 9.0]).unwrap();
    let mask = masks.mask("TRI", "coarse", &[101.0, 105.0], &[1.0, 9.0]).unwrap();
    assert_eq!(mask.shape(), &[2, 2]);
    assert!(mask[[1, 0]]);
    assert!(mask[[1, 1]]);
    assert!(!mask[[0, 1]]);
}

#[test]
fn test_missing_polygon() {
    let project = ScratchProject::new();
    let masks = ZoneMasks::new(project.zones());
    let (lons, lats) = axes();
    assert!(matches!(
        masks.mask("SCS", "SEA_312", &lons, &lats),
        Err(DataError::NotFound { .. })
    ));
}

#[test]
fn test_polygon_without_coordinate_columns() {
    let project = ScratchProject::new();
    project.write_file("data/01_raw/ZONES/BAD.csv", zones::BAD_HEADERS_CSV);
    let masks = ZoneMasks::new(project.zones());
    assert!(matches!(masks.polygon("BAD"), Err(DataError::Dataset(_))));
}
