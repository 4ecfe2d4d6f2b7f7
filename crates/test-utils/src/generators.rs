//! Synthetic ocean datasets with predictable values.
//!
//! Horizontal coordinates follow a regular 0.5° lattice starting at
//! (100°E, 0°N); placements `u`, `v` and `f` are shifted by half a cell
//! east, north or both, as on an Arakawa C grid.

use ndarray::{Array1, Array2, Array3, Array4};
use ocean_common::{Dataset, Variable};

use crate::fixtures::grid;

/// Longitude of the first `t` column.
pub const LON0: f64 = 100.0;
/// Latitude of the first `t` row.
pub const LAT0: f64 = 0.0;
/// Grid spacing in degrees.
pub const STEP: f64 = 0.5;

fn shift(placement: &str) -> (f64, f64) {
    match placement {
        "u" => (STEP / 2.0, 0.0),
        "v" => (0.0, STEP / 2.0),
        "f" => (STEP / 2.0, STEP / 2.0),
        _ => (0.0, 0.0),
    }
}

/// Expected 1-D longitudes of a placement on the synthetic grid.
pub fn expected_lons(placement: &str, ni: usize) -> Vec<f64> {
    let (dx, _) = shift(placement);
    (0..ni).map(|i| LON0 + dx + i as f64 * STEP).collect()
}

/// Expected 1-D latitudes of a placement on the synthetic grid.
pub fn expected_lats(placement: &str, nj: usize) -> Vec<f64> {
    let (_, dy) = shift(placement);
    (0..nj).map(|j| LAT0 + dy + j as f64 * STEP).collect()
}

fn var(dims: &[&str], data: ndarray::ArrayD<f64>) -> Variable {
    Variable::new(dims.to_vec(), data).expect("fixture dimensions are consistent")
}

fn insert(ds: &mut Dataset, name: &str, v: Variable) {
    ds.insert(name, v).expect("fixture sizes are consistent");
}

/// A SYMPHONIE grid file with placements `t`, `u`, `v`, `f`.
///
/// Horizontal fields `longitude_{p}`/`latitude_{p}` are 2-D over
/// `(nj_{p}, ni_{p})`; depth fields `depth_{t,u,v,w}` are 3-D over
/// `(nk_{p}, nj_{p}, ni_{p})` with `nk_w = nk + 1`, positive downward,
/// `10 m` per level.
pub fn staggered_grid(ni: usize, nj: usize, nk: usize) -> Dataset {
    staggered_grid_with(ni, nj, nk, &grid::PLACEMENTS)
}

/// Like [`staggered_grid`] but with only the given horizontal placements.
pub fn staggered_grid_with(ni: usize, nj: usize, nk: usize, placements: &[&str]) -> Dataset {
    let mut ds = Dataset::new();
    for &p in placements {
        let (dx, dy) = shift(p);
        let ni_p = format!("ni_{}", p);
        let nj_p = format!("nj_{}", p);
        let lon = Array2::from_shape_fn((nj, ni), |(_, i)| LON0 + dx + i as f64 * STEP);
        let lat = Array2::from_shape_fn((nj, ni), |(j, _)| LAT0 + dy + j as f64 * STEP);
        insert(&mut ds, &format!("longitude_{}", p), var(&[&nj_p, &ni_p], lon.into_dyn()));
        insert(&mut ds, &format!("latitude_{}", p), var(&[&nj_p, &ni_p], lat.into_dyn()));
    }
    for p in ["t", "u", "v", "w"] {
        let levels = if p == "w" { nk + 1 } else { nk };
        let h = if p == "w" { "t" } else { p };
        let depth = Array3::from_shape_fn((levels, nj, ni), |(k, _, _)| 5.0 + 10.0 * k as f64);
        insert(
            &mut ds,
            &format!("depth_{}", p),
            var(
                &[&format!("nk_{}", p), &format!("nj_{}", h), &format!("ni_{}", h)],
                depth.into_dyn(),
            ),
        );
    }
    ds
}

/// A raw SYMPHONIE 3-D output over `nt` time steps.
///
/// `tem` is `20 + t + k / 10` over `(time, nk_t, nj_t, ni_t)`; `sal` is a
/// constant 34; velocities live on `u` and `v`. Legacy fields
/// `cumulativetime`, `longitude_t` and `latitude_t` are present.
pub fn symphonie_output(ni: usize, nj: usize, nk: usize, nt: usize) -> Dataset {
    let mut ds = Dataset::new();
    let tem = Array4::from_shape_fn((nt, nk, nj, ni), |(t, k, _, _)| 20.0 + t as f64 + k as f64 / 10.0);
    let sal = Array4::from_elem((nt, nk, nj, ni), 34.0);
    let u = Array4::from_elem((nt, nk, nj, ni), 0.1);
    let v = Array4::from_elem((nt, nk, nj, ni), -0.1);
    insert(&mut ds, "tem", var(&["time", "nk_t", "nj_t", "ni_t"], tem.into_dyn()));
    insert(&mut ds, "sal", var(&["time", "nk_t", "nj_t", "ni_t"], sal.into_dyn()));
    insert(&mut ds, "vel_u", var(&["time", "nk_u", "nj_u", "ni_u"], u.into_dyn()));
    insert(&mut ds, "vel_v", var(&["time", "nk_v", "nj_v", "ni_v"], v.into_dyn()));
    insert(
        &mut ds,
        "time",
        Variable::coordinate("time", Array1::from_iter((0..nt).map(|t| t as f64 * 86400.0))),
    );
    insert(
        &mut ds,
        "cumulativetime",
        var(&["time"], Array1::from_iter((0..nt).map(|t| t as f64)).into_dyn()),
    );
    let grid = staggered_grid_with(ni, nj, nk, &["t"]);
    for name in ["longitude_t", "latitude_t"] {
        if let Some(v) = grid.get(name) {
            insert(&mut ds, name, v.clone());
        }
    }
    ds
}

/// A raw SYMPHONIE surface output: one time step, one level.
pub fn symphonie_surface_output(ni: usize, nj: usize) -> Dataset {
    let mut ds = Dataset::new();
    let ssh = Array3::from_shape_fn((1, nj, ni), |(_, j, i)| 0.01 * (i + j) as f64);
    let sst = Array4::from_elem((1, 1, nj, ni), 29.0);
    insert(&mut ds, "ssh_w", var(&["time", "nj_w", "ni_w"], ssh.into_dyn()));
    insert(&mut ds, "tem", var(&["time", "nk_t", "nj_t", "ni_t"], sst.into_dyn()));
    insert(&mut ds, "cumulativetime", var(&["time"], Array1::from_elem(1, 0.0).into_dyn()));
    ds
}

/// An OSTIA SST field in Kelvin over `(time, lat, lon)`.
pub fn ostia_sst(kelvin: &[f64]) -> Dataset {
    let n = kelvin.len();
    let data = Array3::from_shape_vec((1, 1, n), kelvin.to_vec()).expect("1 x 1 x n");
    let mut ds = Dataset::new();
    insert(
        &mut ds,
        "analysed_sst",
        var(&["time", "lat", "lon"], data.into_dyn()).with_attr("units", "kelvin"),
    );
    insert(&mut ds, "lat", Variable::coordinate("lat", Array1::from_elem(1, 5.0)));
    insert(
        &mut ds,
        "lon",
        Variable::coordinate("lon", Array1::from_iter((0..n).map(|i| LON0 + i as f64 * STEP))),
    );
    ds
}

/// A GLORYS reanalysis extract over `(time, depth, latitude, longitude)`.
pub fn glorys_output(ni: usize, nj: usize, nk: usize) -> Dataset {
    let mut ds = Dataset::new();
    let thetao = Array4::from_shape_fn((1, nk, nj, ni), |(_, k, _, _)| 28.0 - k as f64);
    let so = Array4::from_elem((1, nk, nj, ni), 34.5);
    let dims = ["time", "depth", "latitude", "longitude"];
    insert(&mut ds, "thetao", var(&dims, thetao.into_dyn()));
    insert(&mut ds, "so", var(&dims, so.into_dyn()));
    insert(
        &mut ds,
        "longitude",
        Variable::coordinate("longitude", Array1::from_vec(expected_lons("t", ni))),
    );
    insert(
        &mut ds,
        "latitude",
        Variable::coordinate("latitude", Array1::from_vec(expected_lats("t", nj))),
    );
    insert(
        &mut ds,
        "depth",
        Variable::coordinate("depth", Array1::from_iter((0..nk).map(|k| 0.5 + 10.0 * k as f64))),
    );
    ds
}

/// A NEMO output on `t` points, dimensions `(time_counter, deptht, y, x)`.
pub fn nemo_output(ni: usize, nj: usize, nk: usize) -> Dataset {
    let mut ds = Dataset::new();
    let thetao = Array4::from_elem((1, nk, nj, ni), 27.0);
    let dims = ["time_counter", "deptht", "y", "x"];
    insert(&mut ds, "thetao", var(&dims, thetao.clone().into_dyn()));
    insert(&mut ds, "so", var(&dims, thetao.mapv(|_| 34.0).into_dyn()));
    insert(
        &mut ds,
        "deptht",
        Variable::coordinate("deptht", Array1::from_iter((0..nk).map(|k| 1.0 + k as f64))),
    );
    ds
}
