//! Weighted metrics against their unweighted counterparts.

use ndarray::{Array3, ArrayD, IxDyn};
use ocean_metrics::{weights_from_std, Metric, Reduction};
use test_utils::{assert_all_approx_eq, assert_approx_eq};

fn field(offset: f64) -> ArrayD<f64> {
    Array3::from_shape_fn((3, 4, 5), |(t, j, i)| {
        offset + (t as f64) * 0.7 + (j as f64).sin() + (i as f64) * 0.3
    })
    .into_dyn()
}

#[test]
fn test_uniform_weights_match_unweighted() {
    let model = field(1.5);
    let mut reference = field(0.5);
    reference[[1, 2, 3].as_slice()] = f64::NAN;
    let uniform = ArrayD::from_elem(IxDyn(&[3, 4, 5]), 2.5);

    for metric in Metric::ALL {
        for reduction in [Reduction::All, Reduction::Axes(vec![1, 2]), Reduction::Axes(vec![0])] {
            let plain = metric.compute(&model, &reference, None, &reduction).unwrap();
            let weighted = metric
                .compute(&model, &reference, Some(&uniform), &reduction)
                .unwrap();
            assert_eq!(plain.shape(), weighted.shape());
            assert_all_approx_eq!(plain.iter().copied(), weighted.iter().copied(), 1e-12);
        }
    }
}

#[test]
fn test_broadcast_weights_over_trailing_axes() {
    let model = field(1.0);
    let reference = field(0.0);
    // One weight per longitude, shared by every time and latitude
    let weights = ndarray::Array1::from_vec(vec![1.0, 0.0, 0.0, 0.0, 0.0]).into_dyn();

    let result = Metric::Bias
        .compute(&model, &reference, Some(&weights), &Reduction::All)
        .unwrap();
    assert_approx_eq!(result[IxDyn(&[])], 1.0, 1e-12);
}

#[test]
fn test_weighted_rmse_emphasises_heavy_cells() {
    let model = ndarray::array![[1.0, 3.0]].into_dyn();
    let reference = ndarray::array![[0.0, 0.0]].into_dyn();
    let weights = ndarray::array![[3.0, 1.0]].into_dyn();

    let result = Metric::Rmse
        .compute(&model, &reference, Some(&weights), &Reduction::All)
        .unwrap();
    // sqrt((3*1 + 1*9) / 4)
    assert_approx_eq!(result[IxDyn(&[])], 3.0f64.sqrt(), 1e-12);
}

#[test]
fn test_weights_from_std_feed_metrics() {
    let std = Array3::from_elem((3, 4, 5), 2.0).into_dyn();
    let weights = weights_from_std(&std, &Reduction::All).unwrap();
    assert_approx_eq!(weights.sum(), 1.0, 1e-12);

    let model = field(1.0);
    let reference = field(0.0);
    let result = Metric::Mae
        .compute(&model, &reference, Some(&weights), &Reduction::All)
        .unwrap();
    assert_approx_eq!(result[IxDyn(&[])], 1.0, 1e-12);
}
