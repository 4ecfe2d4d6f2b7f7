//! Comparison metrics between a field and its reference.
//!
//! Every metric takes two equally shaped arrays, an optional weight array
//! broadcastable to them (trailing axes aligned, as in ndarray), and a
//! [`Reduction`] naming the axes to collapse. NaN entries are skipped
//! together with their weights; a group with no valid entry yields NaN.
//!
//! Weighted mean is `Σw·x / Σw` and weighted standard deviation is the
//! population form `sqrt(Σw·(x − m)² / Σw)`, so uniform weights reproduce the
//! unweighted results.

pub mod error;

use ndarray::{Array2, ArrayD, ArrayViewD, Axis, IxDyn};
use serde::{Deserialize, Serialize};

pub use error::{MetricError, MetricResult};

/// Axes collapsed by a metric.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Reduction {
    /// Reduce to a 0-d array
    #[default]
    All,
    /// Reduce only these axes, keeping the others in order
    Axes(Vec<usize>),
}

impl Reduction {
    /// Sorted, deduplicated axes to reduce for an `ndim`-d array.
    pub fn axes(&self, ndim: usize) -> MetricResult<Vec<usize>> {
        match self {
            Reduction::All => Ok((0..ndim).collect()),
            Reduction::Axes(axes) => {
                let mut axes = axes.clone();
                axes.sort_unstable();
                axes.dedup();
                if let Some(&axis) = axes.iter().find(|&&a| a >= ndim) {
                    return Err(MetricError::AxisOutOfRange { axis, ndim });
                }
                Ok(axes)
            }
        }
    }
}

/// Statistic applied to each reduced group.
#[derive(Debug, Clone, Copy)]
enum Stat {
    Mean,
    Std,
}

/// Registered metric functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Rmse,
    Mae,
    Mare,
    Bias,
    DiffStd,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Rmse,
        Metric::Mae,
        Metric::Mare,
        Metric::Bias,
        Metric::DiffStd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Rmse => "rmse",
            Metric::Mae => "mae",
            Metric::Mare => "mare",
            Metric::Bias => "bias",
            Metric::DiffStd => "diff_std",
        }
    }

    /// Look up a metric by its tag (case-insensitive).
    pub fn from_tag(tag: &str) -> MetricResult<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| MetricError::UnknownMetric {
                tag: tag.to_string(),
                valid: Self::ALL.map(|m| m.as_str()).join(", "),
            })
    }

    pub fn compute(
        &self,
        data: &ArrayD<f64>,
        reference: &ArrayD<f64>,
        weights: Option<&ArrayD<f64>>,
        reduction: &Reduction,
    ) -> MetricResult<ArrayD<f64>> {
        match self {
            Metric::Rmse => rmse(data, reference, weights, reduction),
            Metric::Mae => mae(data, reference, weights, reduction),
            Metric::Mare => mare(data, reference, weights, reduction),
            Metric::Bias => bias(data, reference, weights, reduction),
            Metric::DiffStd => diff_std(data, reference, weights, reduction),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root mean square error.
pub fn rmse(
    data: &ArrayD<f64>,
    reference: &ArrayD<f64>,
    weights: Option<&ArrayD<f64>>,
    reduction: &Reduction,
) -> MetricResult<ArrayD<f64>> {
    let sq = combine(data, reference, |a, b| (a - b).powi(2))?;
    Ok(reduce(&sq, weights, reduction, Stat::Mean)?.mapv(f64::sqrt))
}

/// Mean absolute error.
pub fn mae(
    data: &ArrayD<f64>,
    reference: &ArrayD<f64>,
    weights: Option<&ArrayD<f64>>,
    reduction: &Reduction,
) -> MetricResult<ArrayD<f64>> {
    let abs = combine(data, reference, |a, b| (a - b).abs())?;
    reduce(&abs, weights, reduction, Stat::Mean)
}

/// Mean absolute error relative to the reference.
pub fn mare(
    data: &ArrayD<f64>,
    reference: &ArrayD<f64>,
    weights: Option<&ArrayD<f64>>,
    reduction: &Reduction,
) -> MetricResult<ArrayD<f64>> {
    let rel = combine(data, reference, |a, b| ((a - b) / b).abs())?;
    reduce(&rel, weights, reduction, Stat::Mean)
}

/// Mean difference.
pub fn bias(
    data: &ArrayD<f64>,
    reference: &ArrayD<f64>,
    weights: Option<&ArrayD<f64>>,
    reduction: &Reduction,
) -> MetricResult<ArrayD<f64>> {
    let diff = combine(data, reference, |a, b| a - b)?;
    reduce(&diff, weights, reduction, Stat::Mean)
}

/// Population standard deviation of the difference.
pub fn diff_std(
    data: &ArrayD<f64>,
    reference: &ArrayD<f64>,
    weights: Option<&ArrayD<f64>>,
    reduction: &Reduction,
) -> MetricResult<ArrayD<f64>> {
    let diff = combine(data, reference, |a, b| a - b)?;
    reduce(&diff, weights, reduction, Stat::Std)
}

/// Inverse-std weights normalised over the reduced axes: `(1/σ) / Σ(1/σ)`.
///
/// Non-finite or zero σ gets no weight.
pub fn weights_from_std(std: &ArrayD<f64>, reduction: &Reduction) -> MetricResult<ArrayD<f64>> {
    let axes = reduction.axes(std.ndim())?;
    let inverse = std.mapv(|s| {
        let inv = 1.0 / s;
        if inv.is_finite() {
            inv
        } else {
            0.0
        }
    });

    let mut totals = inverse.clone();
    for &axis in &axes {
        totals = totals.sum_axis(Axis(axis)).insert_axis(Axis(axis));
    }
    Ok(&inverse / &totals)
}

fn combine(
    data: &ArrayD<f64>,
    reference: &ArrayD<f64>,
    f: impl Fn(f64, f64) -> f64,
) -> MetricResult<ArrayD<f64>> {
    if data.shape() != reference.shape() {
        return Err(MetricError::ShapeMismatch {
            left: data.shape().to_vec(),
            right: reference.shape().to_vec(),
        });
    }
    let mut out = data.clone();
    out.zip_mut_with(reference, |a, &b| *a = f(*a, b));
    Ok(out)
}

/// Collapse `axes` of `values` with a NaN-skipping weighted statistic.
fn reduce(
    values: &ArrayD<f64>,
    weights: Option<&ArrayD<f64>>,
    reduction: &Reduction,
    stat: Stat,
) -> MetricResult<ArrayD<f64>> {
    let ndim = values.ndim();
    let axes = reduction.axes(ndim)?;
    let keep: Vec<usize> = (0..ndim).filter(|a| !axes.contains(a)).collect();

    let unit = ArrayD::from_elem(IxDyn(&[]), 1.0);
    let weights_source = weights.unwrap_or(&unit);
    let weights = weights_source.broadcast(values.raw_dim()).ok_or_else(|| {
        MetricError::WeightsNotBroadcastable {
            weights: weights_source.shape().to_vec(),
            data: values.shape().to_vec(),
        }
    })?;

    let keep_shape: Vec<usize> = keep.iter().map(|&a| values.shape()[a]).collect();
    let n_keep: usize = keep_shape.iter().product();
    let n_reduce: usize = axes.iter().map(|&a| values.shape()[a]).product();

    // Kept axes first, so each row of the 2-d view is one output cell
    let order: Vec<usize> = keep.iter().chain(axes.iter()).copied().collect();
    let as_rows = |view: ArrayViewD<f64>| -> MetricResult<Array2<f64>> {
        let owned = view
            .permuted_axes(IxDyn(&order))
            .as_standard_layout()
            .into_owned();
        Ok(owned.into_shape((n_keep, n_reduce))?)
    };
    let value_rows = as_rows(values.view())?;
    let weight_rows = as_rows(weights)?;

    let results: Vec<f64> = value_rows
        .outer_iter()
        .zip(weight_rows.outer_iter())
        .map(|(vals, ws)| {
            let pairs: Vec<(f64, f64)> = vals
                .iter()
                .zip(ws.iter())
                .filter(|(v, w)| !v.is_nan() && !w.is_nan())
                .map(|(&v, &w)| (v, w))
                .collect();
            weighted_stat(&pairs, stat)
        })
        .collect();

    Ok(ArrayD::from_shape_vec(IxDyn(&keep_shape), results)?)
}

fn weighted_stat(pairs: &[(f64, f64)], stat: Stat) -> f64 {
    let total: f64 = pairs.iter().map(|(_, w)| w).sum();
    if pairs.is_empty() || total == 0.0 {
        return f64::NAN;
    }
    let mean = pairs.iter().map(|(v, w)| v * w).sum::<f64>() / total;
    match stat {
        Stat::Mean => mean,
        Stat::Std => {
            let var = pairs.iter().map(|(v, w)| w * (v - mean).powi(2)).sum::<f64>() / total;
            var.sqrt()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, ArrayD};

    fn dyn2(a: ndarray::Array2<f64>) -> ArrayD<f64> {
        a.into_dyn()
    }

    #[test]
    fn test_bias_all_axes_is_scalar() {
        let a = dyn2(array![[1.0, 2.0], [3.0, 4.0]]);
        let b = dyn2(array![[0.0, 0.0], [0.0, 0.0]]);
        let result = bias(&a, &b, None, &Reduction::All).unwrap();
        assert_eq!(result.ndim(), 0);
        assert_eq!(result[IxDyn(&[])], 2.5);
    }

    #[test]
    fn test_reduce_single_axis_keeps_other() {
        let a = dyn2(array![[1.0, 3.0], [5.0, 9.0]]);
        let b = dyn2(array![[0.0, 0.0], [0.0, 0.0]]);
        let result = mae(&a, &b, None, &Reduction::Axes(vec![1])).unwrap();
        assert_eq!(result.shape(), &[2]);
        assert_eq!(result.iter().copied().collect::<Vec<_>>(), vec![2.0, 7.0]);
    }

    #[test]
    fn test_nan_entries_are_skipped() {
        let a = dyn2(array![[1.0, f64::NAN], [3.0, 5.0]]);
        let b = dyn2(array![[0.0, 0.0], [0.0, 0.0]]);
        let result = bias(&a, &b, None, &Reduction::All).unwrap();
        assert_eq!(result[IxDyn(&[])], 3.0);
    }

    #[test]
    fn test_all_nan_group_is_nan() {
        let a = dyn2(array![[f64::NAN, f64::NAN], [1.0, 1.0]]);
        let b = dyn2(array![[0.0, 0.0], [0.0, 0.0]]);
        let result = bias(&a, &b, None, &Reduction::Axes(vec![1])).unwrap();
        assert!(result[IxDyn(&[0])].is_nan());
        assert_eq!(result[IxDyn(&[1])], 1.0);
    }

    #[test]
    fn test_diff_std_is_population() {
        let a = array![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_dyn();
        let b = ArrayD::zeros(IxDyn(&[8]));
        let result = diff_std(&a, &b, None, &Reduction::All).unwrap();
        assert_eq!(result[IxDyn(&[])], 2.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = ArrayD::zeros(IxDyn(&[2, 2]));
        let b = ArrayD::zeros(IxDyn(&[2, 3]));
        assert!(matches!(
            rmse(&a, &b, None, &Reduction::All),
            Err(MetricError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_axis_out_of_range() {
        let a = ArrayD::zeros(IxDyn(&[2, 2]));
        assert!(matches!(
            rmse(&a, &a, None, &Reduction::Axes(vec![2])),
            Err(MetricError::AxisOutOfRange { axis: 2, ndim: 2 })
        ));
    }

    #[test]
    fn test_weights_not_broadcastable() {
        let a = ArrayD::zeros(IxDyn(&[2, 3]));
        let w = ArrayD::ones(IxDyn(&[2]));
        assert!(matches!(
            bias(&a, &a, Some(&w), &Reduction::All),
            Err(MetricError::WeightsNotBroadcastable { .. })
        ));
    }

    #[test]
    fn test_metric_registry() {
        assert_eq!(Metric::from_tag("RMSE").unwrap(), Metric::Rmse);
        assert_eq!(Metric::from_tag("diff_std").unwrap(), Metric::DiffStd);
        let err = Metric::from_tag("r2").unwrap_err();
        assert!(err.to_string().contains("rmse, mae, mare, bias, diff_std"));
    }

    #[test]
    fn test_weights_from_std_sum_to_one() {
        let std = dyn2(array![[1.0, 2.0], [4.0, 4.0]]);
        let w = weights_from_std(&std, &Reduction::Axes(vec![1])).unwrap();
        let row0: f64 = w.index_axis(Axis(0), 0).sum();
        let row1: f64 = w.index_axis(Axis(0), 1).sum();
        assert!((row0 - 1.0).abs() < 1e-12);
        assert!((row1 - 1.0).abs() < 1e-12);
        assert!((w[IxDyn(&[0, 0])] - 2.0 / 3.0).abs() < 1e-12);
    }
}
