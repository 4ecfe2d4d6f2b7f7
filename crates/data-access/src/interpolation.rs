//! Vertical interpolation of model fields onto fixed depth levels.

use ndarray::{ArrayD, Axis, IxDyn};
use ocean_common::{Dataset, Variable};
use tracing::warn;

use crate::error::{DataError, Result};

/// Interpolate `values` along `axis` onto `levels`.
///
/// `depth` gives the depth of every point and must broadcast to the shape of
/// `values` (it usually lacks the leading time axis). Depths and levels are
/// each multiplied by the sign of their own mean times `h_sign`, so positive
/// and negative depth conventions can be mixed. Columns are interpolated
/// linearly, skipping NaN; levels outside a column are NaN. A 1-D `depth`
/// cannot describe a varying vertical grid and the input is returned as is.
pub fn interp_to_levels(
    values: &ArrayD<f64>,
    depth: &ArrayD<f64>,
    levels: &[f64],
    axis: usize,
    h_sign: f64,
) -> Result<ArrayD<f64>> {
    if depth.ndim() == 1 {
        warn!("Depth field is 1-D, expected 3-D; returning the input unchanged");
        return Ok(values.clone());
    }
    let ndim = values.ndim();
    if axis >= ndim {
        return Err(DataError::coordinate(format!(
            "vertical axis {} out of range for {} dimensions",
            axis, ndim
        )));
    }
    let depth = depth.broadcast(values.raw_dim()).ok_or_else(|| {
        DataError::coordinate(format!(
            "depth of shape {:?} does not broadcast to {:?}",
            depth.shape(),
            values.shape()
        ))
    })?;

    let depth_sign = sign(nanmean(depth.iter().copied())) * h_sign;
    let level_sign = sign(nanmean(levels.iter().copied())) * h_sign;
    let levels: Vec<f64> = levels.iter().map(|l| l * level_sign).collect();

    // Vertical axis last, so each column is a contiguous row
    let mut order: Vec<usize> = (0..ndim).filter(|&a| a != axis).collect();
    order.push(axis);
    let n_levels = values.len_of(Axis(axis));
    let n_columns = values.len() / n_levels.max(1);

    let columns = values.view().permuted_axes(IxDyn(&order));
    let columns = columns.as_standard_layout();
    let depths = depth.permuted_axes(IxDyn(&order));
    let depths = depths.as_standard_layout();

    let column_values = columns.as_slice().unwrap_or_default();
    let column_depths = depths.as_slice().unwrap_or_default();

    let mut out = vec![f64::NAN; n_columns * levels.len()];
    if n_levels > 0 {
        for (c, target) in out.chunks_mut(levels.len().max(1)).enumerate().take(n_columns) {
            let range = c * n_levels..(c + 1) * n_levels;
            let d: Vec<f64> = column_depths[range.clone()].iter().map(|d| d * depth_sign).collect();
            interp_column(&d, &column_values[range], &levels, target);
        }
    }

    let mut permuted_shape: Vec<usize> = order[..ndim - 1].iter().map(|&a| values.shape()[a]).collect();
    permuted_shape.push(levels.len());
    let interpolated = ArrayD::from_shape_vec(IxDyn(&permuted_shape), out)
        .map_err(|e| DataError::coordinate(e.to_string()))?;

    let mut inverse = vec![0; ndim];
    for (position, &a) in order.iter().enumerate() {
        inverse[a] = position;
    }
    Ok(interpolated
        .permuted_axes(IxDyn(&inverse))
        .as_standard_layout()
        .into_owned())
}

/// Interpolate variable `name` of `dataset` onto `levels`.
///
/// The depth field is `depth_{p}`, `p` being the last character of the
/// variable's last dimension (`lon_t` → `depth_t`). Its dimensions must end
/// the variable's dimensions; the vertical one is replaced by `depth_name`.
/// The levels themselves are not attached; assign them with
/// [`Dataset::assign_coord`] if needed.
pub fn interpolate_variable(
    dataset: &Dataset,
    name: &str,
    levels: &[f64],
    depth_name: &str,
    h_sign: f64,
) -> Result<Variable> {
    let var = dataset.variable(name)?;
    let placement = var
        .dims
        .last()
        .and_then(|d| d.chars().last())
        .ok_or_else(|| DataError::coordinate(format!("variable '{}' has no dimensions", name)))?;
    let depth = dataset.variable(&format!("depth_{}", placement))?;

    if depth.ndim() == 1 {
        warn!(variable = %name, "Depth field is 1-D, expected 3-D; returning the input unchanged");
        return Ok(var.clone());
    }
    if !var.dims.ends_with(&depth.dims) {
        return Err(DataError::coordinate(format!(
            "dimensions {:?} of '{}' do not end with depth dimensions {:?}",
            var.dims, name, depth.dims
        )));
    }

    let axis = var.ndim() - depth.ndim();
    let data = interp_to_levels(&var.data, &depth.data, levels, axis, h_sign)?;
    let mut dims = var.dims.clone();
    dims[axis] = depth_name.to_string();

    let mut out = Variable::new(dims, data)?;
    out.attrs = var.attrs.clone();
    Ok(out)
}

fn nanmean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Sign with `sign(0) == 0`, unlike [`f64::signum`].
fn sign(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x.signum()
    }
}

/// Linear interpolation of one column onto `levels`, NaN outside it.
fn interp_column(depth: &[f64], values: &[f64], levels: &[f64], out: &mut [f64]) {
    let mut points: Vec<(f64, f64)> = depth
        .iter()
        .zip(values)
        .filter(|(d, v)| d.is_finite() && v.is_finite())
        .map(|(&d, &v)| (d, v))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (target, &level) in out.iter_mut().zip(levels) {
        *target = match points.windows(2).find(|w| w[0].0 <= level && level <= w[1].0) {
            Some(w) => {
                let ((d0, v0), (d1, v1)) = (w[0], w[1]);
                if d1 == d0 {
                    v0
                } else {
                    v0 + (v1 - v0) * (level - d0) / (d1 - d0)
                }
            }
            None => match points.as_slice() {
                [(d, v)] if *d == level => *v,
                _ => f64::NAN,
            },
        };
    }
}
