//! NaN-aware reductions.

use ndarray::{ArrayD, Axis};

/// Mean along `axis` ignoring NaN; all-NaN lanes give NaN.
pub fn nanmean_axis(data: &ArrayD<f64>, axis: Axis) -> ArrayD<f64> {
    data.map_axis(axis, |lane| {
        let (sum, count) = lane
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            f64::NAN
        } else {
            sum / count as f64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_all_nan_lane() {
        let data = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![f64::NAN, 1.0, f64::NAN, 3.0]).unwrap();
        let mean = nanmean_axis(&data, Axis(0));
        assert!(mean[[0]].is_nan());
        assert_eq!(mean[[1]], 2.0);
    }
}
