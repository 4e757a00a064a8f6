//! Order statistics and moments over pixel samples.

use ndarray::Array2;
use num_traits::Float;

/// Median of `values`, reordering the slice in place.
///
/// Uses `select_nth_unstable` for O(n) selection. Returns `None` for an
/// empty slice.
pub fn median_in_place<T: Float>(values: &mut [T]) -> Option<T> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(values[0]);
    }
    let cmp = |a: &T, b: &T| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal);
    let mid = n / 2;
    if n % 2 == 1 {
        Some(*values.select_nth_unstable_by(mid, cmp).1)
    } else {
        values.select_nth_unstable_by(mid, cmp);
        let upper = values[mid];
        values[..mid].select_nth_unstable_by(mid - 1, cmp);
        let two = T::one() + T::one();
        Some((values[mid - 1] + upper) / two)
    }
}

/// Arithmetic mean and population standard deviation.
pub fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean as f32, var.sqrt() as f32)
}

/// Robust location and scale: the median and `1.4826 * MAD`.
pub fn median_and_mad_sigma(data: &Array2<f32>) -> (f32, f32) {
    let mut values: Vec<f32> = data.iter().copied().collect();
    let median = median_in_place(&mut values).unwrap_or(0.0);
    for v in values.iter_mut() {
        *v = (*v - median).abs();
    }
    let mad = median_in_place(&mut values).unwrap_or(0.0);
    (median, crate::consts::MAD_TO_SIGMA * mad)
}
