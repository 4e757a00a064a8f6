use ndarray::Array2;

use crate::parallel::map_rows;
use crate::stats::median_in_place;

/// Per-pixel median of equally shaped layers.
///
/// Uses `select_nth_unstable` for O(n) median without full sort.
/// Parallelizes at the row level for large grids.
pub fn median_combine(layers: &[&Array2<f32>]) -> Array2<f32> {
    let Some(first) = layers.first() else {
        return Array2::zeros((0, 0));
    };
    let (h, w) = first.dim();
    let n = layers.len();
    if n == 1 {
        return (*first).clone();
    }

    map_rows(h, w, |row, out| {
        let mut pixel_values = vec![0.0f32; n];
        for (col, result) in out.iter_mut().enumerate() {
            for (i, layer) in layers.iter().enumerate() {
                pixel_values[i] = layer[[row, col]];
            }
            *result = median_in_place(&mut pixel_values).unwrap_or(0.0);
        }
    })
}
