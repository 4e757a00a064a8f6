use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Build an `(h, w)` grid by filling each row independently.
///
/// Rows are computed with Rayon once the grid reaches
/// [`PARALLEL_PIXEL_THRESHOLD`] pixels. `fill_row` must depend only on its
/// row index, so both paths give identical output.
pub fn map_rows<F>(h: usize, w: usize, fill_row: F) -> Array2<f32>
where
    F: Fn(usize, &mut [f32]) + Sync,
{
    let mut result = Array2::<f32>::zeros((h, w));

    if h * w >= PARALLEL_PIXEL_THRESHOLD && h > 1 {
        let rows: Vec<Vec<f32>> = (0..h)
            .into_par_iter()
            .map(|row| {
                let mut buf = vec![0.0f32; w];
                fill_row(row, &mut buf);
                buf
            })
            .collect();
        for (row, row_data) in rows.into_iter().enumerate() {
            for (col, val) in row_data.into_iter().enumerate() {
                result[[row, col]] = val;
            }
        }
    } else {
        let mut buf = vec![0.0f32; w];
        for row in 0..h {
            fill_row(row, &mut buf);
            for (col, &val) in buf.iter().enumerate() {
                result[[row, col]] = val;
            }
        }
    }

    result
}
