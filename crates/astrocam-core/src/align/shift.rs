use ndarray::Array2;

use crate::frame::AlignmentOffset;
use crate::parallel::map_rows;

/// Circular whole-pixel shift: `out[r, c] = data[r - dy, c - dx]`, indices
/// wrapping around the grid.
pub fn roll(data: &Array2<f32>, dy: isize, dx: isize) -> Array2<f32> {
    let (h, w) = data.dim();
    if h == 0 || w == 0 {
        return data.clone();
    }
    let sy = dy.rem_euclid(h as isize) as usize;
    let sx = dx.rem_euclid(w as isize) as usize;

    map_rows(h, w, |row, out| {
        let src_row = (row + h - sy) % h;
        for (col, v) in out.iter_mut().enumerate() {
            *v = data[[src_row, (col + w - sx) % w]];
        }
    })
}

/// Fractional shift by bilinear resampling. Samples falling outside the
/// source grid read as 0.
pub fn shift_bilinear(data: &Array2<f32>, offset: &AlignmentOffset) -> Array2<f32> {
    let (h, w) = data.dim();
    map_rows(h, w, |row, out| {
        let src_y = row as f64 - offset.dy;
        for (col, v) in out.iter_mut().enumerate() {
            *v = bilinear_sample(data, src_y, col as f64 - offset.dx);
        }
    })
}

pub fn bilinear_sample(data: &Array2<f32>, y: f64, x: f64) -> f32 {
    let (h, w) = data.dim();
    let y0 = y.floor();
    let x0 = x.floor();
    let fy = (y - y0) as f32;
    let fx = (x - x0) as f32;
    let (y0, x0) = (y0 as i64, x0 as i64);

    let at = |r: i64, c: i64| -> f32 {
        if (0..h as i64).contains(&r) && (0..w as i64).contains(&c) {
            data[[r as usize, c as usize]]
        } else {
            0.0
        }
    };

    let top = at(y0, x0) * (1.0 - fx) + at(y0, x0 + 1) * fx;
    let bottom = at(y0 + 1, x0) * (1.0 - fx) + at(y0 + 1, x0 + 1) * fx;
    top * (1.0 - fy) + bottom * fy
}
