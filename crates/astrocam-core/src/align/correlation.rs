use std::f64::consts::TAU;

use ndarray::{s, Array2, Zip};
use num_complex::Complex;
use rustfft::FftPlanner;

use super::subpixel::refine_peak_parabola;
use crate::frame::AlignmentOffset;

fn hann(i: usize, n: usize) -> f64 {
    0.5 * (1.0 - (TAU * i as f64 / n as f64).cos())
}

/// Central `size`×`size` crop of `data` (whole axis when `size` is 0 or
/// larger than the grid), mean-removed and Hann-windowed.
fn prepare_region(data: &Array2<f32>, size: usize) -> Array2<f64> {
    let (h, w) = data.dim();
    let rh = if size == 0 { h } else { size.min(h) };
    let rw = if size == 0 { w } else { size.min(w) };
    let r0 = (h - rh) / 2;
    let c0 = (w - rw) / 2;
    let region = data.slice(s![r0..r0 + rh, c0..c0 + rw]);

    let mean = region.iter().map(|&v| v as f64).sum::<f64>() / (rh * rw).max(1) as f64;
    let mut out = Array2::<f64>::zeros((rh, rw));
    for ((row, col), v) in out.indexed_iter_mut() {
        *v = (region[[row, col]] as f64 - mean) * hann(row, rh) * hann(col, rw);
    }
    out
}

/// In-place separable 2D DFT: every row, then every column.
fn transform(grid: &mut Array2<Complex<f64>>, planner: &mut FftPlanner<f64>, inverse: bool) {
    let (h, w) = grid.dim();
    let (along_rows, along_cols) = if inverse {
        (planner.plan_fft_inverse(w), planner.plan_fft_inverse(h))
    } else {
        (planner.plan_fft_forward(w), planner.plan_fft_forward(h))
    };

    let mut buf: Vec<Complex<f64>> = Vec::with_capacity(h.max(w));
    for mut lane in grid.rows_mut() {
        buf.clear();
        buf.extend(lane.iter().copied());
        along_rows.process(&mut buf);
        lane.iter_mut().zip(&buf).for_each(|(dst, &src)| *dst = src);
    }
    for mut lane in grid.columns_mut() {
        buf.clear();
        buf.extend(lane.iter().copied());
        along_cols.process(&mut buf);
        lane.iter_mut().zip(&buf).for_each(|(dst, &src)| *dst = src);
    }
}

fn spectrum_of(region: &Array2<f64>, planner: &mut FftPlanner<f64>) -> Array2<Complex<f64>> {
    let mut spectrum = region.mapv(|v| Complex::new(v, 0.0));
    transform(&mut spectrum, planner, false);
    spectrum
}

fn find_peak(surface: &Array2<f64>) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_val = f64::NEG_INFINITY;
    for ((row, col), &v) in surface.indexed_iter() {
        if v > best_val {
            best_val = v;
            best = (row, col);
        }
    }
    best
}

/// Lag index of a circular correlation mapped to a signed shift.
fn signed_lag(index: usize, n: usize) -> f64 {
    if index > n / 2 {
        index as f64 - n as f64
    } else {
        index as f64
    }
}

/// Spectrum of a reference region, reused for every target frame.
pub(crate) struct CorrelationReference {
    spectrum: Array2<Complex<f64>>,
    region_size: usize,
}

impl CorrelationReference {
    pub(crate) fn new(reference: &Array2<f32>, region_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let region = prepare_region(reference, region_size);
        Self {
            spectrum: spectrum_of(&region, &mut planner),
            region_size,
        }
    }

    /// Shift that registers `target` onto the reference.
    ///
    /// The correlation peak of `ref · conj(target)` sits at the lag that,
    /// applied to the target as `out[p] = target[p - lag]`, reproduces the
    /// reference. The integer peak is refined with a parabola per axis.
    pub(crate) fn offset_of(&self, target: &Array2<f32>) -> AlignmentOffset {
        let (h, w) = self.spectrum.dim();
        if h == 0 || w == 0 {
            return AlignmentOffset::default();
        }

        let mut planner = FftPlanner::new();
        let region = prepare_region(target, self.region_size);
        let mut cross = spectrum_of(&region, &mut planner);
        Zip::from(&mut cross)
            .and(&self.spectrum)
            .for_each(|t, &r| *t = r * t.conj());
        transform(&mut cross, &mut planner, true);

        let surface = cross.mapv(|c| c.re);
        let (row, col) = find_peak(&surface);
        let (sub_row, sub_col) = refine_peak_parabola(&surface, row, col);

        AlignmentOffset {
            dx: signed_lag(col, w) + sub_col,
            dy: signed_lag(row, h) + sub_row,
        }
    }
}
