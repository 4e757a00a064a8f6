use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::FWHM_PER_SIGMA;
use crate::stats::median_in_place;

/// Neighbourhood radius of the local-maximum test (5×5 window).
const PEAK_RADIUS: usize = 2;

/// Half-size of the moment window around each star.
const MOMENT_RADIUS: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarCandidate {
    pub row: usize,
    pub col: usize,
    pub peak: f32,
}

fn is_local_max(data: &Array2<f32>, row: usize, col: usize) -> bool {
    let (h, w) = data.dim();
    let v = data[[row, col]];
    for r in row.saturating_sub(PEAK_RADIUS)..(row + PEAK_RADIUS + 1).min(h) {
        for c in col.saturating_sub(PEAK_RADIUS)..(col + PEAK_RADIUS + 1).min(w) {
            let n = data[[r, c]];
            // Plateaus keep only their first pixel in scan order.
            if n > v || (n == v && (r, c) < (row, col)) {
                return false;
            }
        }
    }
    true
}

/// Local maxima brighter than `threshold`, brightest first, at most
/// `max_stars` of them.
pub fn detect_stars(data: &Array2<f32>, threshold: f32, max_stars: usize) -> Vec<StarCandidate> {
    let (h, w) = data.dim();
    let mut stars: Vec<StarCandidate> = (0..h)
        .into_par_iter()
        .flat_map_iter(|row| {
            (0..w).filter_map(move |col| {
                let peak = data[[row, col]];
                (peak > threshold && is_local_max(data, row, col))
                    .then_some(StarCandidate { row, col, peak })
            })
        })
        .collect();

    stars.sort_by(|a, b| b.peak.total_cmp(&a.peak));
    stars.truncate(max_stars);
    stars
}

/// FWHM of one star from the second moments of its background-subtracted
/// neighbourhood, assuming a circular Gaussian profile.
pub fn star_fwhm(data: &Array2<f32>, star: &StarCandidate, background: f32) -> Option<f64> {
    let (h, w) = data.dim();
    let r0 = star.row.saturating_sub(MOMENT_RADIUS);
    let r1 = (star.row + MOMENT_RADIUS + 1).min(h);
    let c0 = star.col.saturating_sub(MOMENT_RADIUS);
    let c1 = (star.col + MOMENT_RADIUS + 1).min(w);

    let mut sum = 0.0f64;
    let mut sum_r = 0.0f64;
    let mut sum_c = 0.0f64;
    for r in r0..r1 {
        for c in c0..c1 {
            let v = (data[[r, c]] - background).max(0.0) as f64;
            sum += v;
            sum_r += v * r as f64;
            sum_c += v * c as f64;
        }
    }
    if sum <= 0.0 {
        return None;
    }
    let (cr, cc) = (sum_r / sum, sum_c / sum);

    let mut var = 0.0f64;
    for r in r0..r1 {
        for c in c0..c1 {
            let v = (data[[r, c]] - background).max(0.0) as f64;
            let (dr, dc) = (r as f64 - cr, c as f64 - cc);
            var += v * (dr * dr + dc * dc);
        }
    }
    // Two axes contribute to the radial second moment.
    let sigma = (var / sum / 2.0).sqrt();
    (sigma > 0.0).then_some(FWHM_PER_SIGMA * sigma)
}

/// Median FWHM over `stars`, `None` when no star gives a measurement.
pub fn median_fwhm(data: &Array2<f32>, stars: &[StarCandidate], background: f32) -> Option<f64> {
    let mut values: Vec<f64> = stars
        .iter()
        .filter_map(|s| star_fwhm(data, s, background))
        .collect();
    median_in_place(&mut values)
}
