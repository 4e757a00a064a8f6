pub mod stars;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::{Frame, QualityMetrics};
use crate::stats::{mean_std, median_and_mad_sigma};

pub use stars::{detect_stars, median_fwhm, star_fwhm, StarCandidate};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarDetectionParams {
    /// Detection threshold above the background, in robust sigmas.
    pub k_sigma: f32,
    pub max_stars: usize,
}

impl Default for StarDetectionParams {
    fn default() -> Self {
        Self {
            k_sigma: 5.0,
            max_stars: 200,
        }
    }
}

/// Sky level and noise estimated robustly (median and 1.4826·MAD).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Background {
    pub level: f32,
    pub sigma: f32,
}

pub fn estimate_background(data: &Array2<f32>) -> Background {
    let (level, sigma) = median_and_mad_sigma(data);
    Background { level, sigma }
}

/// Mean over standard deviation; `None` for a flat grid.
pub fn frame_snr(data: &Array2<f32>) -> Option<f64> {
    let values: Vec<f32> = data.iter().copied().collect();
    let (mean, std) = mean_std(&values);
    (std > 0.0).then(|| mean as f64 / std as f64)
}

/// Measure SNR, star count and median FWHM of one frame.
pub fn assess_quality(data: &Array2<f32>, params: &StarDetectionParams) -> QualityMetrics {
    let background = estimate_background(data);
    let threshold = background.level + params.k_sigma * background.sigma;
    let stars = detect_stars(data, threshold, params.max_stars);
    let fwhm_px = median_fwhm(data, &stars, background.level);
    let snr = frame_snr(data);

    debug!(
        stars = stars.len(),
        fwhm = ?fwhm_px,
        snr = ?snr,
        "Assessed frame quality"
    );
    QualityMetrics {
        fwhm_px,
        snr,
        star_count: Some(stars.len()),
    }
}

/// [`assess_quality`] attached to the frame.
pub fn assess_frame(frame: Frame, params: &StarDetectionParams) -> Frame {
    let metrics = assess_quality(frame.data(), params);
    frame.with_quality(metrics)
}
