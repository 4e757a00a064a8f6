use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::EPSILON;
use crate::parallel::map_rows;

/// Parameters for sigma-clipped mean stacking.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigmaClipParams {
    /// Values below mean - sigma_low * stddev are rejected (default: 3).
    pub sigma_low: f32,
    /// Values above mean + sigma_high * stddev are rejected (default: 3).
    pub sigma_high: f32,
    /// Number of rejection rounds (default: 1).
    pub iterations: usize,
}

impl Default for SigmaClipParams {
    fn default() -> Self {
        Self {
            sigma_low: 3.0,
            sigma_high: 3.0,
            iterations: 1,
        }
    }
}

/// Per-pixel sigma-clipped mean of equally shaped layers.
///
/// Each round computes the mean and standard deviation of the surviving
/// samples and masks those outside `[mean - low*sd, mean + high*sd]`. The
/// result is the mean of what survives, or 0 if nothing does.
pub fn sigma_clip_combine(layers: &[&Array2<f32>], params: &SigmaClipParams) -> Array2<f32> {
    let Some(first) = layers.first() else {
        return Array2::zeros((0, 0));
    };
    let (h, w) = first.dim();
    let n = layers.len();

    map_rows(h, w, |row, out| {
        let mut pixel_values = vec![0.0f32; n];
        let mut mask = vec![true; n];
        for (col, result) in out.iter_mut().enumerate() {
            for (i, layer) in layers.iter().enumerate() {
                pixel_values[i] = layer[[row, col]];
                mask[i] = true;
            }
            *result = clip_pixel(&pixel_values, &mut mask, params);
        }
    })
}

pub(crate) fn clip_pixel(values: &[f32], mask: &mut [bool], params: &SigmaClipParams) -> f32 {
    for _ in 0..params.iterations {
        let Some((mean, stddev)) = mean_stddev(values, mask) else {
            break;
        };
        if stddev < EPSILON {
            break;
        }
        let lo = mean - params.sigma_low * stddev;
        let hi = mean + params.sigma_high * stddev;
        let mut changed = false;
        for (keep, &v) in mask.iter_mut().zip(values) {
            if *keep && (v < lo || v > hi) {
                *keep = false;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    mean_stddev(values, mask).map_or(0.0, |(mean, _)| mean)
}

/// Mean and population standard deviation of the unmasked values, or
/// `None` when every value is masked.
fn mean_stddev(values: &[f32], mask: &[bool]) -> Option<(f32, f32)> {
    let mut sum = 0.0f64;
    let mut count = 0u32;
    for (&v, &keep) in values.iter().zip(mask) {
        if keep {
            sum += v as f64;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;

    let mut var_sum = 0.0f64;
    for (&v, &keep) in values.iter().zip(mask) {
        if keep {
            let d = v as f64 - mean;
            var_sum += d * d;
        }
    }
    let stddev = (var_sum / count as f64).sqrt();
    Some((mean as f32, stddev as f32))
}
