pub mod mean;
pub mod median;
pub mod sigma_clip;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::SIGMA_CLIP_RETAINED_FRACTION;
use crate::error::{ensure_same_dim, AstrocamError, Result};
use crate::frame::Frame;

pub use mean::mean_combine;
pub use median::median_combine;
pub use sigma_clip::{sigma_clip_combine, SigmaClipParams};

/// SNR assumed for frames that carry no usable statistics.
const DEFAULT_FRAME_SNR: f64 = 10.0;

/// How N frames are combined into one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackMethod {
    Mean,
    Median,
    SigmaClip(SigmaClipParams),
}

impl Default for StackMethod {
    fn default() -> Self {
        Self::SigmaClip(SigmaClipParams::default())
    }
}

impl std::fmt::Display for StackMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mean => write!(f, "mean"),
            Self::Median => write!(f, "median"),
            Self::SigmaClip(p) => write!(
                f,
                "sigma-clip (low={}, high={}, iter={})",
                p.sigma_low, p.sigma_high, p.iterations
            ),
        }
    }
}

/// Borrow every frame's grid, checking that all share the first one's shape.
pub(crate) fn layers_of(frames: &[Frame]) -> Result<Vec<&Array2<f32>>> {
    let first = frames.first().ok_or(AstrocamError::EmptySequence)?;
    let dim = first.dim();
    frames
        .iter()
        .map(|f| {
            ensure_same_dim(dim, f.dim())?;
            Ok(f.data())
        })
        .collect()
}

/// Combine layers that are already known to be non-empty and aligned.
pub(crate) fn combine(layers: &[&Array2<f32>], method: &StackMethod) -> Array2<f32> {
    match method {
        StackMethod::Mean => mean_combine(layers),
        StackMethod::Median => median_combine(layers),
        StackMethod::SigmaClip(params) => sigma_clip_combine(layers, params),
    }
}

/// Combine frames pixel by pixel.
///
/// Fails on an empty slice or on frames of different shapes. A single frame
/// comes back unchanged for every method.
pub fn stack(frames: &[Frame], method: &StackMethod) -> Result<Array2<f32>> {
    let layers = layers_of(frames)?;
    if layers.len() == 1 {
        return Ok(layers[0].clone());
    }
    Ok(combine(&layers, method))
}

/// [`stack`], wrapped in a frame that inherits the first input's metadata.
pub fn stack_frames(frames: &[Frame], method: &StackMethod) -> Result<Frame> {
    let data = stack(frames, method)?;
    let n = frames.len();
    let total_exposure: f64 = frames.iter().map(|f| f.exposure_s()).sum();
    info!(count = n, method = %method, "Stacked frames");

    let step = format!("Stacked {n} frames ({method}, {total_exposure:.1}s total)");
    Ok(frames[0].derive(data, step))
}

/// Theoretical SNR gain of combining `n` frames.
///
/// Mean: √n. Median: √(π/2 · n). Sigma-clip: √(0.95 · n), assuming about
/// 5% of samples are rejected. One frame or none gives 1.
pub fn compute_snr_improvement(n: usize, method: &StackMethod) -> f64 {
    if n <= 1 {
        return 1.0;
    }
    let n = n as f64;
    match method {
        StackMethod::Mean => n.sqrt(),
        StackMethod::Median => (std::f64::consts::FRAC_PI_2 * n).sqrt(),
        StackMethod::SigmaClip(_) => (n * SIGMA_CLIP_RETAINED_FRACTION).sqrt(),
    }
}

/// Expected SNR of the stacked result: the inputs' mean recorded SNR (or
/// mean signal over mean noise when none is recorded) times the
/// theoretical improvement.
pub fn estimate_final_snr(frames: &[Frame], method: &StackMethod) -> f64 {
    if frames.is_empty() {
        return 0.0;
    }

    let recorded: Vec<f64> = frames
        .iter()
        .filter_map(|f| f.metadata().quality.snr)
        .collect();

    let base_snr = if recorded.is_empty() {
        let n = frames.len() as f64;
        let mean_signal = frames.iter().map(|f| f.stats().mean as f64).sum::<f64>() / n;
        let mean_noise = frames.iter().map(|f| f.stats().std_dev as f64).sum::<f64>() / n;
        if mean_noise > 0.0 {
            mean_signal / mean_noise
        } else {
            DEFAULT_FRAME_SNR
        }
    } else {
        recorded.iter().sum::<f64>() / recorded.len() as f64
    };

    base_snr * compute_snr_improvement(frames.len(), method)
}
