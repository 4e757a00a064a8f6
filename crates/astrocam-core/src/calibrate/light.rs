use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::master::exposures_match;
use crate::consts::{COSMETIC_SIGMA_THRESHOLD, FLAT_EPSILON};
use crate::error::{ensure_same_dim, Result};
use crate::frame::Frame;
use crate::stats::{median_and_mad_sigma, median_in_place};

/// How a flagged pixel is replaced during cosmetic correction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceMethod {
    #[default]
    Median,
    Mean,
}

impl std::fmt::Display for ReplaceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Median => write!(f, "median"),
            Self::Mean => write!(f, "mean"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CosmeticParams {
    pub method: ReplaceMethod,
    /// Side of the square replacement window (3, 5, 7).
    pub kernel_size: usize,
}

impl Default for CosmeticParams {
    fn default() -> Self {
        Self {
            method: ReplaceMethod::Median,
            kernel_size: 3,
        }
    }
}

/// Apply `(light - bias - dark*scale) / (flat + ε)` and clamp negatives.
///
/// The dark is scaled by `light_exposure / dark_exposure` unless the two
/// exposures match. The steps actually applied are recorded as one
/// calibration-log entry ("no calibration" when no master was given).
pub fn calibrate_light(
    light: &Frame,
    dark: Option<&Frame>,
    flat: Option<&Frame>,
    bias: Option<&Frame>,
) -> Result<Frame> {
    let dim = light.dim();
    for master in [dark, flat, bias].into_iter().flatten() {
        ensure_same_dim(dim, master.dim())?;
    }

    let mut data = light.data().clone();
    let mut steps: Vec<String> = Vec::new();

    if let Some(bias) = bias {
        data -= bias.data();
        steps.push("bias subtraction".into());
    }

    if let Some(dark) = dark {
        let dark_exp = dark.exposure_s();
        if exposures_match(light.exposure_s(), dark_exp) || dark_exp <= 0.0 {
            data -= dark.data();
            steps.push("dark subtraction".into());
        } else {
            let scale = light.exposure_s() / dark_exp;
            data.scaled_add(-(scale as f32), dark.data());
            steps.push(format!("dark subtraction (scaled {scale:.2}x)"));
        }
    }

    if let Some(flat) = flat {
        data.zip_mut_with(flat.data(), |v, &f| *v /= f + FLAT_EPSILON);
        steps.push("flat division".into());
    }

    data.mapv_inplace(|v| v.max(0.0));

    let step = if steps.is_empty() {
        "no calibration".to_string()
    } else {
        steps.join(" + ")
    };
    debug!(frame_id = light.metadata().frame_id, step = %step, "Calibrated light");
    Ok(light.derive(data, step))
}

/// Calibrate every light, then optionally run cosmetic correction with
/// default settings. Frames are processed in parallel; order is kept.
pub fn batch_calibrate_lights(
    lights: &[Frame],
    dark: Option<&Frame>,
    flat: Option<&Frame>,
    bias: Option<&Frame>,
    cosmetic: bool,
) -> Result<Vec<Frame>> {
    let params = CosmeticParams::default();
    let calibrated = lights
        .par_iter()
        .map(|light| {
            let cal = calibrate_light(light, dark, flat, bias)?;
            Ok(if cosmetic {
                cosmetic_correction(&cal, &params)
            } else {
                cal
            })
        })
        .collect::<Result<Vec<Frame>>>()?;

    info!(count = calibrated.len(), cosmetic, "Calibrated light frames");
    Ok(calibrated)
}

/// Replace outlier pixels with a local median or mean.
///
/// Outliers lie more than 5 robust sigmas (1.4826 × MAD) from the frame
/// median. Only flagged pixels change; the replacement window is clipped at
/// the frame edges.
pub fn cosmetic_correction(frame: &Frame, params: &CosmeticParams) -> Frame {
    let data = frame.data();
    let (h, w) = data.dim();
    let (median, sigma) = median_and_mad_sigma(data);
    let threshold = COSMETIC_SIGMA_THRESHOLD * sigma;
    let radius = params.kernel_size.max(1) / 2;

    let flagged: Vec<(usize, usize)> = data
        .indexed_iter()
        .filter(|&(_, &v)| (v - median).abs() > threshold)
        .map(|(idx, _)| idx)
        .collect();

    let mut corrected = data.clone();
    let mut window = Vec::with_capacity((2 * radius + 1).pow(2));
    for &(row, col) in &flagged {
        window.clear();
        let r0 = row.saturating_sub(radius);
        let r1 = (row + radius + 1).min(h);
        let c0 = col.saturating_sub(radius);
        let c1 = (col + radius + 1).min(w);
        for r in r0..r1 {
            for c in c0..c1 {
                window.push(data[[r, c]]);
            }
        }
        corrected[[row, col]] = replacement(&mut window, params.method);
    }

    let step = format!(
        "Cosmetic correction ({} pixels, {})",
        flagged.len(),
        params.method
    );
    frame.derive(corrected, step)
}

fn replacement(window: &mut [f32], method: ReplaceMethod) -> f32 {
    match method {
        ReplaceMethod::Median => median_in_place(window).unwrap_or(0.0),
        ReplaceMethod::Mean => window.iter().sum::<f32>() / window.len() as f32,
    }
}
