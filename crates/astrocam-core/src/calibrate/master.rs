use ndarray::Array2;
use tracing::info;

use crate::consts::{EXPOSURE_MATCH_TOLERANCE_S, FLAT_MAX, FLAT_MIN};
use crate::error::{ensure_same_dim, Result};
use crate::frame::{Frame, FrameKind};
use crate::stack::median_combine;

pub(crate) fn exposures_match(a: f64, b: f64) -> bool {
    (a - b).abs() < EXPOSURE_MATCH_TOLERANCE_S
}

/// Check that every frame, and every optional master, shares one shape.
fn common_dim(frames: &[Frame], masters: &[Option<&Frame>]) -> Result<(usize, usize)> {
    let dim = frames[0].dim();
    for f in frames {
        ensure_same_dim(dim, f.dim())?;
    }
    for m in masters.iter().flatten() {
        ensure_same_dim(dim, m.dim())?;
    }
    Ok(dim)
}

fn median_of(grids: &[Array2<f32>]) -> Array2<f32> {
    let refs: Vec<&Array2<f32>> = grids.iter().collect();
    median_combine(&refs)
}

fn build_master(template: &Frame, kind: FrameKind, data: Array2<f32>, count: usize, step: String) -> Frame {
    let mut metadata = template.metadata().clone();
    metadata.kind = kind;
    metadata.target_name = format!("MASTER_{kind}_{count}x");
    metadata.calibration_log.push(step);
    Frame::new(data, metadata)
}

/// Median-combine bias frames. `Ok(None)` when there are none.
pub fn master_bias(frames: &[Frame]) -> Result<Option<Frame>> {
    if frames.is_empty() {
        return Ok(None);
    }
    common_dim(frames, &[])?;

    let refs: Vec<&Array2<f32>> = frames.iter().map(|f| f.data()).collect();
    let data = median_combine(&refs);
    let n = frames.len();
    info!(count = n, "Built master bias");
    Ok(Some(build_master(
        &frames[0],
        FrameKind::Bias,
        data,
        n,
        format!("Master bias from {n} frames (median)"),
    )))
}

/// Median-combine dark frames, bias-subtracting each first when a master
/// bias is given. `Ok(None)` when there are none.
pub fn master_dark(frames: &[Frame], bias: Option<&Frame>) -> Result<Option<Frame>> {
    if frames.is_empty() {
        return Ok(None);
    }
    common_dim(frames, &[bias])?;

    let n = frames.len();
    let (data, step) = match bias {
        Some(bias) => {
            let corrected: Vec<Array2<f32>> =
                frames.iter().map(|f| f.data() - bias.data()).collect();
            (
                median_of(&corrected),
                format!("Master dark from {n} frames, bias-subtracted (median)"),
            )
        }
        None => {
            let refs: Vec<&Array2<f32>> = frames.iter().map(|f| f.data()).collect();
            (
                median_combine(&refs),
                format!("Master dark from {n} frames (median)"),
            )
        }
    };

    info!(count = n, bias_subtracted = bias.is_some(), "Built master dark");
    Ok(Some(build_master(&frames[0], FrameKind::Dark, data, n, step)))
}

/// Build a normalized master flat.
///
/// Each flat loses the master dark when its exposure matches, otherwise the
/// master bias; the median is then scaled to mean 1 and clamped to
/// `[0.1, 10]` so later division stays bounded. `Ok(None)` when there are
/// no flats.
pub fn master_flat(
    frames: &[Frame],
    dark: Option<&Frame>,
    bias: Option<&Frame>,
) -> Result<Option<Frame>> {
    if frames.is_empty() {
        return Ok(None);
    }
    common_dim(frames, &[dark, bias])?;

    let corrected: Vec<Array2<f32>> = frames
        .iter()
        .map(|flat| {
            let matching_dark =
                dark.filter(|d| exposures_match(flat.exposure_s(), d.exposure_s()));
            match (matching_dark, bias) {
                (Some(d), _) => flat.data() - d.data(),
                (None, Some(b)) => flat.data() - b.data(),
                (None, None) => flat.data().clone(),
            }
        })
        .collect();

    let mut data = median_of(&corrected);
    let mean = data.iter().map(|&v| v as f64).sum::<f64>() / data.len().max(1) as f64;
    if mean > 0.0 {
        let inv = (1.0 / mean) as f32;
        data.mapv_inplace(|v| v * inv);
    }
    data.mapv_inplace(|v| v.clamp(FLAT_MIN, FLAT_MAX));

    let n = frames.len();
    info!(count = n, raw_mean = mean, "Built master flat");
    Ok(Some(build_master(
        &frames[0],
        FrameKind::Flat,
        data,
        n,
        format!("Master flat from {n} frames, normalized (median)"),
    )))
}
