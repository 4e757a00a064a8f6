//! Translational registration of frames against a reference.

mod correlation;
pub mod shift;
pub mod subpixel;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::consts::{DEFAULT_ALIGN_REGION, MIN_APPLIED_SHIFT_PX};
use crate::error::{AstrocamError, Result};
use crate::frame::{AlignmentOffset, Frame};
use crate::stack::layers_of;

use correlation::CorrelationReference;
pub use shift::{bilinear_sample, roll, shift_bilinear};

/// Shift of every frame relative to `frames[reference_index]`.
///
/// A central `region_size`×`region_size` window of each frame (the whole
/// frame when 0) is cross-correlated against the same window of the
/// reference. Each returned offset, applied to its frame, registers it onto
/// the reference; the reference itself gets a zero offset.
pub fn estimate_shifts(
    frames: &[Frame],
    reference_index: usize,
    region_size: usize,
) -> Result<Vec<AlignmentOffset>> {
    let layers = layers_of(frames)?;
    let reference = layers
        .get(reference_index)
        .ok_or(AstrocamError::FrameIndexOutOfRange {
            index: reference_index,
            total: layers.len(),
        })?;

    let correlator = CorrelationReference::new(reference, region_size);
    let shifts: Vec<AlignmentOffset> = layers
        .par_iter()
        .enumerate()
        .map(|(i, layer)| {
            if i == reference_index {
                AlignmentOffset::default()
            } else {
                correlator.offset_of(layer)
            }
        })
        .collect();

    for (i, s) in shifts.iter().enumerate() {
        debug!(frame = i, dx = s.dx, dy = s.dy, "Estimated shift");
    }
    Ok(shifts)
}

/// Apply previously estimated shifts.
///
/// Offsets below 0.1 px on both axes leave the frame untouched. Otherwise
/// the integer path rolls the frame by the rounded offset, wrapping around
/// the edges, and the subpixel path resamples bilinearly with zero fill.
pub fn apply_shifts(
    frames: &[Frame],
    shifts: &[AlignmentOffset],
    subpixel: bool,
) -> Result<Vec<Frame>> {
    if frames.len() != shifts.len() {
        return Err(AstrocamError::InvalidConfig(format!(
            "{} shifts given for {} frames",
            shifts.len(),
            frames.len()
        )));
    }

    let aligned = frames
        .par_iter()
        .zip(shifts.par_iter())
        .map(|(frame, offset)| {
            if offset.dx.abs() < MIN_APPLIED_SHIFT_PX && offset.dy.abs() < MIN_APPLIED_SHIFT_PX {
                return frame.clone();
            }
            if subpixel {
                let data = shift_bilinear(frame.data(), offset);
                frame.derive(
                    data,
                    format!("Aligned (dx={:.2}, dy={:.2})", offset.dx, offset.dy),
                )
            } else {
                let dx = offset.dx.round() as isize;
                let dy = offset.dy.round() as isize;
                let data = roll(frame.data(), dy, dx);
                frame.derive(data, format!("Aligned (dx={dx}, dy={dy})"))
            }
        })
        .collect();
    Ok(aligned)
}

/// Register every frame onto `frames[reference_index]` using a central
/// window of the default size.
pub fn align_frames(frames: &[Frame], reference_index: usize, subpixel: bool) -> Result<Vec<Frame>> {
    let shifts = estimate_shifts(frames, reference_index, DEFAULT_ALIGN_REGION)?;
    let aligned = apply_shifts(frames, &shifts, subpixel)?;
    info!(count = aligned.len(), reference_index, subpixel, "Aligned frames");
    Ok(aligned)
}
