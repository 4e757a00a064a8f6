use ndarray::Array2;

use astrocam_core::frame::{Frame, FrameKind, FrameMetadata};

pub fn frame_of(kind: FrameKind, data: Array2<f32>, exposure_s: f64) -> Frame {
    Frame::new(data, FrameMetadata::new(kind, exposure_s))
}

pub fn uniform_frame(kind: FrameKind, shape: (usize, usize), value: f32, exposure_s: f64) -> Frame {
    frame_of(kind, Array2::from_elem(shape, value), exposure_s)
}

/// Background plus circular Gaussian stars given as (row, col, amplitude).
pub fn star_field(
    shape: (usize, usize),
    stars: &[(f64, f64, f32)],
    sigma: f64,
    background: f32,
) -> Array2<f32> {
    Array2::from_shape_fn(shape, |(r, c)| {
        let mut v = background;
        for &(sr, sc, amp) in stars {
            let d2 = (r as f64 - sr).powi(2) + (c as f64 - sc).powi(2);
            v += amp * (-d2 / (2.0 * sigma * sigma)).exp() as f32;
        }
        v
    })
}

/// A handful of well separated stars on a 96×96 grid.
pub fn sample_stars() -> Vec<(f64, f64, f32)> {
    vec![
        (30.0, 30.0, 900.0),
        (48.0, 62.0, 600.0),
        (64.0, 40.0, 750.0),
        (40.0, 50.0, 400.0),
        (60.0, 66.0, 500.0),
    ]
}
