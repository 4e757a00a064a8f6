use ndarray::Array2;

/// Direction of the slow background gradient, radians from +x.
const GRADIENT_ANGLE: f64 = 0.7;
const GRADIENT_STRENGTH: f64 = 0.5;
/// Light lost at the corners of the field.
const VIGNETTE_DEPTH: f64 = 0.30;
const VIGNETTE_POWER: f64 = 2.5;

/// Relative illumination at `(row, col)`: 1 at the centre, falling to
/// `1 - VIGNETTE_DEPTH` at normalized radius 1 and beyond.
pub fn vignette_at(row: usize, col: usize, height: usize, width: usize) -> f64 {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let nx = (col as f64 - cx) / cx.max(f64::EPSILON);
    let ny = (row as f64 - cy) / cy.max(f64::EPSILON);
    let r = (nx * nx + ny * ny).sqrt().clamp(0.0, 1.0);
    1.0 - VIGNETTE_DEPTH * r.powf(VIGNETTE_POWER)
}

pub fn vignette(height: usize, width: usize) -> Array2<f32> {
    Array2::from_shape_fn((height, width), |(r, c)| vignette_at(r, c, height, width) as f32)
}

/// Fallback sky: a pedestal of `sky_photons` per pixel with a diagonal
/// gradient (up to +50%) and the optical vignette.
pub fn fallback_sky(height: usize, width: usize, sky_photons: f64) -> Array2<f32> {
    let (cos_a, sin_a) = (GRADIENT_ANGLE.cos(), GRADIENT_ANGLE.sin());
    let norm = (width + height) as f64;
    let raw = |r: usize, c: usize| (c as f64 * cos_a + r as f64 * sin_a) / norm;

    // The projection is linear, so its extremes sit at opposite corners.
    let last_r = height.saturating_sub(1);
    let last_c = width.saturating_sub(1);
    let corners = [raw(0, 0), raw(0, last_c), raw(last_r, 0), raw(last_r, last_c)];
    let lo = corners.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo + 1e-9;

    Array2::from_shape_fn((height, width), |(r, c)| {
        let grad = (raw(r, c) - lo) / span;
        let v = sky_photons * (1.0 + grad * GRADIENT_STRENGTH) * vignette_at(r, c, height, width);
        v as f32
    })
}
