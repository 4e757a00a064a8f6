use ndarray::Array2;

/// Vertex offset of the parabola through three equally spaced samples,
/// clamped to half a pixel. Zero when the samples are collinear.
fn parabola_vertex(prev: f64, peak: f64, next: f64) -> f64 {
    let curvature = prev - 2.0 * peak + next;
    if curvature.abs() <= 1e-12 {
        return 0.0;
    }
    ((prev - next) / (2.0 * curvature)).clamp(-0.5, 0.5)
}

/// Refine an integer peak of a circular correlation surface with one
/// 3-point parabola per axis.
///
/// Neighbours wrap around the surface edges, since a peak at index 0 is the
/// zero-lag peak. Returns `(delta_row, delta_col)`.
pub fn refine_peak_parabola(surface: &Array2<f64>, row: usize, col: usize) -> (f64, f64) {
    let (h, w) = surface.dim();
    if h < 3 || w < 3 {
        return (0.0, 0.0);
    }

    let up = (row + h - 1) % h;
    let down = (row + 1) % h;
    let left = (col + w - 1) % w;
    let right = (col + 1) % w;

    let center = surface[[row, col]];
    let delta_row = parabola_vertex(surface[[up, col]], center, surface[[down, col]]);
    let delta_col = parabola_vertex(surface[[row, left]], center, surface[[row, right]]);
    (delta_row, delta_col)
}
