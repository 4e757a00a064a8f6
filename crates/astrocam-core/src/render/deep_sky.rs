//! Radial brightness profiles for extended objects.
//!
//! Every profile is normalized over the pixels it touches, so the photons
//! added to the field equal the object's total flux (less whatever falls
//! off the edge of the buffer for clusters).

use std::f64::consts::TAU;

use ndarray::{s, Array2};
use rand::Rng;
use rand_distr::{Exp1, StandardNormal};

use super::psf::{gaussian_kernel, splat};
use crate::seed::{hash_u64, rng_from_seed};
use crate::sky::{ClusterKind, NebulaKind};

const DSO_SALT: u64 = 0x0D50;

const GLOBULAR_STARS: usize = 300;
const OPEN_CLUSTER_STARS: usize = 80;
const CLUSTER_PSF_SIGMA: f64 = 1.2;
const CLUSTER_PSF_HALF: usize = 4;

/// Deterministic seed for an object's procedural structure, tied to where
/// it lands on the field.
fn position_seed(cx: f64, cy: f64) -> u64 {
    let key = (cx * 1000.0 + cy).round() as i64;
    hash_u64(key as u64, DSO_SALT)
}

/// Clipped square window of half-size `extent` around `(cx, cy)`.
/// Returns `(y0, y1, x0, x1)` or `None` if it misses the field.
fn window(dim: (usize, usize), cx: f64, cy: f64, extent: usize) -> Option<(usize, usize, usize, usize)> {
    let (h, w) = dim;
    let ix = cx.trunc() as i64;
    let iy = cy.trunc() as i64;
    let e = extent as i64;
    let x0 = (ix - e).max(0);
    let x1 = (ix + e + 1).min(w as i64);
    let y0 = (iy - e).max(0);
    let y1 = (iy + e + 1).min(h as i64);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((y0 as usize, y1 as usize, x0 as usize, x1 as usize))
}

/// Normalize `profile` to `total` photons and add it into the field window.
fn deposit(field: &mut Array2<f32>, win: (usize, usize, usize, usize), profile: Array2<f64>, total: f64) {
    let sum: f64 = profile.sum();
    if !(sum > 0.0) {
        return;
    }
    let (y0, y1, x0, x1) = win;
    let scale = total / sum;
    let mut view = field.slice_mut(s![y0..y1, x0..x1]);
    view.zip_mut_with(&profile, |dst, &p| *dst += (p * scale) as f32);
}

/// Sérsic profile: n = 4 (elliptical) for red galaxies, n = 1 (disc) for
/// blue ones, with a slight vertical flattening.
pub fn render_galaxy(field: &mut Array2<f32>, cx: f64, cy: f64, total: f64, size_px: f64, bv: f64) {
    let (h, w) = field.dim();
    let r_e = (size_px * 0.5).max(2.0);
    let n = if bv > 0.7 { 4.0 } else { 1.0 };
    let b_n = 1.9992 * n - 0.3271;
    let extent = (r_e * 5.0).min(h.min(w) as f64 / 2.0) as usize;

    let Some(win) = window((h, w), cx, cy, extent) else {
        return;
    };
    let (y0, y1, x0, x1) = win;
    let profile = Array2::from_shape_fn((y1 - y0, x1 - x0), |(r, c)| {
        let dx = (x0 + c) as f64 - cx;
        let dy = ((y0 + r) as f64 - cy) * 1.4;
        let rad = (dx * dx + dy * dy).sqrt();
        (-b_n * ((rad / r_e).powf(1.0 / n) - 1.0)).exp()
    });
    deposit(field, win, profile, total);
}

pub fn render_nebula(
    field: &mut Array2<f32>,
    cx: f64,
    cy: f64,
    total: f64,
    size_px: f64,
    kind: NebulaKind,
) {
    let (h, w) = field.dim();
    let extent = (size_px * 2.5).min(h.min(w) as f64 / 2.0) as usize;
    let Some(win) = window((h, w), cx, cy, extent) else {
        return;
    };
    let (y0, y1, x0, x1) = win;
    let radius = |r: usize, c: usize| {
        let dx = (x0 + c) as f64 - cx;
        let dy = (y0 + r) as f64 - cy;
        (dx * dx + dy * dy).sqrt()
    };
    let shape = (y1 - y0, x1 - x0);

    let profile = match kind {
        NebulaKind::Planetary => {
            let r0 = size_px * 0.6;
            let width = (size_px * 0.15).max(1.0);
            let core = size_px * 0.2;
            Array2::from_shape_fn(shape, |(r, c)| {
                let rad = radius(r, c);
                (-((rad - r0) / width).powi(2)).exp() + 0.3 * (-(rad / core).powi(2)).exp()
            })
        }
        NebulaKind::SupernovaRemnant => {
            let r0 = size_px * 0.85;
            let width = (size_px * 0.08).max(0.5);
            Array2::from_shape_fn(shape, |(r, c)| (-((radius(r, c) - r0) / width).powi(2)).exp())
        }
        NebulaKind::Emission => {
            let mut rng = rng_from_seed(position_seed(cx, cy));
            Array2::from_shape_fn(shape, |(r, c)| {
                let base = (-(radius(r, c) / size_px).powf(1.2)).exp();
                let n: f64 = rng.sample(StandardNormal);
                base * (n * 0.3 + 1.0).clamp(0.1, 3.0)
            })
        }
        NebulaKind::Reflection => {
            let scale = size_px * 0.8;
            Array2::from_shape_fn(shape, |(r, c)| (-(radius(r, c) / scale).powf(1.8)).exp())
        }
    };
    deposit(field, win, profile, total);
}

/// Scatter of point sources: a core-concentrated swarm for globulars, a
/// loose half-normal spread for open clusters. Brightness follows a
/// Pareto(α = 2) law.
pub fn render_cluster(
    field: &mut Array2<f32>,
    cx: f64,
    cy: f64,
    total: f64,
    size_px: f64,
    kind: ClusterKind,
) {
    let mut rng = rng_from_seed(position_seed(cx, cy));

    let (count, radii): (usize, Vec<f64>) = match kind {
        ClusterKind::Globular => {
            let sigma = size_px * 0.3;
            let core = size_px * 0.1;
            let radii = (0..GLOBULAR_STARS)
                .map(|_| {
                    let e: f64 = rng.sample(Exp1);
                    let r = e * sigma;
                    r * (1.0 - 0.7 * (-r / core).exp())
                })
                .collect();
            (GLOBULAR_STARS, radii)
        }
        ClusterKind::Open => {
            let sigma = size_px * 0.5;
            let radii = (0..OPEN_CLUSTER_STARS)
                .map(|_| {
                    let n: f64 = rng.sample(StandardNormal);
                    (n * sigma).abs()
                })
                .collect();
            (OPEN_CLUSTER_STARS, radii)
        }
    };

    let angles: Vec<f64> = (0..count).map(|_| rng.gen_range(0.0..TAU)).collect();
    // Pareto(scale 1, shape 2) as exp(E / 2) with E ~ Exp(1).
    let weights: Vec<f64> = (0..count)
        .map(|_| {
            let e: f64 = rng.sample(Exp1);
            (e / 2.0).exp()
        })
        .collect();
    let weight_sum: f64 = weights.iter().sum();
    if !(weight_sum > 0.0) {
        return;
    }

    let kernel = gaussian_kernel(CLUSTER_PSF_HALF, CLUSTER_PSF_SIGMA);
    for ((r, a), wt) in radii.iter().zip(&angles).zip(&weights) {
        let x = cx + r * a.cos();
        let y = cy + r * a.sin();
        splat(field, &kernel, x, y, wt / weight_sum * total);
    }
}
