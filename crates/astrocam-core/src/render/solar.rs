use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::photometry::FluxCalibration;
use super::projection::TangentPlane;
use crate::sky::{BodyKind, OrbitalBody};

const SUN_MAG: f64 = -26.74;
const FULL_MOON_MAG: f64 = -12.73;
const SUN_ANGULAR_DIAMETER_DEG: f64 = 0.533;
const MOON_ANGULAR_DIAMETER_DEG: f64 = 0.518;

/// Share of the body's total flux painted into each disc pixel.
const SUN_DISC_FRACTION: f64 = 0.1;
const MOON_DISC_FRACTION: f64 = 0.05;

const BLOOM_SIGMAS: [f64; 4] = [3.0, 8.0, 20.0, 50.0];
const BLOOM_WEIGHTS: [f64; 4] = [0.50, 0.28, 0.15, 0.07];
/// Cap on the bloom budget, in full wells per decade of overflow.
const BLOOM_BUDGET_PER_DECADE: f64 = 500.0;

const SUN_MIN_ALT_DEG: f64 = -5.0;
const MOON_MIN_ALT_DEG: f64 = 0.5;
const MOON_MIN_ILLUMINATION: f64 = 0.005;
/// Above this illuminated fraction the terminator is not drawn.
const MOON_TERMINATOR_LIMIT: f64 = 0.92;

/// Sensor figures the bloom needs to know how far a body overflows a pixel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturationModel {
    pub full_well_e: f64,
    pub quantum_efficiency: f64,
}

impl Default for SaturationModel {
    fn default() -> Self {
        Self {
            full_well_e: 50_000.0,
            quantum_efficiency: 0.7,
        }
    }
}

pub struct SolarContext<'a> {
    pub plane: &'a TangentPlane,
    pub calibration: &'a FluxCalibration,
    pub saturation: &'a SaturationModel,
    pub aperture_cm: f64,
    pub pixel_scale_arcsec: f64,
    pub exposure_s: f64,
}

/// Bloom component sigmas (px) and the photon budget shared among them.
///
/// Halos grow with the logarithm of how many full wells the body delivers
/// and spread further near the horizon.
pub fn bloom_profile(total_photons: f64, altitude_deg: f64, saturation: &SaturationModel) -> ([f64; 4], f64) {
    let qe = saturation.quantum_efficiency.max(f64::EPSILON);
    let full_well = saturation.full_well_e.max(1.0);
    let electrons = total_photons * qe;
    let overflow_log = (electrons / full_well).max(1.0).log10();

    let alt_n = (altitude_deg / 90.0).clamp(0.02, 1.0);
    let atm_spread = 1.0 + (1.0 - alt_n) * 2.5;
    let sigma_scale = 1.0 + overflow_log * 0.8;

    let sigmas = BLOOM_SIGMAS.map(|s| s * sigma_scale * atm_spread);
    let budget_e = electrons.min(full_well * overflow_log * BLOOM_BUDGET_PER_DECADE);
    (sigmas, budget_e / qe)
}

fn add_gaussian(field: &mut Array2<f32>, px: f64, py: f64, sigma: f64, photons: f64) {
    let (h, w) = field.dim();
    let reach = (sigma * 4.0).ceil();
    let x0 = (px - reach).floor().max(0.0) as usize;
    let y0 = (py - reach).floor().max(0.0) as usize;
    let x1 = ((px + reach).ceil() + 1.0).clamp(0.0, w as f64) as usize;
    let y1 = ((py + reach).ceil() + 1.0).clamp(0.0, h as f64) as usize;
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    let two_sigma_sq = 2.0 * sigma * sigma;
    let peak = photons / (std::f64::consts::PI * two_sigma_sq);
    for y in y0..y1 {
        let dy = y as f64 - py;
        for x in x0..x1 {
            let dx = x as f64 - px;
            let v = peak * (-(dx * dx + dy * dy) / two_sigma_sq).exp();
            field[[y, x]] += v as f32;
        }
    }
}

/// Paint a disc of `radius` px. `shade` receives (dx, dy, r_norm) and
/// returns the relative brightness of that pixel.
fn add_disc<F>(field: &mut Array2<f32>, px: f64, py: f64, radius: f64, brightness: f64, shade: F)
where
    F: Fn(f64, f64, f64) -> f64,
{
    let (h, w) = field.dim();
    let pad = radius.ceil() + 2.0;
    let x0 = (px - pad).floor().max(0.0) as usize;
    let y0 = (py - pad).floor().max(0.0) as usize;
    let x1 = (px + pad + 1.0).clamp(0.0, w as f64) as usize;
    let y1 = (py + pad + 1.0).clamp(0.0, h as f64) as usize;
    for y in y0..y1 {
        let dy = y as f64 - py;
        for x in x0..x1 {
            let dx = x as f64 - px;
            let r_n = (dx * dx + dy * dy).sqrt() / radius;
            if r_n < 1.0 {
                field[[y, x]] += (brightness * shade(dx, dy, r_n)) as f32;
            }
        }
    }
}

/// Render one Sun or Moon onto the field. Returns `false` when the body is
/// below its visibility limit or off the field.
pub fn render_body(field: &mut Array2<f32>, body: &dyn OrbitalBody, ctx: &SolarContext<'_>) -> bool {
    let alt = body.altitude_deg();
    let illuminated = body.phase_fraction();

    let (mag, diameter_deg, disc_fraction) = match body.kind() {
        BodyKind::Sun => {
            if alt < SUN_MIN_ALT_DEG {
                return false;
            }
            (SUN_MAG, SUN_ANGULAR_DIAMETER_DEG, SUN_DISC_FRACTION)
        }
        BodyKind::Moon => {
            if alt < MOON_MIN_ALT_DEG || illuminated < MOON_MIN_ILLUMINATION {
                return false;
            }
            let mag = FULL_MOON_MAG + 2.5 * illuminated.max(0.01).log10();
            (mag, MOON_ANGULAR_DIAMETER_DEG, MOON_DISC_FRACTION)
        }
    };

    let Some((px, py)) = ctx.plane.project(body.azimuth_deg(), alt) else {
        return false;
    };

    let total = ctx.calibration.mag_to_flux(mag, ctx.aperture_cm, ctx.exposure_s);
    let (sigmas, budget) = bloom_profile(total, alt, ctx.saturation);
    let reach = sigmas[sigmas.len() - 1] * 3.0;
    if !ctx.plane.within(px, py, reach) {
        return false;
    }

    let (h, w) = field.dim();
    let max_sigma = h.max(w) as f64 * 2.0;
    for (&sigma, &weight) in sigmas.iter().zip(BLOOM_WEIGHTS.iter()) {
        if sigma > max_sigma {
            continue;
        }
        add_gaussian(field, px, py, sigma, budget * weight);
    }

    let radius = (diameter_deg / 2.0 * 3600.0 / ctx.pixel_scale_arcsec).max(0.5);
    let disc = total * disc_fraction;
    match body.kind() {
        BodyKind::Sun => add_disc(field, px, py, radius, disc, |_, _, r_n| {
            let mu = (1.0 - r_n * r_n).max(0.0).sqrt();
            1.0 - 0.6 * (1.0 - mu)
        }),
        BodyKind::Moon => {
            let phase = body.phase_angle_deg().to_radians();
            let draw_terminator = illuminated < MOON_TERMINATOR_LIMIT;
            let (sin_half, cos_half) = (0.5 * phase).sin_cos();
            let limit = phase.cos() * radius;
            add_disc(field, px, py, radius, disc, move |dx, dy, _| {
                if draw_terminator && dx * sin_half + dy * cos_half > limit {
                    0.0
                } else {
                    1.0
                }
            });
        }
    }
    true
}
