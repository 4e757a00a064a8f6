use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Extinction coefficient (mag per airmass) in the B band.
const K_EXT_B: f64 = 0.25;
/// Extinction coefficient (mag per airmass) in the R band.
const K_EXT_R: f64 = 0.07;
/// Atmospheric scale height in metres.
const SCALE_HEIGHT_M: f64 = 8500.0;
const MAX_AIRMASS: f64 = 40.0;

/// State of the atmosphere during an exposure.
pub trait AtmosphericState {
    /// Sky background in photons per render pixel, shape `(height, width)`.
    fn sky_background(&self, height: usize, width: usize, exposure_s: f64) -> Array2<f32>;

    /// Magnitudes lost by a source of colour `bv_color` at `altitude_deg`.
    fn extinction_mag(&self, altitude_deg: f64, bv_color: f64) -> f64;

    /// Seeing FWHM in arcseconds.
    fn seeing_arcsec(&self) -> f64;
}

/// Relative path length through the atmosphere (Pickering 2002), capped at
/// the horizon.
pub fn airmass(altitude_deg: f64) -> f64 {
    if altitude_deg >= 89.9 {
        return 1.0;
    }
    if altitude_deg < 0.0 {
        return MAX_AIRMASS;
    }
    let arg = altitude_deg + 244.0 / (165.0 + 47.0 * altitude_deg.powf(1.1));
    let denom = arg.to_radians().sin();
    (1.0 / denom.max(1e-6)).min(MAX_AIRMASS)
}

/// Extinction in magnitudes for a source at `altitude_deg`, interpolating
/// the coefficient between B (blue sources) and R (red sources).
pub fn extinction_mag(altitude_deg: f64, bv_color: f64, site_altitude_m: f64) -> f64 {
    let pressure_factor = (-site_altitude_m / SCALE_HEIGHT_M).exp();
    let t = ((bv_color + 0.5) / 2.5).clamp(0.0, 1.0);
    let k = (K_EXT_B * (1.0 - t) + K_EXT_R * t) * pressure_factor;
    k * airmass(altitude_deg)
}

/// A clear, moonless night at a fixed site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearSky {
    /// Sky glow in photons per render pixel per second at the field centre.
    pub sky_rate: f64,
    pub site_altitude_m: f64,
    pub seeing_arcsec: f64,
    /// Adds the faint radial OI airglow term.
    pub airglow: bool,
}

impl Default for ClearSky {
    fn default() -> Self {
        Self {
            sky_rate: 5.0,
            site_altitude_m: 0.0,
            seeing_arcsec: 2.5,
            airglow: true,
        }
    }
}

impl AtmosphericState for ClearSky {
    fn sky_background(&self, height: usize, width: usize, exposure_s: f64) -> Array2<f32> {
        let cx = width as f64 / 2.0;
        let cy = height as f64 / 2.0;
        let base = self.sky_rate * exposure_s;

        Array2::from_shape_fn((height, width), |(row, col)| {
            let nx = (col as f64 - cx) / cx.max(1.0);
            let ny = (row as f64 - cy) / cy.max(1.0);
            let r = (nx * nx + ny * ny).sqrt();
            // Lower altitude toward the edges means a brighter sky.
            let mut v = base * (1.0 + 0.08 * r);
            if self.airglow {
                v += 2.0 * exposure_s * (0.5 + 0.5 * r);
            }
            v.max(0.0) as f32
        })
    }

    fn extinction_mag(&self, altitude_deg: f64, bv_color: f64) -> f64 {
        extinction_mag(altitude_deg, bv_color, self.site_altitude_m)
    }

    fn seeing_arcsec(&self) -> f64 {
        self.seeing_arcsec
    }
}
