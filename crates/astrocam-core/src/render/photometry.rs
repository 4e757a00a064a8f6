use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Photometric calibration of the renderer.
///
/// These values are tuned so that a small refractor fills a plausible share
/// of full well in a few seconds; they are simulation constants, not a
/// radiometric standard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluxCalibration {
    /// Photons per second per cm² from a magnitude-zero source (F0).
    pub zero_point_flux: f64,
    /// Multiplier on the fallback sky pedestal so it stays visible at coarse
    /// render pixel scales. Does not touch point-source photometry.
    pub sky_display_boost: f64,
    /// Fraction of an extended object's catalog flux that is rendered.
    pub dso_flux_fraction: f64,
    /// Extended objects fainter than this are not rendered.
    pub dso_mag_limit: f64,
}

impl Default for FluxCalibration {
    fn default() -> Self {
        Self {
            zero_point_flux: 1000.0,
            sky_display_boost: 60.0,
            dso_flux_fraction: 0.3,
            dso_mag_limit: 14.0,
        }
    }
}

impl FluxCalibration {
    /// Total photons collected from a point source of magnitude `mag`.
    pub fn mag_to_flux(&self, mag: f64, aperture_cm: f64, exposure_s: f64) -> f64 {
        let area_cm2 = aperture_area_cm2(aperture_cm);
        (self.zero_point_flux * 10f64.powf(-0.4 * mag) * area_cm2 * exposure_s).max(0.0)
    }

    /// Photons per render pixel from a sky of `sky_mag_arcsec2`, display
    /// boost included.
    pub fn sky_photons_per_pixel(
        &self,
        sky_mag_arcsec2: f64,
        aperture_cm: f64,
        pixel_scale_arcsec: f64,
        exposure_s: f64,
    ) -> f64 {
        let pixel_area = pixel_scale_arcsec * pixel_scale_arcsec;
        let physical = self.zero_point_flux
            * 10f64.powf(-0.4 * sky_mag_arcsec2)
            * aperture_area_cm2(aperture_cm)
            * pixel_area
            * exposure_s;
        (physical * self.sky_display_boost).max(0.0)
    }
}

pub fn aperture_area_cm2(aperture_cm: f64) -> f64 {
    PI * (aperture_cm / 2.0).powi(2)
}

/// Blend toward white applied to star colours.
const STAR_DESATURATION: f64 = 0.55;

/// Convert a B-V colour index to (r, g, b) channel multipliers.
///
/// Colours are muted toward white: hot stars come out pale blue, solar-type
/// stars cream, M dwarfs brick red.
pub fn bv_to_rgb(bv: f64) -> (f64, f64, f64) {
    let bv = bv.clamp(-0.4, 2.0);

    let (r, g, b) = if bv < 0.0 {
        let t = (bv + 0.4) / 0.4;
        (0.6 + 0.2 * t, 0.7 + 0.3 * t, 1.0)
    } else if bv < 0.3 {
        let t = bv / 0.3;
        (0.8 + 0.2 * t, 0.9 + 0.1 * t, 1.0 - 0.2 * t)
    } else if bv < 0.7 {
        let t = (bv - 0.3) / 0.4;
        (1.0, 0.9, 0.8 - 0.4 * t)
    } else if bv < 1.2 {
        let t = (bv - 0.7) / 0.5;
        (1.0, 0.9 - 0.4 * t, 0.4 - 0.3 * t)
    } else {
        let t = ((bv - 1.2) / 0.8).min(1.0);
        (1.0, 0.5 - 0.3 * t, 0.1)
    };

    let lift = |c: f64| c + (1.0 - c) * STAR_DESATURATION;
    (lift(r), lift(g), lift(b))
}
