use serde::{Deserialize, Serialize};

use crate::consts::{
    ARCSEC_PER_RADIAN, FWHM_PER_SIGMA, MIN_PSF_SIGMA_PX, REFERENCE_WAVELENGTH_MM,
};
use crate::error::{AstrocamError, Result};

/// Telescope and render-buffer geometry.
///
/// The physical sensor size fixes the field of view; the render buffer is a
/// smaller grid covering the same field, so each render pixel bins
/// `sensor_width / render_width` physical pixels per axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticsConfig {
    pub aperture_mm: f64,
    pub focal_length_mm: f64,
    pub pixel_size_um: f64,
    pub sensor_width: usize,
    pub sensor_height: usize,
    pub render_width: usize,
    pub render_height: usize,
    /// Seeing FWHM in arcseconds, used when no atmosphere is supplied.
    pub seeing_arcsec: f64,
    /// Sky surface brightness in mag/arcsec² for the fallback background.
    pub sky_background_mag: f64,
}

impl Default for OpticsConfig {
    fn default() -> Self {
        Self {
            aperture_mm: 102.0,
            focal_length_mm: 714.0,
            pixel_size_um: 3.76,
            sensor_width: 1920,
            sensor_height: 1080,
            render_width: 480,
            render_height: 270,
            seeing_arcsec: 2.5,
            sky_background_mag: 20.0,
        }
    }
}

impl OpticsConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.aperture_mm > 0.0) || !(self.focal_length_mm > 0.0) {
            return Err(AstrocamError::InvalidOptics(format!(
                "aperture and focal length must be positive (got {} mm, {} mm)",
                self.aperture_mm, self.focal_length_mm
            )));
        }
        if !(self.pixel_size_um > 0.0) {
            return Err(AstrocamError::InvalidOptics(format!(
                "pixel size must be positive (got {} um)",
                self.pixel_size_um
            )));
        }
        if self.sensor_width == 0
            || self.sensor_height == 0
            || self.render_width == 0
            || self.render_height == 0
        {
            return Err(AstrocamError::InvalidOptics(
                "sensor and render dimensions must be non-zero".into(),
            ));
        }
        if !(self.seeing_arcsec >= 0.0) {
            return Err(AstrocamError::InvalidOptics(format!(
                "seeing must be non-negative (got {})",
                self.seeing_arcsec
            )));
        }
        Ok(())
    }

    pub fn aperture_cm(&self) -> f64 {
        self.aperture_mm / 10.0
    }

    pub fn focal_ratio(&self) -> f64 {
        self.focal_length_mm / self.aperture_mm
    }

    /// Physical pixels per render pixel along x.
    pub fn bin_x(&self) -> f64 {
        self.sensor_width as f64 / self.render_width as f64
    }

    pub fn bin_y(&self) -> f64 {
        self.sensor_height as f64 / self.render_height as f64
    }

    /// Arcseconds covered by one physical sensor pixel.
    pub fn native_pixel_scale_arcsec(&self) -> f64 {
        self.pixel_size_um / 1000.0 / self.focal_length_mm * ARCSEC_PER_RADIAN
    }

    /// Arcseconds covered by one render pixel.
    pub fn pixel_scale_arcsec(&self) -> f64 {
        self.native_pixel_scale_arcsec() * self.bin_x()
    }

    /// Field of view (width, height) in degrees.
    pub fn fov_deg(&self) -> (f64, f64) {
        let native = self.native_pixel_scale_arcsec();
        (
            native * self.sensor_width as f64 / 3600.0,
            native * self.sensor_height as f64 / 3600.0,
        )
    }

    /// Rayleigh diffraction limit at 550 nm, in arcseconds.
    pub fn diffraction_limit_arcsec(&self) -> f64 {
        1.22 * REFERENCE_WAVELENGTH_MM / self.aperture_mm * ARCSEC_PER_RADIAN
    }

    /// PSF sigma in render pixels for a given seeing FWHM: diffraction and
    /// seeing in quadrature, never narrower than the seeing alone or
    /// [`MIN_PSF_SIGMA_PX`].
    pub fn psf_sigma_px(&self, seeing_arcsec: f64) -> f64 {
        let scale = self.pixel_scale_arcsec();
        let diffraction = self.diffraction_limit_arcsec() / FWHM_PER_SIGMA / scale;
        let seeing = seeing_arcsec / FWHM_PER_SIGMA / scale;
        let combined = (diffraction * diffraction + seeing * seeing).sqrt();
        combined.max(MIN_PSF_SIGMA_PX.max(seeing))
    }

    /// Render pixels per radian on the tangent plane.
    pub fn pixels_per_radian(&self) -> f64 {
        ARCSEC_PER_RADIAN / self.pixel_scale_arcsec()
    }
}
