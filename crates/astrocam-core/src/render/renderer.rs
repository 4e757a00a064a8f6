use std::borrow::Cow;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::background::{fallback_sky, vignette};
use super::deep_sky::{render_cluster, render_galaxy, render_nebula};
use super::optics::OpticsConfig;
use super::photometry::{bv_to_rgb, FluxCalibration};
use super::psf::{splat, PsfBank, PsfKernel};
use super::projection::{FieldBox, TangentPlane};
use super::solar::{render_body, SaturationModel, SolarContext};
use crate::error::Result;
use crate::sky::{AtmosphericState, BodyKind, ObjectClass, OrbitalBody, SkyContext};

/// Stars projected this far outside the buffer still spill light onto it.
const STAR_PIXEL_MARGIN: f64 = 20.0;
const DSO_PIXEL_MARGIN: f64 = 100.0;
const STAR_BOX_FRACTION: f64 = 0.75;
const DSO_BOX_FRACTION_DEC: f64 = 0.7;
const MIN_DSO_SIZE_PX: f64 = 3.0;

const SKY_TINT: (f32, f32, f32) = (0.85, 1.0, 1.1);
const DSO_TINT: (f32, f32, f32) = (0.9, 1.0, 0.8);
const MOON_TINT: (f32, f32, f32) = (0.78, 0.82, 0.95);

/// Where the telescope points. Horizontal coordinates drive extinction and
/// the placement of the Sun and Moon.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pointing {
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub alt_deg: f64,
    pub az_deg: f64,
}

impl Default for Pointing {
    fn default() -> Self {
        Self {
            ra_deg: 0.0,
            dec_deg: 0.0,
            alt_deg: 45.0,
            az_deg: 180.0,
        }
    }
}

impl Pointing {
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            ra_deg,
            dec_deg,
            ..Self::default()
        }
    }

    pub fn with_horizontal(mut self, alt_deg: f64, az_deg: f64) -> Self {
        self.alt_deg = alt_deg;
        self.az_deg = az_deg;
        self
    }
}

/// Three colour-filtered photon fields of identical shape.
#[derive(Clone, Debug)]
pub struct RgbField {
    pub red: Array2<f32>,
    pub green: Array2<f32>,
    pub blue: Array2<f32>,
}

impl RgbField {
    fn zeros(shape: (usize, usize)) -> Self {
        Self {
            red: Array2::zeros(shape),
            green: Array2::zeros(shape),
            blue: Array2::zeros(shape),
        }
    }

    fn add_tinted(&mut self, mono: &Array2<f32>, tint: (f32, f32, f32)) {
        self.red.scaled_add(tint.0, mono);
        self.green.scaled_add(tint.1, mono);
        self.blue.scaled_add(tint.2, mono);
    }

    /// Rec. 601 luminance.
    pub fn luminance(&self) -> Array2<f32> {
        &self.red * 0.299 + &self.green * 0.587 + &self.blue * 0.114
    }
}

/// A star that survived culling, ready to be splatted.
struct PlacedStar<'k> {
    px: f64,
    py: f64,
    photons: f64,
    bv_color: f64,
    psf: &'k PsfKernel,
}

/// Turns a source catalog into a grid of expected photon counts.
pub struct FluxFieldRenderer {
    optics: OpticsConfig,
    calibration: FluxCalibration,
    saturation: SaturationModel,
    psf: PsfBank,
}

impl FluxFieldRenderer {
    pub fn new(optics: OpticsConfig, calibration: FluxCalibration) -> Result<Self> {
        optics.validate()?;
        let psf = PsfBank::new(optics.psf_sigma_px(optics.seeing_arcsec));
        Ok(Self {
            optics,
            calibration,
            saturation: SaturationModel::default(),
            psf,
        })
    }

    /// Use the full well and QE of the camera the field is rendered for.
    pub fn with_saturation(mut self, saturation: SaturationModel) -> Self {
        self.saturation = saturation;
        self
    }

    pub fn optics(&self) -> &OpticsConfig {
        &self.optics
    }

    pub fn calibration(&self) -> &FluxCalibration {
        &self.calibration
    }

    pub fn psf_sigma_px(&self) -> f64 {
        self.psf.base_sigma()
    }

    /// (height, width) of every grid this renderer produces.
    pub fn shape(&self) -> (usize, usize) {
        (self.optics.render_height, self.optics.render_width)
    }

    fn plane(&self, pointing: &Pointing) -> TangentPlane {
        let (h, w) = self.shape();
        TangentPlane::equatorial(
            pointing.ra_deg,
            pointing.dec_deg,
            self.optics.pixels_per_radian(),
            w,
            h,
        )
    }

    fn psf_bank(&self, atmosphere: Option<&dyn AtmosphericState>) -> Cow<'_, PsfBank> {
        match atmosphere {
            Some(atm) if (atm.seeing_arcsec() - self.optics.seeing_arcsec).abs() > 1e-9 => {
                Cow::Owned(PsfBank::new(self.optics.psf_sigma_px(atm.seeing_arcsec())))
            }
            _ => Cow::Borrowed(&self.psf),
        }
    }

    fn background(&self, atmosphere: Option<&dyn AtmosphericState>, exposure_s: f64) -> Array2<f32> {
        let (h, w) = self.shape();
        match atmosphere {
            Some(atm) => atm.sky_background(h, w, exposure_s),
            None => {
                let sky = self.calibration.sky_photons_per_pixel(
                    self.optics.sky_background_mag,
                    self.optics.aperture_cm(),
                    self.optics.pixel_scale_arcsec(),
                    exposure_s,
                );
                fallback_sky(h, w, sky)
            }
        }
    }

    /// Render the expected photon counts of one field.
    ///
    /// Sources fainter than `mag_limit`, outside the field, or behind the
    /// tangent plane are skipped. With an atmosphere, stars are dimmed by
    /// extinction at the pointing altitude and dropped once fainter than
    /// `mag_limit + 1`. An empty catalog yields the background alone.
    pub fn render_field(
        &self,
        pointing: &Pointing,
        exposure_s: f64,
        mag_limit: f64,
        sky: &SkyContext<'_>,
    ) -> Array2<f32> {
        let mut field = self.background(sky.atmosphere, exposure_s);

        let n_dso = self.render_deep_sky(&mut field, pointing, exposure_s, sky);

        let bank = self.psf_bank(sky.atmosphere);
        let mut n_stars = 0usize;
        self.for_each_star(pointing, exposure_s, mag_limit, sky, &bank, |star| {
            splat(&mut field, &star.psf.kernel, star.px, star.py, star.photons);
            n_stars += 1;
        });

        let mut n_bodies = 0usize;
        for body in &sky.bodies {
            if self.render_solar_body(&mut field, *body, pointing, exposure_s) {
                n_bodies += 1;
            }
        }

        debug!(
            ra = pointing.ra_deg,
            dec = pointing.dec_deg,
            stars = n_stars,
            deep_sky = n_dso,
            bodies = n_bodies,
            "Rendered field"
        );
        field
    }

    /// Colour variant of [`render_field`](Self::render_field): stars are
    /// weighted by their B-V colour, the sky is slightly blue and nebulae
    /// slightly red.
    pub fn render_rgb(
        &self,
        pointing: &Pointing,
        exposure_s: f64,
        mag_limit: f64,
        sky: &SkyContext<'_>,
    ) -> RgbField {
        let shape = self.shape();
        let mut rgb = RgbField::zeros(shape);

        let background = self.background(sky.atmosphere, exposure_s);
        rgb.add_tinted(&background, SKY_TINT);

        let mut dso = Array2::<f32>::zeros(shape);
        self.render_deep_sky(&mut dso, pointing, exposure_s, sky);
        rgb.add_tinted(&dso, DSO_TINT);

        let bank = self.psf_bank(sky.atmosphere);
        self.for_each_star(pointing, exposure_s, mag_limit, sky, &bank, |star| {
            let (r, g, b) = bv_to_rgb(star.bv_color);
            let k = &star.psf.kernel;
            splat(&mut rgb.red, k, star.px, star.py, star.photons * r);
            splat(&mut rgb.green, k, star.px, star.py, star.photons * g);
            splat(&mut rgb.blue, k, star.px, star.py, star.photons * b);
        });

        for body in &sky.bodies {
            let mut glow = Array2::<f32>::zeros(shape);
            if self.render_solar_body(&mut glow, *body, pointing, exposure_s) {
                rgb.add_tinted(&glow, body_tint(*body));
            }
        }
        rgb
    }

    /// Evenly illuminated field at `level` photons per pixel, shaped by the
    /// optical vignette. Used to acquire flat frames.
    pub fn render_flat_illumination(&self, level: f64) -> Array2<f32> {
        let (h, w) = self.shape();
        vignette(h, w) * level as f32
    }

    fn for_each_star<F>(
        &self,
        pointing: &Pointing,
        exposure_s: f64,
        mag_limit: f64,
        sky: &SkyContext<'_>,
        bank: &PsfBank,
        mut f: F,
    ) where
        F: FnMut(PlacedStar<'_>),
    {
        let (fov_w, fov_h) = self.optics.fov_deg();
        let field_box = FieldBox::new(
            pointing.ra_deg,
            pointing.dec_deg,
            fov_w * STAR_BOX_FRACTION,
            fov_h * STAR_BOX_FRACTION,
        );
        let plane = self.plane(pointing);
        let aperture_cm = self.optics.aperture_cm();

        for star in sky.catalog.stars() {
            if star.mag > mag_limit || !field_box.contains(star.ra_deg, star.dec_deg) {
                continue;
            }
            let Some((px, py)) = plane.project(star.ra_deg, star.dec_deg) else {
                continue;
            };
            if !plane.within(px, py, STAR_PIXEL_MARGIN) {
                continue;
            }

            let mut mag = star.mag;
            if let Some(atm) = sky.atmosphere {
                mag += atm.extinction_mag(pointing.alt_deg, star.bv_color);
                if mag > mag_limit + 1.0 {
                    continue;
                }
            }

            f(PlacedStar {
                px,
                py,
                photons: self.calibration.mag_to_flux(mag, aperture_cm, exposure_s),
                bv_color: star.bv_color,
                psf: bank.for_magnitude(mag),
            });
        }
    }

    fn render_deep_sky(
        &self,
        field: &mut Array2<f32>,
        pointing: &Pointing,
        exposure_s: f64,
        sky: &SkyContext<'_>,
    ) -> usize {
        let (h, w) = self.shape();
        let (fov_w, fov_h) = self.optics.fov_deg();
        let field_box = FieldBox::new(
            pointing.ra_deg,
            pointing.dec_deg,
            fov_w * STAR_BOX_FRACTION,
            fov_h * DSO_BOX_FRACTION_DEC,
        );
        let plane = self.plane(pointing);
        let pixel_scale = self.optics.pixel_scale_arcsec();
        let max_size = h.min(w) as f64 * 0.4;

        let mut rendered = 0;
        for obj in sky.catalog.deep_sky_objects() {
            if obj.mag > self.calibration.dso_mag_limit
                || !field_box.contains(obj.ra_deg, obj.dec_deg)
            {
                continue;
            }
            let Some((px, py)) = plane.project(obj.ra_deg, obj.dec_deg) else {
                continue;
            };
            if !plane.within(px, py, DSO_PIXEL_MARGIN) {
                continue;
            }

            let photons = self
                .calibration
                .mag_to_flux(obj.mag, self.optics.aperture_cm(), exposure_s)
                * self.calibration.dso_flux_fraction;
            let size_px = (obj.size_arcmin * 60.0 / pixel_scale)
                .min(max_size)
                .max(MIN_DSO_SIZE_PX);

            match obj.class {
                ObjectClass::Galaxy => render_galaxy(field, px, py, photons, size_px, obj.bv_color),
                ObjectClass::Nebula(kind) => render_nebula(field, px, py, photons, size_px, kind),
                ObjectClass::Cluster(kind) => render_cluster(field, px, py, photons, size_px, kind),
            }
            rendered += 1;
        }
        rendered
    }

    fn render_solar_body(
        &self,
        field: &mut Array2<f32>,
        body: &dyn OrbitalBody,
        pointing: &Pointing,
        exposure_s: f64,
    ) -> bool {
        let (h, w) = self.shape();
        let plane = TangentPlane::horizontal(
            pointing.az_deg,
            pointing.alt_deg,
            self.optics.pixels_per_radian(),
            w,
            h,
        );
        let ctx = SolarContext {
            plane: &plane,
            calibration: &self.calibration,
            saturation: &self.saturation,
            aperture_cm: self.optics.aperture_cm(),
            pixel_scale_arcsec: self.optics.pixel_scale_arcsec(),
            exposure_s,
        };
        render_body(field, body, &ctx)
    }
}

/// Sun colour reddens toward the horizon.
fn body_tint(body: &dyn OrbitalBody) -> (f32, f32, f32) {
    match body.kind() {
        BodyKind::Sun => {
            let alt_n = (body.altitude_deg() / 90.0).clamp(0.02, 1.0) as f32;
            (
                1.0 + (1.0 - alt_n) * 1.5,
                1.0 + (1.0 - alt_n) * 0.2,
                alt_n * 0.7,
            )
        }
        BodyKind::Moon => MOON_TINT,
    }
}
