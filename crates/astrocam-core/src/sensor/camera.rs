use ndarray::Array2;
use once_cell::sync::OnceCell;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::defects::DefectMaps;
use super::spec::CameraSpec;
use crate::consts::{DARK_DOUBLING_TEMP_C, DARK_REFERENCE_TEMP_C, DEFAULT_SENSOR_SEED};
use crate::error::{AstrocamError, Result};
use crate::frame::{Frame, FrameKind, FrameMetadata};
use crate::parallel::map_rows;
use crate::render::background::vignette;
use crate::seed::{hash_u64, rng_from_seed};

/// Which noise contributions a capture simulates. All on by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSources {
    pub shot: bool,
    pub dark: bool,
    pub read: bool,
    pub hot_pixels: bool,
    pub dead_pixels: bool,
}

impl Default for NoiseSources {
    fn default() -> Self {
        Self {
            shot: true,
            dark: true,
            read: true,
            hot_pixels: true,
            dead_pixels: true,
        }
    }
}

impl NoiseSources {
    /// Ideal sensor: QE, full well, gain and quantization only.
    pub fn none() -> Self {
        Self {
            shot: false,
            dark: false,
            read: false,
            hot_pixels: false,
            dead_pixels: false,
        }
    }

    pub fn shot_only() -> Self {
        Self {
            shot: true,
            ..Self::none()
        }
    }
}

/// Descriptive fields stamped onto every captured frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionLabels {
    pub telescope: String,
    pub filter_name: String,
    pub target_name: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
}

/// Turns photon grids into quantized readouts.
///
/// Each instance owns its defect maps (built on first capture) and an
/// exposure counter from which default frame seeds are derived. Two capture
/// sequences that must be reproducible independently need two instances.
pub struct SensorModel {
    spec: CameraSpec,
    seed: u64,
    noise: NoiseSources,
    labels: AcquisitionLabels,
    temperature_c: f64,
    cooling: bool,
    exposure_count: u64,
    defects: OnceCell<DefectMaps>,
}

impl SensorModel {
    pub fn new(spec: CameraSpec, seed: Option<u64>) -> Self {
        Self {
            spec,
            seed: seed.unwrap_or(DEFAULT_SENSOR_SEED),
            noise: NoiseSources::default(),
            labels: AcquisitionLabels::default(),
            temperature_c: DARK_REFERENCE_TEMP_C,
            cooling: false,
            exposure_count: 0,
            defects: OnceCell::new(),
        }
    }

    pub fn with_noise(mut self, noise: NoiseSources) -> Self {
        self.noise = noise;
        self
    }

    pub fn set_labels(&mut self, labels: AcquisitionLabels) {
        self.labels = labels;
    }

    pub fn spec(&self) -> &CameraSpec {
        &self.spec
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn noise(&self) -> NoiseSources {
        self.noise
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    pub fn is_cooling(&self) -> bool {
        self.cooling
    }

    pub fn exposure_count(&self) -> u64 {
        self.exposure_count
    }

    /// Switch regulated cooling. The target is clamped to the camera's
    /// minimum; turning cooling off returns the sensor to ambient.
    pub fn set_cooling(&mut self, enabled: bool, target_temp_c: Option<f64>) -> Result<()> {
        if enabled && !self.spec.has_cooling() {
            return Err(AstrocamError::CoolingUnavailable(self.spec.name().to_string()));
        }
        self.cooling = enabled;
        if enabled {
            if let Some(target) = target_temp_c {
                self.temperature_c = target.max(self.spec.min_temp_c());
            }
        } else {
            self.temperature_c = DARK_REFERENCE_TEMP_C;
        }
        Ok(())
    }

    /// Dark-current multiplier at the current sensor temperature.
    pub fn dark_temperature_factor(&self) -> f64 {
        2f64.powf((self.temperature_c - DARK_REFERENCE_TEMP_C) / DARK_DOUBLING_TEMP_C)
    }

    pub fn defect_maps(&self) -> &DefectMaps {
        self.defects.get_or_init(|| {
            let (w, h) = self.spec.resolution();
            let p = self.spec.params();
            DefectMaps::generate(w, h, p.hot_pixel_fraction, p.defect_fraction, self.seed)
        })
    }

    /// Seed the next capture will use when none is given.
    pub fn next_frame_seed(&self) -> u64 {
        hash_u64(self.seed, self.exposure_count)
    }

    /// Read out one exposure of `photons` (photons per output pixel).
    ///
    /// Per pixel: QE, shot noise, binned dark current plus hot pixels (both
    /// shot-noised), read noise, full-well clamp, gain, bias offset and
    /// quantization to `[0, 2^bit_depth - 1]`. The same `frame_seed` always
    /// yields the same output.
    pub fn capture(
        &mut self,
        exposure_s: f64,
        photons: &Array2<f32>,
        kind: FrameKind,
        frame_seed: Option<u64>,
    ) -> Frame {
        let frame_seed = frame_seed.unwrap_or_else(|| self.next_frame_seed());
        let (h, w) = photons.dim();
        let (sensor_w, sensor_h) = self.spec.resolution();
        let bin_x = if w > 0 { sensor_w as f64 / w as f64 } else { 1.0 };
        let bin_y = if h > 0 { sensor_h as f64 / h as f64 } else { 1.0 };

        let noise = self.noise;
        let qe = self.spec.quantum_efficiency() as f32;
        let dark_e = if noise.dark {
            (self.spec.dark_current_e_per_s()
                * self.dark_temperature_factor()
                * exposure_s
                * bin_x
                * bin_y) as f32
        } else {
            0.0
        };
        let hot = noise
            .hot_pixels
            .then(|| self.defect_maps().hot_electrons((h, w), exposure_s));
        let response = noise
            .dead_pixels
            .then(|| self.defect_maps().optical_response((h, w)));

        let read_noise = self.spec.read_noise_e() as f32;
        let full_well = self.spec.full_well_e() as f32;
        let gain = self.spec.gain_e_per_adu() as f32;
        let offset = self.spec.bias_offset_adu() as f32;
        let max_adu = self.spec.max_adu() as f32;

        let data = map_rows(h, w, |row, out| {
            let mut rng = rng_from_seed(hash_u64(frame_seed, row as u64));
            for (col, value) in out.iter_mut().enumerate() {
                // Three draws per pixel whatever the switches, so toggling
                // one source leaves the others' noise unchanged.
                let n_shot: f32 = rng.sample(StandardNormal);
                let n_dark: f32 = rng.sample(StandardNormal);
                let n_read: f32 = rng.sample(StandardNormal);

                let mut signal = photons[[row, col]].max(0.0) * qe;
                if let Some(resp) = &response {
                    signal *= resp[[row, col]];
                }
                if noise.shot {
                    signal += signal.max(0.0).sqrt() * n_shot;
                }

                let mut dark = dark_e;
                if let Some(hot) = &hot {
                    dark += hot[[row, col]];
                }
                if dark > 0.0 {
                    dark += dark.sqrt() * n_dark;
                }

                let mut electrons = signal + dark;
                if noise.read {
                    electrons += read_noise * n_read;
                }

                let adu = electrons.clamp(0.0, full_well) / gain + offset;
                *value = adu.clamp(0.0, max_adu).round();
            }
        });

        let mut metadata = FrameMetadata::new(kind, exposure_s);
        metadata.frame_id = self.exposure_count;
        metadata.gain = self.spec.gain_e_per_adu();
        metadata.binning = bin_x.round().max(1.0) as u32;
        metadata.camera = self.spec.name().to_string();
        metadata.temperature_c = self.temperature_c;
        metadata.telescope = self.labels.telescope.clone();
        metadata.target_name = self.labels.target_name.clone();
        metadata.ra_deg = self.labels.ra_deg;
        metadata.dec_deg = self.labels.dec_deg;
        if !self.labels.filter_name.is_empty() {
            metadata.filter_name = self.labels.filter_name.clone();
        }

        debug!(
            kind = %kind,
            exposure_s,
            seed = frame_seed,
            frame_id = self.exposure_count,
            "Captured frame"
        );
        self.exposure_count += 1;
        Frame::new(data, metadata)
    }

    /// Closed-shutter exposure on an output grid of `shape` (h, w).
    pub fn capture_dark(
        &mut self,
        exposure_s: f64,
        shape: (usize, usize),
        frame_seed: Option<u64>,
    ) -> Frame {
        let photons = Array2::<f32>::zeros(shape);
        self.capture(exposure_s, &photons, FrameKind::Dark, frame_seed)
    }

    /// Zero-length closed-shutter exposure: read noise and offset only.
    pub fn capture_bias(&mut self, shape: (usize, usize), frame_seed: Option<u64>) -> Frame {
        let photons = Array2::<f32>::zeros(shape);
        self.capture(0.0, &photons, FrameKind::Bias, frame_seed)
    }

    /// Exposure of an evenly lit panel at `level` photons per pixel, with
    /// the optical vignette.
    pub fn capture_flat(
        &mut self,
        exposure_s: f64,
        level: f64,
        shape: (usize, usize),
        frame_seed: Option<u64>,
    ) -> Frame {
        let photons = vignette(shape.0, shape.1) * level as f32;
        self.capture(exposure_s, &photons, FrameKind::Flat, frame_seed)
    }

    /// Output-grid shape at the sensor's native resolution.
    pub fn native_shape(&self) -> (usize, usize) {
        let (w, h) = self.spec.resolution();
        (h, w)
    }
}
