use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_ALIGN_REGION;
use crate::error::{AstrocamError, Result};
use crate::quality::StarDetectionParams;
use crate::render::{FluxCalibration, OpticsConfig, Pointing};
use crate::sensor::{CameraParams, CameraSpec};
use crate::sky::ClearSky;
use crate::stack::StackMethod;

/// How many exposures of each kind a session acquires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameCounts {
    pub lights: usize,
    pub darks: usize,
    pub flats: usize,
    pub biases: usize,
}

impl Default for FrameCounts {
    fn default() -> Self {
        Self {
            lights: 10,
            darks: 5,
            flats: 5,
            biases: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackingConfig {
    pub align: bool,
    pub subpixel: bool,
    pub reference_index: usize,
    /// Side of the central window used for shift estimation, 0 = whole frame.
    pub region_size: usize,
    pub method: StackMethod,
}

impl Default for StackingConfig {
    fn default() -> Self {
        Self {
            align: true,
            subpixel: false,
            reference_index: 0,
            region_size: DEFAULT_ALIGN_REGION,
            method: StackMethod::default(),
        }
    }
}

/// Everything needed to simulate one imaging session end to end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub seed: u64,
    pub target_name: String,
    /// Camera preset identifier; overrides `camera` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_preset: Option<String>,
    pub light_exposure_s: f64,
    pub flat_exposure_s: f64,
    /// Photons per render pixel at the centre of a flat.
    pub flat_level: f64,
    pub mag_limit: f64,
    /// Maximum tracking drift between lights, in render pixels per axis.
    pub dither_px: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooling_target_c: Option<f64>,
    pub cosmetic_correction: bool,
    pub frames: FrameCounts,
    pub stacking: StackingConfig,
    pub camera: CameraParams,
    pub optics: OpticsConfig,
    pub flux: FluxCalibration,
    pub pointing: Pointing,
    pub atmosphere: ClearSky,
    pub quality: StarDetectionParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            target_name: "Field".to_string(),
            camera_preset: None,
            light_exposure_s: 30.0,
            flat_exposure_s: 1.0,
            flat_level: 30_000.0,
            mag_limit: 12.0,
            dither_px: 3.0,
            cooling_target_c: None,
            cosmetic_correction: true,
            frames: FrameCounts::default(),
            stacking: StackingConfig::default(),
            camera: CameraParams::default(),
            optics: OpticsConfig::default(),
            flux: FluxCalibration::default(),
            pointing: Pointing::default(),
            atmosphere: ClearSky::default(),
            quality: StarDetectionParams::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.frames.lights == 0 {
            return Err(AstrocamError::InvalidConfig(
                "a session needs at least one light frame".into(),
            ));
        }
        if !(self.light_exposure_s > 0.0) {
            return Err(AstrocamError::InvalidConfig(format!(
                "light exposure must be positive (got {})",
                self.light_exposure_s
            )));
        }
        if !(self.flat_exposure_s >= 0.0) || !(self.flat_level >= 0.0) {
            return Err(AstrocamError::InvalidConfig(
                "flat exposure and level must be non-negative".into(),
            ));
        }
        if !(self.dither_px >= 0.0) {
            return Err(AstrocamError::InvalidConfig(format!(
                "dither must be non-negative (got {})",
                self.dither_px
            )));
        }
        if self.stacking.reference_index >= self.frames.lights {
            return Err(AstrocamError::InvalidConfig(format!(
                "reference index {} is beyond the {} light frames",
                self.stacking.reference_index, self.frames.lights
            )));
        }
        self.optics.validate()?;
        self.camera_spec()?;
        Ok(())
    }

    /// The preset named by `camera_preset`, else a spec built from `camera`.
    pub fn camera_spec(&self) -> Result<CameraSpec> {
        match &self.camera_preset {
            Some(id) => CameraSpec::preset(id),
            None => CameraSpec::new(self.camera.clone()),
        }
    }

    /// Optics with the physical sensor geometry taken from `spec`, so the
    /// rendered field and the captured frames describe the same sensor.
    pub fn optics_for(&self, spec: &CameraSpec) -> OpticsConfig {
        let (width, height) = spec.resolution();
        OpticsConfig {
            pixel_size_um: spec.params().pixel_size_um,
            sensor_width: width,
            sensor_height: height,
            ..self.optics.clone()
        }
    }
}
