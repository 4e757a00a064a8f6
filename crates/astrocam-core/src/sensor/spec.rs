use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::ARCSEC_PER_RADIAN;
use crate::error::{AstrocamError, Result};
use crate::render::SaturationModel;

pub const SUPPORTED_BIT_DEPTHS: [u32; 3] = [12, 14, 16];

/// Raw, unvalidated description of a camera, as read from configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub name: String,
    pub pixel_size_um: f64,
    pub width: usize,
    pub height: usize,
    pub read_noise_e: f64,
    /// Dark current at 25 °C, electrons per pixel per second.
    pub dark_current_e_per_s: f64,
    pub quantum_efficiency: f64,
    pub full_well_e: f64,
    pub bit_depth: u32,
    pub gain_e_per_adu: f64,
    pub has_cooling: bool,
    pub min_temp_c: f64,
    pub hot_pixel_fraction: f64,
    pub defect_fraction: f64,
    /// Electronic pedestal added at readout, in ADU.
    pub bias_offset_adu: f64,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            name: "Generic CMOS".to_string(),
            pixel_size_um: 3.76,
            width: 1920,
            height: 1080,
            read_noise_e: 2.0,
            dark_current_e_per_s: 0.01,
            quantum_efficiency: 0.70,
            full_well_e: 50_000.0,
            bit_depth: 16,
            gain_e_per_adu: 1.0,
            has_cooling: false,
            min_temp_c: -10.0,
            hot_pixel_fraction: 0.0005,
            defect_fraction: 0.0001,
            bias_offset_adu: 0.0,
        }
    }
}

/// Validated, immutable sensor description.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CameraSpec {
    params: CameraParams,
}

impl CameraSpec {
    pub fn new(params: CameraParams) -> Result<Self> {
        let p = &params;
        let invalid = |msg: String| Err(AstrocamError::InvalidCameraSpec(msg));

        if !(p.quantum_efficiency > 0.0 && p.quantum_efficiency <= 1.0) {
            return invalid(format!(
                "quantum efficiency must lie in (0, 1], got {}",
                p.quantum_efficiency
            ));
        }
        if !(p.read_noise_e > 0.0) {
            return invalid(format!("read noise must be positive, got {}", p.read_noise_e));
        }
        if !SUPPORTED_BIT_DEPTHS.contains(&p.bit_depth) {
            return invalid(format!(
                "bit depth must be one of {:?}, got {}",
                SUPPORTED_BIT_DEPTHS, p.bit_depth
            ));
        }
        if !(p.gain_e_per_adu > 0.0) {
            return invalid(format!("gain must be positive, got {}", p.gain_e_per_adu));
        }
        if !(p.full_well_e > 0.0) {
            return invalid(format!("full well must be positive, got {}", p.full_well_e));
        }
        if p.width == 0 || p.height == 0 {
            return invalid(format!("resolution must be non-zero, got {}x{}", p.width, p.height));
        }
        if !(p.pixel_size_um > 0.0) {
            return invalid(format!("pixel size must be positive, got {}", p.pixel_size_um));
        }
        if !(p.dark_current_e_per_s >= 0.0) {
            return invalid(format!(
                "dark current must be non-negative, got {}",
                p.dark_current_e_per_s
            ));
        }
        for (label, v) in [
            ("hot pixel fraction", p.hot_pixel_fraction),
            ("defect fraction", p.defect_fraction),
        ] {
            if !(0.0..1.0).contains(&v) {
                return invalid(format!("{label} must lie in [0, 1), got {v}"));
            }
        }
        if !(p.bias_offset_adu >= 0.0) {
            return invalid(format!(
                "bias offset must be non-negative, got {}",
                p.bias_offset_adu
            ));
        }

        Ok(Self { params })
    }

    /// Identifiers accepted by [`CameraSpec::preset`].
    pub fn preset_ids() -> &'static [&'static str] {
        &[
            "webcam-mod",
            "zwo-asi294mc",
            "qhy600m",
            "allsky-zwo174mm",
            "allsky-qhy462c",
        ]
    }

    pub fn preset(id: &str) -> Result<Self> {
        let params = match id {
            "webcam-mod" => CameraParams {
                name: "Modified Webcam".into(),
                pixel_size_um: 5.6,
                width: 640,
                height: 480,
                read_noise_e: 12.0,
                dark_current_e_per_s: 0.5,
                quantum_efficiency: 0.40,
                full_well_e: 15_000.0,
                bit_depth: 12,
                gain_e_per_adu: 2.0,
                ..CameraParams::default()
            },
            "zwo-asi294mc" => CameraParams {
                name: "ZWO ASI294MC Pro".into(),
                pixel_size_um: 4.63,
                width: 4144,
                height: 2822,
                read_noise_e: 1.5,
                dark_current_e_per_s: 0.005,
                quantum_efficiency: 0.80,
                full_well_e: 63_000.0,
                bit_depth: 14,
                gain_e_per_adu: 0.5,
                has_cooling: true,
                min_temp_c: -10.0,
                hot_pixel_fraction: 0.0001,
                defect_fraction: 0.00005,
                ..CameraParams::default()
            },
            "qhy600m" => CameraParams {
                name: "QHY600M".into(),
                pixel_size_um: 3.76,
                width: 9576,
                height: 6388,
                read_noise_e: 1.3,
                dark_current_e_per_s: 0.002,
                quantum_efficiency: 0.85,
                full_well_e: 90_000.0,
                bit_depth: 16,
                gain_e_per_adu: 0.3,
                has_cooling: true,
                min_temp_c: -20.0,
                hot_pixel_fraction: 0.00005,
                defect_fraction: 0.00002,
                ..CameraParams::default()
            },
            "allsky-zwo174mm" => CameraParams {
                name: "ZWO ASI174MM AllSky".into(),
                pixel_size_um: 5.86,
                width: 1936,
                height: 1216,
                read_noise_e: 3.0,
                dark_current_e_per_s: 0.04,
                quantum_efficiency: 0.78,
                full_well_e: 32_000.0,
                bit_depth: 12,
                gain_e_per_adu: 1.2,
                hot_pixel_fraction: 0.0003,
                ..CameraParams::default()
            },
            "allsky-qhy462c" => CameraParams {
                name: "QHY5III-462C AllSky".into(),
                pixel_size_um: 2.90,
                width: 1920,
                height: 1080,
                read_noise_e: 1.0,
                dark_current_e_per_s: 0.02,
                quantum_efficiency: 0.91,
                full_well_e: 14_000.0,
                bit_depth: 12,
                gain_e_per_adu: 0.4,
                hot_pixel_fraction: 0.0002,
                ..CameraParams::default()
            },
            other => {
                return Err(AstrocamError::InvalidCameraSpec(format!(
                    "unknown camera preset '{other}'"
                )))
            }
        };
        Self::new(params)
    }

    pub fn params(&self) -> &CameraParams {
        &self.params
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    /// (width, height) in physical pixels.
    pub fn resolution(&self) -> (usize, usize) {
        (self.params.width, self.params.height)
    }

    pub fn quantum_efficiency(&self) -> f64 {
        self.params.quantum_efficiency
    }

    pub fn read_noise_e(&self) -> f64 {
        self.params.read_noise_e
    }

    pub fn dark_current_e_per_s(&self) -> f64 {
        self.params.dark_current_e_per_s
    }

    pub fn full_well_e(&self) -> f64 {
        self.params.full_well_e
    }

    pub fn bit_depth(&self) -> u32 {
        self.params.bit_depth
    }

    pub fn gain_e_per_adu(&self) -> f64 {
        self.params.gain_e_per_adu
    }

    pub fn has_cooling(&self) -> bool {
        self.params.has_cooling
    }

    pub fn min_temp_c(&self) -> f64 {
        self.params.min_temp_c
    }

    pub fn bias_offset_adu(&self) -> f64 {
        self.params.bias_offset_adu
    }

    pub fn max_adu(&self) -> f64 {
        ((1u64 << self.params.bit_depth) - 1) as f64
    }

    pub fn read_noise_adu(&self) -> f64 {
        self.params.read_noise_e / self.params.gain_e_per_adu
    }

    pub fn sensor_width_mm(&self) -> f64 {
        self.params.width as f64 * self.params.pixel_size_um / 1000.0
    }

    pub fn sensor_height_mm(&self) -> f64 {
        self.params.height as f64 * self.params.pixel_size_um / 1000.0
    }

    pub fn sensor_diagonal_mm(&self) -> f64 {
        self.sensor_width_mm().hypot(self.sensor_height_mm())
    }

    pub fn sensor_area_mm2(&self) -> f64 {
        self.sensor_width_mm() * self.sensor_height_mm()
    }

    /// Arcseconds per physical pixel behind a telescope of `focal_length_mm`.
    pub fn pixel_scale_arcsec(&self, focal_length_mm: f64) -> f64 {
        self.params.pixel_size_um / 1000.0 / focal_length_mm * ARCSEC_PER_RADIAN
    }

    /// Exact (width, height) field of view in degrees.
    pub fn fov_deg(&self, focal_length_mm: f64) -> (f64, f64) {
        let angle = |size_mm: f64| (2.0 * (size_mm / (2.0 * focal_length_mm)).atan()).to_degrees();
        (angle(self.sensor_width_mm()), angle(self.sensor_height_mm()))
    }

    /// The saturation figures the renderer's bloom needs.
    pub fn saturation_model(&self) -> SaturationModel {
        SaturationModel {
            full_well_e: self.params.full_well_e,
            quantum_efficiency: self.params.quantum_efficiency,
        }
    }
}

impl fmt::Display for CameraSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CameraSpec('{}', {}x{}, {}bit, RN={:.1}e)",
            self.params.name,
            self.params.width,
            self.params.height,
            self.params.bit_depth,
            self.params.read_noise_e
        )
    }
}
