use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Sun,
    Moon,
}

/// Horizontal position and illumination of the Sun or Moon at render time.
pub trait OrbitalBody {
    fn kind(&self) -> BodyKind;
    fn altitude_deg(&self) -> f64;
    fn azimuth_deg(&self) -> f64;
    /// Illuminated fraction, 1.0 = full.
    fn phase_fraction(&self) -> f64;
    /// 0° = full, 180° = new, beyond 180° waning.
    fn phase_angle_deg(&self) -> f64;
}

/// A fixed snapshot of a body's position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyPosition {
    pub kind: BodyKind,
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
    pub phase_angle_deg: f64,
}

impl BodyPosition {
    pub fn sun(altitude_deg: f64, azimuth_deg: f64) -> Self {
        Self {
            kind: BodyKind::Sun,
            altitude_deg,
            azimuth_deg,
            phase_angle_deg: 0.0,
        }
    }

    pub fn moon(altitude_deg: f64, azimuth_deg: f64, phase_angle_deg: f64) -> Self {
        Self {
            kind: BodyKind::Moon,
            altitude_deg,
            azimuth_deg,
            phase_angle_deg,
        }
    }
}

impl OrbitalBody for BodyPosition {
    fn kind(&self) -> BodyKind {
        self.kind
    }

    fn altitude_deg(&self) -> f64 {
        self.altitude_deg
    }

    fn azimuth_deg(&self) -> f64 {
        self.azimuth_deg
    }

    fn phase_fraction(&self) -> f64 {
        match self.kind {
            BodyKind::Sun => 1.0,
            BodyKind::Moon => (1.0 + self.phase_angle_deg.to_radians().cos()) / 2.0,
        }
    }

    fn phase_angle_deg(&self) -> f64 {
        self.phase_angle_deg
    }
}
