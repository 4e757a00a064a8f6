mod camera;
pub mod defects;
mod spec;

pub use camera::{AcquisitionLabels, NoiseSources, SensorModel};
pub use defects::{DefectMaps, HotPixel};
pub use spec::{CameraParams, CameraSpec, SUPPORTED_BIT_DEPTHS};
