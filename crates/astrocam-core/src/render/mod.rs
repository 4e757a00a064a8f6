pub mod background;
pub mod deep_sky;
pub mod optics;
pub mod photometry;
pub mod projection;
pub mod psf;
mod renderer;
pub mod solar;

pub use optics::OpticsConfig;
pub use photometry::{bv_to_rgb, FluxCalibration};
pub use renderer::{FluxFieldRenderer, Pointing, RgbField};
pub use solar::SaturationModel;
