mod library;
mod light;
mod master;

pub use library::CalibrationLibrary;
pub use light::{
    batch_calibrate_lights, calibrate_light, cosmetic_correction, CosmeticParams, ReplaceMethod,
};
pub use master::{master_bias, master_dark, master_flat};
