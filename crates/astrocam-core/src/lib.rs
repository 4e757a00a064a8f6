pub mod align;
pub mod calibrate;
pub mod consts;
pub mod error;
pub mod frame;
pub mod parallel;
pub mod pipeline;
pub mod quality;
pub mod render;
pub mod seed;
pub mod sensor;
pub mod sky;
pub mod stack;
pub mod stats;
