pub mod config;
mod session;
pub mod types;

pub use config::{FrameCounts, SessionConfig, StackingConfig};
pub use session::{run_session, ImagingSession};
pub use types::{NoOpReporter, ProgressReporter, SessionOutput, SessionReport, SessionStage};
