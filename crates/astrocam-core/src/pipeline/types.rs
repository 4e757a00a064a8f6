use crate::frame::{AlignmentOffset, Frame, QualityMetrics};
use crate::stack::StackMethod;

/// Session stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStage {
    Bias,
    Darks,
    Flats,
    Lights,
    Masters,
    Calibration,
    Alignment,
    Stacking,
    Assessment,
}

impl std::fmt::Display for SessionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bias => write!(f, "Capturing bias frames"),
            Self::Darks => write!(f, "Capturing dark frames"),
            Self::Flats => write!(f, "Capturing flat frames"),
            Self::Lights => write!(f, "Capturing light frames"),
            Self::Masters => write!(f, "Building master frames"),
            Self::Calibration => write!(f, "Calibrating lights"),
            Self::Alignment => write!(f, "Aligning frames"),
            Self::Stacking => write!(f, "Stacking"),
            Self::Assessment => write!(f, "Assessing quality"),
        }
    }
}

/// Thread-safe progress reporting for a session.
///
/// All methods default to no-ops.
pub trait ProgressReporter: Send + Sync {
    /// A stage has started; `total_items` is its frame count when known.
    fn begin_stage(&self, _stage: SessionStage, _total_items: Option<usize>) {}

    fn advance(&self, _items_done: usize) {}

    fn finish_stage(&self) {}
}

pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Figures describing how a session went.
#[derive(Clone, Debug)]
pub struct SessionReport {
    pub camera: String,
    pub light_count: usize,
    pub dark_count: usize,
    pub flat_count: usize,
    pub bias_count: usize,
    pub method: StackMethod,
    pub total_integration_s: f64,
    pub shifts: Vec<AlignmentOffset>,
    /// Mean measured SNR of the calibrated lights.
    pub single_frame_snr: f64,
    /// Measured SNR of the stacked result.
    pub stacked_snr: f64,
    pub theoretical_improvement: f64,
    pub estimated_final_snr: f64,
    pub stacked_quality: QualityMetrics,
}

impl SessionReport {
    /// Stacked over single-frame SNR, 0 when the latter is unknown.
    pub fn measured_improvement(&self) -> f64 {
        if self.single_frame_snr > 0.0 {
            self.stacked_snr / self.single_frame_snr
        } else {
            0.0
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionOutput {
    pub stacked: Frame,
    pub report: SessionReport,
}
