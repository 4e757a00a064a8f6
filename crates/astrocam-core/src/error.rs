use thiserror::Error;

use crate::frame::FrameKind;

#[derive(Error, Debug)]
pub enum AstrocamError {
    #[error("Invalid camera spec: {0}")]
    InvalidCameraSpec(String),

    #[error("Invalid optics config: {0}")]
    InvalidOptics(String),

    #[error("Frame dimensions {found:?} do not match expected {expected:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Frame kind {found} does not belong in a {expected} set")]
    FrameKindMismatch { expected: FrameKind, found: FrameKind },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Camera '{0}' has no regulated cooling")]
    CoolingUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AstrocamError>;

/// Fail with `DimensionMismatch` unless `found` equals `expected`.
pub(crate) fn ensure_same_dim(expected: (usize, usize), found: (usize, usize)) -> Result<()> {
    if expected != found {
        return Err(AstrocamError::DimensionMismatch { expected, found });
    }
    Ok(())
}
