use std::collections::BTreeMap;
use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{AstrocamError, Result};
use crate::stats::{mean_std, median_in_place};

/// Role of an exposure in the reduction chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    Light,
    Dark,
    Flat,
    Bias,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "LIGHT"),
            Self::Dark => write!(f, "DARK"),
            Self::Flat => write!(f, "FLAT"),
            Self::Bias => write!(f, "BIAS"),
        }
    }
}

/// Summary statistics of a frame's pixel grid, computed once at creation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub mean: f32,
    pub median: f32,
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
}

impl FrameStats {
    pub fn compute(data: &Array2<f32>) -> Self {
        if data.is_empty() {
            return Self::default();
        }
        let mut values: Vec<f32> = data.iter().copied().collect();
        let (mean, std_dev) = mean_std(&values);
        let (min, max) = values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let median = median_in_place(&mut values).unwrap_or(0.0);
        Self {
            mean,
            median,
            std_dev,
            min,
            max,
        }
    }
}

/// Optional measured quality of a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QualityMetrics {
    pub fwhm_px: Option<f64>,
    pub snr: Option<f64>,
    pub star_count: Option<usize>,
}

/// Acquisition and provenance record carried by every frame.
#[derive(Clone, Debug)]
pub struct FrameMetadata {
    pub kind: FrameKind,
    pub frame_id: u64,
    pub exposure_s: f64,
    /// Electrons per ADU at readout.
    pub gain: f64,
    pub binning: u32,
    pub camera: String,
    pub telescope: String,
    pub filter_name: String,
    pub temperature_c: f64,
    pub target_name: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub quality: QualityMetrics,
    /// Append-only log of reduction steps applied to produce this frame.
    pub calibration_log: Vec<String>,
}

impl FrameMetadata {
    pub fn new(kind: FrameKind, exposure_s: f64) -> Self {
        Self {
            kind,
            frame_id: 0,
            exposure_s,
            gain: 1.0,
            binning: 1,
            camera: "Unknown".to_string(),
            telescope: "Unknown".to_string(),
            filter_name: "L".to_string(),
            temperature_c: 20.0,
            target_name: String::new(),
            ra_deg: 0.0,
            dec_deg: 0.0,
            quality: QualityMetrics::default(),
            calibration_log: Vec::new(),
        }
    }
}

/// A single-channel image with its metadata.
///
/// The grid is fixed at construction: reduction steps build new frames
/// through [`Frame::derive`] instead of mutating this one.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Array2<f32>,
    metadata: FrameMetadata,
    stats: FrameStats,
}

impl Frame {
    pub fn new(data: Array2<f32>, metadata: FrameMetadata) -> Self {
        let stats = FrameStats::compute(&data);
        Self {
            data,
            metadata,
            stats,
        }
    }

    /// Build a new frame from `data` that inherits this frame's metadata
    /// plus one more calibration-log entry.
    pub fn derive(&self, data: Array2<f32>, step: impl Into<String>) -> Frame {
        let mut metadata = self.metadata.clone();
        metadata.calibration_log.push(step.into());
        Frame::new(data, metadata)
    }

    /// Attach measured quality metrics.
    pub fn with_quality(mut self, quality: QualityMetrics) -> Frame {
        self.metadata.quality = quality;
        self
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn into_data(self) -> Array2<f32> {
        self.data
    }

    pub fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn kind(&self) -> FrameKind {
        self.metadata.kind
    }

    pub fn exposure_s(&self) -> f64 {
        self.metadata.exposure_s
    }

    /// (height, width)
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_calibrated(&self) -> bool {
        !self.metadata.calibration_log.is_empty()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame({}, {}x{}, exp={}s, mean={:.1})",
            self.metadata.kind,
            self.width(),
            self.height(),
            self.metadata.exposure_s,
            self.stats.mean
        )
    }
}

/// Aggregate figures over a [`FrameSet`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameSetSummary {
    pub count: usize,
    pub mean_of_means: f32,
    pub std_of_means: f32,
    pub mean_noise: f32,
    pub total_integration_s: f64,
}

/// Ordered frames that all share one [`FrameKind`].
#[derive(Clone, Debug)]
pub struct FrameSet {
    kind: FrameKind,
    frames: Vec<Frame>,
}

impl FrameSet {
    pub fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            frames: Vec::new(),
        }
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn push(&mut self, frame: Frame) -> Result<()> {
        if frame.kind() != self.kind {
            return Err(AstrocamError::FrameKindMismatch {
                expected: self.kind,
                found: frame.kind(),
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Frames grouped by exposure time, keyed in whole microseconds.
    pub fn exposure_groups(&self) -> BTreeMap<u64, Vec<&Frame>> {
        let mut groups: BTreeMap<u64, Vec<&Frame>> = BTreeMap::new();
        for frame in &self.frames {
            let key = (frame.exposure_s() * 1e6).round() as u64;
            groups.entry(key).or_default().push(frame);
        }
        groups
    }

    pub fn filter_groups(&self) -> BTreeMap<String, Vec<&Frame>> {
        let mut groups: BTreeMap<String, Vec<&Frame>> = BTreeMap::new();
        for frame in &self.frames {
            groups
                .entry(frame.metadata().filter_name.clone())
                .or_default()
                .push(frame);
        }
        groups
    }

    pub fn summary(&self) -> FrameSetSummary {
        if self.frames.is_empty() {
            return FrameSetSummary::default();
        }
        let means: Vec<f32> = self.frames.iter().map(|f| f.stats().mean).collect();
        let (mean_of_means, std_of_means) = mean_std(&means);
        let mean_noise =
            self.frames.iter().map(|f| f.stats().std_dev).sum::<f32>() / self.frames.len() as f32;
        FrameSetSummary {
            count: self.frames.len(),
            mean_of_means,
            std_of_means,
            mean_noise,
            total_integration_s: self.frames.iter().map(|f| f.exposure_s()).sum(),
        }
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl<'a> IntoIterator for &'a FrameSet {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Shift of a frame, in pixels, that registers it onto a reference.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AlignmentOffset {
    pub dx: f64,
    pub dy: f64,
}
