use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AstrocamError, Result};
use crate::frame::{Frame, FrameKind};

/// Owned index of master frames, matched to science frames on demand.
#[derive(Clone, Debug, Default)]
pub struct CalibrationLibrary {
    biases: Vec<Frame>,
    darks: Vec<Frame>,
    flats: BTreeMap<String, Vec<Frame>>,
}

fn expect_kind(frame: &Frame, kind: FrameKind) -> Result<()> {
    if frame.kind() != kind {
        return Err(AstrocamError::FrameKindMismatch {
            expected: kind,
            found: frame.kind(),
        });
    }
    Ok(())
}

impl CalibrationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bias(&mut self, master: Frame) -> Result<()> {
        expect_kind(&master, FrameKind::Bias)?;
        self.biases.push(master);
        Ok(())
    }

    pub fn add_dark(&mut self, master: Frame) -> Result<()> {
        expect_kind(&master, FrameKind::Dark)?;
        self.darks.push(master);
        Ok(())
    }

    /// Register a flat under `filter_name`.
    pub fn add_flat(&mut self, master: Frame, filter_name: impl Into<String>) -> Result<()> {
        expect_kind(&master, FrameKind::Flat)?;
        self.flats.entry(filter_name.into()).or_default().push(master);
        Ok(())
    }

    /// Most recent bias taken at `binning`, else the most recent bias.
    pub fn best_bias(&self, binning: u32) -> Option<&Frame> {
        self.biases
            .iter()
            .rev()
            .find(|b| b.metadata().binning == binning)
            .or_else(|| self.biases.last())
    }

    /// A dark within `tolerance_s` of `exposure_s`. With a temperature, the
    /// candidate closest to it wins; otherwise the earliest registered.
    pub fn best_dark(
        &self,
        exposure_s: f64,
        temperature_c: Option<f64>,
        tolerance_s: f64,
    ) -> Option<&Frame> {
        let candidates = self
            .darks
            .iter()
            .filter(|d| (d.exposure_s() - exposure_s).abs() < tolerance_s);

        match temperature_c {
            Some(t) => candidates.min_by(|a, b| {
                let da = (a.metadata().temperature_c - t).abs();
                let db = (b.metadata().temperature_c - t).abs();
                da.total_cmp(&db)
            }),
            None => candidates.into_iter().next(),
        }
    }

    /// Most recent flat registered for `filter_name`.
    pub fn best_flat(&self, filter_name: &str) -> Option<&Frame> {
        self.flats.get(filter_name).and_then(|v| v.last())
    }

    pub fn bias_count(&self) -> usize {
        self.biases.len()
    }

    pub fn dark_count(&self) -> usize {
        self.darks.len()
    }

    pub fn flat_count(&self) -> usize {
        self.flats.values().map(Vec::len).sum()
    }

    pub fn filters(&self) -> impl Iterator<Item = &str> {
        self.flats.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.biases.clear();
        self.darks.clear();
        self.flats.clear();
    }
}

impl fmt::Display for CalibrationLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationLibrary(biases={}, darks={}, flats={})",
            self.bias_count(),
            self.dark_count(),
            self.flat_count()
        )
    }
}
