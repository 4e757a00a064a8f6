use rand::Rng;
use tracing::info;

use super::config::SessionConfig;
use super::types::{ProgressReporter, SessionOutput, SessionReport, SessionStage};
use crate::align::{apply_shifts, estimate_shifts};
use crate::calibrate::{
    batch_calibrate_lights, master_bias, master_dark, master_flat, CalibrationLibrary,
};
use crate::consts::{DARK_MATCH_TOLERANCE_S, DITHER_SALT};
use crate::error::{AstrocamError, Result};
use crate::frame::{AlignmentOffset, Frame, FrameKind, FrameSet};
use crate::quality::{assess_frame, assess_quality, frame_snr};
use crate::render::{FluxFieldRenderer, Pointing};
use crate::seed::{hash_many, rng_from_seed};
use crate::sensor::{AcquisitionLabels, SensorModel};
use crate::sky::SkyContext;
use crate::stack::{compute_snr_improvement, estimate_final_snr, stack_frames};

/// One night at the telescope: acquisition, calibration and stacking of a
/// single target with a single camera.
pub struct ImagingSession {
    config: SessionConfig,
    renderer: FluxFieldRenderer,
    sensor: SensorModel,
    lights: FrameSet,
    darks: FrameSet,
    flats: FrameSet,
    biases: FrameSet,
    library: CalibrationLibrary,
}

impl ImagingSession {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let spec = config.camera_spec()?;
        let optics = config.optics_for(&spec);
        let telescope = format!(
            "{:.0}mm f/{:.1}",
            optics.aperture_mm,
            optics.focal_ratio()
        );
        let renderer = FluxFieldRenderer::new(optics, config.flux.clone())?
            .with_saturation(spec.saturation_model());

        let mut sensor = SensorModel::new(spec, Some(config.seed));
        if let Some(target) = config.cooling_target_c {
            sensor.set_cooling(true, Some(target))?;
        }
        sensor.set_labels(AcquisitionLabels {
            telescope,
            filter_name: "L".to_string(),
            target_name: config.target_name.clone(),
            ra_deg: config.pointing.ra_deg,
            dec_deg: config.pointing.dec_deg,
        });

        Ok(Self {
            config,
            renderer,
            sensor,
            lights: FrameSet::new(FrameKind::Light),
            darks: FrameSet::new(FrameKind::Dark),
            flats: FrameSet::new(FrameKind::Flat),
            biases: FrameSet::new(FrameKind::Bias),
            library: CalibrationLibrary::new(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn renderer(&self) -> &FluxFieldRenderer {
        &self.renderer
    }

    pub fn sensor(&self) -> &SensorModel {
        &self.sensor
    }

    pub fn lights(&self) -> &FrameSet {
        &self.lights
    }

    pub fn darks(&self) -> &FrameSet {
        &self.darks
    }

    pub fn flats(&self) -> &FrameSet {
        &self.flats
    }

    pub fn biases(&self) -> &FrameSet {
        &self.biases
    }

    pub fn library(&self) -> &CalibrationLibrary {
        &self.library
    }

    /// Capture bias, dark and flat frames on the render grid.
    pub fn acquire_calibration_frames(&mut self, reporter: &dyn ProgressReporter) -> Result<()> {
        let shape = self.renderer.shape();
        let counts = self.config.frames;

        reporter.begin_stage(SessionStage::Bias, Some(counts.biases));
        for i in 0..counts.biases {
            let frame = self.sensor.capture_bias(shape, None);
            self.biases.push(frame)?;
            reporter.advance(i + 1);
        }
        reporter.finish_stage();

        reporter.begin_stage(SessionStage::Darks, Some(counts.darks));
        for i in 0..counts.darks {
            let frame = self
                .sensor
                .capture_dark(self.config.light_exposure_s, shape, None);
            self.darks.push(frame)?;
            reporter.advance(i + 1);
        }
        reporter.finish_stage();

        reporter.begin_stage(SessionStage::Flats, Some(counts.flats));
        let illumination = self
            .renderer
            .render_flat_illumination(self.config.flat_level);
        for i in 0..counts.flats {
            let frame = self.sensor.capture(
                self.config.flat_exposure_s,
                &illumination,
                FrameKind::Flat,
                None,
            );
            self.flats.push(frame)?;
            reporter.advance(i + 1);
        }
        reporter.finish_stage();

        info!(
            biases = counts.biases,
            darks = counts.darks,
            flats = counts.flats,
            "Acquired calibration frames"
        );
        Ok(())
    }

    /// Render and capture every light frame, drifting the pointing by up to
    /// `dither_px` render pixels between exposures.
    pub fn acquire_lights(
        &mut self,
        sky: &SkyContext<'_>,
        reporter: &dyn ProgressReporter,
    ) -> Result<()> {
        let n = self.config.frames.lights;
        let exposure = self.config.light_exposure_s;
        reporter.begin_stage(SessionStage::Lights, Some(n));
        for i in 0..n {
            let pointing = self.dithered_pointing(i);
            let photons = self
                .renderer
                .render_field(&pointing, exposure, self.config.mag_limit, sky);
            let frame = self.sensor.capture(exposure, &photons, FrameKind::Light, None);
            self.lights.push(frame)?;
            reporter.advance(i + 1);
        }
        reporter.finish_stage();
        info!(count = n, exposure_s = exposure, "Acquired light frames");
        Ok(())
    }

    fn dithered_pointing(&self, index: usize) -> Pointing {
        let base = self.config.pointing;
        if index == 0 || self.config.dither_px <= 0.0 {
            return base;
        }
        let mut rng = rng_from_seed(hash_many(&[self.config.seed, DITHER_SALT, index as u64]));
        let step_deg = self.config.dither_px * self.renderer.optics().pixel_scale_arcsec() / 3600.0;
        let d_ra = rng.gen_range(-1.0f64..=1.0) * step_deg;
        let d_dec = rng.gen_range(-1.0f64..=1.0) * step_deg;
        let cos_dec = base.dec_deg.to_radians().cos().max(0.01);
        Pointing {
            ra_deg: (base.ra_deg + d_ra / cos_dec).rem_euclid(360.0),
            dec_deg: (base.dec_deg + d_dec).clamp(-90.0, 90.0),
            ..base
        }
    }

    /// Median-combine the calibration frames into masters and file them in
    /// the library. Kinds with no frames are skipped.
    pub fn build_masters(&mut self, reporter: &dyn ProgressReporter) -> Result<()> {
        reporter.begin_stage(SessionStage::Masters, Some(3));
        let bias = master_bias(self.biases.frames())?;
        reporter.advance(1);
        let dark = master_dark(self.darks.frames(), bias.as_ref())?;
        reporter.advance(2);
        let flat = master_flat(self.flats.frames(), dark.as_ref(), bias.as_ref())?;
        reporter.advance(3);

        if let Some(bias) = bias {
            self.library.add_bias(bias)?;
        }
        if let Some(dark) = dark {
            self.library.add_dark(dark)?;
        }
        if let Some(flat) = flat {
            let filter = flat.metadata().filter_name.clone();
            self.library.add_flat(flat, filter)?;
        }
        reporter.finish_stage();
        info!(library = %self.library, "Master frames ready");
        Ok(())
    }

    /// Calibrate, assess, align and stack the acquired lights.
    pub fn reduce(&self, reporter: &dyn ProgressReporter) -> Result<SessionOutput> {
        let first = self
            .lights
            .frames()
            .first()
            .ok_or(AstrocamError::EmptySequence)?;
        let meta = first.metadata();
        let bias = self.library.best_bias(meta.binning);
        let dark = self.library.best_dark(
            first.exposure_s(),
            Some(meta.temperature_c),
            DARK_MATCH_TOLERANCE_S,
        );
        let flat = self.library.best_flat(&meta.filter_name);

        let n = self.lights.len();
        reporter.begin_stage(SessionStage::Calibration, Some(n));
        let calibrated = batch_calibrate_lights(
            self.lights.frames(),
            dark,
            flat,
            bias,
            self.config.cosmetic_correction,
        )?;
        reporter.finish_stage();

        reporter.begin_stage(SessionStage::Assessment, Some(n));
        let assessed: Vec<Frame> = calibrated
            .into_iter()
            .enumerate()
            .map(|(i, f)| {
                let f = assess_frame(f, &self.config.quality);
                reporter.advance(i + 1);
                f
            })
            .collect();
        reporter.finish_stage();

        let stacking = &self.config.stacking;
        let (registered, shifts) = if stacking.align && assessed.len() > 1 {
            reporter.begin_stage(SessionStage::Alignment, Some(n));
            let shifts = estimate_shifts(&assessed, stacking.reference_index, stacking.region_size)?;
            let aligned = apply_shifts(&assessed, &shifts, stacking.subpixel)?;
            reporter.finish_stage();
            (aligned, shifts)
        } else {
            (assessed, vec![AlignmentOffset::default(); n])
        };

        reporter.begin_stage(SessionStage::Stacking, None);
        let stacked = stack_frames(&registered, &stacking.method)?;
        let stacked_quality = assess_quality(stacked.data(), &self.config.quality);
        let stacked = stacked.with_quality(stacked_quality);
        reporter.finish_stage();

        let recorded: Vec<f64> = registered
            .iter()
            .filter_map(|f| f.metadata().quality.snr)
            .collect();
        let single_frame_snr = if recorded.is_empty() {
            0.0
        } else {
            recorded.iter().sum::<f64>() / recorded.len() as f64
        };

        let report = SessionReport {
            camera: self.sensor.spec().name().to_string(),
            light_count: n,
            dark_count: self.darks.len(),
            flat_count: self.flats.len(),
            bias_count: self.biases.len(),
            method: stacking.method,
            total_integration_s: self.lights.summary().total_integration_s,
            shifts,
            single_frame_snr,
            stacked_snr: frame_snr(stacked.data()).unwrap_or(0.0),
            theoretical_improvement: compute_snr_improvement(n, &stacking.method),
            estimated_final_snr: estimate_final_snr(&registered, &stacking.method),
            stacked_quality,
        };
        info!(
            frames = n,
            method = %stacking.method,
            single_snr = report.single_frame_snr,
            stacked_snr = report.stacked_snr,
            "Session complete"
        );
        Ok(SessionOutput { stacked, report })
    }
}

/// Run a whole session against `sky`: calibration frames, lights, masters,
/// then reduction.
pub fn run_session(
    config: SessionConfig,
    sky: &SkyContext<'_>,
    reporter: &dyn ProgressReporter,
) -> Result<SessionOutput> {
    let mut session = ImagingSession::new(config)?;
    session.acquire_calibration_frames(reporter)?;
    session.acquire_lights(sky, reporter)?;
    session.build_masters(reporter)?;
    session.reduce(reporter)
}
