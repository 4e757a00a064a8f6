use std::path::PathBuf;

use anyhow::Result;
use astrocam_core::pipeline::{run_session, ProgressReporter, SessionConfig, SessionStage};
use astrocam_core::sky::{BodyPosition, SkyContext};
use astrocam_core::stack::{SigmaClipParams, StackMethod};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::{load_catalog, load_session_config, StackMethodArg};
use crate::export::save_mono;
use crate::summary::{print_session_report, print_session_summary};

#[derive(Args)]
pub struct SimulateArgs {
    /// Session config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Star catalog (TOML); a synthetic field is used when absent
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Number of stars in the synthetic field
    #[arg(long, default_value = "400")]
    pub stars: usize,

    /// Camera preset (webcam-mod, zwo-asi294mc, qhy600m, allsky-zwo174mm, allsky-qhy462c)
    #[arg(long)]
    pub preset: Option<String>,

    /// Number of light frames
    #[arg(long)]
    pub lights: Option<usize>,

    /// Light exposure in seconds
    #[arg(short, long)]
    pub exposure: Option<f64>,

    /// Stacking method
    #[arg(long, value_enum)]
    pub method: Option<StackMethodArg>,

    /// Symmetric sigma threshold for sigma-clip stacking
    #[arg(long, default_value = "3.0")]
    pub sigma: f32,

    /// Stack without aligning
    #[arg(long)]
    pub no_align: bool,

    /// Resample with subpixel shifts instead of whole-pixel rolls
    #[arg(long)]
    pub subpixel: bool,

    /// Base seed for every random draw
    #[arg(long)]
    pub seed: Option<u64>,

    /// Put the Moon at this altitude (degrees)
    #[arg(long)]
    pub moon_alt: Option<f64>,

    /// Moon azimuth (degrees)
    #[arg(long, default_value = "180.0")]
    pub moon_az: f64,

    /// Moon phase angle (0 = full, 180 = new)
    #[arg(long, default_value = "60.0")]
    pub moon_phase: f64,

    /// Output file path (.tiff for 16-bit, .png for 8-bit)
    #[arg(short, long, default_value = "stacked.tiff")]
    pub output: PathBuf,
}

/// Drives one progress bar through the session's stages.
struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {msg:28} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
        );
        Ok(Self { bar })
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: SessionStage, total_items: Option<usize>) {
        self.bar.reset();
        self.bar.set_length(total_items.unwrap_or(1) as u64);
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        self.bar.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
    }
}

fn apply_overrides(config: &mut SessionConfig, args: &SimulateArgs) {
    if let Some(ref preset) = args.preset {
        config.camera_preset = Some(preset.clone());
    }
    if let Some(lights) = args.lights {
        config.frames.lights = lights;
    }
    if let Some(exposure) = args.exposure {
        config.light_exposure_s = exposure;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(method) = args.method {
        config.stacking.method = match method {
            StackMethodArg::Mean => StackMethod::Mean,
            StackMethodArg::Median => StackMethod::Median,
            StackMethodArg::SigmaClip => StackMethod::SigmaClip(SigmaClipParams {
                sigma_low: args.sigma,
                sigma_high: args.sigma,
                ..Default::default()
            }),
        };
    }
    if args.no_align {
        config.stacking.align = false;
    }
    if args.subpixel {
        config.stacking.subpixel = true;
    }
}

pub fn run(args: &SimulateArgs) -> Result<()> {
    let mut config = load_session_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    config.validate()?;

    let catalog = load_catalog(args.catalog.as_deref(), &config, args.stars)?;
    let spec = config.camera_spec()?;
    print_session_summary(&config, &spec, &args.output);

    let moon = args
        .moon_alt
        .map(|alt| BodyPosition::moon(alt, args.moon_az, args.moon_phase));
    let atmosphere = config.atmosphere.clone();
    let mut sky = SkyContext::new(&catalog).with_atmosphere(&atmosphere);
    if let Some(ref moon) = moon {
        sky = sky.with_body(moon);
    }

    let reporter = BarReporter::new()?;
    let output = run_session(config, &sky, &reporter)?;
    reporter.bar.finish_with_message("Done");

    save_mono(output.stacked.data(), &args.output)?;
    info!(path = %args.output.display(), "Saved stacked image");
    print_session_report(&output.report, &args.output);
    Ok(())
}
