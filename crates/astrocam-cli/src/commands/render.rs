use std::path::PathBuf;

use anyhow::Result;
use astrocam_core::render::FluxFieldRenderer;
use astrocam_core::sky::SkyContext;
use clap::Args;

use super::{load_catalog, load_session_config};
use crate::export::{save_mono, save_rgb};

#[derive(Args)]
pub struct RenderArgs {
    /// Session config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Star catalog (TOML); a synthetic field is used when absent
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Exposure time in seconds (defaults to the config's light exposure)
    #[arg(short, long)]
    pub exposure: Option<f64>,

    /// Number of stars in the synthetic field
    #[arg(long, default_value = "400")]
    pub stars: usize,

    /// Render three colour channels instead of one
    #[arg(long)]
    pub rgb: bool,

    /// Skip the reference atmosphere (fallback sky, optics seeing)
    #[arg(long)]
    pub no_atmosphere: bool,

    /// Output file path
    #[arg(short, long, default_value = "field.png")]
    pub output: PathBuf,
}

/// Render one noiseless photon field and save it.
pub fn run(args: &RenderArgs) -> Result<()> {
    let config = load_session_config(args.config.as_deref())?;
    config.validate()?;
    let catalog = load_catalog(args.catalog.as_deref(), &config, args.stars)?;
    let spec = config.camera_spec()?;
    let renderer = FluxFieldRenderer::new(config.optics_for(&spec), config.flux.clone())?
        .with_saturation(spec.saturation_model());

    let mut sky = SkyContext::new(&catalog);
    if !args.no_atmosphere {
        sky = sky.with_atmosphere(&config.atmosphere);
    }
    let exposure = args.exposure.unwrap_or(config.light_exposure_s);

    if args.rgb {
        let field = renderer.render_rgb(&config.pointing, exposure, config.mag_limit, &sky);
        save_rgb(&field, &args.output)?;
    } else {
        let field = renderer.render_field(&config.pointing, exposure, config.mag_limit, &sky);
        save_mono(&field, &args.output)?;
    }

    let (h, w) = renderer.shape();
    println!(
        "Rendered {}x{} field ({} stars in catalog, {:.1}s) to {}",
        w,
        h,
        catalog.stars.len(),
        exposure,
        args.output.display()
    );
    Ok(())
}
