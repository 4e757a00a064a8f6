pub mod config;
pub mod render;
pub mod simulate;
pub mod snr;

use std::path::Path;

use anyhow::{Context, Result};
use astrocam_core::pipeline::SessionConfig;
use astrocam_core::seed::hash_u64;
use astrocam_core::sky::StaticCatalog;
use clap::ValueEnum;
use tracing::{debug, info};

/// Salt separating the synthetic star field from the session's other seeds.
const CATALOG_SALT: u64 = 0xCA7A_1000;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StackMethodArg {
    Mean,
    Median,
    SigmaClip,
}

pub fn load_session_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        debug!("No config file given, using defaults");
        return Ok(SessionConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = toml::from_str(&contents)
        .with_context(|| format!("Invalid session config {}", path.display()))?;
    info!(path = %path.display(), "Loaded session config");
    Ok(config)
}

/// The catalog at `path`, or a synthetic field filling the configured view.
pub fn load_catalog(
    path: Option<&Path>,
    config: &SessionConfig,
    synthetic_stars: usize,
) -> Result<StaticCatalog> {
    if let Some(path) = path {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let catalog: StaticCatalog = toml::from_str(&contents)
            .with_context(|| format!("Invalid catalog {}", path.display()))?;
        info!(
            path = %path.display(),
            stars = catalog.stars.len(),
            deep_sky = catalog.deep_sky.len(),
            "Loaded catalog"
        );
        return Ok(catalog);
    }

    let spec = config.camera_spec()?;
    let (fov_w, fov_h) = config.optics_for(&spec).fov_deg();
    let radius = 0.5 * (fov_w * fov_w + fov_h * fov_h).sqrt();
    info!(stars = synthetic_stars, radius_deg = radius, "Generating synthetic star field");
    Ok(StaticCatalog::synthetic(
        config.pointing.ra_deg,
        config.pointing.dec_deg,
        radius,
        synthetic_stars,
        (4.0, config.mag_limit),
        hash_u64(config.seed, CATALOG_SALT),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_config_defaults_without_file() {
        assert_eq!(load_session_config(None).unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_session_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "seed = 77\n\n[frames]\nlights = 5\n").unwrap();

        let config = load_session_config(Some(path.as_path())).unwrap();
        assert_eq!(config.seed, 77);
        assert_eq!(config.frames.lights, 5);

        std::fs::write(&path, "seed = \"not a number\"\n").unwrap();
        let err = load_session_config(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().starts_with("Invalid session config"));
        assert!(load_session_config(Some(dir.path().join("missing.toml").as_path())).is_err());
    }

    #[test]
    fn test_catalog_from_file_or_synthetic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, "[[stars]]\nra_deg = 10.0\ndec_deg = 20.0\nmag = 6.0\n").unwrap();

        let config = SessionConfig::default();
        let loaded = load_catalog(Some(path.as_path()), &config, 50).unwrap();
        assert_eq!(loaded.stars.len(), 1);
        assert!(loaded.deep_sky.is_empty());

        let synthetic = load_catalog(None, &config, 50).unwrap();
        assert_eq!(synthetic.stars.len(), 50);
        assert_eq!(synthetic, load_catalog(None, &config, 50).unwrap());
    }
}
