use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::seed::rng_from_seed;

/// A point source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogStar {
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub mag: f64,
    /// B-V colour index.
    #[serde(default = "default_bv")]
    pub bv_color: f64,
}

fn default_bv() -> f64 {
    0.6
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NebulaKind {
    Emission,
    Planetary,
    SupernovaRemnant,
    Reflection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterKind {
    Open,
    Globular,
}

/// Morphological class of an extended object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObjectClass {
    Galaxy,
    Nebula(NebulaKind),
    Cluster(ClusterKind),
}

/// An extended (deep-sky) object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeepSkyObject {
    pub name: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub mag: f64,
    pub size_arcmin: f64,
    pub class: ObjectClass,
    #[serde(default = "default_bv")]
    pub bv_color: f64,
}

/// Source of stars and extended objects for a rendered field.
pub trait SourceCatalog {
    fn stars(&self) -> &[CatalogStar];
    fn deep_sky_objects(&self) -> &[DeepSkyObject];
}

/// An in-memory catalog, e.g. loaded from TOML.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    pub stars: Vec<CatalogStar>,
    #[serde(default)]
    pub deep_sky: Vec<DeepSkyObject>,
}

impl StaticCatalog {
    pub fn new(stars: Vec<CatalogStar>, deep_sky: Vec<DeepSkyObject>) -> Self {
        Self { stars, deep_sky }
    }

    /// Seeded synthetic star field scattered around a centre.
    ///
    /// Magnitudes follow the usual steep number-count law: each magnitude
    /// step holds roughly three times as many stars as the one before, so
    /// most of the field is faint.
    pub fn synthetic(
        center_ra_deg: f64,
        center_dec_deg: f64,
        radius_deg: f64,
        count: usize,
        mag_range: (f64, f64),
        seed: u64,
    ) -> Self {
        let mut rng = rng_from_seed(seed);
        let (bright, faint) = mag_range;
        let cos_dec = center_dec_deg.to_radians().cos().max(0.01);
        let growth = 3.0f64.ln();
        let span = (growth * (faint - bright)).exp() - 1.0;

        let stars = (0..count)
            .map(|_| {
                let r = radius_deg * rng.gen::<f64>().sqrt();
                let theta = rng.gen::<f64>() * std::f64::consts::TAU;
                let u: f64 = rng.gen();
                let mag = bright + (1.0 + u * span).ln() / growth;
                let bv: f64 = rng.sample(StandardNormal);
                CatalogStar {
                    ra_deg: (center_ra_deg + r * theta.cos() / cos_dec).rem_euclid(360.0),
                    dec_deg: (center_dec_deg + r * theta.sin()).clamp(-90.0, 90.0),
                    mag,
                    bv_color: (0.65 + 0.45 * bv).clamp(-0.4, 2.0),
                }
            })
            .collect();

        Self {
            stars,
            deep_sky: Vec::new(),
        }
    }
}

impl SourceCatalog for StaticCatalog {
    fn stars(&self) -> &[CatalogStar] {
        &self.stars
    }

    fn deep_sky_objects(&self) -> &[DeepSkyObject] {
        &self.deep_sky
    }
}
