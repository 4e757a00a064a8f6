//! Read-only collaborators the renderer consumes: the source catalog, the
//! atmosphere and the Sun/Moon positions.

pub mod atmosphere;
pub mod body;
pub mod catalog;

pub use atmosphere::{airmass, extinction_mag, AtmosphericState, ClearSky};
pub use body::{BodyKind, BodyPosition, OrbitalBody};
pub use catalog::{
    CatalogStar, ClusterKind, DeepSkyObject, NebulaKind, ObjectClass, SourceCatalog,
    StaticCatalog,
};

/// Everything the renderer reads about the sky for one field.
pub struct SkyContext<'a> {
    pub catalog: &'a dyn SourceCatalog,
    pub atmosphere: Option<&'a dyn AtmosphericState>,
    pub bodies: Vec<&'a dyn OrbitalBody>,
}

impl<'a> SkyContext<'a> {
    pub fn new(catalog: &'a dyn SourceCatalog) -> Self {
        Self {
            catalog,
            atmosphere: None,
            bodies: Vec::new(),
        }
    }

    pub fn with_atmosphere(mut self, atmosphere: &'a dyn AtmosphericState) -> Self {
        self.atmosphere = Some(atmosphere);
        self
    }

    pub fn with_body(mut self, body: &'a dyn OrbitalBody) -> Self {
        self.bodies.push(body);
        self
    }
}
