/// Gnomonic (tangent-plane) projection of `(lon, lat)` about
/// `(lon0, lat0)`, all in degrees.
///
/// Returns standard coordinates `(x, y)` in radians, or `None` when the
/// point lies on or behind the tangent plane.
pub fn gnomonic(lon_deg: f64, lat_deg: f64, lon0_deg: f64, lat0_deg: f64) -> Option<(f64, f64)> {
    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();
    let lon0 = lon0_deg.to_radians();
    let lat0 = lat0_deg.to_radians();
    let dlon = lon - lon0;

    let cos_c = lat0.sin() * lat.sin() + lat0.cos() * lat.cos() * dlon.cos();
    if cos_c <= 0.0 {
        return None;
    }
    let x = lat.cos() * dlon.sin() / cos_c;
    let y = (lat0.cos() * lat.sin() - lat0.sin() * lat.cos() * dlon.cos()) / cos_c;
    Some((x, y))
}

/// Maps sky coordinates onto render-buffer pixels for one pointing.
#[derive(Clone, Copy, Debug)]
pub struct TangentPlane {
    pub center_lon_deg: f64,
    pub center_lat_deg: f64,
    pub pixels_per_radian: f64,
    pub width: usize,
    pub height: usize,
    /// East-left orientation for the celestial sphere (RA grows to the
    /// left); horizontal coordinates grow to the right.
    pub mirror_x: bool,
}

impl TangentPlane {
    pub fn equatorial(
        ra_deg: f64,
        dec_deg: f64,
        pixels_per_radian: f64,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            center_lon_deg: ra_deg,
            center_lat_deg: dec_deg,
            pixels_per_radian,
            width,
            height,
            mirror_x: true,
        }
    }

    pub fn horizontal(
        az_deg: f64,
        alt_deg: f64,
        pixels_per_radian: f64,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            center_lon_deg: az_deg,
            center_lat_deg: alt_deg,
            pixels_per_radian,
            width,
            height,
            mirror_x: false,
        }
    }

    /// Pixel position `(px, py)` of a point, or `None` behind the plane.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let (x, y) = gnomonic(lon_deg, lat_deg, self.center_lon_deg, self.center_lat_deg)?;
        let sx = if self.mirror_x { -x } else { x };
        let px = self.width as f64 / 2.0 + sx * self.pixels_per_radian;
        let py = self.height as f64 / 2.0 - y * self.pixels_per_radian;
        Some((px, py))
    }

    pub fn within(&self, px: f64, py: f64, margin: f64) -> bool {
        px >= -margin
            && px <= self.width as f64 + margin
            && py >= -margin
            && py <= self.height as f64 + margin
    }
}

/// Coarse RA/Dec box used to reject catalog entries before projecting.
#[derive(Clone, Copy, Debug)]
pub struct FieldBox {
    center_ra: f64,
    center_dec: f64,
    ra_margin: f64,
    dec_margin: f64,
}

impl FieldBox {
    /// Box of half-widths `ra_margin_deg` x `dec_margin_deg`; the RA margin
    /// is widened by `1/cos(dec)` toward the poles.
    pub fn new(center_ra: f64, center_dec: f64, ra_margin_deg: f64, dec_margin_deg: f64) -> Self {
        let cos_dec = center_dec.to_radians().cos().max(0.01);
        Self {
            center_ra,
            center_dec,
            ra_margin: ra_margin_deg / cos_dec,
            dec_margin: dec_margin_deg,
        }
    }

    pub fn contains(&self, ra_deg: f64, dec_deg: f64) -> bool {
        if (dec_deg - self.center_dec).abs() > self.dec_margin {
            return false;
        }
        let mut dra = (ra_deg - self.center_ra).abs() % 360.0;
        if dra > 180.0 {
            dra = 360.0 - dra;
        }
        dra <= self.ra_margin
    }
}
