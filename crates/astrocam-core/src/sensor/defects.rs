//! Persistent per-sensor defect maps.
//!
//! Maps are drawn once at the sensor's physical resolution from a hash of
//! its seed, stored sparsely, and projected onto whatever output grid a
//! capture uses.

use ndarray::Array2;
use rand::Rng;
use rand_distr::Exp1;

use crate::consts::{DEAD_PIXEL_SALT, HOT_PIXEL_MEAN_RATE, HOT_PIXEL_SALT};
use crate::seed::{hash_u64, rng_from_seed};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HotPixel {
    pub x: usize,
    pub y: usize,
    /// Extra dark current, electrons per second.
    pub rate_e_per_s: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DefectMaps {
    width: usize,
    height: usize,
    hot: Vec<HotPixel>,
    /// Dead physical pixels as (x, y), sorted and unique.
    dead: Vec<(usize, usize)>,
}

impl DefectMaps {
    pub fn generate(
        width: usize,
        height: usize,
        hot_fraction: f64,
        defect_fraction: f64,
        sensor_seed: u64,
    ) -> Self {
        let area = (width * height) as f64;

        let n_hot = (area * hot_fraction) as usize;
        let mut rng = rng_from_seed(hash_u64(sensor_seed, HOT_PIXEL_SALT));
        let hot = (0..n_hot)
            .map(|_| {
                let x = rng.gen_range(0..width);
                let y = rng.gen_range(0..height);
                let e: f64 = rng.sample(Exp1);
                HotPixel {
                    x,
                    y,
                    rate_e_per_s: e * HOT_PIXEL_MEAN_RATE,
                }
            })
            .collect();

        let n_dead = (area * defect_fraction) as usize;
        let mut rng = rng_from_seed(hash_u64(sensor_seed, DEAD_PIXEL_SALT));
        let mut dead: Vec<(usize, usize)> = (0..n_dead)
            .map(|_| (rng.gen_range(0..width), rng.gen_range(0..height)))
            .collect();
        dead.sort_unstable();
        dead.dedup();

        Self {
            width,
            height,
            hot,
            dead,
        }
    }

    pub fn hot_pixels(&self) -> &[HotPixel] {
        &self.hot
    }

    pub fn dead_pixels(&self) -> &[(usize, usize)] {
        &self.dead
    }

    fn to_output(&self, x: usize, y: usize, shape: (usize, usize)) -> (usize, usize) {
        let (h, w) = shape;
        let ox = (x * w / self.width).min(w.saturating_sub(1));
        let oy = (y * h / self.height).min(h.saturating_sub(1));
        (oy, ox)
    }

    /// Hot-pixel electrons accumulated over `exposure_s` on an output grid.
    /// Several hot pixels binned into one output pixel add up; the total
    /// is never scaled by the binning factor.
    pub fn hot_electrons(&self, shape: (usize, usize), exposure_s: f64) -> Array2<f32> {
        let mut grid = Array2::<f32>::zeros(shape);
        if shape.0 == 0 || shape.1 == 0 {
            return grid;
        }
        for hp in &self.hot {
            let idx = self.to_output(hp.x, hp.y, shape);
            grid[idx] += (hp.rate_e_per_s * exposure_s) as f32;
        }
        grid
    }

    /// Fraction of each output pixel's optical response that survives the
    /// dead physical pixels it bins.
    pub fn optical_response(&self, shape: (usize, usize)) -> Array2<f32> {
        let mut grid = Array2::<f32>::ones(shape);
        let (h, w) = shape;
        if h == 0 || w == 0 || self.dead.is_empty() {
            return grid;
        }
        let bin_area = (self.width as f64 / w as f64) * (self.height as f64 / h as f64);
        let per_dead = (1.0 / bin_area.max(1.0)) as f32;
        for &(x, y) in &self.dead {
            let idx = self.to_output(x, y, shape);
            grid[idx] = (grid[idx] - per_dead).max(0.0);
        }
        grid
    }
}
