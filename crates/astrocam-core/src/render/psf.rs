use ndarray::Array2;

/// Normalized Gaussian kernel of shape `(2*half+1, 2*half+1)`.
pub fn gaussian_kernel(half: usize, sigma: f64) -> Array2<f32> {
    let size = 2 * half + 1;
    let c = half as f64;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel = Array2::from_shape_fn((size, size), |(r, col)| {
        let dy = r as f64 - c;
        let dx = col as f64 - c;
        (-(dx * dx + dy * dy) / two_sigma_sq).exp() as f32
    });
    let sum: f32 = kernel.sum();
    if sum > 0.0 {
        kernel /= sum;
    }
    kernel
}

/// Magnitude tiers: (upper magnitude bound, sigma multiplier, kernel half-size).
///
/// Bright stars spread over a wider footprint so their cores do not collapse
/// into single saturated pixels.
const PSF_TIERS: [(f64, f64, usize); 7] = [
    (0.0, 4.0, 14),
    (2.0, 2.8, 10),
    (4.0, 1.9, 8),
    (6.0, 1.3, 6),
    (8.0, 1.0, 4),
    (10.0, 0.9, 3),
    (f64::INFINITY, 0.8, 2),
];

#[derive(Clone, Debug)]
pub struct PsfKernel {
    pub sigma: f64,
    pub half: usize,
    pub kernel: Array2<f32>,
}

/// Precomputed kernels for every magnitude tier at one base sigma.
#[derive(Clone, Debug)]
pub struct PsfBank {
    base_sigma: f64,
    kernels: Vec<PsfKernel>,
}

impl PsfBank {
    pub fn new(base_sigma: f64) -> Self {
        let kernels = PSF_TIERS
            .iter()
            .map(|&(_, mult, half)| {
                let sigma = base_sigma * mult;
                PsfKernel {
                    sigma,
                    half,
                    kernel: gaussian_kernel(half, sigma),
                }
            })
            .collect();
        Self {
            base_sigma,
            kernels,
        }
    }

    pub fn base_sigma(&self) -> f64 {
        self.base_sigma
    }

    pub fn for_magnitude(&self, mag: f64) -> &PsfKernel {
        let idx = PSF_TIERS
            .iter()
            .position(|&(bound, _, _)| mag < bound)
            .unwrap_or(PSF_TIERS.len() - 1);
        &self.kernels[idx]
    }
}

/// Add `kernel * amount` centred on the pixel nearest `(px, py)`, clipped
/// to the field.
pub fn splat(field: &mut Array2<f32>, kernel: &Array2<f32>, px: f64, py: f64, amount: f64) {
    let (h, w) = field.dim();
    let (kh, kw) = kernel.dim();
    let half_y = (kh / 2) as i64;
    let half_x = (kw / 2) as i64;
    let ix = px.round() as i64;
    let iy = py.round() as i64;
    let amount = amount as f32;

    let y0 = (iy - half_y).max(0);
    let y1 = (iy + half_y + 1).min(h as i64);
    let x0 = (ix - half_x).max(0);
    let x1 = (ix + half_x + 1).min(w as i64);
    if y0 >= y1 || x0 >= x1 {
        return;
    }

    for y in y0..y1 {
        let ky = (y - iy + half_y) as usize;
        for x in x0..x1 {
            let kx = (x - ix + half_x) as usize;
            field[[y as usize, x as usize]] += kernel[[ky, kx]] * amount;
        }
    }
}
