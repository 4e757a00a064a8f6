/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;

/// Guard added to master-flat values before dividing a light frame.
pub const FLAT_EPSILON: f32 = 1e-6;

/// Lower clamp of a normalized master flat.
pub const FLAT_MIN: f32 = 0.1;

/// Upper clamp of a normalized master flat.
pub const FLAT_MAX: f32 = 10.0;

/// Two exposures closer than this (seconds) count as equal when matching
/// darks to lights and flats.
pub const EXPOSURE_MATCH_TOLERANCE_S: f64 = 0.01;

/// Scale factor turning a median absolute deviation into a Gaussian sigma.
pub const MAD_TO_SIGMA: f32 = 1.4826;

/// Outlier threshold (in robust sigmas) for cosmetic correction.
pub const COSMETIC_SIGMA_THRESHOLD: f32 = 5.0;

/// FWHM of a Gaussian expressed in sigmas.
pub const FWHM_PER_SIGMA: f64 = 2.355;

/// Arcseconds per radian.
pub const ARCSEC_PER_RADIAN: f64 = 206_265.0;

/// Reference wavelength (mm) for the diffraction limit, V band.
pub const REFERENCE_WAVELENGTH_MM: f64 = 0.000_55;

/// Smallest PSF sigma (render pixels) so stars never collapse to single pixels.
pub const MIN_PSF_SIGMA_PX: f64 = 1.2;

/// Temperature at which a camera's dark-current rate is specified.
pub const DARK_REFERENCE_TEMP_C: f64 = 25.0;

/// Dark current doubles for every this many degrees Celsius.
pub const DARK_DOUBLING_TEMP_C: f64 = 6.3;

/// Mean elevated dark-current rate (e-/s) of a hot pixel.
pub const HOT_PIXEL_MEAN_RATE: f64 = 8.0;

/// Default base seed of a sensor when none is supplied.
pub const DEFAULT_SENSOR_SEED: u64 = 0x4242_4242;

/// Salt mixed into a sensor seed for its hot-pixel map.
pub const HOT_PIXEL_SALT: u64 = 0x0040_7199;

/// Salt mixed into a sensor seed for its dead-pixel map.
pub const DEAD_PIXEL_SALT: u64 = 0x00DE_FEC7;

/// Theoretical fraction of samples kept by sigma-clipping when estimating
/// its SNR gain.
pub const SIGMA_CLIP_RETAINED_FRACTION: f64 = 0.95;

/// Default size (pixels) of the central region used for shift estimation.
pub const DEFAULT_ALIGN_REGION: usize = 256;

/// Shifts smaller than this (pixels) on both axes are not applied.
pub const MIN_APPLIED_SHIFT_PX: f64 = 0.1;

/// Exposure tolerance (seconds) when picking a master dark for a light.
pub const DARK_MATCH_TOLERANCE_S: f64 = 1.0;

/// Salt mixed into a session seed for per-frame pointing dither.
pub const DITHER_SALT: u64 = 0x00D1_7E42;
