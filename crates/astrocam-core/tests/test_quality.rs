#[allow(dead_code)]
mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::{array, Array2};
use rand::Rng;
use rand_distr::StandardNormal;

use astrocam_core::frame::FrameKind;
use astrocam_core::quality::{
    assess_frame, assess_quality, detect_stars, estimate_background, frame_snr, median_fwhm,
    star_fwhm, StarDetectionParams,
};
use astrocam_core::seed::rng_from_seed;

use common::{frame_of, sample_stars, star_field};

const SIGMA: f64 = 2.0;

fn noisy_field(noise: f32) -> Array2<f32> {
    let mut rng = rng_from_seed(2024);
    let mut data = star_field((96, 96), &sample_stars(), SIGMA, 50.0);
    data.mapv_inplace(|v| {
        let n: f32 = rng.sample(StandardNormal);
        v + noise * n
    });
    data
}

#[test]
fn test_detects_brightest_first() {
    let data = star_field((96, 96), &sample_stars(), SIGMA, 50.0);
    let stars = detect_stars(&data, 100.0, 200);
    assert_eq!(stars.len(), 5);
    assert_eq!((stars[0].row, stars[0].col), (30, 30));
    assert!(stars.windows(2).all(|w| w[0].peak >= w[1].peak));

    let top = detect_stars(&data, 100.0, 3);
    assert_eq!(
        top.iter().map(|s| s.peak.round() as i32).collect::<Vec<_>>(),
        vec![950, 800, 650]
    );
}

#[test]
fn test_plateau_counts_once() {
    let mut data = Array2::from_elem((10, 10), 1.0f32);
    data[[4, 4]] = 9.0;
    data[[4, 5]] = 9.0;
    data[[5, 4]] = 9.0;
    let stars = detect_stars(&data, 5.0, 10);
    assert_eq!(stars.len(), 1);
    assert_eq!((stars[0].row, stars[0].col), (4, 4));
}

#[test]
fn test_nothing_above_threshold() {
    let data = Array2::from_elem((16, 16), 3.0f32);
    assert!(detect_stars(&data, 3.0, 10).is_empty());
}

#[test]
fn test_fwhm_of_gaussian_star() {
    let data = star_field((96, 96), &sample_stars(), SIGMA, 50.0);
    let stars = detect_stars(&data, 100.0, 200);
    let expected = 2.355 * SIGMA;
    for star in &stars {
        let fwhm = star_fwhm(&data, star, 50.0).unwrap();
        assert_relative_eq!(fwhm, expected, max_relative = 0.15);
    }
    let median = median_fwhm(&data, &stars, 50.0).unwrap();
    assert_relative_eq!(median, expected, max_relative = 0.1);
}

#[test]
fn test_fwhm_needs_signal() {
    let data = Array2::from_elem((20, 20), 10.0f32);
    let stars = detect_stars(&data, 0.0, 10);
    assert!(median_fwhm(&data, &stars, 10.0).is_none());
    assert!(median_fwhm(&data, &[], 10.0).is_none());
}

#[test]
fn test_background_is_robust_to_stars() {
    let data = noisy_field(2.0);
    let bg = estimate_background(&data);
    assert_abs_diff_eq!(bg.level, 50.0, epsilon = 1.0);
    assert_abs_diff_eq!(bg.sigma, 2.0, epsilon = 0.4);
}

#[test]
fn test_frame_snr() {
    assert_abs_diff_eq!(frame_snr(&array![[1.0f32, 3.0]]).unwrap(), 2.0, epsilon = 1e-6);
    assert!(frame_snr(&Array2::from_elem((4, 4), 7.0f32)).is_none());
}

#[test]
fn test_assess_quality_on_noisy_field() {
    let data = noisy_field(2.0);
    let metrics = assess_quality(&data, &StarDetectionParams::default());
    assert_eq!(metrics.star_count, Some(5));
    assert_relative_eq!(metrics.fwhm_px.unwrap(), 2.355 * SIGMA, max_relative = 0.15);
    assert!(metrics.snr.unwrap() > 0.0);
}

#[test]
fn test_assess_frame_attaches_metrics() {
    let frame = frame_of(FrameKind::Light, noisy_field(2.0), 30.0);
    let frame = assess_frame(frame, &StarDetectionParams::default());
    let q = &frame.metadata().quality;
    assert_eq!(q.star_count, Some(5));
    assert!(q.fwhm_px.is_some());
    assert!(q.snr.is_some());
}
