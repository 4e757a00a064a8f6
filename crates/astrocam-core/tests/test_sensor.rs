use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::Array2;

use astrocam_core::error::AstrocamError;
use astrocam_core::frame::FrameKind;
use astrocam_core::sensor::{CameraParams, CameraSpec, DefectMaps, NoiseSources, SensorModel};

fn small_camera(params: CameraParams) -> CameraSpec {
    CameraSpec::new(CameraParams {
        width: 64,
        height: 64,
        ..params
    })
    .unwrap()
}

fn mean_of(data: &Array2<f32>) -> f64 {
    data.iter().map(|&v| v as f64).sum::<f64>() / data.len() as f64
}

// ---------------------------------------------------------------------------
// CameraSpec validation
// ---------------------------------------------------------------------------

#[test]
fn test_default_params_are_valid() {
    assert!(CameraSpec::new(CameraParams::default()).is_ok());
}

#[test]
fn test_rejects_quantum_efficiency_outside_unit_interval() {
    for qe in [0.0, -0.1, 1.2] {
        let params = CameraParams {
            quantum_efficiency: qe,
            ..CameraParams::default()
        };
        assert!(
            matches!(CameraSpec::new(params), Err(AstrocamError::InvalidCameraSpec(_))),
            "QE {qe} should be rejected"
        );
    }
    let params = CameraParams {
        quantum_efficiency: 1.0,
        ..CameraParams::default()
    };
    assert!(CameraSpec::new(params).is_ok());
}

#[test]
fn test_rejects_unsupported_bit_depth() {
    for bits in [8, 10, 15, 32] {
        let params = CameraParams {
            bit_depth: bits,
            ..CameraParams::default()
        };
        assert!(CameraSpec::new(params).is_err(), "{bits}-bit accepted");
    }
    for bits in [12, 14, 16] {
        let params = CameraParams {
            bit_depth: bits,
            ..CameraParams::default()
        };
        assert!(CameraSpec::new(params).is_ok(), "{bits}-bit rejected");
    }
}

#[test]
fn test_rejects_non_positive_read_noise() {
    let params = CameraParams {
        read_noise_e: 0.0,
        ..CameraParams::default()
    };
    assert!(CameraSpec::new(params).is_err());
}

#[test]
fn test_presets_construct() {
    for id in CameraSpec::preset_ids() {
        let spec = CameraSpec::preset(id).unwrap();
        assert!(!spec.name().is_empty());
    }
    assert!(CameraSpec::preset("no-such-camera").is_err());
}

#[test]
fn test_derived_geometry() {
    let spec = CameraSpec::new(CameraParams::default()).unwrap();
    assert_eq!(spec.max_adu(), 65535.0);
    assert_abs_diff_eq!(spec.sensor_width_mm(), 1920.0 * 3.76 / 1000.0, epsilon = 1e-9);
    assert_abs_diff_eq!(spec.pixel_scale_arcsec(714.0), 206.265 * 3.76 / 714.0, epsilon = 1e-3);
    let (fov_w, fov_h) = spec.fov_deg(714.0);
    assert!(fov_w > fov_h && fov_h > 0.0);
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

#[test]
fn test_capture_is_deterministic_for_a_seed() {
    let spec = small_camera(CameraParams::default());
    let photons = Array2::from_elem((64, 64), 500.0f32);

    let mut a = SensorModel::new(spec.clone(), Some(7));
    let mut b = SensorModel::new(spec, Some(7));
    let fa = a.capture(10.0, &photons, FrameKind::Light, Some(1234));
    let fb = b.capture(10.0, &photons, FrameKind::Light, Some(1234));
    assert_eq!(fa.data(), fb.data());

    let fc = a.capture(10.0, &photons, FrameKind::Light, Some(1235));
    assert_ne!(fa.data(), fc.data());
}

#[test]
fn test_default_seeds_follow_exposure_counter() {
    let spec = small_camera(CameraParams::default());
    let photons = Array2::from_elem((64, 64), 200.0f32);

    let mut a = SensorModel::new(spec.clone(), Some(99));
    let mut b = SensorModel::new(spec, Some(99));
    let a1 = a.capture(5.0, &photons, FrameKind::Light, None);
    let a2 = a.capture(5.0, &photons, FrameKind::Light, None);
    let b1 = b.capture(5.0, &photons, FrameKind::Light, None);

    assert_eq!(a1.data(), b1.data());
    assert_ne!(a1.data(), a2.data());
    assert_eq!(a.exposure_count(), 2);
    assert_eq!(a2.metadata().frame_id, 1);
}

#[test]
fn test_output_within_adc_range() {
    let spec = small_camera(CameraParams {
        bit_depth: 12,
        gain_e_per_adu: 1.0,
        full_well_e: 50_000.0,
        ..CameraParams::default()
    });
    let mut sensor = SensorModel::new(spec, Some(3));
    let photons = Array2::from_shape_fn((64, 64), |(r, c)| ((r * 64 + c) as f32) * 1.0e5);
    let frame = sensor.capture(1.0, &photons, FrameKind::Light, None);
    assert!(frame.data().iter().all(|&v| (0.0..=4095.0).contains(&v)));
    assert_eq!(frame.stats().max, 4095.0);
}

#[test]
fn test_shot_noise_only_mean_matches_qe_over_gain() {
    let spec = small_camera(CameraParams {
        quantum_efficiency: 0.8,
        dark_current_e_per_s: 0.0,
        gain_e_per_adu: 1.0,
        full_well_e: 100_000.0,
        ..CameraParams::default()
    });
    let mut sensor = SensorModel::new(spec, Some(11)).with_noise(NoiseSources::shot_only());
    let photons = Array2::from_elem((64, 64), 10_000.0f32);
    let frame = sensor.capture(1.0, &photons, FrameKind::Light, None);

    let expected = 10_000.0 * 0.8 / 1.0;
    assert_relative_eq!(mean_of(frame.data()), expected, max_relative = 0.02);
    // Poisson-like spread: sqrt(8000) ~ 89 ADU.
    assert!(frame.stats().std_dev > 60.0 && frame.stats().std_dev < 120.0);
}

#[test]
fn test_noiseless_capture_is_exact() {
    let spec = small_camera(CameraParams {
        quantum_efficiency: 0.5,
        gain_e_per_adu: 2.0,
        bias_offset_adu: 100.0,
        ..CameraParams::default()
    });
    let mut sensor = SensorModel::new(spec, Some(1)).with_noise(NoiseSources::none());
    let photons = Array2::from_elem((64, 64), 400.0f32);
    let frame = sensor.capture(1.0, &photons, FrameKind::Light, None);
    // 400 * 0.5 / 2 + 100
    assert!(frame.data().iter().all(|&v| v == 200.0));
}

#[test]
fn test_bias_frame_sits_on_offset() {
    let spec = small_camera(CameraParams {
        bias_offset_adu: 500.0,
        read_noise_e: 2.0,
        ..CameraParams::default()
    });
    let mut sensor = SensorModel::new(spec, Some(5));
    let bias = sensor.capture_bias((64, 64), None);
    assert_eq!(bias.kind(), FrameKind::Bias);
    assert_eq!(bias.exposure_s(), 0.0);
    assert_abs_diff_eq!(mean_of(bias.data()), 500.0, epsilon = 0.5);
}

#[test]
fn test_dark_current_accumulates_with_exposure() {
    let spec = small_camera(CameraParams {
        dark_current_e_per_s: 1.0,
        hot_pixel_fraction: 0.0,
        defect_fraction: 0.0,
        ..CameraParams::default()
    });
    let noise = NoiseSources {
        dark: true,
        ..NoiseSources::none()
    };
    let mut sensor = SensorModel::new(spec, Some(8)).with_noise(noise);
    let dark = sensor.capture_dark(100.0, (64, 64), None);
    assert_eq!(dark.kind(), FrameKind::Dark);
    assert_abs_diff_eq!(mean_of(dark.data()), 100.0, epsilon = 1.0);
}

#[test]
fn test_binned_capture_scales_dark_current() {
    let spec = small_camera(CameraParams {
        dark_current_e_per_s: 1.0,
        hot_pixel_fraction: 0.0,
        defect_fraction: 0.0,
        ..CameraParams::default()
    });
    let noise = NoiseSources {
        dark: true,
        ..NoiseSources::none()
    };
    let mut sensor = SensorModel::new(spec, Some(8)).with_noise(noise);
    // 64×64 sensor read onto 32×32 output: 2×2 binning.
    let dark = sensor.capture_dark(10.0, (32, 32), None);
    assert_abs_diff_eq!(mean_of(dark.data()), 40.0, epsilon = 1.0);
    assert_eq!(dark.metadata().binning, 2);
}

// ---------------------------------------------------------------------------
// Temperature
// ---------------------------------------------------------------------------

#[test]
fn test_cooling_refused_without_hardware() {
    let spec = small_camera(CameraParams {
        has_cooling: false,
        ..CameraParams::default()
    });
    let mut sensor = SensorModel::new(spec, None);
    assert!(matches!(
        sensor.set_cooling(true, Some(-5.0)),
        Err(AstrocamError::CoolingUnavailable(_))
    ));
    assert_abs_diff_eq!(sensor.dark_temperature_factor(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_cooling_clamps_to_minimum_and_halves_dark() {
    let spec = small_camera(CameraParams {
        has_cooling: true,
        min_temp_c: -10.0,
        ..CameraParams::default()
    });
    let mut sensor = SensorModel::new(spec, None);
    sensor.set_cooling(true, Some(-40.0)).unwrap();
    assert!(sensor.is_cooling());
    assert_eq!(sensor.temperature_c(), -10.0);

    sensor.set_cooling(true, Some(25.0 - 6.3)).unwrap();
    assert_abs_diff_eq!(sensor.dark_temperature_factor(), 0.5, epsilon = 1e-9);

    sensor.set_cooling(false, None).unwrap();
    assert_eq!(sensor.temperature_c(), 25.0);
}

// ---------------------------------------------------------------------------
// Defects
// ---------------------------------------------------------------------------

#[test]
fn test_defect_maps_are_reproducible() {
    let a = DefectMaps::generate(200, 100, 0.01, 0.005, 42);
    let b = DefectMaps::generate(200, 100, 0.01, 0.005, 42);
    let c = DefectMaps::generate(200, 100, 0.01, 0.005, 43);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.hot_pixels().len(), 200);
    assert!(a.dead_pixels().len() <= 100);
    assert!(a.hot_pixels().iter().all(|hp| hp.rate_e_per_s >= 0.0));
}

#[test]
fn test_dead_pixels_remove_response() {
    let maps = DefectMaps::generate(50, 40, 0.0, 0.01, 9);
    let response = maps.optical_response((40, 50));
    for &(x, y) in maps.dead_pixels() {
        assert_eq!(response[[y, x]], 0.0);
    }
    let zeros = response.iter().filter(|&&v| v == 0.0).count();
    assert_eq!(zeros, maps.dead_pixels().len());
}

#[test]
fn test_hot_pixels_accumulate_over_exposure() {
    let maps = DefectMaps::generate(32, 32, 0.02, 0.0, 4);
    let grid = maps.hot_electrons((32, 32), 10.0);
    let total: f64 = grid.iter().map(|&v| v as f64).sum();
    let expected: f64 = maps.hot_pixels().iter().map(|hp| hp.rate_e_per_s * 10.0).sum();
    assert_relative_eq!(total, expected, max_relative = 1e-4);
}
