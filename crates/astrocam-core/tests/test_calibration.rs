#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};

use astrocam_core::calibrate::{
    batch_calibrate_lights, calibrate_light, cosmetic_correction, master_bias, master_dark,
    master_flat, CalibrationLibrary, CosmeticParams, ReplaceMethod,
};
use astrocam_core::error::AstrocamError;
use astrocam_core::frame::{Frame, FrameKind};

use common::{frame_of, uniform_frame};

// ---------------------------------------------------------------------------
// Masters
// ---------------------------------------------------------------------------

#[test]
fn test_masters_of_nothing_are_none() {
    assert!(master_bias(&[]).unwrap().is_none());
    assert!(master_dark(&[], None).unwrap().is_none());
    assert!(master_flat(&[], None, None).unwrap().is_none());
}

#[test]
fn test_master_bias_is_pixel_median() {
    let frames = vec![
        frame_of(FrameKind::Bias, array![[100.0f32, 101.0], [99.0, 100.0]], 0.0),
        frame_of(FrameKind::Bias, array![[102.0f32, 101.0], [100.0, 500.0]], 0.0),
        frame_of(FrameKind::Bias, array![[101.0f32, 103.0], [98.0, 100.0]], 0.0),
    ];
    let master = master_bias(&frames).unwrap().unwrap();
    assert_eq!(master.kind(), FrameKind::Bias);
    assert_eq!(master.data(), &array![[101.0f32, 101.0], [99.0, 100.0]]);
    assert_eq!(master.metadata().target_name, "MASTER_BIAS_3x");
    assert_eq!(master.metadata().calibration_log.len(), 1);
}

#[test]
fn test_master_dark_of_identical_frames_is_that_frame() {
    let data = Array2::from_shape_fn((6, 5), |(r, c)| (r * 5 + c) as f32);
    let frames: Vec<_> = (0..4)
        .map(|_| frame_of(FrameKind::Dark, data.clone(), 60.0))
        .collect();
    let master = master_dark(&frames, None).unwrap().unwrap();
    assert_eq!(master.data(), &data);
    assert_eq!(master.exposure_s(), 60.0);
}

#[test]
fn test_master_dark_subtracts_bias() {
    let bias = uniform_frame(FrameKind::Bias, (4, 4), 100.0, 0.0);
    let frames: Vec<_> = [150.0, 152.0, 148.0]
        .iter()
        .map(|&v| uniform_frame(FrameKind::Dark, (4, 4), v, 30.0))
        .collect();
    let master = master_dark(&frames, Some(&bias)).unwrap().unwrap();
    assert!(master.data().iter().all(|&v| v == 50.0));
    assert!(master.metadata().calibration_log[0].contains("bias-subtracted"));
}

#[test]
fn test_master_flat_normalizes_to_unit_mean() {
    let flats: Vec<_> = [1.0f32, 1.1, 0.9]
        .iter()
        .map(|&scale| {
            let data = Array2::from_shape_fn((16, 16), |(r, c)| {
                scale * (20_000.0 + 100.0 * (r as f32 - 8.0).abs() + 50.0 * c as f32)
            });
            frame_of(FrameKind::Flat, data, 1.0)
        })
        .collect();
    let master = master_flat(&flats, None, None).unwrap().unwrap();
    assert_eq!(master.kind(), FrameKind::Flat);
    assert_abs_diff_eq!(master.stats().mean, 1.0, epsilon = 1e-4);
    assert!(master.data().iter().all(|&v| (0.1..=10.0).contains(&v)));
}

#[test]
fn test_master_flat_clamps_dead_regions() {
    let mut data = Array2::from_elem((8, 8), 1000.0f32);
    data[[3, 3]] = 0.0;
    let flats = vec![frame_of(FrameKind::Flat, data, 1.0)];
    let master = master_flat(&flats, None, None).unwrap().unwrap();
    assert_eq!(master.data()[[3, 3]], 0.1);
}

#[test]
fn test_master_flat_prefers_matching_dark_over_bias() {
    let bias = uniform_frame(FrameKind::Bias, (4, 4), 100.0, 0.0);
    let dark = uniform_frame(FrameKind::Dark, (4, 4), 300.0, 1.0);
    let mut data = Array2::from_elem((4, 4), 1300.0f32);
    data[[0, 0]] = 2300.0;
    let flats = vec![frame_of(FrameKind::Flat, data, 1.0)];

    // Dark-subtracted: 1000 everywhere but one 2000 pixel.
    let master = master_flat(&flats, Some(&dark), Some(&bias))
        .unwrap()
        .unwrap();
    let mean = (15.0 * 1000.0 + 2000.0) / 16.0;
    assert_abs_diff_eq!(master.data()[[1, 1]], (1000.0 / mean) as f32, epsilon = 1e-5);
}

#[test]
fn test_master_rejects_mismatched_shapes() {
    let frames = vec![
        uniform_frame(FrameKind::Bias, (4, 4), 1.0, 0.0),
        uniform_frame(FrameKind::Bias, (4, 5), 1.0, 0.0),
    ];
    assert!(matches!(
        master_bias(&frames),
        Err(AstrocamError::DimensionMismatch { .. })
    ));

    let darks = vec![uniform_frame(FrameKind::Dark, (4, 4), 1.0, 10.0)];
    let bias = uniform_frame(FrameKind::Bias, (3, 3), 1.0, 0.0);
    assert!(master_dark(&darks, Some(&bias)).is_err());
}

// ---------------------------------------------------------------------------
// Light calibration
// ---------------------------------------------------------------------------

#[test]
fn test_calibrate_light_full_chain() {
    let light = uniform_frame(FrameKind::Light, (4, 4), 1300.0, 30.0);
    let bias = uniform_frame(FrameKind::Bias, (4, 4), 100.0, 0.0);
    let dark = uniform_frame(FrameKind::Dark, (4, 4), 200.0, 30.0);
    let flat = uniform_frame(FrameKind::Flat, (4, 4), 0.5, 1.0);

    let cal = calibrate_light(&light, Some(&dark), Some(&flat), Some(&bias)).unwrap();
    for &v in cal.data() {
        assert_abs_diff_eq!(v, 2000.0, epsilon = 0.05);
    }
    assert!(cal.is_calibrated());
    assert_eq!(
        cal.metadata().calibration_log,
        vec!["bias subtraction + dark subtraction + flat division".to_string()]
    );
    // The input is untouched.
    assert!(light.data().iter().all(|&v| v == 1300.0));
}

#[test]
fn test_calibrate_light_scales_dark_to_exposure() {
    let light = uniform_frame(FrameKind::Light, (3, 3), 500.0, 60.0);
    let dark = uniform_frame(FrameKind::Dark, (3, 3), 100.0, 30.0);
    let cal = calibrate_light(&light, Some(&dark), None, None).unwrap();
    assert!(cal.data().iter().all(|&v| v == 300.0));
    assert!(cal.metadata().calibration_log[0].contains("scaled 2.00x"));
}

#[test]
fn test_calibrate_light_clamps_negatives() {
    let light = uniform_frame(FrameKind::Light, (3, 3), 90.0, 10.0);
    let bias = uniform_frame(FrameKind::Bias, (3, 3), 100.0, 0.0);
    let cal = calibrate_light(&light, None, None, Some(&bias)).unwrap();
    assert!(cal.data().iter().all(|&v| v == 0.0));
}

#[test]
fn test_calibrate_light_without_masters_records_no_calibration() {
    let light = uniform_frame(FrameKind::Light, (3, 3), 42.0, 10.0);
    let cal = calibrate_light(&light, None, None, None).unwrap();
    assert_eq!(cal.data(), light.data());
    assert_eq!(cal.metadata().calibration_log, vec!["no calibration".to_string()]);
}

#[test]
fn test_calibrate_light_is_deterministic() {
    let light = frame_of(
        FrameKind::Light,
        Array2::from_shape_fn((5, 5), |(r, c)| 200.0 + (r * 7 + c * 3) as f32),
        30.0,
    );
    let bias = uniform_frame(FrameKind::Bias, (5, 5), 50.0, 0.0);
    let a = calibrate_light(&light, None, None, Some(&bias)).unwrap();
    let b = calibrate_light(&light, None, None, Some(&bias)).unwrap();
    assert_eq!(a.data(), b.data());
}

#[test]
fn test_calibrate_light_rejects_mismatched_master() {
    let light = uniform_frame(FrameKind::Light, (4, 4), 1.0, 1.0);
    let flat = uniform_frame(FrameKind::Flat, (4, 3), 1.0, 1.0);
    assert!(matches!(
        calibrate_light(&light, None, Some(&flat), None),
        Err(AstrocamError::DimensionMismatch {
            expected: (4, 4),
            found: (4, 3)
        })
    ));
}

#[test]
fn test_batch_keeps_order_and_fails_as_a_whole() {
    let lights: Vec<_> = (0..6)
        .map(|i| uniform_frame(FrameKind::Light, (4, 4), 100.0 + i as f32, 10.0))
        .collect();
    let bias = uniform_frame(FrameKind::Bias, (4, 4), 100.0, 0.0);
    let out = batch_calibrate_lights(&lights, None, None, Some(&bias), false).unwrap();
    for (i, frame) in out.iter().enumerate() {
        assert_eq!(frame.stats().mean, i as f32);
    }

    let bad_bias = uniform_frame(FrameKind::Bias, (2, 2), 100.0, 0.0);
    assert!(batch_calibrate_lights(&lights, None, None, Some(&bad_bias), true).is_err());
}

// ---------------------------------------------------------------------------
// Cosmetic correction
// ---------------------------------------------------------------------------

#[test]
fn test_cosmetic_correction_replaces_hot_pixel() {
    let mut data = Array2::from_shape_fn((9, 9), |(r, c)| 100.0 + ((r + c) % 3) as f32);
    data[[4, 4]] = 60_000.0;
    let frame = frame_of(FrameKind::Light, data.clone(), 10.0);

    let fixed = cosmetic_correction(&frame, &CosmeticParams::default());
    assert!(fixed.data()[[4, 4]] < 110.0);
    // Only the flagged pixel changed.
    let changed = fixed
        .data()
        .iter()
        .zip(data.iter())
        .filter(|(a, b)| a != b)
        .count();
    assert_eq!(changed, 1);
    assert!(fixed
        .metadata()
        .calibration_log
        .last()
        .is_some_and(|s| s.starts_with("Cosmetic correction (1 pixels")));
}

#[test]
fn test_cosmetic_correction_at_corner_uses_clipped_window() {
    let mut data = Array2::from_elem((6, 6), 10.0f32);
    data[[0, 0]] = 5000.0;
    let frame = frame_of(FrameKind::Light, data, 1.0);
    let params = CosmeticParams {
        method: ReplaceMethod::Mean,
        kernel_size: 3,
    };
    let fixed = cosmetic_correction(&frame, &params);
    // Clipped 2×2 window: (5000 + 3 × 10) / 4.
    assert_abs_diff_eq!(fixed.data()[[0, 0]], 1257.5, epsilon = 1e-3);
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

#[test]
fn test_library_enforces_kinds() {
    let mut lib = CalibrationLibrary::new();
    let err = lib
        .add_dark(uniform_frame(FrameKind::Flat, (2, 2), 1.0, 1.0))
        .unwrap_err();
    assert!(matches!(err, AstrocamError::FrameKindMismatch { .. }));
    assert_eq!(lib.dark_count(), 0);
}

#[test]
fn test_library_picks_closest_dark() {
    let mut lib = CalibrationLibrary::new();
    for (exposure, temp) in [(30.0, 10.0), (30.5, -5.0), (120.0, -5.0)] {
        let mut frame = uniform_frame(FrameKind::Dark, (2, 2), 1.0, exposure);
        let mut metadata = frame.metadata().clone();
        metadata.temperature_c = temp;
        frame = Frame::new(frame.into_data(), metadata);
        lib.add_dark(frame).unwrap();
    }

    let warm = lib.best_dark(30.0, Some(12.0), 1.0).unwrap();
    assert_eq!(warm.exposure_s(), 30.0);
    let cold = lib.best_dark(30.0, Some(-4.0), 1.0).unwrap();
    assert_eq!(cold.exposure_s(), 30.5);
    let first = lib.best_dark(30.0, None, 1.0).unwrap();
    assert_eq!(first.exposure_s(), 30.0);
    assert!(lib.best_dark(60.0, None, 1.0).is_none());
}

#[test]
fn test_library_bias_and_flat_selection() {
    let mut lib = CalibrationLibrary::new();
    lib.add_bias(uniform_frame(FrameKind::Bias, (2, 2), 100.0, 0.0))
        .unwrap();
    lib.add_bias(uniform_frame(FrameKind::Bias, (2, 2), 101.0, 0.0))
        .unwrap();
    lib.add_flat(uniform_frame(FrameKind::Flat, (2, 2), 1.0, 1.0), "L")
        .unwrap();
    lib.add_flat(uniform_frame(FrameKind::Flat, (2, 2), 0.9, 1.0), "Ha")
        .unwrap();

    assert_eq!(lib.best_bias(1).unwrap().stats().mean, 101.0);
    // Unknown binning falls back to the latest bias.
    assert_eq!(lib.best_bias(4).unwrap().stats().mean, 101.0);
    assert_eq!(lib.best_flat("Ha").unwrap().stats().mean, 0.9);
    assert!(lib.best_flat("OIII").is_none());
    assert_eq!(lib.filters().collect::<Vec<_>>(), vec!["Ha", "L"]);
    assert_eq!(lib.flat_count(), 2);

    assert_eq!(
        lib.to_string(),
        "CalibrationLibrary(biases=2, darks=0, flats=2)"
    );
    lib.clear();
    assert_eq!(lib.bias_count(), 0);
    assert!(lib.best_bias(1).is_none());
}
