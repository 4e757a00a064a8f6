#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};

use astrocam_core::error::AstrocamError;
use astrocam_core::frame::{Frame, FrameKind, QualityMetrics};
use astrocam_core::stack::{
    compute_snr_improvement, estimate_final_snr, median_combine, stack, stack_frames,
    SigmaClipParams, StackMethod,
};
use astrocam_core::stats::median_in_place;

use common::{frame_of, uniform_frame};

fn all_methods() -> [StackMethod; 3] {
    [
        StackMethod::Mean,
        StackMethod::Median,
        StackMethod::SigmaClip(SigmaClipParams::default()),
    ]
}

fn lights(values: &[f32]) -> Vec<Frame> {
    values
        .iter()
        .map(|&v| uniform_frame(FrameKind::Light, (3, 4), v, 10.0))
        .collect()
}

#[test]
fn test_single_frame_passes_through() {
    let data = Array2::from_shape_fn((5, 7), |(r, c)| (r * 7 + c) as f32);
    let frames = vec![frame_of(FrameKind::Light, data.clone(), 30.0)];
    for method in all_methods() {
        assert_eq!(stack(&frames, &method).unwrap(), data, "{method}");
    }
}

#[test]
fn test_mean_and_median_values() {
    let frames = lights(&[1.0, 2.0, 3.0, 10.0]);
    let mean = stack(&frames, &StackMethod::Mean).unwrap();
    assert!(mean.iter().all(|&v| v == 4.0));
    let median = stack(&frames, &StackMethod::Median).unwrap();
    assert!(median.iter().all(|&v| v == 2.5));
}

#[test]
fn test_median_per_pixel() {
    let frames = vec![
        frame_of(FrameKind::Light, array![[1.0f32, 9.0]], 1.0),
        frame_of(FrameKind::Light, array![[5.0f32, 3.0]], 1.0),
        frame_of(FrameKind::Light, array![[3.0f32, 6.0]], 1.0),
    ];
    let out = stack(&frames, &StackMethod::Median).unwrap();
    assert_eq!(out, array![[3.0f32, 6.0]]);
}

#[test]
fn test_median_combine_matches_order_statistics() {
    let layers = [
        array![[4.0f32, -1.0]],
        array![[1.0f32, 8.0]],
        array![[3.0f32, 2.0]],
        array![[2.0f32, 0.0]],
    ];
    let refs: Vec<&Array2<f32>> = layers.iter().collect();
    let out = median_combine(&refs);
    assert_eq!(out, array![[2.5f32, 1.0]]);

    let mut column = vec![-1.0f32, 8.0, 2.0, 0.0];
    assert_eq!(median_in_place(&mut column), Some(1.0));
    assert_eq!(median_in_place::<f32>(&mut []), None);
    assert_eq!(median_combine(&[]).dim(), (0, 0));
}

#[test]
fn test_sigma_clip_rejects_outlier() {
    let mut values = vec![100.0f32; 10];
    values.push(1000.0);
    let frames = lights(&values);

    let clipped = stack(&frames, &StackMethod::SigmaClip(SigmaClipParams::default())).unwrap();
    for &v in &clipped {
        assert_abs_diff_eq!(v, 100.0, epsilon = 1e-4);
    }
    let mean = stack(&frames, &StackMethod::Mean).unwrap();
    assert!(mean[[0, 0]] > 180.0);
}

#[test]
fn test_sigma_clip_without_spread_is_plain_mean() {
    let frames = lights(&[7.0, 7.0, 7.0]);
    let out = stack(&frames, &StackMethod::SigmaClip(SigmaClipParams::default())).unwrap();
    assert!(out.iter().all(|&v| v == 7.0));
}

#[test]
fn test_sigma_clip_rejecting_everything_gives_zero() {
    let frames = lights(&[1.0, 3.0]);
    let params = SigmaClipParams {
        sigma_low: 0.0,
        sigma_high: 0.0,
        iterations: 1,
    };
    let out = stack(&frames, &StackMethod::SigmaClip(params)).unwrap();
    assert!(out.iter().all(|&v| v == 0.0));
}

#[test]
fn test_stack_errors() {
    for method in all_methods() {
        assert!(matches!(
            stack(&[], &method),
            Err(AstrocamError::EmptySequence)
        ));
    }
    let frames = vec![
        uniform_frame(FrameKind::Light, (4, 4), 1.0, 1.0),
        uniform_frame(FrameKind::Light, (4, 3), 1.0, 1.0),
    ];
    assert!(matches!(
        stack(&frames, &StackMethod::Mean),
        Err(AstrocamError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_stack_frames_logs_and_inherits_metadata() {
    let frames = lights(&[10.0, 20.0, 30.0]);
    let out = stack_frames(&frames, &StackMethod::Mean).unwrap();
    assert_eq!(out.kind(), FrameKind::Light);
    assert_eq!(out.exposure_s(), 10.0);
    assert_abs_diff_eq!(out.stats().mean, 20.0, epsilon = 1e-5);
    assert_eq!(
        out.metadata().calibration_log,
        vec!["Stacked 3 frames (mean, 30.0s total)".to_string()]
    );
}

#[test]
fn test_snr_improvement() {
    for method in all_methods() {
        assert_eq!(compute_snr_improvement(0, &method), 1.0);
        assert_eq!(compute_snr_improvement(1, &method), 1.0);
        let mut last = 1.0;
        for n in 2..50 {
            let gain = compute_snr_improvement(n, &method);
            assert!(gain > last, "{method} not increasing at n={n}");
            last = gain;
        }
    }
    assert_abs_diff_eq!(compute_snr_improvement(16, &StackMethod::Mean), 4.0, epsilon = 1e-12);
    assert_abs_diff_eq!(
        compute_snr_improvement(10, &StackMethod::Median),
        (std::f64::consts::FRAC_PI_2 * 10.0).sqrt(),
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(
        compute_snr_improvement(20, &StackMethod::SigmaClip(SigmaClipParams::default())),
        19.0f64.sqrt(),
        epsilon = 1e-12
    );
}

#[test]
fn test_estimate_final_snr() {
    assert_eq!(estimate_final_snr(&[], &StackMethod::Mean), 0.0);

    let recorded: Vec<Frame> = [8.0, 12.0, 10.0, 10.0]
        .iter()
        .map(|&snr| {
            uniform_frame(FrameKind::Light, (2, 2), 1.0, 1.0).with_quality(QualityMetrics {
                snr: Some(snr),
                ..QualityMetrics::default()
            })
        })
        .collect();
    assert_abs_diff_eq!(
        estimate_final_snr(&recorded, &StackMethod::Mean),
        20.0,
        epsilon = 1e-9
    );

    // Without recorded SNR: mean signal over mean noise.
    let measured = vec![
        frame_of(FrameKind::Light, array![[90.0f32, 110.0]], 1.0),
        frame_of(FrameKind::Light, array![[80.0f32, 120.0]], 1.0),
    ];
    // mean 100, std 10 and 20.
    let expected = 100.0 / 15.0 * 2f64.sqrt();
    assert_abs_diff_eq!(
        estimate_final_snr(&measured, &StackMethod::Mean),
        expected,
        epsilon = 1e-6
    );

    // Flat frames carry no noise: the default per-frame SNR applies.
    let flat = lights(&[5.0]);
    assert_abs_diff_eq!(estimate_final_snr(&flat, &StackMethod::Mean), 10.0, epsilon = 1e-12);
}

#[test]
fn test_stack_method_display() {
    assert_eq!(StackMethod::Mean.to_string(), "mean");
    assert_eq!(StackMethod::Median.to_string(), "median");
    assert_eq!(
        StackMethod::default().to_string(),
        "sigma-clip (low=3, high=3, iter=1)"
    );
}
