#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::array;

use astrocam_core::error::AstrocamError;
use astrocam_core::frame::{FrameKind, FrameSet, QualityMetrics};

use common::{frame_of, uniform_frame};

#[test]
fn test_stats_computed_at_creation() {
    let frame = frame_of(FrameKind::Light, array![[1.0f32, 2.0], [3.0, 4.0]], 10.0);
    let s = frame.stats();
    assert_abs_diff_eq!(s.mean, 2.5, epsilon = 1e-6);
    assert_abs_diff_eq!(s.median, 2.5, epsilon = 1e-6);
    assert_abs_diff_eq!(s.std_dev, 1.25f32.sqrt(), epsilon = 1e-5);
    assert_eq!(s.min, 1.0);
    assert_eq!(s.max, 4.0);
    assert_eq!(frame.dim(), (2, 2));
}

#[test]
fn test_derive_appends_log_and_keeps_parent() {
    let parent = uniform_frame(FrameKind::Light, (4, 4), 10.0, 30.0);
    assert!(!parent.is_calibrated());

    let child = parent.derive(parent.data() * 2.0, "doubled");
    assert!(child.is_calibrated());
    assert_eq!(child.metadata().calibration_log, vec!["doubled".to_string()]);
    assert_eq!(child.exposure_s(), 30.0);
    assert_abs_diff_eq!(child.stats().mean, 20.0, epsilon = 1e-6);

    assert!(parent.metadata().calibration_log.is_empty());
    assert_abs_diff_eq!(parent.stats().mean, 10.0, epsilon = 1e-6);
}

#[test]
fn test_with_quality_attaches_metrics() {
    let frame = uniform_frame(FrameKind::Light, (2, 2), 1.0, 1.0).with_quality(QualityMetrics {
        fwhm_px: Some(2.5),
        snr: Some(12.0),
        star_count: Some(7),
    });
    assert_eq!(frame.metadata().quality.star_count, Some(7));
    assert_eq!(frame.metadata().quality.snr, Some(12.0));
}

#[test]
fn test_kind_display() {
    assert_eq!(FrameKind::Light.to_string(), "LIGHT");
    assert_eq!(FrameKind::Bias.to_string(), "BIAS");
}

#[test]
fn test_frame_set_rejects_wrong_kind() {
    let mut set = FrameSet::new(FrameKind::Dark);
    set.push(uniform_frame(FrameKind::Dark, (2, 2), 1.0, 5.0)).unwrap();
    let err = set
        .push(uniform_frame(FrameKind::Flat, (2, 2), 1.0, 5.0))
        .unwrap_err();
    assert!(matches!(
        err,
        AstrocamError::FrameKindMismatch {
            expected: FrameKind::Dark,
            found: FrameKind::Flat
        }
    ));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_frame_set_groups_and_summary() {
    let mut set = FrameSet::new(FrameKind::Light);
    for (value, exposure) in [(10.0, 30.0), (20.0, 30.0), (30.0, 60.0)] {
        set.push(uniform_frame(FrameKind::Light, (3, 3), value, exposure))
            .unwrap();
    }

    let groups = set.exposure_groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&30_000_000].len(), 2);
    assert_eq!(groups[&60_000_000].len(), 1);

    let filters = set.filter_groups();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters["L"].len(), 3);

    let summary = set.summary();
    assert_eq!(summary.count, 3);
    assert_abs_diff_eq!(summary.mean_of_means, 20.0, epsilon = 1e-5);
    assert_abs_diff_eq!(summary.mean_noise, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(summary.total_integration_s, 120.0, epsilon = 1e-9);
}

#[test]
fn test_empty_frame_set_summary() {
    let set = FrameSet::new(FrameKind::Bias);
    assert!(set.is_empty());
    assert_eq!(set.summary().count, 0);
}
