use keypoint_benchmark::summary::{Measurement, Summary};
use keypoint_benchmark::types::{Configuration, DescriptorKind, DetectorKind};

fn summary() -> Summary {
    Summary::new(Configuration::new(DetectorKind::Orb, DescriptorKind::Orb))
}

fn measurement(keypoints: usize, matches: Option<usize>) -> Measurement {
    Measurement {
        keypoint_count: keypoints,
        match_count: matches,
        detection_time: 0.004,
        description_time: 0.001,
        keypoint_sizes: vec![31.0; keypoints],
    }
}

#[test]
fn test_empty_summary_means_are_zero() {
    let s = summary();
    assert_eq!(s.measurements(), 0);
    assert_eq!(s.mean_keypoint_count(), 0.0);
    assert_eq!(s.mean_match_count(), 0.0);
    assert_eq!(s.mean_detection_time(), 0.0);
    assert_eq!(s.mean_description_time(), 0.0);
    assert_eq!(s.total_time(), 0.0);
    assert!(s.time_per_match().is_none());
    assert!(s.keypoint_sizes().is_empty());
}

#[test]
fn test_means_over_recorded_frames() {
    let mut s = summary();
    s.record(measurement(100, None));
    s.record(measurement(200, Some(40)));
    s.record(measurement(300, Some(60)));

    assert_eq!(s.measurements(), 3);
    assert_eq!(s.match_samples(), 2);
    assert_eq!(s.mean_keypoint_count(), 200.0);
    assert_eq!(s.mean_match_count(), 50.0);
    assert!((s.total_time() - 0.005).abs() < 1e-12);
    assert!((s.time_per_match().unwrap() - 0.0001).abs() < 1e-12);
    assert_eq!(s.keypoint_sizes().len(), 600);
}

#[test]
fn test_zero_matches_leave_time_per_match_undefined() {
    let mut s = summary();
    s.record(measurement(10, Some(0)));
    s.record(measurement(10, Some(0)));
    assert_eq!(s.mean_match_count(), 0.0);
    assert!(s.time_per_match().is_none());
}
