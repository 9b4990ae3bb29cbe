use keypoint_benchmark::compatibility::{CompatibilityPolicy, CompatibilityRule};
use keypoint_benchmark::types::{Configuration, DescriptorKind, DetectorKind};

#[test]
fn test_reference_rules() {
    let policy = CompatibilityPolicy::reference();

    assert!(!policy.is_runnable(DetectorKind::Fast, DescriptorKind::Akaze));
    assert!(!policy.is_runnable(DetectorKind::Orb, DescriptorKind::Akaze));
    assert!(policy.is_runnable(DetectorKind::Akaze, DescriptorKind::Akaze));

    assert!(!policy.is_runnable(DetectorKind::Sift, DescriptorKind::Orb));
    assert!(policy.is_runnable(DetectorKind::Sift, DescriptorKind::Sift));
    assert!(policy.is_runnable(DetectorKind::Orb, DescriptorKind::Orb));
    assert!(policy.is_runnable(DetectorKind::Fast, DescriptorKind::Brief));
}

#[test]
fn test_rejection_names_the_rule() {
    let policy = CompatibilityPolicy::reference();
    let rule = policy
        .rejection(DetectorKind::Sift, DescriptorKind::Orb)
        .unwrap();
    assert!(matches!(rule, CompatibilityRule::Forbidden { .. }));
    assert!(rule.to_string().contains("memory"));
    assert!(policy.rejection(DetectorKind::Fast, DescriptorKind::Orb).is_none());
}

#[test]
fn test_full_sweep_count() {
    let policy = CompatibilityPolicy::reference();
    let configs = policy.runnable_configurations(&DetectorKind::ALL, &DescriptorKind::ALL);
    // 7 x 6 pairs, minus 6 non-AKAZE detectors with AKAZE descriptors, minus SIFT/ORB.
    assert_eq!(configs.len(), 42 - 6 - 1);
    assert!(!configs.contains(&Configuration::new(DetectorKind::Sift, DescriptorKind::Orb)));
    assert!(configs.contains(&Configuration::new(DetectorKind::Akaze, DescriptorKind::Akaze)));
}

#[test]
fn test_enumeration_is_detector_major_and_deterministic() {
    let policy = CompatibilityPolicy::reference();
    let detectors = [DetectorKind::Fast, DetectorKind::Sift];
    let descriptors = [DescriptorKind::Brief, DescriptorKind::Orb];
    let configs = policy.runnable_configurations(&detectors, &descriptors);
    assert_eq!(
        configs,
        vec![
            Configuration::new(DetectorKind::Fast, DescriptorKind::Brief),
            Configuration::new(DetectorKind::Fast, DescriptorKind::Orb),
            Configuration::new(DetectorKind::Sift, DescriptorKind::Brief),
        ]
    );
    assert_eq!(configs, policy.runnable_configurations(&detectors, &descriptors));
}

#[test]
fn test_policy_is_total() {
    let policy = CompatibilityPolicy::reference();
    for det in DetectorKind::ALL {
        for desc in DescriptorKind::ALL {
            assert_eq!(
                policy.is_runnable(det, desc),
                policy.rejection(det, desc).is_none()
            );
        }
    }
}

#[test]
fn test_permissive_and_custom_rules() {
    let permissive = CompatibilityPolicy::permissive();
    assert!(permissive.rules().is_empty());
    assert_eq!(
        permissive
            .runnable_configurations(&DetectorKind::ALL, &DescriptorKind::ALL)
            .len(),
        42
    );

    let oriented = permissive.with_rule(CompatibilityRule::RequiresOrientation {
        descriptor: DescriptorKind::Orb,
    });
    assert!(!oriented.is_runnable(DetectorKind::Fast, DescriptorKind::Orb));
    assert!(oriented.is_runnable(DetectorKind::Orb, DescriptorKind::Orb));
    assert!(oriented.is_runnable(DetectorKind::Fast, DescriptorKind::Brief));
}
