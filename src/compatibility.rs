//! Which detector / descriptor pairings are worth running.
//!
//! Rules live in a table so adding a kind never touches the sweep loop.

use std::fmt;

use crate::types::{Configuration, DescriptorKind, DetectorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatibilityRule {
    /// `descriptor` only works on keypoints produced by `detector`.
    OnlyWithDetector {
        descriptor: DescriptorKind,
        detector: DetectorKind,
    },
    /// The pairing is known to fail, e.g. by exhausting memory.
    Forbidden {
        detector: DetectorKind,
        descriptor: DescriptorKind,
        reason: &'static str,
    },
    /// `descriptor` needs oriented keypoints.
    RequiresOrientation { descriptor: DescriptorKind },
}

impl CompatibilityRule {
    /// Whether this rule rejects the pairing.
    pub fn rejects(&self, detector: DetectorKind, descriptor: DescriptorKind) -> bool {
        match *self {
            CompatibilityRule::OnlyWithDetector {
                descriptor: d,
                detector: only,
            } => descriptor == d && detector != only,
            CompatibilityRule::Forbidden {
                detector: det,
                descriptor: d,
                ..
            } => detector == det && descriptor == d,
            CompatibilityRule::RequiresOrientation { descriptor: d } => {
                descriptor == d && !detector.provides_orientation()
            }
        }
    }
}

impl fmt::Display for CompatibilityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatibilityRule::OnlyWithDetector {
                descriptor,
                detector,
            } => write!(f, "{} descriptors only work with {} keypoints", descriptor, detector),
            CompatibilityRule::Forbidden {
                detector,
                descriptor,
                reason,
            } => write!(f, "{} keypoints with {} descriptors: {}", detector, descriptor, reason),
            CompatibilityRule::RequiresOrientation { descriptor } => {
                write!(f, "{} descriptors need oriented keypoints", descriptor)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompatibilityPolicy {
    rules: Vec<CompatibilityRule>,
}

impl CompatibilityPolicy {
    /// No exclusions at all.
    pub fn permissive() -> CompatibilityPolicy {
        CompatibilityPolicy { rules: Vec::new() }
    }

    /// AKAZE descriptors need AKAZE keypoints; SIFT keypoints with ORB descriptors run out of memory.
    pub fn reference() -> CompatibilityPolicy {
        CompatibilityPolicy::permissive()
            .with_rule(CompatibilityRule::OnlyWithDetector {
                descriptor: DescriptorKind::Akaze,
                detector: DetectorKind::Akaze,
            })
            .with_rule(CompatibilityRule::Forbidden {
                detector: DetectorKind::Sift,
                descriptor: DescriptorKind::Orb,
                reason: "runs out of memory",
            })
    }

    pub fn with_rule(mut self, rule: CompatibilityRule) -> CompatibilityPolicy {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[CompatibilityRule] {
        &self.rules
    }

    /// The first rule rejecting the pairing, if any.
    pub fn rejection(
        &self,
        detector: DetectorKind,
        descriptor: DescriptorKind,
    ) -> Option<&CompatibilityRule> {
        self.rules.iter().find(|r| r.rejects(detector, descriptor))
    }

    pub fn is_runnable(&self, detector: DetectorKind, descriptor: DescriptorKind) -> bool {
        self.rejection(detector, descriptor).is_none()
    }

    /// Runnable pairs of the Cartesian product, detector major, in input order.
    pub fn runnable_configurations(
        &self,
        detectors: &[DetectorKind],
        descriptors: &[DescriptorKind],
    ) -> Vec<Configuration> {
        detectors
            .iter()
            .flat_map(|&det| descriptors.iter().map(move |&desc| Configuration::new(det, desc)))
            .filter(|c| match self.rejection(c.detector, c.descriptor) {
                Some(rule) => {
                    log::debug!("skipping {}: {}", c, rule);
                    false
                }
                None => true,
            })
            .collect()
    }
}
