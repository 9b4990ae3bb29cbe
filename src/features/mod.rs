//! Detector, descriptor and matcher capabilities consumed by the pipeline.
//!
//! The pipeline only sees the traits in this module. [`NativeFeatures`] is the
//! built-in backend; anything implementing [`FeatureFactory`] can replace it.

pub mod brief;
pub mod corners;
pub mod fast;
pub mod matcher;
pub mod nms;
pub mod orb;

use std::time::{Duration, Instant};

use image::GrayImage;
use thiserror::Error;

use crate::types::{
    DescriptorFamily, DescriptorKind, Descriptors, DetectorKind, Keypoint, Match, MatcherKind,
    SelectorKind,
};

pub use brief::{BriefDescriptor, OrbDescriptor};
pub use corners::{HarrisDetector, ShiTomasiDetector};
pub use fast::FastDetector;
pub use matcher::BruteForceMatcher;
pub use orb::OrbDetector;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeatureError {
    #[error("{0} is not available in this backend")]
    Unsupported(String),
    #[error("image of {width}x{height} is too small")]
    ImageTooSmall { width: u32, height: u32 },
    #[error("cannot match {query:?} descriptors against {train:?} descriptors")]
    FamilyMismatch {
        query: DescriptorFamily,
        train: DescriptorFamily,
    },
    #[error("{0}")]
    Internal(String),
}

/// A value together with the wall time spent producing it.
#[derive(Debug, Clone)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

impl<T> Timed<T> {
    pub fn new(value: T, elapsed: Duration) -> Timed<T> {
        Timed { value, elapsed }
    }

    /// Runs `f` and records how long it took.
    pub fn measure<E>(f: impl FnOnce() -> Result<T, E>) -> Result<Timed<T>, E> {
        let now = Instant::now();
        let value = f()?;
        Ok(Timed {
            value,
            elapsed: now.elapsed(),
        })
    }
}

pub trait Detector: Send + Sync {
    fn detect(&self, image: &GrayImage) -> Result<Timed<Vec<Keypoint>>, FeatureError>;
}

pub trait DescriptorExtractor: Send + Sync {
    /// Describes `keypoints`, removing any that cannot be described so rows stay aligned.
    fn describe(
        &self,
        image: &GrayImage,
        keypoints: &mut Vec<Keypoint>,
    ) -> Result<Timed<Descriptors>, FeatureError>;

    fn family(&self) -> DescriptorFamily;
}

pub trait Matcher: Send + Sync {
    fn match_descriptors(
        &self,
        query: &Descriptors,
        train: &Descriptors,
    ) -> Result<Vec<Match>, FeatureError>;
}

/// Builds collaborators by kind name.
pub trait FeatureFactory: Send + Sync {
    fn detector(&self, kind: DetectorKind) -> Result<Box<dyn Detector>, FeatureError>;

    fn descriptor(&self, kind: DescriptorKind)
    -> Result<Box<dyn DescriptorExtractor>, FeatureError>;

    fn matcher(
        &self,
        kind: MatcherKind,
        selector: SelectorKind,
        family: DescriptorFamily,
    ) -> Result<Box<dyn Matcher>, FeatureError>;
}

/// Pure Rust implementations of a subset of the kinds.
#[derive(Debug, Clone, Default)]
pub struct NativeFeatures;

impl FeatureFactory for NativeFeatures {
    fn detector(&self, kind: DetectorKind) -> Result<Box<dyn Detector>, FeatureError> {
        match kind {
            DetectorKind::ShiTomasi => Ok(Box::new(ShiTomasiDetector::default())),
            DetectorKind::Harris => Ok(Box::new(HarrisDetector::default())),
            DetectorKind::Fast => Ok(Box::new(FastDetector::default())),
            DetectorKind::Orb => Ok(Box::new(OrbDetector::default())),
            other => Err(FeatureError::Unsupported(format!("{} detector", other))),
        }
    }

    fn descriptor(
        &self,
        kind: DescriptorKind,
    ) -> Result<Box<dyn DescriptorExtractor>, FeatureError> {
        match kind {
            DescriptorKind::Brief => Ok(Box::new(BriefDescriptor::default())),
            DescriptorKind::Orb => Ok(Box::new(OrbDescriptor::default())),
            other => Err(FeatureError::Unsupported(format!("{} descriptor", other))),
        }
    }

    fn matcher(
        &self,
        kind: MatcherKind,
        selector: SelectorKind,
        family: DescriptorFamily,
    ) -> Result<Box<dyn Matcher>, FeatureError> {
        match kind {
            MatcherKind::BruteForce => Ok(Box::new(BruteForceMatcher::new(selector, family))),
            MatcherKind::Flann => Err(FeatureError::Unsupported(format!("{} matcher", kind))),
        }
    }
}
