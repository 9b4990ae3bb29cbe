#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use image::{GrayImage, Luma};
use keypoint_benchmark::features::{
    DescriptorExtractor, Detector, FeatureError, FeatureFactory, Matcher, Timed,
};
use keypoint_benchmark::types::{
    DescriptorFamily, DescriptorKind, Descriptors, DetectorKind, Keypoint, Match, MatcherKind,
    SelectorKind,
};

pub const DETECT_TIME: Duration = Duration::from_millis(10);
pub const DESCRIBE_TIME: Duration = Duration::from_millis(20);

pub fn blank_frames(n: usize) -> Vec<Arc<GrayImage>> {
    (0..n)
        .map(|_| Arc::new(GrayImage::from_pixel(64, 48, Luma([128]))))
        .collect()
}

/// Returns `keypoints` after a fixed pretend duration.
pub struct StubDetector {
    pub keypoints: Vec<Keypoint>,
    pub fail: bool,
}

impl Detector for StubDetector {
    fn detect(&self, _image: &GrayImage) -> Result<Timed<Vec<Keypoint>>, FeatureError> {
        if self.fail {
            return Err(FeatureError::Internal("stub detector failure".to_string()));
        }
        Ok(Timed::new(self.keypoints.clone(), DETECT_TIME))
    }
}

/// Like [`StubDetector`] but fails only on the zero-based call `fail_on`.
pub struct FlakyDetector {
    pub keypoints: Vec<Keypoint>,
    pub fail_on: usize,
    pub calls: AtomicUsize,
}

impl Detector for FlakyDetector {
    fn detect(&self, _image: &GrayImage) -> Result<Timed<Vec<Keypoint>>, FeatureError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_on {
            return Err(FeatureError::Internal("flaky detector failure".to_string()));
        }
        Ok(Timed::new(self.keypoints.clone(), DETECT_TIME))
    }
}

/// One binary row of `width` bytes per keypoint.
pub struct StubDescriptor {
    pub width: usize,
    pub fail: bool,
}

impl DescriptorExtractor for StubDescriptor {
    fn describe(
        &self,
        _image: &GrayImage,
        keypoints: &mut Vec<Keypoint>,
    ) -> Result<Timed<Descriptors>, FeatureError> {
        if self.fail {
            return Err(FeatureError::Internal("stub descriptor failure".to_string()));
        }
        let data = vec![0u8; keypoints.len() * self.width];
        let descriptors = Descriptors::binary(self.width, data)
            .ok_or_else(|| FeatureError::Internal("ragged".to_string()))?;
        Ok(Timed::new(descriptors, DESCRIBE_TIME))
    }

    fn family(&self) -> DescriptorFamily {
        DescriptorFamily::Binary
    }
}

/// Reports `count` matches, or an error when `fail` is set.
pub struct StubMatcher {
    pub count: usize,
    pub fail: bool,
}

impl Matcher for StubMatcher {
    fn match_descriptors(
        &self,
        _query: &Descriptors,
        _train: &Descriptors,
    ) -> Result<Vec<Match>, FeatureError> {
        if self.fail {
            return Err(FeatureError::Internal("stub matcher failure".to_string()));
        }
        Ok((0..self.count)
            .map(|i| Match {
                query_idx: i,
                train_idx: i,
                distance: 0.0,
            })
            .collect())
    }
}

pub fn keypoints(n: usize) -> Vec<Keypoint> {
    (0..n)
        .map(|i| Keypoint::new(i as f32, i as f32, 7.0).with_response(i as f32))
        .collect()
}

/// Factory with deterministic timings: 10 ms detection, 20 ms description and 5 matches.
pub struct StubFactory {
    pub keypoint_count: usize,
    pub match_count: usize,
    pub descriptor_width: usize,
    pub unsupported_detectors: HashSet<DetectorKind>,
    pub failing_detectors: HashSet<DetectorKind>,
    /// Zero-based detector call that fails, for every detector built.
    pub fail_on_call: Option<usize>,
}

impl Default for StubFactory {
    fn default() -> Self {
        StubFactory {
            keypoint_count: 100,
            match_count: 5,
            descriptor_width: 32,
            unsupported_detectors: HashSet::new(),
            failing_detectors: HashSet::new(),
            fail_on_call: None,
        }
    }
}

impl FeatureFactory for StubFactory {
    fn detector(&self, kind: DetectorKind) -> Result<Box<dyn Detector>, FeatureError> {
        if self.unsupported_detectors.contains(&kind) {
            return Err(FeatureError::Unsupported(kind.to_string()));
        }
        if let Some(fail_on) = self.fail_on_call {
            return Ok(Box::new(FlakyDetector {
                keypoints: keypoints(self.keypoint_count),
                fail_on,
                calls: AtomicUsize::new(0),
            }));
        }
        Ok(Box::new(StubDetector {
            keypoints: keypoints(self.keypoint_count),
            fail: self.failing_detectors.contains(&kind),
        }))
    }

    fn descriptor(
        &self,
        _kind: DescriptorKind,
    ) -> Result<Box<dyn DescriptorExtractor>, FeatureError> {
        Ok(Box::new(StubDescriptor {
            width: self.descriptor_width,
            fail: false,
        }))
    }

    fn matcher(
        &self,
        _kind: MatcherKind,
        _selector: SelectorKind,
        _family: DescriptorFamily,
    ) -> Result<Box<dyn Matcher>, FeatureError> {
        Ok(Box::new(StubMatcher {
            count: self.match_count,
            fail: false,
        }))
    }
}
