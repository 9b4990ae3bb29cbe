//! Detect, filter, describe and match for the newest frame of a window.
//!
//! Each stage reports failure as a value. The frame keeps whatever was computed
//! before the failing stage and sentinel times for the rest.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{DescriptorExtractor, Detector, FeatureError, FeatureFactory, Matcher};
use crate::filter::{CapPolicy, Region, filter_to_region, retain_best};
use crate::frame::{Frame, FrameWindow, SENTINEL_TIME};
use crate::types::{Configuration, MatcherKind, SelectorKind};

/// Optional keypoint filters applied between detection and description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Keep only keypoints inside this rectangle.
    pub region: Option<Region>,
    /// Keep at most this many keypoints.
    pub keypoint_limit: Option<usize>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("frame window is empty")]
    EmptyWindow,
    #[error("keypoint detection with {configuration} failed: {source}")]
    Detect {
        configuration: Configuration,
        source: FeatureError,
    },
    #[error("description step failed for {configuration}: {source}")]
    Describe {
        configuration: Configuration,
        source: FeatureError,
    },
    #[error("not enough keypoints to match (previous {previous}, current {current})")]
    EmptyKeypoints { previous: usize, current: usize },
    #[error("descriptor widths differ (previous {previous}, current {current})")]
    DescriptorWidthMismatch { previous: usize, current: usize },
    #[error("matching failed for {configuration}: {source}")]
    Match {
        configuration: Configuration,
        source: FeatureError,
    },
}

impl PipelineError {
    /// Precondition violations are detected before the matcher is invoked.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            PipelineError::EmptyKeypoints { .. } | PipelineError::DescriptorWidthMismatch { .. }
        )
    }
}

pub struct PairPipeline {
    configuration: Configuration,
    detector: Box<dyn Detector>,
    descriptor: Box<dyn DescriptorExtractor>,
    matcher: Box<dyn Matcher>,
    options: PipelineOptions,
    cap_policy: CapPolicy,
}

impl PairPipeline {
    pub fn new(
        configuration: Configuration,
        detector: Box<dyn Detector>,
        descriptor: Box<dyn DescriptorExtractor>,
        matcher: Box<dyn Matcher>,
        options: PipelineOptions,
    ) -> PairPipeline {
        PairPipeline {
            configuration,
            detector,
            descriptor,
            matcher,
            options,
            cap_policy: CapPolicy::for_detector(configuration.detector),
        }
    }

    /// Constructs the collaborators for `configuration` through `factory`.
    pub fn build<F: FeatureFactory + ?Sized>(
        factory: &F,
        configuration: Configuration,
        matcher: MatcherKind,
        selector: SelectorKind,
        options: PipelineOptions,
    ) -> Result<PairPipeline, FeatureError> {
        let detector = factory.detector(configuration.detector)?;
        let descriptor = factory.descriptor(configuration.descriptor)?;
        let matcher = factory.matcher(matcher, selector, descriptor.family())?;
        Ok(PairPipeline::new(
            configuration,
            detector,
            descriptor,
            matcher,
            options,
        ))
    }

    pub fn configuration(&self) -> Configuration {
        self.configuration
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Runs every stage on the current frame and, once a previous frame exists, matches the two.
    pub fn process(&self, window: &mut FrameWindow) -> Result<(), PipelineError> {
        let frame = window.current_mut().ok_or(PipelineError::EmptyWindow)?;
        self.detect_and_describe(frame)?;
        if let Some((previous, current)) = window.pair_mut() {
            self.match_pair(previous, current)?;
        }
        Ok(())
    }

    fn detect_and_describe(&self, frame: &mut Frame) -> Result<(), PipelineError> {
        let detection = match self.detector.detect(&frame.image) {
            Ok(d) => d,
            Err(source) => {
                log::warn!(
                    "Keypoint detection with {} failed: {}",
                    self.configuration.detector,
                    source
                );
                frame.detection_time = SENTINEL_TIME;
                frame.keypoints.clear();
                return Err(PipelineError::Detect {
                    configuration: self.configuration,
                    source,
                });
            }
        };
        frame.detection_time = detection.elapsed.as_secs_f64();
        let mut keypoints = detection.value;
        log::trace!("{}: {} keypoints detected", self.configuration, keypoints.len());

        if let Some(region) = &self.options.region {
            keypoints = filter_to_region(keypoints, region);
        }
        if let Some(limit) = self.options.keypoint_limit {
            keypoints = retain_best(keypoints, limit, self.cap_policy);
        }

        let description = self.descriptor.describe(&frame.image, &mut keypoints);
        frame.keypoints = keypoints;
        match description {
            Ok(d) => {
                frame.description_time = d.elapsed.as_secs_f64();
                frame.descriptors = d.value;
                Ok(())
            }
            Err(source) => {
                log::warn!(
                    "Descriptor step failed for the combination of {} keypoints and {} descriptors: {}",
                    self.configuration.detector,
                    self.configuration.descriptor,
                    source
                );
                frame.description_time = SENTINEL_TIME;
                Err(PipelineError::Describe {
                    configuration: self.configuration,
                    source,
                })
            }
        }
    }

    fn match_pair(&self, previous: &Frame, current: &mut Frame) -> Result<(), PipelineError> {
        if previous.keypoints.is_empty() || current.keypoints.is_empty() {
            log::warn!("{}: not enough keypoints detected, skipping", self.configuration);
            return Err(PipelineError::EmptyKeypoints {
                previous: previous.keypoints.len(),
                current: current.keypoints.len(),
            });
        }
        if previous.descriptors.width() != current.descriptors.width() {
            log::warn!("{}: mismatch between descriptor sizes, skipping", self.configuration);
            return Err(PipelineError::DescriptorWidthMismatch {
                previous: previous.descriptors.width(),
                current: current.descriptors.width(),
            });
        }
        match self
            .matcher
            .match_descriptors(&previous.descriptors, &current.descriptors)
        {
            Ok(matches) => {
                log::trace!("{}: {} matches", self.configuration, matches.len());
                current.matches = matches;
                current.match_ran = true;
                Ok(())
            }
            Err(source) => {
                log::warn!("{}: matching failed: {}", self.configuration, source);
                Err(PipelineError::Match {
                    configuration: self.configuration,
                    source,
                })
            }
        }
    }
}
