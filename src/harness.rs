use std::num::NonZeroUsize;
use std::sync::Arc;

use image::GrayImage;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressIterator};
use rayon::prelude::*;

use crate::compatibility::CompatibilityPolicy;
use crate::config::{BenchmarkConfig, ConfigError};
use crate::features::FeatureFactory;
use crate::frame::{Frame, FrameWindow, WindowError};
use crate::pipeline::{PairPipeline, PipelineOptions};
use crate::summary::{Measurement, Summary};
use crate::types::{Configuration, DescriptorKind, DetectorKind, MatcherKind, SelectorKind};

/// Sweeps detector x descriptor configurations over a fixed frame sequence.
///
/// Every configuration gets its own window and summary; nothing is shared between
/// configurations except the read-only images.
pub struct BenchmarkHarness<F: FeatureFactory> {
    factory: F,
    policy: CompatibilityPolicy,
    detectors: Vec<DetectorKind>,
    descriptors: Vec<DescriptorKind>,
    matcher: MatcherKind,
    selector: SelectorKind,
    options: PipelineOptions,
    window_capacity: NonZeroUsize,
    parallel: bool,
    show_progress: bool,
}

impl<F: FeatureFactory> BenchmarkHarness<F> {
    pub fn new(factory: F) -> Self {
        BenchmarkHarness {
            factory,
            policy: CompatibilityPolicy::reference(),
            detectors: DetectorKind::ALL.to_vec(),
            descriptors: DescriptorKind::ALL.to_vec(),
            matcher: MatcherKind::BruteForce,
            selector: SelectorKind::NearestNeighbor,
            options: PipelineOptions::default(),
            window_capacity: NonZeroUsize::MIN.saturating_add(1),
            parallel: false,
            show_progress: false,
        }
    }

    /// Fails when `config` does not validate.
    pub fn from_config(factory: F, config: &BenchmarkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let harness = BenchmarkHarness::new(factory)
            .with_kinds(config.detectors.clone(), config.descriptors.clone())
            .with_matcher(config.matcher, config.selector)
            .with_options(PipelineOptions {
                region: config.region,
                keypoint_limit: config.keypoint_limit,
            })
            .with_window_capacity(config.window_capacity)?
            .with_parallel(config.parallel);
        Ok(harness)
    }

    pub fn with_policy(mut self, policy: CompatibilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_kinds(mut self, detectors: Vec<DetectorKind>, descriptors: Vec<DescriptorKind>) -> Self {
        self.detectors = detectors;
        self.descriptors = descriptors;
        self
    }

    pub fn with_matcher(mut self, matcher: MatcherKind, selector: SelectorKind) -> Self {
        self.matcher = matcher;
        self.selector = selector;
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_window_capacity(mut self, capacity: usize) -> Result<Self, WindowError> {
        self.window_capacity = NonZeroUsize::new(capacity).ok_or(WindowError::ZeroCapacity)?;
        Ok(self)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// The configurations `run` will process, in order.
    pub fn configurations(&self) -> Vec<Configuration> {
        self.policy
            .runnable_configurations(&self.detectors, &self.descriptors)
    }

    /// One summary per runnable configuration, in enumeration order.
    pub fn run(&self, frames: &[Arc<GrayImage>]) -> Vec<Summary> {
        let configurations = self.configurations();
        log::info!(
            "running {} configurations over {} frames",
            configurations.len(),
            frames.len()
        );
        let bar = if self.show_progress {
            ProgressBar::new(configurations.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if self.parallel {
            // Indexed collect keeps enumeration order regardless of completion order.
            configurations
                .par_iter()
                .progress_with(bar)
                .map(|c| self.run_configuration(*c, frames))
                .collect()
        } else {
            configurations
                .iter()
                .progress_with(bar)
                .map(|c| self.run_configuration(*c, frames))
                .collect()
        }
    }

    /// Streams `frames` through a fresh window for `configuration`.
    ///
    /// Only frames whose pipeline succeeded are recorded. A configuration whose
    /// collaborators cannot be built yields an empty summary.
    pub fn run_configuration(
        &self,
        configuration: Configuration,
        frames: &[Arc<GrayImage>],
    ) -> Summary {
        let mut summary = Summary::new(configuration);
        let mut window = FrameWindow::with_capacity(self.window_capacity);
        let pipeline = match PairPipeline::build(
            &self.factory,
            configuration,
            self.matcher,
            self.selector,
            self.options.clone(),
        ) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("{} is not runnable: {}", configuration, e);
                return summary;
            }
        };
        for (idx, image) in frames.iter().enumerate() {
            // Evicted frames are dropped here.
            window.push(Frame::new(Arc::clone(image)));
            match pipeline.process(&mut window) {
                Ok(()) => {
                    if let Some(frame) = window.current() {
                        summary.record(Measurement::from_frame(frame));
                    }
                }
                Err(e) => log::debug!("{} frame {}: {}", configuration, idx, e),
            }
        }
        log::info!(
            "{}: {}/{} frames succeeded, {:.1} keypoints, {:.1} matches",
            configuration,
            summary.measurements(),
            frames.len(),
            summary.mean_keypoint_count(),
            summary.mean_match_count()
        );
        summary
    }
}
