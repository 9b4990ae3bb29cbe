use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_loader::IndexedSequence;
use crate::filter::Region;
use crate::frame::WindowError;
use crate::types::{DescriptorKind, DetectorKind, MatcherKind, SelectorKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("window capacity must be at least 2 to match frames, got {0}")]
    WindowTooSmall(usize),
    #[error("image index range {start}..={end} is empty")]
    EmptyRange { start: usize, end: usize },
    #[error(transparent)]
    Window(#[from] WindowError),
}

/// Where the frames come from and what to sweep over them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub image_base_path: PathBuf,
    pub image_prefix: String,
    pub image_extension: String,
    pub start_index: usize,
    /// Inclusive.
    pub end_index: usize,
    /// Digits of the zero-padded index.
    pub fill_width: usize,
    pub window_capacity: usize,
    pub detectors: Vec<DetectorKind>,
    pub descriptors: Vec<DescriptorKind>,
    pub matcher: MatcherKind,
    pub selector: SelectorKind,
    pub region: Option<Region>,
    pub keypoint_limit: Option<usize>,
    pub parallel: bool,
    pub top_n: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            image_base_path: PathBuf::from("../images/"),
            image_prefix: "KITTI/2011_09_26/image_00/data/000000".to_string(),
            image_extension: ".png".to_string(),
            start_index: 0,
            end_index: 9,
            fill_width: 4,
            window_capacity: 2,
            detectors: DetectorKind::ALL.to_vec(),
            descriptors: DescriptorKind::ALL.to_vec(),
            matcher: MatcherKind::BruteForce,
            selector: SelectorKind::NearestNeighbor,
            region: None,
            keypoint_limit: None,
            parallel: false,
            top_n: 3,
        }
    }
}

impl BenchmarkConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<BenchmarkConfig, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: BenchmarkConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_capacity < 2 {
            return Err(ConfigError::WindowTooSmall(self.window_capacity));
        }
        if self.end_index < self.start_index {
            return Err(ConfigError::EmptyRange {
                start: self.start_index,
                end: self.end_index,
            });
        }
        Ok(())
    }

    pub fn image_sequence(&self) -> IndexedSequence {
        IndexedSequence {
            base: self.image_base_path.clone(),
            prefix: self.image_prefix.clone(),
            extension: self.image_extension.clone(),
            start_index: self.start_index,
            end_index: self.end_index,
            fill_width: self.fill_width,
        }
    }
}
