use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::glob;
use image::{GrayImage, ImageReader};
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("frame index {index} is out of range (sequence has {len} frames)")]
    OutOfRange { index: usize, len: usize },
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("no images found in {0}")]
    NoImages(PathBuf),
}

/// Ordered, finite sequence of grayscale frames.
pub trait FrameSource: Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-based position in the sequence.
    fn load(&self, index: usize) -> Result<GrayImage, LoadError>;
}

fn read_gray(path: &Path) -> Result<GrayImage, LoadError> {
    let img = ImageReader::open(path)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .decode()
        .map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(img.to_luma8())
}

/// Files named `base/prefix + zero-padded index + extension` over an inclusive index range.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedSequence {
    pub base: PathBuf,
    pub prefix: String,
    pub extension: String,
    pub start_index: usize,
    /// Inclusive.
    pub end_index: usize,
    pub fill_width: usize,
}

impl IndexedSequence {
    pub fn path(&self, index: usize) -> PathBuf {
        self.base.join(format!(
            "{}{:0width$}{}",
            self.prefix,
            self.start_index + index,
            self.extension,
            width = self.fill_width
        ))
    }
}

impl FrameSource for IndexedSequence {
    fn len(&self) -> usize {
        if self.end_index < self.start_index {
            0
        } else {
            self.end_index - self.start_index + 1
        }
    }

    fn load(&self, index: usize) -> Result<GrayImage, LoadError> {
        if index >= self.len() {
            return Err(LoadError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        read_gray(&self.path(index))
    }
}

/// Every `.png` / `.jpg` in a directory, sorted by path.
#[derive(Debug, Clone)]
pub struct DirectorySequence {
    paths: Vec<PathBuf>,
}

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        for ext in &[".png", ".jpg"] {
            if p.as_os_str().to_string_lossy().ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

impl DirectorySequence {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<DirectorySequence, LoadError> {
        let dir = dir.as_ref();
        let pattern = format!("{}/*", dir.display());
        let mut paths: Vec<PathBuf> = glob(&pattern)?.filter_map(img_filter).collect();
        if paths.is_empty() {
            return Err(LoadError::NoImages(dir.to_path_buf()));
        }
        paths.sort();
        log::trace!("found {} images in {}", paths.len(), dir.display());
        Ok(DirectorySequence { paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for DirectorySequence {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn load(&self, index: usize) -> Result<GrayImage, LoadError> {
        let path = self.paths.get(index).ok_or(LoadError::OutOfRange {
            index,
            len: self.paths.len(),
        })?;
        read_gray(path)
    }
}

/// Decodes the whole sequence once so every configuration can share the images.
pub fn load_frames<S: FrameSource + ?Sized>(source: &S) -> Result<Vec<Arc<GrayImage>>, LoadError> {
    (0..source.len())
        .into_par_iter()
        .progress_count(source.len() as u64)
        .map(|idx| source.load(idx).map(Arc::new))
        .collect()
}
