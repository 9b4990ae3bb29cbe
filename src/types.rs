use clap::ValueEnum;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keypoint detector families known to the benchmark. Declaration order is the sweep order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
pub enum DetectorKind {
    #[serde(rename = "SHITOMASI")]
    #[value(name = "SHITOMASI")]
    ShiTomasi,
    #[serde(rename = "HARRIS")]
    #[value(name = "HARRIS")]
    Harris,
    #[serde(rename = "FAST")]
    #[value(name = "FAST")]
    Fast,
    #[serde(rename = "BRISK")]
    #[value(name = "BRISK")]
    Brisk,
    #[serde(rename = "ORB")]
    #[value(name = "ORB")]
    Orb,
    #[serde(rename = "AKAZE")]
    #[value(name = "AKAZE")]
    Akaze,
    #[serde(rename = "SIFT")]
    #[value(name = "SIFT")]
    Sift,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 7] = [
        DetectorKind::ShiTomasi,
        DetectorKind::Harris,
        DetectorKind::Fast,
        DetectorKind::Brisk,
        DetectorKind::Orb,
        DetectorKind::Akaze,
        DetectorKind::Sift,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::ShiTomasi => "SHITOMASI",
            DetectorKind::Harris => "HARRIS",
            DetectorKind::Fast => "FAST",
            DetectorKind::Brisk => "BRISK",
            DetectorKind::Orb => "ORB",
            DetectorKind::Akaze => "AKAZE",
            DetectorKind::Sift => "SIFT",
        }
    }

    /// Whether keypoints from this detector carry an orientation.
    pub fn provides_orientation(&self) -> bool {
        matches!(
            self,
            DetectorKind::Brisk | DetectorKind::Orb | DetectorKind::Akaze | DetectorKind::Sift
        )
    }

    /// Whether keypoints carry a meaningful response score.
    ///
    /// Shi-Tomasi output is already ordered by quality but has no usable response.
    pub fn provides_response(&self) -> bool {
        !matches!(self, DetectorKind::ShiTomasi)
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Descriptor families known to the benchmark. Declaration order is the sweep order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
pub enum DescriptorKind {
    #[serde(rename = "BRISK")]
    #[value(name = "BRISK")]
    Brisk,
    #[serde(rename = "BRIEF")]
    #[value(name = "BRIEF")]
    Brief,
    #[serde(rename = "ORB")]
    #[value(name = "ORB")]
    Orb,
    #[serde(rename = "FREAK")]
    #[value(name = "FREAK")]
    Freak,
    #[serde(rename = "AKAZE")]
    #[value(name = "AKAZE")]
    Akaze,
    #[serde(rename = "SIFT")]
    #[value(name = "SIFT")]
    Sift,
}

impl DescriptorKind {
    pub const ALL: [DescriptorKind; 6] = [
        DescriptorKind::Brisk,
        DescriptorKind::Brief,
        DescriptorKind::Orb,
        DescriptorKind::Freak,
        DescriptorKind::Akaze,
        DescriptorKind::Sift,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DescriptorKind::Brisk => "BRISK",
            DescriptorKind::Brief => "BRIEF",
            DescriptorKind::Orb => "ORB",
            DescriptorKind::Freak => "FREAK",
            DescriptorKind::Akaze => "AKAZE",
            DescriptorKind::Sift => "SIFT",
        }
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum MatcherKind {
    /// Exhaustive nearest neighbour search.
    #[serde(rename = "MAT_BF")]
    #[value(name = "MAT_BF")]
    BruteForce,
    /// Approximate nearest neighbour search.
    #[serde(rename = "MAT_FLANN")]
    #[value(name = "MAT_FLANN")]
    Flann,
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatcherKind::BruteForce => "MAT_BF",
            MatcherKind::Flann => "MAT_FLANN",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum SelectorKind {
    /// Keep the single best candidate.
    #[serde(rename = "SEL_NN")]
    #[value(name = "SEL_NN")]
    NearestNeighbor,
    /// Two best candidates filtered by a distance ratio test.
    #[serde(rename = "SEL_KNN")]
    #[value(name = "SEL_KNN")]
    KNearest,
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SelectorKind::NearestNeighbor => "SEL_NN",
            SelectorKind::KNearest => "SEL_KNN",
        })
    }
}

/// One point of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Configuration {
    pub detector: DetectorKind,
    pub descriptor: DescriptorKind,
}

impl Configuration {
    pub fn new(detector: DetectorKind, descriptor: DescriptorKind) -> Configuration {
        Configuration {
            detector,
            descriptor,
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.detector, self.descriptor)
    }
}

/// A detected image location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub pt: Vec2,
    /// Diameter of the meaningful neighbourhood in pixels.
    pub size: f32,
    /// Orientation in radians, `None` when the detector does not estimate one.
    pub angle: Option<f32>,
    pub response: f32,
    pub octave: i32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, size: f32) -> Keypoint {
        Keypoint {
            pt: Vec2::new(x, y),
            size,
            angle: None,
            response: 0.0,
            octave: 0,
        }
    }

    pub fn with_response(mut self, response: f32) -> Keypoint {
        self.response = response;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Keypoint {
        self.angle = Some(angle);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptorFamily {
    /// Bit strings compared with the Hamming distance.
    Binary,
    /// Real vectors compared with the L2 distance.
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorData {
    Binary(Vec<u8>),
    Float(Vec<f32>),
}

/// Row-major descriptor matrix, one row per keypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptors {
    width: usize,
    data: DescriptorData,
}

impl Descriptors {
    pub fn empty(family: DescriptorFamily) -> Descriptors {
        let data = match family {
            DescriptorFamily::Binary => DescriptorData::Binary(Vec::new()),
            DescriptorFamily::Float => DescriptorData::Float(Vec::new()),
        };
        Descriptors { width: 0, data }
    }

    /// Returns `None` unless `data.len()` is a multiple of `width`.
    pub fn binary(width: usize, data: Vec<u8>) -> Option<Descriptors> {
        if (width == 0 && !data.is_empty()) || (width > 0 && data.len() % width != 0) {
            return None;
        }
        Some(Descriptors {
            width,
            data: DescriptorData::Binary(data),
        })
    }

    /// Returns `None` unless `data.len()` is a multiple of `width`.
    pub fn float(width: usize, data: Vec<f32>) -> Option<Descriptors> {
        if (width == 0 && !data.is_empty()) || (width > 0 && data.len() % width != 0) {
            return None;
        }
        Some(Descriptors {
            width,
            data: DescriptorData::Float(data),
        })
    }

    /// Column count.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        if self.width == 0 {
            return 0;
        }
        match &self.data {
            DescriptorData::Binary(d) => d.len() / self.width,
            DescriptorData::Float(d) => d.len() / self.width,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    pub fn family(&self) -> DescriptorFamily {
        match self.data {
            DescriptorData::Binary(_) => DescriptorFamily::Binary,
            DescriptorData::Float(_) => DescriptorFamily::Float,
        }
    }

    pub fn data(&self) -> &DescriptorData {
        &self.data
    }

    pub fn binary_row(&self, idx: usize) -> Option<&[u8]> {
        match &self.data {
            DescriptorData::Binary(d) if idx < self.rows() => {
                Some(&d[idx * self.width..(idx + 1) * self.width])
            }
            _ => None,
        }
    }

    pub fn float_row(&self, idx: usize) -> Option<&[f32]> {
        match &self.data {
            DescriptorData::Float(d) if idx < self.rows() => {
                Some(&d[idx * self.width..(idx + 1) * self.width])
            }
            _ => None,
        }
    }
}

/// Correspondence between a previous-frame keypoint (`query_idx`) and a current-frame keypoint (`train_idx`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}
