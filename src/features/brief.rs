// Binary intensity comparison descriptors: BRIEF and its steered variant used by ORB.

use image::GrayImage;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::orb::{ORB_PATCH_SIZE, intensity_centroid_angle};
use super::{DescriptorExtractor, FeatureError, Timed};
use crate::types::{DescriptorFamily, Descriptors, Keypoint};

/// Descriptor length in bytes (256 tests).
pub const BRIEF_BYTES: usize = 32;

/// Point pairs compared by one descriptor, relative to the keypoint.
#[derive(Debug, Clone)]
pub struct TestPattern {
    pub pairs: Vec<[(f32, f32); 2]>,
    /// Largest distance of any sample from the keypoint.
    pub radius: f32,
}

impl TestPattern {
    /// Uniform samples inside a disc, reproducible for a given `seed`.
    pub fn sample(seed: u64, radius: i32, bytes: usize) -> TestPattern {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut point = || loop {
            let x = rng.random_range(-radius..=radius);
            let y = rng.random_range(-radius..=radius);
            if x * x + y * y <= radius * radius {
                return (x as f32, y as f32);
            }
        };
        let pairs = (0..bytes * 8).map(|_| [point(), point()]).collect();
        TestPattern {
            pairs,
            radius: radius as f32,
        }
    }
}

/// Image box-filtered with a `(2 * radius + 1)^2` window.
struct Smoothed {
    width: i32,
    height: i32,
    data: Vec<f32>,
}

impl Smoothed {
    fn new(image: &GrayImage, radius: i32) -> Smoothed {
        let (w, h) = (image.width() as i32, image.height() as i32);
        let stride = (w + 1) as usize;
        let mut integral = vec![0.0f64; stride * (h + 1) as usize];
        for y in 0..h {
            let mut row = 0.0f64;
            for x in 0..w {
                row += image.get_pixel(x as u32, y as u32).0[0] as f64;
                let i = (y + 1) as usize * stride + (x + 1) as usize;
                integral[i] = integral[i - stride] + row;
            }
        }
        let mut data = vec![0.0f32; (w * h) as usize];
        for y in 0..h {
            for x in 0..w {
                let x0 = (x - radius).max(0) as usize;
                let y0 = (y - radius).max(0) as usize;
                let x1 = (x + radius + 1).min(w) as usize;
                let y1 = (y + radius + 1).min(h) as usize;
                let sum = integral[y1 * stride + x1] - integral[y0 * stride + x1]
                    - integral[y1 * stride + x0]
                    + integral[y0 * stride + x0];
                data[(y * w) as usize + x as usize] = (sum / ((x1 - x0) * (y1 - y0)) as f64) as f32;
            }
        }
        Smoothed {
            width: w,
            height: h,
            data,
        }
    }

    fn at(&self, x: f32, y: f32) -> f32 {
        let xi = (x.round() as i32).clamp(0, self.width - 1);
        let yi = (y.round() as i32).clamp(0, self.height - 1);
        self.data[(yi * self.width + xi) as usize]
    }

    fn contains(&self, kp: &Keypoint, margin: f32) -> bool {
        kp.pt.x - margin >= 0.0
            && kp.pt.y - margin >= 0.0
            && kp.pt.x + margin < self.width as f32
            && kp.pt.y + margin < self.height as f32
    }
}

fn describe_with(
    image: &GrayImage,
    keypoints: &mut Vec<Keypoint>,
    pattern: &TestPattern,
    smoothing_radius: i32,
    steered: bool,
) -> Vec<u8> {
    let smoothed = Smoothed::new(image, smoothing_radius);
    let margin = pattern.radius + 1.0;
    keypoints.retain(|kp| smoothed.contains(kp, margin));
    let bytes = pattern.pairs.len() / 8;
    let mut data = Vec::with_capacity(keypoints.len() * bytes);
    for kp in keypoints.iter_mut() {
        let (sin, cos) = if steered {
            let angle = match kp.angle {
                Some(a) => a,
                None => {
                    let a = intensity_centroid_angle(
                        image,
                        kp.pt.x as i32,
                        kp.pt.y as i32,
                        (ORB_PATCH_SIZE / 2) as i32,
                    );
                    kp.angle = Some(a);
                    a
                }
            };
            angle.sin_cos()
        } else {
            (0.0, 1.0)
        };
        let rotate = |(px, py): (f32, f32)| (kp.pt.x + cos * px - sin * py, kp.pt.y + sin * px + cos * py);
        for chunk in pattern.pairs.chunks(8) {
            let mut byte = 0u8;
            for (bit, [p, q]) in chunk.iter().enumerate() {
                let (ax, ay) = rotate(*p);
                let (bx, by) = rotate(*q);
                if smoothed.at(ax, ay) < smoothed.at(bx, by) {
                    byte |= 1 << bit;
                }
            }
            data.push(byte);
        }
    }
    data
}

/// Unsteered BRIEF over a 48 pixel patch.
#[derive(Debug, Clone)]
pub struct BriefDescriptor {
    pattern: TestPattern,
    pub smoothing_radius: i32,
}

impl Default for BriefDescriptor {
    fn default() -> Self {
        BriefDescriptor {
            pattern: TestPattern::sample(0xB81E, 24, BRIEF_BYTES),
            smoothing_radius: 2,
        }
    }
}

impl DescriptorExtractor for BriefDescriptor {
    fn describe(
        &self,
        image: &GrayImage,
        keypoints: &mut Vec<Keypoint>,
    ) -> Result<Timed<Descriptors>, FeatureError> {
        Timed::measure(|| {
            let data = describe_with(image, keypoints, &self.pattern, self.smoothing_radius, false);
            Descriptors::binary(BRIEF_BYTES, data)
                .ok_or_else(|| FeatureError::Internal("ragged BRIEF descriptor matrix".to_string()))
        })
    }

    fn family(&self) -> DescriptorFamily {
        DescriptorFamily::Binary
    }
}

/// BRIEF rotated by the keypoint orientation. Keypoints without an angle get one from the
/// intensity centroid.
#[derive(Debug, Clone)]
pub struct OrbDescriptor {
    pattern: TestPattern,
    pub smoothing_radius: i32,
}

impl Default for OrbDescriptor {
    fn default() -> Self {
        OrbDescriptor {
            pattern: TestPattern::sample(0x0DB, (ORB_PATCH_SIZE / 2) as i32, BRIEF_BYTES),
            smoothing_radius: 2,
        }
    }
}

impl DescriptorExtractor for OrbDescriptor {
    fn describe(
        &self,
        image: &GrayImage,
        keypoints: &mut Vec<Keypoint>,
    ) -> Result<Timed<Descriptors>, FeatureError> {
        Timed::measure(|| {
            let data = describe_with(image, keypoints, &self.pattern, self.smoothing_radius, true);
            Descriptors::binary(BRIEF_BYTES, data)
                .ok_or_else(|| FeatureError::Internal("ragged ORB descriptor matrix".to_string()))
        })
    }

    fn family(&self) -> DescriptorFamily {
        DescriptorFamily::Binary
    }
}
