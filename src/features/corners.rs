// Structure tensor corner detectors: Harris and Shi-Tomasi (minimum eigenvalue).

use image::GrayImage;

use super::nms::{OccupancyNms, local_maxima};
use super::{Detector, FeatureError, Timed};
use crate::types::Keypoint;

/// Smoothed gradient products `(Sxx, Syy, Sxy)` per pixel.
pub struct StructureTensor {
    pub width: u32,
    pub height: u32,
    pub sxx: Vec<f32>,
    pub syy: Vec<f32>,
    pub sxy: Vec<f32>,
}

impl StructureTensor {
    /// Sobel gradients summed over a `(2 * radius + 1)^2` box window.
    pub fn compute(image: &GrayImage, radius: u32) -> StructureTensor {
        let (w, h) = image.dimensions();
        let n = (w * h) as usize;
        let mut ixx = vec![0.0f32; n];
        let mut iyy = vec![0.0f32; n];
        let mut ixy = vec![0.0f32; n];
        let px = |x: u32, y: u32| image.get_pixel(x, y).0[0] as f32;
        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                let gx = (px(x + 1, y - 1) + 2.0 * px(x + 1, y) + px(x + 1, y + 1))
                    - (px(x - 1, y - 1) + 2.0 * px(x - 1, y) + px(x - 1, y + 1));
                let gy = (px(x - 1, y + 1) + 2.0 * px(x, y + 1) + px(x + 1, y + 1))
                    - (px(x - 1, y - 1) + 2.0 * px(x, y - 1) + px(x + 1, y - 1));
                let i = (y * w + x) as usize;
                ixx[i] = gx * gx;
                iyy[i] = gy * gy;
                ixy[i] = gx * gy;
            }
        }
        StructureTensor {
            width: w,
            height: h,
            sxx: box_sum(&ixx, w, h, radius),
            syy: box_sum(&iyy, w, h, radius),
            sxy: box_sum(&ixy, w, h, radius),
        }
    }

    pub fn harris(&self, i: usize, k: f32) -> f32 {
        let (a, b, c) = (self.sxx[i], self.syy[i], self.sxy[i]);
        let trace = a + b;
        a * b - c * c - k * trace * trace
    }

    pub fn min_eigenvalue(&self, i: usize) -> f32 {
        let (a, b, c) = (self.sxx[i], self.syy[i], self.sxy[i]);
        let half_diff = (a - b) * 0.5;
        (a + b) * 0.5 - (half_diff * half_diff + c * c).sqrt()
    }
}

/// Separable box sum with clamped borders.
fn box_sum(src: &[f32], w: u32, h: u32, radius: u32) -> Vec<f32> {
    let (w, h, r) = (w as i64, h as i64, radius as i64);
    let mut tmp = vec![0.0f32; src.len()];
    for y in 0..h {
        for x in 0..w {
            let mut s = 0.0;
            for dx in -r..=r {
                let xx = (x + dx).clamp(0, w - 1);
                s += src[(y * w + xx) as usize];
            }
            tmp[(y * w + x) as usize] = s;
        }
    }
    let mut out = vec![0.0f32; src.len()];
    for y in 0..h {
        for x in 0..w {
            let mut s = 0.0;
            for dy in -r..=r {
                let yy = (y + dy).clamp(0, h - 1);
                s += tmp[(yy * w + x) as usize];
            }
            out[(y * w + x) as usize] = s;
        }
    }
    out
}

/// Harris corners with responses above `quality * max_response`, thinned by 3x3 suppression.
#[derive(Debug, Clone)]
pub struct HarrisDetector {
    pub k: f32,
    pub block_radius: u32,
    pub quality: f32,
}

impl Default for HarrisDetector {
    fn default() -> Self {
        HarrisDetector {
            k: 0.04,
            block_radius: 1,
            quality: 0.01,
        }
    }
}

impl HarrisDetector {
    pub fn corners(&self, image: &GrayImage) -> Result<Vec<Keypoint>, FeatureError> {
        let (w, h) = image.dimensions();
        let border = self.block_radius + 2;
        if w <= 2 * border || h <= 2 * border {
            return Err(FeatureError::ImageTooSmall {
                width: w,
                height: h,
            });
        }
        let tensor = StructureTensor::compute(image, self.block_radius);
        let response: Vec<f32> = (0..(w * h) as usize)
            .map(|i| tensor.harris(i, self.k))
            .collect();
        let max = response.iter().cloned().fold(0.0f32, f32::max);
        if max <= 0.0 {
            return Ok(Vec::new());
        }
        let size = (2 * (2 * self.block_radius + 1)) as f32;
        let mut corners = Vec::new();
        for y in border..h - border {
            for x in border..w - border {
                let r = response[(y * w + x) as usize];
                if r > self.quality * max {
                    corners.push(Keypoint::new(x as f32, y as f32, size).with_response(r));
                }
            }
        }
        Ok(local_maxima(corners, w, h))
    }
}

impl Detector for HarrisDetector {
    fn detect(&self, image: &GrayImage) -> Result<Timed<Vec<Keypoint>>, FeatureError> {
        Timed::measure(|| self.corners(image))
    }
}

/// "Good features to track": strongest minimum-eigenvalue corners, at least `min_distance` apart.
///
/// Output is ordered by quality, strongest first. The response field is left at zero,
/// callers that need to cap the count should keep the leading keypoints.
#[derive(Debug, Clone)]
pub struct ShiTomasiDetector {
    pub block_radius: u32,
    pub quality: f32,
    pub min_distance: u32,
    /// Upper bound on returned corners, `None` for unbounded.
    pub max_corners: Option<usize>,
}

impl Default for ShiTomasiDetector {
    fn default() -> Self {
        ShiTomasiDetector {
            block_radius: 2,
            quality: 0.01,
            min_distance: 4,
            max_corners: None,
        }
    }
}

impl ShiTomasiDetector {
    pub fn corners(&self, image: &GrayImage) -> Result<Vec<Keypoint>, FeatureError> {
        let (w, h) = image.dimensions();
        let border = self.block_radius + 2;
        if w <= 2 * border || h <= 2 * border {
            return Err(FeatureError::ImageTooSmall {
                width: w,
                height: h,
            });
        }
        let tensor = StructureTensor::compute(image, self.block_radius);
        let eig: Vec<f32> = (0..(w * h) as usize)
            .map(|i| tensor.min_eigenvalue(i))
            .collect();
        let max = eig.iter().cloned().fold(0.0f32, f32::max);
        if max <= 0.0 {
            return Ok(Vec::new());
        }
        let size = (2 * self.block_radius) as f32;
        let mut candidates = Vec::new();
        for y in border..h - border {
            for x in border..w - border {
                let e = eig[(y * w + x) as usize];
                if e > self.quality * max {
                    candidates.push(Keypoint::new(x as f32, y as f32, size).with_response(e));
                }
            }
        }
        let mut corners = local_maxima(candidates, w, h);
        if self.min_distance > 1 {
            corners = OccupancyNms::new(self.min_distance).suppress(&corners, w, h);
        }
        corners.sort_by(|a, b| b.response.total_cmp(&a.response));
        if let Some(max_corners) = self.max_corners {
            corners.truncate(max_corners);
        }
        for kp in corners.iter_mut() {
            kp.response = 0.0;
        }
        Ok(corners)
    }
}

impl Detector for ShiTomasiDetector {
    fn detect(&self, image: &GrayImage) -> Result<Timed<Vec<Keypoint>>, FeatureError> {
        Timed::measure(|| self.corners(image))
    }
}
