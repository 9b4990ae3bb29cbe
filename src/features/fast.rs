// FAST segment test corner detector (Rosten & Drummond, ECCV 2006).

use image::GrayImage;

use super::nms::local_maxima;
use super::{Detector, FeatureError, Timed};
use crate::types::Keypoint;

/// Bresenham circle of radius 3, clockwise from 12 o'clock.
pub(crate) const CIRCLE_OFFSETS: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Diameter reported for every FAST keypoint.
pub const FAST_KEYPOINT_SIZE: f32 = 7.0;

#[derive(Debug, Clone)]
pub struct FastDetector {
    /// Intensity difference a circle pixel needs to count as brighter or darker.
    pub threshold: u8,
    /// Contiguous arc length, used clamped to 9..=12.
    pub arc_length: usize,
    pub non_max_suppression: bool,
}

impl Default for FastDetector {
    fn default() -> Self {
        FastDetector {
            threshold: 30,
            arc_length: 9,
            non_max_suppression: true,
        }
    }
}

impl FastDetector {
    /// `arc_length` is clamped to `9..=12`.
    pub fn new(threshold: u8, arc_length: usize) -> Self {
        FastDetector {
            threshold,
            arc_length: arc_length.clamp(9, 12),
            non_max_suppression: true,
        }
    }

    /// Raw corners with their segment score, before suppression.
    pub fn corners(&self, image: &GrayImage) -> Result<Vec<Keypoint>, FeatureError> {
        let (w, h) = image.dimensions();
        if w <= 6 || h <= 6 {
            return Err(FeatureError::ImageTooSmall {
                width: w,
                height: h,
            });
        }
        let arc_length = self.arc_length.clamp(9, 12);
        let thresh = self.threshold as i16;
        let mut corners = Vec::new();
        for y in 3..h - 3 {
            for x in 3..w - 3 {
                let center = image.get_pixel(x, y).0[0] as i16;
                let mut circle = [0i16; 16];
                for (i, &(dx, dy)) in CIRCLE_OFFSETS.iter().enumerate() {
                    circle[i] = image
                        .get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)
                        .0[0] as i16;
                }
                if let Some(score) = segment_score(center, &circle, thresh, arc_length) {
                    corners.push(
                        Keypoint::new(x as f32, y as f32, FAST_KEYPOINT_SIZE).with_response(score),
                    );
                }
            }
        }
        Ok(corners)
    }
}

/// Summed contrast of the stronger qualifying side, `None` when no arc of `arc_length` exists.
fn segment_score(center: i16, circle: &[i16; 16], thresh: i16, arc_length: usize) -> Option<f32> {
    let mut bright: u16 = 0;
    let mut dark: u16 = 0;
    for (i, &v) in circle.iter().enumerate() {
        let diff = v - center;
        if diff > thresh {
            bright |= 1 << i;
        } else if diff < -thresh {
            dark |= 1 << i;
        }
    }
    let mut best: Option<f32> = None;
    for mask in [bright, dark] {
        if (mask.count_ones() as usize) < arc_length || !has_run(mask, arc_length) {
            continue;
        }
        let score: f32 = (0..16)
            .filter(|&i| mask & (1u16 << i) != 0)
            .map(|i| ((circle[i] - center).abs() - thresh).max(0) as f32)
            .sum();
        best = Some(best.map_or(score, |b| b.max(score)));
    }
    best
}

/// Whether the circular 16-bit mask holds `n` contiguous set bits.
fn has_run(mask: u16, n: usize) -> bool {
    let mut acc = (mask as u32) | ((mask as u32) << 16);
    for _ in 1..n {
        acc &= acc >> 1;
    }
    acc != 0
}

impl Detector for FastDetector {
    fn detect(&self, image: &GrayImage) -> Result<Timed<Vec<Keypoint>>, FeatureError> {
        Timed::measure(|| {
            let corners = self.corners(image)?;
            if self.non_max_suppression {
                Ok(local_maxima(corners, image.width(), image.height()))
            } else {
                Ok(corners)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_image(size: u32, center_val: u8, ring_val: u8) -> GrayImage {
        let mut img = GrayImage::from_pixel(size, size, image::Luma([center_val]));
        let c = (size / 2) as i32;
        for &(dx, dy) in &CIRCLE_OFFSETS {
            img.put_pixel((c + dx) as u32, (c + dy) as u32, image::Luma([ring_val]));
        }
        img
    }

    fn has_center(kps: &[Keypoint]) -> bool {
        kps.iter().any(|k| k.pt.x == 10.0 && k.pt.y == 10.0)
    }

    #[test]
    fn bright_ring_is_corner() {
        let img = ring_image(20, 50, 200);
        let corners = FastDetector::new(30, 9).corners(&img).unwrap();
        assert!(has_center(&corners));
    }

    #[test]
    fn flat_image_has_no_corners() {
        let img = GrayImage::from_pixel(20, 20, image::Luma([128]));
        let kps = FastDetector::default().detect(&img).unwrap().value;
        assert!(kps.is_empty());
    }

    #[test]
    fn threshold_rejects_low_contrast() {
        let img = ring_image(20, 100, 115);
        assert!(has_center(&FastDetector::new(10, 9).corners(&img).unwrap()));
        assert!(!has_center(&FastDetector::new(20, 9).corners(&img).unwrap()));
    }

    #[test]
    fn arc_length_matters() {
        let mut img = GrayImage::from_pixel(20, 20, image::Luma([100]));
        for &(dx, dy) in CIRCLE_OFFSETS.iter().take(10) {
            img.put_pixel((10 + dx) as u32, (10 + dy) as u32, image::Luma([200]));
        }
        assert!(has_center(&FastDetector::new(20, 9).corners(&img).unwrap()));
        assert!(!has_center(&FastDetector::new(20, 12).corners(&img).unwrap()));
    }

    #[test]
    fn tiny_image_is_rejected() {
        let img = GrayImage::new(6, 6);
        assert_eq!(
            FastDetector::default().detect(&img).unwrap_err(),
            FeatureError::ImageTooSmall {
                width: 6,
                height: 6
            }
        );
    }

    #[test]
    fn arc_length_is_clamped() {
        assert_eq!(FastDetector::new(20, 7).arc_length, 9);
        assert_eq!(FastDetector::new(20, 16).arc_length, 12);

        // A field set out of range behaves like the nearest valid length.
        let mut img = GrayImage::from_pixel(20, 20, image::Luma([100]));
        for &(dx, dy) in CIRCLE_OFFSETS.iter().take(10) {
            img.put_pixel((10 + dx) as u32, (10 + dy) as u32, image::Luma([200]));
        }
        let det = FastDetector {
            arc_length: 3,
            ..FastDetector::new(20, 9)
        };
        assert!(has_center(&det.corners(&img).unwrap()));
    }
}
