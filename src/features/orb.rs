// Oriented FAST keypoints: FAST candidates ranked by Harris response, with
// intensity centroid orientation. Single scale, no pyramid.

use image::GrayImage;

use super::corners::StructureTensor;
use super::fast::FastDetector;
use super::nms::local_maxima;
use super::{Detector, FeatureError, Timed};
use crate::types::Keypoint;

/// Side length of the square patch ORB keypoints describe.
pub const ORB_PATCH_SIZE: u32 = 31;

#[derive(Debug, Clone)]
pub struct OrbDetector {
    pub n_features: usize,
    pub fast_threshold: u8,
    pub harris_k: f32,
}

impl Default for OrbDetector {
    fn default() -> Self {
        OrbDetector {
            n_features: 500,
            fast_threshold: 20,
            harris_k: 0.04,
        }
    }
}

impl OrbDetector {
    pub fn keypoints(&self, image: &GrayImage) -> Result<Vec<Keypoint>, FeatureError> {
        let (w, h) = image.dimensions();
        let half = ORB_PATCH_SIZE / 2;
        if w <= 2 * half + 1 || h <= 2 * half + 1 {
            return Err(FeatureError::ImageTooSmall {
                width: w,
                height: h,
            });
        }
        let fast = FastDetector {
            threshold: self.fast_threshold,
            arc_length: 9,
            non_max_suppression: false,
        };
        let candidates = local_maxima(fast.corners(image)?, w, h);
        let tensor = StructureTensor::compute(image, 3);
        let mut ranked: Vec<Keypoint> = candidates
            .into_iter()
            .filter(|kp| {
                let (x, y) = (kp.pt.x as u32, kp.pt.y as u32);
                x >= half && y >= half && x < w - half && y < h - half
            })
            .map(|mut kp| {
                let i = (kp.pt.y as u32 * w + kp.pt.x as u32) as usize;
                kp.response = tensor.harris(i, self.harris_k);
                kp.size = ORB_PATCH_SIZE as f32;
                kp
            })
            .collect();
        ranked.sort_by(|a, b| b.response.total_cmp(&a.response));
        ranked.truncate(self.n_features);
        for kp in ranked.iter_mut() {
            kp.angle = Some(intensity_centroid_angle(image, kp.pt.x as i32, kp.pt.y as i32, half as i32));
        }
        Ok(ranked)
    }
}

impl Detector for OrbDetector {
    fn detect(&self, image: &GrayImage) -> Result<Timed<Vec<Keypoint>>, FeatureError> {
        Timed::measure(|| self.keypoints(image))
    }
}

/// Angle of the vector from `(cx, cy)` to the intensity centroid of the disc of `radius`.
///
/// Pixels outside the image are skipped.
pub fn intensity_centroid_angle(image: &GrayImage, cx: i32, cy: i32, radius: i32) -> f32 {
    let (w, h) = (image.width() as i32, image.height() as i32);
    let mut m01 = 0.0f32;
    let mut m10 = 0.0f32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let v = image.get_pixel(x as u32, y as u32).0[0] as f32;
            m10 += dx as f32 * v;
            m01 += dy as f32 * v;
        }
    }
    m01.atan2(m10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_points_towards_bright_side() {
        let img = GrayImage::from_fn(41, 41, |x, _| image::Luma([if x > 20 { 255 } else { 0 }]));
        let angle = intensity_centroid_angle(&img, 20, 20, 15);
        assert!(angle.abs() < 1e-3, "angle {angle}");

        let img = GrayImage::from_fn(41, 41, |_, y| image::Luma([if y > 20 { 255 } else { 0 }]));
        let angle = intensity_centroid_angle(&img, 20, 20, 15);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-3, "angle {angle}");
    }

    #[test]
    fn keypoints_are_oriented_and_away_from_border() {
        let mut img = GrayImage::from_pixel(120, 120, image::Luma([20]));
        for y in 40..80 {
            for x in 40..80 {
                img.put_pixel(x, y, image::Luma([220]));
            }
        }
        let kps = OrbDetector::default().keypoints(&img).unwrap();
        assert!(!kps.is_empty());
        for kp in &kps {
            assert!(kp.angle.is_some());
            assert!(kp.pt.x >= 15.0 && kp.pt.x < 105.0);
        }
    }

    #[test]
    fn small_image_is_rejected() {
        let img = GrayImage::from_pixel(20, 20, image::Luma([0]));
        assert!(matches!(
            OrbDetector::default().detect(&img),
            Err(FeatureError::ImageTooSmall {
                width: 20,
                height: 20
            })
        ));
    }
}
