use serde::{Deserialize, Serialize};

use crate::types::{DetectorKind, Keypoint};

/// Axis aligned rectangle in pixel coordinates, half-open on the right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Region {
        Region {
            x,
            y,
            width,
            height,
        }
    }

    /// The preceding vehicle in the KITTI `2011_09_26` drive.
    pub fn vehicle() -> Region {
        Region::new(535.0, 180.0, 180.0, 150.0)
    }

    pub fn contains(&self, kp: &Keypoint) -> bool {
        kp.pt.x >= self.x
            && kp.pt.y >= self.y
            && kp.pt.x < self.x + self.width
            && kp.pt.y < self.y + self.height
    }
}

/// Keeps the keypoints inside `region`, preserving order.
pub fn filter_to_region(keypoints: Vec<Keypoint>, region: &Region) -> Vec<Keypoint> {
    keypoints
        .into_iter()
        .filter(|kp| region.contains(kp))
        .collect()
}

/// How to choose which keypoints survive a count limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapPolicy {
    /// Keep the highest responses.
    ByResponse,
    /// Input is already ordered best first; keep the leading keypoints.
    PreSorted,
}

impl CapPolicy {
    pub fn for_detector(kind: DetectorKind) -> CapPolicy {
        if kind.provides_response() {
            CapPolicy::ByResponse
        } else {
            CapPolicy::PreSorted
        }
    }
}

/// Retains at most `limit` keypoints according to `policy`.
///
/// `ByResponse` sorts stably, so equal responses keep their detection order.
pub fn retain_best(mut keypoints: Vec<Keypoint>, limit: usize, policy: CapPolicy) -> Vec<Keypoint> {
    if keypoints.len() <= limit {
        return keypoints;
    }
    if policy == CapPolicy::ByResponse {
        keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
    }
    keypoints.truncate(limit);
    keypoints
}
