use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;

use image::GrayImage;
use thiserror::Error;

use crate::types::{DescriptorFamily, Descriptors, Keypoint, Match};

/// Time value marking a stage that failed or was never reached.
pub const SENTINEL_TIME: f64 = -1.0;

/// One image pushed through the pipeline together with everything computed for it.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: Arc<GrayImage>,
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Descriptors,
    /// Matches against the previous frame in the window.
    pub matches: Vec<Match>,
    /// Whether the match stage completed for this frame.
    pub match_ran: bool,
    /// Seconds, or [`SENTINEL_TIME`].
    pub detection_time: f64,
    /// Seconds, or [`SENTINEL_TIME`].
    pub description_time: f64,
}

impl Frame {
    pub fn new(image: Arc<GrayImage>) -> Frame {
        Frame {
            image,
            keypoints: Vec::new(),
            descriptors: Descriptors::empty(DescriptorFamily::Binary),
            matches: Vec::new(),
            match_ran: false,
            detection_time: SENTINEL_TIME,
            description_time: SENTINEL_TIME,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("frame window capacity must be at least 1")]
    ZeroCapacity,
}

/// Fixed capacity FIFO of the most recent frames.
#[derive(Debug)]
pub struct FrameWindow {
    capacity: usize,
    frames: VecDeque<Frame>,
}

impl FrameWindow {
    pub fn new(capacity: usize) -> Result<FrameWindow, WindowError> {
        NonZeroUsize::new(capacity)
            .map(FrameWindow::with_capacity)
            .ok_or(WindowError::ZeroCapacity)
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> FrameWindow {
        let capacity = capacity.get();
        FrameWindow {
            capacity,
            frames: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Appends `frame`, returning the evicted oldest frame once the window is over capacity.
    pub fn push(&mut self, frame: Frame) -> Option<Frame> {
        self.frames.push_back(frame);
        if self.frames.len() > self.capacity {
            self.frames.pop_front()
        } else {
            None
        }
    }

    pub fn current(&self) -> Option<&Frame> {
        self.frames.back()
    }

    pub fn current_mut(&mut self) -> Option<&mut Frame> {
        self.frames.back_mut()
    }

    /// The frame pushed before [`FrameWindow::current`].
    pub fn previous(&self) -> Option<&Frame> {
        let n = self.frames.len();
        if n < 2 { None } else { self.frames.get(n - 2) }
    }

    /// Previous and current frame, the latter mutable.
    pub fn pair_mut(&mut self) -> Option<(&Frame, &mut Frame)> {
        let n = self.frames.len();
        if n < 2 {
            return None;
        }
        let (front, back) = self.frames.as_mut_slices();
        // VecDeque may wrap, so the last two elements can straddle both slices.
        match back.len() {
            0 => {
                let (head, tail) = front.split_at_mut(n - 1);
                Some((&head[n - 2], &mut tail[0]))
            }
            1 => Some((&front[front.len() - 1], &mut back[0])),
            m => {
                let (head, tail) = back.split_at_mut(m - 1);
                Some((&head[m - 2], &mut tail[0]))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> Frame {
        Frame::new(Arc::new(GrayImage::from_pixel(1, 1, image::Luma([tag]))))
    }

    fn tag(f: &Frame) -> u8 {
        f.image.get_pixel(0, 0).0[0]
    }

    #[test]
    fn pair_mut_survives_wraparound() {
        let mut window = FrameWindow::new(2).unwrap();
        for i in 0..7u8 {
            window.push(frame(i));
            if let Some((prev, cur)) = window.pair_mut() {
                assert_eq!(tag(prev) + 1, tag(cur));
                cur.matches.clear();
            }
        }
        assert_eq!(tag(window.current().unwrap()), 6);
    }

    #[test]
    fn fresh_frame_has_sentinels() {
        let f = frame(0);
        assert_eq!(f.detection_time, SENTINEL_TIME);
        assert_eq!(f.description_time, SENTINEL_TIME);
        assert!(!f.match_ran);
    }
}
