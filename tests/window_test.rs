use std::sync::Arc;

use image::{GrayImage, Luma};
use keypoint_benchmark::frame::{Frame, FrameWindow, WindowError};

fn frame(tag: u8) -> Frame {
    Frame::new(Arc::new(GrayImage::from_pixel(2, 2, Luma([tag]))))
}

fn tag(f: &Frame) -> u8 {
    f.image.get_pixel(0, 0).0[0]
}

#[test]
fn test_zero_capacity_is_rejected() {
    assert_eq!(FrameWindow::new(0).unwrap_err(), WindowError::ZeroCapacity);
}

#[test]
fn test_window_never_exceeds_capacity() {
    for capacity in 1..5 {
        let mut window = FrameWindow::new(capacity).unwrap();
        for i in 0..10u8 {
            let evicted = window.push(frame(i));
            assert!(window.len() <= capacity);
            assert_eq!(window.len(), (i as usize + 1).min(capacity));
            // The evicted frame is always the oldest one.
            if let Some(old) = evicted {
                assert_eq!(tag(&old) as usize, i as usize - capacity);
            }
        }
    }
}

#[test]
fn test_previous_absent_for_single_frame() {
    let mut window = FrameWindow::new(2).unwrap();
    assert!(window.current().is_none());
    assert!(window.previous().is_none());

    window.push(frame(1));
    assert_eq!(tag(window.current().unwrap()), 1);
    assert!(window.previous().is_none());
    assert!(window.pair_mut().is_none());

    window.push(frame(2));
    assert_eq!(tag(window.previous().unwrap()), 1);
    assert_eq!(tag(window.current().unwrap()), 2);
}

#[test]
fn test_capacity_one_has_no_pair() {
    let mut window = FrameWindow::new(1).unwrap();
    window.push(frame(1));
    window.push(frame(2));
    assert_eq!(window.len(), 1);
    assert!(window.previous().is_none());
}

#[test]
fn test_iter_is_oldest_first() {
    let mut window = FrameWindow::new(3).unwrap();
    for i in 0..5u8 {
        window.push(frame(i));
    }
    let tags: Vec<u8> = window.iter().map(tag).collect();
    assert_eq!(tags, vec![2, 3, 4]);

    window.clear();
    assert!(window.is_empty());
    assert_eq!(window.capacity(), 3);
}
