use serde::Serialize;

use crate::frame::Frame;
use crate::types::Configuration;

/// What one successfully processed frame contributes to its configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub keypoint_count: usize,
    /// `None` when the frame had no predecessor to match against.
    pub match_count: Option<usize>,
    /// Seconds.
    pub detection_time: f64,
    /// Seconds.
    pub description_time: f64,
    pub keypoint_sizes: Vec<f32>,
}

impl Measurement {
    pub fn from_frame(frame: &Frame) -> Measurement {
        Measurement {
            keypoint_count: frame.keypoints.len(),
            match_count: frame.match_ran.then_some(frame.matches.len()),
            detection_time: frame.detection_time,
            description_time: frame.description_time,
            keypoint_sizes: frame.keypoints.iter().map(|kp| kp.size).collect(),
        }
    }
}

/// Running totals for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub configuration: Configuration,
    measurements: usize,
    match_samples: usize,
    keypoint_total: usize,
    match_total: usize,
    detection_time_total: f64,
    description_time_total: f64,
    #[serde(skip)]
    keypoint_sizes: Vec<f32>,
}

impl Summary {
    pub fn new(configuration: Configuration) -> Summary {
        Summary {
            configuration,
            measurements: 0,
            match_samples: 0,
            keypoint_total: 0,
            match_total: 0,
            detection_time_total: 0.0,
            description_time_total: 0.0,
            keypoint_sizes: Vec::new(),
        }
    }

    pub fn record(&mut self, measurement: Measurement) {
        self.measurements += 1;
        self.keypoint_total += measurement.keypoint_count;
        if let Some(matches) = measurement.match_count {
            self.match_samples += 1;
            self.match_total += matches;
        }
        self.detection_time_total += measurement.detection_time;
        self.description_time_total += measurement.description_time;
        self.keypoint_sizes.extend(measurement.keypoint_sizes);
    }

    /// Number of recorded measurements.
    pub fn measurements(&self) -> usize {
        self.measurements
    }

    /// Number of recorded measurements whose match stage ran.
    pub fn match_samples(&self) -> usize {
        self.match_samples
    }

    pub fn keypoint_sizes(&self) -> &[f32] {
        &self.keypoint_sizes
    }

    pub fn mean_keypoint_count(&self) -> f64 {
        mean(self.keypoint_total as f64, self.measurements)
    }

    /// Averaged over frames that were matched against a predecessor.
    pub fn mean_match_count(&self) -> f64 {
        mean(self.match_total as f64, self.match_samples)
    }

    /// Seconds.
    pub fn mean_detection_time(&self) -> f64 {
        mean(self.detection_time_total, self.measurements)
    }

    /// Seconds.
    pub fn mean_description_time(&self) -> f64 {
        mean(self.description_time_total, self.measurements)
    }

    /// Mean detection plus mean description time, in seconds.
    pub fn total_time(&self) -> f64 {
        self.mean_detection_time() + self.mean_description_time()
    }

    /// Seconds per match, `None` when no matches were made on average.
    pub fn time_per_match(&self) -> Option<f64> {
        let matches = self.mean_match_count();
        if matches > 0.0 {
            Some(self.total_time() / matches)
        } else {
            None
        }
    }
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}
