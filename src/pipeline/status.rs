//! Per-frame tracking bookkeeping exposed to consumers.
//!
//! Counters and rolling averages over the incoming frame stream: instant and
//! averaged FPS (computed from frame timestamps, not the wall clock), rolling
//! processing time, per-hand detection info and a sticky last-error slot.

use std::collections::{HashMap, VecDeque};

use crate::pipeline::frame::{Frame, Handedness};

const AVERAGE_WINDOW: usize = 30;

/// Detection info for one hand in the latest frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandInfo {
    pub detected: bool,
    pub confidence: f64,
    pub landmark_count: usize,
}

/// Snapshot of the pipeline's tracking state, cheap to clone and publish.
#[derive(Debug, Clone, Default)]
pub struct TrackingStatus {
    pub detecting: bool,
    pub frame_count: u64,
    pub fps: f64,
    pub average_fps: f64,
    pub average_processing_ms: f64,
    pub last_frame_ms: f64,
    pub hands: HashMap<Handedness, HandInfo>,
    pub error: Option<String>,
}

impl TrackingStatus {
    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }

    pub fn has_hand(&self, side: Handedness) -> bool {
        self.hands.contains_key(&side)
    }

    pub fn is_hand_confident(&self, side: Handedness, min_confidence: f64) -> bool {
        self.hands
            .get(&side)
            .map_or(false, |info| info.confidence >= min_confidence)
    }
}

/// Maintains the [`TrackingStatus`] across frames.
pub struct StatusTracker {
    status: TrackingStatus,
    fps_history: VecDeque<f64>,
    processing_history: VecDeque<f64>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            status: TrackingStatus::default(),
            fps_history: VecDeque::new(),
            processing_history: VecDeque::new(),
        }
    }

    pub fn status(&self) -> &TrackingStatus {
        &self.status
    }

    pub fn start_detection(&mut self) {
        self.status.detecting = true;
        self.status.frame_count = 0;
        self.status.error = None;
    }

    pub fn stop_detection(&mut self) {
        self.status.detecting = false;
        self.status.hands.clear();
    }

    /// Updates counters and per-hand info from an incoming frame.
    pub fn begin_frame(&mut self, frame: &Frame) {
        self.status.frame_count += 1;

        if self.status.frame_count > 1 {
            let delta = frame.timestamp_ms - self.status.last_frame_ms;
            if delta > 0.0 {
                let fps = 1000.0 / delta;
                self.status.fps = fps;
                self.fps_history.push_back(fps);
                while self.fps_history.len() > AVERAGE_WINDOW {
                    self.fps_history.pop_front();
                }
                self.status.average_fps =
                    self.fps_history.iter().sum::<f64>() / self.fps_history.len() as f64;
            }
        }
        self.status.last_frame_ms = frame.timestamp_ms;

        self.status.hands.clear();
        for hand in &frame.hands {
            self.status.hands.insert(
                hand.handedness,
                HandInfo {
                    detected: true,
                    confidence: hand.confidence,
                    landmark_count: hand.landmarks.len(),
                },
            );
        }
    }

    /// Records how long one processing turn took.
    pub fn record_processing(&mut self, elapsed_ms: f64) {
        self.processing_history.push_back(elapsed_ms);
        while self.processing_history.len() > AVERAGE_WINDOW {
            self.processing_history.pop_front();
        }
        self.status.average_processing_ms =
            self.processing_history.iter().sum::<f64>() / self.processing_history.len() as f64;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.status.error = None;
    }

    pub fn reset(&mut self) {
        self.status = TrackingStatus::default();
        self.fps_history.clear();
        self.processing_history.clear();
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::{Hand, Landmark};

    fn frame_at(ts: f64, hands: Vec<Hand>) -> Frame {
        Frame::new(hands, ts)
    }

    fn right_hand(confidence: f64) -> Hand {
        Hand {
            landmarks: vec![Landmark::default(); 21],
            handedness: Handedness::Right,
            confidence,
        }
    }

    #[test]
    fn fps_comes_from_frame_timestamps() {
        let mut tracker = StatusTracker::new();
        tracker.begin_frame(&frame_at(1000.0, vec![]));
        assert_eq!(tracker.status().fps, 0.0);

        tracker.begin_frame(&frame_at(1050.0, vec![]));
        assert!((tracker.status().fps - 20.0).abs() < 1e-9);
        assert_eq!(tracker.status().frame_count, 2);
    }

    #[test]
    fn rolling_averages_are_bounded() {
        let mut tracker = StatusTracker::new();
        for i in 0..100 {
            tracker.begin_frame(&frame_at(i as f64 * 50.0, vec![]));
            tracker.record_processing(2.0);
        }
        assert!((tracker.status().average_fps - 20.0).abs() < 1e-9);
        assert!((tracker.status().average_processing_ms - 2.0).abs() < 1e-9);
        assert_eq!(tracker.fps_history.len(), AVERAGE_WINDOW);
    }

    #[test]
    fn hand_info_follows_the_latest_frame() {
        let mut tracker = StatusTracker::new();
        tracker.begin_frame(&frame_at(0.0, vec![right_hand(0.9)]));
        assert!(tracker.status().has_hand(Handedness::Right));
        assert!(tracker.status().is_hand_confident(Handedness::Right, 0.7));
        assert!(!tracker.status().is_hand_confident(Handedness::Left, 0.1));

        tracker.begin_frame(&frame_at(50.0, vec![]));
        assert_eq!(tracker.status().hand_count(), 0);
    }
}
