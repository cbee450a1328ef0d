//! Rescales each hand to a constant palm width.
//!
//! The scale reference is the 3D distance between the index knuckle
//! (landmark 5) and the pinky knuckle (landmark 17); all coordinates are
//! divided by four times that distance, which puts the palm width at 0.25 in
//! normalized units regardless of how close the hand is to the camera.

use crate::pipeline::frame::{Frame, INDEX_MCP, PINKY_MCP};
use crate::preprocess::Preprocessor;

pub struct NormalizePreprocessor {
    enabled: bool,
}

impl NormalizePreprocessor {
    pub fn new() -> Self {
        Self { enabled: true }
    }
}

impl Default for NormalizePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for NormalizePreprocessor {
    fn id(&self) -> &'static str {
        "normalize"
    }

    fn name(&self) -> &'static str {
        "Normalize Preprocessor"
    }

    fn description(&self) -> &'static str {
        "Scale each hand so the knuckle span between landmarks 5 and 17 is constant"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn apply(&mut self, mut frame: Frame) -> Frame {
        for hand in &mut frame.hands {
            // Both reference knuckles must be present
            if hand.landmarks.len() <= PINKY_MCP {
                continue;
            }
            let span = hand.landmarks[INDEX_MCP].distance_to(&hand.landmarks[PINKY_MCP]);
            let norm = span * 4.0;
            if norm == 0.0 {
                continue;
            }
            for landmark in &mut hand.landmarks {
                landmark.x /= norm;
                landmark.y /= norm;
                landmark.z /= norm;
            }
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::{Hand, Handedness, Landmark, LANDMARK_COUNT};

    fn hand_with_span(span: f64) -> Hand {
        let mut landmarks = vec![Landmark::default(); LANDMARK_COUNT];
        landmarks[INDEX_MCP] = Landmark::new(0.0, 0.0, 0.0);
        landmarks[PINKY_MCP] = Landmark::new(span, 0.0, 0.0);
        Hand {
            landmarks,
            handedness: Handedness::Right,
            confidence: 1.0,
        }
    }

    #[test]
    fn knuckle_span_scales_to_quarter_unit() {
        let mut stage = NormalizePreprocessor::new();
        let out = stage.apply(Frame::new(vec![hand_with_span(0.5)], 0.0));

        let hand = &out.hands[0];
        let span = hand.landmarks[INDEX_MCP].distance_to(&hand.landmarks[PINKY_MCP]);
        assert!((span - 0.25).abs() < 1e-12);
    }

    #[test]
    fn zero_palm_width_passes_through_unchanged() {
        let mut stage = NormalizePreprocessor::new();
        let before = hand_with_span(0.0);
        let out = stage.apply(Frame::new(vec![before.clone()], 0.0));
        assert_eq!(out.hands[0].landmarks, before.landmarks);
    }

    #[test]
    fn short_hand_passes_through() {
        let hand = Hand {
            landmarks: vec![Landmark::new(1.0, 1.0, 1.0); 10],
            handedness: Handedness::Left,
            confidence: 1.0,
        };
        let mut stage = NormalizePreprocessor::new();
        let out = stage.apply(Frame::new(vec![hand], 0.0));
        assert_eq!(out.hands[0].landmarks[0], Landmark::new(1.0, 1.0, 1.0));
    }
}
