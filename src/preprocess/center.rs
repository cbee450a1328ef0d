//! Recenters every hand so its wrist sits at the origin.

use crate::pipeline::frame::{Frame, Landmark, WRIST};
use crate::preprocess::Preprocessor;

pub struct CenterPreprocessor {
    enabled: bool,
}

impl CenterPreprocessor {
    pub fn new() -> Self {
        Self { enabled: true }
    }
}

impl Default for CenterPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for CenterPreprocessor {
    fn id(&self) -> &'static str {
        "center"
    }

    fn name(&self) -> &'static str {
        "Center Preprocessor"
    }

    fn description(&self) -> &'static str {
        "Translate each hand so the wrist lands on the 0,0,0 origin"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn apply(&mut self, mut frame: Frame) -> Frame {
        for hand in &mut frame.hands {
            let Some(&Landmark { x, y, z }) = hand.landmarks.get(WRIST) else {
                continue;
            };
            for landmark in &mut hand.landmarks {
                landmark.x -= x;
                landmark.y -= y;
                landmark.z -= z;
            }
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::{Hand, Handedness};

    #[test]
    fn wrist_moves_to_origin_and_offsets_are_preserved() {
        let hand = Hand {
            landmarks: vec![
                Landmark::new(0.5, 0.4, 0.1),
                Landmark::new(0.7, 0.6, 0.2),
            ],
            handedness: Handedness::Right,
            confidence: 1.0,
        };
        let mut stage = CenterPreprocessor::new();
        let out = stage.apply(Frame::new(vec![hand], 0.0));

        let landmarks = &out.hands[0].landmarks;
        assert_eq!(landmarks[0], Landmark::new(0.0, 0.0, 0.0));
        let moved = &landmarks[1];
        assert!((moved.x - 0.2).abs() < 1e-12);
        assert!((moved.y - 0.2).abs() < 1e-12);
        assert!((moved.z - 0.1).abs() < 1e-12);
    }

    #[test]
    fn empty_hand_passes_through() {
        let hand = Hand {
            landmarks: Vec::new(),
            handedness: Handedness::Left,
            confidence: 1.0,
        };
        let mut stage = CenterPreprocessor::new();
        let out = stage.apply(Frame::new(vec![hand], 0.0));
        assert!(out.hands[0].landmarks.is_empty());
    }
}
