//! Hand scale reference features: palm reference length, segment-summed
//! index length, and their ratio. Each value passes a plausibility window
//! before it is reported.

use crate::extract::FeatureExtractor;
use crate::pipeline::frame::{
    Frame, INDEX_DIP, INDEX_MCP, INDEX_PIP, INDEX_TIP, MIDDLE_MCP, WRIST,
};
use crate::store::{Feature, FeatureDisplay};
use crate::pipeline::frame::Finger;

pub struct HandSize;

impl HandSize {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HandSize {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for HandSize {
    fn name(&self) -> &'static str {
        "HandSize"
    }

    fn extract(&mut self, frame: &Frame) -> Vec<Feature> {
        let mut features = Vec::new();

        for hand in &frame.hands {
            if !hand.is_complete() {
                continue;
            }
            let (Some(wrist), Some(middle_base), Some(index_base), Some(index_pip), Some(index_dip), Some(index_tip)) = (
                hand.valid_landmark(WRIST),
                hand.valid_landmark(MIDDLE_MCP),
                hand.valid_landmark(INDEX_MCP),
                hand.valid_landmark(INDEX_PIP),
                hand.valid_landmark(INDEX_DIP),
                hand.valid_landmark(INDEX_TIP),
            ) else {
                continue;
            };

            let reference_length = wrist.distance_to(middle_base);
            if !(0.05..0.5).contains(&reference_length) {
                continue;
            }
            features.push(Feature::number(
                "hand_reference_length",
                reference_length,
                self.name(),
                FeatureDisplay::Number,
                (0.05, 0.3),
                frame.timestamp_ms,
                Some(hand.handedness),
                None,
            ));

            // Summing the segments beats a straight base→tip measurement on
            // a bent finger
            let index_length = index_base.distance_to(index_pip)
                + index_pip.distance_to(index_dip)
                + index_dip.distance_to(index_tip);
            if !(0.02..0.3).contains(&index_length) {
                continue;
            }
            features.push(Feature::number(
                "index_raw_length",
                index_length,
                self.name(),
                FeatureDisplay::Number,
                (0.02, 0.5),
                frame.timestamp_ms,
                Some(hand.handedness),
                Some(Finger::Index),
            ));

            let normalized = index_length / reference_length;
            if (0.2..1.0).contains(&normalized) {
                features.push(Feature::number(
                    "normalized_index_length",
                    normalized,
                    self.name(),
                    FeatureDisplay::Graph,
                    (0.2, 0.8),
                    frame.timestamp_ms,
                    Some(hand.handedness),
                    Some(Finger::Index),
                ));
            }
        }

        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::{Hand, Handedness, Landmark, LANDMARK_COUNT};

    fn sized_hand(reference: f64, segment: f64) -> Hand {
        let mut landmarks = vec![Landmark::new(0.01, 0.01, 0.0); LANDMARK_COUNT];
        landmarks[WRIST] = Landmark::new(0.0, 0.0, 0.0);
        landmarks[MIDDLE_MCP] = Landmark::new(reference, 0.0, 0.0);
        landmarks[INDEX_MCP] = Landmark::new(0.0, 0.1, 0.0);
        landmarks[INDEX_PIP] = Landmark::new(segment, 0.1, 0.0);
        landmarks[INDEX_DIP] = Landmark::new(2.0 * segment, 0.1, 0.0);
        landmarks[INDEX_TIP] = Landmark::new(3.0 * segment, 0.1, 0.0);
        Hand {
            landmarks,
            handedness: Handedness::Right,
            confidence: 1.0,
        }
    }

    fn value(features: &[Feature], name: &str) -> Option<f64> {
        features.iter().find(|f| f.name == name).and_then(Feature::as_number)
    }

    #[test]
    fn reports_reference_index_and_ratio() {
        let mut extractor = HandSize::new();
        let features = extractor.extract(&Frame::new(vec![sized_hand(0.3, 0.05)], 0.0));

        assert!((value(&features, "hand_reference_length").unwrap() - 0.3).abs() < 1e-12);
        assert!((value(&features, "index_raw_length").unwrap() - 0.15).abs() < 1e-12);
        assert!((value(&features, "normalized_index_length").unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn implausible_reference_skips_the_hand() {
        let mut extractor = HandSize::new();
        let features = extractor.extract(&Frame::new(vec![sized_hand(0.9, 0.05)], 0.0));
        assert!(features.is_empty());
    }

    #[test]
    fn implausible_ratio_is_withheld() {
        // Reference and index both plausible, ratio above 1.0
        let mut extractor = HandSize::new();
        let features = extractor.extract(&Frame::new(vec![sized_hand(0.06, 0.025)], 0.0));
        assert!(value(&features, "hand_reference_length").is_some());
        assert!(value(&features, "index_raw_length").is_some());
        assert!(value(&features, "normalized_index_length").is_none());
    }
}
