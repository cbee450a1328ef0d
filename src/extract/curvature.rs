//! Whole-finger curl: the sum of the three inter-segment angles along the
//! wrist→base→mid→tip chain, sign-normalized across hands.

use crate::extract::{angle_2d, handedness_sign, FeatureExtractor};
use crate::pipeline::frame::{Finger, Frame, ALL_FINGERS, WRIST};
use crate::store::{Feature, FeatureDisplay};

pub struct FingerCurvature;

impl FingerCurvature {
    pub fn new() -> Self {
        Self
    }

    fn advisory_range(finger: Finger) -> (f64, f64) {
        // The thumb curls through a much smaller arc than the other fingers
        if finger == Finger::Thumb {
            (-1.0, 0.6)
        } else {
            (-0.4, 2.8)
        }
    }
}

impl Default for FingerCurvature {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for FingerCurvature {
    fn name(&self) -> &'static str {
        "FingerCurvature"
    }

    fn extract(&mut self, frame: &Frame) -> Vec<Feature> {
        let mut features = Vec::new();

        for hand in &frame.hands {
            if !hand.is_complete() {
                continue;
            }
            let Some(wrist) = hand.valid_landmark(WRIST) else {
                continue;
            };

            for finger in ALL_FINGERS {
                let chain = finger.chain();
                let (Some(p0), Some(p1), Some(p2), Some(p3)) = (
                    hand.valid_landmark(chain[0]),
                    hand.valid_landmark(chain[1]),
                    hand.valid_landmark(chain[2]),
                    hand.valid_landmark(chain[3]),
                ) else {
                    continue;
                };

                // Consecutive segment vectors, wrist through tip, in-plane
                let v1 = (p0.x - wrist.x, p0.y - wrist.y);
                let v2 = (p1.x - p0.x, p1.y - p0.y);
                let v3 = (p2.x - p1.x, p2.y - p1.y);
                let v4 = (p3.x - p2.x, p3.y - p2.y);

                let total = angle_2d(v1.0, v1.1, v2.0, v2.1)
                    + angle_2d(v2.0, v2.1, v3.0, v3.1)
                    + angle_2d(v3.0, v3.1, v4.0, v4.1);
                let curvature = total * handedness_sign(hand.handedness);

                features.push(Feature::number(
                    format!("{}_curvature_value", finger.label()),
                    curvature,
                    self.name(),
                    FeatureDisplay::Graph,
                    Self::advisory_range(finger),
                    frame.timestamp_ms,
                    Some(hand.handedness),
                    Some(finger),
                ));
            }
        }

        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::{
        Hand, Handedness, Landmark, INDEX_DIP, INDEX_MCP, INDEX_PIP, INDEX_TIP, LANDMARK_COUNT,
    };

    /// Hand whose index finger bends by `step` radians at every joint.
    fn curled_hand(step: f64, handedness: Handedness) -> Hand {
        let mut landmarks = vec![Landmark::new(0.05, 0.05, 0.0); LANDMARK_COUNT];
        landmarks[WRIST] = Landmark::new(0.0, 0.0, 0.0);
        let mut heading: f64 = 0.0;
        let mut cursor = Landmark::new(1.0, 0.0, 0.0);
        landmarks[INDEX_MCP] = cursor;
        for joint in [INDEX_PIP, INDEX_DIP, INDEX_TIP] {
            heading += step;
            cursor = Landmark::new(cursor.x + heading.cos(), cursor.y + heading.sin(), 0.0);
            landmarks[joint] = cursor;
        }
        Hand {
            landmarks,
            handedness,
            confidence: 1.0,
        }
    }

    fn curvature_of(features: &[Feature], name: &str) -> Option<f64> {
        features.iter().find(|f| f.name == name).and_then(Feature::as_number)
    }

    #[test]
    fn uniform_bend_sums_over_three_joints() {
        let mut extractor = FingerCurvature::new();
        let features =
            extractor.extract(&Frame::new(vec![curled_hand(0.3, Handedness::Left)], 0.0));
        let value = curvature_of(&features, "index_curvature_value").unwrap();
        assert!((value - 0.9).abs() < 1e-9, "curvature = {value}");
    }

    #[test]
    fn right_hand_curvature_is_sign_flipped() {
        let mut extractor = FingerCurvature::new();
        let features =
            extractor.extract(&Frame::new(vec![curled_hand(0.3, Handedness::Right)], 0.0));
        let value = curvature_of(&features, "index_curvature_value").unwrap();
        assert!((value + 0.9).abs() < 1e-9, "curvature = {value}");
    }

    #[test]
    fn thumb_carries_its_own_advisory_range() {
        let mut extractor = FingerCurvature::new();
        let features =
            extractor.extract(&Frame::new(vec![curled_hand(0.0, Handedness::Left)], 0.0));
        let thumb = features
            .iter()
            .find(|f| f.name == "thumb_curvature_value")
            .unwrap();
        assert_eq!(thumb.min_max, (-1.0, 0.6));
    }
}
