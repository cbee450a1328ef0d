//! Hand orientation in space: palm-normal tilt/pan, hand-direction roll, and
//! a combined magnitude, each clamped to an advisory [-1, 1] range.

use std::f64::consts::FRAC_PI_2;

use crate::extract::FeatureExtractor;
use crate::pipeline::frame::{Frame, Landmark, INDEX_MCP, INDEX_TIP, MIDDLE_MCP, PINKY_MCP, WRIST};
use crate::store::{Feature, FeatureDisplay};

pub struct HandOrientation;

impl HandOrientation {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HandOrientation {
    fn default() -> Self {
        Self::new()
    }
}

fn vector(from: &Landmark, to: &Landmark) -> (f64, f64, f64) {
    (to.x - from.x, to.y - from.y, to.z - from.z)
}

fn cross(a: (f64, f64, f64), b: (f64, f64, f64)) -> (f64, f64, f64) {
    (
        a.1 * b.2 - a.2 * b.1,
        a.2 * b.0 - a.0 * b.2,
        a.0 * b.1 - a.1 * b.0,
    )
}

fn normalized(v: (f64, f64, f64)) -> Option<(f64, f64, f64)> {
    let length = (v.0 * v.0 + v.1 * v.1 + v.2 * v.2).sqrt();
    if length == 0.0 {
        return None;
    }
    Some((v.0 / length, v.1 / length, v.2 / length))
}

impl FeatureExtractor for HandOrientation {
    fn name(&self) -> &'static str {
        "HandOrientation"
    }

    fn extract(&mut self, frame: &Frame) -> Vec<Feature> {
        let mut features = Vec::new();

        for hand in &frame.hands {
            if !hand.is_complete() {
                continue;
            }
            let (Some(wrist), Some(index_base), Some(middle_base), Some(pinky_base), Some(index_tip)) = (
                hand.valid_landmark(WRIST),
                hand.valid_landmark(INDEX_MCP),
                hand.valid_landmark(MIDDLE_MCP),
                hand.valid_landmark(PINKY_MCP),
                hand.valid_landmark(INDEX_TIP),
            ) else {
                continue;
            };

            // Palm plane from the three knuckle bases
            let normal = cross(
                vector(index_base, middle_base),
                vector(index_base, pinky_base),
            );
            let Some(normal) = normalized(normal) else {
                continue;
            };
            let Some(direction) = normalized(vector(wrist, index_tip)) else {
                continue;
            };

            let tilt = normal.1.clamp(-1.0, 1.0);
            let pan = (-normal.0).clamp(-1.0, 1.0);
            let roll = (direction.2.atan2((direction.0 * direction.0 + direction.1 * direction.1).sqrt())
                / FRAC_PI_2)
                .clamp(-1.0, 1.0);

            for (name, value) in [("hand_tilt", tilt), ("hand_pan", pan), ("hand_roll", roll)] {
                features.push(Feature::number(
                    name,
                    value,
                    self.name(),
                    FeatureDisplay::Graph,
                    (-1.0, 1.0),
                    frame.timestamp_ms,
                    Some(hand.handedness),
                    None,
                ));
            }

            let magnitude = (tilt * tilt + pan * pan + roll * roll).sqrt();
            features.push(Feature::number(
                "hand_orientation_magnitude",
                magnitude,
                self.name(),
                FeatureDisplay::Graph,
                (0.0, 1.73),
                frame.timestamp_ms,
                Some(hand.handedness),
                None,
            ));
        }

        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::{Hand, Handedness, LANDMARK_COUNT};

    fn flat_hand() -> Hand {
        // Palm flat in the x/y plane, fingers pointing along +x
        let mut landmarks = vec![Landmark::new(0.02, 0.02, 0.0); LANDMARK_COUNT];
        landmarks[WRIST] = Landmark::new(0.0, 0.0, 0.0);
        landmarks[INDEX_MCP] = Landmark::new(0.4, 0.1, 0.0);
        landmarks[MIDDLE_MCP] = Landmark::new(0.45, 0.0, 0.0);
        landmarks[PINKY_MCP] = Landmark::new(0.4, -0.2, 0.0);
        landmarks[INDEX_TIP] = Landmark::new(0.8, 0.1, 0.0);
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
    fn flat_hand_has_no_tilt_pan_or_roll() {
        let mut extractor = HandOrientation::new();
        let features = extractor.extract(&Frame::new(vec![flat_hand()], 0.0));

        assert!(value(&features, "hand_tilt").unwrap().abs() < 1e-9);
        assert!(value(&features, "hand_pan").unwrap().abs() < 1e-9);
        assert!(value(&features, "hand_roll").unwrap().abs() < 1e-9);
        assert!(value(&features, "hand_orientation_magnitude").unwrap().abs() < 1e-9);
    }

    #[test]
    fn degenerate_palm_plane_skips_the_hand() {
        let mut hand = flat_hand();
        // Collapse the knuckles onto one point: no palm plane
        hand.landmarks[MIDDLE_MCP] = hand.landmarks[INDEX_MCP];
        hand.landmarks[PINKY_MCP] = hand.landmarks[INDEX_MCP];
        let mut extractor = HandOrientation::new();
        let features = extractor.extract(&Frame::new(vec![hand], 0.0));
        assert!(features.is_empty());
    }

    #[test]
    fn forward_pitched_hand_reports_roll() {
        let mut hand = flat_hand();
        hand.landmarks[INDEX_TIP] = Landmark::new(0.4, 0.1, 0.4);
        let mut extractor = HandOrientation::new();
        let features = extractor.extract(&Frame::new(vec![hand], 0.0));
        let roll = value(&features, "hand_roll").unwrap();
        assert!(roll > 0.3, "roll = {roll}");
    }
}
