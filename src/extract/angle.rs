//! Per-finger bend angle between the proximal and distal segments, with its
//! wrap-aware angular velocity.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::extract::{angle_2d, handedness_sign, wrap_angle, FeatureExtractor};
use crate::pipeline::frame::{Frame, ALL_FINGERS};
use crate::store::{feature_key, Feature, FeatureDisplay};

struct PreviousAngle {
    value: f64,
    timestamp_ms: f64,
}

pub struct FingerAngle {
    previous: HashMap<String, PreviousAngle>,
}

impl FingerAngle {
    pub fn new() -> Self {
        Self {
            previous: HashMap::new(),
        }
    }
}

impl Default for FingerAngle {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for FingerAngle {
    fn name(&self) -> &'static str {
        "FingerAngle"
    }

    fn extract(&mut self, frame: &Frame) -> Vec<Feature> {
        let mut features = Vec::new();

        for hand in &frame.hands {
            if !hand.is_complete() {
                continue;
            }

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

                // Proximal and distal segments projected onto the image plane
                let angle = angle_2d(p1.x - p0.x, p1.y - p0.y, p3.x - p2.x, p3.y - p2.y)
                    * handedness_sign(hand.handedness);

                let name = format!("{}_angle_value", finger.label());
                let cache_key = feature_key(&name, Some(hand.handedness));

                if let Some(prev) = self.previous.get(&cache_key) {
                    let dt = (frame.timestamp_ms - prev.timestamp_ms) / 1000.0;
                    if dt > 0.0 {
                        // Shortest path across the ±π boundary, never ≈2π/Δt
                        let velocity = wrap_angle(angle - prev.value) / dt;
                        features.push(Feature::number(
                            format!("{}_angular_velocity", finger.label()),
                            velocity,
                            self.name(),
                            FeatureDisplay::Graph,
                            (-20.0, 20.0),
                            frame.timestamp_ms,
                            Some(hand.handedness),
                            Some(finger),
                        ));
                    }
                }

                features.push(Feature::number(
                    name,
                    angle,
                    self.name(),
                    FeatureDisplay::Graph,
                    (-PI, PI),
                    frame.timestamp_ms,
                    Some(hand.handedness),
                    Some(finger),
                ));

                self.previous.insert(
                    cache_key,
                    PreviousAngle {
                        value: angle,
                        timestamp_ms: frame.timestamp_ms,
                    },
                );
            }
        }

        features
    }

    fn reset(&mut self) {
        self.previous.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::{
        Hand, Handedness, Landmark, INDEX_DIP, INDEX_MCP, INDEX_PIP, INDEX_TIP, LANDMARK_COUNT,
    };

    /// Full hand with the index segments bent by `angle` radians in-plane.
    fn hand_with_index_angle(angle: f64, handedness: Handedness) -> Hand {
        let mut landmarks = vec![Landmark::new(0.1, 0.1, 0.0); LANDMARK_COUNT];
        landmarks[INDEX_MCP] = Landmark::new(0.0, 0.0, 0.0);
        landmarks[INDEX_PIP] = Landmark::new(1.0, 0.0, 0.0);
        landmarks[INDEX_DIP] = Landmark::new(1.5, 0.0, 0.0);
        landmarks[INDEX_TIP] = Landmark::new(1.5 + angle.cos(), angle.sin(), 0.0);
        Hand {
            landmarks,
            handedness,
            confidence: 1.0,
        }
    }

    fn index_value(features: &[Feature], name: &str) -> Option<f64> {
        features.iter().find(|f| f.name == name).and_then(Feature::as_number)
    }

    #[test]
    fn angle_sign_flips_with_handedness() {
        let mut extractor = FingerAngle::new();
        let left = extractor.extract(&Frame::new(
            vec![hand_with_index_angle(0.5, Handedness::Left)],
            0.0,
        ));
        extractor.reset();
        let right = extractor.extract(&Frame::new(
            vec![hand_with_index_angle(0.5, Handedness::Right)],
            0.0,
        ));

        let left_angle = index_value(&left, "index_angle_value").unwrap();
        let right_angle = index_value(&right, "index_angle_value").unwrap();
        assert!((left_angle - 0.5).abs() < 1e-9);
        assert!((right_angle + 0.5).abs() < 1e-9);
    }

    #[test]
    fn velocity_wraps_across_the_pi_boundary() {
        let mut extractor = FingerAngle::new();
        extractor.extract(&Frame::new(
            vec![hand_with_index_angle(3.0, Handedness::Left)],
            0.0,
        ));
        let features = extractor.extract(&Frame::new(
            vec![hand_with_index_angle(-3.0, Handedness::Left)],
            100.0,
        ));

        let velocity = index_value(&features, "index_angular_velocity").unwrap();
        // Shortest path is ≈ +0.283 rad over 0.1 s, nowhere near 6 rad / 0.1 s
        assert!(velocity.abs() < 4.0, "velocity = {velocity}");
        assert!((velocity - (2.0 * PI - 6.0) / 0.1).abs() < 1e-6);
    }

    #[test]
    fn first_sample_has_no_velocity() {
        let mut extractor = FingerAngle::new();
        let features = extractor.extract(&Frame::new(
            vec![hand_with_index_angle(0.5, Handedness::Left)],
            0.0,
        ));
        assert!(index_value(&features, "index_angular_velocity").is_none());
        assert!(index_value(&features, "index_angle_value").is_some());
    }
}
