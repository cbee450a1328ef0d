//! First-difference kinematics of the base-to-tip vector of each finger:
//! speed of the vector's motion and acceleration of that speed.
//!
//! The first sample per key yields a defined zero; a non-positive Δt skips
//! the sample entirely. All derivatives use actual elapsed time between
//! frames, never an assumed tick.

use std::collections::HashMap;

use crate::extract::FeatureExtractor;
use crate::pipeline::frame::{
    Finger, Frame, Handedness, ALL_FINGERS, INDEX_MCP, INDEX_PIP, MIDDLE_MCP, MIDDLE_PIP,
    PINKY_MCP, PINKY_PIP, RING_MCP, RING_PIP, THUMB_CMC, THUMB_TIP,
};
use crate::store::{Feature, FeatureDisplay};

/// Segment endpoints tracked per finger (base joint → adjacent joint).
fn segment(finger: Finger) -> (usize, usize) {
    match finger {
        Finger::Thumb => (THUMB_CMC, THUMB_TIP),
        Finger::Index => (INDEX_MCP, INDEX_PIP),
        Finger::Middle => (MIDDLE_MCP, MIDDLE_PIP),
        Finger::Ring => (RING_MCP, RING_PIP),
        Finger::Pinky => (PINKY_MCP, PINKY_PIP),
    }
}

struct MotionState {
    position: (f64, f64, f64),
    timestamp_ms: f64,
}

struct SpeedState {
    speed: f64,
    timestamp_ms: f64,
}

pub struct FingerKinematics {
    previous_position: HashMap<(Finger, Handedness), MotionState>,
    previous_speed: HashMap<(Finger, Handedness), SpeedState>,
}

impl FingerKinematics {
    pub fn new() -> Self {
        Self {
            previous_position: HashMap::new(),
            previous_speed: HashMap::new(),
        }
    }

    /// Speed of the relative vector; `None` skips the sample (Δt ≤ 0),
    /// first observation reports zero.
    fn speed_for(
        &mut self,
        key: (Finger, Handedness),
        position: (f64, f64, f64),
        timestamp_ms: f64,
    ) -> Option<f64> {
        let Some(prev) = self.previous_position.get(&key) else {
            self.previous_position.insert(
                key,
                MotionState {
                    position,
                    timestamp_ms,
                },
            );
            return Some(0.0);
        };

        let dt = (timestamp_ms - prev.timestamp_ms) / 1000.0;
        if dt <= 0.0 {
            return None;
        }

        let vx = (position.0 - prev.position.0) / dt;
        let vy = (position.1 - prev.position.1) / dt;
        let vz = (position.2 - prev.position.2) / dt;
        let speed = (vx * vx + vy * vy + vz * vz).sqrt();

        self.previous_position.insert(
            key,
            MotionState {
                position,
                timestamp_ms,
            },
        );
        Some(speed)
    }

    fn acceleration_for(
        &mut self,
        key: (Finger, Handedness),
        speed: f64,
        timestamp_ms: f64,
    ) -> Option<f64> {
        let Some(prev) = self.previous_speed.get(&key) else {
            self.previous_speed.insert(
                key,
                SpeedState {
                    speed,
                    timestamp_ms,
                },
            );
            return Some(0.0);
        };

        let dt = (timestamp_ms - prev.timestamp_ms) / 1000.0;
        if dt <= 0.0 {
            return None;
        }

        let acceleration = (speed - prev.speed) / dt;
        self.previous_speed.insert(
            key,
            SpeedState {
                speed,
                timestamp_ms,
            },
        );
        Some(acceleration)
    }
}

impl Default for FingerKinematics {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for FingerKinematics {
    fn name(&self) -> &'static str {
        "FingerKinematics"
    }

    fn extract(&mut self, frame: &Frame) -> Vec<Feature> {
        let mut features = Vec::new();

        for hand in &frame.hands {
            for finger in ALL_FINGERS {
                let (base_idx, tip_idx) = segment(finger);
                let (Some(base), Some(tip)) =
                    (hand.valid_landmark(base_idx), hand.valid_landmark(tip_idx))
                else {
                    continue;
                };

                let relative = (tip.x - base.x, tip.y - base.y, tip.z - base.z);
                let key = (finger, hand.handedness);

                let Some(speed) = self.speed_for(key, relative, frame.timestamp_ms) else {
                    continue;
                };
                features.push(Feature::number(
                    format!("{}_base_velocity", finger.label()),
                    speed,
                    self.name(),
                    FeatureDisplay::Graph,
                    (0.0, 2.0),
                    frame.timestamp_ms,
                    Some(hand.handedness),
                    Some(finger),
                ));

                if let Some(acceleration) =
                    self.acceleration_for(key, speed, frame.timestamp_ms)
                {
                    features.push(Feature::number(
                        format!("{}_base_acceleration", finger.label()),
                        acceleration,
                        self.name(),
                        FeatureDisplay::Graph,
                        (-10.0, 10.0),
                        frame.timestamp_ms,
                        Some(hand.handedness),
                        Some(finger),
                    ));
                }
            }
        }

        features
    }

    fn reset(&mut self) {
        self.previous_position.clear();
        self.previous_speed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::{Hand, Landmark, LANDMARK_COUNT};

    fn hand_with_index_pip(x: f64) -> Hand {
        let mut landmarks = vec![Landmark::new(0.05, 0.05, 0.0); LANDMARK_COUNT];
        landmarks[INDEX_MCP] = Landmark::new(0.0, 0.0, 0.0);
        landmarks[INDEX_PIP] = Landmark::new(x, 0.0, 0.0);
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
    fn first_samples_degrade_to_zero() {
        let mut extractor = FingerKinematics::new();
        let features = extractor.extract(&Frame::new(vec![hand_with_index_pip(0.2)], 0.0));
        assert_eq!(value(&features, "index_base_velocity"), Some(0.0));
        assert_eq!(value(&features, "index_base_acceleration"), Some(0.0));
    }

    #[test]
    fn speed_and_acceleration_use_elapsed_time() {
        let mut extractor = FingerKinematics::new();
        extractor.extract(&Frame::new(vec![hand_with_index_pip(0.2)], 0.0));
        let second = extractor.extract(&Frame::new(vec![hand_with_index_pip(0.3)], 100.0));

        // Vector moved 0.1 units in 0.1s
        let speed = value(&second, "index_base_velocity").unwrap();
        assert!((speed - 1.0).abs() < 1e-9);
        // Speed rose from 0 to 1 in 0.1s
        let accel = value(&second, "index_base_acceleration").unwrap();
        assert!((accel - 10.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_dt_skips_both_features() {
        let mut extractor = FingerKinematics::new();
        extractor.extract(&Frame::new(vec![hand_with_index_pip(0.2)], 100.0));
        let features = extractor.extract(&Frame::new(vec![hand_with_index_pip(0.4)], 100.0));
        assert!(value(&features, "index_base_velocity").is_none());
        assert!(value(&features, "index_base_acceleration").is_none());
    }
}
