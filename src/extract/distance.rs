//! Thumb-to-finger distance features at one phalanx level, plus their
//! first-difference speed.
//!
//! One instance per phalanx level feeds the tap analyzers their three rows of
//! evidence: `thumb_to_<finger>B_dist`, `..M_dist` and `..T_dist` with the
//! matching `_distspeed` derivatives. Speed is computed against the
//! previously stored value for the same key using actual elapsed time;
//! non-positive Δt skips the sample.

use std::collections::HashMap;

use crate::extract::FeatureExtractor;
use crate::pipeline::frame::{Frame, Phalanx, THUMB_TIP, TAP_FINGERS};
use crate::store::{feature_key, Feature, FeatureDisplay};

struct PreviousDistance {
    value: f64,
    timestamp_ms: f64,
}

pub struct FingerDistance {
    level: Phalanx,
    previous: HashMap<String, PreviousDistance>,
}

impl FingerDistance {
    pub fn new(level: Phalanx) -> Self {
        Self {
            level,
            previous: HashMap::new(),
        }
    }

    fn feature_name(&self, finger_label: &str) -> String {
        format!("thumb_to_{}{}_dist", finger_label, self.level.suffix())
    }
}

impl FeatureExtractor for FingerDistance {
    fn name(&self) -> &'static str {
        match self.level {
            Phalanx::Base => "FingerDistanceBase",
            Phalanx::Middle => "FingerDistanceMiddle",
            Phalanx::Tip => "FingerDistanceTip",
        }
    }

    fn extract(&mut self, frame: &Frame) -> Vec<Feature> {
        let mut features = Vec::new();

        for hand in &frame.hands {
            if !hand.is_complete() {
                continue;
            }
            let Some(thumb_tip) = hand.valid_landmark(THUMB_TIP) else {
                continue;
            };

            let mut distances = Vec::with_capacity(TAP_FINGERS.len());
            for finger in TAP_FINGERS {
                let Some(target) = hand.valid_landmark(self.level.landmark(finger)) else {
                    continue;
                };
                let distance = thumb_tip.distance_to(target);
                distances.push(distance);

                let name = self.feature_name(finger.label());
                let cache_key = feature_key(&name, Some(hand.handedness));

                // Speed against the previous sample of the same key
                if let Some(prev) = self.previous.get(&cache_key) {
                    let dt = (frame.timestamp_ms - prev.timestamp_ms) / 1000.0;
                    if dt > 0.0 {
                        features.push(Feature::number(
                            format!("thumb_to_{}{}_distspeed", finger.label(), self.level.suffix()),
                            (distance - prev.value).abs() / dt,
                            self.name(),
                            FeatureDisplay::Graph,
                            (0.0, 2.0),
                            frame.timestamp_ms,
                            Some(hand.handedness),
                            Some(finger),
                        ));
                    }
                }

                features.push(Feature::number(
                    name,
                    distance,
                    self.name(),
                    FeatureDisplay::Graph,
                    (0.0, 0.3),
                    frame.timestamp_ms,
                    Some(hand.handedness),
                    Some(finger),
                ));

                self.previous.insert(
                    cache_key,
                    PreviousDistance {
                        value: distance,
                        timestamp_ms: frame.timestamp_ms,
                    },
                );
            }

            // The tip row also reports the mean approach over valid fingers
            if self.level == Phalanx::Tip && !distances.is_empty() {
                let mean = distances.iter().sum::<f64>() / distances.len() as f64;
                features.push(Feature::number(
                    "thumb_to_fingers_avg_distance",
                    mean,
                    self.name(),
                    FeatureDisplay::Graph,
                    (0.0, 0.25),
                    frame.timestamp_ms,
                    Some(hand.handedness),
                    None,
                ));
            }
        }

        features
    }

    fn reset(&mut self) {
        self.previous.clear();
    }
}
