//! Temporal smoothing of fingertip trajectories.
//!
//! One constant-velocity filter per coordinate axis per fingertip landmark.
//! Filter state is keyed by (handedness, landmark count); a hand reappearing
//! with a different landmark topology discards the stale state for that
//! handedness and starts fresh from the measured positions.

use std::collections::HashMap;

use tracing::debug;

use crate::pipeline::frame::{Frame, Hand, Handedness, FINGERTIPS};
use crate::preprocess::Preprocessor;

pub const DEFAULT_PROCESS_NOISE: f64 = 0.01;
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 0.1;

/// Scalar constant-velocity filter: position, velocity and error covariance
/// for a single coordinate axis.
#[derive(Debug, Clone, Copy)]
struct AxisFilter {
    pos: f64,
    vel: f64,
    cov: f64,
}

impl AxisFilter {
    fn new(initial: f64) -> Self {
        Self {
            pos: initial,
            vel: 0.0,
            cov: 1.0,
        }
    }

    fn update(&mut self, measurement: f64, process_noise: f64, measurement_noise: f64) -> f64 {
        // Predict
        let predicted_pos = self.pos + self.vel;
        let predicted_cov = self.cov + process_noise;

        // Correct from the residual
        let gain = predicted_cov / (predicted_cov + measurement_noise);
        let residual = measurement - predicted_pos;
        self.pos = predicted_pos + gain * residual;
        self.vel += gain * residual;
        self.cov = (1.0 - gain) * predicted_cov;

        self.pos
    }
}

/// x/y/z filters for each of the five fingertips.
type FingertipFilters = [[AxisFilter; 3]; 5];

pub struct SmoothPreprocessor {
    enabled: bool,
    process_noise: f64,
    measurement_noise: f64,
    filters: HashMap<(Handedness, usize), FingertipFilters>,
}

impl SmoothPreprocessor {
    pub fn new() -> Self {
        Self::with_noise(DEFAULT_PROCESS_NOISE, DEFAULT_MEASUREMENT_NOISE)
    }

    pub fn with_noise(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            enabled: true,
            process_noise,
            measurement_noise,
            filters: HashMap::new(),
        }
    }

    fn initialize_filters(hand: &Hand) -> FingertipFilters {
        let mut filters = [[AxisFilter::new(0.0); 3]; 5];
        for (slot, &tip) in FINGERTIPS.iter().enumerate() {
            if let Some(landmark) = hand.landmarks.get(tip) {
                filters[slot] = [
                    AxisFilter::new(landmark.x),
                    AxisFilter::new(landmark.y),
                    AxisFilter::new(landmark.z),
                ];
            }
        }
        filters
    }

    fn smooth_hand(&mut self, hand: &mut Hand) {
        let key = (hand.handedness, hand.landmarks.len());

        // Topology change for this handedness invalidates the old state
        let stale: Vec<(Handedness, usize)> = self
            .filters
            .keys()
            .filter(|(side, count)| *side == key.0 && *count != key.1)
            .copied()
            .collect();
        for old in stale {
            debug!(
                "Fingertip filter topology changed for {} hand ({} -> {} landmarks), resetting",
                old.0, old.1, key.1
            );
            self.filters.remove(&old);
        }

        let filters = self
            .filters
            .entry(key)
            .or_insert_with(|| Self::initialize_filters(hand));

        for (slot, &tip) in FINGERTIPS.iter().enumerate() {
            let Some(landmark) = hand.landmarks.get_mut(tip) else {
                continue;
            };
            let axes = &mut filters[slot];
            landmark.x = axes[0].update(landmark.x, self.process_noise, self.measurement_noise);
            landmark.y = axes[1].update(landmark.y, self.process_noise, self.measurement_noise);
            landmark.z = axes[2].update(landmark.z, self.process_noise, self.measurement_noise);
        }
    }
}

impl Default for SmoothPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for SmoothPreprocessor {
    fn id(&self) -> &'static str {
        "smooth"
    }

    fn name(&self) -> &'static str {
        "Smoothing Preprocessor"
    }

    fn description(&self) -> &'static str {
        "Constant-velocity filtering of the five fingertip landmarks"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn apply(&mut self, mut frame: Frame) -> Frame {
        for hand in &mut frame.hands {
            self.smooth_hand(hand);
        }
        frame
    }

    fn reset(&mut self) {
        self.filters.clear();
    }
}
