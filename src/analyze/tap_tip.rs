//! Single-finger tip-tap detection.
//!
//! Simpler sibling of the all-finger analyzer: it first arbitrates by
//! closest current thumb-to-tip distance, then requires three conditions on
//! that one finger: a low→peak→low shape on the distance-speed window, the
//! same shape on the angular-velocity window, and the current distance under
//! a proximity threshold. Same ring and cooldown structure as the all-finger
//! variant.

use std::array;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analyze::{Analyzer, AnalyzerError, SampleRing};
use crate::pipeline::frame::{Finger, Handedness, TAP_FINGERS};
use crate::store::{Event, EventBus, EventPayload, FeatureStore, TAP_TIP_DETECTED};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TapTipConfig {
    /// Window length in ticks (≈350 ms at the nominal ~50 ms tick).
    pub ring_size: usize,
    pub speed_low: f64,
    pub speed_high: f64,
    /// Thresholds for the |angular velocity| window, in rad/s.
    pub angular_low: f64,
    pub angular_high: f64,
    /// The candidate fingertip must currently be this close to the thumb.
    pub proximity: f64,
    pub cooldown_ms: f64,
}

impl Default for TapTipConfig {
    fn default() -> Self {
        Self {
            ring_size: 7,
            speed_low: 0.1,
            speed_high: 0.6,
            angular_low: 1.0,
            angular_high: 4.0,
            proximity: 0.12,
            cooldown_ms: 250.0,
        }
    }
}

impl TapTipConfig {
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if self.ring_size < 3 {
            return Err(AnalyzerError::ConfigError(format!(
                "ring_size must be at least 3, got {}",
                self.ring_size
            )));
        }
        if self.speed_low >= self.speed_high || self.angular_low >= self.angular_high {
            return Err(AnalyzerError::ConfigError(
                "low thresholds must sit below their high thresholds".to_string(),
            ));
        }
        if self.proximity <= 0.0 {
            return Err(AnalyzerError::ConfigError(
                "proximity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

struct FingerWindows {
    speed: SampleRing,
    angular: SampleRing,
}

pub struct TapTipAnalyzer {
    enabled: bool,
    config: TapTipConfig,
    /// Windows indexed in `TAP_FINGERS` order.
    windows: [FingerWindows; 4],
    last_emit_ms: Option<f64>,
}

impl TapTipAnalyzer {
    pub fn new(config: TapTipConfig) -> Result<Self, AnalyzerError> {
        config.validate()?;
        let size = config.ring_size;
        Ok(Self {
            enabled: true,
            config,
            windows: array::from_fn(|_| FingerWindows {
                speed: SampleRing::new(size),
                angular: SampleRing::new(size),
            }),
            last_emit_ms: None,
        })
    }

    fn update_windows(&mut self, store: &FeatureStore, hand: Option<Handedness>) {
        for (fi, finger) in TAP_FINGERS.iter().enumerate() {
            let windows = &mut self.windows[fi];
            let speed_name = format!("thumb_to_{}T_distspeed", finger.label());
            match store.get_number(&speed_name, hand) {
                Some(speed) => windows.speed.push(speed),
                None => windows.speed.push_repeat(),
            }
            let angular_name = format!("{}_angular_velocity", finger.label());
            match store.get_number(&angular_name, hand) {
                Some(velocity) => windows.angular.push(velocity.abs()),
                None => windows.angular.push_repeat(),
            }
        }
    }

    /// Current thumb-to-tip distance per finger; the closest one becomes the
    /// sole candidate before any pattern testing happens.
    fn closest_finger(
        &self,
        store: &FeatureStore,
        hand: Option<Handedness>,
    ) -> Option<(usize, Finger, f64)> {
        let mut closest: Option<(usize, Finger, f64)> = None;
        for (fi, &finger) in TAP_FINGERS.iter().enumerate() {
            let name = format!("thumb_to_{}T_dist", finger.label());
            let Some(distance) = store.get_number(&name, hand) else {
                continue;
            };
            if closest.map_or(true, |(_, _, best)| distance < best) {
                closest = Some((fi, finger, distance));
            }
        }
        closest
    }
}

impl Analyzer for TapTipAnalyzer {
    fn name(&self) -> &'static str {
        "TapTipAnalyzer"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn analyze(
        &mut self,
        store: &FeatureStore,
        bus: &mut EventBus,
        now_ms: f64,
        hand: Option<Handedness>,
    ) {
        self.update_windows(store, hand);

        if let Some(last) = self.last_emit_ms {
            if now_ms - last < self.config.cooldown_ms {
                return;
            }
        }

        let Some((fi, finger, distance)) = self.closest_finger(store, hand) else {
            return;
        };

        let windows = &self.windows[fi];
        let speed_shape = windows
            .speed
            .matches_low_peak_low(self.config.speed_low, self.config.speed_high);
        let angular_shape = windows
            .angular
            .matches_low_peak_low(self.config.angular_low, self.config.angular_high);
        let close_enough = distance < self.config.proximity;

        if !(speed_shape && angular_shape && close_enough) {
            debug!(
                "{} finger candidate rejected (speed {}, angular {}, proximity {})",
                finger, speed_shape, angular_shape, close_enough
            );
            return;
        }

        info!(
            "Tip tap detected: {} finger at {:.3} distance, {:.1}ms",
            finger, distance, now_ms
        );
        let mut event = Event::new(
            TAP_TIP_DETECTED,
            EventPayload::TipTap { finger, distance },
            now_ms,
        );
        if let Some(hand) = hand {
            event = event.with_hand(hand);
        }
        bus.emit(event);
        self.last_emit_ms = Some(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Feature, FeatureDisplay};

    const HAND: Option<Handedness> = Some(Handedness::Right);

    fn numeric(name: String, value: f64, ts: f64) -> Feature {
        Feature::number(
            name,
            value,
            "test",
            FeatureDisplay::Graph,
            (0.0, 2.0),
            ts,
            HAND,
            None,
        )
    }

    fn set_finger(
        store: &mut FeatureStore,
        finger: Finger,
        dist: f64,
        speed: f64,
        angular: f64,
        ts: f64,
    ) {
        store.set_feature(numeric(
            format!("thumb_to_{}T_dist", finger.label()),
            dist,
            ts,
        ));
        store.set_feature(numeric(
            format!("thumb_to_{}T_distspeed", finger.label()),
            speed,
            ts,
        ));
        store.set_feature(numeric(
            format!("{}_angular_velocity", finger.label()),
            angular,
            ts,
        ));
    }

    /// Pulse landing on the midpoint of a seven-slot window after seven
    /// ticks.
    fn pulse(tick: usize, magnitude: f64) -> f64 {
        if tick % 7 == 3 {
            magnitude
        } else {
            0.0
        }
    }

    fn tip_tap_count(bus: &EventBus) -> usize {
        bus.history().events_by_kind(TAP_TIP_DETECTED).len()
    }

    #[test]
    fn all_three_conditions_emit_a_tip_tap() {
        let mut analyzer = TapTipAnalyzer::new(TapTipConfig::default()).unwrap();
        let mut store = FeatureStore::new();
        let mut bus = EventBus::default();

        for tick in 0..7 {
            let ts = (tick + 1) as f64 * 50.0;
            set_finger(
                &mut store,
                Finger::Index,
                0.05,
                pulse(tick, 0.8),
                pulse(tick, 6.0),
                ts,
            );
            analyzer.analyze(&store, &mut bus, ts, HAND);
        }

        assert_eq!(tip_tap_count(&bus), 1);
        match &bus.history().last_event(Some(TAP_TIP_DETECTED)).unwrap().payload {
            EventPayload::TipTap { finger, distance } => {
                assert_eq!(*finger, Finger::Index);
                assert!((*distance - 0.05).abs() < 1e-12);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn missing_proximity_blocks_the_emission() {
        let mut analyzer = TapTipAnalyzer::new(TapTipConfig::default()).unwrap();
        let mut store = FeatureStore::new();
        let mut bus = EventBus::default();

        for tick in 0..7 {
            let ts = (tick + 1) as f64 * 50.0;
            // Both shapes present, but the fingertip stays far away
            set_finger(
                &mut store,
                Finger::Index,
                0.25,
                pulse(tick, 0.8),
                pulse(tick, 6.0),
                ts,
            );
            analyzer.analyze(&store, &mut bus, ts, HAND);
        }

        assert_eq!(tip_tap_count(&bus), 0);
    }

    #[test]
    fn arbitration_happens_before_pattern_testing() {
        let mut analyzer = TapTipAnalyzer::new(TapTipConfig::default()).unwrap();
        let mut store = FeatureStore::new();
        let mut bus = EventBus::default();

        for tick in 0..7 {
            let ts = (tick + 1) as f64 * 50.0;
            // The ring finger shows a perfect tap shape but sits farther away
            set_finger(
                &mut store,
                Finger::Ring,
                0.10,
                pulse(tick, 0.8),
                pulse(tick, 6.0),
                ts,
            );
            // The index finger is closest yet shows no motion
            set_finger(&mut store, Finger::Index, 0.04, 0.0, 0.0, ts);
            analyzer.analyze(&store, &mut bus, ts, HAND);
        }

        // Closest-first arbitration selects the idle index finger, so the
        // ring finger's pattern never gets tested
        assert_eq!(tip_tap_count(&bus), 0);
    }

    #[test]
    fn cooldown_suppresses_back_to_back_tip_taps() {
        let mut analyzer = TapTipAnalyzer::new(TapTipConfig::default()).unwrap();
        let mut store = FeatureStore::new();
        let mut bus = EventBus::default();

        // 20ms ticks: matches fire at 140ms and 280ms, inside the cooldown
        for tick in 0..14 {
            let ts = (tick + 1) as f64 * 20.0;
            set_finger(
                &mut store,
                Finger::Index,
                0.05,
                pulse(tick, 0.8),
                pulse(tick, 6.0),
                ts,
            );
            analyzer.analyze(&store, &mut bus, ts, HAND);
        }
        assert_eq!(tip_tap_count(&bus), 1);
    }
}
