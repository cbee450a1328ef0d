//! All-finger tap detection with phalanx arbitration.
//!
//! For every tracked finger and each of its three phalanx levels the
//! analyzer keeps rolling windows of thumb-distance and distance-speed. A
//! tap reads as a low→peak→low shape on the speed window; a finger qualifies
//! only when at least two of its phalanges show the shape in the same tick.
//! Among qualifying fingers the one with the closest approach wins, and a
//! cooldown window suppresses duplicate emissions for the same physical tap.
//!
//! # Per-tick sequence
//!
//! ```text
//! feature store ──► update windows ──► cooldown gate ──► template match
//!                                                            │
//!                        emit ◄── closest approach ◄── phalanx arbitration
//! ```

use std::array;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analyze::{Analyzer, AnalyzerError, SampleRing};
use crate::pipeline::frame::{Finger, Handedness, Phalanx, ALL_PHALANGES, TAP_FINGERS};
use crate::store::{Event, EventBus, EventPayload, FeatureStore, TapSnapshot, TAP_DETECTED};

/// Stand-in distance for a phalanx without a usable snapshot; keeps missing
/// data from ever winning the ordinal comparison.
const MISSING_DISTANCE: f64 = 100.0;

/// Thresholds and window geometry of the all-finger tap analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TapAllConfig {
    /// Window length in ticks (≈500 ms at the nominal ~50 ms tick).
    pub ring_size: usize,
    /// Distance-speed below this reads as "at rest".
    pub speed_low: f64,
    /// Distance-speed above this reads as a tap-like burst.
    pub speed_high: f64,
    /// Minimum spacing between two emitted taps.
    pub cooldown_ms: f64,
}

impl Default for TapAllConfig {
    fn default() -> Self {
        Self {
            ring_size: 10,
            speed_low: 0.1,
            speed_high: 0.6,
            cooldown_ms: 250.0,
        }
    }
}

impl TapAllConfig {
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if self.ring_size < 3 {
            return Err(AnalyzerError::ConfigError(format!(
                "ring_size must be at least 3, got {}",
                self.ring_size
            )));
        }
        if self.speed_low >= self.speed_high {
            return Err(AnalyzerError::ConfigError(format!(
                "speed_low ({}) must be below speed_high ({})",
                self.speed_low, self.speed_high
            )));
        }
        if self.cooldown_ms < 0.0 {
            return Err(AnalyzerError::ConfigError(
                "cooldown_ms must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

struct PhalanxWindow {
    speed: SampleRing,
    distance: SampleRing,
}

impl PhalanxWindow {
    fn new(size: usize) -> Self {
        Self {
            speed: SampleRing::new(size),
            distance: SampleRing::new(size),
        }
    }
}

/// Ordinal phalanx arbitration on the three snapshot distances.
///
/// Strictly ascending toward the base picks the tip, strictly ascending
/// toward the tip picks the middle, and everything else (every tie
/// included) falls through to the base.
pub(crate) fn winning_phalanx(base: f64, middle: f64, tip: f64) -> Phalanx {
    if tip < middle && middle < base {
        Phalanx::Tip
    } else if base < middle && middle < tip {
        Phalanx::Middle
    } else {
        Phalanx::Base
    }
}

pub struct TapAllAnalyzer {
    enabled: bool,
    config: TapAllConfig,
    /// Windows indexed [finger][phalanx] in `TAP_FINGERS`/`ALL_PHALANGES`
    /// order.
    windows: [[PhalanxWindow; 3]; 4],
    last_emit_ms: Option<f64>,
}

impl TapAllAnalyzer {
    pub fn new(config: TapAllConfig) -> Result<Self, AnalyzerError> {
        config.validate()?;
        let size = config.ring_size;
        Ok(Self {
            enabled: true,
            config,
            windows: array::from_fn(|_| array::from_fn(|_| PhalanxWindow::new(size))),
            last_emit_ms: None,
        })
    }

    fn update_windows(&mut self, store: &FeatureStore, hand: Option<Handedness>) {
        for (fi, finger) in TAP_FINGERS.iter().enumerate() {
            for (pi, phalanx) in ALL_PHALANGES.iter().enumerate() {
                let window = &mut self.windows[fi][pi];
                let speed_name =
                    format!("thumb_to_{}{}_distspeed", finger.label(), phalanx.suffix());
                let dist_name = format!("thumb_to_{}{}_dist", finger.label(), phalanx.suffix());

                // A missing key repeats the newest slot and never aborts
                match store.get_number(&speed_name, hand) {
                    Some(speed) => window.speed.push(speed),
                    None => window.speed.push_repeat(),
                }
                match store.get_number(&dist_name, hand) {
                    Some(distance) => window.distance.push(distance),
                    None => window.distance.push_repeat(),
                }
            }
        }
    }

    fn snapshot_finger(&self, fi: usize) -> TapSnapshot {
        let mut snapshot = TapSnapshot::default();
        for pi in 0..ALL_PHALANGES.len() {
            let window = &self.windows[fi][pi];
            if window
                .speed
                .matches_low_peak_low(self.config.speed_low, self.config.speed_high)
            {
                let peak = window.speed.max_index();
                snapshot.matched[pi] = true;
                snapshot.distance[pi] = window.distance.get(peak);
                snapshot.speed[pi] = window.speed.get(peak);
            }
        }
        snapshot
    }
}

impl Analyzer for TapAllAnalyzer {
    fn name(&self) -> &'static str {
        "TapAllAnalyzer"
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
        // Windows advance every tick, cooldown or not
        self.update_windows(store, hand);

        if let Some(last) = self.last_emit_ms {
            if now_ms - last < self.config.cooldown_ms {
                return;
            }
        }

        let mut best: Option<(Finger, Phalanx, f64, TapSnapshot)> = None;
        for (fi, &finger) in TAP_FINGERS.iter().enumerate() {
            let snapshot = self.snapshot_finger(fi);
            let matches = snapshot.matched.iter().filter(|m| **m).count();
            // A single matching phalanx is noise
            if matches < 2 {
                continue;
            }

            let substitute = |d: f64| if d > 0.0 { d } else { MISSING_DISTANCE };
            let phalanx = winning_phalanx(
                substitute(snapshot.distance[0]),
                substitute(snapshot.distance[1]),
                substitute(snapshot.distance[2]),
            );
            let distance = snapshot.distance[phalanx.index()];
            if distance <= 0.0 {
                continue;
            }
            debug!(
                "{} finger qualifies with {} phalanx matches, {:?} wins at {:.3}",
                finger, matches, phalanx, distance
            );

            let closer = best
                .as_ref()
                .map_or(true, |(_, _, best_distance, _)| distance < *best_distance);
            if closer {
                best = Some((finger, phalanx, distance, snapshot));
            }
        }

        if let Some((finger, phalanx, distance, snapshot)) = best {
            info!(
                "Tap detected: {} finger, {:?} phalanx, approach {:.3} at {:.1}ms",
                finger, phalanx, distance, now_ms
            );
            let mut event = Event::new(
                TAP_DETECTED,
                EventPayload::Tap {
                    finger,
                    phalanx,
                    snapshot,
                },
                now_ms,
            );
            if let Some(hand) = hand {
                event = event.with_hand(hand);
            }
            bus.emit(event);
            self.last_emit_ms = Some(now_ms);
        }
    }
}
