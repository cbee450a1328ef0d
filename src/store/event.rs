//! Gesture event type emitted by analyzers and distributed by the bus.

use crate::pipeline::frame::{Finger, Handedness, Phalanx};

/// Event type emitted when the all-finger tap analyzer confirms a tap.
pub const TAP_DETECTED: &str = "tap_detected";
/// Event type emitted by the single-finger tip-tap analyzer.
pub const TAP_TIP_DETECTED: &str = "tap_tip_detected";

/// Per-phalanx match snapshot taken at emission time: which phalanges matched
/// the tap template this tick and the distance/speed captured at each
/// phalanx's speed maximum (base, middle, tip order).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TapSnapshot {
    pub matched: [bool; 3],
    pub distance: [f64; 3],
    pub speed: [f64; 3],
}

/// Typed payloads carried by gesture events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Confirmed tap with the winning finger and phalanx plus the full
    /// per-phalanx evidence snapshot.
    Tap {
        finger: Finger,
        phalanx: Phalanx,
        snapshot: TapSnapshot,
    },
    /// Single-finger tip tap with the approach distance that triggered it.
    TipTap { finger: Finger, distance: f64 },
    /// Free-form payload for consumers that inject their own events.
    Text(String),
    None,
}

/// A discrete occurrence distributed through the [`EventBus`] and retained by
/// the [`EventHistory`].
///
/// [`EventBus`]: crate::store::event_bus::EventBus
/// [`EventHistory`]: crate::store::event_history::EventHistory
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: String,
    pub payload: EventPayload,
    pub timestamp_ms: f64,
    pub hand: Option<Handedness>,
}

impl Event {
    pub fn new(kind: impl Into<String>, payload: EventPayload, timestamp_ms: f64) -> Self {
        Self {
            kind: kind.into(),
            payload,
            timestamp_ms,
            hand: None,
        }
    }

    pub fn with_hand(mut self, hand: Handedness) -> Self {
        self.hand = Some(hand);
        self
    }
}
