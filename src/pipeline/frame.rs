//! Core frame types shared by every pipeline stage.
//!
//! A [`Frame`] is built once per estimator callback, mutated in place by the
//! preprocessor chain, read by the extractors and then dropped. Only derived
//! features and events outlive the frame.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Hand landmark indices as delivered by the estimator (21 points per hand)
pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Number of landmarks a fully tracked hand carries.
pub const LANDMARK_COUNT: usize = 21;

/// The five fingertip landmark indices, thumb first.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// A single 3D point in normalized camera space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 3D Euclidean distance to another landmark.
    pub fn distance_to(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Checks finiteness and plausible bounds for a landmark that already
    /// went through the preprocessor chain (centered coordinates can leave
    /// the raw 0..1 camera window, so the window here is deliberately wide).
    pub fn is_plausible(&self) -> bool {
        if !self.x.is_finite() || !self.y.is_finite() || !self.z.is_finite() {
            return false;
        }
        self.x.abs() <= 5.0 && self.y.abs() <= 5.0 && self.z.abs() <= 5.0
    }
}

// Which hand the estimator believes it is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// The opposite label, used when mirrored input swaps the hands.
    pub fn flipped(self) -> Self {
        match self {
            Handedness::Left => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => write!(f, "Left"),
            Handedness::Right => write!(f, "Right"),
        }
    }
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Left" | "left" => Ok(Handedness::Left),
            "Right" | "right" => Ok(Handedness::Right),
            other => Err(format!("unknown handedness label: {other}")),
        }
    }
}

// Finger identifiers, thumb included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

/// All five fingers, thumb first.
pub const ALL_FINGERS: [Finger; 5] = [
    Finger::Thumb,
    Finger::Index,
    Finger::Middle,
    Finger::Ring,
    Finger::Pinky,
];

/// The four fingers the tap analyzers track (everything except the thumb).
pub const TAP_FINGERS: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

impl Finger {
    pub fn label(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }

    /// Landmark index of this finger's tip.
    pub fn tip(self) -> usize {
        match self {
            Finger::Thumb => THUMB_TIP,
            Finger::Index => INDEX_TIP,
            Finger::Middle => MIDDLE_TIP,
            Finger::Ring => RING_TIP,
            Finger::Pinky => PINKY_TIP,
        }
    }

    /// Landmark index of this finger's knuckle (MCP joint).
    pub fn mcp(self) -> usize {
        match self {
            Finger::Thumb => THUMB_CMC,
            Finger::Index => INDEX_MCP,
            Finger::Middle => MIDDLE_MCP,
            Finger::Ring => RING_MCP,
            Finger::Pinky => PINKY_MCP,
        }
    }

    /// The four joint indices along the finger chain, knuckle to tip.
    pub fn chain(self) -> [usize; 4] {
        match self {
            Finger::Thumb => [THUMB_CMC, THUMB_MCP, THUMB_IP, THUMB_TIP],
            Finger::Index => [INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP],
            Finger::Middle => [MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP],
            Finger::Ring => [RING_MCP, RING_PIP, RING_DIP, RING_TIP],
            Finger::Pinky => [PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP],
        }
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One of the three phalanx-level landmark groupings of a non-thumb finger,
/// ordered base → middle → tip along the bone chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phalanx {
    Base,
    Middle,
    Tip,
}

/// All phalanx levels in ring-buffer order (base = 0, middle = 1, tip = 2).
pub const ALL_PHALANGES: [Phalanx; 3] = [Phalanx::Base, Phalanx::Middle, Phalanx::Tip];

impl Phalanx {
    pub fn index(self) -> usize {
        match self {
            Phalanx::Base => 0,
            Phalanx::Middle => 1,
            Phalanx::Tip => 2,
        }
    }

    /// Single-letter suffix used in distance feature names.
    pub fn suffix(self) -> &'static str {
        match self {
            Phalanx::Base => "B",
            Phalanx::Middle => "M",
            Phalanx::Tip => "T",
        }
    }

    /// Landmark index of this phalanx level on the given finger
    /// (PIP / DIP / TIP along the chain; thumb maps onto its own joints).
    pub fn landmark(self, finger: Finger) -> usize {
        let chain = finger.chain();
        match self {
            Phalanx::Base => chain[1],
            Phalanx::Middle => chain[2],
            Phalanx::Tip => chain[3],
        }
    }
}

/// One detected hand inside a frame.
#[derive(Debug, Clone)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
    pub handedness: Handedness,
    pub confidence: f64,
}

impl Hand {
    /// Landmark at `index`, if the hand carries that many points.
    pub fn landmark(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    /// Landmark at `index`, only if present and within plausible bounds.
    pub fn valid_landmark(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index).filter(|lm| lm.is_plausible())
    }

    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= LANDMARK_COUNT
    }
}

/// A single processed unit of estimator output: up to two hands plus the
/// estimator's monotonic timestamp in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub hands: Vec<Hand>,
    pub timestamp_ms: f64,
}

impl Frame {
    pub fn new(hands: Vec<Hand>, timestamp_ms: f64) -> Self {
        Self {
            hands,
            timestamp_ms,
        }
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(3.0, 4.0, 0.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_landmark_is_rejected() {
        assert!(!Landmark::new(f64::NAN, 0.0, 0.0).is_plausible());
        assert!(!Landmark::new(0.0, f64::INFINITY, 0.0).is_plausible());
        assert!(!Landmark::new(12.0, 0.0, 0.0).is_plausible());
        assert!(Landmark::new(-1.2, 0.4, 0.1).is_plausible());
    }

    #[test]
    fn phalanx_landmarks_follow_the_chain() {
        assert_eq!(Phalanx::Base.landmark(Finger::Index), INDEX_PIP);
        assert_eq!(Phalanx::Middle.landmark(Finger::Index), INDEX_DIP);
        assert_eq!(Phalanx::Tip.landmark(Finger::Index), INDEX_TIP);
        assert_eq!(Phalanx::Tip.landmark(Finger::Pinky), PINKY_TIP);
    }

    #[test]
    fn handedness_flip_is_involutive() {
        assert_eq!(Handedness::Left.flipped(), Handedness::Right);
        assert_eq!(Handedness::Left.flipped().flipped(), Handedness::Left);
    }
}
