//! Feature value type produced by extractors and owned by the store.

use crate::pipeline::frame::{Finger, Handedness};

/// Payload of a feature: most features are numeric, a few are flags or labels.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

/// Discriminant used by the store's type-filtered views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Number,
    Bool,
    Text,
}

/// Hint for consumers on how a feature is meant to be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureDisplay {
    #[default]
    Number,
    Graph,
}

/// A named, timestamped value derived from one frame.
///
/// Features are immutable once stored: a new measurement creates a new entry
/// under the same key rather than mutating the old one. The declared
/// `min_max` range is advisory (display and normalization only) and is never
/// validated against.
#[derive(Debug, Clone)]
pub struct Feature {
    pub name: String,
    pub value: FeatureValue,
    /// Name of the extractor that produced this feature.
    pub parent: String,
    pub display: FeatureDisplay,
    pub min_max: (f64, f64),
    pub timestamp_ms: f64,
    pub hand: Option<Handedness>,
    pub finger: Option<Finger>,
}

impl Feature {
    /// Convenience constructor for the common numeric case.
    #[allow(clippy::too_many_arguments)]
    pub fn number(
        name: impl Into<String>,
        value: f64,
        parent: &str,
        display: FeatureDisplay,
        min_max: (f64, f64),
        timestamp_ms: f64,
        hand: Option<Handedness>,
        finger: Option<Finger>,
    ) -> Self {
        Self {
            name: name.into(),
            value: FeatureValue::Number(value),
            parent: parent.to_string(),
            display,
            min_max,
            timestamp_ms,
            hand,
            finger,
        }
    }

    pub fn kind(&self) -> FeatureKind {
        match self.value {
            FeatureValue::Number(_) => FeatureKind::Number,
            FeatureValue::Bool(_) => FeatureKind::Bool,
            FeatureValue::Text(_) => FeatureKind::Text,
        }
    }

    /// The numeric payload, if this is a numeric feature.
    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            FeatureValue::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Storage key: feature name, suffixed with the hand label when tagged.
    pub fn key(&self) -> String {
        feature_key(&self.name, self.hand)
    }
}

/// Builds the store key for a feature name and optional hand tag.
pub fn feature_key(name: &str, hand: Option<Handedness>) -> String {
    match hand {
        Some(hand) => format!("{name}_{hand}"),
        None => name.to_string(),
    }
}
