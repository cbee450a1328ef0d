//! Sliding-window gesture analyzers.
//!
//! Analyzers read features from the store each tick, keep bounded rolling
//! windows of the signals they care about, and emit gesture events through
//! the bus. They never touch frames directly, and a tick with nothing to
//! report is a silent no-op.

pub mod ring;
pub mod tap_all;
pub mod tap_tip;

pub use ring::SampleRing;
pub use tap_all::{TapAllAnalyzer, TapAllConfig};
pub use tap_tip::{TapTipAnalyzer, TapTipConfig};

use thiserror::Error;

use crate::pipeline::frame::Handedness;
use crate::store::{EventBus, FeatureStore};

/// Errors raised while validating analyzer configuration.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Uniform capability of one analyzer, registered as a boxed trait object in
/// the ordered collection the pipeline owns.
///
/// `now_ms` is the current frame's timestamp; cooldown bookkeeping runs on
/// frame time, never on a wall clock, so replayed sessions behave exactly
/// like live ones. `hand` carries the handedness of the single detected hand
/// for feature lookups and event tagging.
pub trait Analyzer: Send + 'static {
    fn name(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Runs one tick: update windows, detect, arbitrate, emit.
    fn analyze(
        &mut self,
        store: &FeatureStore,
        bus: &mut EventBus,
        now_ms: f64,
        hand: Option<Handedness>,
    );
}
