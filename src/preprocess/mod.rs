//! Frame preprocessors applied in fixed configured order before extraction.
//!
//! Each preprocessor is a pure `Frame → Frame` transform with an individual
//! enable flag; a disabled stage passes frames through untouched. The
//! pipeline owns the ordered chain and runs it once per frame.

pub mod center;
pub mod normalize;
pub mod smooth;

pub use center::CenterPreprocessor;
pub use normalize::NormalizePreprocessor;
pub use smooth::SmoothPreprocessor;

use crate::pipeline::frame::Frame;

/// Uniform capability of one preprocessing stage.
///
/// Mirrors the strategy seam used elsewhere in the pipeline: implementations
/// are registered as boxed trait objects in an ordered collection owned by
/// the orchestrator.
pub trait Preprocessor: Send + 'static {
    /// Stable identifier used in configuration.
    fn id(&self) -> &'static str;

    /// Human-readable stage name for logs.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Transforms a frame. Only called while the stage is enabled.
    fn apply(&mut self, frame: Frame) -> Frame;

    /// Drops any accumulated temporal state.
    fn reset(&mut self) {}
}
