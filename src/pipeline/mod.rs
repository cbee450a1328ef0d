//! Pipeline core: frame types, per-frame orchestration and the engine shell.
//!
//! 1. [`frame`] - Landmark, hand and frame types shared by every stage
//! 2. [`processor`] - Synchronous per-frame orchestration and shared state
//! 3. [`status`] - Tracking counters published to consumers
//! 4. [`engine`] - Statum lifecycle machine and tokio task handle
//!
//! # Architecture
//!
//! ```text
//! Estimator ──► Engine ──► Preprocess ──► Extract ──► Analyze ──► Events
//!               (frames)   (1 hand gate applies to extract/analyze)
//! ```
//!
//! The processing core is fully synchronous; the engine only adds channel
//! plumbing and lifecycle management around it.

pub mod engine;
pub mod frame;
pub mod processor;
pub mod status;

pub use engine::{EngineError, EngineState, PipelineEngine, PipelineEngineHandle};
pub use frame::{Finger, Frame, Hand, Handedness, Landmark, Phalanx};
pub use processor::{CoordinateSystem, EstimatorResult, GesturePipeline};
pub use status::{HandInfo, StatusTracker, TrackingStatus};
