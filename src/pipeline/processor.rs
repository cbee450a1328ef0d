//! Synchronous per-frame orchestration.
//!
//! [`GesturePipeline`] owns all shared state (feature store, event bus with
//! its history, tracking status) and the ordered component collections. One
//! call to [`GesturePipeline::process_result`] runs a complete turn
//! (convert → preprocess → extract, gated by hand count → analyze) to
//! completion before returning; nothing blocks or suspends inside a turn.
//!
//! # Architecture
//!
//! ```text
//! EstimatorResult ──► convert ──► [Preprocessors] ──► [Extractors] ──► FeatureStore
//!                    (mirroring)                                           │
//!                                              EventBus ◄── [Analyzers] ◄──┘
//! ```

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analyze::{Analyzer, AnalyzerError, TapAllAnalyzer, TapTipAnalyzer};
use crate::config::PipelineConfig;
use crate::extract::{
    FeatureExtractor, FingerAngle, FingerCurvature, FingerDistance, FingerKinematics, HandOrientation,
    HandSize,
};
use crate::pipeline::frame::{Frame, Hand, Phalanx};
use crate::pipeline::status::{StatusTracker, TrackingStatus};
use crate::preprocess::{
    CenterPreprocessor, NormalizePreprocessor, Preprocessor, SmoothPreprocessor,
};
use crate::store::{EventBus, EventHistory, FeatureStore};

/// Coordinate convention of the incoming landmark stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// Landmarks as seen by the camera.
    #[default]
    Camera,
    /// Mirrored preview: x is reflected and handedness labels are swapped.
    Selfie,
}

/// One estimator callback's worth of detections, before conversion.
#[derive(Debug, Clone, Default)]
pub struct EstimatorResult {
    pub hands: Vec<Hand>,
    pub timestamp_ms: f64,
}

/// The synchronous pipeline core: sole owner of stores and components.
pub struct GesturePipeline {
    coordinate_system: CoordinateSystem,
    preprocessors: Vec<Box<dyn Preprocessor>>,
    extractors: Vec<Box<dyn FeatureExtractor>>,
    analyzers: Vec<Box<dyn Analyzer>>,
    store: FeatureStore,
    bus: EventBus,
    status: StatusTracker,
    current_frame: Option<Frame>,
}

impl GesturePipeline {
    /// Empty pipeline; components are registered explicitly.
    pub fn new(coordinate_system: CoordinateSystem) -> Self {
        Self::with_stores(
            coordinate_system,
            FeatureStore::new(),
            EventBus::new(EventHistory::new()),
        )
    }

    pub fn with_stores(
        coordinate_system: CoordinateSystem,
        store: FeatureStore,
        bus: EventBus,
    ) -> Self {
        Self {
            coordinate_system,
            preprocessors: Vec::new(),
            extractors: Vec::new(),
            analyzers: Vec::new(),
            store,
            bus,
            status: StatusTracker::new(),
            current_frame: None,
        }
    }

    /// Full pipeline as configured: preprocessor chain in fixed order
    /// (center → normalize → smooth), every extractor, both tap analyzers.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, AnalyzerError> {
        let store = FeatureStore::with_history_size(config.feature_history_size);
        let bus = EventBus::new(EventHistory::with_retention(config.event_retention));
        let mut pipeline = Self::with_stores(config.coordinate_system, store, bus);

        let mut center = CenterPreprocessor::new();
        center.set_enabled(config.preprocess.center_enabled);
        pipeline.add_preprocessor(Box::new(center));

        let mut normalize = NormalizePreprocessor::new();
        normalize.set_enabled(config.preprocess.normalize_enabled);
        pipeline.add_preprocessor(Box::new(normalize));

        let mut smooth = SmoothPreprocessor::with_noise(
            config.preprocess.process_noise,
            config.preprocess.measurement_noise,
        );
        smooth.set_enabled(config.preprocess.smooth_enabled);
        pipeline.add_preprocessor(Box::new(smooth));

        pipeline.add_extractor(Box::new(FingerDistance::new(Phalanx::Base)));
        pipeline.add_extractor(Box::new(FingerDistance::new(Phalanx::Middle)));
        pipeline.add_extractor(Box::new(FingerDistance::new(Phalanx::Tip)));
        pipeline.add_extractor(Box::new(FingerAngle::new()));
        pipeline.add_extractor(Box::new(FingerCurvature::new()));
        pipeline.add_extractor(Box::new(FingerKinematics::new()));
        pipeline.add_extractor(Box::new(HandOrientation::new()));
        pipeline.add_extractor(Box::new(HandSize::new()));

        pipeline.add_analyzer(Box::new(TapAllAnalyzer::new(config.tap_all.clone())?));
        pipeline.add_analyzer(Box::new(TapTipAnalyzer::new(config.tap_tip.clone())?));

        Ok(pipeline)
    }

    pub fn add_preprocessor(&mut self, preprocessor: Box<dyn Preprocessor>) {
        info!("Preprocessor registered: {}", preprocessor.name());
        self.preprocessors.push(preprocessor);
    }

    pub fn add_extractor(&mut self, extractor: Box<dyn FeatureExtractor>) {
        info!("Extractor registered: {}", extractor.name());
        self.extractors.push(extractor);
    }

    pub fn add_analyzer(&mut self, analyzer: Box<dyn Analyzer>) {
        info!("Analyzer registered: {}", analyzer.name());
        self.analyzers.push(analyzer);
    }

    pub fn feature_store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn event_bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn event_history(&self) -> &EventHistory {
        self.bus.history()
    }

    pub fn status(&self) -> &TrackingStatus {
        self.status.status()
    }

    /// The latest frame after preprocessing, for consumers that render it.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.current_frame.as_ref()
    }

    pub fn start_detection(&mut self) {
        info!("Detection started");
        self.status.start_detection();
    }

    pub fn stop_detection(&mut self) {
        info!("Detection stopped");
        self.status.stop_detection();
    }

    /// Runs one complete processing turn for one estimator callback.
    pub fn process_result(&mut self, result: EstimatorResult) {
        let turn_started = Instant::now();

        let mut frame = self.convert_result(result);
        self.status.begin_frame(&frame);

        for preprocessor in &mut self.preprocessors {
            if preprocessor.is_enabled() {
                frame = preprocessor.apply(frame);
            }
        }

        let hand_count = frame.hand_count();
        let timestamp_ms = frame.timestamp_ms;
        let single_hand = hand_count == 1;
        let hand = frame.hands.first().map(|h| h.handedness);
        self.current_frame = Some(frame);

        // Extraction and analysis run only on single-hand frames
        if single_hand {
            let frame = self.current_frame.as_ref().expect("frame was just stored");
            let mut produced = Vec::new();
            for extractor in &mut self.extractors {
                produced.extend(extractor.extract(frame));
            }
            let count = produced.len();
            for feature in produced {
                self.store.set_feature(feature);
            }
            debug!("{} features extracted at {:.1}ms", count, timestamp_ms);

            for analyzer in &mut self.analyzers {
                if analyzer.is_enabled() {
                    analyzer.analyze(&self.store, &mut self.bus, timestamp_ms, hand);
                }
            }
        } else {
            debug!(
                "{} hands detected at {:.1}ms, extraction skipped",
                hand_count, timestamp_ms
            );
        }

        self.status
            .record_processing(turn_started.elapsed().as_secs_f64() * 1000.0);
    }

    /// Drops all temporal state: stores, component caches, counters.
    pub fn reset(&mut self) {
        self.store.clear();
        self.bus.history_mut().clear();
        for preprocessor in &mut self.preprocessors {
            preprocessor.reset();
        }
        for extractor in &mut self.extractors {
            extractor.reset();
        }
        self.status.reset();
        self.current_frame = None;
        info!("Pipeline state reset");
    }

    /// Translates raw estimator output into the internal frame, resolving
    /// the coordinate convention. At most two hands are kept.
    fn convert_result(&self, result: EstimatorResult) -> Frame {
        let mut hands = result.hands;
        hands.truncate(2);

        if self.coordinate_system == CoordinateSystem::Selfie {
            for hand in &mut hands {
                hand.handedness = hand.handedness.flipped();
                for landmark in &mut hand.landmarks {
                    landmark.x = 1.0 - landmark.x;
                }
            }
        }

        Frame::new(hands, result.timestamp_ms)
    }
}
