//! Pipeline engine with statum state machine for lifecycle management.
//!
//! Wraps the synchronous [`GesturePipeline`] core in a 5-state lifecycle
//! with compile-time state safety. The engine runs in its own tokio task,
//! drains estimator results from its input channel, forwards every emitted
//! gesture event over the output channel and publishes tracking status
//! through a watch channel.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Configured ──► Active ──► Deactivating ──► Deactivated
//!                                    │            ▲
//!                                    └────────────┘
//!                                      (shutdown)
//! ```
//!
//! # Architecture
//!
//! ```text
//! EstimatorResult ──► [GesturePipeline] ──► Event
//!        ▲                   │                │
//!        │             [watch: status]       ▼
//!    Frame Channel                      Event Channel
//! ```

use chrono::Local;
use statum::{machine, state};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::analyze::AnalyzerError;
use crate::config::PipelineConfig;
use crate::pipeline::processor::{EstimatorResult, GesturePipeline};
use crate::pipeline::status::TrackingStatus;
use crate::store::{Event, WILDCARD};

/// Errors raised while managing the engine lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to build pipeline: {0}")]
    ConfigurationError(#[from] AnalyzerError),

    #[error("Engine has no pipeline available: {0}")]
    PipelineError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Engine task panicked: {0}")]
    TaskError(String),
}

/// States for the pipeline engine lifecycle using statum.
#[state]
#[derive(Debug, Clone)]
pub enum EngineState {
    Initializing, // Setting up engine structure
    Configured,   // Pipeline built and event forwarding wired
    Active,       // Draining frames in the main loop
    Deactivating, // Shutting down gracefully
    Deactivated,  // Fully stopped, ready for cleanup
}

/// Pipeline engine with compile-time state safety via statum.
#[machine]
pub struct PipelineEngine<S: EngineState> {
    frame_receiver: mpsc::Receiver<EstimatorResult>,
    event_sender: mpsc::Sender<Event>,
    status_sender: watch::Sender<TrackingStatus>,
    name: String,
    pipeline: Option<GesturePipeline>,
}

impl<S: EngineState> PipelineEngine<S> {
    pub fn get_name(&self) -> &str {
        &self.name
    }
}

impl PipelineEngine<Initializing> {
    pub fn create(
        frame_receiver: mpsc::Receiver<EstimatorResult>,
        event_sender: mpsc::Sender<Event>,
        status_sender: watch::Sender<TrackingStatus>,
        name: String,
    ) -> Self {
        info!("Initializing new pipeline engine: {}", name);

        Self::new(
            frame_receiver,
            event_sender,
            status_sender,
            name,
            None, // pipeline
        )
    }

    /// Builds the pipeline from configuration, wires event forwarding, and
    /// transitions to Configured.
    pub fn configure(
        mut self,
        config: &PipelineConfig,
    ) -> Result<PipelineEngine<Configured>, EngineError> {
        info!("Configuring pipeline engine: {}", self.name);

        let mut pipeline = GesturePipeline::from_config(config)?;

        // Every event the analyzers emit also leaves through the channel
        let forward = self.event_sender.clone();
        pipeline.event_bus_mut().on(
            WILDCARD,
            Box::new(move |event| {
                if let Err(e) = forward.try_send(event.clone()) {
                    warn!("Dropping event '{}': {}", event.kind, e);
                }
            }),
        );
        pipeline.start_detection();

        self.pipeline = Some(pipeline);
        info!("Engine configured successfully: {}", self.name);
        Ok(self.transition())
    }
}

impl PipelineEngine<Configured> {
    pub fn activate(self) -> PipelineEngine<Active> {
        info!("Activating pipeline engine: {}", self.name);
        self.transition()
    }
}

impl PipelineEngine<Active> {
    /// Runs one synchronous processing turn and publishes fresh status.
    pub fn process_result(&mut self, result: EstimatorResult) -> Result<(), EngineError> {
        let pipeline = self
            .pipeline
            .as_mut()
            .ok_or_else(|| EngineError::PipelineError("No pipeline available".to_string()))?;

        pipeline.process_result(result);
        self.status_sender.send_replace(pipeline.status().clone());
        Ok(())
    }

    /// Main processing loop with graceful shutdown support.
    ///
    /// Runs until the shutdown signal fires or the frame channel closes.
    /// Individual processing errors are logged and do not stop the loop.
    pub async fn run_until_shutdown(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<PipelineEngine<Deactivating>, EngineError> {
        info!("Starting frame processing loop for: {}", self.name);

        // Throughput stats, logged every 30 seconds
        let mut frames: u64 = 0;
        let mut last_stats_time = Local::now();
        let stats_interval = chrono::Duration::seconds(30);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received for: {}", self.name);
                    break;
                }

                maybe_result = self.frame_receiver.recv() => {
                    match maybe_result {
                        Some(result) => {
                            debug!(
                                "Received estimator result with {} hands at {:.1}ms",
                                result.hands.len(),
                                result.timestamp_ms
                            );
                            if let Err(e) = self.process_result(result) {
                                error!("Error processing frame: {}", e);
                            }
                            frames += 1;
                        }
                        None => {
                            info!("Frame channel closed for: {}", self.name);
                            break;
                        }
                    }

                    let now = Local::now();
                    if now - last_stats_time > stats_interval {
                        let elapsed = (now - last_stats_time).num_seconds().max(1);
                        info!(
                            "Engine stats: {} frames in {}s ({:.2}/sec)",
                            frames,
                            elapsed,
                            frames as f64 / elapsed as f64
                        );
                        frames = 0;
                        last_stats_time = now;
                    }
                }
            }
        }

        info!("Transitioning to Deactivating state: {}", self.name);
        Ok(self.transition())
    }

    pub fn deactivate(self) -> PipelineEngine<Deactivating> {
        info!("Deactivating pipeline engine: {}", self.name);
        self.transition()
    }
}

impl PipelineEngine<Deactivating> {
    /// Stops detection bookkeeping and transitions to Deactivated.
    pub fn shutdown(mut self) -> PipelineEngine<Deactivated> {
        info!("Shutting down pipeline engine: {}", self.name);

        if let Some(pipeline) = &mut self.pipeline {
            pipeline.stop_detection();
        }

        info!("Engine shut down successfully: {}", self.name);
        self.transition()
    }
}

impl PipelineEngine<Deactivated> {}

/// Handle for managing a pipeline engine in a tokio task.
///
/// Provides lifecycle management for the engine running in a background
/// task: task spawning, graceful shutdown, and resource cleanup.
pub struct PipelineEngineHandle {
    pub name: String,

    task_handle: Option<JoinHandle<Result<(), EngineError>>>,

    shutdown_tx: Option<oneshot::Sender<()>>,

    status_receiver: Option<watch::Receiver<TrackingStatus>>,
}

impl PipelineEngineHandle {
    pub fn new(name: String) -> Self {
        Self {
            name,
            task_handle: None,
            shutdown_tx: None,
            status_receiver: None,
        }
    }

    /// Builds the engine, activates it and spawns the processing loop.
    ///
    /// # Returns
    ///
    /// * Output receiver for emitted gesture events
    /// * Input sender for estimator results
    pub fn start(
        &mut self,
        config: &PipelineConfig,
    ) -> Result<(mpsc::Receiver<Event>, mpsc::Sender<EstimatorResult>), EngineError> {
        let (frame_sender, frame_receiver) = mpsc::channel(100);
        let (event_sender, event_receiver) = mpsc::channel(100);
        let (status_sender, status_receiver) = watch::channel(TrackingStatus::default());
        self.status_receiver = Some(status_receiver);

        let engine_name = self.name.clone();
        let engine = PipelineEngine::create(
            frame_receiver,
            event_sender,
            status_sender,
            engine_name.clone(),
        )
        .configure(config)?;

        let active_engine = engine.activate();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);
        let task_handle = tokio::spawn(async move {
            info!("Spawning running engine: {}", engine_name);
            match active_engine.run_until_shutdown(shutdown_rx).await {
                Ok(deactivating_engine) => {
                    info!("Engine entering deactivating state: {}", engine_name);
                    let _ = deactivating_engine.shutdown();
                    Ok(())
                }
                Err(e) => {
                    error!("Error running engine: {} - {}", engine_name, e);
                    Err(e)
                }
            }
        });

        self.task_handle = Some(task_handle);

        info!("Pipeline engine activated: {}", self.name);
        Ok((event_receiver, frame_sender))
    }

    /// Watch channel carrying the latest tracking status snapshot.
    pub fn subscribe_status(&self) -> Option<watch::Receiver<TrackingStatus>> {
        self.status_receiver.clone()
    }

    /// Gracefully shuts down the engine and waits for task completion.
    pub async fn shutdown(&mut self) -> Result<(), EngineError> {
        debug!("Sending shutdown signal to engine: {}", self.name);

        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Engine task already terminated: {}", self.name);
            }
        }

        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => {
                    debug!("Engine task completed: {}", self.name);
                    result
                }
                Err(e) => {
                    error!("Engine task panicked: {} - {}", self.name, e);
                    Err(EngineError::TaskError(format!(
                        "Engine task panicked: {}",
                        e
                    )))
                }
            }
        } else {
            debug!("Engine already shut down: {}", self.name);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::{Hand, Handedness, Landmark, LANDMARK_COUNT};
    use crate::store::TAP_DETECTED;

    fn single_hand_result(ts: f64) -> EstimatorResult {
        EstimatorResult {
            hands: vec![Hand {
                landmarks: vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT],
                handedness: Handedness::Right,
                confidence: 0.9,
            }],
            timestamp_ms: ts,
        }
    }

    #[tokio::test]
    async fn engine_processes_frames_and_publishes_status() {
        let mut handle = PipelineEngineHandle::new("test-engine".to_string());
        let (_event_rx, frame_tx) = handle.start(&PipelineConfig::default()).unwrap();
        let mut status_rx = handle.subscribe_status().unwrap();

        for tick in 0..5 {
            frame_tx
                .send(single_hand_result((tick + 1) as f64 * 50.0))
                .await
                .unwrap();
        }
        drop(frame_tx);

        // Wait until the engine has drained every queued frame before
        // signalling shutdown
        while status_rx.borrow().frame_count < 5 {
            status_rx.changed().await.unwrap();
        }

        handle.shutdown().await.unwrap();
        let status = status_rx.borrow();
        assert_eq!(status.frame_count, 5);
        assert!(status.has_hand(Handedness::Right));
    }

    #[tokio::test]
    async fn shutdown_without_frames_is_clean() {
        let mut handle = PipelineEngineHandle::new("idle-engine".to_string());
        let (_event_rx, _frame_tx) = handle.start(&PipelineConfig::default()).unwrap();
        handle.shutdown().await.unwrap();
        // Second shutdown is a no-op
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn emitted_events_are_forwarded_over_the_channel() {
        use crate::pipeline::frame::{
            INDEX_DIP, INDEX_MCP, INDEX_PIP, INDEX_TIP, PINKY_MCP, THUMB_TIP, WRIST,
        };

        fn tap_hand(off: f64) -> Hand {
            let mut landmarks = vec![Landmark::new(0.9, 0.9, 0.0); LANDMARK_COUNT];
            landmarks[WRIST] = Landmark::new(0.5, 0.8, 0.0);
            landmarks[INDEX_MCP] = Landmark::new(0.45, 0.5, 0.0);
            landmarks[PINKY_MCP] = Landmark::new(0.7, 0.5, 0.0);
            landmarks[THUMB_TIP] = Landmark::new(0.3, 0.4, 0.0);
            landmarks[INDEX_PIP] = Landmark::new(0.3 + off + 0.02, 0.4, 0.0);
            landmarks[INDEX_DIP] = Landmark::new(0.3 + off + 0.01, 0.4, 0.0);
            landmarks[INDEX_TIP] = Landmark::new(0.3 + off, 0.4, 0.0);
            Hand {
                landmarks,
                handedness: Handedness::Right,
                confidence: 0.95,
            }
        }

        let mut handle = PipelineEngineHandle::new("tap-engine".to_string());
        let (mut event_rx, frame_tx) = handle.start(&PipelineConfig::default()).unwrap();
        let mut status_rx = handle.subscribe_status().unwrap();

        for tick in 0..12u32 {
            let off = if tick < 6 { 0.15 } else { 0.08 };
            frame_tx
                .send(EstimatorResult {
                    hands: vec![tap_hand(off)],
                    timestamp_ms: (tick as f64 + 1.0) * 50.0,
                })
                .await
                .unwrap();
        }
        drop(frame_tx);
        while status_rx.borrow().frame_count < 12 {
            status_rx.changed().await.unwrap();
        }
        handle.shutdown().await.unwrap();

        let mut saw_tap = false;
        while let Ok(event) = event_rx.try_recv() {
            if event.kind == TAP_DETECTED {
                saw_tap = true;
            }
        }
        assert!(saw_tap, "expected a forwarded tap event");
    }
}
