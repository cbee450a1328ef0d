use std::env;
use std::path::PathBuf;

use color_eyre::eyre::{bail, eyre, Result};
use tokio::time::Duration;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use opengesture::config;
use opengesture::pipeline::engine::PipelineEngineHandle;
use opengesture::replay;
use opengesture::store::EventPayload;

struct ReplayArgs {
    recording: PathBuf,
    config_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let args = parse_args()?;

    // Resolve configuration: explicit path wins, otherwise the user config
    let pipeline_config = match &args.config_path {
        Some(path) => config::load_config(path)
            .map_err(|e| eyre!("Failed to load configuration from {:?}: {}", path, e))?,
        None => {
            let default_path = match config::ensure_default_config() {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Unable to prepare default configuration: {}", e);
                    None
                }
            };
            config::load_or_default(default_path.as_deref())
        }
    };

    info!("Loading recording from {:?}", args.recording);
    let results = replay::load_results_from_csv(&args.recording)
        .map_err(|e| eyre!("Failed to load recording: {}", e))?;
    info!("Loaded {} frames", results.len());

    // Spawn the pipeline engine and wire its channels
    let mut engine_handle = PipelineEngineHandle::new("gesture-pipeline".to_string());
    let (mut event_receiver, frame_sender) = engine_handle
        .start(&pipeline_config)
        .map_err(|e| eyre!("Failed to start pipeline engine: {}", e))?;
    let status_receiver = engine_handle.subscribe_status();

    // Consumer task: report every gesture event as it arrives
    let printer = tokio::spawn(async move {
        let mut count: u64 = 0;
        while let Some(event) = event_receiver.recv().await {
            count += 1;
            match &event.payload {
                EventPayload::Tap {
                    finger, phalanx, ..
                } => {
                    info!(
                        "[{:>8.1}ms] tap: {} finger ({:?} phalanx)",
                        event.timestamp_ms, finger, phalanx
                    );
                }
                EventPayload::TipTap { finger, distance } => {
                    info!(
                        "[{:>8.1}ms] tip tap: {} finger at {:.3}",
                        event.timestamp_ms, finger, distance
                    );
                }
                other => debug!("Event '{}': {:?}", event.kind, other),
            }
        }
        count
    });

    // Feed frames at recorded pacing
    let mut previous_ts: Option<f64> = None;
    for result in results {
        if let Some(prev) = previous_ts {
            let gap = (result.timestamp_ms - prev).clamp(0.0, 1000.0);
            if gap > 0.0 {
                tokio::time::sleep(Duration::from_millis(gap as u64)).await;
            }
        }
        previous_ts = Some(result.timestamp_ms);
        frame_sender
            .send(result)
            .await
            .map_err(|e| eyre!("Pipeline engine went away: {}", e))?;
    }

    // Closing the frame channel drains the engine loop
    drop(frame_sender);
    engine_handle
        .shutdown()
        .await
        .map_err(|e| eyre!("Engine shutdown failed: {}", e))?;

    let events = printer.await?;
    if let Some(status_rx) = status_receiver {
        let status = status_rx.borrow();
        info!(
            "Replay finished: {} frames, {:.1} avg fps, {:.2}ms avg processing, {} gesture events",
            status.frame_count, status.average_fps, status.average_processing_ms, events
        );
    } else {
        info!("Replay finished: {} gesture events", events);
    }

    Ok(())
}

fn parse_args() -> Result<ReplayArgs> {
    let mut recording: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| eyre!("--config requires a path"))?;
                config_path = Some(PathBuf::from(value));
            }
            _ => {
                if recording.is_some() {
                    bail!("Usage: opengesture [--config <config.toml>] <recording.csv>");
                }
                recording = Some(PathBuf::from(arg));
            }
        }
    }

    let recording = recording.ok_or_else(|| eyre!("A recording CSV file must be specified"))?;
    Ok(ReplayArgs {
        recording,
        config_path,
    })
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
