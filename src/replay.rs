//! Recorded-session loading for offline replay.
//!
//! Reads landmark recordings in the flat CSV schema
//! `frame,timestamp_ms,hand,score,landmark,x,y,z` (one row per landmark) and
//! reconstructs the ordered sequence of estimator results, ready to be fed
//! through the pipeline at recorded pacing.

use std::collections::BTreeMap;
use std::path::Path;

use csv::ReaderBuilder;
use thiserror::Error;
use tracing::{debug, warn};

use crate::pipeline::frame::{Hand, Handedness, Landmark, LANDMARK_COUNT};
use crate::pipeline::processor::EstimatorResult;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read recording: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("Recording contains no frames: {0}")]
    Empty(String),
}

struct HandAccumulator {
    confidence: f64,
    landmarks: Vec<Landmark>,
}

struct FrameAccumulator {
    timestamp_ms: f64,
    hands: BTreeMap<String, HandAccumulator>,
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    row: usize,
    field: &str,
) -> Result<T, ReplayError> {
    record
        .get(index)
        .ok_or_else(|| ReplayError::InvalidRow {
            row,
            message: format!("missing column '{field}'"),
        })?
        .trim()
        .parse()
        .map_err(|_| ReplayError::InvalidRow {
            row,
            message: format!("unparsable value for '{field}'"),
        })
}

/// Loads a recording into ordered estimator results.
pub fn load_results_from_csv(path: impl AsRef<Path>) -> Result<Vec<EstimatorResult>, ReplayError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut frames: BTreeMap<u64, FrameAccumulator> = BTreeMap::new();

    for (idx, record) in reader.records().enumerate() {
        let row = idx + 2; // 1-based, after the header line
        let record = record?;
        if record.len() < 8 {
            return Err(ReplayError::InvalidRow {
                row,
                message: format!("expected 8 columns, found {}", record.len()),
            });
        }

        let frame_index: u64 = parse_field(&record, 0, row, "frame")?;
        let timestamp_ms: f64 = parse_field(&record, 1, row, "timestamp_ms")?;
        let hand_label: String = parse_field(&record, 2, row, "hand")?;
        let score: f64 = parse_field(&record, 3, row, "score")?;
        let landmark_index: usize = parse_field(&record, 4, row, "landmark")?;
        let x: f64 = parse_field(&record, 5, row, "x")?;
        let y: f64 = parse_field(&record, 6, row, "y")?;
        let z: f64 = parse_field(&record, 7, row, "z")?;

        if landmark_index >= LANDMARK_COUNT {
            return Err(ReplayError::InvalidRow {
                row,
                message: format!("landmark index {landmark_index} out of range"),
            });
        }

        let frame = frames.entry(frame_index).or_insert_with(|| FrameAccumulator {
            timestamp_ms,
            hands: BTreeMap::new(),
        });
        let hand = frame
            .hands
            .entry(hand_label)
            .or_insert_with(|| HandAccumulator {
                confidence: score,
                landmarks: vec![Landmark::default(); LANDMARK_COUNT],
            });
        hand.landmarks[landmark_index] = Landmark::new(x, y, z);
    }

    if frames.is_empty() {
        return Err(ReplayError::Empty(format!("{path:?}")));
    }

    let mut results = Vec::with_capacity(frames.len());
    for (frame_index, accumulator) in frames {
        let mut hands = Vec::new();
        for (label, hand) in accumulator.hands {
            let handedness: Handedness = match label.parse() {
                Ok(side) => side,
                Err(e) => {
                    // A broken label drops the hand, not the frame
                    warn!("Frame {}: {}", frame_index, e);
                    continue;
                }
            };
            hands.push(Hand {
                landmarks: hand.landmarks,
                handedness,
                confidence: hand.confidence,
            });
        }
        results.push(EstimatorResult {
            hands,
            timestamp_ms: accumulator.timestamp_ms,
        });
    }

    debug!("Loaded {} frames from {:?}", results.len(), path);
    Ok(results)
}
