//! Pipeline configuration: TOML-backed settings with safe defaults.
//!
//! Configuration covers the coordinate convention, store capacities, the
//! preprocessor chain toggles and the analyzer thresholds. A missing or
//! broken file falls back to defaults with a warning; nothing here is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analyze::{TapAllConfig, TapTipConfig};
use crate::pipeline::processor::CoordinateSystem;
use crate::preprocess::smooth::{DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE};
use crate::store::event_history::DEFAULT_EVENT_RETENTION;
use crate::store::feature_store::DEFAULT_HISTORY_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No configuration directory available on this system")]
    NoConfigDir,
}

/// Enable flags and noise parameters for the preprocessor chain. The chain
/// order itself is fixed: center → normalize → smooth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub center_enabled: bool,
    pub normalize_enabled: bool,
    pub smooth_enabled: bool,
    pub process_noise: f64,
    pub measurement_noise: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            center_enabled: true,
            normalize_enabled: true,
            smooth_enabled: false,
            process_noise: DEFAULT_PROCESS_NOISE,
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub coordinate_system: CoordinateSystem,
    pub feature_history_size: usize,
    pub event_retention: usize,
    pub preprocess: PreprocessConfig,
    pub tap_all: TapAllConfig,
    pub tap_tip: TapTipConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            coordinate_system: CoordinateSystem::Camera,
            feature_history_size: DEFAULT_HISTORY_SIZE,
            event_retention: DEFAULT_EVENT_RETENTION,
            preprocess: PreprocessConfig::default(),
            tap_all: TapAllConfig::default(),
            tap_tip: TapTipConfig::default(),
        }
    }
}

/// Default location: `<config dir>/opengesture/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("opengesture").join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let raw = fs::read_to_string(path)?;
    let config = toml::from_str(&raw)?;
    debug!("Configuration loaded from {:?}", path);
    Ok(config)
}

pub fn save_config(path: &Path, config: &PipelineConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(config)?)?;
    info!("Configuration saved to {:?}", path);
    Ok(())
}

/// Writes the default configuration if no file exists yet, then returns the
/// path. Mirrors the ensure-then-load startup sequence.
pub fn ensure_default_config() -> Result<PathBuf, ConfigError> {
    let path = default_config_path().ok_or(ConfigError::NoConfigDir)?;
    if !path.exists() {
        save_config(&path, &PipelineConfig::default())?;
        info!("Default configuration created at {:?}", path);
    }
    Ok(path)
}

/// Loads from `path` when given, falling back to defaults on any failure.
pub fn load_or_default(path: Option<&Path>) -> PipelineConfig {
    match path {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Unable to load configuration from {:?}: {}", path, e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    }
}
