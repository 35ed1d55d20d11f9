use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub board: BoardConfig,
    pub recording: RecordingConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Rendered edge length of a seated person chip.
    pub person_size: f64,
    /// Pointer travel (Euclidean, px) before a press becomes a drag.
    pub drag_threshold_px: f64,
    pub min_table_size: f64,
    /// Where the first new table lands, and how far each following one is
    /// staggered.
    pub table_origin: f64,
    pub table_offset_step: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            person_size: 72.0,
            drag_threshold_px: 6.0,
            min_table_size: 80.0,
            table_origin: 40.0,
            table_offset_step: 18.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Cadence at which the capture device hands over encoded segments.
    pub segment_interval_ms: u64,
    /// Probed in order; the first encoding the device supports wins.
    pub preferred_encodings: Vec<String>,
    /// Mime type used when the device reports none.
    pub fallback_mime: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            segment_interval_ms: 1000,
            preferred_encodings: vec![
                "audio/mpeg".to_string(),
                "audio/webm;codecs=opus".to_string(),
                "audio/webm".to_string(),
                "audio/ogg;codecs=opus".to_string(),
            ],
            fallback_mime: "audio/webm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Key of the session-history array in the key-value store.
    pub history_key: String,
    /// Overrides the default database location under the data directory.
    pub database_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_key: "minutesHistory".to_string(),
            database_path: None,
        }
    }
}

impl StorageConfig {
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => global::db_file(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
