//! Configuration management.
//!
//! Settings load from an optional TOML file layered over serde defaults; the
//! defaults alone describe a working simulated device. Durations are written
//! in human-readable form (`"5s"`, `"5m"`).

use crate::error::{AppResult, DoorcamError};
use config::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub recognition: RecognitionSettings,
    pub network: NetworkSettings,
    pub storage: StorageSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            recognition: RecognitionSettings::default(),
            network: NetworkSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Gallery capacity; the oldest entry is evicted beyond this bound.
    pub max_entries: usize,
    /// Consecutive similar observations required to enroll a new face.
    pub confirm_times: u32,
    /// Cosine similarity an embedding must reach to match a gallery entry.
    pub match_threshold: f32,
    /// Cosine similarity between successive observations of one candidate.
    pub candidate_tolerance: f32,
    /// Pause between pipeline passes in the capture loop.
    #[serde(with = "humantime_serde")]
    pub capture_idle: Duration,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            max_entries: 7,
            confirm_times: 5,
            match_threshold: 0.7,
            candidate_tolerance: 0.7,
            capture_idle: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NetworkSettings {
    /// Broker client identity; also the prefix of every topic.
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Minimum spacing between session establishment attempts.
    #[serde(with = "humantime_serde")]
    pub session_retry: Duration,
    /// Continuous link downtime that forces a hard device restart.
    #[serde(with = "humantime_serde")]
    pub watchdog_timeout: Duration,
    /// Cadence of the services loop.
    #[serde(with = "humantime_serde")]
    pub service_tick: Duration,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            client_id: "doorbell-cam-01".to_string(),
            username: None,
            password: None,
            session_retry: Duration::from_secs(5),
            watchdog_timeout: Duration::from_secs(5 * 60),
            service_tick: Duration::from_millis(250),
        }
    }
}

impl NetworkSettings {
    pub fn status_topic(&self) -> String {
        format!("{}/status", self.client_id)
    }

    pub fn version_topic(&self) -> String {
        format!("{}/version", self.client_id)
    }

    pub fn restart_topic(&self) -> String {
        format!("{}/restart", self.client_id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding one record file per gallery slot.
    pub gallery_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            gallery_dir: PathBuf::from("data/gallery"),
        }
    }
}

impl Settings {
    /// Load settings, layering an optional TOML file over the defaults.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let defaults = Config::try_from(&Settings::default()).map_err(DoorcamError::Config)?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        }
        let merged = builder.build().map_err(DoorcamError::Config)?;
        merged.try_deserialize().map_err(DoorcamError::Config)
    }
}
