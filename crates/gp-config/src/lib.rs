//! # gp-config
//!
//! Layered application settings.
//!
//! Loading order (later wins):
//! 1. Built-in defaults
//! 2. `geopost.toml` in the working directory, or an explicit path
//! 3. `.env` file, loaded into the process environment
//! 4. Environment variables `GEOPOST__SECTION__KEY`
//!    (e.g. `GEOPOST__LOCATION__TIMEOUT_MS=2000`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root for every file the app writes
    pub data_dir: PathBuf,
    /// Snapshot file name, relative to `data_dir`
    pub snapshot_file: String,
    /// Media library directory, relative to `data_dir`
    pub media_dir: String,
    /// Where the camera drops fresh captures, relative to `data_dir`
    pub capture_dir: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
    pub notice_capacity: usize,
    pub location: LocationConfig,
    pub simulator: SimulatorConfig,
    pub session: SessionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            snapshot_file: "posts.json".to_string(),
            media_dir: "media".to_string(),
            capture_dir: "captures".to_string(),
            log_filter: "info".to_string(),
            notice_capacity: 32,
            location: LocationConfig::default(),
            simulator: SimulatorConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub timeout_ms: u64,
    /// A fix older than this is refreshed at capture time
    pub max_fix_age_secs: i64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_fix_age_secs: 120,
        }
    }
}

impl LocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Saturates instead of panicking; [`AppConfig::validate`] rejects
    /// values that do not fit.
    pub fn max_fix_age(&self) -> chrono::Duration {
        chrono::TimeDelta::try_seconds(self.max_fix_age_secs).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Answers given by the simulated platform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub grant_camera: bool,
    pub grant_media_library: bool,
    pub grant_location: bool,
    /// `false` simulates a device without a satellite fix
    pub signal: bool,
    pub fix: FixConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            grant_camera: true,
            grant_media_library: true,
            grant_location: true,
            signal: true,
            fix: FixConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            latitude: 50.4501,
            longitude: 30.5234,
        }
    }
}

/// Inputs for the scripted session the binary runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub post_name: String,
    pub address: Option<String>,
    pub comment_author: String,
    pub comment_text: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            post_name: "Untitled".to_string(),
            address: None,
            comment_author: "me".to_string(),
            comment_text: None,
        }
    }
}

impl AppConfig {
    /// Loads `geopost.toml` from the working directory if present.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("geopost").required(false),
        };

        let config: AppConfig = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("GEOPOST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!(data_dir = %config.data_dir.display(), "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.location.timeout_ms == 0 {
            return Err(ConfigError::Invalid("location.timeout_ms must be greater than 0".into()));
        }
        if self.location.max_fix_age_secs < 0 {
            return Err(ConfigError::Invalid(
                "location.max_fix_age_secs must not be negative".into(),
            ));
        }
        if chrono::TimeDelta::try_seconds(self.location.max_fix_age_secs).is_none() {
            return Err(ConfigError::Invalid(format!(
                "location.max_fix_age_secs is out of range: {}",
                self.location.max_fix_age_secs
            )));
        }
        if self.notice_capacity == 0 {
            return Err(ConfigError::Invalid("notice_capacity must be greater than 0".into()));
        }
        if self.snapshot_file.trim().is_empty() {
            return Err(ConfigError::Invalid("snapshot_file is required".into()));
        }
        Ok(())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }

    pub fn media_path(&self) -> PathBuf {
        self.data_dir.join(&self.media_dir)
    }

    pub fn capture_path(&self) -> PathBuf {
        self.data_dir.join(&self.capture_dir)
    }
}
