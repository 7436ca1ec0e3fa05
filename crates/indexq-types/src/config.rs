//! Configuration loading for indexq.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The config file lives at ~/.config/indexq/config.toml; environment
//! variables use the INDEXQ_ prefix (INDEXQ_BATCH_SIZE=50).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Queue and worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Base retry interval in seconds; the delay before attempt n is
    /// `retry_interval_secs * n` (linear backoff).
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    /// Pause after the search backend is found unreachable.
    #[serde(default = "default_outage_delay")]
    pub outage_delay_secs: u64,

    /// Sleep between polls when no entries are due.
    #[serde(default = "default_idle_delay")]
    pub idle_delay_secs: u64,

    /// Maximum entries claimed per `process()` call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Baseline priority for entries created without an override.
    /// Higher values are claimed first.
    #[serde(default)]
    pub default_priority: i32,

    /// Abandon an entry once a failure would push its attempt count past
    /// this value. Unbounded when unset.
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Cap on the computed retry delay in seconds. Unbounded when unset.
    #[serde(default)]
    pub max_delay_secs: Option<u64>,

    /// Restrict processing to these record types; all types when empty.
    #[serde(default)]
    pub record_types: Vec<String>,

    /// Path to the durable entry store. Defaults to the platform data
    /// directory when unset.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Base URL of the search backend.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Base URL of the application's document endpoint, used by workers
    /// to render index documents for claimed entries.
    #[serde(default = "default_source_url")]
    pub source_url: String,
}

fn default_retry_interval() -> u64 {
    60
}

fn default_outage_delay() -> u64 {
    30
}

fn default_idle_delay() -> u64 {
    2
}

fn default_batch_size() -> usize {
    100
}

fn default_search_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_source_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: default_retry_interval(),
            outage_delay_secs: default_outage_delay(),
            idle_delay_secs: default_idle_delay(),
            batch_size: default_batch_size(),
            default_priority: 0,
            max_attempts: None,
            max_delay_secs: None,
            record_types: Vec::new(),
            db_path: None,
            search_url: default_search_url(),
            source_url: default_source_url(),
        }
    }
}

impl QueueConfig {
    /// Load configuration from the default layers.
    ///
    /// `path` overrides the default config file location. A missing file
    /// is not an error; defaults and environment still apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                builder = builder.add_source(File::from(p));
            }
            None => {
                if let Some(p) = Self::default_config_path() {
                    if p.exists() {
                        builder = builder.add_source(File::from(p));
                    }
                }
            }
        }

        builder = builder.add_source(Environment::with_prefix("INDEXQ"));

        let config: QueueConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location (~/.config/indexq/config.toml).
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "indexq").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Default durable store location in the platform data directory.
    pub fn default_db_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "indexq").map(|dirs| dirs.data_dir().join("queue"))
    }

    /// Validate loaded values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "retry_interval_secs must be > 0".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be > 0".to_string()));
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::Invalid(
                "max_attempts must be > 0 when set".to_string(),
            ));
        }
        if self.max_delay_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "max_delay_secs must be > 0 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Base retry interval as a duration.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    /// Outage pause as a duration.
    pub fn outage_delay(&self) -> Duration {
        Duration::from_secs(self.outage_delay_secs)
    }

    /// Idle poll sleep as a duration.
    pub fn idle_delay(&self) -> Duration {
        Duration::from_secs(self.idle_delay_secs)
    }

    /// Retry delay cap as a duration, when configured.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay_secs.map(Duration::from_secs)
    }
}
