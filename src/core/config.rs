use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that points at an alternative settings file
pub const CONFIG_PATH_ENV: &str = "SIGNSENSE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Root directory for the database and settings
    pub data_dir: PathBuf,
    /// Validated samples a gesture needs before it is ready
    pub minimum_ready_samples: u32,
    /// Store confident detections as unvalidated samples of the winner
    pub auto_add_confident_samples: bool,
    /// Length of the ranked candidate list in detection responses
    pub max_ranked_candidates: usize,
    /// `tracing` filter directive, e.g. "info" or "signsense_lib=debug"
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());

        let mut data_dir = PathBuf::from(home);
        data_dir.push(".signsense");

        Self {
            data_dir,
            minimum_ready_samples: 5,
            auto_add_confident_samples: false,
            max_ranked_candidates: 5,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it with
    /// defaults if it doesn't exist
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir cannot be empty".to_string()));
        }

        if self.minimum_ready_samples == 0 || self.minimum_ready_samples > 1000 {
            return Err(ConfigError::Invalid(format!(
                "Invalid minimum ready samples: {}. Must be between 1 and 1000",
                self.minimum_ready_samples
            )));
        }

        if self.max_ranked_candidates == 0 || self.max_ranked_candidates > 100 {
            return Err(ConfigError::Invalid(format!(
                "Invalid max ranked candidates: {}. Must be between 1 and 100",
                self.max_ranked_candidates
            )));
        }

        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid("log_filter cannot be empty".to_string()));
        }

        Ok(())
    }

    /// SQLite database file inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("database").join("signsense.db")
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        Self::default().data_dir.join("config").join("settings.json")
    }
}
