//! Configuration system
//!
//! Centralized configuration with runtime defaults, optional TOML file
//! loading, and environment variable overrides. Values are validated once
//! and exposed through a process-wide accessor.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

use crate::parser::DEFAULT_BATCH_SIZE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Processing configuration
    pub processing: ProcessingConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Records per batch between progress reports and yield points.
    /// Must not affect aggregation results, only latency.
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub timestamp_format: String,
    /// Rows shown in the top-applications section of the summary report.
    pub top_apps: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "error".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            processing: ProcessingConfig {
                batch_size: DEFAULT_BATCH_SIZE,
            },
            output: OutputConfig {
                timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
                top_apps: 10,
            },
            paths: PathsConfig {
                log_directory: PathBuf::from("logs"),
            },
        }
    }
}

impl Config {
    /// Load configuration from defaults, file, and environment, in that
    /// order of precedence.
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("sso-metrics.toml"),
            PathBuf::from(".sso-metrics.toml"),
            dirs::config_dir()
                .map(|d| d.join("sso-metrics").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("SSO_METRICS_BATCH_SIZE") {
            self.processing.batch_size = val.parse().context("Invalid SSO_METRICS_BATCH_SIZE")?;
        }
        if let Ok(val) = env::var("SSO_METRICS_TOP_APPS") {
            self.output.top_apps = val.parse().context("Invalid SSO_METRICS_TOP_APPS")?;
        }
        if let Ok(val) = env::var("SSO_METRICS_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.processing.batch_size == 0 {
            return Err(anyhow::anyhow!("Batch size must be greater than 0"));
        }

        if self.output.top_apps == 0 {
            return Err(anyhow::anyhow!("Top applications count must be greater than 0"));
        }

        // The log directory is only needed when file logging is active.
        if self.logging.output != "console" && !self.paths.log_directory.exists() {
            fs::create_dir_all(&self.paths.log_directory)
                .context("Failed to create log directory")?;
        }

        Ok(())
    }
}

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration instance
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| Config::load().expect("Failed to load configuration"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "error");
        assert_eq!(config.processing.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.output.top_apps, 10);
    }

    #[test]
    fn test_env_override() {
        env::set_var("SSO_METRICS_BATCH_SIZE", "250");
        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.processing.batch_size, 250);
        env::remove_var("SSO_METRICS_BATCH_SIZE");
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.processing.batch_size = 0;
        assert!(config.validate().is_err());
    }
}
