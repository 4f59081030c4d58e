//! Configuration
//!
//! Settings are read from `bikeshare.toml` in the working directory when it
//! exists; every field has a default so the file is optional.

use crate::data::DatasetVariant;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "bikeshare.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the dataset files live
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_day_file")]
    pub day_file: String,

    #[serde(default = "default_hour_file")]
    pub hour_file: String,

    #[serde(default)]
    pub default_variant: DatasetVariant,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("dashboard")
}

fn default_day_file() -> String {
    "day.csv".to_string()
}

fn default_hour_file() -> String {
    "hour.csv".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            day_file: default_day_file(),
            hour_file: default_hour_file(),
            default_variant: DatasetVariant::default(),
        }
    }
}

impl DataConfig {
    /// Full path of the CSV file for a variant.
    pub fn path_for(&self, variant: DatasetVariant) -> PathBuf {
        let file = match variant {
            DatasetVariant::Day => &self.day_file,
            DatasetVariant::Hour => &self.hour_file,
        };
        self.data_dir.join(file)
    }
}

/// Dataset table settings
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Rows shown in the dataset table; 0 shows every row
    #[serde(default)]
    pub table_row_limit: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { table_row_limit: 0 }
    }
}

/// Static chart export size in pixels
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_width")]
    pub width: u32,

    #[serde(default = "default_export_height")]
    pub height: u32,
}

fn default_export_width() -> u32 {
    1200
}

fn default_export_height() -> u32 {
    600
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: default_export_width(),
            height: default_export_height(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "bikeshare_dashboard=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
