//! Application configuration.
//!
//! Loaded from `config.toml` in the platform data directory unless a path is
//! given explicitly. Every section is optional; missing keys take defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::curve::pipeline::CurveConfig;
use crate::curve::rolling::MAX_ROUNDING_DECIMALS;
use crate::curve::types::STANDARD_DURATIONS;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Curve computation settings
    pub analysis: AnalysisSettings,
    /// Database settings
    pub storage: StorageSettings,
    /// Log output settings
    pub logging: LoggingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            analysis: AnalysisSettings::default(),
            storage: StorageSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Path of the SQLite database file.
    ///
    /// Relative `database_file` values resolve against the data directory.
    pub fn database_path(&self) -> PathBuf {
        let file = Path::new(&self.storage.database_file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }
}

/// Curve computation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Decimal places of reported wattages
    pub rounding_decimals: u32,
    /// Silences longer than this many seconds are filled with zero power
    pub gap_threshold_secs: f64,
    /// Most zero samples gap filling may insert into one recording
    pub max_fill_samples: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        let curve = CurveConfig::default();
        Self {
            rounding_decimals: curve.rounding_decimals,
            gap_threshold_secs: curve.gap_threshold_secs,
            max_fill_samples: curve.max_fill_samples,
        }
    }
}

impl AnalysisSettings {
    /// Pipeline configuration over the standard durations.
    ///
    /// `rounding_decimals` above [`MAX_ROUNDING_DECIMALS`] is capped.
    pub fn curve_config(&self) -> CurveConfig {
        if self.rounding_decimals > MAX_ROUNDING_DECIMALS {
            tracing::warn!(
                "rounding_decimals = {} exceeds {}, capping",
                self.rounding_decimals,
                MAX_ROUNDING_DECIMALS
            );
        }

        CurveConfig {
            durations: STANDARD_DURATIONS.to_vec(),
            rounding_decimals: self.rounding_decimals.min(MAX_ROUNDING_DECIMALS),
            gap_threshold_secs: self.gap_threshold_secs,
            max_fill_samples: self.max_fill_samples,
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Database file name or absolute path
    pub database_file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_file: "powercurve.db".to_string(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "powercurve", "PowerCurve")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    config.data_dir = get_data_dir();
    Ok(config)
}

/// Load application configuration from `path`.
///
/// A missing file yields the defaults. The data directory is the file's
/// parent directory.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let data_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig {
            data_dir,
            ..Default::default()
        });
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = data_dir;

    Ok(config)
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to `path`.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
