//! Configuration file support for distance-server
//!
//! This module handles parsing `distance-server.toml` files that adjust the
//! listening address, chart canvas and export envelope. Every key is
//! optional; command-line flags override whatever the file says.
//!
//! ## Configuration File Format
//!
//! ```toml
//! # distance-server.toml
//!
//! [server]
//! host = "127.0.0.1"
//! port = 5001
//! # Open the front-end in a browser once the server is listening
//! open_browser = false
//!
//! [visualization]
//! # Canvas size in pixels
//! width = 1000
//! height = 800
//! # Network charts join two points when their distance is <= this value
//! connection_threshold = 0.5
//! histogram_bins = 20
//!
//! [export]
//! # Version string written into JSON and XML export envelopes
//! version = "1.0"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub open_browser: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5001
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open_browser: false,
        }
    }
}

/// Chart rendering configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ChartSettings {
    /// Canvas width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Canvas height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Default edge threshold for network charts
    #[serde(default = "default_connection_threshold")]
    pub connection_threshold: f64,

    /// Number of histogram bins
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

fn default_width() -> u32 {
    1000
}

fn default_height() -> u32 {
    800
}

fn default_connection_threshold() -> f64 {
    0.5
}

fn default_histogram_bins() -> usize {
    20
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            connection_threshold: default_connection_threshold(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

/// Export configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSettings {
    /// Version tag written into export envelopes
    #[serde(default = "default_export_version")]
    pub version: String,
}

fn default_export_version() -> String {
    "1.0".to_string()
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            version: default_export_version(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub visualization: ChartSettings,

    #[serde(default)]
    pub export: ExportSettings,
}

impl ServiceConfig {
    /// Reject values that would make every chart request fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        let chart = &self.visualization;
        if chart.width == 0 || chart.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas size must be non-zero, got {}x{}",
                chart.width, chart.height
            )));
        }
        if chart.histogram_bins == 0 {
            return Err(ConfigError::Invalid(
                "histogram_bins must be at least 1".to_string(),
            ));
        }
        if !chart.connection_threshold.is_finite() || chart.connection_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "connection_threshold must be a non-negative number, got {}",
                chart.connection_threshold
            )));
        }
        Ok(())
    }
}

/// Parse and validate a configuration file
pub fn load_config_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServiceConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration starting from the given directory
///
/// Searches for `distance-server.toml` in the given directory and parent
/// directories. Missing files yield the defaults.
pub fn load_config(start_path: &Path) -> Result<ServiceConfig, ConfigError> {
    match find_config_file(start_path) {
        Some(path) => load_config_file(&path),
        None => Ok(ServiceConfig::default()),
    }
}

/// Find the config file by searching up the directory tree
fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let config_names = ["distance-server.toml", ".distance-server.toml"];

    let mut current = if start_path.is_file() {
        start_path.parent()?.to_path_buf()
    } else {
        start_path.to_path_buf()
    };

    loop {
        for name in &config_names {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5001);
        assert!(!config.server.open_browser);
        assert_eq!(config.visualization.connection_threshold, 0.5);
        assert_eq!(config.visualization.histogram_bins, 20);
        assert_eq!(config.export.version, "1.0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [server]
            port = 8080

            [visualization]
            width = 640
            connection_threshold = 2.5
        "#;

        let config: ServiceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.visualization.width, 640);
        assert_eq!(config.visualization.height, 800);
        assert_eq!(config.visualization.connection_threshold, 2.5);
        assert_eq!(config.export.version, "1.0");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServiceConfig::default();
        config.visualization.width = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ServiceConfig::default();
        config.visualization.histogram_bins = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.visualization.connection_threshold = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_find_config_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            dir.path().join("distance-server.toml"),
            "[export]\nversion = \"2.0\"\n",
        )
        .unwrap();

        let config = load_config(&nested).unwrap();
        assert_eq!(config.export.version, "2.0");
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distance-server.toml");
        fs::write(&path, "[server]\nport = \"not a number\"\n").unwrap();

        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
