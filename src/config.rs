//! Application configuration.
//!
//! Settings are read from `datadock.toml` in the platform configuration
//! folder:
//! - macOS: ~/Library/Application Support/org.datadock.DataDock/
//! - Windows: %APPDATA%/datadock/DataDock/config/
//! - Linux: ~/.config/datadock/
//!
//! `DATADOCK_API_URL` overrides the API address from the file.

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::data::export::ExportFormat;

const APP_QUALIFIER: &str = "org";
const APP_ORG: &str = "datadock";
const APP_NAME: &str = "DataDock";
const CONFIG_FILENAME: &str = "datadock.toml";

/// Environment variable overriding [`Config::api_url`].
pub const API_URL_ENV: &str = "DATADOCK_API_URL";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address of the DataDock backend.
    pub api_url: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// How long notifications stay on screen.
    pub notification_secs: u64,
    /// Format preselected in the export controls.
    pub default_export_format: ExportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            notification_secs: 5,
            default_export_format: ExportFormat::Csv,
        }
    }
}

impl Config {
    /// Apply an API URL override if it is non-empty.
    pub fn with_api_url_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        self
    }
}

/// Path of the settings file, if the platform folder can be determined.
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Load configuration from disk and the environment.
///
/// Falls back to defaults when the file is missing or cannot be parsed.
pub fn load_config() -> Config {
    let from_file = match config_path() {
        Some(path) => match fs::read_to_string(&path) {
            Ok(content) => parse_config(&content).unwrap_or_else(|e| {
                log::warn!("Failed to parse {}: {e}, using defaults", path.display());
                Config::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config file at {}, using defaults", path.display());
                Config::default()
            }
            Err(e) => {
                log::warn!("Failed to read {}: {e}, using defaults", path.display());
                Config::default()
            }
        },
        None => {
            log::warn!("Could not determine config path, using defaults");
            Config::default()
        }
    };

    let config = from_file.with_api_url_override(std::env::var(API_URL_ENV).ok());
    log::info!("Using DataDock API at {}", config.api_url);
    config
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_defaults() {
        let config = parse_config(
            r#"
            api_url = "https://dados.example.org"
            default_export_format = "xlsx"
            "#,
        )
        .unwrap();
        assert_eq!(config.api_url, "https://dados.example.org");
        assert_eq!(config.default_export_format, ExportFormat::Xlsx);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn invalid_files_are_errors() {
        assert!(parse_config("request_timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn blank_override_is_ignored() {
        let config = Config::default().with_api_url_override(Some("   ".into()));
        assert_eq!(config.api_url, "http://localhost:8000");
        let config = Config::default().with_api_url_override(Some("http://api:9000".into()));
        assert_eq!(config.api_url, "http://api:9000");
    }

    #[test]
    fn defaults_serialize() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(parse_config(&text).unwrap(), Config::default());
    }
}
