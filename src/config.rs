//! Configuration management and validation.
//!
//! Provides the layered runtime configuration: built-in defaults, an optional
//! TOML file, then environment overrides.

use crate::constants::{
    APP_DIR_NAME, DEFAULT_BACKEND_TIMEOUT_SECS, DEFAULT_BACKEND_URL, DEFAULT_CHUNK_SIZE,
    DEFAULT_HEALTH_CHECK_INTERVAL_SECS, DEFAULT_MAX_CHART_POINTS, DEFAULT_MAX_FILES_PER_BATCH,
    DEFAULT_TIME_FORMAT,
};
use crate::app::models::format_time;
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding the backend base URL
pub const ENV_BACKEND_URL: &str = "DATASENSE_BACKEND_URL";

/// Environment variable overriding the storage directory
pub const ENV_DATA_DIR: &str = "DATASENSE_DATA_DIR";

/// Windowing limits for the data access layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Records appended to the visible window per chunk load
    pub chunk_size: usize,

    /// Maximum points returned by chart downsampling
    pub max_chart_points: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chart_points: DEFAULT_MAX_CHART_POINTS,
        }
    }
}

/// Connection settings for the conversion/storage backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Interval between health probes in seconds
    pub health_check_interval_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
            health_check_interval_secs: DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }
}

/// Local persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the library index and unit settings
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);
        Self { data_dir }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// chrono format used to derive each reading's display `time`
    pub time_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum number of files accepted in one batch
    pub max_files_per_batch: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_files_per_batch: DEFAULT_MAX_FILES_PER_BATCH,
        }
    }
}

/// Global configuration for DataSense
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub display: DisplayConfig,
    pub processing: ProcessingConfig,
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the
    /// environment
    ///
    /// An explicit path must exist. Without one, the per-user config file is
    /// used when present.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        let config = Self::from_toml(&content).map_err(|e| {
            Error::configuration(format!("{}: {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text; missing sections use defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::configuration(format!("Invalid TOML: {}", e)))
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            debug!("Backend URL overridden from {}", ENV_BACKEND_URL);
            self.backend.base_url = url.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            debug!("Data directory overridden from {}", ENV_DATA_DIR);
            self.storage.data_dir = PathBuf::from(dir.trim());
        }
    }

    /// Validate limits and URLs
    pub fn validate(&self) -> Result<()> {
        if self.window.chunk_size == 0 {
            return Err(Error::configuration("window.chunk_size must be greater than 0"));
        }
        if self.window.max_chart_points == 0 {
            return Err(Error::configuration(
                "window.max_chart_points must be greater than 0",
            ));
        }
        if self.processing.max_files_per_batch == 0 {
            return Err(Error::configuration(
                "processing.max_files_per_batch must be greater than 0",
            ));
        }
        let url = self.backend.base_url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::configuration(format!(
                "backend.base_url must start with http:// or https://, got '{}'",
                url
            )));
        }
        if self.backend.health_check_interval_secs == 0 {
            return Err(Error::configuration(
                "backend.health_check_interval_secs must be greater than 0",
            ));
        }
        if self.display.time_format.trim().is_empty() {
            return Err(Error::configuration("display.time_format must not be empty"));
        }
        if format_time(&NaiveDateTime::default(), &self.display.time_format).is_none() {
            return Err(Error::configuration(format!(
                "display.time_format '{}' cannot format a date and time without a time zone",
                self.display.time_format
            )));
        }
        Ok(())
    }

    /// Per-user config file location
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config.toml"))
    }

    /// Set the storage directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = data_dir.into();
        self
    }

    /// Set the backend base URL
    pub fn with_backend_url(mut self, base_url: impl Into<String>) -> Self {
        self.backend.base_url = base_url.into();
        self
    }

    /// Set the chunk size for windowed loading
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.window.chunk_size = chunk_size;
        self
    }

    /// Set the display time format
    pub fn with_time_format(mut self, time_format: impl Into<String>) -> Self {
        self.display.time_format = time_format.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.window.chunk_size, 500);
        assert_eq!(config.window.max_chart_points, 1000);
        assert_eq!(config.processing.max_files_per_batch, 10);
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [window]
            chunk_size = 250

            [backend]
            base_url = "https://backend.example"
            "#,
        )
        .unwrap();

        assert_eq!(config.window.chunk_size, 250);
        assert_eq!(config.window.max_chart_points, 1000);
        assert_eq!(config.backend.base_url, "https://backend.example");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.display.time_format, "%H:%M:%S");
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[processing]\nmax_files_per_batch = 3").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.processing.max_files_per_batch, 3);
    }

    #[test]
    fn test_load_with_missing_explicit_path_fails() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let result = Config::from_toml("[window\nchunk_size = ");
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, " http://10.0.0.5:9000 "),
            (ENV_DATA_DIR, "/tmp/datasense-test"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.backend.base_url, "http://10.0.0.5:9000");
        assert_eq!(
            config.storage.data_dir,
            PathBuf::from("/tmp/datasense-test")
        );
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(Config::default().with_chunk_size(0).validate().is_err());
        assert!(
            Config::default()
                .with_backend_url("ftp://example")
                .validate()
                .is_err()
        );

        let mut config = Config::default();
        config.processing.max_files_per_batch = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.window.max_chart_points = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backend.health_check_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unrenderable_time_format() {
        for format in ["%Y %z", "%H:%M %Z", "%Q"] {
            let result = Config::default().with_time_format(format).validate();
            assert!(
                matches!(result, Err(Error::Configuration { .. })),
                "{} should be rejected",
                format
            );
        }

        assert!(Config::default().with_time_format("%d/%m %H:%M").validate().is_ok());
        assert!(Config::default().with_time_format("%Y-%m-%dT%H:%M:%S%.3f").validate().is_ok());
    }
}
