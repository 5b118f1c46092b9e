use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const STATIONS_PATH_VAR: &str = "NOISE_STATIONS_PATH";
pub const MEASUREMENTS_PATH_VAR: &str = "NOISE_MEASUREMENTS_PATH";
pub const LOG_FILE_PATH_VAR: &str = "LOG_FILE_PATH";

/// Where the dataset and the JSON log file live.
///
/// Resolved in order: built-in defaults, an optional JSON file, environment
/// variables, then command-line flags (applied by the binary).
///
/// ```json
/// {
///   "stations_path": "data/stations.csv",
///   "measurements_path": "data/station_month.csv",
///   "log_file_path": "logs/noise_monitor.log"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stations_path: PathBuf,
    pub measurements_path: PathBuf,
    pub log_file_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stations_path: PathBuf::from("data/stations.csv"),
            measurements_path: PathBuf::from("data/station_month.csv"),
            log_file_path: PathBuf::from("logs/noise_monitor.log"),
        }
    }
}

impl AppConfig {
    /// Loads the config from a JSON file at `path`. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Applies the process environment on top of `self`.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Replaces each path whose variable `lookup` resolves to a non-empty value.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        if let Some(path) = get(STATIONS_PATH_VAR) {
            self.stations_path = path;
        }
        if let Some(path) = get(MEASUREMENTS_PATH_VAR) {
            self.measurements_path = path;
        }
        if let Some(path) = get(LOG_FILE_PATH_VAR) {
            self.log_file_path = path;
        }
        self
    }
}
