use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::utils;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unable to write config {path:?}: {message}")]
    Write { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: Option<PathBuf>,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub step_timeout_secs: u64,
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            user_agent: "event-scrape/0.1".to_string(),
            request_timeout_secs: 20,
            step_timeout_secs: 30,
            pacing_min_ms: 2000,
            pacing_max_ms: 4000,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        read_config(&utils::config_path())
    }

    /// Explicit `database_path` in the file wins over the environment default.
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(utils::database_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    /// Pacing bounds in milliseconds, ordered so that `min <= max`.
    pub fn pacing_range(&self) -> (u64, u64) {
        if self.pacing_min_ms <= self.pacing_max_ms {
            (self.pacing_min_ms, self.pacing_max_ms)
        } else {
            (self.pacing_max_ms, self.pacing_min_ms)
        }
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = utils::config_path();
        write_config(&path, self)?;
        Ok(path)
    }
}

pub(crate) fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let write_err = |message: String| ConfigError::Write {
        path: path.to_path_buf(),
        message,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| write_err(err.to_string()))?;
    }
    let contents = serde_json::to_string_pretty(config).map_err(|err| write_err(err.to_string()))?;
    fs::write(path, contents).map_err(|err| write_err(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = read_config(&dir.path().join("nope.json")).expect("defaults");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "pacing_min_ms": 500, "pacing_max_ms": 100 }"#).expect("write");

        let config = read_config(&path).expect("parse");
        assert_eq!(config.request_timeout_secs, 20);
        assert_eq!(config.pacing_range(), (100, 500));
    }

    #[test]
    fn invalid_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").expect("write");

        assert!(matches!(read_config(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn write_then_read_preserves_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            database_path: Some(PathBuf::from("/tmp/events.sqlite")),
            step_timeout_secs: 5,
            ..AppConfig::default()
        };
        write_config(&path, &config).expect("write");
        assert_eq!(read_config(&path).expect("read"), config);
    }
}
