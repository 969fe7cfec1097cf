use crate::global;
use crate::workflow::RetryPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retry: RetryPolicy,
    pub providers: ProvidersConfig,
    pub notify: NotifyConfig,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
}

/// Endpoints of the remote services backing the pipeline steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub transcription_url: String,
    pub summary_url: String,
    pub tasks_url: String,
    /// Sent as a bearer token when set.
    pub api_key: Option<String>,
    /// Per-request timeout. Retries happen on top of this.
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Shell command to run after a recording finishes processing.
    /// Receives the notification as JSON via stdin.
    /// Env vars: INSIGHTFLOW_RECORDING_ID, INSIGHTFLOW_TITLE, INSIGHTFLOW_PROJECT_ID,
    /// INSIGHTFLOW_USER_ID, INSIGHTFLOW_ORGANIZATION_ID, INSIGHTFLOW_TASKS_EXTRACTED,
    /// INSIGHTFLOW_DURATION_MS, INSIGHTFLOW_REPROCESSING
    /// Empty means notifications are only logged.
    pub command: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Overrides the default database location in the data directory.
    pub path: Option<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            transcription_url: "http://127.0.0.1:3141/api/v1/transcriptions".to_string(),
            summary_url: "http://127.0.0.1:3141/api/v1/summaries".to_string(),
            tasks_url: "http://127.0.0.1:3141/api/v1/tasks".to_string(),
            api_key: None,
            timeout_seconds: 300,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            timeout_seconds: 60,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 3838 }
    }
}

impl DatabaseConfig {
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => global::db_file(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_schedule() {
        let config = Config::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.backoff_schedule_ms, vec![1000, 5000, 15000]);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [retry]
            max_retries = 1

            [notify]
            command = "cat"
            "#,
        )
        .unwrap();

        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.backoff_schedule_ms, vec![1000, 5000, 15000]);
        assert_eq!(config.notify.command, "cat");
        assert_eq!(config.notify.timeout_seconds, 60);
        assert_eq!(config.api.port, 3838);
        assert!(config.providers.api_key.is_none());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.api.port, 3838);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.retry.backoff_schedule_ms, config.retry.backoff_schedule_ms);
    }

    #[test]
    fn test_database_path_override() {
        let db = DatabaseConfig {
            path: Some("/tmp/insightflow-test.db".to_string()),
        };
        assert_eq!(
            db.resolve_path().unwrap(),
            PathBuf::from("/tmp/insightflow-test.db")
        );
    }
}
