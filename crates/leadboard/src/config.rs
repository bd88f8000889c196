//! Configuration management for leadboard.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use chrono::Duration;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::{stage_color, DEFAULT_MIN_PASSWORD_LENGTH};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "leadboard";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "pipeline.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `LEADBOARD_`)
/// 2. TOML config file at `~/.config/leadboard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Pipeline board configuration.
    pub pipeline: PipelineConfig,
    /// Dashboard configuration.
    pub dashboard: DashboardConfig,
    /// Form validation configuration.
    pub validation: ValidationConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/leadboard/pipeline.db`
    pub database_path: Option<PathBuf>,
}

/// A stage created when a workspace is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTemplate {
    /// Stage name.
    pub name: String,
    /// Optional display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl StageTemplate {
    fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: Some(color.to_string()),
        }
    }
}

/// Pipeline board configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stages seeded into a fresh workspace, in pipeline order.
    pub default_stages: Vec<StageTemplate>,
    /// How many leads a board column shows per page.
    pub column_page_size: usize,
}

/// Dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Window, in days, for "new" and "recent" leads.
    pub recent_window_days: u32,
    /// Maximum rows in the recent leads/activities lists.
    pub recent_limit: usize,
}

/// Form validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum accepted password length.
    pub min_password_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_stages: default_stages(),
            column_page_size: 10,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_window_days: 7,
            recent_limit: 5,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

/// Default pipeline stages.
fn default_stages() -> Vec<StageTemplate> {
    vec![
        StageTemplate::new("New", "#64748b"),
        StageTemplate::new("Contacted", "#0ea5e9"),
        StageTemplate::new("Proposal", "#f59e0b"),
        StageTemplate::new("Closed", "#22c55e"),
    ]
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `LEADBOARD_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("LEADBOARD_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.column_page_size == 0 {
            return Err(Error::ConfigValidation {
                message: "column_page_size must be greater than 0".to_string(),
            });
        }

        if let Some(stage) = self
            .pipeline
            .default_stages
            .iter()
            .find(|s| s.name.trim().is_empty())
        {
            return Err(Error::ConfigValidation {
                message: format!("default stage names cannot be blank: {stage:?}"),
            });
        }

        if let Some(stage) = self
            .pipeline
            .default_stages
            .iter()
            .find(|s| stage_color(s.color.clone()).is_err())
        {
            return Err(Error::ConfigValidation {
                message: format!("default stage colors must look like #rrggbb: {stage:?}"),
            });
        }

        if self.dashboard.recent_window_days == 0 {
            return Err(Error::ConfigValidation {
                message: "recent_window_days must be greater than 0".to_string(),
            });
        }

        if self.validation.min_password_length == 0 {
            return Err(Error::ConfigValidation {
                message: "min_password_length must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the "recent" window as a Duration.
    #[must_use]
    pub fn recent_window(&self) -> Duration {
        Duration::days(i64::from(self.dashboard.recent_window_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.pipeline.column_page_size, 10);
        assert_eq!(config.dashboard.recent_window_days, 7);
        assert_eq!(config.dashboard.recent_limit, 5);
        assert_eq!(config.validation.min_password_length, 6);
    }

    #[test]
    fn test_default_stages_are_ordered_and_colored() {
        let stages = default_stages();
        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["New", "Contacted", "Proposal", "Closed"]);
        assert!(stages.iter().all(|s| s.color.is_some()));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_page_size() {
        let mut config = Config::default();
        config.pipeline.column_page_size = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("column_page_size"));
    }

    #[test]
    fn test_validate_blank_stage_name() {
        let mut config = Config::default();
        config.pipeline.default_stages.push(StageTemplate {
            name: "  ".to_string(),
            color: None,
        });

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default stage names"));
    }

    #[test]
    fn test_validate_bad_stage_color() {
        let mut config = Config::default();
        config.pipeline.default_stages[0].color = Some("blue".to_string());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default stage colors"));
    }

    #[test]
    fn test_validate_zero_window() {
        let mut config = Config::default();
        config.dashboard.recent_window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_password_length() {
        let mut config = Config::default();
        config.validation.min_password_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("pipeline.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_recent_window() {
        assert_eq!(Config::default().recent_window(), Duration::days(7));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("leadboard"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r##"
[pipeline]
column_page_size = 25
default_stages = [
    { name = "Inbound" },
    { name = "Won", color = "#16a34a" },
]

[dashboard]
recent_limit = 8
"##,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.pipeline.column_page_size, 25);
        assert_eq!(config.pipeline.default_stages.len(), 2);
        assert_eq!(config.pipeline.default_stages[0].color, None);
        assert_eq!(config.dashboard.recent_limit, 8);
        assert_eq!(config.dashboard.recent_window_days, 7);
    }

    #[test]
    fn test_load_reads_storage_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\ndatabase_path = \"/tmp/leads.db\"\n").unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/leads.db"));
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\ncolumn_page_size = 0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_pipeline_config_deserialize() {
        let json = r#"{"column_page_size": 3}"#;
        let pipeline: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(pipeline.column_page_size, 3);
        assert_eq!(pipeline.default_stages.len(), 4);
    }

    #[test]
    fn test_config_clone() {
        let config = Config::default();
        assert_eq!(config, config.clone());
    }
}
