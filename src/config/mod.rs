//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::calculate::ProjectFamily;
use crate::storage::{StorageConfig, DEFAULT_ENTRIES_KEY};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Entry store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key the entry collection is stored under
    #[serde(default = "default_store_key")]
    pub key: String,
}

fn default_store_key() -> String {
    DEFAULT_ENTRIES_KEY.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: default_store_key(),
        }
    }
}

/// Fibu report configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FibuConfig {
    /// Project name spellings counted as Fibu (case-insensitive substrings)
    #[serde(default = "default_project_variants")]
    pub project_variants: Vec<String>,
}

fn default_project_variants() -> Vec<String> {
    ProjectFamily::fibu().variants().to_vec()
}

impl Default for FibuConfig {
    fn default() -> Self {
        Self {
            project_variants: default_project_variants(),
        }
    }
}

impl FibuConfig {
    pub fn project_family(&self) -> ProjectFamily {
        ProjectFamily::new(&self.project_variants)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub storage: StoreConfig,

    #[serde(default)]
    pub fibu: FibuConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            storage: StoreConfig::default(),
            fibu: FibuConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig::new(self.data_dir.clone())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Storage key must not be empty".to_string(),
            ));
        }

        if self.fibu.project_variants.iter().all(|v| v.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "At least one Fibu project variant is required".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.storage.key, "timeEntries");
        assert_eq!(
            config.fibu.project_variants,
            vec!["finanzbuchführung", "finanzbuchfuehrung", "fibu"]
        );
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_key() {
        let mut config = AppConfig::default();
        config.storage.key = " ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_no_variants() {
        let mut config = AppConfig::default();
        config.fibu.project_variants = vec!["".to_string()];

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_level = \"debug\"\n\n[fibu]\nproject_variants = [\"Lohn\"]\n")
            .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.storage.key, "timeEntries");
        assert!(config.fibu.project_family().matches("Lohnbuchhaltung"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nkey = \"\"\n").unwrap();

        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.fibu.project_variants, parsed.fibu.project_variants);
    }
}
