//! Configuration management

use crate::error::{ErrorContext, EstateError, EstateResult};
use crate::logging::LoggingConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Key under which the login flow stores the user snapshot
pub const DEFAULT_SESSION_KEY: &str = "user";

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstateConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the session record is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON key-value file on disk, survives between runs
    File,
    /// Process-local map, gone when the process exits
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub storage: StorageBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
    pub session_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::File,
            storage_path: default_storage_path(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

/// Default location of the local storage file
pub fn default_storage_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("estatedesk").join("local_storage.json"))
}

/// Default location of the configuration file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("estatedesk").join("config.toml"))
}

impl EstateConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> EstateResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EstateError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: EstateConfig = toml::from_str(&content).map_err(|e| EstateError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> EstateResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| EstateError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| EstateError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> EstateResult<()> {
        if self.session.session_key.trim().is_empty() {
            return Err(EstateError::Validation {
                message: "Session key must not be empty".to_string(),
                field: Some("session.session_key".to_string()),
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion(&format!(
                        "Set session.session_key, e.g. \"{}\"",
                        DEFAULT_SESSION_KEY
                    )),
            });
        }

        if self.session.storage == StorageBackend::File && self.session.storage_path.is_none() {
            return Err(EstateError::Validation {
                message: "File storage requires a storage path".to_string(),
                field: Some("session.storage_path".to_string()),
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set session.storage_path or use storage = \"memory\""),
            });
        }

        Ok(())
    }
}
