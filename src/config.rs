use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::RosterOrder;
use crate::sync::WriteMode;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote mirror settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    /// Document store URL (e.g., "http://localhost:8080")
    pub server_url: Option<String>,
    /// API key of the logged-in user
    pub api_key: Option<String>,
    /// Replace whole remote documents or merge top-level fields
    #[serde(default)]
    pub write_mode: WriteMode,
}

impl SyncConfig {
    /// Returns true if a server URL is set
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some()
    }

    /// Returns true if a user is logged in (an API key is present)
    pub fn is_logged_in(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database backing the local store
    pub database_path: ConfigValue<PathBuf>,
    /// Student order when taking attendance
    pub roster_order: ConfigValue<RosterOrder>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Sync configuration
    pub sync: SyncConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    roster_order: Option<RosterOrder>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("rollcall.db"),
            ConfigSource::Default,
        );
        let mut roster_order = ConfigValue::new(RosterOrder::default(), ConfigSource::Default);
        let mut config_file = None;
        let mut sync = SyncConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(order) = file_config.roster_order {
                roster_order = ConfigValue::new(order, ConfigSource::File);
            }
            if let Some(sync_config) = file_config.sync {
                sync = sync_config;
            }
        }

        if let Ok(db_path) = std::env::var("ROLLCALL_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(order) = std::env::var("ROLLCALL_ROSTER_ORDER") {
            let order = order
                .parse()
                .map_err(|e| ConfigError::InvalidValue("ROLLCALL_ROSTER_ORDER", e))?;
            roster_order = ConfigValue::new(order, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("ROLLCALL_SYNC_URL") {
            sync.server_url = Some(url);
        }
        if let Ok(key) = std::env::var("ROLLCALL_SYNC_API_KEY") {
            sync.api_key = Some(key);
        }
        if let Ok(mode) = std::env::var("ROLLCALL_SYNC_WRITE_MODE") {
            sync.write_mode = mode
                .parse()
                .map_err(|e| ConfigError::InvalidValue("ROLLCALL_SYNC_WRITE_MODE", e))?;
        }

        Ok(Self {
            database_path,
            roster_order,
            config_file,
            sync,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/rollcall/
    /// - macOS: ~/Library/Application Support/rollcall/
    /// - Windows: %APPDATA%/rollcall/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rollcall")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/rollcall/
    /// - macOS: ~/Library/Application Support/rollcall/
    /// - Windows: %APPDATA%/rollcall/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rollcall")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(var, e) => write!(f, "Invalid {}: {}", var, e),
        }
    }
}

impl std::error::Error for ConfigError {}
