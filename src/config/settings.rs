//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from configuration files and environment variables.

use serde::{Deserialize, Serialize};

/// Environment variable prefix, e.g. `FLOWBUDDY__BOT__TOKEN`
pub const ENV_PREFIX: &str = "FLOWBUDDY";

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    /// Overrides `https://api.telegram.org`, e.g. for a local Bot API server
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub auto_answer_callbacks: bool,
}

/// Which conversation state store backs scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// No store: scenarios are disabled
    None,
    Memory,
    Redis,
}

/// Conversation state storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub redis_url: String,
    pub prefix: String,
    /// 0 keeps states forever
    pub ttl_seconds: u64,
}

/// Dispatch behaviour
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Handle updates of one chat/user pair one at a time
    pub serialize_per_identity: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the daily-rolling log file
    pub file_path: Option<String>,
    pub json: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::from_file("config")
    }

    /// Load settings from the given file (extension optional) layered under
    /// environment variables
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let defaults = Settings::default();

        let settings = config::Config::builder()
            .set_default("storage.backend", "memory")?
            .set_default("storage.redis_url", defaults.storage.redis_url)?
            .set_default("storage.prefix", defaults.storage.prefix)?
            .set_default("storage.ttl_seconds", defaults.storage.ttl_seconds)?
            .set_default("dispatch.serialize_per_identity", false)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.json", false)?
            .set_default("bot.auto_answer_callbacks", false)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::FlowBuddyError> {
        super::validation::validate_settings(self)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            prefix: "flowbuddy:".to_string(),
            ttl_seconds: 86400,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            json: false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                api_url: None,
                auto_answer_callbacks: false,
            },
            storage: StorageConfig::default(),
            dispatch: DispatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
