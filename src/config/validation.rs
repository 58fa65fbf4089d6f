//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{FlowBuddyError, Result};
use super::{Settings, StorageBackend};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_storage_config(&settings.storage)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(FlowBuddyError::Config(
            "Bot token is required".to_string()
        ));
    }

    if let Some(api_url) = &config.api_url {
        url::Url::parse(api_url)?;
    }

    Ok(())
}

/// Validate storage configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.backend == StorageBackend::Redis && config.redis_url.is_empty() {
        return Err(FlowBuddyError::Config(
            "Redis URL is required for the redis storage backend".to_string()
        ));
    }

    if config.backend != StorageBackend::None && config.prefix.contains(char::is_whitespace) {
        return Err(FlowBuddyError::Config(
            "Storage prefix must not contain whitespace".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(FlowBuddyError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(FlowBuddyError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
