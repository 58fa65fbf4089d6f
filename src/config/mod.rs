//! Configuration management module
//!
//! This module handles loading and validation of application configuration
//! from configuration files and environment variables.

pub mod settings;
pub mod validation;

pub use settings::{Settings, BotConfig, StorageConfig, StorageBackend, DispatchConfig, LoggingConfig};
