//! Error handling for FlowBuddy
//!
//! This module defines the error type used by the router, the state stores
//! and the configuration layer. Application handlers return `anyhow` errors
//! (see [`crate::handlers::HandlerResult`]); everything inside the library
//! reports through [`FlowBuddyError`].

use thiserror::Error;

/// Main error type for FlowBuddy
#[derive(Error, Debug)]
pub enum FlowBuddyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("State store error: {0}")]
    StateStore(String),
}

/// Result type alias for FlowBuddy operations
pub type Result<T> = std::result::Result<T, FlowBuddyError>;

impl FlowBuddyError {
    /// Check if retrying the failed operation can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            FlowBuddyError::Config(_) => false,
            FlowBuddyError::ConfigLoad(_) => false,
            FlowBuddyError::Telegram(_) => true,
            FlowBuddyError::Redis(_) => true,
            FlowBuddyError::Serialization(_) => false,
            FlowBuddyError::Io(_) => true,
            FlowBuddyError::UrlParse(_) => false,
            FlowBuddyError::StateStore(_) => true,
        }
    }
}
