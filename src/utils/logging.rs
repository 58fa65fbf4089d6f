//! Logging configuration and setup
//!
//! This module provides logging initialization and the structured logging
//! helpers used by the router.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::{FlowBuddyError, Result};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer when dropped, so the caller
/// has to keep it alive for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| FlowBuddyError::Config(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .boxed()
    };

    let (file_layer, guard) = match &config.file_path {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "flowbuddy.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| FlowBuddyError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log an error returned by an application handler
pub fn log_handler_error(branch: &str, chat_id: i64, user_id: u64, error: &anyhow::Error) {
    error!(
        branch = branch,
        chat_id = chat_id,
        user_id = user_id,
        error = %error,
        "Handler returned an error"
    );
}

/// Log a failed state store call made by the router
pub fn log_store_failure(operation: &str, chat_id: i64, user_id: u64, error: &FlowBuddyError) {
    error!(
        operation = operation,
        chat_id = chat_id,
        user_id = user_id,
        recoverable = error.is_recoverable(),
        error = %error,
        "State store operation failed"
    );
}

/// Log a scenario step transition
pub fn log_step_transition(scenario: &str, from: Option<&str>, to: Option<&str>) {
    debug!(
        scenario = scenario,
        from = from,
        to = to,
        "Scenario step transition"
    );
}

/// Log a failed outbound Telegram call that was swallowed
pub fn log_send_failure(action: &str, chat_id: i64, error: &FlowBuddyError) {
    warn!(
        action = action,
        chat_id = chat_id,
        error = %error,
        "Outbound Telegram call failed"
    );
}
