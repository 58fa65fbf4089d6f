//! FlowBuddy
//!
//! A Telegram bot framework for conversational bots. It routes every update
//! to commands, callback handlers and multi-step scenarios whose progress is
//! persisted per chat and user in a pluggable state store.

#![allow(non_snake_case)]

pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{FlowBuddyError, Result};

pub use dispatch::{run_polling, Identity, Messenger, Router, RouterBuilder, TeloxideMessenger, UpdateContext};
pub use handlers::{CallbackError, CallbackOutcome, CallbackResult, HandlerResult};
pub use state::{ConversationState, Scenario, ScratchData, StateStore, StepOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
