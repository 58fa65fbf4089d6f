//! Test helpers module
//!
//! This module provides utilities and helpers for testing FlowBuddy routers:
//! recording doubles for the messenger and the state store, JSON-built
//! Telegram updates and a mock Telegram Bot API server.

#![allow(dead_code)]

pub mod log_capture;
pub mod recording;
pub mod telegram_mock;
pub mod test_data;

pub use log_capture::*;
pub use recording::*;
pub use telegram_mock::*;
pub use test_data::*;
