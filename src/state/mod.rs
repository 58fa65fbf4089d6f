//! State management module
//!
//! This module handles conversation state, scenario definitions and the
//! stores state is persisted in between updates.

pub mod context;
pub mod scenarios;
pub mod storage;

pub use context::{ConversationState, ScratchData};
pub use scenarios::{Scenario, ScenarioBuilder, ScenarioManager, ScenarioStep, StepOutcome, StepReport};
pub use storage::{create_state_store, MemoryStateStore, RedisStateStore, StateStore};
