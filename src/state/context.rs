//! Conversation state management
//!
//! This module holds the persisted per-identity record of which scenario a
//! conversation is in, which step it waits on, and the scratch data the
//! scenario's steps share.

use std::collections::HashMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::utils::errors::Result;

/// Scenario-scoped key/value data shared between the steps of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScratchData(HashMap<String, serde_json::Value>);

impl ScratchData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a serializable value under `key`
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)?;
        self.0.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Read the value under `key` back as `T`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.0.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Get string data (convenience method)
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get::<String>(key).unwrap_or(None)
    }

    /// Get integer data (convenience method)
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get::<i64>(key).unwrap_or(None)
    }

    /// Get boolean data (convenience method)
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get::<bool>(key).unwrap_or(None)
    }

    pub fn get_raw(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Persisted conversation state of one identity
///
/// `scenario == None` is the idle state. `step == None` with a scenario set
/// means the scenario is about to run its entry step. A step is never set
/// without a scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Current scenario the conversation is in
    #[serde(default)]
    pub scenario: Option<String>,
    /// Step the scenario waits on
    #[serde(default)]
    pub step: Option<String>,
    /// Scenario-specific data
    #[serde(default)]
    pub data: ScratchData,
}

impl ConversationState {
    /// Idle state, no scenario in progress
    pub fn idle() -> Self {
        Self::default()
    }

    /// Fresh state for a scenario that has not executed its entry step yet
    pub fn starting(scenario: &str) -> Self {
        Self {
            scenario: Some(scenario.to_string()),
            step: None,
            data: ScratchData::new(),
        }
    }

    /// Whether a scenario is waiting on a step and can be resumed
    pub fn is_resumable(&self) -> bool {
        self.scenario.is_some() && self.step.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.scenario.is_none()
    }

    /// Move to the next step in the current scenario
    pub fn advance(&mut self, step: &str) {
        self.step = Some(step.to_string());
    }

    /// Terminate the current scenario, clearing scenario, step and data together
    pub fn finish(&mut self) {
        self.scenario = None;
        self.step = None;
        self.data.clear();
    }

    /// Check if the conversation is in a specific scenario
    pub fn is_in_scenario(&self, scenario: &str) -> bool {
        self.scenario.as_deref() == Some(scenario)
    }

    /// Check if the conversation is in a specific scenario and step
    pub fn is_at(&self, scenario: &str, step: &str) -> bool {
        self.is_in_scenario(scenario) && self.step.as_deref() == Some(step)
    }
}
