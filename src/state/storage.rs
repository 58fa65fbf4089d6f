//! State storage implementation
//!
//! This module defines the [`StateStore`] capability the router persists
//! conversation state through, and ships two implementations: an in-process
//! map for single-instance bots and tests, and Redis for bots running on
//! several instances.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use redis::AsyncCommands;
use tracing::{debug, error, info, warn};

use crate::config::{StorageBackend, StorageConfig};
use crate::dispatch::Identity;
use crate::utils::errors::Result;
use super::context::ConversationState;

/// Load/save capability for conversation state
///
/// Implementations must be safe to call concurrently; the router does not
/// serialize calls for the same identity unless configured to.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// State of `identity`, idle when nothing is stored
    async fn load(&self, identity: &Identity) -> Result<ConversationState>;

    async fn save(&self, identity: &Identity, state: &ConversationState) -> Result<()>;
}

/// Build the store selected by configuration, `None` disables scenarios
pub async fn create_state_store(config: &StorageConfig) -> Result<Option<Arc<dyn StateStore>>> {
    let store: Option<Arc<dyn StateStore>> = match config.backend {
        StorageBackend::None => None,
        StorageBackend::Memory => Some(Arc::new(MemoryStateStore::from_config(config))),
        StorageBackend::Redis => {
            let store = RedisStateStore::new(config.clone()).await?;
            store.test_connection().await?;
            Some(Arc::new(store))
        }
    };

    info!(backend = ?config.backend, "State store configured");
    Ok(store)
}

#[derive(Debug, Clone)]
struct StoredState {
    state: ConversationState,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredState {
    fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |expires_at| Utc::now() > expires_at)
    }
}

/// In-memory state store
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    states: Arc<DashMap<Identity, StoredState>>,
    ttl: Option<Duration>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose entries expire `ttl` after their last save
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            states: Arc::default(),
            ttl: Some(ttl),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        match config.ttl_seconds {
            0 => Self::new(),
            seconds => Self::with_ttl(Duration::seconds(seconds as i64)),
        }
    }

    /// Delete the state of an identity
    pub fn delete(&self, identity: &Identity) {
        self.states.remove(identity);
    }

    /// Stored state, if any, without expiry handling
    pub fn get(&self, identity: &Identity) -> Option<ConversationState> {
        self.states.get(identity).map(|stored| stored.state.clone())
    }

    /// Number of stored, non-idle states
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Clean up expired states
    pub fn cleanup_expired(&self) -> usize {
        let before = self.states.len();
        self.states.retain(|_, stored| !stored.is_expired());
        let cleaned = before.saturating_sub(self.states.len());

        if cleaned > 0 {
            info!("Cleaned up {} expired conversation states", cleaned);
        }
        cleaned
    }

    /// Count of in-progress conversations per scenario
    pub fn scenario_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for entry in self.states.iter() {
            if let Some(scenario) = &entry.state.scenario {
                *counts.entry(scenario.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, identity: &Identity) -> Result<ConversationState> {
        let stored = self.states.get(identity).map(|stored| stored.clone());

        match stored {
            Some(stored) if stored.is_expired() => {
                debug!(identity = %identity, "Conversation state expired, removing");
                self.states.remove(identity);
                Ok(ConversationState::idle())
            }
            Some(stored) => Ok(stored.state),
            None => Ok(ConversationState::idle()),
        }
    }

    async fn save(&self, identity: &Identity, state: &ConversationState) -> Result<()> {
        if state.is_idle() {
            self.states.remove(identity);
            return Ok(());
        }

        let stored = StoredState {
            state: state.clone(),
            expires_at: self.ttl.map(|ttl| Utc::now() + ttl),
        };
        self.states.insert(*identity, stored);
        Ok(())
    }
}

/// Redis-based state store
///
/// States are stored as JSON under `{prefix}state:{chat_id}:{user_id}`.
#[derive(Clone)]
pub struct RedisStateStore {
    /// Redis connection manager
    connection_manager: redis::aio::ConnectionManager,
    config: StorageConfig,
}

impl RedisStateStore {
    /// Create a new state store instance
    pub async fn new(config: StorageConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            config,
        })
    }

    /// Delete the state of an identity
    pub async fn delete(&self, identity: &Identity) -> Result<()> {
        let key = self.state_key(identity);
        let mut conn = self.connection_manager.clone();

        let deleted: u32 = conn.del(&key).await?;
        debug!(identity = %identity, deleted = deleted, "Deleted conversation state");

        Ok(())
    }

    /// Test Redis connection
    pub async fn test_connection(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Get the Redis key for an identity's state
    fn state_key(&self, identity: &Identity) -> String {
        format!("{}state:{}", self.config.prefix, identity)
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn load(&self, identity: &Identity) -> Result<ConversationState> {
        let key = self.state_key(identity);
        let mut conn = self.connection_manager.clone();

        let serialized: Option<String> = match conn.get::<&str, Option<String>>(&key).await {
            Ok(data) => data,
            Err(e) => {
                error!(identity = %identity, error = %e, "Failed to get conversation state from Redis");
                return Err(e.into());
            }
        };

        match serialized {
            Some(data) => match serde_json::from_str::<ConversationState>(&data) {
                Ok(state) => {
                    debug!(identity = %identity, scenario = ?state.scenario, step = ?state.step,
                           "Conversation state loaded");
                    Ok(state)
                }
                Err(e) => {
                    warn!(identity = %identity, error = %e, "Failed to deserialize conversation state");
                    Err(e.into())
                }
            },
            None => Ok(ConversationState::idle()),
        }
    }

    async fn save(&self, identity: &Identity, state: &ConversationState) -> Result<()> {
        if state.is_idle() {
            return self.delete(identity).await;
        }

        let key = self.state_key(identity);
        let serialized = serde_json::to_string(state)?;
        let mut conn = self.connection_manager.clone();

        let result = match self.config.ttl_seconds {
            0 => conn.set::<_, _, ()>(&key, serialized).await,
            ttl_seconds => conn.set_ex::<_, _, ()>(&key, serialized, ttl_seconds).await,
        };

        match result {
            Ok(()) => {
                debug!(identity = %identity, scenario = ?state.scenario, step = ?state.step,
                       "Conversation state saved");
                Ok(())
            }
            Err(e) => {
                error!(identity = %identity, error = %e, "Failed to save conversation state to Redis");
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for RedisStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStateStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
