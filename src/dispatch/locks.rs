//! Per-identity serialization
//!
//! When enabled on the router, updates that share an [`Identity`] are handled
//! one at a time in lock acquisition order, closing the lost-update window
//! between loading and saving conversation state. Unrelated identities still
//! run concurrently.

use std::sync::Arc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::update::Identity;

/// Table of async mutexes keyed by identity
///
/// Entries are created on first use and dropped again once nobody holds or
/// waits on them.
#[derive(Debug, Clone, Default)]
pub struct IdentityLocks {
    locks: Arc<DashMap<Identity, Arc<Mutex<()>>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other update of `identity` is being handled
    pub async fn lock(&self, identity: Identity) -> IdentityGuard {
        let mutex = self
            .locks
            .entry(identity)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;

        IdentityGuard {
            identity,
            locks: self.locks.clone(),
            guard: Some(guard),
        }
    }

    /// Number of identities currently held or waited on
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held while one update of an identity is handled
pub struct IdentityGuard {
    identity: Identity,
    locks: Arc<DashMap<Identity, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for IdentityGuard {
    fn drop(&mut self) {
        // Release first so the strong count below only sees the table and waiters
        self.guard.take();
        self.locks
            .remove_if(&self.identity, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
