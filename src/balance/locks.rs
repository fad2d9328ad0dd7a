//! Per-key serialization of balance updates
//!
//! A reconciliation sequence takes at most one record lock (the invoice or
//! payment it edits or reverts) and then the locks of every customer it
//! touches, sorted ascending. Because every sequence acquires keys in that
//! order, two sequences can never wait on each other in a cycle.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// How concurrent reconciliation sequences are isolated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Isolation {
    /// Serialize read-modify-write per record and per customer
    #[default]
    #[serde(rename = "per_key")]
    PerKey,

    /// No guard at all; concurrent deltas on one customer can be lost
    #[serde(rename = "none", alias = "legacy")]
    Legacy,
}

type LockTable = Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>;

/// Table of async mutexes keyed by document id
///
/// Entries are created on demand and removed once no task holds or awaits
/// them.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    table: LockTable,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock on `key`
    pub async fn lock(&self, key: Uuid) -> KeyGuard {
        let mutex = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            table.entry(key).or_default().clone()
        };

        let guard = mutex.lock_owned().await;
        KeyGuard {
            key,
            table: self.table.clone(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently locked or awaited
    pub fn active(&self) -> usize {
        self.table.lock().map(|t| t.len()).unwrap_or(0)
    }
}

/// Held lock on one key; released on drop
pub struct KeyGuard {
    key: Uuid,
    table: LockTable,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyGuard {
    pub fn key(&self) -> Uuid {
        self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        // Only the table itself still references an idle entry
        if table
            .get(&self.key)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            table.remove(&self.key);
        }
    }
}

/// The set of locks held by one reconciliation sequence
pub struct IsolationGuard {
    locks: Option<KeyedLocks>,
    held: Vec<KeyGuard>,
}

impl IsolationGuard {
    /// Start an empty guard; with `Isolation::Legacy` every lock call is a no-op
    pub fn new(locks: &KeyedLocks, isolation: Isolation) -> Self {
        Self {
            locks: match isolation {
                Isolation::PerKey => Some(locks.clone()),
                Isolation::Legacy => None,
            },
            held: Vec::new(),
        }
    }

    /// Lock the record being edited or reverted
    ///
    /// Must be called before any customer lock.
    pub async fn lock_record(&mut self, id: Uuid) {
        debug_assert!(self.held.is_empty(), "record lock taken after other locks");
        if let Some(locks) = &self.locks {
            self.held.push(locks.lock(id).await);
        }
    }

    /// Lock every customer in `ids`, in ascending order
    pub async fn lock_customers(&mut self, ids: &[Uuid]) {
        let Some(locks) = self.locks.clone() else {
            return;
        };

        let mut keys: Vec<Uuid> = ids.to_vec();
        keys.sort();
        keys.dedup();

        for key in keys {
            if self.held.iter().any(|held| held.key() == key) {
                continue;
            }
            self.held.push(locks.lock(key).await);
        }
    }

    pub fn held(&self) -> usize {
        self.held.len()
    }
}
