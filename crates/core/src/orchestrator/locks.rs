//! Per-path locks serializing encodes that touch the same file.
//!
//! A worker locks both its input and its output before encoding. Keys are
//! taken in sorted order, so two workers never wait on each other in a cycle.
//! Entries are removed once nobody holds or awaits them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

#[derive(Default)]
pub(super) struct PathLocks {
    locks: Arc<Mutex<LockMap>>,
}

/// Holds the locks for a set of keys until dropped.
pub(super) struct PathGuard {
    guards: Vec<OwnedMutexGuard<()>>,
    keys: Vec<String>,
    locks: Arc<Mutex<LockMap>>,
}

impl PathLocks {
    /// Waits until every key is free, then holds them all.
    pub(super) async fn acquire(&self, mut keys: Vec<String>) -> PathGuard {
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let lock = Arc::clone(lock_map(&self.locks).entry(key.clone()).or_default());
            guards.push(lock.lock_owned().await);
        }

        PathGuard {
            guards,
            keys,
            locks: Arc::clone(&self.locks),
        }
    }

    /// Keys currently held or awaited.
    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        lock_map(&self.locks).len()
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        self.guards.clear();
        let mut map = lock_map(&self.locks);
        for key in &self.keys {
            if map.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                map.remove(key);
            }
        }
    }
}

fn lock_map(locks: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
