//! Keyed async locks.

use std::{collections::HashMap, hash::Hash, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// One `tokio::sync::Mutex` per key, created on first use.
#[derive(Debug)]
pub(crate) struct LockRegistry<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for LockRegistry<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Copy> LockRegistry<K> {
    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub(crate) async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = self.locks.lock().await.entry(key).or_default().clone();
        lock.lock_owned().await
    }

    /// Lock several keys at once. Keys are taken in ascending order so two
    /// callers locking overlapping sets cannot deadlock.
    pub(crate) async fn lock_many(&self, keys: &[K]) -> Vec<OwnedMutexGuard<()>>
    where
        K: Ord,
    {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();
        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.lock(key).await);
        }
        guards
    }

    /// Forget a key whose entity no longer exists.
    pub(crate) async fn forget(&self, key: K) {
        self.locks.lock().await.remove(&key);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
