//! Per-name serialization of lifecycle operations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use worldkeeper_domain::WorldName;

type LockTable = DashMap<WorldName, Arc<Mutex<()>>>;

/// Table of per-name mutexes.
///
/// An entry only lives while some operation holds or waits for its name; the
/// last guard to release it removes it again.
#[derive(Default)]
pub struct NameLocks {
    locks: LockTable,
}

/// Exclusive access to one world name.
pub struct NameGuard<'a> {
    table: &'a LockTable,
    name: WorldName,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for NameGuard<'_> {
    fn drop(&mut self) {
        // Release first so our own Arc no longer counts.
        drop(self.guard.take());
        self.table
            .remove_if(&self.name, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `name`.
    pub async fn lock(&self, name: &WorldName) -> NameGuard<'_> {
        let mutex = self.locks.entry(name.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;
        NameGuard {
            table: &self.locks,
            name: name.clone(),
            guard: Some(guard),
        }
    }

    /// Lock two distinct names, always in name order so two opposite pair
    /// requests cannot deadlock. Guards are returned as `(first, second)`.
    pub async fn lock_pair(
        &self,
        first: &WorldName,
        second: &WorldName,
    ) -> (NameGuard<'_>, NameGuard<'_>) {
        if first <= second {
            let a = self.lock(first).await;
            let b = self.lock(second).await;
            (a, b)
        } else {
            let b = self.lock(second).await;
            let a = self.lock(first).await;
            (a, b)
        }
    }

    /// Names currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
