//! Per-URN async lock table.
//!
//! Mutations on the same URN run one at a time; different URNs never
//! contend. Entries are dropped once no guard or waiter references them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::ModelUrn;

#[derive(Default)]
pub struct UrnLocks {
    table: Mutex<HashMap<ModelUrn, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one mutating operation.
pub struct UrnGuard<'a> {
    locks: &'a UrnLocks,
    urn: ModelUrn,
    guard: Option<OwnedMutexGuard<()>>,
}

impl UrnLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, urn: &ModelUrn) -> UrnGuard<'_> {
        let slot = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            table.entry(urn.clone()).or_default().clone()
        };
        let guard = slot.lock_owned().await;
        UrnGuard {
            locks: self,
            urn: urn.clone(),
            guard: Some(guard),
        }
    }

    /// Number of URNs currently tracked.
    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for UrnGuard<'_> {
    fn drop(&mut self) {
        // Release before pruning so the strong count reflects waiters only.
        self.guard.take();
        let mut table = self.locks.table.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = table.get(&self.urn) {
            if Arc::strong_count(slot) == 1 {
                table.remove(&self.urn);
            }
        }
    }
}
