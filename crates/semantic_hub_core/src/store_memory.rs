use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::error::HubError;
use crate::ports::{ModelStore, Result, WriteExpectation};
use crate::types::{ModelRecord, ModelUrn};

/// In-memory ModelStore for tests and embedding.
///
/// Enforces the same compare-and-swap contract as the Postgres adapter:
/// - `Absent` fails when the URN is already stored
/// - `Revision(n)` and `delete` fail unless the stored revision is `n`
pub struct MemoryModelStore {
    inner: RwLock<BTreeMap<ModelUrn, ModelRecord>>,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryModelStore {
    fn default() -> Self {
        Self::new()
    }
}

fn conflict(urn: &ModelUrn, detail: &str) -> HubError {
    HubError::StoreUnavailable(format!("concurrent modification of {urn}: {detail}"))
}

#[async_trait]
impl ModelStore for MemoryModelStore {
    async fn get(&self, urn: &ModelUrn) -> Result<Option<ModelRecord>> {
        let store = self.inner.read().map_err(|e| anyhow!("Lock: {}", e))?;
        Ok(store.get(urn).cloned())
    }

    async fn put(&self, record: &ModelRecord, expect: WriteExpectation) -> Result<()> {
        let mut store = self.inner.write().map_err(|e| anyhow!("Lock: {}", e))?;
        let current = store.get(&record.urn).map(|r| r.revision);

        match (expect, current) {
            (WriteExpectation::Absent, None) => {}
            (WriteExpectation::Absent, Some(_)) => {
                return Err(conflict(&record.urn, "record already exists"));
            }
            (WriteExpectation::Revision(n), Some(stored)) if n == stored => {}
            (WriteExpectation::Revision(n), stored) => {
                return Err(conflict(
                    &record.urn,
                    &format!("expected revision {n}, found {stored:?}"),
                ));
            }
        }

        store.insert(record.urn.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, urn: &ModelUrn, expected_revision: u64) -> Result<()> {
        let mut store = self.inner.write().map_err(|e| anyhow!("Lock: {}", e))?;
        match store.get(urn).map(|r| r.revision) {
            Some(stored) if stored == expected_revision => {
                store.remove(urn);
                Ok(())
            }
            stored => Err(conflict(
                urn,
                &format!("expected revision {expected_revision}, found {stored:?}"),
            )),
        }
    }

    async fn list_all(&self) -> Result<Vec<ModelRecord>> {
        let store = self.inner.read().map_err(|e| anyhow!("Lock: {}", e))?;
        Ok(store.values().cloned().collect())
    }

    async fn list_by_urns(&self, urns: &BTreeSet<ModelUrn>) -> Result<Vec<ModelRecord>> {
        let store = self.inner.read().map_err(|e| anyhow!("Lock: {}", e))?;
        Ok(urns.iter().filter_map(|u| store.get(u).cloned()).collect())
    }

    async fn list_by_package(&self, package_prefix: &str) -> Result<Vec<ModelRecord>> {
        let store = self.inner.read().map_err(|e| anyhow!("Lock: {}", e))?;
        Ok(store
            .values()
            .filter(|r| r.urn.package_prefix() == package_prefix)
            .cloned()
            .collect())
    }
}
