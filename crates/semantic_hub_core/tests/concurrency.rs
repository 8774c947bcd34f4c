//! Serialization of concurrent mutations and bounded store calls.

mod common;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::*;
use pretty_assertions::assert_eq;
use semantic_hub_core::ports::Result;
use semantic_hub_core::{
    EngineConfig, HubError, MemoryModelStore, ModelRecord, ModelStatus, ModelStore, ModelUrn,
    WriteExpectation,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_saves_on_one_urn_all_land() {
    let (engine, store) = engine();
    let engine = Arc::new(engine);
    let movement = movement_urn("urn:samm:org.example.concurrent:1.0.0#");

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let engine = engine.clone();
            let movement = movement.clone();
            tokio::spawn(async move { engine.save(save_req(&movement, &[], ModelStatus::Draft)).await })
        })
        .collect();

    let mut revisions = BTreeSet::new();
    for t in tasks {
        let record = t.await.unwrap().unwrap();
        revisions.insert(record.revision);
    }

    // each save observed a distinct revision: no lost update
    assert_eq!(revisions, (1..=16).collect::<BTreeSet<u64>>());
    assert_eq!(store.get(&movement).await.unwrap().unwrap().revision, 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn independent_urns_proceed_in_parallel() {
    let (engine, store) = engine();
    let engine = Arc::new(engine);

    let tasks: Vec<_> = (0..12)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let u = movement_urn(&format!("urn:samm:org.example.parallel_{i}:1.0.0#"));
                engine.save(save_req(&u, &[], ModelStatus::Released)).await
            })
        })
        .collect();
    for t in tasks {
        t.await.unwrap().unwrap();
    }
    assert_eq!(store.len(), 12);
}

// ── Slow store ───────────────────────────────────────────────────

/// Delays selected calls past any sensible timeout before delegating.
/// With `slow_ack` the write lands first and only the acknowledgement stalls.
struct SlowStore {
    inner: MemoryModelStore,
    slow_get: bool,
    slow_put: bool,
    slow_ack: AtomicBool,
}

const DELAY: Duration = Duration::from_secs(30);

#[async_trait]
impl ModelStore for SlowStore {
    async fn get(&self, urn: &ModelUrn) -> Result<Option<ModelRecord>> {
        if self.slow_get {
            tokio::time::sleep(DELAY).await;
        }
        self.inner.get(urn).await
    }

    async fn put(&self, record: &ModelRecord, expect: WriteExpectation) -> Result<()> {
        if self.slow_put {
            tokio::time::sleep(DELAY).await;
        }
        self.inner.put(record, expect).await?;
        if self.slow_ack.load(Ordering::SeqCst) {
            tokio::time::sleep(DELAY).await;
        }
        Ok(())
    }

    async fn delete(&self, urn: &ModelUrn, expected_revision: u64) -> Result<()> {
        self.inner.delete(urn, expected_revision).await
    }

    async fn list_all(&self) -> Result<Vec<ModelRecord>> {
        self.inner.list_all().await
    }

    async fn list_by_urns(&self, urns: &BTreeSet<ModelUrn>) -> Result<Vec<ModelRecord>> {
        self.inner.list_by_urns(urns).await
    }

    async fn list_by_package(&self, package_prefix: &str) -> Result<Vec<ModelRecord>> {
        self.inner.list_by_package(package_prefix).await
    }
}

fn short_timeout() -> EngineConfig {
    EngineConfig {
        store_timeout_ms: 50,
        ..EngineConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn slow_write_times_out_without_writing() {
    let store = Arc::new(SlowStore {
        inner: MemoryModelStore::new(),
        slow_get: false,
        slow_put: true,
        slow_ack: AtomicBool::new(false),
    });
    let engine = engine_with(store.clone(), short_timeout());
    let movement = movement_urn("urn:samm:org.example.slow:1.0.0#");

    let err = engine
        .save(save_req(&movement, &[], ModelStatus::Draft))
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::StoreUnavailable(_)), "{err:?}");
    assert!(err.is_retryable());
    assert_eq!(err.http_status(), 503);
    assert!(store.inner.is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_read_times_out() {
    let store = Arc::new(SlowStore {
        inner: MemoryModelStore::new(),
        slow_get: true,
        slow_put: false,
        slow_ack: AtomicBool::new(false),
    });
    let engine = engine_with(store.clone(), short_timeout());
    let movement = movement_urn("urn:samm:org.example.slow:1.0.0#");

    assert!(matches!(
        engine.get(&movement).await,
        Err(HubError::StoreUnavailable(_))
    ));
    assert!(matches!(
        engine.delete(&movement).await,
        Err(HubError::StoreUnavailable(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn write_landing_after_timeout_is_reconciled_by_save() {
    let store = Arc::new(SlowStore {
        inner: MemoryModelStore::new(),
        slow_get: false,
        slow_put: false,
        slow_ack: AtomicBool::new(true),
    });
    let engine = engine_with(store.clone(), short_timeout());
    let movement = movement_urn("urn:samm:org.example.late:1.0.0#");

    let err = engine
        .create(create_req(&movement, ModelStatus::Draft))
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::StoreUnavailable(_)), "{err:?}");
    // the insert committed even though the caller saw a timeout
    assert_eq!(store.inner.get(&movement).await.unwrap().unwrap().revision, 1);

    store.slow_ack.store(false, Ordering::SeqCst);

    // create is not idempotent across a lost acknowledgement; save is
    assert!(matches!(
        engine.create(create_req(&movement, ModelStatus::Draft)).await,
        Err(HubError::AlreadyExists(_))
    ));
    let retried = engine
        .save(save_req(&movement, &[], ModelStatus::Draft))
        .await
        .unwrap();
    assert_eq!(retried.revision, 2);
    assert_eq!(retried.status, ModelStatus::Draft);
}
