//! Lifecycle engine: decides and applies create/update/save/delete.
//!
//! | Operation | Check order                                                                          |
//! |-----------|--------------------------------------------------------------------------------------|
//! | create    | initial status, exists, validate, references, release gate                           |
//! | update    | exists, validate, references, transition, release gate                               |
//! | save      | create when absent, else update with full replace                                    |
//! | delete    | exists, deletion rule                                                                |
//!
//! Every mutation holds the URN's lock from first read to last write and
//! ends in exactly one compare-and-swap store call. A rejection leaves the
//! store untouched.
//!
//! Store calls are bounded by `store_timeout`. A write that times out may
//! still have been committed by the store: the caller sees `StoreUnavailable`
//! and must re-read before assuming nothing changed. Retrying through `save`
//! converges (the stored record is taken as the update base); retrying
//! `create` reports `AlreadyExists`.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;

use crate::config::EngineConfig;
use crate::consistency::{bounded, check_release_gate, load_dependencies};
use crate::error::HubError;
use crate::events;
use crate::lifecycle::{evaluate, LifecycleAction};
use crate::locks::UrnLocks;
use crate::ports::{DependencyExtractor, ModelStore, ModelValidator, Result, WriteExpectation};
use crate::types::{
    CreateModel, ModelRecord, ModelType, ModelUrn, ResolvedModel, SaveModel, UpdateModel,
};

pub struct LifecycleEngine {
    store: Arc<dyn ModelStore>,
    validator: Arc<dyn ModelValidator>,
    extractor: Arc<dyn DependencyExtractor>,
    config: EngineConfig,
    locks: UrnLocks,
}

/// Content that passed validation together with its loaded dependencies.
/// `dependencies` holds the URNs of the stored records the references resolved to.
struct Prepared {
    content: String,
    dependencies: BTreeSet<ModelUrn>,
    dependency_records: Vec<ModelRecord>,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn ModelStore>,
        validator: Arc<dyn ModelValidator>,
        extractor: Arc<dyn DependencyExtractor>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            validator,
            extractor,
            config,
            locks: UrnLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Mutations ─────────────────────────────────────────────────

    pub async fn create(&self, req: CreateModel) -> Result<ModelRecord> {
        let urn = req.urn.clone();
        let _guard = self.locks.lock(&urn).await;
        self.create_locked(req)
            .await
            .inspect_err(|e| events::emit_rejected("create", &urn, e))
    }

    pub async fn update(&self, req: UpdateModel) -> Result<ModelRecord> {
        let urn = req.urn.clone();
        let _guard = self.locks.lock(&urn).await;
        self.update_locked(req)
            .await
            .inspect_err(|e| events::emit_rejected("update", &urn, e))
    }

    /// Create when the URN is absent, otherwise replace content and move status.
    pub async fn save(&self, req: SaveModel) -> Result<ModelRecord> {
        let urn = req.urn.clone();
        let _guard = self.locks.lock(&urn).await;
        let result = match self.load(&urn).await {
            Ok(None) => {
                self.create_locked(CreateModel {
                    urn: req.urn,
                    content: req.content,
                    model_type: req.model_type,
                    status: req.status,
                })
                .await
            }
            Ok(Some(_)) => {
                self.update_locked(UpdateModel {
                    urn: req.urn,
                    content: req.content,
                    model_type: Some(req.model_type),
                    status: req.status,
                    full_replace: true,
                })
                .await
            }
            Err(e) => Err(e),
        };
        result.inspect_err(|e| events::emit_rejected("save", &urn, e))
    }

    pub async fn delete(&self, urn: &ModelUrn) -> Result<()> {
        let _guard = self.locks.lock(urn).await;
        self.delete_locked(urn)
            .await
            .inspect_err(|e| events::emit_rejected("delete", urn, e))
    }

    // ── Reads ─────────────────────────────────────────────────────

    pub async fn get(&self, urn: &ModelUrn) -> Result<ModelRecord> {
        self.load(urn)
            .await?
            .ok_or_else(|| HubError::NotFound(urn.clone()))
    }

    /// Inline the content of every model reachable from `urn`.
    ///
    /// Breadth-first, root first, each model exactly once. Cycles terminate
    /// through the visited set.
    pub async fn resolve(&self, urn: &ModelUrn) -> Result<ResolvedModel> {
        let root = self.get(urn).await?;

        let mut visited: BTreeSet<ModelUrn> = BTreeSet::from([root.urn.clone()]);
        let mut included = vec![root.urn.clone()];
        let mut blobs = vec![root.content.clone()];
        let mut frontier: Vec<ModelUrn> = root.dependencies.iter().cloned().collect();
        visited.extend(root.dependencies.iter().cloned());

        while !frontier.is_empty() {
            let level = std::mem::take(&mut frontier);
            let records = try_join_all(level.iter().map(|u| self.load(u))).await?;

            for (dep, record) in level.into_iter().zip(records) {
                let record = record.ok_or_else(|| HubError::UnresolvedReference {
                    urn: root.urn.clone(),
                    missing: vec![dep.clone()],
                })?;
                for next in &record.dependencies {
                    if visited.insert(next.clone()) {
                        frontier.push(next.clone());
                    }
                }
                included.push(dep);
                blobs.push(record.content);
            }
        }

        tracing::debug!(urn = %root.urn, models = included.len(), "resolved model");
        Ok(ResolvedModel {
            urn: root.urn,
            status: root.status,
            model_type: root.model_type,
            content: blobs.join("\n"),
            included,
        })
    }

    // ── Internals (caller holds the URN lock) ─────────────────────

    async fn create_locked(&self, req: CreateModel) -> Result<ModelRecord> {
        evaluate(LifecycleAction::Create(req.status)).map_err(|v| v.into_error(&req.urn))?;

        if self.load(&req.urn).await?.is_some() {
            return Err(HubError::AlreadyExists(req.urn));
        }

        let prepared = self.prepare(&req.urn, req.model_type, req.content).await?;
        check_release_gate(&req.urn, req.status, &prepared.dependency_records)?;

        let now = Utc::now();
        let record = ModelRecord {
            urn: req.urn,
            content: prepared.content,
            status: req.status,
            model_type: req.model_type,
            dependencies: prepared.dependencies,
            created_at: now,
            updated_at: now,
            revision: 1,
        };
        bounded(
            self.config.store_timeout(),
            "insert",
            self.store.put(&record, WriteExpectation::Absent),
        )
        .await?;

        events::emit_created(&record);
        Ok(record)
    }

    async fn update_locked(&self, req: UpdateModel) -> Result<ModelRecord> {
        let current = self
            .load(&req.urn)
            .await?
            .ok_or_else(|| HubError::NotFound(req.urn.clone()))?;

        let model_type = req.model_type.unwrap_or(current.model_type);
        let content = if req.full_replace || current.status.is_content_mutable() {
            req.content
        } else {
            current.content.clone()
        };

        let prepared = self.prepare(&req.urn, model_type, content).await?;

        evaluate(LifecycleAction::Transition {
            from: current.status,
            to: req.status,
        })
        .map_err(|v| v.into_error(&req.urn))?;
        check_release_gate(&req.urn, req.status, &prepared.dependency_records)?;

        let record = ModelRecord {
            urn: req.urn,
            content: prepared.content,
            status: req.status,
            model_type,
            dependencies: prepared.dependencies,
            created_at: current.created_at,
            updated_at: Utc::now(),
            revision: current.revision + 1,
        };
        bounded(
            self.config.store_timeout(),
            "update",
            self.store
                .put(&record, WriteExpectation::Revision(current.revision)),
        )
        .await?;

        events::emit_status_transition(&record.urn, current.status, record.status, record.revision);
        Ok(record)
    }

    async fn delete_locked(&self, urn: &ModelUrn) -> Result<()> {
        let current = self
            .load(urn)
            .await?
            .ok_or_else(|| HubError::NotFound(urn.clone()))?;

        evaluate(LifecycleAction::Delete(current.status)).map_err(|v| v.into_error(urn))?;

        bounded(
            self.config.store_timeout(),
            "delete",
            self.store.delete(urn, current.revision),
        )
        .await?;

        events::emit_deleted(urn, current.status);
        Ok(())
    }

    /// Validate content, resolve its references and load the dependency records.
    async fn prepare(
        &self,
        urn: &ModelUrn,
        model_type: ModelType,
        content: String,
    ) -> Result<Prepared> {
        let parsed = self.validator.validate(model_type, &content).await?;
        let mut references = self.extractor.extract_references(urn, &parsed);
        references.remove(urn);

        let dependency_records = load_dependencies(
            self.store.as_ref(),
            urn,
            &references,
            self.config.store_timeout(),
        )
        .await?;
        let dependencies: BTreeSet<ModelUrn> =
            dependency_records.iter().map(|r| r.urn.clone()).collect();

        tracing::debug!(urn = %urn, dependencies = dependencies.len(), "content accepted");
        Ok(Prepared {
            content,
            dependencies,
            dependency_records,
        })
    }

    async fn load(&self, urn: &ModelUrn) -> Result<Option<ModelRecord>> {
        bounded(self.config.store_timeout(), "get", self.store.get(urn)).await
    }
}

