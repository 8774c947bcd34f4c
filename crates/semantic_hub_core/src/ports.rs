//! Port traits for the external collaborators of the lifecycle engine.
//! Implemented by `semantic_hub_postgres` (store) and the reference adapters
//! in this crate; core logic depends only on these traits.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::HubError;
use crate::types::{ModelRecord, ModelType, ModelUrn};

pub type Result<T> = std::result::Result<T, HubError>;

/// Precondition attached to every store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteExpectation {
    /// Insert only; fails if a record already exists for the URN.
    Absent,
    /// Replace only if the stored record still carries this revision.
    Revision(u64),
}

/// Durable store keyed by model URN.
///
/// A failed precondition surfaces as [`HubError::StoreUnavailable`] so the
/// caller can retry the whole operation against fresh state.
///
/// Transient faults (pool exhaustion, I/O, serialization failures) are also
/// `StoreUnavailable`. Permanent faults are `HubError::Internal`.
#[async_trait]
pub trait ModelStore: Send + Sync {
    async fn get(&self, urn: &ModelUrn) -> Result<Option<ModelRecord>>;

    /// Insert or replace `record` atomically, subject to `expect`.
    async fn put(&self, record: &ModelRecord, expect: WriteExpectation) -> Result<()>;

    /// Remove the record if it still carries `expected_revision`.
    async fn delete(&self, urn: &ModelUrn, expected_revision: u64) -> Result<()>;

    async fn list_all(&self) -> Result<Vec<ModelRecord>>;

    /// Records whose URN is in `urns`. Unknown URNs are omitted. Order unspecified.
    async fn list_by_urns(&self, urns: &BTreeSet<ModelUrn>) -> Result<Vec<ModelRecord>>;

    /// Records stored under `package_prefix` (`urn:{scheme}:{namespace}:{version}#`),
    /// in URN order.
    async fn list_by_package(&self, package_prefix: &str) -> Result<Vec<ModelRecord>>;
}

/// Validated model content, as handed from validator to extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedModel {
    pub model_type: ModelType,
    pub content: String,
    /// Every well-formed model/element URN token in the content, in order of appearance.
    pub urn_tokens: Vec<ModelUrn>,
}

/// Semantic validation of raw model content.
#[async_trait]
pub trait ModelValidator: Send + Sync {
    /// `HubError::ValidationFailed` with details when the content is not a valid model.
    async fn validate(&self, model_type: ModelType, raw: &str) -> Result<ParsedModel>;
}

/// Derives the direct dependencies of a parsed model.
pub trait DependencyExtractor: Send + Sync {
    /// Element URNs in other packages referenced by `model`. Never includes `own`.
    ///
    /// A reference names any element of a package; the engine maps it to the
    /// stored record(s) of that package.
    fn extract_references(&self, own: &ModelUrn, model: &ParsedModel) -> BTreeSet<ModelUrn>;
}
