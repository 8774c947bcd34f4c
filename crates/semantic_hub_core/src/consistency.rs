//! Dependency consistency checks.
//!
//! Two guards, both over direct dependencies only:
//! - every reference must land in a stored model (the named one, or its package)
//! - entering a release-grade status requires every dependency to have left DRAFT
//!
//! No transitive walk and no downward check: a dependency may be demoted or
//! deleted regardless of its dependents.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use futures::future::try_join_all;

use crate::error::HubError;
use crate::ports::{ModelStore, Result};
use crate::types::{ModelRecord, ModelStatus, ModelUrn};

/// Bound a single store call. A timeout is a retryable store failure.
///
/// Dropping the future does not roll back a write the store already applied.
pub(crate) async fn bounded<T>(
    limit: Duration,
    what: &str,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(HubError::StoreUnavailable(format!(
            "{what} timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

/// Resolve every reference of `urn` to the stored record(s) it points into,
/// reading concurrently.
///
/// A reference naming a stored model resolves to that record. Any other
/// element resolves to every record stored in the element's package. The
/// result is deduplicated, in URN order, and never contains `urn` itself.
///
/// Fails with `UnresolvedReference` listing every unresolvable reference in order.
pub async fn load_dependencies(
    store: &dyn ModelStore,
    urn: &ModelUrn,
    references: &BTreeSet<ModelUrn>,
    timeout: Duration,
) -> Result<Vec<ModelRecord>> {
    let lookups = references.iter().map(|reference| async move {
        if let Some(record) = bounded(timeout, "dependency lookup", store.get(reference)).await? {
            return Ok::<_, HubError>(vec![record]);
        }
        bounded(
            timeout,
            "package lookup",
            store.list_by_package(reference.package_prefix()),
        )
        .await
    });
    let found = try_join_all(lookups).await?;

    let mut records: BTreeMap<ModelUrn, ModelRecord> = BTreeMap::new();
    let mut missing = Vec::new();
    for (reference, targets) in references.iter().zip(found) {
        if targets.is_empty() {
            missing.push(reference.clone());
        }
        for record in targets {
            if &record.urn != urn {
                records.insert(record.urn.clone(), record);
            }
        }
    }

    if missing.is_empty() {
        Ok(records.into_values().collect())
    } else {
        tracing::debug!(urn = %urn, missing = missing.len(), "unresolved references");
        Err(HubError::UnresolvedReference {
            urn: urn.clone(),
            missing,
        })
    }
}

/// URNs of dependencies still in DRAFT, in URN order.
pub fn find_draft_dependencies(dependencies: &[ModelRecord]) -> Vec<ModelUrn> {
    let mut drafts: Vec<ModelUrn> = dependencies
        .iter()
        .filter(|d| d.status == ModelStatus::Draft)
        .map(|d| d.urn.clone())
        .collect();
    drafts.sort();
    drafts
}

/// Reject a move into RELEASED or STANDARDIZED while any dependency is DRAFT.
pub fn check_release_gate(
    urn: &ModelUrn,
    requested: ModelStatus,
    dependencies: &[ModelRecord],
) -> Result<()> {
    if !requested.is_release_grade() {
        return Ok(());
    }
    let draft_dependencies = find_draft_dependencies(dependencies);
    if draft_dependencies.is_empty() {
        Ok(())
    } else {
        Err(HubError::DependencyNotReady {
            urn: urn.clone(),
            draft_dependencies,
        })
    }
}
