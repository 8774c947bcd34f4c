//! Structured lifecycle events.
//!
//! Every accepted mutation and every rejection is emitted as a `tracing`
//! event under the `semantic_hub::lifecycle` target. Hosts decide where the
//! events go by installing a subscriber.

use crate::error::HubError;
use crate::types::{ModelRecord, ModelStatus, ModelUrn};

pub const TARGET: &str = "semantic_hub::lifecycle";

pub fn emit_created(record: &ModelRecord) {
    tracing::info!(
        target: TARGET,
        urn = %record.urn,
        status = %record.status,
        model_type = %record.model_type,
        dependencies = record.dependencies.len(),
        "model created"
    );
}

pub fn emit_status_transition(urn: &ModelUrn, from: ModelStatus, to: ModelStatus, revision: u64) {
    tracing::info!(
        target: TARGET,
        urn = %urn,
        from = %from,
        to = %to,
        revision,
        "model updated"
    );
}

pub fn emit_deleted(urn: &ModelUrn, status: ModelStatus) {
    tracing::info!(target: TARGET, urn = %urn, status = %status, "model deleted");
}

/// Rejections are expected traffic; only store trouble is worth a warning.
pub fn emit_rejected(operation: &'static str, urn: &ModelUrn, err: &HubError) {
    if err.is_retryable() {
        tracing::warn!(
            target: TARGET,
            operation,
            urn = %urn,
            kind = err.kind(),
            error = %err,
            "model operation failed"
        );
    } else {
        tracing::debug!(
            target: TARGET,
            operation,
            urn = %urn,
            kind = err.kind(),
            error = %err,
            "model operation rejected"
        );
    }
}
