//! Error type shared by the engine and its ports, with stable kinds and HTTP codes.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::types::{ModelStatus, ModelUrn};

/// Message returned when a release-grade transition meets a DRAFT dependency.
pub const DEPENDENCY_NOT_READY_MESSAGE: &str =
    "It is not allowed to release an aspect that has dependencies in DRAFT state.";

#[derive(Debug, Error)]
pub enum HubError {
    #[error("not found: {0}")]
    NotFound(ModelUrn),

    #[error("The model {0} already exists.")]
    AlreadyExists(ModelUrn),

    #[error(
        "The model {urn} cannot be created in status {requested}. Only DRAFT or RELEASED are valid initial states."
    )]
    InvalidInitialStatus {
        urn: ModelUrn,
        requested: ModelStatus,
    },

    #[error("{}", transition_message(.urn, .current, .allowed))]
    InvalidTransition {
        urn: ModelUrn,
        current: ModelStatus,
        requested: ModelStatus,
        allowed: Vec<ModelStatus>,
    },

    #[error("The package {} is already in status {current} and cannot be deleted.", .urn.package_prefix())]
    DeleteNotAllowed { urn: ModelUrn, current: ModelStatus },

    #[error("{}", DEPENDENCY_NOT_READY_MESSAGE)]
    DependencyNotReady {
        urn: ModelUrn,
        draft_dependencies: Vec<ModelUrn>,
    },

    #[error("The model {urn} references unknown models: {}", join_urns(.missing))]
    UnresolvedReference {
        urn: ModelUrn,
        missing: Vec<ModelUrn>,
    },

    #[error("Validation failed.")]
    ValidationFailed { details: BTreeMap<String, String> },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HubError {
    /// Stable machine-readable error code.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::InvalidInitialStatus { .. } => "INVALID_INITIAL_STATUS",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::DeleteNotAllowed { .. } => "DELETE_NOT_ALLOWED",
            Self::DependencyNotReady { .. } => "DEPENDENCY_NOT_READY",
            Self::UnresolvedReference { .. } => "UNRESOLVED_REFERENCE",
            Self::ValidationFailed { .. } => "VALIDATION_FAILED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::AlreadyExists(_) => 409,
            Self::InvalidInitialStatus { .. }
            | Self::InvalidTransition { .. }
            | Self::DeleteNotAllowed { .. }
            | Self::DependencyNotReady { .. }
            | Self::UnresolvedReference { .. }
            | Self::ValidationFailed { .. }
            | Self::InvalidInput(_) => 400,
            Self::StoreUnavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Only transient store failures should be retried without changing the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        let mut details = BTreeMap::new();
        details.insert("validationError".to_string(), detail.into());
        Self::ValidationFailed { details }
    }
}

fn transition_message(urn: &ModelUrn, current: &ModelStatus, allowed: &[ModelStatus]) -> String {
    let head = format!(
        "The package {} is already in status {} and cannot be modified.",
        urn.package_prefix(),
        current
    );
    match allowed.split_last() {
        None => head,
        Some((last, [])) => format!("{head} Only a transition to {last} is possible."),
        Some((last, rest)) => {
            let rest: Vec<&str> = rest.iter().map(ModelStatus::as_str).collect();
            format!(
                "{head} Only a transition to {} or {last} is possible.",
                rest.join(", ")
            )
        }
    }
}

fn join_urns(urns: &[ModelUrn]) -> String {
    urns.iter()
        .map(ModelUrn::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
