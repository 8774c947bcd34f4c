//! Model lifecycle state machine.
//!
//! | Current      | Allowed next            | Content mutable |
//! |--------------|-------------------------|-----------------|
//! | DRAFT        | DRAFT, RELEASED         | yes             |
//! | RELEASED     | STANDARDIZED, DEPRECATED| no              |
//! | STANDARDIZED | DEPRECATED              | no              |
//! | DEPRECATED   | (delete only)           | no              |
//!
//! Pure and stateless. Knows nothing about URNs or dependencies; the engine
//! attaches the URN when it turns a [`LifecycleViolation`] into a `HubError`.

use crate::error::HubError;
use crate::types::{ModelStatus, ModelUrn};

/// Statuses a new model may be created in.
pub const INITIAL_STATUSES: [ModelStatus; 2] = [ModelStatus::Draft, ModelStatus::Released];

/// What the caller is trying to do to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Create(ModelStatus),
    Transition { from: ModelStatus, to: ModelStatus },
    Delete(ModelStatus),
}

/// Why an action was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleViolation {
    InvalidInitialStatus {
        requested: ModelStatus,
    },
    InvalidTransition {
        current: ModelStatus,
        requested: ModelStatus,
        allowed: Vec<ModelStatus>,
    },
    DeleteNotAllowed {
        current: ModelStatus,
    },
}

impl LifecycleViolation {
    pub fn into_error(self, urn: &ModelUrn) -> HubError {
        let urn = urn.clone();
        match self {
            Self::InvalidInitialStatus { requested } => {
                HubError::InvalidInitialStatus { urn, requested }
            }
            Self::InvalidTransition {
                current,
                requested,
                allowed,
            } => HubError::InvalidTransition {
                urn,
                current,
                requested,
                allowed,
            },
            Self::DeleteNotAllowed { current } => HubError::DeleteNotAllowed { urn, current },
        }
    }
}

/// Statuses reachable from `current` in one step.
pub fn allowed_transitions(current: ModelStatus) -> &'static [ModelStatus] {
    match current {
        ModelStatus::Draft => &[ModelStatus::Draft, ModelStatus::Released],
        ModelStatus::Released => &[ModelStatus::Standardized, ModelStatus::Deprecated],
        ModelStatus::Standardized => &[ModelStatus::Deprecated],
        ModelStatus::Deprecated => &[],
    }
}

pub fn can_delete(current: ModelStatus) -> bool {
    matches!(current, ModelStatus::Draft | ModelStatus::Deprecated)
}

pub fn evaluate(action: LifecycleAction) -> Result<(), LifecycleViolation> {
    match action {
        LifecycleAction::Create(requested) => {
            if INITIAL_STATUSES.contains(&requested) {
                Ok(())
            } else {
                Err(LifecycleViolation::InvalidInitialStatus { requested })
            }
        }
        LifecycleAction::Transition { from, to } => {
            let allowed = allowed_transitions(from);
            if allowed.contains(&to) {
                Ok(())
            } else {
                Err(LifecycleViolation::InvalidTransition {
                    current: from,
                    requested: to,
                    allowed: allowed.to_vec(),
                })
            }
        }
        LifecycleAction::Delete(current) => {
            if can_delete(current) {
                Ok(())
            } else {
                Err(LifecycleViolation::DeleteNotAllowed { current })
            }
        }
    }
}
