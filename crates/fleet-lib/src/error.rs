//! Error taxonomy for the scan pipeline
//!
//! Only collaborator and persistence faults are errors. Insufficient history
//! is a "no verdict" outcome (see [`crate::policy::Verdict`]) and malformed
//! samples are dropped and counted by the evaluator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// External collaborators the core talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    Inventory,
    Metrics,
    Pricing,
    Persistence,
    Alerts,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collaborator::Inventory => write!(f, "inventory"),
            Collaborator::Metrics => write!(f, "metrics"),
            Collaborator::Pricing => write!(f, "pricing"),
            Collaborator::Persistence => write!(f, "persistence"),
            Collaborator::Alerts => write!(f, "alerts"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("{collaborator} unavailable for {scope}: {message}")]
    CollaboratorUnavailable {
        collaborator: Collaborator,
        scope: String,
        message: String,
    },

    #[error("{collaborator} call for {scope} timed out after {timeout:?}")]
    Timeout {
        collaborator: Collaborator,
        scope: String,
        timeout: Duration,
    },

    #[error("persisting {resource_id} failed after {attempts} attempts: {message}")]
    PersistenceFailure {
        resource_id: String,
        attempts: u32,
        message: String,
    },

    #[error("history store error: {0}")]
    HistoryStore(String),
}

impl FleetError {
    pub fn unavailable(
        collaborator: Collaborator,
        scope: impl Into<String>,
        err: impl fmt::Display,
    ) -> Self {
        FleetError::CollaboratorUnavailable {
            collaborator,
            scope: scope.into(),
            message: err.to_string(),
        }
    }

    /// Collaborator involved in the failure, if any
    pub fn collaborator(&self) -> Option<Collaborator> {
        match self {
            FleetError::CollaboratorUnavailable { collaborator, .. }
            | FleetError::Timeout { collaborator, .. } => Some(*collaborator),
            FleetError::PersistenceFailure { .. } => Some(Collaborator::Persistence),
            FleetError::HistoryStore(_) => None,
        }
    }
}

pub type FleetResult<T> = std::result::Result<T, FleetError>;

/// Run a collaborator call under a timeout, folding both failure modes into
/// [`FleetError`].
pub async fn bounded<T, F>(
    collaborator: Collaborator,
    scope: &str,
    timeout: Duration,
    call: F,
) -> FleetResult<T>
where
    F: std::future::Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(FleetError::unavailable(collaborator, scope, format!("{:#}", e))),
        Err(_) => Err(FleetError::Timeout {
            collaborator,
            scope: scope.to_string(),
            timeout,
        }),
    }
}
