// ABOUTME: Outcome enums stored on result tree nodes.
// ABOUTME: Converted from wire records using the same precedence as listener dispatch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::protocol::{ApplierOutcome, ApplierResponse, RemoteError, UpdateKind, UpdateOutcome, UpdateResult};

/// Domain-level outcome of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DomainOutcome {
    ServersIdentified,
    CancelledByDomain,
    RolledBack,
    DomainFailed { error: RemoteError },
    HostFailed,
}

impl From<&ApplierResponse> for DomainOutcome {
    fn from(response: &ApplierResponse) -> Self {
        match response.classify() {
            ApplierOutcome::CancelledByDomain => DomainOutcome::CancelledByDomain,
            ApplierOutcome::DomainRolledBack => DomainOutcome::RolledBack,
            ApplierOutcome::DomainFailed => DomainOutcome::DomainFailed {
                error: response
                    .domain_failure
                    .clone()
                    .unwrap_or_else(|| RemoteError::new("domain failure")),
            },
            ApplierOutcome::HostFailed => DomainOutcome::HostFailed,
            ApplierOutcome::ServersIdentified => DomainOutcome::ServersIdentified,
        }
    }
}

/// Outcome of an action on one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ServerOutcome {
    Succeeded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
    Failed {
        error: RemoteError,
    },
    Cancelled,
    TimedOut,
    RolledBack,
}

impl From<&UpdateResult> for ServerOutcome {
    fn from(result: &UpdateResult) -> Self {
        match (result.classify(), &result.outcome) {
            (UpdateKind::Cancelled, _) => ServerOutcome::Cancelled,
            (UpdateKind::RolledBack, _) => ServerOutcome::RolledBack,
            (UpdateKind::TimedOut, _) => ServerOutcome::TimedOut,
            (_, UpdateOutcome::Failure { error }) => ServerOutcome::Failed {
                error: error.clone(),
            },
            (_, UpdateOutcome::Success { value }) => ServerOutcome::Succeeded {
                value: value.clone(),
            },
            (_, UpdateOutcome::Cancelled) => ServerOutcome::Cancelled,
            (_, UpdateOutcome::TimedOut) => ServerOutcome::TimedOut,
        }
    }
}

/// Outcome of rolling an action back at the domain level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DomainRollbackOutcome {
    Completed,
    Cancelled,
    DomainFailed {
        error: RemoteError,
    },
    HostFailed {
        host_failures: BTreeMap<String, RemoteError>,
    },
}

impl From<&ApplierResponse> for DomainRollbackOutcome {
    fn from(response: &ApplierResponse) -> Self {
        if response.cancelled {
            DomainRollbackOutcome::Cancelled
        } else if let Some(error) = &response.domain_failure {
            DomainRollbackOutcome::DomainFailed {
                error: error.clone(),
            }
        } else if !response.host_failures.is_empty() {
            DomainRollbackOutcome::HostFailed {
                host_failures: response.host_failures.clone(),
            }
        } else {
            DomainRollbackOutcome::Completed
        }
    }
}

/// Outcome of rolling an action back on one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ServerRollbackOutcome {
    Completed,
    Failed { error: RemoteError },
    Cancelled,
    TimedOut,
}

impl From<&UpdateResult> for ServerRollbackOutcome {
    fn from(result: &UpdateResult) -> Self {
        match &result.outcome {
            UpdateOutcome::Cancelled => ServerRollbackOutcome::Cancelled,
            UpdateOutcome::TimedOut => ServerRollbackOutcome::TimedOut,
            UpdateOutcome::Failure { error } => ServerRollbackOutcome::Failed {
                error: error.clone(),
            },
            UpdateOutcome::Success { .. } => ServerRollbackOutcome::Completed,
        }
    }
}
