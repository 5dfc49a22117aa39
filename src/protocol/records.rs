// ABOUTME: Structured records carried after ACTION_MODEL_RESULT, SERVER_RESULT and PLAN_INVALID.
// ABOUTME: Each record classifies into exactly one outcome, checked in a fixed precedence order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::ServerIdentity;

/// A failure reported by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(self, cause: impl Into<String>) -> Self {
        Self {
            cause: Some(cause.into()),
            ..self
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{} (caused by: {})", self.message, cause),
            None => f.write_str(&self.message),
        }
    }
}

/// Domain-level response to one action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplierResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_failure: Option<RemoteError>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub host_failures: BTreeMap<String, RemoteError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ServerIdentity>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub rolled_back: bool,
}

/// Classification of an [`ApplierResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplierOutcome {
    CancelledByDomain,
    DomainRolledBack,
    DomainFailed,
    HostFailed,
    ServersIdentified,
}

impl ApplierResponse {
    /// The action was applied and will run on `servers`.
    pub fn servers_identified(servers: Vec<ServerIdentity>) -> Self {
        Self {
            servers,
            ..Self::default()
        }
    }

    pub fn domain_failed(error: RemoteError) -> Self {
        Self {
            domain_failure: Some(error),
            ..Self::default()
        }
    }

    pub fn host_failed(host_failures: BTreeMap<String, RemoteError>) -> Self {
        Self {
            host_failures,
            ..Self::default()
        }
    }

    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }

    pub fn rolled_back() -> Self {
        Self {
            rolled_back: true,
            ..Self::default()
        }
    }

    pub fn classify(&self) -> ApplierOutcome {
        if self.cancelled {
            ApplierOutcome::CancelledByDomain
        } else if self.rolled_back {
            ApplierOutcome::DomainRolledBack
        } else if self.domain_failure.is_some() {
            ApplierOutcome::DomainFailed
        } else if !self.host_failures.is_empty() {
            ApplierOutcome::HostFailed
        } else {
            ApplierOutcome::ServersIdentified
        }
    }
}

/// Outcome status of one server update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
    Failure {
        error: RemoteError,
    },
    Cancelled,
    TimedOut,
}

/// Per-server response to one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    #[serde(flatten)]
    pub outcome: UpdateOutcome,
    #[serde(default)]
    pub rolled_back: bool,
}

/// Classification of an [`UpdateResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Cancelled,
    RolledBack,
    TimedOut,
    Failed,
    Succeeded,
}

impl UpdateResult {
    pub fn success(value: Option<serde_json::Value>) -> Self {
        Self {
            outcome: UpdateOutcome::Success { value },
            rolled_back: false,
        }
    }

    pub fn failure(error: RemoteError) -> Self {
        Self {
            outcome: UpdateOutcome::Failure { error },
            rolled_back: false,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            outcome: UpdateOutcome::Cancelled,
            rolled_back: false,
        }
    }

    pub fn timed_out() -> Self {
        Self {
            outcome: UpdateOutcome::TimedOut,
            rolled_back: false,
        }
    }

    /// Mark the update as rolled back on the server.
    pub fn rolled_back(self) -> Self {
        Self {
            rolled_back: true,
            ..self
        }
    }

    pub fn classify(&self) -> UpdateKind {
        match &self.outcome {
            UpdateOutcome::Cancelled => UpdateKind::Cancelled,
            _ if self.rolled_back => UpdateKind::RolledBack,
            UpdateOutcome::TimedOut => UpdateKind::TimedOut,
            UpdateOutcome::Failure { .. } => UpdateKind::Failed,
            UpdateOutcome::Success { .. } => UpdateKind::Succeeded,
        }
    }
}
