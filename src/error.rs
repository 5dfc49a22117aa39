// ABOUTME: Application-wide error types for rollplan.
// ABOUTME: Uses thiserror to wrap subsystem errors for the config and CLI paths.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::execution::{ExecutionError, TransportError};
use crate::plan::PlanError;
use crate::protocol::ProtocolError;
use crate::types::PlanId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("plan file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid plan file: {0}")]
    InvalidConfig(String),

    #[error("failed to open content {path}: {source}")]
    Content {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("plan {plan_id} rejected by the controller: {reason}")]
    PlanRejected { plan_id: PlanId, reason: String },

    #[error("plan {0} finished with failures")]
    DeploymentFailed(PlanId),

    #[error("plan {0} was cancelled")]
    Cancelled(PlanId),

    #[error("timed out after {0:?} waiting for the plan result")]
    AwaitTimeout(Duration),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
