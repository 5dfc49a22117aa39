// ABOUTME: Execution error types with SNAFU pattern.
// ABOUTME: Unifies transport, protocol and wait failures behind a kind() accessor.

use snafu::Snafu;
use std::time::Duration;

use crate::protocol::ProtocolError;
use crate::types::{ActionId, PlanId};

use super::transport::TransportError;

/// Failure of a plan execution, as seen through its handle.
///
/// A cancelled execution is not an error; see `PlanOutcome::Cancelled`.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ExecutionError {
    #[snafu(display("failed to decode response for plan {plan_id}: {source}"))]
    Protocol {
        plan_id: PlanId,
        source: ProtocolError,
    },

    #[snafu(display("transport failed: {source}"))]
    Transport { source: TransportError },

    #[snafu(display("plan {plan_id} did not finish within {waited:?}"))]
    Timeout { plan_id: PlanId, waited: Duration },

    #[snafu(display("action {action_id} is not part of the plan"))]
    UnknownListenerTarget { action_id: ActionId },

    #[snafu(display("listeners were registered for plan {registered}, not plan {plan_id}"))]
    ListenerPlanMismatch { plan_id: PlanId, registered: PlanId },

    #[snafu(display("failed to encode execution request: {source}"))]
    RequestEncoding { source: ProtocolError },

    #[snafu(display("failed to start decoder thread: {message}"))]
    Spawn { message: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorKind {
    /// The response stream violated the protocol.
    Protocol,
    /// The response stream ended before the terminal tag.
    TruncatedResponse,
    /// The transport could not deliver the request or the response.
    Transport,
    /// A bounded wait elapsed; the execution is still running.
    Timeout,
    /// Listener registration did not match the plan.
    InvalidListener,
    /// The execution could not be started.
    Submission,
}

impl ExecutionError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ExecutionErrorKind {
        match self {
            ExecutionError::Protocol { source, .. } => match source {
                ProtocolError::UnexpectedEof => ExecutionErrorKind::TruncatedResponse,
                _ => ExecutionErrorKind::Protocol,
            },
            ExecutionError::Transport { .. } => ExecutionErrorKind::Transport,
            ExecutionError::Timeout { .. } => ExecutionErrorKind::Timeout,
            ExecutionError::UnknownListenerTarget { .. }
            | ExecutionError::ListenerPlanMismatch { .. } => ExecutionErrorKind::InvalidListener,
            ExecutionError::RequestEncoding { .. } | ExecutionError::Spawn { .. } => {
                ExecutionErrorKind::Submission
            }
        }
    }

    /// Returns the protocol error if decoding failed.
    pub fn protocol_error(&self) -> Option<&ProtocolError> {
        match self {
            ExecutionError::Protocol { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<TransportError> for ExecutionError {
    fn from(source: TransportError) -> Self {
        ExecutionError::Transport { source }
    }
}
