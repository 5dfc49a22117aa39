// ABOUTME: Fatal decode errors for the tagged response stream.
// ABOUTME: Any deviation from the grammar aborts decoding; nothing is skipped or recovered.

use std::io;

use crate::types::{ActionId, PlanId, SetId};

use super::tags::Tag;

/// A fatal protocol error. The decoder never recovers from one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("expected {expected} but found {found}")]
    UnexpectedTag { expected: String, found: Tag },

    #[error("unknown tag byte 0x{0:02x}")]
    UnknownTag(u8),

    #[error("response is for plan {found}, expected plan {expected}")]
    PlanIdMismatch { expected: PlanId, found: PlanId },

    #[error("set {0} is not part of the plan")]
    UnknownSet(SetId),

    #[error("set {set} appeared out of order: {reason}")]
    UnexpectedSet { set: SetId, reason: &'static str },

    #[error("action {action} is not part of set {set}")]
    UnknownAction { set: SetId, action: ActionId },

    #[error("action {0} was reported twice")]
    DuplicateAction(ActionId),

    #[error("server group {group} is not targeted by set {set}")]
    UnknownServerGroup { set: SetId, group: String },

    #[error("server {server} was reported twice for action {action}")]
    DuplicateServer { action: ActionId, server: String },

    #[error("rollback for server {server} of action {action} has no recorded outcome")]
    MissingServerOutcome { action: ActionId, server: String },

    #[error("response stream ended before PLAN_COMPLETE")]
    UnexpectedEof,

    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    #[error("i/o error reading response: {0}")]
    Io(String),
}

impl ProtocolError {
    pub(crate) fn unexpected(expected: impl Into<String>, found: Tag) -> Self {
        ProtocolError::UnexpectedTag {
            expected: expected.into(),
            found,
        }
    }

    pub(crate) fn malformed(what: &'static str, reason: impl ToString) -> Self {
        ProtocolError::Malformed {
            what,
            reason: reason.to_string(),
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ProtocolError::UnexpectedEof
        } else {
            ProtocolError::Io(err.to_string())
        }
    }
}
