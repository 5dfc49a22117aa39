// ABOUTME: State machine that decodes a streamed plan response into a result tree.
// ABOUTME: Listener callbacks fire inline as each section is read; any grammar deviation is fatal.

use std::io::Read;

use crate::listener::Listeners;
use crate::plan::{DeploymentAction, DeploymentPlan, DeploymentSetPlan};
use crate::result::{
    DeploymentPlanResult, DomainRollbackOutcome, ResultTreeBuilder, ServerRollbackOutcome,
};
use crate::types::{ActionId, PlanId, ServerIdentity, SetId};

use super::codec::{Unmarshaller, WireReader};
use super::error::ProtocolError;
use super::records::{
    ApplierOutcome, ApplierResponse, RemoteError, UpdateKind, UpdateOutcome, UpdateResult,
};
use super::tags::Tag;

/// Position in the response grammar, named after what was read last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Start,
    AfterPlanId,
    ExpectAction { set: SetId },
    AfterAction { set: SetId },
    AfterServer { set: SetId },
    ExpectRollbackAction { set: SetId },
    AfterRollbackAction { set: SetId },
    AfterServerRollback { set: SetId },
}

impl DecodeState {
    fn expected(self) -> &'static str {
        match self {
            DecodeState::Start => "PLAN_ID",
            DecodeState::AfterPlanId => "PLAN_INVALID or SET_ID",
            DecodeState::ExpectAction { .. } | DecodeState::ExpectRollbackAction { .. } => {
                "ACTION_ID"
            }
            DecodeState::AfterAction { .. } => {
                "ACTION_ID, SERVER_DEPLOYMENT, SET_ID, SET_ROLLBACK or PLAN_COMPLETE"
            }
            DecodeState::AfterServer { .. } => {
                "SERVER_DEPLOYMENT, SET_ID, SET_ROLLBACK or PLAN_COMPLETE"
            }
            DecodeState::AfterRollbackAction { .. } => {
                "ACTION_ID, SERVER_ROLLBACK, SET_ROLLBACK or PLAN_COMPLETE"
            }
            DecodeState::AfterServerRollback { .. } => {
                "SERVER_ROLLBACK, SET_ROLLBACK or PLAN_COMPLETE"
            }
        }
    }
}

/// Decodes one response stream for one plan.
///
/// The result tree is only returned after `PLAN_COMPLETE` (or
/// `PLAN_INVALID`) has been read; on error nothing decoded so far is
/// published.
pub struct ResultDecoder<'a, U> {
    plan: &'a DeploymentPlan,
    listeners: &'a Listeners,
    input: U,
    tree: ResultTreeBuilder,
}

impl<'a, U: Unmarshaller> ResultDecoder<'a, U> {
    pub fn new(plan: &'a DeploymentPlan, listeners: &'a Listeners, input: U) -> Self {
        Self {
            plan,
            listeners,
            input,
            tree: ResultTreeBuilder::new(plan.id()),
        }
    }

    /// Consume the stream until the terminal tag.
    ///
    /// # Errors
    ///
    /// Any `ProtocolError`: unexpected or unknown tags, ids that are not part
    /// of the plan, duplicate sections, or a stream that ends early.
    pub fn decode(self) -> Result<DeploymentPlanResult, ProtocolError> {
        let plan_id = self.plan.id();
        let result = self.run();
        match &result {
            Ok(tree) if !tree.is_valid() => {
                tracing::debug!(plan = %plan_id, "controller rejected plan");
            }
            Ok(_) => tracing::debug!(plan = %plan_id, "decoded plan response"),
            Err(error) => tracing::error!(plan = %plan_id, %error, "failed to decode plan response"),
        }
        result
    }

    fn run(mut self) -> Result<DeploymentPlanResult, ProtocolError> {
        use DecodeState::*;

        let mut state = Start;
        loop {
            let tag = self.input.read_tag()?;
            state = match (state, tag) {
                (Start, Tag::PlanId) => {
                    self.plan_id()?;
                    AfterPlanId
                }
                (AfterPlanId, Tag::PlanInvalid) => {
                    let error: RemoteError = self.input.read_record()?;
                    return Ok(self.tree.invalid(error));
                }
                (AfterPlanId | AfterAction { .. } | AfterServer { .. }, Tag::SetId) => {
                    let set = self.set_result()?;
                    ExpectAction { set }
                }
                (ExpectAction { set } | AfterAction { set }, Tag::ActionId) => {
                    self.action_result(set)?;
                    AfterAction { set }
                }
                (AfterAction { set } | AfterServer { set }, Tag::ServerDeployment) => {
                    self.server_deployment(set)?;
                    AfterServer { set }
                }
                (
                    AfterAction { .. }
                    | AfterServer { .. }
                    | AfterRollbackAction { .. }
                    | AfterServerRollback { .. },
                    Tag::SetRollback,
                ) => {
                    let set = self.set_rollback()?;
                    ExpectRollbackAction { set }
                }
                (ExpectRollbackAction { set } | AfterRollbackAction { set }, Tag::ActionId) => {
                    self.action_rollback(set)?;
                    AfterRollbackAction { set }
                }
                (AfterRollbackAction { set } | AfterServerRollback { set }, Tag::ServerRollback) => {
                    self.server_rollback(set)?;
                    AfterServerRollback { set }
                }
                (
                    AfterAction { .. }
                    | AfterServer { .. }
                    | AfterRollbackAction { .. }
                    | AfterServerRollback { .. },
                    Tag::PlanComplete,
                ) => return Ok(self.tree.finish()),
                (state, found) => return Err(ProtocolError::unexpected(state.expected(), found)),
            };
        }
    }

    fn plan_id(&mut self) -> Result<(), ProtocolError> {
        let found = PlanId::new(self.input.read_uuid()?);
        let expected = self.plan.id();
        if found != expected {
            return Err(ProtocolError::PlanIdMismatch { expected, found });
        }
        tracing::trace!(plan = %found, "plan id");
        Ok(())
    }

    fn find_set(&self, set_id: SetId) -> Result<&'a DeploymentSetPlan, ProtocolError> {
        let plan: &'a DeploymentPlan = self.plan;
        plan.find_set(&set_id)
            .ok_or(ProtocolError::UnknownSet(set_id))
    }

    fn read_action(&mut self, set_id: SetId) -> Result<&'a DeploymentAction, ProtocolError> {
        let action_id = ActionId::new(self.input.read_uuid()?);
        self.find_set(set_id)?
            .action(&action_id)
            .ok_or(ProtocolError::UnknownAction {
                set: set_id,
                action: action_id,
            })
    }

    /// Read `ACTION_ID uuid HOST_NAME str SERVER_GROUP_NAME str SERVER_NAME str SERVER_RESULT record`.
    fn read_server_block(
        &mut self,
        set_id: SetId,
    ) -> Result<(&'a DeploymentAction, ServerIdentity, UpdateResult), ProtocolError> {
        self.input.expect_tag(Tag::ActionId)?;
        let action = self.read_action(set_id)?;
        self.input.expect_tag(Tag::HostName)?;
        let host = self.input.read_string()?;
        self.input.expect_tag(Tag::ServerGroupName)?;
        let group = self.input.read_string()?;
        self.input.expect_tag(Tag::ServerName)?;
        let server = self.input.read_string()?;
        self.input.expect_tag(Tag::ServerResult)?;
        let result: UpdateResult = self.input.read_record()?;

        if self.find_set(set_id)?.server_group_plan(&group).is_none() {
            return Err(ProtocolError::UnknownServerGroup { set: set_id, group });
        }
        Ok((action, ServerIdentity::new(host, group, server), result))
    }

    fn set_result(&mut self) -> Result<SetId, ProtocolError> {
        let set_id = SetId::new(self.input.read_uuid()?);
        let set = self.find_set(set_id)?;
        if self.tree.has_set(&set_id) {
            return Err(ProtocolError::UnexpectedSet {
                set: set_id,
                reason: "set result reported twice",
            });
        }
        self.tree.begin_set(set);
        tracing::trace!(set = %set_id, "set result");
        Ok(set_id)
    }

    fn action_result(&mut self, set_id: SetId) -> Result<(), ProtocolError> {
        let action = self.read_action(set_id)?;
        self.input.expect_tag(Tag::ActionModelResult)?;
        let response: ApplierResponse = self.input.read_record()?;
        self.tree.record_action(set_id, action, &response)?;
        tracing::trace!(set = %set_id, action = %action.id(), outcome = ?response.classify(), "action result");
        dispatch_action(self.listeners, action, &response);
        Ok(())
    }

    fn server_deployment(&mut self, set_id: SetId) -> Result<(), ProtocolError> {
        let (action, server, result) = self.read_server_block(set_id)?;
        self.tree
            .record_server(set_id, action.id(), server.clone(), &result)?;
        tracing::trace!(action = %action.id(), %server, outcome = ?result.classify(), "server result");
        dispatch_server(self.listeners, action, &server, &result);
        Ok(())
    }

    fn set_rollback(&mut self) -> Result<SetId, ProtocolError> {
        let set_id = SetId::new(self.input.read_uuid()?);
        self.find_set(set_id)?;
        self.tree.mark_set_rolled_back(&set_id)?;
        tracing::trace!(set = %set_id, "set rollback");
        Ok(set_id)
    }

    fn action_rollback(&mut self, set_id: SetId) -> Result<(), ProtocolError> {
        let action = self.read_action(set_id)?;
        self.input.expect_tag(Tag::ActionModelResult)?;
        let response: ApplierResponse = self.input.read_record()?;
        let outcome = self
            .tree
            .record_domain_rollback(set_id, action.id(), &response)?
            .clone();
        tracing::trace!(action = %action.id(), ?outcome, "action rollback");
        dispatch_domain_rollback(self.listeners, action, &outcome);
        Ok(())
    }

    fn server_rollback(&mut self, set_id: SetId) -> Result<(), ProtocolError> {
        let (action, server, result) = self.read_server_block(set_id)?;
        let outcome = self
            .tree
            .record_server_rollback(set_id, action.id(), &server, &result)?
            .clone();
        tracing::trace!(action = %action.id(), %server, ?outcome, "server rollback");
        dispatch_server_rollback(self.listeners, action, &server, &outcome);
        Ok(())
    }
}

/// Decode a response read from `input` for `plan`.
pub fn decode_response(
    plan: &DeploymentPlan,
    listeners: &Listeners,
    input: impl Read,
) -> Result<DeploymentPlanResult, ProtocolError> {
    ResultDecoder::new(plan, listeners, WireReader::new(input)).decode()
}

fn dispatch_action(listeners: &Listeners, action: &DeploymentAction, response: &ApplierResponse) {
    let outcome = response.classify();
    listeners.notify(&action.id(), |listener| match outcome {
        ApplierOutcome::CancelledByDomain => listener.handle_cancelled_by_domain(action),
        ApplierOutcome::DomainRolledBack => listener.handle_domain_rolled_back(action),
        ApplierOutcome::DomainFailed => {
            if let Some(error) = &response.domain_failure {
                listener.handle_domain_failed(action, error);
            }
        }
        ApplierOutcome::HostFailed => listener.handle_host_failed(action, &response.host_failures),
        ApplierOutcome::ServersIdentified => {
            listener.handle_servers_identified(action, &response.servers)
        }
    });
}

fn dispatch_server(
    listeners: &Listeners,
    action: &DeploymentAction,
    server: &ServerIdentity,
    result: &UpdateResult,
) {
    let kind = result.classify();
    listeners.notify(&action.id(), |listener| match (kind, &result.outcome) {
        (UpdateKind::Cancelled, _) => listener.handle_server_cancelled(action, server),
        (UpdateKind::RolledBack, _) => listener.handle_server_rolled_back(action, server),
        (UpdateKind::TimedOut, _) => listener.handle_server_timed_out(action, server),
        (_, UpdateOutcome::Failure { error }) => listener.handle_server_failed(action, server, error),
        (_, UpdateOutcome::Success { value }) => {
            listener.handle_server_succeeded(action, server, value.as_ref())
        }
        (_, UpdateOutcome::Cancelled | UpdateOutcome::TimedOut) => {}
    });
}

fn dispatch_domain_rollback(
    listeners: &Listeners,
    action: &DeploymentAction,
    outcome: &DomainRollbackOutcome,
) {
    listeners.notify(&action.id(), |listener| match outcome {
        DomainRollbackOutcome::Cancelled => listener.handle_rollback_cancellation(action),
        DomainRollbackOutcome::DomainFailed { error } => {
            listener.handle_domain_rollback_failed(action, error)
        }
        DomainRollbackOutcome::HostFailed { host_failures } => {
            listener.handle_host_rollback_failed(action, host_failures)
        }
        DomainRollbackOutcome::Completed => listener.handle_domain_rollback(action),
    });
}

fn dispatch_server_rollback(
    listeners: &Listeners,
    action: &DeploymentAction,
    server: &ServerIdentity,
    outcome: &ServerRollbackOutcome,
) {
    listeners.notify(&action.id(), |listener| match outcome {
        ServerRollbackOutcome::Completed => listener.handle_server_rollback(action, server),
        ServerRollbackOutcome::Cancelled => listener.handle_server_rollback_cancelled(action, server),
        ServerRollbackOutcome::TimedOut => listener.handle_server_rollback_timed_out(action, server),
        ServerRollbackOutcome::Failed { error } => {
            listener.handle_server_rollback_failed(action, server, error)
        }
    });
}
