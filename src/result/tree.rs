// ABOUTME: Plan, set, action, server group and server nodes of the result tree.
// ABOUTME: Nodes are created in stream order; only rollback outcomes are attached to existing nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::plan::{DeploymentAction, DeploymentSetPlan};
use crate::protocol::{ApplierResponse, ProtocolError, RemoteError, UpdateResult};
use crate::types::{ActionId, PlanId, ServerIdentity, SetId};

use super::outcome::{DomainOutcome, DomainRollbackOutcome, ServerOutcome, ServerRollbackOutcome};

/// Result of a whole plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPlanResult {
    plan_id: PlanId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invalid: Option<RemoteError>,
    set_results: Vec<DeploymentSetResult>,
    action_results: BTreeMap<ActionId, ActionResult>,
}

impl DeploymentPlanResult {
    pub fn plan_id(&self) -> PlanId {
        self.plan_id
    }

    /// Whether the controller accepted the plan for evaluation.
    ///
    /// Domain and host failures of individual actions do not make a plan
    /// invalid; inspect the action results for those.
    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }

    pub fn invalid_reason(&self) -> Option<&RemoteError> {
        self.invalid.as_ref()
    }

    /// Set results in the order the controller reported them.
    pub fn set_results(&self) -> &[DeploymentSetResult] {
        &self.set_results
    }

    pub fn set_result(&self, set_id: &SetId) -> Option<&DeploymentSetResult> {
        self.set_results.iter().find(|set| set.set_id == *set_id)
    }

    pub fn action_results(&self) -> &BTreeMap<ActionId, ActionResult> {
        &self.action_results
    }

    pub fn action_result(&self, action_id: &ActionId) -> Option<&ActionResult> {
        self.action_results.get(action_id)
    }

    /// True when every action was applied on every reported server.
    pub fn is_success(&self) -> bool {
        self.is_valid() && self.action_results.values().all(ActionResult::is_success)
    }
}

/// Result of one deployment set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSetResult {
    set_id: SetId,
    action_ids: Vec<ActionId>,
    server_group_sets: Vec<Vec<String>>,
    rolled_back: bool,
}

impl DeploymentSetResult {
    pub fn set_id(&self) -> SetId {
        self.set_id
    }

    /// Ids of the actions reported for this set, in stream order.
    pub fn action_ids(&self) -> &[ActionId] {
        &self.action_ids
    }

    /// Concurrent server group sets the set was rolled out to.
    pub fn server_group_sets(&self) -> &[Vec<String>] {
        &self.server_group_sets
    }

    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back
    }
}

/// Result of one action across the domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    action: DeploymentAction,
    set_id: SetId,
    domain_outcome: DomainOutcome,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    host_failures: BTreeMap<String, RemoteError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    identified_servers: Vec<ServerIdentity>,
    group_results: BTreeMap<String, GroupActionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rollback: Option<DomainRollbackOutcome>,
}

impl ActionResult {
    pub fn action(&self) -> &DeploymentAction {
        &self.action
    }

    pub fn set_id(&self) -> SetId {
        self.set_id
    }

    pub fn domain_outcome(&self) -> &DomainOutcome {
        &self.domain_outcome
    }

    pub fn host_failures(&self) -> &BTreeMap<String, RemoteError> {
        &self.host_failures
    }

    pub fn identified_servers(&self) -> &[ServerIdentity] {
        &self.identified_servers
    }

    pub fn server_group_results(&self) -> &BTreeMap<String, GroupActionResult> {
        &self.group_results
    }

    pub fn server_group_result(&self, group: &str) -> Option<&GroupActionResult> {
        self.group_results.get(group)
    }

    pub fn rollback(&self) -> Option<&DomainRollbackOutcome> {
        self.rollback.as_ref()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.domain_outcome, DomainOutcome::ServersIdentified)
            && self
                .group_results
                .values()
                .flat_map(|group| group.servers.iter())
                .all(ServerResult::is_success)
    }
}

/// Per-server results of one action within one server group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupActionResult {
    group: String,
    servers: Vec<ServerResult>,
}

impl GroupActionResult {
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Server results in the order the controller reported them.
    pub fn servers(&self) -> &[ServerResult] {
        &self.servers
    }

    /// First result for a server named `server`, on any host.
    pub fn server_result(&self, server: &str) -> Option<&ServerResult> {
        self.servers.iter().find(|s| s.identity.server() == server)
    }

    pub fn server_result_on(&self, host: &str, server: &str) -> Option<&ServerResult> {
        self.servers
            .iter()
            .find(|s| s.identity.host() == host && s.identity.server() == server)
    }
}

/// Outcome of one action on one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerResult {
    identity: ServerIdentity,
    outcome: ServerOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rollback: Option<ServerRollbackOutcome>,
}

impl ServerResult {
    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn outcome(&self) -> &ServerOutcome {
        &self.outcome
    }

    pub fn rollback(&self) -> Option<&ServerRollbackOutcome> {
        self.rollback.as_ref()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ServerOutcome::Succeeded { .. })
    }
}

/// Mutable result tree owned by the decoder until the stream is complete.
#[derive(Debug)]
pub(crate) struct ResultTreeBuilder {
    result: DeploymentPlanResult,
}

impl ResultTreeBuilder {
    pub(crate) fn new(plan_id: PlanId) -> Self {
        Self {
            result: DeploymentPlanResult {
                plan_id,
                invalid: None,
                set_results: Vec::new(),
                action_results: BTreeMap::new(),
            },
        }
    }

    /// Finish as a rejected plan. Nothing else is kept.
    pub(crate) fn invalid(self, error: RemoteError) -> DeploymentPlanResult {
        DeploymentPlanResult {
            plan_id: self.result.plan_id,
            invalid: Some(error),
            set_results: Vec::new(),
            action_results: BTreeMap::new(),
        }
    }

    pub(crate) fn has_set(&self, set_id: &SetId) -> bool {
        self.result.set_result(set_id).is_some()
    }

    pub(crate) fn has_action(&self, action_id: &ActionId) -> bool {
        self.result.action_results.contains_key(action_id)
    }

    pub(crate) fn begin_set(&mut self, set: &DeploymentSetPlan) {
        self.result.set_results.push(DeploymentSetResult {
            set_id: set.id(),
            action_ids: Vec::new(),
            server_group_sets: set.concurrent_group_names(),
            rolled_back: false,
        });
    }

    pub(crate) fn record_action(
        &mut self,
        set_id: SetId,
        action: &DeploymentAction,
        response: &ApplierResponse,
    ) -> Result<&ActionResult, ProtocolError> {
        let action_id = action.id();
        if self.has_action(&action_id) {
            return Err(ProtocolError::DuplicateAction(action_id));
        }
        let set = self
            .set_result_mut(&set_id)
            .ok_or(ProtocolError::UnknownSet(set_id))?;
        set.action_ids.push(action_id);

        let node = ActionResult {
            action: action.clone(),
            set_id,
            domain_outcome: DomainOutcome::from(response),
            host_failures: response.host_failures.clone(),
            identified_servers: response.servers.clone(),
            group_results: BTreeMap::new(),
            rollback: None,
        };
        Ok(self.result.action_results.entry(action_id).or_insert(node))
    }

    pub(crate) fn record_server(
        &mut self,
        set_id: SetId,
        action_id: ActionId,
        identity: ServerIdentity,
        result: &UpdateResult,
    ) -> Result<&ServerResult, ProtocolError> {
        let action = self.action_mut(set_id, action_id)?;
        let group = action
            .group_results
            .entry(identity.server_group().to_string())
            .or_insert_with(|| GroupActionResult {
                group: identity.server_group().to_string(),
                servers: Vec::new(),
            });
        if group.servers.iter().any(|s| s.identity == identity) {
            return Err(ProtocolError::DuplicateServer {
                action: action_id,
                server: identity.to_string(),
            });
        }
        group.servers.push(ServerResult {
            identity,
            outcome: ServerOutcome::from(result),
            rollback: None,
        });
        group
            .servers
            .last()
            .ok_or_else(|| ProtocolError::malformed("server result", "not recorded"))
    }

    pub(crate) fn mark_set_rolled_back(&mut self, set_id: &SetId) -> Result<(), ProtocolError> {
        let set = self
            .set_result_mut(set_id)
            .ok_or(ProtocolError::UnexpectedSet {
                set: *set_id,
                reason: "rollback reported before the set result",
            })?;
        if set.rolled_back {
            return Err(ProtocolError::UnexpectedSet {
                set: *set_id,
                reason: "rollback reported twice",
            });
        }
        set.rolled_back = true;
        Ok(())
    }

    pub(crate) fn record_domain_rollback(
        &mut self,
        set_id: SetId,
        action_id: ActionId,
        response: &ApplierResponse,
    ) -> Result<&DomainRollbackOutcome, ProtocolError> {
        let action = self.action_mut(set_id, action_id)?;
        if action.rollback.is_some() {
            return Err(ProtocolError::DuplicateAction(action_id));
        }
        Ok(action.rollback.insert(DomainRollbackOutcome::from(response)))
    }

    pub(crate) fn record_server_rollback(
        &mut self,
        set_id: SetId,
        action_id: ActionId,
        identity: &ServerIdentity,
        result: &UpdateResult,
    ) -> Result<&ServerRollbackOutcome, ProtocolError> {
        let missing = || ProtocolError::MissingServerOutcome {
            action: action_id,
            server: identity.to_string(),
        };
        let action = self.action_mut(set_id, action_id)?;
        let server = action
            .group_results
            .get_mut(identity.server_group())
            .and_then(|group| group.servers.iter_mut().find(|s| s.identity == *identity))
            .ok_or_else(missing)?;
        if server.rollback.is_some() {
            return Err(ProtocolError::DuplicateServer {
                action: action_id,
                server: identity.to_string(),
            });
        }
        Ok(server.rollback.insert(ServerRollbackOutcome::from(result)))
    }

    pub(crate) fn finish(self) -> DeploymentPlanResult {
        self.result
    }

    fn set_result_mut(&mut self, set_id: &SetId) -> Option<&mut DeploymentSetResult> {
        self.result
            .set_results
            .iter_mut()
            .find(|set| set.set_id == *set_id)
    }

    fn action_mut(
        &mut self,
        set_id: SetId,
        action_id: ActionId,
    ) -> Result<&mut ActionResult, ProtocolError> {
        self.result
            .action_results
            .get_mut(&action_id)
            .filter(|action| action.set_id == set_id)
            .ok_or(ProtocolError::UnknownAction {
                set: set_id,
                action: action_id,
            })
    }
}
