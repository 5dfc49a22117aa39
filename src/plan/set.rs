// ABOUTME: Persistent deployment set plan: ordered actions plus concurrent server-group sets.
// ABOUTME: Every mutator returns a new value; the receiver is never modified.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::types::{ActionId, SetId};

use super::action::DeploymentAction;
use super::group::ServerGroupPlan;

/// `graceful_shutdown_millis` value meaning "no graceful timeout".
pub const NO_GRACEFUL_SHUTDOWN: i64 = -1;

/// An ordered collection of actions plus their rollout across server groups.
///
/// `server_group_plans` is a sequence of concurrent-sets: the groups in one
/// element are updated together, and the next element starts only after the
/// previous one finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SetRecord", into = "SetRecord")]
pub struct DeploymentSetPlan {
    id: SetId,
    actions: Vec<DeploymentAction>,
    server_group_plans: Vec<NonEmpty<ServerGroupPlan>>,
    metadata: BTreeMap<String, serde_json::Value>,
    rollback_single_server: bool,
    shutdown: bool,
    graceful_shutdown_millis: i64,
}

impl Default for DeploymentSetPlan {
    fn default() -> Self {
        Self::new()
    }
}

impl DeploymentSetPlan {
    pub fn new() -> Self {
        Self {
            id: SetId::random(),
            actions: Vec::new(),
            server_group_plans: Vec::new(),
            metadata: BTreeMap::new(),
            rollback_single_server: true,
            shutdown: false,
            graceful_shutdown_millis: NO_GRACEFUL_SHUTDOWN,
        }
    }

    pub fn id(&self) -> SetId {
        self.id
    }

    pub fn actions(&self) -> &[DeploymentAction] {
        &self.actions
    }

    pub fn action(&self, id: &ActionId) -> Option<&DeploymentAction> {
        self.actions.iter().find(|a| a.id() == *id)
    }

    pub fn last_action(&self) -> Option<&DeploymentAction> {
        self.actions.last()
    }

    pub fn server_group_plans(&self) -> &[NonEmpty<ServerGroupPlan>] {
        &self.server_group_plans
    }

    pub fn has_server_group_plans(&self) -> bool {
        !self.server_group_plans.is_empty()
    }

    /// Look a group up across all concurrent-sets.
    pub fn server_group_plan(&self, group_name: &str) -> Option<&ServerGroupPlan> {
        self.server_group_plans
            .iter()
            .flat_map(|set| set.iter())
            .find(|plan| plan.group_name() == group_name)
    }

    /// The most recently stored group plan.
    pub fn last_server_group_plan(&self) -> Option<&ServerGroupPlan> {
        self.server_group_plans.last().map(|set| set.last())
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn is_single_server_rollback(&self) -> bool {
        self.rollback_single_server
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    pub fn graceful_shutdown_millis(&self) -> i64 {
        self.graceful_shutdown_millis
    }

    pub fn is_graceful_shutdown(&self) -> bool {
        self.shutdown && self.graceful_shutdown_millis > NO_GRACEFUL_SHUTDOWN
    }

    pub fn with_action(&self, action: DeploymentAction) -> Self {
        let mut next = self.clone();
        next.actions.push(action);
        next
    }

    /// Store a group plan in the current (last) concurrent-set.
    ///
    /// An existing entry with the same group name is removed first and the
    /// new plan is appended, so a repeated name moves to the end of the set.
    pub fn with_server_group(&self, plan: ServerGroupPlan) -> Self {
        let mut next = self.clone();
        match next.server_group_plans.pop() {
            None => next.server_group_plans.push(NonEmpty::new(plan)),
            Some(current) => {
                let retained: Vec<ServerGroupPlan> = current
                    .into_iter()
                    .filter(|existing| existing.group_name() != plan.group_name())
                    .collect();
                let set = match NonEmpty::from_vec(retained) {
                    Some(mut set) => {
                        set.push(plan);
                        set
                    }
                    None => NonEmpty::new(plan),
                };
                next.server_group_plans.push(set);
            }
        }
        next
    }

    /// Freeze the current concurrent-set and start a new one holding only `plan`.
    pub fn with_next_server_group(&self, plan: ServerGroupPlan) -> Self {
        let mut next = self.clone();
        next.server_group_plans.push(NonEmpty::new(plan));
        next
    }

    /// Replace the most recently stored group plan with `f(plan)`.
    ///
    /// Returns `None` when no group has been stored yet.
    pub fn with_last_server_group(
        &self,
        f: impl FnOnce(ServerGroupPlan) -> ServerGroupPlan,
    ) -> Option<Self> {
        let mut next = self.clone();
        let set = next.server_group_plans.last_mut()?;
        let last = set.last_mut();
        *last = f(last.clone());
        Some(next)
    }

    pub fn with_metadata(&self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let mut next = self.clone();
        next.metadata.insert(key.into(), value);
        next
    }

    pub fn without_single_server_rollback(&self) -> Self {
        Self {
            rollback_single_server: false,
            ..self.clone()
        }
    }

    /// Shut servers down without waiting for in-flight work.
    pub fn with_shutdown(&self) -> Self {
        Self {
            shutdown: true,
            graceful_shutdown_millis: NO_GRACEFUL_SHUTDOWN,
            ..self.clone()
        }
    }

    pub fn with_graceful_shutdown(&self, timeout: Duration) -> Self {
        let millis = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
        Self {
            shutdown: true,
            graceful_shutdown_millis: millis,
            ..self.clone()
        }
    }

    /// Group names of each concurrent-set, in rollout order.
    pub fn concurrent_group_names(&self) -> Vec<Vec<String>> {
        self.server_group_plans
            .iter()
            .map(|set| set.iter().map(|p| p.group_name().to_string()).collect())
            .collect()
    }
}

/// Serialized form; validated on the way back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SetRecord {
    id: SetId,
    actions: Vec<DeploymentAction>,
    server_group_plans: Vec<NonEmpty<ServerGroupPlan>>,
    #[serde(default)]
    metadata: BTreeMap<String, serde_json::Value>,
    rollback_single_server: bool,
    shutdown: bool,
    graceful_shutdown_millis: i64,
}

impl TryFrom<SetRecord> for DeploymentSetPlan {
    type Error = String;

    fn try_from(record: SetRecord) -> Result<Self, Self::Error> {
        if record.graceful_shutdown_millis < NO_GRACEFUL_SHUTDOWN {
            return Err(format!(
                "set {} has graceful shutdown {}ms, expected -1 or more",
                record.id, record.graceful_shutdown_millis
            ));
        }
        for concurrent in &record.server_group_plans {
            let mut seen = HashSet::new();
            if let Some(dup) = concurrent.iter().find(|p| !seen.insert(p.group_name())) {
                return Err(format!(
                    "set {} lists server group {} twice in one concurrent set",
                    record.id,
                    dup.group_name()
                ));
            }
        }

        Ok(Self {
            id: record.id,
            actions: record.actions,
            server_group_plans: record.server_group_plans,
            metadata: record.metadata,
            rollback_single_server: record.rollback_single_server,
            shutdown: record.shutdown,
            graceful_shutdown_millis: record.graceful_shutdown_millis,
        })
    }
}

impl From<DeploymentSetPlan> for SetRecord {
    fn from(set: DeploymentSetPlan) -> Self {
        Self {
            id: set.id,
            actions: set.actions,
            server_group_plans: set.server_group_plans,
            metadata: set.metadata,
            rollback_single_server: set.rollback_single_server,
            shutdown: set.shutdown,
            graceful_shutdown_millis: set.graceful_shutdown_millis,
        }
    }
}
