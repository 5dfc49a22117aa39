// ABOUTME: Type state builder that composes a DeploymentPlan directive by directive.
// ABOUTME: Each directive consumes the builder and returns the next phase; misuse is a compile or InvalidPlanState error.

use nonempty::NonEmpty;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::content::{AttachedContent, ContentDistributor, ContentHash};
use crate::types::UnitName;

use super::action::DeploymentAction;
use super::deployment_plan::DeploymentPlan;
use super::error::PlanError;
use super::group::ServerGroupPlan;
use super::set::DeploymentSetPlan;
use super::state::{
    ActionPhase, ActionsComplete, Added, GroupScoped, Initial, Replaced, ScopePhase, Undeployed,
};

/// Builder for a [`DeploymentPlan`].
///
/// The phase parameter restricts which directives are available. Every
/// directive consumes the builder, so the builder is cheap to clone when a
/// caller wants to branch two plans from a common prefix.
///
/// ```
/// use std::io::Cursor;
/// use std::sync::Arc;
/// use rollplan::content::DigestDistributor;
/// use rollplan::plan::PlanBuilder;
///
/// # fn main() -> Result<(), rollplan::plan::PlanError> {
/// let plan = PlanBuilder::new(Arc::new(DigestDistributor))
///     .add("app", "app.war", Cursor::new(b"bytes".to_vec()))?
///     .and_deploy()?
///     .to_server_group("main-group")?
///     .with_rollback()?
///     .build();
/// assert_eq!(plan.set_plan().actions().len(), 2);
/// # Ok(())
/// # }
/// ```
///
/// Set-level directives are only available before the first action:
///
/// ```compile_fail
/// use std::sync::Arc;
/// use std::time::Duration;
/// use rollplan::content::DigestDistributor;
/// use rollplan::plan::PlanBuilder;
///
/// # fn main() -> Result<(), rollplan::plan::PlanError> {
/// let builder = PlanBuilder::new(Arc::new(DigestDistributor))
///     .deploy("app.war")?
///     .with_graceful_shutdown(Duration::from_secs(10));
/// # Ok(())
/// # }
/// ```
///
/// A plan cannot be built before it has been scoped to a server group:
///
/// ```compile_fail
/// use std::sync::Arc;
/// use rollplan::content::DigestDistributor;
/// use rollplan::plan::PlanBuilder;
///
/// # fn main() -> Result<(), rollplan::plan::PlanError> {
/// let plan = PlanBuilder::new(Arc::new(DigestDistributor))
///     .deploy("app.war")?
///     .build();
/// # Ok(())
/// # }
/// ```
///
/// Rollout policy directives need a scoped group:
///
/// ```compile_fail
/// use std::sync::Arc;
/// use rollplan::content::DigestDistributor;
/// use rollplan::plan::PlanBuilder;
///
/// # fn main() -> Result<(), rollplan::plan::PlanError> {
/// let builder = PlanBuilder::new(Arc::new(DigestDistributor))
///     .deploy("app.war")?
///     .with_rollback();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PlanBuilder<P> {
    distributor: Arc<dyn ContentDistributor>,
    completed_sets: Vec<DeploymentSetPlan>,
    current: DeploymentSetPlan,
    rollback_across_groups: bool,
    content: Vec<Arc<AttachedContent>>,
    phase: P,
}

impl<P: fmt::Debug> fmt::Debug for PlanBuilder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanBuilder")
            .field("phase", &self.phase)
            .field("completed_sets", &self.completed_sets.len())
            .field("current", &self.current)
            .field("rollback_across_groups", &self.rollback_across_groups)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Internal Helpers
// =============================================================================

impl<P> PlanBuilder<P> {
    fn transition<N>(self, phase: N) -> PlanBuilder<N> {
        PlanBuilder {
            distributor: self.distributor,
            completed_sets: self.completed_sets,
            current: self.current,
            rollback_across_groups: self.rollback_across_groups,
            content: self.content,
            phase,
        }
    }

    fn with_current(self, current: DeploymentSetPlan) -> Self {
        Self { current, ..self }
    }

    /// Reject action directives once the current set has been scoped to a group.
    fn ensure_unscoped(&self, directive: &'static str) -> Result<(), PlanError> {
        if self.current.has_server_group_plans() {
            return Err(PlanError::invalid_state(
                directive,
                "actions must be added before the set is scoped to a server group",
            ));
        }
        Ok(())
    }

    fn push_action<N>(self, action: DeploymentAction, phase: N) -> PlanBuilder<N> {
        tracing::debug!(action = %action, id = %action.id(), "added deployment action");
        let current = self.current.with_action(action);
        self.with_current(current).transition(phase)
    }

    /// The deployment set currently being composed.
    pub fn current_set(&self) -> &DeploymentSetPlan {
        &self.current
    }

    /// Deployment sets already closed by `new_deployment_set()`.
    pub fn completed_sets(&self) -> &[DeploymentSetPlan] {
        &self.completed_sets
    }

    pub fn is_rollback_across_groups(&self) -> bool {
        self.rollback_across_groups
    }
}

fn distribute(
    distributor: &dyn ContentDistributor,
    unit: &UnitName,
    runtime_name: &str,
    stream: &mut (dyn Read + Send),
    replacement: bool,
) -> Result<ContentHash, PlanError> {
    let result = if replacement {
        distributor.distribute_replacement(unit.as_str(), runtime_name, stream)
    } else {
        distributor.distribute(unit.as_str(), runtime_name, stream)
    };
    result.map_err(|source| PlanError::ContentDistribution {
        unit: unit.to_string(),
        source,
    })
}

// =============================================================================
// Initial: plan- and set-level directives
// =============================================================================

impl PlanBuilder<Initial> {
    /// Start a plan whose content is stored through `distributor`.
    pub fn new(distributor: Arc<dyn ContentDistributor>) -> Self {
        Self {
            distributor,
            completed_sets: Vec::new(),
            current: DeploymentSetPlan::new(),
            rollback_across_groups: false,
            content: Vec::new(),
            phase: Initial,
        }
    }

    /// Roll every server group back if any group fails.
    pub fn with_rollback_across_groups(self) -> Self {
        Self {
            rollback_across_groups: true,
            ..self
        }
    }

    /// Shut servers down before applying the set, without a graceful timeout.
    pub fn with_shutdown(self) -> Self {
        let current = self.current.with_shutdown();
        self.with_current(current)
    }

    /// Shut servers down gracefully, waiting up to `timeout` for in-flight work.
    pub fn with_graceful_shutdown(self, timeout: Duration) -> Self {
        let current = self.current.with_graceful_shutdown(timeout);
        self.with_current(current)
    }

    /// Do not roll back a server group that has only a single server.
    pub fn without_single_server_rollback(self) -> Self {
        let current = self.current.without_single_server_rollback();
        self.with_current(current)
    }

    pub fn with_metadata(self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let current = self.current.with_metadata(key, value);
        self.with_current(current)
    }
}

// =============================================================================
// Action directives
// =============================================================================

impl<P: ActionPhase> PlanBuilder<P> {
    /// Add content to the repository under `name`.
    ///
    /// The stream is handed to the content distributor immediately and then
    /// kept open until the execution of the built plan finishes.
    ///
    /// # Errors
    ///
    /// `InvalidPlanState` once the set has been scoped to a server group, or
    /// `ContentDistribution` when the distributor rejects the content.
    pub fn add(
        self,
        name: &str,
        runtime_name: &str,
        content: impl Read + Send + 'static,
    ) -> Result<PlanBuilder<Added>, PlanError> {
        self.attach_content("add", name, runtime_name, Box::new(content), false)
            .map(|(builder, unit)| builder.transition(Added { unit }))
    }

    /// Add the content of a file, named after the file itself.
    pub fn add_file(self, path: impl AsRef<Path>) -> Result<PlanBuilder<Added>, PlanError> {
        self.ensure_unscoped("add")?;
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let unit = UnitName::new(&name)?;
        let file = File::open(path).map_err(|e| PlanError::ContentDistribution {
            unit: unit.to_string(),
            source: e.into(),
        })?;
        self.add(unit.as_str(), unit.as_str(), file)
    }

    pub fn deploy(self, name: &str) -> Result<PlanBuilder<ActionsComplete>, PlanError> {
        self.ensure_unscoped("deploy")?;
        let action = DeploymentAction::deploy(UnitName::new(name)?);
        Ok(self.push_action(action, ActionsComplete))
    }

    /// Deploy using a named server-side deployment policy.
    pub fn deploy_with_policy(
        self,
        name: &str,
        policy: &str,
    ) -> Result<PlanBuilder<ActionsComplete>, PlanError> {
        self.ensure_unscoped("deploy")?;
        let action = DeploymentAction::deploy_with_policy(UnitName::new(name)?, policy);
        Ok(self.push_action(action, ActionsComplete))
    }

    pub fn redeploy(self, name: &str) -> Result<PlanBuilder<ActionsComplete>, PlanError> {
        self.ensure_unscoped("redeploy")?;
        let action = DeploymentAction::redeploy(UnitName::new(name)?);
        Ok(self.push_action(action, ActionsComplete))
    }

    pub fn undeploy(self, name: &str) -> Result<PlanBuilder<Undeployed>, PlanError> {
        self.ensure_unscoped("undeploy")?;
        let unit = UnitName::new(name)?;
        let action = DeploymentAction::undeploy(unit.clone());
        Ok(self.push_action(action, Undeployed { unit }))
    }

    pub fn remove(self, name: &str) -> Result<PlanBuilder<ActionsComplete>, PlanError> {
        self.ensure_unscoped("remove")?;
        let action = DeploymentAction::remove(UnitName::new(name)?);
        Ok(self.push_action(action, ActionsComplete))
    }

    /// Deploy `name` in place of the currently deployed `to_replace`.
    pub fn replace(
        self,
        name: &str,
        to_replace: &str,
    ) -> Result<PlanBuilder<Replaced>, PlanError> {
        self.ensure_unscoped("replace")?;
        let unit = UnitName::new(name)?;
        let replaced = UnitName::new(to_replace)?;
        let action = DeploymentAction::replace(unit, replaced.clone());
        Ok(self.push_action(action, Replaced { replaced }))
    }

    /// Replace the content of `name` with new content under the same name.
    pub fn full_replace(
        self,
        name: &str,
        runtime_name: &str,
        content: impl Read + Send + 'static,
    ) -> Result<PlanBuilder<ActionsComplete>, PlanError> {
        self.attach_content("full_replace", name, runtime_name, Box::new(content), true)
            .map(|(builder, _)| builder.transition(ActionsComplete))
    }

    /// Mark the action list as complete without adding another action.
    pub fn actions_complete(self) -> Result<PlanBuilder<ActionsComplete>, PlanError> {
        if self.current.actions().is_empty() {
            return Err(PlanError::invalid_state(
                "actions_complete",
                "the current set has no actions",
            ));
        }
        Ok(self.transition(ActionsComplete))
    }

    fn attach_content(
        self,
        directive: &'static str,
        name: &str,
        runtime_name: &str,
        mut stream: Box<dyn Read + Send>,
        replacement: bool,
    ) -> Result<(PlanBuilder<()>, UnitName), PlanError> {
        self.ensure_unscoped(directive)?;
        let unit = UnitName::new(name)?;
        let hash = distribute(
            self.distributor.as_ref(),
            &unit,
            runtime_name,
            stream.as_mut(),
            replacement,
        )?;

        let action = if replacement {
            DeploymentAction::full_replace(unit.clone(), runtime_name.to_string(), hash)
        } else {
            DeploymentAction::add(unit.clone(), runtime_name.to_string(), hash)
        };
        let attached = Arc::new(AttachedContent::new(action.id(), stream));

        let mut builder = self.push_action(action, ());
        builder.content.push(attached);
        Ok((builder, unit))
    }
}

// =============================================================================
// Follow-up directives
// =============================================================================

impl PlanBuilder<Added> {
    /// Deploy the content that was just added.
    pub fn and_deploy(self) -> Result<PlanBuilder<ActionsComplete>, PlanError> {
        let unit = self.phase.unit.clone();
        self.deploy(unit.as_str())
    }

    /// Deploy the content that was just added in place of `to_replace`.
    pub fn and_replace(self, to_replace: &str) -> Result<PlanBuilder<Replaced>, PlanError> {
        let unit = self.phase.unit.clone();
        self.replace(unit.as_str(), to_replace)
    }

    /// The unit that was just added.
    pub fn added_unit(&self) -> &UnitName {
        &self.phase.unit
    }
}

impl PlanBuilder<Undeployed> {
    /// Remove the content of the unit that was just undeployed.
    pub fn and_remove_undeployed(self) -> Result<PlanBuilder<ActionsComplete>, PlanError> {
        let unit = self.phase.unit.clone();
        self.remove(unit.as_str())
    }
}

impl PlanBuilder<Replaced> {
    /// Remove the content of the unit that was just replaced.
    pub fn and_remove_undeployed(self) -> Result<PlanBuilder<ActionsComplete>, PlanError> {
        let replaced = self.phase.replaced.clone();
        self.remove(replaced.as_str())
    }
}

// =============================================================================
// Server group scoping
// =============================================================================

fn group_plan(directive: &'static str, name: &str) -> Result<ServerGroupPlan, PlanError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlanError::invalid_state(
            directive,
            "server group name cannot be empty",
        ));
    }
    Ok(ServerGroupPlan::new(name))
}

impl<P: ScopePhase> PlanBuilder<P> {
    /// Apply the current set to `name`, concurrently with the other groups of
    /// the current concurrent-set.
    ///
    /// Scoping the same group twice replaces the earlier entry and moves the
    /// group to the end of the concurrent-set.
    pub fn to_server_group(self, name: &str) -> Result<PlanBuilder<GroupScoped>, PlanError> {
        let plan = group_plan("to_server_group", name)?;
        tracing::debug!(group = plan.group_name(), set = %self.current.id(), "scoped set to server group");
        let current = self.current.with_server_group(plan);
        Ok(self.with_current(current).transition(GroupScoped))
    }
}

// =============================================================================
// GroupScoped: rollout policy and completion
// =============================================================================

impl PlanBuilder<GroupScoped> {
    fn update_last_group(
        self,
        directive: &'static str,
        f: impl FnOnce(ServerGroupPlan) -> ServerGroupPlan,
    ) -> Result<Self, PlanError> {
        match self.current.with_last_server_group(f) {
            Some(current) => Ok(self.with_current(current)),
            None => Err(PlanError::invalid_state(
                directive,
                "no server group has been scoped",
            )),
        }
    }

    /// Update the servers of the most recent group one at a time.
    pub fn rolling_to_servers(self) -> Result<Self, PlanError> {
        self.update_last_group("rolling_to_servers", ServerGroupPlan::rolling)
    }

    /// Roll the most recent group back if its update fails.
    pub fn with_rollback(self) -> Result<Self, PlanError> {
        self.update_last_group("with_rollback", ServerGroupPlan::with_rollback)
    }

    /// Tolerate up to `max_failures` failed servers in the most recent group.
    pub fn allow_failures(self, max_failures: u32) -> Result<Self, PlanError> {
        self.update_last_group("allow_failures", |plan| {
            plan.with_max_failures(max_failures)
        })
    }

    /// Tolerate up to `percentage` percent failed servers in the most recent group.
    ///
    /// # Errors
    ///
    /// `InvalidPlanState` unless `percentage` is within `1..=100`.
    pub fn allow_failure_percentage(self, percentage: u8) -> Result<Self, PlanError> {
        if !(1..=100).contains(&percentage) {
            return Err(PlanError::invalid_state(
                "allow_failure_percentage",
                format!("percentage must be between 1 and 100, got {percentage}"),
            ));
        }
        self.update_last_group("allow_failure_percentage", |plan| {
            plan.with_max_failure_percentage(percentage)
        })
    }

    /// Close the current concurrent-set and start a new one with `name`.
    pub fn rolling_to_next_group(self, name: &str) -> Result<Self, PlanError> {
        let plan = group_plan("rolling_to_next_group", name)?;
        tracing::debug!(group = plan.group_name(), set = %self.current.id(), "started next concurrent group set");
        let current = self.current.with_next_server_group(plan);
        Ok(self.with_current(current))
    }

    /// Close the current deployment set and start composing another one.
    pub fn new_deployment_set(self) -> PlanBuilder<Initial> {
        let mut builder = self.transition(Initial);
        let finished = std::mem::take(&mut builder.current);
        builder.completed_sets.push(finished);
        builder
    }

    /// Produce the immutable plan.
    pub fn build(self) -> DeploymentPlan {
        let sets = match NonEmpty::from_vec(self.completed_sets) {
            Some(mut sets) => {
                sets.push(self.current);
                sets
            }
            None => NonEmpty::new(self.current),
        };
        let plan = DeploymentPlan::new(sets, self.rollback_across_groups, self.content);
        tracing::debug!(
            plan = %plan.id(),
            sets = plan.set_plans().len(),
            actions = plan.actions().count(),
            "built deployment plan"
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{DigestDistributor, DistributionError};
    use crate::plan::ActionKind;
    use std::io::Cursor;

    fn builder() -> PlanBuilder<Initial> {
        PlanBuilder::new(Arc::new(DigestDistributor))
    }

    fn content(bytes: &[u8]) -> Cursor<Vec<u8>> {
        Cursor::new(bytes.to_vec())
    }

    struct RejectingDistributor;

    impl ContentDistributor for RejectingDistributor {
        fn distribute(
            &self,
            _name: &str,
            _runtime_name: &str,
            _content: &mut dyn Read,
        ) -> Result<ContentHash, DistributionError> {
            Err(DistributionError::Rejected("repository full".into()))
        }

        fn distribute_replacement(
            &self,
            name: &str,
            runtime_name: &str,
            content: &mut dyn Read,
        ) -> Result<ContentHash, DistributionError> {
            self.distribute(name, runtime_name, content)
        }
    }

    #[test]
    fn add_and_deploy_targets_the_added_unit() {
        let plan = builder()
            .add("app", "app.war", content(b"war"))
            .unwrap()
            .and_deploy()
            .unwrap()
            .to_server_group("main-group")
            .unwrap()
            .build();

        let actions = plan.set_plan().actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind(), ActionKind::Add);
        assert_eq!(actions[0].content_file_name(), Some("app.war"));
        assert_eq!(actions[1].kind(), ActionKind::Deploy);
        assert_eq!(actions[1].unit_name().as_str(), "app");
        assert_eq!(plan.attached_content().len(), 1);
        assert_eq!(plan.attached_content()[0].action_id(), actions[0].id());
    }

    #[test]
    fn content_action_after_scoping_is_rejected() {
        let scoped = builder()
            .deploy("a.war")
            .unwrap()
            .to_server_group("g")
            .unwrap();

        let err = scoped
            .clone()
            .add("b", "b.war", content(b"b"))
            .unwrap_err();
        assert_eq!(err.directive(), Some("add"));

        let err = scoped.undeploy("a.war").unwrap_err();
        assert_eq!(err.directive(), Some("undeploy"));
    }

    #[test]
    fn distributor_failure_surfaces_as_content_distribution() {
        let err = PlanBuilder::new(Arc::new(RejectingDistributor))
            .add("app", "app.war", content(b"war"))
            .unwrap_err();
        assert!(matches!(err, PlanError::ContentDistribution { ref unit, .. } if unit == "app"));
    }

    #[test]
    fn failure_percentage_must_be_in_range() {
        let scoped = builder()
            .deploy("a.war")
            .unwrap()
            .to_server_group("g")
            .unwrap();
        assert!(scoped.clone().allow_failure_percentage(0).unwrap_err().is_invalid_state());
        assert!(scoped.clone().allow_failure_percentage(101).is_err());
        let plan = scoped.allow_failure_percentage(100).unwrap().build();
        assert_eq!(
            plan.set_plan().server_group_plan("g").unwrap().max_failure_percentage(),
            100
        );
    }

    #[test]
    fn blank_group_name_is_rejected() {
        let err = builder()
            .deploy("a.war")
            .unwrap()
            .to_server_group("  ")
            .unwrap_err();
        assert_eq!(err.directive(), Some("to_server_group"));
    }

    #[test]
    fn actions_complete_requires_an_action() {
        assert!(builder().actions_complete().is_err());
        assert!(builder().deploy("a").unwrap().actions_complete().is_ok());
    }

    #[test]
    fn new_deployment_set_keeps_previous_set() {
        let plan = builder()
            .deploy("a.war")
            .unwrap()
            .to_server_group("g1")
            .unwrap()
            .new_deployment_set()
            .with_graceful_shutdown(Duration::from_secs(3))
            .undeploy("b.war")
            .unwrap()
            .to_server_group("g2")
            .unwrap()
            .build();

        assert_eq!(plan.set_plans().len(), 2);
        assert_ne!(plan.set_plans()[0].id(), plan.set_plans()[1].id());
        assert!(!plan.set_plans()[0].is_graceful_shutdown());
        assert!(plan.set_plans()[1].is_graceful_shutdown());
        assert_eq!(plan.set_plan().id(), plan.set_plans()[0].id());
    }
}
