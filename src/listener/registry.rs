// ABOUTME: Registry mapping action ids to listeners.
// ABOUTME: Mutable only before execution; execute() freezes it into a shared read-only map.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::execution::ExecutionError;
use crate::plan::DeploymentPlan;
use crate::types::{ActionId, PlanId};

use super::DeploymentActionListener;

type ListenerList = Vec<Arc<dyn DeploymentActionListener>>;

/// Listener registrations for one plan, collected before execution.
pub struct ListenerRegistry {
    plan_id: PlanId,
    known_actions: HashSet<ActionId>,
    listeners: HashMap<ActionId, ListenerList>,
}

impl ListenerRegistry {
    pub fn new(plan: &DeploymentPlan) -> Self {
        Self {
            plan_id: plan.id(),
            known_actions: plan.actions().map(|a| a.id()).collect(),
            listeners: HashMap::new(),
        }
    }

    pub fn plan_id(&self) -> PlanId {
        self.plan_id
    }

    /// Register `listener` for one action of the plan.
    ///
    /// # Errors
    ///
    /// `UnknownListenerTarget` if the action is not part of the plan.
    pub fn register(
        &mut self,
        action_id: ActionId,
        listener: Arc<dyn DeploymentActionListener>,
    ) -> Result<&mut Self, ExecutionError> {
        if !self.known_actions.contains(&action_id) {
            return Err(ExecutionError::UnknownListenerTarget { action_id });
        }
        self.listeners.entry(action_id).or_default().push(listener);
        Ok(self)
    }

    /// Register `listener` for every action of the plan.
    pub fn register_all(&mut self, listener: Arc<dyn DeploymentActionListener>) -> &mut Self {
        for action_id in &self.known_actions {
            self.listeners
                .entry(*action_id)
                .or_default()
                .push(Arc::clone(&listener));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Freeze the registrations. No listener can be added afterwards.
    pub fn freeze(self) -> Listeners {
        Listeners {
            by_action: Arc::new(self.listeners),
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("plan_id", &self.plan_id)
            .field("registered_actions", &self.listeners.len())
            .finish()
    }
}

/// Frozen, read-only listener map shared with the decode thread.
#[derive(Clone, Default)]
pub struct Listeners {
    by_action: Arc<HashMap<ActionId, ListenerList>>,
}

impl Listeners {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_action(&self, action_id: &ActionId) -> &[Arc<dyn DeploymentActionListener>] {
        self.by_action
            .get(action_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Call `f` for every listener registered for `action_id`, in registration order.
    pub(crate) fn notify(
        &self,
        action_id: &ActionId,
        mut f: impl FnMut(&dyn DeploymentActionListener),
    ) {
        for listener in self.for_action(action_id) {
            f(listener.as_ref());
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("registered_actions", &self.by_action.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::DigestDistributor;
    use crate::plan::PlanBuilder;

    struct Quiet;
    impl DeploymentActionListener for Quiet {}

    fn plan() -> DeploymentPlan {
        PlanBuilder::new(Arc::new(DigestDistributor))
            .deploy("a.war")
            .unwrap()
            .redeploy("b.war")
            .unwrap()
            .to_server_group("g")
            .unwrap()
            .build()
    }

    #[test]
    fn unknown_action_is_rejected() {
        let plan = plan();
        let mut registry = ListenerRegistry::new(&plan);
        let err = registry
            .register(ActionId::random(), Arc::new(Quiet))
            .unwrap_err();
        assert!(matches!(err, ExecutionError::UnknownListenerTarget { .. }));
    }

    #[test]
    fn frozen_map_returns_registered_listeners() {
        let plan = plan();
        let first = plan.set_plan().actions()[0].id();
        let second = plan.set_plan().actions()[1].id();

        let mut registry = ListenerRegistry::new(&plan);
        registry.register(first, Arc::new(Quiet)).unwrap();
        registry.register_all(Arc::new(Quiet));
        let frozen = registry.freeze();

        assert_eq!(frozen.for_action(&first).len(), 2);
        assert_eq!(frozen.for_action(&second).len(), 1);
        assert!(frozen.for_action(&ActionId::random()).is_empty());
    }
}
