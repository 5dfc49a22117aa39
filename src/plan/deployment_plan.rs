// ABOUTME: The immutable deployment plan produced by the builder.
// ABOUTME: Its id correlates the whole wire exchange; attached content streams travel with it.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::content::AttachedContent;
use crate::types::{ActionId, PlanId, SetId};

use super::action::DeploymentAction;
use super::set::DeploymentSetPlan;

/// A complete, immutable deployment plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentPlan {
    id: PlanId,
    set_plans: NonEmpty<DeploymentSetPlan>,
    rollback_across_groups: bool,
    #[serde(skip)]
    content: Vec<Arc<AttachedContent>>,
}

impl DeploymentPlan {
    pub(crate) fn new(
        set_plans: NonEmpty<DeploymentSetPlan>,
        rollback_across_groups: bool,
        content: Vec<Arc<AttachedContent>>,
    ) -> Self {
        Self {
            id: PlanId::random(),
            set_plans,
            rollback_across_groups,
            content,
        }
    }

    pub fn id(&self) -> PlanId {
        self.id
    }

    /// The first deployment set.
    pub fn set_plan(&self) -> &DeploymentSetPlan {
        self.set_plans.first()
    }

    /// The last deployment set.
    pub fn current_set(&self) -> &DeploymentSetPlan {
        self.set_plans.last()
    }

    pub fn set_plans(&self) -> &NonEmpty<DeploymentSetPlan> {
        &self.set_plans
    }

    pub fn find_set(&self, id: &SetId) -> Option<&DeploymentSetPlan> {
        self.set_plans.iter().find(|set| set.id() == *id)
    }

    /// Find an action and the set that owns it.
    pub fn find_action(&self, id: &ActionId) -> Option<(&DeploymentSetPlan, &DeploymentAction)> {
        self.set_plans
            .iter()
            .find_map(|set| set.action(id).map(|action| (set, action)))
    }

    pub fn actions(&self) -> impl Iterator<Item = &DeploymentAction> {
        self.set_plans.iter().flat_map(|set| set.actions().iter())
    }

    pub fn is_rollback_across_groups(&self) -> bool {
        self.rollback_across_groups
    }

    /// Content streams still attached to this plan's actions.
    pub fn attached_content(&self) -> &[Arc<AttachedContent>] {
        &self.content
    }
}
