// ABOUTME: Deployment plan data model and the type state builder that produces it.
// ABOUTME: Actions, server group policies and sets are immutable values shared freely across threads.

mod action;
mod builder;
mod deployment_plan;
mod error;
mod group;
mod sealed;
mod set;
pub mod state;

pub use action::{ActionKind, DeploymentAction};
pub use builder::PlanBuilder;
pub use deployment_plan::DeploymentPlan;
pub use error::PlanError;
pub use group::ServerGroupPlan;
pub use set::{DeploymentSetPlan, NO_GRACEFUL_SHUTDOWN};
pub use state::{ActionPhase, ActionsComplete, Added, GroupScoped, Initial, Replaced, ScopePhase, Undeployed};
