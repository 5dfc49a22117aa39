// ABOUTME: Queryable result tree for one executed deployment plan.
// ABOUTME: Built by the decoder and only handed out once the whole response has been decoded.

mod outcome;
mod tree;

pub use outcome::{DomainOutcome, DomainRollbackOutcome, ServerOutcome, ServerRollbackOutcome};
pub use tree::{ActionResult, DeploymentPlanResult, DeploymentSetResult, GroupActionResult, ServerResult};

pub(crate) use tree::ResultTreeBuilder;
