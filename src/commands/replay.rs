// ABOUTME: Replay command implementation.
// ABOUTME: Decodes a captured controller response against a saved plan and prints the result tree.

use rollplan::content::DigestDistributor;
use rollplan::error::{Error, Result};
use rollplan::execution::{DeploymentManager, PlanOutcome, RecordedTransport};
use rollplan::listener::{ListenerRegistry, TracingListener};
use rollplan::output::Output;
use rollplan::plan::DeploymentPlan;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn replay(
    plan_path: &Path,
    response_path: &Path,
    timeout: Duration,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let plan: DeploymentPlan = serde_json::from_str(&std::fs::read_to_string(plan_path)?)?;
    let transport = RecordedTransport::from_file(response_path)?;
    let manager = DeploymentManager::new(Arc::new(transport), Arc::new(DigestDistributor));

    let mut registry = ListenerRegistry::new(&plan);
    registry.register_all(Arc::new(TracingListener));

    output.progress(&format!("Replaying response for plan {}", plan.id()));
    let handle = manager.execute_with(&plan, registry)?;

    let outcome = match tokio::time::timeout(timeout, handle.completion()).await {
        Ok(outcome) => outcome?,
        Err(_) => {
            handle.cancel();
            return Err(Error::AwaitTimeout(timeout));
        }
    };

    let result = match outcome {
        PlanOutcome::Completed(result) => result,
        PlanOutcome::Cancelled => return Err(Error::Cancelled(plan.id())),
    };

    output.plan_result(&result);

    if let Some(reason) = result.invalid_reason() {
        return Err(Error::PlanRejected {
            plan_id: plan.id(),
            reason: reason.to_string(),
        });
    }
    if !result.is_success() {
        return Err(Error::DeploymentFailed(plan.id()));
    }

    output.success(&format!("Plan {} completed", plan.id()));
    Ok(())
}
