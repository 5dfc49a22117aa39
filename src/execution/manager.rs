// ABOUTME: Entry point that builds plans and submits them for execution.
// ABOUTME: Each execution runs submit-then-decode on its own thread and reports through an ExecutionHandle.

use snafu::ResultExt;
use std::fmt;
use std::sync::Arc;

use crate::content::ContentDistributor;
use crate::listener::{ListenerRegistry, Listeners};
use crate::plan::{DeploymentPlan, Initial, PlanBuilder};
use crate::protocol::{decode_response, encode_execute_request};

use super::error::{ExecutionError, ProtocolSnafu, RequestEncodingSnafu, TransportSnafu};
use super::handle::ExecutionHandle;
use super::transport::Transport;

/// Composes plans against one content repository and executes them over one transport.
#[derive(Clone)]
pub struct DeploymentManager {
    transport: Arc<dyn Transport>,
    distributor: Arc<dyn ContentDistributor>,
}

impl DeploymentManager {
    pub fn new(transport: Arc<dyn Transport>, distributor: Arc<dyn ContentDistributor>) -> Self {
        Self {
            transport,
            distributor,
        }
    }

    /// Start composing a new plan whose content goes through this manager's distributor.
    pub fn new_plan(&self) -> PlanBuilder<Initial> {
        PlanBuilder::new(Arc::clone(&self.distributor))
    }

    /// Execute `plan` without listeners.
    pub fn execute(&self, plan: &DeploymentPlan) -> Result<ExecutionHandle, ExecutionError> {
        self.start(plan, Listeners::empty())
    }

    /// Execute `plan`, notifying the listeners in `registry` while the response is decoded.
    ///
    /// # Errors
    ///
    /// `ListenerPlanMismatch` if `registry` was created for a different plan,
    /// `RequestEncoding` if the plan cannot be encoded.
    pub fn execute_with(
        &self,
        plan: &DeploymentPlan,
        registry: ListenerRegistry,
    ) -> Result<ExecutionHandle, ExecutionError> {
        if registry.plan_id() != plan.id() {
            return Err(ExecutionError::ListenerPlanMismatch {
                plan_id: plan.id(),
                registered: registry.plan_id(),
            });
        }
        self.start(plan, registry.freeze())
    }

    fn start(
        &self,
        plan: &DeploymentPlan,
        listeners: Listeners,
    ) -> Result<ExecutionHandle, ExecutionError> {
        let plan_id = plan.id();
        let request = encode_execute_request(plan).context(RequestEncodingSnafu)?;
        let handle = ExecutionHandle::new(
            plan_id,
            plan.attached_content().to_vec(),
            Arc::clone(&self.transport),
        );

        let worker = handle.clone();
        let transport = Arc::clone(&self.transport);
        let plan = plan.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("rollplan-{plan_id}"))
            .spawn(move || {
                if worker.is_done() {
                    tracing::debug!(plan = %plan_id, "execution cancelled before submission");
                    return;
                }
                let outcome = transport
                    .submit(plan_id, request)
                    .context(TransportSnafu)
                    .and_then(|response| {
                        decode_response(&plan, &listeners, response)
                            .context(ProtocolSnafu { plan_id })
                    });
                worker.complete(outcome);
            });
        if let Err(e) = spawned {
            let error = ExecutionError::Spawn {
                message: e.to_string(),
            };
            handle.complete(Err(error.clone()));
            return Err(error);
        }

        tracing::debug!(plan = %plan_id, "submitted deployment plan");
        Ok(handle)
    }
}

impl fmt::Debug for DeploymentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentManager").finish_non_exhaustive()
    }
}
