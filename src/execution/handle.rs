// ABOUTME: Cancellable, awaitable handle for one plan execution.
// ABOUTME: Completion and cancellation race on a compare-and-set; the first terminal transition wins.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::content::AttachedContent;
use crate::result::DeploymentPlanResult;
use crate::types::PlanId;

use super::error::ExecutionError;
use super::transport::Transport;

const RUNNING: u8 = 0;
const DONE: u8 = 1;
const CANCELLED: u8 = 2;

/// Lifecycle state of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Running,
    Done,
    Cancelled,
}

impl ExecutionState {
    fn from_u8(value: u8) -> Self {
        match value {
            DONE => ExecutionState::Done,
            CANCELLED => ExecutionState::Cancelled,
            _ => ExecutionState::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != ExecutionState::Running
    }
}

/// Terminal outcome of a plan execution.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// The whole response was decoded.
    Completed(DeploymentPlanResult),
    /// The execution was cancelled before it completed.
    Cancelled,
}

impl PlanOutcome {
    pub fn result(&self) -> Option<&DeploymentPlanResult> {
        match self {
            PlanOutcome::Completed(result) => Some(result),
            PlanOutcome::Cancelled => None,
        }
    }

    pub fn into_result(self) -> Option<DeploymentPlanResult> {
        match self {
            PlanOutcome::Completed(result) => Some(result),
            PlanOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PlanOutcome::Cancelled)
    }
}

type Outcome = Result<PlanOutcome, ExecutionError>;

struct Shared {
    plan_id: PlanId,
    state: AtomicU8,
    outcome: Mutex<Option<Outcome>>,
    ready: Condvar,
    notify: watch::Sender<bool>,
    content: Vec<Arc<AttachedContent>>,
    transport: Arc<dyn Transport>,
}

/// Handle to a running plan execution. Clones share the same execution.
#[derive(Clone)]
pub struct ExecutionHandle {
    shared: Arc<Shared>,
}

impl ExecutionHandle {
    pub(crate) fn new(
        plan_id: PlanId,
        content: Vec<Arc<AttachedContent>>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let (notify, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                plan_id,
                state: AtomicU8::new(RUNNING),
                outcome: Mutex::new(None),
                ready: Condvar::new(),
                notify,
                content,
                transport,
            }),
        }
    }

    pub fn plan_id(&self) -> PlanId {
        self.shared.plan_id
    }

    pub fn state(&self) -> ExecutionState {
        ExecutionState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == ExecutionState::Cancelled
    }

    /// Cancel the execution.
    ///
    /// Returns `true` if this call moved the handle to `Cancelled`. The
    /// transport is asked to cancel the exchange, but the handle becomes
    /// terminal whether or not the transport manages to.
    pub fn cancel(&self) -> bool {
        if !self.transition(CANCELLED) {
            return false;
        }
        let plan_id = self.shared.plan_id;
        if self.shared.transport.cancel(plan_id) {
            tracing::debug!(plan = %plan_id, "transport cancelled plan execution");
        } else {
            tracing::debug!(plan = %plan_id, "transport could not cancel plan; abandoning response");
        }
        self.publish(Ok(PlanOutcome::Cancelled));
        true
    }

    /// Record the decode outcome. Returns `false` if the handle was already terminal.
    pub(crate) fn complete(&self, outcome: Result<DeploymentPlanResult, ExecutionError>) -> bool {
        if !self.transition(DONE) {
            tracing::warn!(
                plan = %self.shared.plan_id,
                success = outcome.is_ok(),
                "discarding completion of an execution that was already cancelled"
            );
            return false;
        }
        self.publish(outcome.map(PlanOutcome::Completed));
        true
    }

    /// The outcome, if the execution is terminal.
    pub fn try_outcome(&self) -> Option<Outcome> {
        self.shared.outcome.lock().clone()
    }

    /// Block until the execution is terminal.
    pub fn wait(&self) -> Outcome {
        let mut outcome = self.shared.outcome.lock();
        loop {
            if let Some(outcome) = outcome.as_ref() {
                return outcome.clone();
            }
            self.shared.ready.wait(&mut outcome);
        }
    }

    /// Block until the execution is terminal or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// `Timeout` if the deadline passes first. The execution keeps running.
    /// A timeout too large to represent as a deadline waits without one.
    pub fn wait_timeout(&self, timeout: Duration) -> Outcome {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait();
        };
        let mut outcome = self.shared.outcome.lock();
        loop {
            if let Some(outcome) = outcome.as_ref() {
                return outcome.clone();
            }
            if self
                .shared
                .ready
                .wait_until(&mut outcome, deadline)
                .timed_out()
            {
                return match outcome.as_ref() {
                    Some(outcome) => outcome.clone(),
                    None => Err(ExecutionError::Timeout {
                        plan_id: self.shared.plan_id,
                        waited: timeout,
                    }),
                };
            }
        }
    }

    /// Wait for the execution without blocking the async runtime.
    pub async fn completion(&self) -> Outcome {
        let mut terminal = self.shared.notify.subscribe();
        loop {
            if let Some(outcome) = self.try_outcome() {
                return outcome;
            }
            if terminal.changed().await.is_err() {
                return self.wait();
            }
        }
    }

    fn transition(&self, to: u8) -> bool {
        self.shared
            .state
            .compare_exchange(RUNNING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Close attached content, then wake every waiter.
    fn publish(&self, outcome: Outcome) {
        let closed = self
            .shared
            .content
            .iter()
            .filter(|content| content.close())
            .count();
        tracing::debug!(
            plan = %self.shared.plan_id,
            state = ?self.state(),
            closed_streams = closed,
            "execution reached terminal state"
        );

        *self.shared.outcome.lock() = Some(outcome);
        self.shared.ready.notify_all();
        self.shared.notify.send_replace(true);
    }
}

impl fmt::Debug for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionHandle")
            .field("plan_id", &self.shared.plan_id)
            .field("state", &self.state())
            .finish()
    }
}
