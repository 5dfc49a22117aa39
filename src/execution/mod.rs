// ABOUTME: Asynchronous plan execution with cooperative cancellation.
// ABOUTME: One dedicated thread per execution submits the request and decodes the response sequentially.

mod error;
mod handle;
mod manager;
mod transport;

pub use error::{ExecutionError, ExecutionErrorKind};
pub use handle::{ExecutionHandle, ExecutionState, PlanOutcome};
pub use manager::DeploymentManager;
pub use transport::{RecordedTransport, Transport, TransportError};
