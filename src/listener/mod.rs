// ABOUTME: Per-action listeners notified while the response stream is decoded.
// ABOUTME: Registrations are collected before execution and frozen when the plan is submitted.

mod logging;
mod registry;

use std::collections::BTreeMap;

use crate::plan::DeploymentAction;
use crate::protocol::RemoteError;
use crate::types::ServerIdentity;

pub use logging::TracingListener;
pub use registry::{ListenerRegistry, Listeners};

/// Callbacks for the progress of one deployment action.
///
/// Callbacks run on the decode thread, in stream order, as soon as the
/// corresponding section has been read. Implementations should return
/// quickly. Every method has an empty default so listeners only override
/// what they care about.
#[allow(unused_variables)]
pub trait DeploymentActionListener: Send + Sync {
    fn handle_cancelled_by_domain(&self, action: &DeploymentAction) {}

    fn handle_domain_rolled_back(&self, action: &DeploymentAction) {}

    fn handle_domain_failed(&self, action: &DeploymentAction, error: &RemoteError) {}

    fn handle_host_failed(
        &self,
        action: &DeploymentAction,
        host_failures: &BTreeMap<String, RemoteError>,
    ) {
    }

    /// The domain accepted the action and will apply it to `servers`.
    fn handle_servers_identified(&self, action: &DeploymentAction, servers: &[ServerIdentity]) {}

    fn handle_server_cancelled(&self, action: &DeploymentAction, server: &ServerIdentity) {}

    fn handle_server_rolled_back(&self, action: &DeploymentAction, server: &ServerIdentity) {}

    fn handle_server_timed_out(&self, action: &DeploymentAction, server: &ServerIdentity) {}

    fn handle_server_failed(
        &self,
        action: &DeploymentAction,
        server: &ServerIdentity,
        error: &RemoteError,
    ) {
    }

    fn handle_server_succeeded(
        &self,
        action: &DeploymentAction,
        server: &ServerIdentity,
        value: Option<&serde_json::Value>,
    ) {
    }

    fn handle_rollback_cancellation(&self, action: &DeploymentAction) {}

    fn handle_domain_rollback(&self, action: &DeploymentAction) {}

    fn handle_domain_rollback_failed(&self, action: &DeploymentAction, error: &RemoteError) {}

    fn handle_host_rollback_failed(
        &self,
        action: &DeploymentAction,
        host_failures: &BTreeMap<String, RemoteError>,
    ) {
    }

    fn handle_server_rollback(&self, action: &DeploymentAction, server: &ServerIdentity) {}

    fn handle_server_rollback_cancelled(&self, action: &DeploymentAction, server: &ServerIdentity) {}

    fn handle_server_rollback_timed_out(&self, action: &DeploymentAction, server: &ServerIdentity) {}

    fn handle_server_rollback_failed(
        &self,
        action: &DeploymentAction,
        server: &ServerIdentity,
        error: &RemoteError,
    ) {
    }
}
