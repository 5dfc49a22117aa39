// ABOUTME: Listener that reports every callback through tracing.
// ABOUTME: Failures log at warn, successes at info, cancellations and timeouts at warn.

use std::collections::BTreeMap;

use crate::plan::DeploymentAction;
use crate::protocol::RemoteError;
use crate::types::ServerIdentity;

use super::DeploymentActionListener;

/// Logs each deployment event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl DeploymentActionListener for TracingListener {
    fn handle_cancelled_by_domain(&self, action: &DeploymentAction) {
        tracing::warn!(%action, "action cancelled by domain controller");
    }

    fn handle_domain_rolled_back(&self, action: &DeploymentAction) {
        tracing::warn!(%action, "action rolled back by domain controller");
    }

    fn handle_domain_failed(&self, action: &DeploymentAction, error: &RemoteError) {
        tracing::warn!(%action, %error, "action failed on domain controller");
    }

    fn handle_host_failed(
        &self,
        action: &DeploymentAction,
        host_failures: &BTreeMap<String, RemoteError>,
    ) {
        for (host, error) in host_failures {
            tracing::warn!(%action, %host, %error, "action failed on host controller");
        }
    }

    fn handle_servers_identified(&self, action: &DeploymentAction, servers: &[ServerIdentity]) {
        tracing::info!(%action, servers = servers.len(), "action accepted by domain");
    }

    fn handle_server_cancelled(&self, action: &DeploymentAction, server: &ServerIdentity) {
        tracing::warn!(%action, %server, "server update cancelled");
    }

    fn handle_server_rolled_back(&self, action: &DeploymentAction, server: &ServerIdentity) {
        tracing::warn!(%action, %server, "server update rolled back");
    }

    fn handle_server_timed_out(&self, action: &DeploymentAction, server: &ServerIdentity) {
        tracing::warn!(%action, %server, "server update timed out");
    }

    fn handle_server_failed(
        &self,
        action: &DeploymentAction,
        server: &ServerIdentity,
        error: &RemoteError,
    ) {
        tracing::warn!(%action, %server, %error, "server update failed");
    }

    fn handle_server_succeeded(
        &self,
        action: &DeploymentAction,
        server: &ServerIdentity,
        _value: Option<&serde_json::Value>,
    ) {
        tracing::info!(%action, %server, "server updated");
    }

    fn handle_rollback_cancellation(&self, action: &DeploymentAction) {
        tracing::warn!(%action, "rollback cancelled");
    }

    fn handle_domain_rollback(&self, action: &DeploymentAction) {
        tracing::info!(%action, "action rolled back on domain");
    }

    fn handle_domain_rollback_failed(&self, action: &DeploymentAction, error: &RemoteError) {
        tracing::warn!(%action, %error, "domain rollback failed");
    }

    fn handle_host_rollback_failed(
        &self,
        action: &DeploymentAction,
        host_failures: &BTreeMap<String, RemoteError>,
    ) {
        for (host, error) in host_failures {
            tracing::warn!(%action, %host, %error, "host rollback failed");
        }
    }

    fn handle_server_rollback(&self, action: &DeploymentAction, server: &ServerIdentity) {
        tracing::info!(%action, %server, "server rolled back");
    }

    fn handle_server_rollback_cancelled(&self, action: &DeploymentAction, server: &ServerIdentity) {
        tracing::warn!(%action, %server, "server rollback cancelled");
    }

    fn handle_server_rollback_timed_out(&self, action: &DeploymentAction, server: &ServerIdentity) {
        tracing::warn!(%action, %server, "server rollback timed out");
    }

    fn handle_server_rollback_failed(
        &self,
        action: &DeploymentAction,
        server: &ServerIdentity,
        error: &RemoteError,
    ) {
        tracing::warn!(%action, %server, %error, "server rollback failed");
    }
}
