// ABOUTME: Identity of a managed server: host, server group, and server name.
// ABOUTME: Ordered by host, then group, then server, matching controller rollout order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A server as identified by the domain controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerIdentity {
    host: String,
    server_group: String,
    server: String,
}

impl ServerIdentity {
    pub fn new(
        host: impl Into<String>,
        server_group: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            server_group: server_group.into(),
            server: server.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn server_group(&self) -> &str {
        &self.server_group
    }

    pub fn server(&self) -> &str {
        &self.server
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.host, self.server_group, self.server)
    }
}
