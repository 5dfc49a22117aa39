// ABOUTME: Per-server-group rollout policy.
// ABOUTME: Identity is the group name; at most one failure limit is active at a time.

use serde::{Deserialize, Serialize};

/// How a deployment set is rolled out to one server group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GroupRecord", into = "GroupRecord")]
pub struct ServerGroupPlan {
    group_name: String,
    rolling_to_servers: bool,
    rollback_enabled: bool,
    max_failures: u32,
    max_failure_percentage: u8,
}

impl ServerGroupPlan {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            rolling_to_servers: false,
            rollback_enabled: false,
            max_failures: 0,
            max_failure_percentage: 0,
        }
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// Servers in the group are updated one at a time rather than concurrently.
    pub fn is_rolling_to_servers(&self) -> bool {
        self.rolling_to_servers
    }

    pub fn is_rollback_enabled(&self) -> bool {
        self.rollback_enabled
    }

    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    pub fn max_failure_percentage(&self) -> u8 {
        self.max_failure_percentage
    }

    pub fn rolling(self) -> Self {
        Self {
            rolling_to_servers: true,
            ..self
        }
    }

    pub fn with_rollback(self) -> Self {
        Self {
            rollback_enabled: true,
            ..self
        }
    }

    /// Tolerate `max_failures` failed servers. Clears any failure percentage.
    pub fn with_max_failures(self, max_failures: u32) -> Self {
        Self {
            max_failures,
            max_failure_percentage: 0,
            ..self
        }
    }

    /// Tolerate `percentage` percent failed servers. Clears any failure count.
    pub fn with_max_failure_percentage(self, percentage: u8) -> Self {
        Self {
            max_failures: 0,
            max_failure_percentage: percentage,
            ..self
        }
    }
}

/// Serialized form; validated on the way back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroupRecord {
    group_name: String,
    #[serde(default)]
    rolling_to_servers: bool,
    #[serde(default)]
    rollback_enabled: bool,
    #[serde(default)]
    max_failures: u32,
    #[serde(default)]
    max_failure_percentage: u8,
}

impl TryFrom<GroupRecord> for ServerGroupPlan {
    type Error = String;

    fn try_from(record: GroupRecord) -> Result<Self, Self::Error> {
        if record.group_name.trim().is_empty() {
            return Err("server group name must not be empty".to_string());
        }
        if record.max_failure_percentage > 100 {
            return Err(format!(
                "server group {} has failure percentage {}, expected 0..=100",
                record.group_name, record.max_failure_percentage
            ));
        }
        if record.max_failures > 0 && record.max_failure_percentage > 0 {
            return Err(format!(
                "server group {} sets both a failure count and a failure percentage",
                record.group_name
            ));
        }

        Ok(Self {
            group_name: record.group_name,
            rolling_to_servers: record.rolling_to_servers,
            rollback_enabled: record.rollback_enabled,
            max_failures: record.max_failures,
            max_failure_percentage: record.max_failure_percentage,
        })
    }
}

impl From<ServerGroupPlan> for GroupRecord {
    fn from(plan: ServerGroupPlan) -> Self {
        Self {
            group_name: plan.group_name,
            rolling_to_servers: plan.rolling_to_servers,
            rollback_enabled: plan.rollback_enabled,
            max_failures: plan.max_failures,
            max_failure_percentage: plan.max_failure_percentage,
        }
    }
}
