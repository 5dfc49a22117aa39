// ABOUTME: Rollout entries of a plan file: concurrent sets of server groups.
// ABOUTME: A group is either a bare name or a map with its rollout policy.

use serde::Deserialize;

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;
use crate::plan::{GroupScoped, PlanBuilder};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupConfig {
    pub group: String,
    #[serde(default)]
    pub rolling_to_servers: bool,
    #[serde(default)]
    pub rollback: bool,
    #[serde(default)]
    pub max_failures: Option<u32>,
    #[serde(default)]
    pub max_failure_percentage: Option<u8>,
}

impl GroupConfig {
    pub fn named(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            rolling_to_servers: false,
            rollback: false,
            max_failures: None,
            max_failure_percentage: None,
        }
    }

    /// Apply this group's policy to the group just scoped on `builder`.
    pub(crate) fn apply_policy(
        &self,
        builder: PlanBuilder<GroupScoped>,
        diagnostics: &mut Diagnostics,
    ) -> Result<PlanBuilder<GroupScoped>> {
        let mut builder = builder;
        if self.rolling_to_servers {
            builder = builder.rolling_to_servers()?;
        }
        if self.rollback {
            builder = builder.with_rollback()?;
        }
        if self.max_failures.is_some() && self.max_failure_percentage.is_some() {
            diagnostics.warn(Warning::both_failure_limits(&self.group));
        }
        if let Some(max) = self.max_failures {
            builder = builder.allow_failures(max)?;
        }
        if let Some(percentage) = self.max_failure_percentage {
            builder = builder.allow_failure_percentage(percentage)?;
        }
        Ok(builder)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum GroupEntry {
    Simple(String),
    Detailed(GroupConfig),
}

impl GroupEntry {
    pub(super) fn into_group_config(self) -> GroupConfig {
        match self {
            GroupEntry::Simple(name) => GroupConfig::named(name),
            GroupEntry::Detailed(config) => config,
        }
    }
}
