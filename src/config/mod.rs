// ABOUTME: Plan file types and parsing for rollplan.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, and driving the plan builder.

mod action;
mod deserialize;
mod env_value;
mod init;
mod rollout;

pub use action::{ActionConfig, ActionEntry, ContentConfig, DeployEntry, ReplaceConfig};
pub use env_value::EnvValue;
pub use init::{init_plan_file, template_yaml};
pub use rollout::GroupConfig;

use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::content::ContentDistributor;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::plan::{ActionsComplete, DeploymentPlan, GroupScoped, Initial, PlanBuilder};

use deserialize::{deserialize_actions, deserialize_rollout, deserialize_sets};

pub const PLAN_FILENAME: &str = "rollplan.yml";
pub const PLAN_FILENAME_ALT: &str = "rollplan.yaml";
pub const PLAN_FILENAME_DIR: &str = ".rollplan/plan.yml";

/// A declarative deployment plan.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanFile {
    /// How long the CLI waits for the execution to finish.
    #[serde(default = "default_await_timeout", with = "humantime_serde")]
    pub await_timeout: Duration,

    #[serde(default)]
    pub rollback_across_groups: bool,

    #[serde(deserialize_with = "deserialize_sets")]
    pub sets: NonEmpty<SetConfig>,

    /// Directory relative content paths are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetConfig {
    /// Shut servers down without a graceful timeout.
    #[serde(default)]
    pub shutdown: bool,

    #[serde(default, with = "humantime_serde")]
    pub graceful_shutdown: Option<Duration>,

    #[serde(default = "default_true")]
    pub single_server_rollback: bool,

    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,

    #[serde(deserialize_with = "deserialize_actions")]
    pub actions: NonEmpty<ActionEntry>,

    #[serde(deserialize_with = "deserialize_rollout")]
    pub rollout: NonEmpty<NonEmpty<GroupConfig>>,
}

fn default_await_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_true() -> bool {
    true
}

impl PlanFile {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut plan = Self::from_yaml(&content)?;
        plan.base_dir = path.parent().map(Path::to_path_buf);
        Ok(plan)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(PLAN_FILENAME),
            dir.join(PLAN_FILENAME_ALT),
            dir.join(PLAN_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                let mut plan = Self::load(path)?;
                plan.base_dir = Some(dir.to_path_buf());
                return Ok(plan);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn base_dir(&self) -> &Path {
        self.base_dir.as_deref().unwrap_or_else(|| Path::new("."))
    }

    /// Build the plan through the typed builder, so every ordering rule applies.
    ///
    /// Content files are opened and handed to `distributor` while building.
    pub fn build(
        &self,
        distributor: Arc<dyn ContentDistributor>,
        diagnostics: &mut Diagnostics,
    ) -> Result<DeploymentPlan> {
        let mut builder = PlanBuilder::new(distributor);
        if self.rollback_across_groups {
            builder = builder.with_rollback_across_groups();
        }

        let mut scoped = self.build_set(builder, self.sets.first(), diagnostics)?;
        for set in self.sets.tail() {
            scoped = self.build_set(scoped.new_deployment_set(), set, diagnostics)?;
        }
        Ok(scoped.build())
    }

    fn build_set(
        &self,
        builder: PlanBuilder<Initial>,
        set: &SetConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<PlanBuilder<GroupScoped>> {
        let mut builder = builder;
        if set.shutdown {
            builder = builder.with_shutdown();
        }
        if let Some(timeout) = set.graceful_shutdown {
            builder = builder.with_graceful_shutdown(timeout);
        }
        if !set.single_server_rollback {
            builder = builder.without_single_server_rollback();
        }
        for (key, value) in &set.metadata {
            builder = builder.with_metadata(key.clone(), value.clone());
        }

        let base = self.base_dir();
        let mut actions: PlanBuilder<ActionsComplete> = set.actions.first().apply(builder, base)?;
        for entry in set.actions.tail() {
            actions = entry.apply(actions, base)?;
        }

        warn_duplicate_groups(&set.rollout, diagnostics);

        let first_step = &set.rollout.head;
        let mut scoped = first_step
            .head
            .apply_policy(actions.to_server_group(&first_step.head.group)?, diagnostics)?;
        for group in &first_step.tail {
            scoped = group.apply_policy(scoped.to_server_group(&group.group)?, diagnostics)?;
        }
        for step in set.rollout.tail() {
            scoped = step
                .head
                .apply_policy(scoped.rolling_to_next_group(&step.head.group)?, diagnostics)?;
            for group in &step.tail {
                scoped = group.apply_policy(scoped.to_server_group(&group.group)?, diagnostics)?;
            }
        }
        Ok(scoped)
    }
}

fn warn_duplicate_groups(rollout: &NonEmpty<NonEmpty<GroupConfig>>, diagnostics: &mut Diagnostics) {
    for (index, step) in rollout.iter().enumerate() {
        let mut seen = HashSet::new();
        for group in step.iter() {
            if !seen.insert(group.group.as_str()) {
                diagnostics.warn(Warning::duplicate_group(&group.group, index + 1));
            }
        }
    }
}
