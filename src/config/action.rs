// ABOUTME: Action entries of a plan file and how they drive the plan builder.
// ABOUTME: Follow-up flags map onto the builder's chained directives.

use serde::Deserialize;
use std::fs::File;
use std::path::Path;

use crate::error::{Error, Result};
use crate::plan::{ActionPhase, ActionsComplete, PlanBuilder};

use super::env_value::EnvValue;

/// One entry under `actions:`. Exactly one action key plus optional follow-ups.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionEntry {
    #[serde(flatten)]
    pub action: ActionConfig,

    /// Deploy the unit right after `add`.
    #[serde(default)]
    pub and_deploy: bool,

    /// Replace this unit with the one just added.
    #[serde(default)]
    pub and_replace: Option<String>,

    /// Remove the content of the unit just undeployed or replaced.
    #[serde(default)]
    pub and_remove: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionConfig {
    Add(ContentConfig),
    Deploy(DeployEntry),
    Redeploy(String),
    Undeploy(String),
    Replace(ReplaceConfig),
    FullReplace(ContentConfig),
    Remove(String),
}

impl ActionConfig {
    fn name(&self) -> &'static str {
        match self {
            ActionConfig::Add(_) => "add",
            ActionConfig::Deploy(_) => "deploy",
            ActionConfig::Redeploy(_) => "redeploy",
            ActionConfig::Undeploy(_) => "undeploy",
            ActionConfig::Replace(_) => "replace",
            ActionConfig::FullReplace(_) => "full_replace",
            ActionConfig::Remove(_) => "remove",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    pub name: String,
    #[serde(default)]
    pub runtime_name: Option<String>,
    pub path: EnvValue,
}

impl ContentConfig {
    fn runtime_name(&self) -> &str {
        self.runtime_name.as_deref().unwrap_or(&self.name)
    }

    fn open(&self, base: &Path) -> Result<File> {
        let path = self.path.resolve_path(base)?;
        File::open(&path).map_err(|source| Error::Content { path, source })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceConfig {
    pub name: String,
    pub replaces: String,
}

/// `deploy: app.war` or `deploy: { name: app.war, policy: ... }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DeployEntry {
    Simple(String),
    Detailed {
        name: String,
        #[serde(default)]
        policy: Option<String>,
    },
}

impl ActionEntry {
    fn check_follow_ups(&self) -> Result<()> {
        let action = self.action.name();
        let allows_add_follow_up = matches!(self.action, ActionConfig::Add(_));
        let allows_remove = match self.action {
            ActionConfig::Undeploy(_) | ActionConfig::Replace(_) => true,
            ActionConfig::Add(_) => self.and_replace.is_some(),
            _ => false,
        };

        if (self.and_deploy || self.and_replace.is_some()) && !allows_add_follow_up {
            return Err(Error::InvalidConfig(format!(
                "`and_deploy`/`and_replace` only apply to `add`, not `{action}`"
            )));
        }
        if self.and_deploy && self.and_replace.is_some() {
            return Err(Error::InvalidConfig(
                "`and_deploy` and `and_replace` cannot be combined".to_string(),
            ));
        }
        if self.and_remove && !allows_remove {
            return Err(Error::InvalidConfig(format!(
                "`and_remove` only applies to `undeploy`, `replace` or `add` with `and_replace`, not `{action}`"
            )));
        }
        Ok(())
    }

    /// Apply this entry to `builder`, relative content paths resolved against `base`.
    pub(crate) fn apply<P: ActionPhase>(
        &self,
        builder: PlanBuilder<P>,
        base: &Path,
    ) -> Result<PlanBuilder<ActionsComplete>> {
        self.check_follow_ups()?;

        let next = match &self.action {
            ActionConfig::Add(content) => {
                let added = builder.add(&content.name, content.runtime_name(), content.open(base)?)?;
                match (&self.and_replace, self.and_deploy) {
                    (Some(old), _) => {
                        let replaced = added.and_replace(old)?;
                        if self.and_remove {
                            replaced.and_remove_undeployed()?
                        } else {
                            replaced.actions_complete()?
                        }
                    }
                    (None, true) => added.and_deploy()?,
                    (None, false) => added.actions_complete()?,
                }
            }
            ActionConfig::Deploy(DeployEntry::Simple(name)) => builder.deploy(name)?,
            ActionConfig::Deploy(DeployEntry::Detailed { name, policy }) => match policy {
                Some(policy) => builder.deploy_with_policy(name, policy)?,
                None => builder.deploy(name)?,
            },
            ActionConfig::Redeploy(name) => builder.redeploy(name)?,
            ActionConfig::Undeploy(name) => {
                let undeployed = builder.undeploy(name)?;
                if self.and_remove {
                    undeployed.and_remove_undeployed()?
                } else {
                    undeployed.actions_complete()?
                }
            }
            ActionConfig::Replace(replace) => {
                let replaced = builder.replace(&replace.name, &replace.replaces)?;
                if self.and_remove {
                    replaced.and_remove_undeployed()?
                } else {
                    replaced.actions_complete()?
                }
            }
            ActionConfig::FullReplace(content) => builder.full_replace(
                &content.name,
                content.runtime_name(),
                content.open(base)?,
            )?,
            ActionConfig::Remove(name) => builder.remove(name)?,
        };
        Ok(next)
    }
}
