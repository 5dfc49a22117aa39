// ABOUTME: Plan file scaffolding for new projects.
// ABOUTME: Creates rollplan.yml template files.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::PLAN_FILENAME;

const TEMPLATE: &str = r#"# Deployment plan for rollplan.
await_timeout: 5m
rollback_across_groups: false
sets:
  - graceful_shutdown: 30s
    actions:
      - add: { name: my-app.war, path: target/my-app.war }
        and_deploy: true
    rollout:
      - [ main-server-group ]
      # Roll to the next concurrent set only after the first one finished:
      # - - { group: other-server-group, rolling_to_servers: true, rollback: true }
"#;

/// The YAML written by [`init_plan_file`].
pub fn template_yaml() -> &'static str {
    TEMPLATE
}

/// Write a template plan file into `dir`, refusing to overwrite unless `force`.
pub fn init_plan_file(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(PLAN_FILENAME);

    if path.exists() && !force {
        return Err(Error::AlreadyExists(path));
    }

    std::fs::write(&path, TEMPLATE)?;
    Ok(path)
}
