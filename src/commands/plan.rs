// ABOUTME: Plan command implementation.
// ABOUTME: Builds the plan file through the typed builder and prints or saves the result.

use rollplan::config::PlanFile;
use rollplan::content::DigestDistributor;
use rollplan::diagnostics::Diagnostics;
use rollplan::error::Result;
use rollplan::output::{Output, OutputMode};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

/// Build the plan file with content hashed locally.
pub fn plan(file: Option<PathBuf>, save_to: Option<PathBuf>, mut output: Output) -> Result<()> {
    output.start_timer();
    let plan_file = match file {
        Some(path) => PlanFile::load(&path)?,
        None => PlanFile::discover(&env::current_dir()?)?,
    };

    let mut diag = Diagnostics::default();
    let plan = plan_file.build(Arc::new(DigestDistributor), &mut diag)?;

    for warning in diag.warnings() {
        eprintln!("Warning: {}", warning.message);
    }

    output.progress(&format!(
        "Built plan {} with {} set(s) and {} action(s)",
        plan.id(),
        plan.set_plans().len(),
        plan.actions().count()
    ));

    match save_to {
        Some(path) => {
            std::fs::write(&path, serde_json::to_string_pretty(&plan)?)?;
            output.success(&format!("Saved plan to {}", path.display()));
        }
        None => {
            if output.mode() == OutputMode::Quiet {
                output.success(&plan.id().to_string());
            } else {
                output.document(&plan);
            }
        }
    }
    Ok(())
}
