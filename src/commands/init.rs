// ABOUTME: Init command implementation.
// ABOUTME: Writes a template plan file into the current directory.

use rollplan::config::init_plan_file;
use rollplan::error::Result;
use rollplan::output::Output;
use std::env;

pub fn init(force: bool, output: Output) -> Result<()> {
    let cwd = env::current_dir()?;
    let path = init_plan_file(&cwd, force)?;
    output.success(&format!("Created {}", path.display()));
    Ok(())
}
