// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rollplan")]
#[command(about = "Compose multi-group deployment plans and decode their results")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new rollplan.yml plan file
    Init {
        /// Overwrite an existing plan file
        #[arg(short, long)]
        force: bool,
    },

    /// Build the plan file and print the resulting deployment plan
    Plan {
        /// Plan file to use instead of discovering one
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Save the built plan, including its ids, as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a recorded controller response for a saved plan
    Replay {
        /// Plan saved with `rollplan plan --output`
        plan: PathBuf,

        /// Captured response stream
        response: PathBuf,

        /// Seconds to wait for decoding to finish
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
    },
}
