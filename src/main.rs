// ABOUTME: Entry point for the rollplan CLI.
// ABOUTME: Parses command-line arguments and dispatches to subcommands.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use rollplan::error::Result;
use rollplan::output::{Output, OutputMode};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_flags(cli.quiet, cli.json);
    match run(cli, mode).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Output::new(mode).error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    match cli.command {
        Commands::Init { force } => commands::init(force, output),
        Commands::Plan { file, output: save_to } => commands::plan(file, save_to, output),
        Commands::Replay {
            plan,
            response,
            timeout_secs,
        } => {
            commands::replay(&plan, &response, Duration::from_secs(timeout_secs), output).await
        }
    }
}
