// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::result::{DeploymentPlanResult, DomainOutcome, ServerOutcome};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

impl OutputMode {
    pub fn from_flags(quiet: bool, json: bool) -> Self {
        if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "success",
                    message,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print a serializable document: pretty JSON in normal mode, one line in JSON mode.
    pub fn document<T: Serialize>(&self, value: &T) {
        let rendered = match self.mode {
            OutputMode::Normal => serde_json::to_string_pretty(value),
            OutputMode::Quiet => return,
            OutputMode::Json => serde_json::to_string(value),
        };
        if let Ok(text) = rendered {
            println!("{text}");
        }
    }

    /// Print a decoded result tree.
    pub fn plan_result(&self, result: &DeploymentPlanResult) {
        match self.mode {
            OutputMode::Json => self.document(result),
            OutputMode::Quiet => {}
            OutputMode::Normal => {
                if let Some(reason) = result.invalid_reason() {
                    println!("Plan {} rejected: {reason}", result.plan_id());
                    return;
                }
                for set in result.set_results() {
                    let rolled_back = if set.is_rolled_back() { " (rolled back)" } else { "" };
                    println!("Set {}{rolled_back}", set.set_id());
                    for action_id in set.action_ids() {
                        let Some(action) = result.action_result(action_id) else {
                            continue;
                        };
                        println!("  {}: {}", action.action(), domain_label(action.domain_outcome()));
                        for group in action.server_group_results().values() {
                            for server in group.servers() {
                                println!(
                                    "    {}: {}",
                                    server.identity(),
                                    server_label(server.outcome())
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

fn domain_label(outcome: &DomainOutcome) -> String {
    match outcome {
        DomainOutcome::ServersIdentified => "accepted".to_string(),
        DomainOutcome::CancelledByDomain => "cancelled".to_string(),
        DomainOutcome::RolledBack => "rolled back".to_string(),
        DomainOutcome::DomainFailed { error } => format!("failed: {error}"),
        DomainOutcome::HostFailed => "failed on host".to_string(),
    }
}

fn server_label(outcome: &ServerOutcome) -> String {
    match outcome {
        ServerOutcome::Succeeded { .. } => "ok".to_string(),
        ServerOutcome::Failed { error } => format!("failed: {error}"),
        ServerOutcome::Cancelled => "cancelled".to_string(),
        ServerOutcome::TimedOut => "timed out".to_string(),
        ServerOutcome::RolledBack => "rolled back".to_string(),
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
