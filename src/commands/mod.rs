// ABOUTME: Command module aggregator for the rollplan CLI.
// ABOUTME: Re-exports init, plan, and replay command handlers.

mod init;
mod plan;
mod replay;

pub use init::init;
pub use plan::plan;
pub use replay::replay;
