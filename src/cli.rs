// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "anelixi")]
#[command(about = "Safe rollout orchestration for managed container platforms")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output (CI friendly)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new rollout.yml configuration file
    Init {
        /// Service identifier
        #[arg(long)]
        service: Option<String>,

        /// Target artifact (registry/repository:tag)
        #[arg(long)]
        artifact: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run the configured rollout against a simulated platform
    Simulate {
        /// Health polls before the target converges
        #[arg(long, default_value_t = 2)]
        converge_after: u32,

        /// Target never becomes healthy (exercises rollback)
        #[arg(long)]
        unhealthy: bool,

        /// Inject this many transient failures before updates are accepted
        #[arg(long, default_value_t = 0)]
        fail_updates: usize,

        /// Platform rejects the target artifact as invalid
        #[arg(long)]
        reject_target: bool,

        /// Disable automatic rollback on health timeout
        #[arg(long)]
        no_rollback: bool,
    },

    /// Show the discovered configuration
    Status,
}
