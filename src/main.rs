// ABOUTME: Entry point for the anelixi CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use anelixi::config::{self, Config};
use anelixi::error::{Error, Result};
use anelixi::history::RolloutHistory;
use anelixi::output::{Output, OutputMode};
use anelixi::platform::InMemoryPlatform;
use anelixi::rollout::{RolloutController, RolloutOutcome};
use anelixi::types::ArtifactRef;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    if let Err(e) = run(cli, output).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    match cli.command {
        Commands::Init {
            service,
            artifact,
            force,
        } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, service.as_deref(), artifact.as_deref(), force)
        }
        Commands::Simulate {
            converge_after,
            unhealthy,
            fail_updates,
            reject_target,
            no_rollback,
        } => {
            let cwd = env::current_dir()?;
            let config = Config::discover(&cwd)?;
            let sim = SimulateFlags {
                converge_after,
                unhealthy,
                fail_updates,
                reject_target,
                no_rollback,
            };
            simulate(config, sim, output).await
        }
        Commands::Status => {
            let cwd = env::current_dir()?;
            let config = Config::discover(&cwd)?;
            println!("Service: {}", config.service);
            println!("Artifact: {}", config.artifact);
            println!(
                "Health timeout: {:?}, poll interval: {:?}",
                config.rollout.health_timeout, config.rollout.poll_interval
            );
            println!(
                "Max retries: {}, auto-rollback: {}",
                config.rollout.max_retries, config.rollout.auto_rollback
            );
            Ok(())
        }
    }
}

struct SimulateFlags {
    converge_after: u32,
    unhealthy: bool,
    fail_updates: usize,
    reject_target: bool,
    no_rollback: bool,
}

/// Run the configured rollout against an in-memory platform.
async fn simulate(config: Config, sim: SimulateFlags, mut output: Output) -> Result<()> {
    output.start_timer();

    // The simulated service starts out converged on a prior artifact so
    // there is something to roll back to.
    let baseline = ArtifactRef::new(
        config.artifact.registry(),
        config.artifact.repository(),
        "stable",
    )
    .expect("artifact components already validated");

    let platform = Arc::new(InMemoryPlatform::new());
    platform.register_service(config.service.clone(), baseline, 2);
    platform.set_converge_after(&config.service, sim.converge_after);
    if sim.unhealthy {
        platform.mark_unhealthy(&config.artifact);
    }
    if sim.reject_target {
        platform.reject_artifact(&config.artifact);
    }
    if sim.fail_updates > 0 {
        platform.fail_next_updates(sim.fail_updates);
    }

    let mut opts = config.rollout.clone();
    if sim.no_rollback {
        opts.auto_rollback = false;
    }

    let history = Arc::new(RolloutHistory::new());
    let controller = RolloutController::new(platform, history);

    output.progress(&format!(
        "Rolling out {} to {} (simulated)",
        config.artifact, config.service
    ));

    let record = controller
        .start(config.service.clone(), config.artifact.clone(), opts)
        .await?;

    output.record(&record);

    match record.outcome {
        RolloutOutcome::Succeeded => Ok(()),
        outcome => Err(Error::RolloutNotSucceeded(outcome.to_string())),
    }
}
