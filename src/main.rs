//! Repo Robot - Main entry point
//!
//! Parses the command line, assembles the configuration and hands the
//! maintenance cycle to the selected execution agent.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use repo_robot::cli::{Cli, Commands};
use repo_robot::{build_agent, run_maintenance, sanity, ExitStatus, MaintenancePlan, RobotConfig};

/// Initialize the logger with appropriate settings
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    // RUST_LOG overrides the default level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Main application entry point
fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    debug!("CLI arguments parsed: {:?}", cli);

    match run(&cli) {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("✗ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Merge CLI flags over the configuration file.
fn load_config(cli: &Cli) -> Result<RobotConfig> {
    let mut config = RobotConfig::load_or_default(cli.config.as_deref())?;

    if let Some(agent) = cli.agent {
        config.agent = agent;
    }
    if let Some(owner) = &cli.owner {
        config.owner = Some(owner.clone());
    }
    if let Some(salt_call) = &cli.salt_call {
        config.salt_call = salt_call.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn work_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.directory {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().context("Failed to determine working directory"),
    }
}

fn run(cli: &Cli) -> Result<ExitStatus> {
    let config = load_config(cli)?;
    let work_dir = work_dir(cli)?;
    let plan = MaintenancePlan::from_config(&config, config.resolve_owner());
    info!(
        "robot starting: agent={} dir={} dry_run={}",
        config.agent,
        work_dir.display(),
        cli.dry_run
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command() {
        Commands::Plan => {
            writeln!(out, "{}", plan)?;
            Ok(ExitStatus::Complete)
        }
        Commands::Check => {
            let agent = build_agent(config.agent, work_dir, config.salt_call, false);
            match sanity::preflight(&*agent) {
                Ok(()) => {
                    writeln!(out, "✓ {} agent is available", agent.name())?;
                    Ok(ExitStatus::Complete)
                }
                Err(err) => {
                    sanity::print_unavailable(&mut out, &err)?;
                    Ok(ExitStatus::AgentUnavailable)
                }
            }
        }
        Commands::Run => {
            let agent = build_agent(config.agent, work_dir, config.salt_call, cli.dry_run);
            let (status, report) = run_maintenance(&*agent, &plan, &mut out);
            if let Some(report) = report {
                for path in report.failed_directories() {
                    debug!("unresolved directory: {}", path.display());
                }
            }
            Ok(status)
        }
    }
}
