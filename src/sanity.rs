//! Pre-flight checks for the execution agent
//!
//! The robot refuses to start a maintenance cycle unless the configured
//! agent answers its availability probe. A failed probe is the single fatal
//! condition: the guidance message is printed, nothing is mutated, and the
//! process exits with status 1.

use std::io::Write;
use tracing::{debug, error, info};

use crate::agent::ExecutionAgent;
use crate::error::{Result, RobotError};

/// Probe `agent`, returning `RobotError::AgentUnavailable` on failure.
pub fn preflight<A: ExecutionAgent + ?Sized>(agent: &A) -> Result<()> {
    debug!("Running pre-flight check for {} agent...", agent.name());

    match agent.probe() {
        Ok(()) => {
            info!("Pre-flight check passed: {} agent available", agent.name());
            Ok(())
        }
        Err(err) => {
            error!("Pre-flight check failed: {}", err);
            Err(err)
        }
    }
}

/// Write the operator-facing message for a failed pre-flight check.
pub fn print_unavailable<W: Write>(out: &mut W, err: &RobotError) -> std::io::Result<()> {
    match err {
        RobotError::AgentUnavailable { guidance, .. } => {
            writeln!(out, ">>> [Robot] {}", guidance)
        }
        other => writeln!(out, ">>> [Robot] {}", other),
    }
}
