//! Maintenance Runner
//!
//! Executes a `MaintenancePlan` against an `ExecutionAgent` in strict order:
//!
//! 1. Directory enforcement (per-path failures are reported, never fatal)
//! 2. Whitespace pruning (one shell command, result only logged)
//! 3. Permission enforcement (result only logged)
//!
//! Later steps never depend on earlier ones. The only fatal condition is an
//! agent that fails its availability probe, which is checked by
//! [`run_maintenance`] before any action is issued.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn};

use crate::agent::{ActionOutcome, ExecutionAgent};
use crate::plan::MaintenancePlan;
use crate::sanity;

/// Process-level result of a maintenance invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// All three steps were attempted.
    Complete,
    /// The agent could not be initialized; nothing was attempted.
    AgentUnavailable,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Complete => 0,
            ExitStatus::AgentUnavailable => 1,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Outcomes collected during one cycle.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub directories: Vec<(PathBuf, ActionOutcome)>,
    pub prune: Option<ActionOutcome>,
    pub permissions: Option<ActionOutcome>,
}

impl MaintenanceReport {
    /// Paths the agent failed to ensure.
    pub fn failed_directories(&self) -> Vec<&PathBuf> {
        self.directories
            .iter()
            .filter(|(_, outcome)| !outcome.success)
            .map(|(path, _)| path)
            .collect()
    }

    fn outcomes(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.directories
            .iter()
            .map(|(_, outcome)| outcome)
            .chain(self.prune.iter())
            .chain(self.permissions.iter())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes().filter(|o| !o.success).count()
    }

    /// True once all three steps have been attempted.
    pub fn is_complete(&self) -> bool {
        self.prune.is_some() && self.permissions.is_some()
    }
}

pub struct MaintenanceRunner<'a, A: ExecutionAgent + ?Sized> {
    agent: &'a A,
    plan: &'a MaintenancePlan,
}

impl<'a, A: ExecutionAgent + ?Sized> MaintenanceRunner<'a, A> {
    pub fn new(agent: &'a A, plan: &'a MaintenancePlan) -> Self {
        Self { agent, plan }
    }

    /// Run the cycle, writing progress lines to `out`.
    ///
    /// Does not probe the agent; callers wanting the fatal-path behaviour
    /// use [`run_maintenance`]. Progress output is best-effort: a failing
    /// writer never stops the agent calls.
    pub fn run<W: Write>(&self, out: &mut W) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();
        let mut progress = Progress::new(out);
        info!("maintenance cycle starting with {} agent", self.agent.name());
        progress.line(format_args!(">>> [Robot] Starting Local Maintenance Cycle..."));

        progress.line(format_args!("    - Verifying directory integrity..."));
        for dir in &self.plan.directories {
            let outcome =
                self.agent
                    .ensure_directory(&dir.path, dir.owner.as_deref(), dir.recursive);
            if outcome.success {
                debug!("directory {} ok", dir.path.display());
            } else {
                warn!(
                    "failed to ensure {}: {}",
                    dir.path.display(),
                    outcome.message_or_empty()
                );
                progress.line(format_args!("      [!] Failed to create {}", dir.path.display()));
            }
            report.directories.push((dir.path.clone(), outcome));
        }

        progress.line(format_args!(
            "    - Pruning trailing whitespace in .{} files...",
            self.plan.prune.extension
        ));
        let outcome = self.agent.run_shell(&self.plan.prune.to_shell_command());
        log_unchecked("whitespace pruning", &outcome);
        report.prune = Some(outcome);

        progress.line(format_args!("    - Enforcing executable permissions on scripts..."));
        let target = &self.plan.permissions;
        let outcome = self.agent.set_mode(&target.path, target.mode);
        log_unchecked("permission enforcement", &outcome);
        report.permissions = Some(outcome);

        progress.line(format_args!(">>> [Robot] Maintenance Complete. All systems nominal."));
        info!(
            "maintenance cycle complete: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }
}

/// Progress writer that logs the first write error and drops later lines.
struct Progress<'w, W: Write> {
    out: &'w mut W,
    broken: bool,
}

impl<'w, W: Write> Progress<'w, W> {
    fn new(out: &'w mut W) -> Self {
        Self { out, broken: false }
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if self.broken {
            return;
        }
        if let Err(e) = self.out.write_fmt(args).and_then(|()| self.out.write_all(b"\n")) {
            warn!("progress output unavailable, continuing silently: {}", e);
            self.broken = true;
        }
    }
}

// Steps 2 and 3 never escalate; their outcome only reaches the log.
fn log_unchecked(step: &str, outcome: &ActionOutcome) {
    if outcome.success {
        debug!("{} finished: {}", step, outcome.message_or_empty());
    } else {
        warn!("{} reported failure: {}", step, outcome.message_or_empty());
    }
}

/// Probe the agent, then run the full cycle.
///
/// Returns `ExitStatus::AgentUnavailable` without issuing a single
/// primitive when the probe fails; otherwise `ExitStatus::Complete`
/// regardless of individual action failures.
pub fn run_maintenance<A, W>(
    agent: &A,
    plan: &MaintenancePlan,
    out: &mut W,
) -> (ExitStatus, Option<MaintenanceReport>)
where
    A: ExecutionAgent + ?Sized,
    W: Write,
{
    if let Err(err) = sanity::preflight(agent) {
        if let Err(e) = sanity::print_unavailable(out, &err) {
            warn!("cannot print guidance: {}", e);
        }
        return (ExitStatus::AgentUnavailable, None);
    }

    let report = MaintenanceRunner::new(agent, plan).run(out);
    (ExitStatus::Complete, Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Complete.code(), 0);
        assert_eq!(ExitStatus::AgentUnavailable.code(), 1);
    }

    #[test]
    fn test_report_counts() {
        let report = MaintenanceReport {
            directories: vec![
                (PathBuf::from("config"), ActionOutcome::ok()),
                (PathBuf::from("scripts"), ActionOutcome::failed("denied")),
            ],
            prune: Some(ActionOutcome::ok()),
            permissions: Some(ActionOutcome::failed("missing")),
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.failed_directories(), vec![&PathBuf::from("scripts")]);
        assert!(report.is_complete());
        assert!(!MaintenanceReport::default().is_complete());
    }
}
