//! Repo Robot Library
//!
//! This library provides the maintenance cycle behind the `robot` binary:
//! directory enforcement, `.adoc` whitespace pruning and entry-point
//! permission enforcement, all delegated to an execution agent.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod plan;
pub mod runner;
pub mod sanity;
pub mod types;

// Re-export main types for convenience
pub use agent::{build_agent, ActionOutcome, DryRunAgent, ExecutionAgent, LocalAgent, SaltAgent};
pub use config::RobotConfig;
pub use error::RobotError;
pub use plan::{DirectorySpec, MaintenancePlan, PermissionTarget, WhitespacePrune};
pub use runner::{run_maintenance, ExitStatus, MaintenanceReport, MaintenanceRunner};
pub use types::{AgentKind, FileMode};
