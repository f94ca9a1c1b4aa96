use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::AgentKind;

/// Repo Robot - local repository maintenance
#[derive(Parser, Debug)]
#[command(name = "robot")]
#[command(about = "Ensures repository directories, prunes .adoc whitespace and fixes script permissions")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: log each action without touching the filesystem.
    ///
    /// The agent is still probed, so a missing SaltStack is reported the
    /// same way as in a real run.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Execution agent (salt, local)
    #[arg(short, long, global = true)]
    pub agent: Option<AgentKind>,

    /// Owner for created directories (default: $USER)
    #[arg(short, long, global = true)]
    pub owner: Option<String>,

    /// salt-call executable used by the salt agent
    #[arg(long, global = true)]
    pub salt_call: Option<PathBuf>,

    /// Repository root to maintain (default: current directory)
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the maintenance cycle (default)
    Run,
    /// Only check that the execution agent is available
    Check,
    /// Print the maintenance cycle without executing it
    Plan,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Subcommand to execute, defaulting to `run`.
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_no_args() {
        // Running with no args runs the maintenance cycle
        let cli = Cli::try_parse_from(["robot"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.command(), Commands::Run);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_agent_flag() {
        let cli = Cli::try_parse_from(["robot", "--agent", "local"]).unwrap();
        assert_eq!(cli.agent, Some(AgentKind::Local));
    }

    #[test]
    fn test_cli_rejects_unknown_agent() {
        assert!(Cli::try_parse_from(["robot", "--agent", "puppet"]).is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "robot",
            "run",
            "--dry-run",
            "-C",
            "/srv/repo",
            "--owner",
            "builder",
        ])
        .unwrap();
        assert_eq!(cli.command(), Commands::Run);
        assert!(cli.dry_run);
        assert_eq!(cli.directory, Some(PathBuf::from("/srv/repo")));
        assert_eq!(cli.owner.as_deref(), Some("builder"));
    }

    #[test]
    fn test_cli_check_and_plan() {
        let cli = Cli::try_parse_from(["robot", "check"]).unwrap();
        assert_eq!(cli.command(), Commands::Check);
        let cli = Cli::try_parse_from(["robot", "plan", "--config", "robot.json"]).unwrap();
        assert_eq!(cli.command(), Commands::Plan);
        assert_eq!(cli.config, Some(PathBuf::from("robot.json")));
    }
}
