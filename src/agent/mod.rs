//! Execution agents.
//!
//! The maintenance runner never touches the filesystem itself. Every mutation
//! goes through an `ExecutionAgent`, which exposes exactly three primitives:
//! ensure a directory exists, run a shell command, and set mode bits.
//!
//! # Agents
//!
//! - [`SaltAgent`]: delegates to `salt-call --local`
//! - [`LocalAgent`]: native `std::fs` + `nix` implementation
//! - [`DryRunAgent`]: logs each primitive and mutates nothing
//!
//! # Contract
//!
//! Primitives report failure as an [`ActionOutcome`] rather than an error.
//! Only [`ExecutionAgent::probe`] returns `Err`, and only with
//! `RobotError::AgentUnavailable`.

pub mod dry_run;
pub mod local;
pub mod salt;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{AgentKind, FileMode};

pub use dry_run::DryRunAgent;
pub use local::LocalAgent;
pub use salt::SaltAgent;

/// Outcome of a single agent primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Whether the agent reported success.
    pub success: bool,
    /// Diagnostic text (stderr, state comment, OS error), if any.
    pub message: Option<String>,
    /// True when the action was only logged, not performed.
    pub dry_run: bool,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            dry_run: false,
        }
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            dry_run: false,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            dry_run: false,
        }
    }

    pub fn skipped() -> Self {
        Self {
            success: true,
            message: None,
            dry_run: true,
        }
    }

    /// Diagnostic text or an empty string.
    pub fn message_or_empty(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

/// The local command/state executor the runner delegates to.
pub trait ExecutionAgent {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Check that the agent can be used at all.
    ///
    /// Must not mutate anything. Returns `RobotError::AgentUnavailable`
    /// when the backing tool cannot be located or initialized.
    fn probe(&self) -> Result<()>;

    /// Ensure `path` exists as a directory owned by `owner`.
    ///
    /// Creating an existing directory is a success.
    fn ensure_directory(&self, path: &Path, owner: Option<&str>, recursive: bool)
        -> ActionOutcome;

    /// Run `command` through a shell in the agent's working directory.
    fn run_shell(&self, command: &str) -> ActionOutcome;

    /// Set the permission bits of `path`.
    fn set_mode(&self, path: &Path, mode: FileMode) -> ActionOutcome;
}

impl<A: ExecutionAgent + ?Sized> ExecutionAgent for Box<A> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn probe(&self) -> Result<()> {
        (**self).probe()
    }

    fn ensure_directory(
        &self,
        path: &Path,
        owner: Option<&str>,
        recursive: bool,
    ) -> ActionOutcome {
        (**self).ensure_directory(path, owner, recursive)
    }

    fn run_shell(&self, command: &str) -> ActionOutcome {
        (**self).run_shell(command)
    }

    fn set_mode(&self, path: &Path, mode: FileMode) -> ActionOutcome {
        (**self).set_mode(path, mode)
    }
}

/// Resolve `path` against `work_dir` unless it is already absolute.
pub(crate) fn resolve(work_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    }
}

/// Build the agent selected by `kind`, optionally wrapped for dry-run.
pub fn build_agent(
    kind: AgentKind,
    work_dir: PathBuf,
    salt_call: PathBuf,
    dry_run: bool,
) -> Box<dyn ExecutionAgent> {
    let agent: Box<dyn ExecutionAgent> = match kind {
        AgentKind::Salt => Box::new(SaltAgent::new(salt_call, work_dir)),
        AgentKind::Local => Box::new(LocalAgent::new(work_dir)),
    };
    if dry_run {
        Box::new(DryRunAgent::new(agent))
    } else {
        agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        assert!(ActionOutcome::ok().success);
        assert!(!ActionOutcome::failed("nope").success);
        assert_eq!(ActionOutcome::failed("nope").message_or_empty(), "nope");
        assert_eq!(ActionOutcome::ok().message_or_empty(), "");
        assert!(ActionOutcome::skipped().dry_run);
    }

    #[test]
    fn test_resolve() {
        let wd = Path::new("/srv/repo");
        assert_eq!(resolve(wd, Path::new("config")), PathBuf::from("/srv/repo/config"));
        assert_eq!(resolve(wd, Path::new("/etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn test_build_agent_names() {
        let wd = PathBuf::from("/tmp");
        let salt = build_agent(AgentKind::Salt, wd.clone(), "salt-call".into(), false);
        assert_eq!(salt.name(), "salt");
        let local = build_agent(AgentKind::Local, wd.clone(), "salt-call".into(), false);
        assert_eq!(local.name(), "local");
        let dry = build_agent(AgentKind::Local, wd, "salt-call".into(), true);
        assert_eq!(dry.name(), "local");
    }
}
