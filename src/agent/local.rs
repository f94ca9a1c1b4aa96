//! Native execution agent
//!
//! Implements the three primitives without an external configuration
//! manager: `std::fs` for directories and modes, `nix` for ownership, and
//! `sh -c` for shell commands.

use nix::unistd::{chown, User};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::{resolve, ActionOutcome, ExecutionAgent};
use crate::error::{Result, RobotError};
use crate::types::FileMode;

/// Shell used for `run_shell`.
pub const SHELL: &str = "sh";

#[derive(Debug, Clone)]
pub struct LocalAgent {
    work_dir: PathBuf,
}

impl LocalAgent {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    fn create(&self, target: &Path, recursive: bool) -> std::io::Result<Vec<PathBuf>> {
        // Components that do not exist yet; they receive the owner as well.
        let mut created: Vec<PathBuf> = target
            .ancestors()
            .take_while(|p| !p.exists())
            .map(Path::to_path_buf)
            .collect();
        created.reverse();

        if recursive {
            fs::create_dir_all(target)?;
        } else if !target.is_dir() {
            fs::create_dir(target)?;
        }
        Ok(created)
    }
}

/// Change ownership of `paths` to `owner` (and the owner's primary group).
fn apply_owner(owner: &str, paths: &[PathBuf]) -> std::result::Result<(), String> {
    let user = User::from_name(owner)
        .map_err(|e| format!("cannot look up user {}: {}", owner, e))?
        .ok_or_else(|| format!("User {} is not available", owner))?;

    for path in paths {
        chown(path.as_path(), Some(user.uid), Some(user.gid))
            .map_err(|e| format!("cannot chown {} to {}: {}", path.display(), owner, e))?;
    }
    Ok(())
}

impl ExecutionAgent for LocalAgent {
    fn name(&self) -> &'static str {
        "local"
    }

    fn probe(&self) -> Result<()> {
        if !self.work_dir.is_dir() {
            return Err(RobotError::agent_unavailable(
                self.name(),
                format!("working directory {} does not exist", self.work_dir.display()),
                "Run from the repository root or pass --directory.",
            ));
        }

        match Command::new(SHELL)
            .args(["-c", "exit 0"])
            .stdin(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(RobotError::agent_unavailable(
                self.name(),
                format!("{} exited with {:?}", SHELL, status.code()),
                "Install a POSIX shell to use the local agent.",
            )),
            Err(e) => Err(RobotError::agent_unavailable(
                self.name(),
                format!("cannot execute {}: {}", SHELL, e),
                "Install a POSIX shell to use the local agent.",
            )),
        }
    }

    fn ensure_directory(
        &self,
        path: &Path,
        owner: Option<&str>,
        recursive: bool,
    ) -> ActionOutcome {
        let target = resolve(&self.work_dir, path);

        let created = match self.create(&target, recursive) {
            Ok(created) => created,
            Err(e) => return ActionOutcome::failed(format!("{}: {}", target.display(), e)),
        };
        if !target.is_dir() {
            return ActionOutcome::failed(format!("{} exists and is not a directory", target.display()));
        }
        debug!("ensured {} ({} new component(s))", target.display(), created.len());

        if let Some(owner) = owner {
            let mut owned = created;
            if !owned.contains(&target) {
                owned.push(target.clone());
            }
            if let Err(message) = apply_owner(owner, &owned) {
                return ActionOutcome::failed(message);
            }
        }

        ActionOutcome::ok()
    }

    fn run_shell(&self, command: &str) -> ActionOutcome {
        info!("{} -c {:?}", SHELL, command);

        let output = Command::new(SHELL)
            .arg("-c")
            .arg(command)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(output) if output.status.success() => {
                ActionOutcome::ok_with(String::from_utf8_lossy(&output.stdout).trim())
            }
            Ok(output) => ActionOutcome::failed(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            )),
            Err(e) => ActionOutcome::failed(format!("failed to spawn {}: {}", SHELL, e)),
        }
    }

    fn set_mode(&self, path: &Path, mode: FileMode) -> ActionOutcome {
        let target = resolve(&self.work_dir, path);
        match fs::set_permissions(&target, fs::Permissions::from_mode(mode.bits())) {
            Ok(()) => ActionOutcome::ok(),
            Err(e) => ActionOutcome::failed(format!("{}: {}", target.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_rejects_missing_work_dir() {
        let agent = LocalAgent::new("/nonexistent/work/dir/12345");
        assert!(agent.probe().unwrap_err().is_agent_unavailable());
    }

    #[test]
    fn test_ensure_directory_over_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("config"), "not a dir").unwrap();
        let agent = LocalAgent::new(tmp.path());
        let outcome = agent.ensure_directory(Path::new("config"), None, true);
        assert!(!outcome.success);
    }

    #[test]
    fn test_ensure_directory_unknown_owner_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let agent = LocalAgent::new(tmp.path());
        let outcome =
            agent.ensure_directory(Path::new("scripts"), Some("no_such_user_robot_12345"), true);
        assert!(!outcome.success);
        assert!(outcome.message_or_empty().contains("not available"));
    }

    #[test]
    fn test_non_recursive_needs_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let agent = LocalAgent::new(tmp.path());
        assert!(!agent.ensure_directory(Path::new("a/b"), None, false).success);
        assert!(agent.ensure_directory(Path::new("a"), None, false).success);
        assert!(agent.ensure_directory(Path::new("a/b"), None, false).success);
    }

    #[test]
    fn test_run_shell_reports_exit_code() {
        let tmp = tempfile::tempdir().unwrap();
        let agent = LocalAgent::new(tmp.path());
        let outcome = agent.run_shell("echo oops >&2; exit 3");
        assert!(!outcome.success);
        assert_eq!(outcome.message_or_empty(), "exit code 3: oops");
    }

    #[test]
    fn test_set_mode_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let agent = LocalAgent::new(tmp.path());
        assert!(!agent.set_mode(Path::new("just"), FileMode::EXECUTABLE).success);
    }
}
