//! SaltStack execution agent
//!
//! Drives `salt-call` in masterless mode. Each primitive is one blocking
//! `salt-call --local --out=json ...` invocation:
//!
//! | Primitive          | Salt function                         |
//! |--------------------|---------------------------------------|
//! | `ensure_directory` | `state.single file.directory`         |
//! | `run_shell`        | `cmd.run` (with `cwd` and shell)      |
//! | `set_mode`         | `file.set_mode`                       |
//!
//! Salt rejects relative paths for file states, so every path is resolved
//! against the agent's working directory first.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::{resolve, ActionOutcome, ExecutionAgent};
use crate::error::{Result, RobotError};
use crate::types::FileMode;

/// Default executable name, looked up on `PATH`.
pub const DEFAULT_SALT_CALL: &str = "salt-call";

/// Shown on the fatal path when salt-call cannot be started.
pub const SALT_GUIDANCE: &str = "SaltStack not found. Please run 'just bootstrap' first.";

/// Raw result of one `salt-call` invocation.
#[derive(Debug, Clone)]
pub struct SaltOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    pub success: bool,
}

#[derive(Debug, Clone)]
pub struct SaltAgent {
    salt_call: PathBuf,
    work_dir: PathBuf,
}

impl SaltAgent {
    pub fn new(salt_call: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            salt_call: salt_call.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Arguments for `state.single file.directory`.
    pub fn directory_args(&self, path: &Path, owner: Option<&str>, recursive: bool) -> Vec<String> {
        let mut args = vec![
            "state.single".to_string(),
            "file.directory".to_string(),
            format!("name={}", resolve(&self.work_dir, path).display()),
        ];
        if let Some(user) = owner {
            args.push(format!("user={}", user));
        }
        if recursive {
            args.push("makedirs=True".to_string());
        }
        args
    }

    /// Arguments for `cmd.run`.
    ///
    /// The command is passed as a `cmd=` keyword so that an `=` inside it is
    /// never mistaken for a keyword separator.
    pub fn shell_args(&self, command: &str) -> Vec<String> {
        vec![
            "cmd.run".to_string(),
            format!("cmd={}", command),
            format!("cwd={}", self.work_dir.display()),
            "python_shell=True".to_string(),
        ]
    }

    /// Arguments for `file.set_mode`.
    pub fn mode_args(&self, path: &Path, mode: FileMode) -> Vec<String> {
        vec![
            "file.set_mode".to_string(),
            resolve(&self.work_dir, path).display().to_string(),
            mode.to_string(),
        ]
    }

    fn salt_call(&self, args: &[String]) -> std::io::Result<SaltOutput> {
        info!("salt-call --local --out=json {}", args.join(" "));

        let output = Command::new(&self.salt_call)
            .arg("--local")
            .arg("--out=json")
            .args(args)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        let exit_code = output.status.code();
        debug!("salt-call exited with {:?}", exit_code);

        Ok(SaltOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code,
            success: output.status.success(),
        })
    }

    fn invoke(&self, args: &[String]) -> ActionOutcome {
        match self.salt_call(args) {
            Ok(output) if output.success => ActionOutcome::ok_with(output.stdout.trim()),
            Ok(output) => ActionOutcome::failed(failure_message(&output)),
            Err(e) => ActionOutcome::failed(format!(
                "failed to spawn {}: {}",
                self.salt_call.display(),
                e
            )),
        }
    }
}

impl ExecutionAgent for SaltAgent {
    fn name(&self) -> &'static str {
        "salt"
    }

    fn probe(&self) -> Result<()> {
        let output = Command::new(&self.salt_call)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(output) if output.status.success() => {
                debug!(
                    "salt-call available: {}",
                    String::from_utf8_lossy(&output.stdout).trim()
                );
                Ok(())
            }
            Ok(output) => Err(RobotError::agent_unavailable(
                self.name(),
                format!(
                    "{} --version exited with {:?}: {}",
                    self.salt_call.display(),
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                SALT_GUIDANCE,
            )),
            Err(e) => Err(RobotError::agent_unavailable(
                self.name(),
                format!("cannot execute {}: {}", self.salt_call.display(), e),
                SALT_GUIDANCE,
            )),
        }
    }

    fn ensure_directory(
        &self,
        path: &Path,
        owner: Option<&str>,
        recursive: bool,
    ) -> ActionOutcome {
        let args = self.directory_args(path, owner, recursive);
        match self.salt_call(&args) {
            Ok(output) => state_outcome(&output),
            Err(e) => ActionOutcome::failed(format!(
                "failed to spawn {}: {}",
                self.salt_call.display(),
                e
            )),
        }
    }

    fn run_shell(&self, command: &str) -> ActionOutcome {
        self.invoke(&self.shell_args(command))
    }

    fn set_mode(&self, path: &Path, mode: FileMode) -> ActionOutcome {
        self.invoke(&self.mode_args(path, mode))
    }
}

fn failure_message(output: &SaltOutput) -> String {
    let code = output.exit_code.unwrap_or(-1);
    let detail = if output.stderr.trim().is_empty() {
        output.stdout.trim()
    } else {
        output.stderr.trim()
    };
    format!("salt-call failed (exit code {}): {}", code, detail)
}

/// Interpret the JSON return of `state.single`.
///
/// A successful state looks like
/// `{"local": {"file_|-...": {"result": true, "comment": "..."}}}`.
/// Any `result` other than `true`, a non-object `local` (salt renders
/// errors as a list of strings), or a non-zero exit is a failure.
pub fn state_outcome(output: &SaltOutput) -> ActionOutcome {
    let parsed: Value = match serde_json::from_str(output.stdout.trim()) {
        Ok(value) => value,
        Err(_) if !output.success => return ActionOutcome::failed(failure_message(output)),
        Err(e) => return ActionOutcome::failed(format!("unparseable salt output: {}", e)),
    };

    let Some(local) = parsed.get("local") else {
        return ActionOutcome::failed(format!("salt output has no 'local' key: {}", parsed));
    };

    let Some(states) = local.as_object() else {
        let detail = match local {
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        };
        return ActionOutcome::failed(detail);
    };

    let mut comments = Vec::new();
    let mut all_ok = !states.is_empty();
    for state in states.values() {
        if state.get("result").and_then(Value::as_bool) != Some(true) {
            all_ok = false;
        }
        if let Some(comment) = state.get("comment").and_then(Value::as_str) {
            comments.push(comment.to_string());
        }
    }

    let message = comments.join("; ");
    if all_ok && output.success {
        ActionOutcome::ok_with(message)
    } else if message.is_empty() {
        ActionOutcome::failed(failure_message(output))
    } else {
        ActionOutcome::failed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str, success: bool) -> SaltOutput {
        SaltOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(if success { 0 } else { 2 }),
            success,
        }
    }

    #[test]
    fn test_directory_args_resolve_against_work_dir() {
        let agent = SaltAgent::new("salt-call", "/srv/repo");
        let args = agent.directory_args(Path::new("dist/installers"), Some("builder"), true);
        assert_eq!(
            args,
            vec![
                "state.single",
                "file.directory",
                "name=/srv/repo/dist/installers",
                "user=builder",
                "makedirs=True",
            ]
        );
    }

    #[test]
    fn test_directory_args_without_owner() {
        let agent = SaltAgent::new("salt-call", "/srv/repo");
        let args = agent.directory_args(Path::new("config"), None, false);
        assert!(!args.iter().any(|a| a.starts_with("user=")));
        assert!(!args.iter().any(|a| a.starts_with("makedirs=")));
    }

    #[test]
    fn test_shell_args_use_cmd_keyword() {
        let agent = SaltAgent::new("salt-call", "/srv/repo");
        let args = agent.shell_args("echo a=b");
        assert_eq!(args[0], "cmd.run");
        assert_eq!(args[1], "cmd=echo a=b");
        assert_eq!(args[2], "cwd=/srv/repo");
    }

    #[test]
    fn test_mode_args() {
        let agent = SaltAgent::new("salt-call", "/srv/repo");
        let args = agent.mode_args(Path::new("just"), FileMode::EXECUTABLE);
        assert_eq!(args, vec!["file.set_mode", "/srv/repo/just", "0755"]);
    }

    #[test]
    fn test_state_outcome_success() {
        let json = r#"{"local": {"file_|-/srv/repo/config_|-/srv/repo/config_|-directory":
            {"result": true, "comment": "The directory /srv/repo/config is in the correct state"}}}"#;
        let outcome = state_outcome(&output(json, true));
        assert!(outcome.success);
        assert!(outcome.message_or_empty().contains("correct state"));
    }

    #[test]
    fn test_state_outcome_false_result() {
        let json = r#"{"local": {"file_|-x_|-x_|-directory":
            {"result": false, "comment": "User nobody2 is not available"}}}"#;
        let outcome = state_outcome(&output(json, false));
        assert!(!outcome.success);
        assert_eq!(outcome.message_or_empty(), "User nobody2 is not available");
    }

    #[test]
    fn test_state_outcome_error_list() {
        let json = r#"{"local": ["Specified SLS not found", "second"]}"#;
        let outcome = state_outcome(&output(json, false));
        assert!(!outcome.success);
        assert_eq!(outcome.message_or_empty(), "Specified SLS not found; second");
    }

    #[test]
    fn test_state_outcome_garbage() {
        let outcome = state_outcome(&output("Traceback (most recent call last)", false));
        assert!(!outcome.success);
        assert!(outcome.message_or_empty().contains("exit code 2"));
    }

    #[test]
    fn test_probe_missing_binary() {
        let agent = SaltAgent::new("/nonexistent/bin/salt-call-12345", "/tmp");
        let err = agent.probe().unwrap_err();
        match err {
            RobotError::AgentUnavailable { agent, guidance, .. } => {
                assert_eq!(agent, "salt");
                assert_eq!(guidance, SALT_GUIDANCE);
            }
            other => panic!("expected AgentUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_primitives_with_missing_binary_fail_softly() {
        let agent = SaltAgent::new("/nonexistent/bin/salt-call-12345", "/tmp");
        let outcome = agent.ensure_directory(Path::new("config"), None, true);
        assert!(!outcome.success);
        assert!(outcome.message_or_empty().contains("failed to spawn"));
        assert!(!agent.run_shell("true").success);
    }
}
