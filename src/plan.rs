//! Typed description of one maintenance cycle.
//!
//! A `MaintenancePlan` holds the three actions in execution order:
//! - `DirectorySpec` list for directory enforcement
//! - `WhitespacePrune` for the `.adoc` cleanup command
//! - `PermissionTarget` for the entry-point mode
//!
//! The runner only ever executes a plan; building one never touches the
//! filesystem.

use std::fmt;
use std::path::PathBuf;

use crate::config::RobotConfig;
use crate::types::FileMode;

/// Directories every checkout is expected to carry, in enforcement order.
pub const DEFAULT_DIRECTORIES: &[&str] = &["dist/installers", "config", "container", "scripts"];

/// Documentation files whose trailing whitespace is pruned.
pub const DEFAULT_DOC_EXTENSION: &str = "adoc";

/// Entry-point script that must stay executable.
pub const DEFAULT_ENTRY_POINT: &str = "just";

/// A directory that must exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySpec {
    /// Path relative to the working directory.
    pub path: PathBuf,
    /// Owning user; `None` leaves ownership to the agent's default.
    pub owner: Option<String>,
    /// Create intermediate components. Always true for the standard plan.
    pub recursive: bool,
}

impl DirectorySpec {
    pub fn new(path: impl Into<PathBuf>, owner: Option<String>) -> Self {
        Self {
            path: path.into(),
            owner,
            recursive: true,
        }
    }
}

/// Strip trailing spaces and tabs from every `*.<extension>` file below the
/// working directory, in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitespacePrune {
    /// File extension without the dot. Must match `[A-Za-z0-9_]+`.
    pub extension: String,
}

impl WhitespacePrune {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// The single shell command handed to the agent.
    ///
    /// The bracket expression holds a literal space and a literal tab.
    pub fn to_shell_command(&self) -> String {
        format!(
            "find . -name '*.{}' -type f -exec sed -i 's/[ \t]*$//' {{}} +",
            self.extension
        )
    }
}

impl Default for WhitespacePrune {
    fn default() -> Self {
        Self::new(DEFAULT_DOC_EXTENSION)
    }
}

/// File whose mode bits are enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTarget {
    pub path: PathBuf,
    pub mode: FileMode,
}

impl Default for PermissionTarget {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_ENTRY_POINT),
            mode: FileMode::EXECUTABLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenancePlan {
    pub directories: Vec<DirectorySpec>,
    pub prune: WhitespacePrune,
    pub permissions: PermissionTarget,
}

impl MaintenancePlan {
    /// The fixed cycle: four directories, `.adoc` pruning, `just` at 0755.
    pub fn standard(owner: Option<String>) -> Self {
        Self {
            directories: DEFAULT_DIRECTORIES
                .iter()
                .map(|d| DirectorySpec::new(*d, owner.clone()))
                .collect(),
            prune: WhitespacePrune::default(),
            permissions: PermissionTarget::default(),
        }
    }

    /// Build a plan from a validated configuration.
    pub fn from_config(config: &RobotConfig, owner: Option<String>) -> Self {
        Self {
            directories: config
                .directories
                .iter()
                .map(|d| DirectorySpec::new(d, owner.clone()))
                .collect(),
            prune: WhitespacePrune::new(config.doc_extension.clone()),
            permissions: PermissionTarget {
                path: config.entry_point.clone(),
                mode: config.entry_point_mode,
            },
        }
    }
}

impl fmt::Display for MaintenancePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "1. Ensure directories:")?;
        for dir in &self.directories {
            match &dir.owner {
                Some(owner) => writeln!(f, "     {} (owner {})", dir.path.display(), owner)?,
                None => writeln!(f, "     {}", dir.path.display())?,
            }
        }
        writeln!(f, "2. Prune trailing whitespace in .{} files:", self.prune.extension)?;
        writeln!(f, "     {}", self.prune.to_shell_command())?;
        writeln!(f, "3. Set mode:")?;
        write!(
            f,
            "     {} {}",
            self.permissions.mode,
            self.permissions.path.display()
        )
    }
}
