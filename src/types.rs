//! Typed configuration values for the maintenance robot
//!
//! Replaces stringly-typed agent names and permission modes with enums and
//! newtypes that validate on parse.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

use crate::error::RobotError;

/// Which execution agent carries out the maintenance primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AgentKind {
    /// SaltStack in masterless mode (`salt-call --local`)
    #[default]
    Salt,
    /// Native filesystem primitives and `sh -c`
    Local,
}

/// Unix permission bits, parsed from octal notation (`"0755"`, `"755"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileMode(u32);

impl FileMode {
    /// Highest representable mode (setuid, setgid, sticky + rwx for all)
    pub const MAX: u32 = 0o7777;

    /// `rwxr-xr-x`, the mode applied to the entry-point script
    pub const EXECUTABLE: FileMode = FileMode(0o755);

    pub fn new(bits: u32) -> Result<Self, RobotError> {
        if bits > Self::MAX {
            return Err(RobotError::validation(format!(
                "mode {:o} exceeds {:o}",
                bits,
                Self::MAX
            )));
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl Default for FileMode {
    fn default() -> Self {
        Self::EXECUTABLE
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

impl FromStr for FileMode {
    type Err = RobotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        let digits = digits.strip_prefix("0o").unwrap_or(digits);
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(8)) {
            return Err(RobotError::validation(format!(
                "'{}' is not an octal file mode",
                s
            )));
        }
        let bits = u32::from_str_radix(digits, 8)
            .map_err(|e| RobotError::validation(format!("'{}': {}", s, e)))?;
        Self::new(bits)
    }
}

impl TryFrom<String> for FileMode {
    type Error = RobotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FileMode> for String {
    fn from(mode: FileMode) -> Self {
        mode.to_string()
    }
}
