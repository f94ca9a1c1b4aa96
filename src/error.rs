//! Error handling module for the maintenance robot
//!
//! Provides the library error type using thiserror. Only agent
//! unavailability is fatal to a maintenance cycle; everything else is
//! reported per action through `ActionOutcome`.

use thiserror::Error;

/// Main error type for the maintenance robot
#[derive(Error, Debug)]
pub enum RobotError {
    /// Validation errors (modes, extensions, paths)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Execution agent could not be located or initialized
    #[error("{agent} agent unavailable: {reason}")]
    AgentUnavailable {
        /// Agent name (`salt`, `local`)
        agent: String,
        /// What the probe observed
        reason: String,
        /// Message shown to the operator on the fatal path
        guidance: String,
    },
}

/// Result type alias for robot operations
pub type Result<T> = std::result::Result<T, RobotError>;

impl RobotError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an agent-unavailable error
    pub fn agent_unavailable(
        agent: impl Into<String>,
        reason: impl Into<String>,
        guidance: impl Into<String>,
    ) -> Self {
        Self::AgentUnavailable {
            agent: agent.into(),
            reason: reason.into(),
            guidance: guidance.into(),
        }
    }

    /// True for the single fatal condition of a maintenance cycle
    pub fn is_agent_unavailable(&self) -> bool {
        matches!(self, Self::AgentUnavailable { .. })
    }
}
