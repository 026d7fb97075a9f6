//! Error types for the decision core.
//!
//! Selection failures are not errors: selectors return
//! [`UnitTypeId::NONE`](crate::unit_kind::UnitTypeId::NONE) and callers retry
//! later. The variants here cover IO, persistence and lifecycle misuse.

use thiserror::Error;

use crate::config::ConfigError;
use crate::learning::LearningError;
use crate::statistics::StatisticsError;

/// Result type alias using [`AiError`].
pub type Result<T> = std::result::Result<T, AiError>;

/// Top-level error type for the decision core.
#[derive(Debug, Error)]
pub enum AiError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Learned data could not be loaded or saved.
    #[error(transparent)]
    Learning(#[from] LearningError),

    /// A statistical profile was misused.
    #[error(transparent)]
    Statistics(#[from] StatisticsError),

    /// Unit definition data is inconsistent.
    #[error("Failed to parse unit roster '{path}': {message}")]
    RosterParse {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// A unit type identifier is outside the registry.
    #[error("Invalid unit type ID: {0}")]
    InvalidUnitType(u16),

    /// A task handle no longer refers to a live task.
    #[error("Task not found: {0}")]
    TaskNotFound(u32),

    /// A unit handle is not tracked by this agent.
    #[error("Unit not found: {0}")]
    UnitNotFound(u32),

    /// Invalid lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
