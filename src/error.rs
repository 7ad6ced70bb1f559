//! Error handling module for buildgate
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Task actions return these; the binary turns them into a message and exit code 1.

use thiserror::Error;

use crate::version::VersionGateError;

/// Main error type for buildgate
#[derive(Error, Debug)]
pub enum BuildGateError {
    /// Runtime version could not be parsed or did not satisfy the policy
    #[error(transparent)]
    Version(#[from] VersionGateError),

    /// Lint runner reported problems
    #[error("{0}")]
    Lint(String),

    /// A test runner failed or a browser was not covered
    #[error("{0}")]
    Tests(String),

    /// External command could not start or exited non-zero
    #[error("{0}")]
    Command(String),

    /// Requested task does not exist
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// Task graph refers back to a task that is still running
    #[error("Dependency cycle detected at task: {0}")]
    Cycle(String),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors (generated directory, lint option file, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for buildgate operations
pub type Result<T> = std::result::Result<T, BuildGateError>;

impl BuildGateError {
    /// Create a lint error
    pub fn lint(msg: impl Into<String>) -> Self {
        Self::Lint(msg.into())
    }

    /// Create a test failure error
    pub fn tests(msg: impl Into<String>) -> Self {
        Self::Tests(msg.into())
    }

    /// Create a command error
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
