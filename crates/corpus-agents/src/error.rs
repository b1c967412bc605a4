//! Error types for agent registration and execution.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Slug failed validation at registration.
    #[error("invalid agent slug '{0}': use letters, numbers, underscores or hyphens")]
    InvalidSlug(String),

    /// The caller supplied arguments the agent cannot use.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The agent ran and failed.
    #[error("agent execution failed: {0}")]
    Execution(String),

    /// A composite permission was built with no inner permissions.
    #[error("composite permission requires at least one inner permission")]
    EmptyComposite,
}
