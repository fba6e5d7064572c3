//! Error types for the Orchid engine.

use thiserror::Error;

/// Main error type for Orchid operations.
#[derive(Error, Debug, Clone)]
pub enum OrchidError {
    /// Intent construction failed while reading inputs or the template.
    #[error("Intent parsing failed: {message}")]
    Parse { message: String },

    /// No registered planning template matched and dynamic planning is off.
    #[error("No plan found for intent {intent_id}: {message}")]
    NoPlanFound { intent_id: String, message: String },

    /// Dynamic planning cannot synthesize steps for this intent kind.
    #[error("Unsupported intent kind for dynamic planning: {kind}")]
    UnsupportedIntentKind { kind: String },

    /// A generated plan exceeds the configured step limit.
    #[error("Plan of {actual} steps exceeds limit of {limit}")]
    PlanTooLarge { actual: usize, limit: usize },

    /// No tool is registered under the requested id or kind.
    #[error("No tool found for '{tool_id}'")]
    ToolNotFound { tool_id: String },

    /// A tool's execute body returned an error.
    #[error("Tool '{tool_id}' failed at step {step_id}: {message}")]
    ToolExecution {
        tool_id: String,
        step_id: String,
        message: String,
    },

    /// A step exceeded its deadline.
    #[error("Step {step_id} timed out after {duration_ms}ms")]
    Timeout { step_id: String, duration_ms: u64 },

    /// Storage collaborator failure (non-fatal to task outcome).
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Chain collaborator failure (non-fatal to task outcome).
    #[error("Chain error: {message}")]
    Chain { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrchidError {
    /// Returns true if this error is recovered into a failure step result
    /// rather than aborting the task.
    pub fn is_step_level(&self) -> bool {
        matches!(
            self,
            OrchidError::ToolNotFound { .. }
                | OrchidError::ToolExecution { .. }
                | OrchidError::Timeout { .. }
        )
    }

    /// Returns true if this error only degrades task metadata.
    pub fn is_collaborator_level(&self) -> bool {
        matches!(self, OrchidError::Storage { .. } | OrchidError::Chain { .. })
    }
}

/// Convenience Result type for Orchid operations.
pub type Result<T> = std::result::Result<T, OrchidError>;

impl From<serde_json::Error> for OrchidError {
    fn from(err: serde_json::Error) -> Self {
        OrchidError::Serialization(err.to_string())
    }
}
