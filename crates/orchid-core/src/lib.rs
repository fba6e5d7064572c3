//! # Orchid Core
//!
//! Core data model and error types for the Orchid engine.
//!
//! This crate provides the fundamental building blocks:
//! - [`Intent`] - Structured representation of a user's request
//! - [`TaskTemplate`] - Declarative, versioned multi-step task definition
//! - [`PlannedStep`] - One unit of work with typed input bindings
//! - [`TaskResult`] - Terminal artifact of a task run
//! - [`ExecutionProof`] - Verifiable digest over a run's step history
//! - [`OrchidError`] - Engine error taxonomy

pub mod error;
pub mod intent;
pub mod plan;
pub mod proof;
pub mod result;
pub mod template;
pub mod types;

// Re-exports for convenience
pub use error::{OrchidError, Result};
pub use intent::{Entity, Intent};
pub use plan::{InputValue, PlannedStep, SourceRef, StepCondition};
pub use proof::ExecutionProof;
pub use result::{ResourceUsage, StepExecutionResult, TaskContext, TaskMetadata, TaskResult};
pub use template::{
    InputDefinition, OutputDefinition, PermissionRequest, RetryPolicy, StepDefinition,
    TaskTemplate, TemplateCategory,
};
pub use types::{IntentKind, RiskLevel, StepStatus, TaskPhase, TaskStatus};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{OrchidError, Result};
    pub use crate::intent::{Entity, Intent};
    pub use crate::plan::{InputValue, PlannedStep, SourceRef, StepCondition};
    pub use crate::result::{StepExecutionResult, TaskContext, TaskResult};
    pub use crate::template::{InputDefinition, StepDefinition, TaskTemplate, TemplateCategory};
    pub use crate::types::{IntentKind, RiskLevel, StepStatus, TaskPhase, TaskStatus};
}
