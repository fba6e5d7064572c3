//! Execution result and task context types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::{StepStatus, TaskStatus};

/// Result of one executed step. Produced exactly once per executed step;
/// skipped steps produce no result entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecutionResult {
    /// Id of the executed step.
    pub step_id: String,

    /// Outcome of the execution.
    pub status: StepStatus,

    /// Outputs produced by the tool, keyed by output name.
    #[serde(default)]
    pub outputs: BTreeMap<String, Value>,

    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock duration of the final attempt in milliseconds.
    pub duration_ms: u64,

    /// Model tokens consumed by the step.
    #[serde(default)]
    pub token_usage: u64,

    /// Number of attempts made, including the first.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

fn default_attempts() -> u32 {
    1
}

impl StepExecutionResult {
    /// Build a success result.
    pub fn success(step_id: impl Into<String>, outputs: BTreeMap<String, Value>) -> Self {
        Self {
            step_id: step_id.into(),
            status: StepStatus::Success,
            outputs,
            error: None,
            duration_ms: 0,
            token_usage: 0,
            attempts: 1,
        }
    }

    /// Build a failure result with the given error message.
    pub fn failure(step_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            status: StepStatus::Failure,
            outputs: BTreeMap::new(),
            error: Some(error.into()),
            duration_ms: 0,
            token_usage: 0,
            attempts: 1,
        }
    }

    /// Returns true if the step succeeded.
    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Mutable state threaded through one task run.
///
/// Exclusively owned by one task execution; never shared across concurrent
/// tasks. `history` is append-only and ordered by actual execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskContext {
    pub task_id: Uuid,
    pub user_id: String,

    /// The task's original user inputs.
    pub inputs: BTreeMap<String, Value>,

    /// Sensed environment snapshot.
    #[serde(default)]
    pub environment: Value,

    /// Results of executed steps, in execution order.
    #[serde(default)]
    pub history: Vec<StepExecutionResult>,

    pub start_time: DateTime<Utc>,
}

impl TaskContext {
    /// Create a fresh context for a new task run.
    pub fn new(user_id: impl Into<String>, inputs: BTreeMap<String, Value>) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            user_id: user_id.into(),
            inputs,
            environment: Value::Null,
            history: Vec::new(),
            start_time: Utc::now(),
        }
    }

    /// Find the result of an executed step by id.
    pub fn step_result(&self, step_id: &str) -> Option<&StepExecutionResult> {
        self.history.iter().find(|r| r.step_id == step_id)
    }

    /// Append a step result to the history.
    pub fn record(&mut self, result: StepExecutionResult) {
        self.history.push(result);
    }

    /// Total model tokens consumed so far.
    pub fn total_token_usage(&self) -> u64 {
        self.history.iter().map(|r| r.token_usage).sum()
    }
}

/// Resource accounting reported in task metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub token_usage: u64,
    pub steps_executed: usize,
    pub steps_failed: usize,
}

/// Metadata attached to a terminal task result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Total wall-clock execution time in milliseconds.
    pub execution_time_ms: u64,

    /// Aggregate resource usage.
    pub resource_usage: ResourceUsage,

    /// Proof id from the chain collaborator, when submission succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_chain_verification: Option<String>,

    /// Proof-submission failure, reported rather than raised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_error: Option<String>,

    /// Result-persistence failure, reported rather than raised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
}

/// Terminal artifact of a task run. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: Uuid,
    pub status: TaskStatus,

    /// Outputs of the last executed step (last-writer-wins at task level).
    #[serde(default)]
    pub outputs: BTreeMap<String, Value>,

    /// Error message when the task failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub metadata: TaskMetadata,
}
