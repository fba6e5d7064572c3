//! The step runner.
//!
//! Walks no further than one step at a time: resolves the step's input
//! references, dispatches through the registry, and records the outcome.
//! `execute_step` never returns an error: tool failures, missing tools, and
//! timeouts are all degraded into failure results so the orchestrator and
//! monitor can decide what happens next.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use orchid_core::{PlannedStep, StepExecutionResult, StepStatus, TaskContext};

use crate::registry::ToolRegistry;
use crate::resolve::resolve_inputs;

/// Step runner configuration.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Deadline raced against every tool invocation. `None` disables the
    /// timeout.
    pub step_timeout: Option<Duration>,
}

/// Executes planned steps through the tool registry.
pub struct StepRunner {
    registry: Arc<ToolRegistry>,
    config: RunnerConfig,
}

impl StepRunner {
    /// Create a runner over a registry with default configuration.
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            config: RunnerConfig::default(),
        }
    }

    /// Create a runner with custom configuration.
    pub fn with_config(registry: Arc<ToolRegistry>, config: RunnerConfig) -> Self {
        Self { registry, config }
    }

    /// Number of tools available to this runner.
    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }

    /// Execute one step. Never raises: any tool error becomes a
    /// `failure` result carrying the error and measured duration.
    ///
    /// Retry is enforced here per the step's declared policy; only the
    /// final attempt's result is recorded, with the attempt count in the
    /// result metadata.
    pub async fn execute_step(
        &self,
        step: &PlannedStep,
        context: &TaskContext,
    ) -> StepExecutionResult {
        let tool = match self.registry.resolve(&step.tool_id) {
            Some(tool) => tool,
            None => {
                warn!(step = %step.step_id, tool = %step.tool_id, "no tool found");
                return StepExecutionResult::failure(
                    &step.step_id,
                    format!("no tool found for '{}'", step.tool_id),
                );
            }
        };

        let resolved = resolve_inputs(step, context);
        if !resolved.missing_names().is_empty() {
            debug!(
                step = %step.step_id,
                missing = ?resolved.missing_names(),
                "executing with missing inputs"
            );
        }

        let max_attempts = step.retry.map(|r| r.max_attempts.max(1)).unwrap_or(1);
        let backoff = step
            .retry
            .map(|r| Duration::from_millis(r.backoff_ms))
            .unwrap_or(Duration::ZERO);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let started = Instant::now();

            let outcome = match self.config.step_timeout {
                Some(deadline) => match timeout(deadline, tool.execute(step, &resolved, context)).await {
                    Ok(result) => result,
                    Err(_) => Err(orchid_core::OrchidError::Timeout {
                        step_id: step.step_id.clone(),
                        duration_ms: deadline.as_millis() as u64,
                    }),
                },
                None => tool.execute(step, &resolved, context).await,
            };

            let duration_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(output) => {
                    return StepExecutionResult {
                        step_id: step.step_id.clone(),
                        status: StepStatus::Success,
                        outputs: output.outputs,
                        error: None,
                        duration_ms,
                        token_usage: output.token_usage,
                        attempts: attempt,
                    };
                }
                Err(err) if attempt < max_attempts => {
                    warn!(
                        step = %step.step_id,
                        attempt,
                        error = %err,
                        "step attempt failed, retrying"
                    );
                    if !backoff.is_zero() {
                        sleep(backoff).await;
                    }
                }
                Err(err) => {
                    warn!(step = %step.step_id, attempt, error = %err, "step failed");
                    return StepExecutionResult {
                        step_id: step.step_id.clone(),
                        status: StepStatus::Failure,
                        outputs: Default::default(),
                        error: Some(err.to_string()),
                        duration_ms,
                        token_usage: 0,
                        attempts: attempt,
                    };
                }
            }
        }
    }
}
