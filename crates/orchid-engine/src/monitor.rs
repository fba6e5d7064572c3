//! Execution monitoring.
//!
//! After every executed step the orchestrator asks the monitor whether the
//! remaining plan should change. `None` means continue as planned (the
//! common case); a returned step list replaces the remaining plan wholesale
//! and execution continues from the next index.

use serde_json::Value;
use tracing::{info, warn};

use orchid_core::{InputValue, PlannedStep, RiskLevel, StepExecutionResult, TaskContext};

/// Evaluates whether execution should adapt after a step.
pub trait ExecutionMonitor: Send + Sync {
    /// Inspect a completed step. Returns a replacement for the remaining
    /// steps when adaptation triggers, `None` otherwise.
    fn evaluate(
        &self,
        remaining: &[PlannedStep],
        context: &TaskContext,
        step: &PlannedStep,
        result: &StepExecutionResult,
    ) -> Option<Vec<PlannedStep>>;
}

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Risk ratings above this level trigger a mitigation step.
    pub risk_tolerance: RiskLevel,

    /// Whether step failures reroute the remaining plan around the failed
    /// step's dependents.
    pub reroute_on_failure: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            risk_tolerance: RiskLevel::Medium,
            reroute_on_failure: true,
        }
    }
}

/// Default policy: route around failures, mitigate out-of-tolerance risk.
#[derive(Debug, Clone, Default)]
pub struct DefaultMonitor {
    config: MonitorConfig,
}

impl DefaultMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Drop remaining steps whose inputs reference the failed step. Their
    /// references could only resolve to missing markers.
    fn reroute_around(&self, failed_step_id: &str, remaining: &[PlannedStep]) -> Option<Vec<PlannedStep>> {
        let retained: Vec<PlannedStep> = remaining
            .iter()
            .filter(|s| !s.references_step(failed_step_id))
            .cloned()
            .collect();

        if retained.len() == remaining.len() {
            return None;
        }
        warn!(
            failed = failed_step_id,
            dropped = remaining.len() - retained.len(),
            "rerouting plan around failed step"
        );
        Some(retained)
    }

    /// Prepend a mitigation analysis when a risk rating crosses tolerance.
    fn mitigate_risk(
        &self,
        step: &PlannedStep,
        rating: RiskLevel,
        remaining: &[PlannedStep],
    ) -> Vec<PlannedStep> {
        info!(
            step = %step.step_id,
            rating = ?rating,
            tolerance = ?self.config.risk_tolerance,
            "risk above tolerance, inserting mitigation step"
        );

        let mitigation = PlannedStep::new(format!("mitigation_{}", step.step_id), "ai_analysis")
            .describe("Assess and mitigate elevated risk")
            .with_input("risk", InputValue::step_output(&step.step_id, "risk"))
            .with_outputs(&["mitigation", "summary"]);

        let mut replacement = vec![mitigation];
        replacement.extend(remaining.iter().cloned());
        replacement
    }
}

impl ExecutionMonitor for DefaultMonitor {
    fn evaluate(
        &self,
        remaining: &[PlannedStep],
        _context: &TaskContext,
        step: &PlannedStep,
        result: &StepExecutionResult,
    ) -> Option<Vec<PlannedStep>> {
        if !result.is_success() {
            if self.config.reroute_on_failure {
                return self.reroute_around(&step.step_id, remaining);
            }
            return None;
        }

        if let Some(Value::String(rating)) = result.outputs.get("risk") {
            let rating = RiskLevel::parse(rating);
            if rating > self.config.risk_tolerance {
                return Some(self.mitigate_risk(step, rating, remaining));
            }
        }

        None
    }
}
