//! Task orchestration.
//!
//! The composition root for one task lifecycle:
//! parsing -> sensing -> planning -> per-step execution with monitoring ->
//! result aggregation. Parsing, sensing, and planning failures abort the
//! task; individual step failures are recorded in history and left to the
//! monitor.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use orchid_core::{
    ExecutionProof, OrchidError, PlannedStep, ResourceUsage, StepCondition, StepStatus,
    TaskContext, TaskMetadata, TaskPhase, TaskResult, TaskStatus, TaskTemplate, TemplateCategory,
};
use orchid_planner::{IntentParser, ParseOptions, Planner, PlanningTemplate};
use orchid_state::ResultStore;
use orchid_tools::{ChainClient, RunnerConfig, StepRunner, ToolRegistry};

use crate::environment::EnvironmentSensor;
use crate::monitor::{DefaultMonitor, ExecutionMonitor};

/// Ties parsing, sensing, planning, execution, and monitoring into one task
/// lifecycle. Owns the registry and collaborator handles; each `run_task`
/// call owns its own [`TaskContext`], so concurrent tasks never share
/// mutable state.
pub struct TaskOrchestrator {
    parser: IntentParser,
    planner: Planner,
    runner: StepRunner,
    monitor: Box<dyn ExecutionMonitor>,
    sensor: Arc<dyn EnvironmentSensor>,
    chain: Arc<dyn ChainClient>,
    results: Arc<dyn ResultStore>,
}

impl TaskOrchestrator {
    /// Compose an orchestrator. The registry is consumed here: registration
    /// happens before construction, runtime execution only reads it.
    pub fn new(
        planner: Planner,
        registry: ToolRegistry,
        sensor: Arc<dyn EnvironmentSensor>,
        chain: Arc<dyn ChainClient>,
        results: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            parser: IntentParser::new(),
            planner,
            runner: StepRunner::new(Arc::new(registry)),
            monitor: Box::new(DefaultMonitor::new()),
            sensor,
            chain,
            results,
        }
    }

    /// Replace the intent parser.
    pub fn with_parser(mut self, parser: IntentParser) -> Self {
        self.parser = parser;
        self
    }

    /// Replace the execution monitor.
    pub fn with_monitor(mut self, monitor: Box<dyn ExecutionMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Replace the step runner (e.g. to set a step timeout).
    pub fn with_runner_config(mut self, registry: ToolRegistry, config: RunnerConfig) -> Self {
        self.runner = StepRunner::with_config(Arc::new(registry), config);
        self
    }

    /// Register a planning template at runtime, e.g. a stored task
    /// template's declared steps.
    pub fn register_planning_template(&self, template: Box<dyn PlanningTemplate>) {
        self.planner.register_template(template);
    }

    /// Number of tools available to the step runner.
    pub fn tool_count(&self) -> usize {
        self.runner.tool_count()
    }

    /// Number of registered planning templates.
    pub fn planning_template_count(&self) -> usize {
        self.planner.template_count()
    }

    /// A blank template for template-less execution; planning falls through
    /// to dynamic synthesis.
    pub fn adhoc_template() -> TaskTemplate {
        TaskTemplate {
            id: "adhoc".to_string(),
            name: "Ad-hoc task".to_string(),
            version: "1.0.0".to_string(),
            category: TemplateCategory::Other("adhoc".to_string()),
            inputs: vec![],
            outputs: vec![],
            steps: vec![],
            permissions: vec![],
            metadata: BTreeMap::new(),
        }
    }

    /// Run one task end to end. Never returns an error: fatal phases
    /// produce a failure [`TaskResult`].
    pub async fn run_task(
        &self,
        template: &TaskTemplate,
        inputs: BTreeMap<String, Value>,
        user_id: &str,
    ) -> TaskResult {
        let mut context = TaskContext::new(user_id, inputs);
        let task_id = context.task_id;
        info!(task = %task_id, phase = ?TaskPhase::Created, template = %template.id, "task created");

        // created -> parsing
        info!(task = %task_id, phase = ?TaskPhase::Parsing, "parsing intent");
        let options = ParseOptions {
            user_id: user_id.to_string(),
            context: None,
        };
        let intent = match self.parser.parse(&context.inputs, template, &options) {
            Ok(intent) => intent,
            Err(e) => return self.failed(&context, e),
        };

        // parsing -> sensing (infallible: degraded snapshots still proceed)
        info!(task = %task_id, phase = ?TaskPhase::Sensing, "gathering environment data");
        let environment = self.sensor.gather(&intent).await;
        context.environment = serde_json::to_value(&environment).unwrap_or(Value::Null);

        // sensing -> planning
        info!(task = %task_id, phase = ?TaskPhase::Planning, "generating plan");
        let steps = match self.planner.generate_plan(&intent, &context) {
            Ok(steps) => steps,
            Err(e) => return self.failed(&context, e),
        };
        info!(task = %task_id, steps = steps.len(), "plan ready");

        // planning -> executing/monitoring
        self.execute_plan(&mut context, steps).await;

        // -> completed
        self.completed(context).await
    }

    /// Walk the plan in order, skipping steps whose condition is unmet and
    /// splicing in monitor replacements as they arrive.
    async fn execute_plan(&self, context: &mut TaskContext, plan: Vec<PlannedStep>) {
        let mut steps = plan;
        let mut index = 0;

        while index < steps.len() {
            let step = steps[index].clone();

            if let Some(condition) = &step.condition {
                if !condition_met(condition, context) {
                    debug!(
                        task = %context.task_id,
                        step = %step.step_id,
                        source = %condition.source,
                        "condition unmet, skipping step"
                    );
                    index += 1;
                    continue;
                }
            }

            info!(
                task = %context.task_id,
                phase = ?TaskPhase::Executing,
                step = %step.step_id,
                tool = %step.tool_id,
                "executing step"
            );
            let result = self.runner.execute_step(&step, context).await;
            context.record(result.clone());

            info!(
                task = %context.task_id,
                phase = ?TaskPhase::Monitoring,
                step = %step.step_id,
                success = result.is_success(),
                "evaluating step outcome"
            );
            if let Some(replacement) =
                self.monitor.evaluate(&steps[index + 1..], context, &step, &result)
            {
                info!(
                    task = %context.task_id,
                    remaining = replacement.len(),
                    "monitor replaced remaining plan"
                );
                steps.truncate(index + 1);
                steps.extend(replacement);
            }

            index += 1;
        }
    }

    /// Aggregate a completed run: outputs come from the last executed step,
    /// proof submission and result persistence are non-fatal.
    async fn completed(&self, context: TaskContext) -> TaskResult {
        let outputs = context
            .history
            .last()
            .map(|r| r.outputs.clone())
            .unwrap_or_default();

        let mut metadata = TaskMetadata {
            execution_time_ms: (chrono::Utc::now() - context.start_time).num_milliseconds().max(0)
                as u64,
            resource_usage: ResourceUsage {
                token_usage: context.total_token_usage(),
                steps_executed: context.history.len(),
                steps_failed: context
                    .history
                    .iter()
                    .filter(|r| r.status == StepStatus::Failure)
                    .count(),
            },
            on_chain_verification: None,
            proof_error: None,
            storage_error: None,
        };

        let proof = ExecutionProof::from_history(context.task_id, &context.history);
        match self.chain.store_execution_proof(&proof).await {
            Ok(reference) => metadata.on_chain_verification = Some(reference),
            Err(e) => {
                error!(task = %context.task_id, error = %e, "proof submission failed");
                metadata.proof_error = Some(e.to_string());
            }
        }

        let mut result = TaskResult {
            task_id: context.task_id,
            status: TaskStatus::Success,
            outputs,
            error: None,
            metadata,
        };

        if let Err(e) = self.results.store_result(&result).await {
            error!(task = %context.task_id, error = %e, "result persistence failed");
            result.metadata.storage_error = Some(e.to_string());
        }

        info!(task = %context.task_id, phase = ?TaskPhase::Completed, "task completed");
        result
    }

    /// Terminal failure for fatal phases (parsing/planning).
    fn failed(&self, context: &TaskContext, err: OrchidError) -> TaskResult {
        error!(task = %context.task_id, phase = ?TaskPhase::Failed, error = %err, "task failed");
        TaskResult {
            task_id: context.task_id,
            status: TaskStatus::Failure,
            outputs: BTreeMap::new(),
            error: Some(err.to_string()),
            metadata: TaskMetadata {
                execution_time_ms: (chrono::Utc::now() - context.start_time)
                    .num_milliseconds()
                    .max(0) as u64,
                ..Default::default()
            },
        }
    }
}

/// A condition holds only when the referenced step executed and produced
/// the expected value at the key. Unevaluable conditions (source skipped or
/// never ran) are unmet.
fn condition_met(condition: &StepCondition, context: &TaskContext) -> bool {
    context
        .step_result(&condition.source)
        .and_then(|r| r.outputs.get(&condition.key))
        .map(|value| value == &condition.expected)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ChainEnvironmentSensor;
    use orchid_core::StepDefinition;
    use orchid_planner::DeclaredPlan;
    use orchid_state::InMemoryStore;
    use orchid_tools::{builtin_registry, InProcessChainClient};
    use serde_json::json;

    fn orchestrator() -> (TaskOrchestrator, Arc<InProcessChainClient>, Arc<InMemoryStore>) {
        let chain = InProcessChainClient::shared();
        let store = InMemoryStore::shared();
        let registry = builtin_registry(chain.clone());
        let orchestrator = TaskOrchestrator::new(
            Planner::new(),
            registry,
            Arc::new(ChainEnvironmentSensor::new(chain.clone())),
            chain.clone(),
            store.clone(),
        );
        (orchestrator, chain, store)
    }

    fn executed_ids(result_store: &[orchid_core::StepExecutionResult]) -> Vec<&str> {
        result_store.iter().map(|r| r.step_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_query_task_runs_the_full_chain() {
        let (orchestrator, _, store) = orchestrator();
        let template = TaskOrchestrator::adhoc_template();

        let mut inputs = BTreeMap::new();
        inputs.insert("type".to_string(), json!("query"));
        inputs.insert("content".to_string(), json!("price of SOL"));
        inputs.insert(
            "entities".to_string(),
            json!([{"type": "token", "value": "SOL"}]),
        );

        let result = orchestrator.run_task(&template, inputs, "user-1").await;
        assert_eq!(result.status, TaskStatus::Success);
        // Outputs come from the final analysis step.
        assert!(result.outputs.contains_key("analysis"));
        assert!(result.outputs.contains_key("summary"));
        assert_eq!(result.metadata.resource_usage.steps_executed, 4);
        assert!(result.metadata.resource_usage.token_usage > 0);
        assert!(result.metadata.on_chain_verification.is_some());

        // The result was persisted.
        let stored = store.get_result(result.task_id).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_low_risk_transaction_executes_and_reports() {
        let (orchestrator, chain, _) = orchestrator();
        let template = TaskOrchestrator::adhoc_template();

        let mut inputs = BTreeMap::new();
        inputs.insert("type".to_string(), json!("transaction"));
        inputs.insert("content".to_string(), json!("send 5 SOL"));

        let result = orchestrator.run_task(&template, inputs, "user-1").await;
        assert_eq!(result.status, TaskStatus::Success);

        let stored = orchestrator
            .results
            .get_result(result.task_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.task_id, result.task_id);

        // The transaction went through exactly once and the success report
        // ran; the risk report was skipped.
        assert_eq!(chain.submitted_signatures().await.len(), 1);
        assert!(result.outputs.contains_key("report"));
        assert_eq!(result.metadata.resource_usage.steps_executed, 5);
    }

    #[tokio::test]
    async fn test_high_risk_transaction_takes_the_risk_report_branch() {
        let (orchestrator, chain, _) = orchestrator();
        let template = TaskOrchestrator::adhoc_template();

        let mut inputs = BTreeMap::new();
        inputs.insert("type".to_string(), json!("transaction"));
        inputs.insert("content".to_string(), json!("send 500000 SOL"));
        inputs.insert("riskOverride".to_string(), json!("high"));

        let result = orchestrator.run_task(&template, inputs, "user-1").await;
        assert_eq!(result.status, TaskStatus::Success);

        // No transaction was submitted; the risk report produced the
        // terminal outputs and the monitor inserted a mitigation pass.
        assert!(chain.submitted_signatures().await.is_empty());
        assert!(result.outputs.contains_key("report"));
        let history = orchestrator
            .results
            .get_result(result.task_id)
            .await
            .unwrap();
        assert!(history.is_some());
    }

    #[tokio::test]
    async fn test_registered_template_declared_steps_form_the_plan() {
        let (orchestrator, _, _) = orchestrator();

        let template = TaskTemplate {
            id: "declared-fetch".to_string(),
            name: "Declared fetch".to_string(),
            version: "1.0.0".to_string(),
            category: TemplateCategory::Analytics,
            inputs: vec![],
            outputs: vec![],
            steps: vec![StepDefinition {
                id: "declared_step_1".to_string(),
                tool_id: "api_call".to_string(),
                description: String::new(),
                inputs: BTreeMap::new(),
                expected_outputs: vec!["apiData".to_string()],
                condition: None,
                retry: None,
            }],
            permissions: vec![],
            metadata: BTreeMap::new(),
        };
        orchestrator.register_planning_template(Box::new(DeclaredPlan::new(template.clone())));
        assert_eq!(orchestrator.planning_template_count(), 1);

        let mut inputs = BTreeMap::new();
        inputs.insert("content".to_string(), json!("price of SOL"));
        let result = orchestrator.run_task(&template, inputs, "user-1").await;

        // The declared step ran instead of a synthesized plan.
        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.metadata.resource_usage.steps_executed, 1);
        assert!(result.outputs.contains_key("apiData"));
        assert!(!result.outputs.contains_key("analysis"));
    }

    #[tokio::test]
    async fn test_condition_on_never_ran_step_skips() {
        let (orchestrator, _, _) = orchestrator();
        let mut context = TaskContext::new("user-1", BTreeMap::new());

        let steps = vec![
            PlannedStep::new("step_1", "api_call").with_outputs(&["apiData"]),
            PlannedStep::new("step_2", "ai_analysis")
                .with_outputs(&["analysis"])
                .when("step_never_ran", "conditionMet", json!(true)),
        ];

        orchestrator.execute_plan(&mut context, steps).await;
        assert_eq!(executed_ids(&context.history), vec!["step_1"]);
    }

    #[tokio::test]
    async fn test_parse_failure_fails_the_task() {
        let (orchestrator, _, _) = orchestrator();
        let template = TaskOrchestrator::adhoc_template();

        let mut inputs = BTreeMap::new();
        inputs.insert("entities".to_string(), json!("not-an-array"));

        let result = orchestrator.run_task(&template, inputs, "user-1").await;
        assert_eq!(result.status, TaskStatus::Failure);
        assert!(result.error.as_deref().unwrap().contains("parsing failed"));
        assert!(result.outputs.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_kind_fails_before_any_tool_runs() {
        let (orchestrator, chain, _) = orchestrator();
        let template = TaskOrchestrator::adhoc_template();

        let mut inputs = BTreeMap::new();
        inputs.insert("type".to_string(), json!("content"));

        let result = orchestrator.run_task(&template, inputs, "user-1").await;
        assert_eq!(result.status, TaskStatus::Failure);
        assert!(chain.submitted_signatures().await.is_empty());
    }
}
