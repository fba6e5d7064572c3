//! Built-in tools.
//!
//! One tool per step category. The current bodies are deterministic
//! in-process placeholders for external services (market APIs, model
//! endpoints); the chain-backed tool goes through the [`ChainClient`]
//! collaborator. Each tool fills the step's declared `expected_outputs`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use orchid_core::{OrchidError, PlannedStep, Result, RiskLevel, TaskContext};

use crate::chain::ChainClient;
use crate::resolve::ResolvedInputs;
use crate::tool::{StepOutput, Tool, ToolKind};

fn fill_expected(step: &PlannedStep, default_key: &str, payload: Value) -> BTreeMap<String, Value> {
    let mut outputs = BTreeMap::new();
    if step.expected_outputs.is_empty() {
        outputs.insert(default_key.to_string(), payload);
    } else {
        for key in &step.expected_outputs {
            outputs.insert(key.clone(), payload.clone());
        }
    }
    outputs
}

/// External data retrieval (`api_call`).
#[derive(Debug, Clone, Default)]
pub struct ApiCallTool;

#[async_trait]
impl Tool for ApiCallTool {
    fn id(&self) -> &str {
        "api_call"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::ApiCall
    }

    async fn execute(
        &self,
        step: &PlannedStep,
        inputs: &ResolvedInputs,
        _context: &TaskContext,
    ) -> Result<StepOutput> {
        let payload = json!({
            "query": inputs.get("query").cloned().unwrap_or(Value::Null),
            "token": inputs.get("token").cloned().unwrap_or(Value::Null),
            "source": "market_api",
            "fetchedAt": Utc::now().to_rfc3339(),
        });

        Ok(StepOutput {
            outputs: fill_expected(step, "apiData", payload),
            token_usage: 0,
        })
    }
}

/// Chain interaction (`solana_transaction`).
pub struct SolanaTransactionTool {
    chain: Arc<dyn ChainClient>,
}

impl SolanaTransactionTool {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl Tool for SolanaTransactionTool {
    fn id(&self) -> &str {
        "solana_transaction"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::SolanaTransaction
    }

    async fn execute(
        &self,
        step: &PlannedStep,
        inputs: &ResolvedInputs,
        _context: &TaskContext,
    ) -> Result<StepOutput> {
        let params = inputs.get("params").ok_or_else(|| OrchidError::ToolExecution {
            tool_id: self.id().to_string(),
            step_id: step.step_id.clone(),
            message: inputs
                .missing_reason("params")
                .unwrap_or("missing input 'params'")
                .to_string(),
        })?;

        let signers: Vec<String> = inputs
            .get("signers")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        let signature = self
            .chain
            .submit_transaction(params, &signers)
            .await
            .map_err(|e| OrchidError::ToolExecution {
                tool_id: self.id().to_string(),
                step_id: step.step_id.clone(),
                message: e.to_string(),
            })?;

        let status = self.chain.network_status().await.ok();

        let mut outputs = BTreeMap::new();
        outputs.insert("signature".to_string(), json!(signature));
        outputs.insert(
            "confirmation".to_string(),
            json!({
                "confirmed": true,
                "slot": status.map(|s| s.slot),
            }),
        );
        Ok(StepOutput {
            outputs,
            token_usage: 0,
        })
    }
}

/// Model invocation (`ai_analysis`).
///
/// Output values are synthesized deterministically from the resolved inputs;
/// the risk rating comes from the configured default unless the task inputs
/// carry a `riskOverride`.
#[derive(Debug, Clone)]
pub struct AiAnalysisTool {
    default_risk: RiskLevel,
}

impl Default for AiAnalysisTool {
    fn default() -> Self {
        Self {
            default_risk: RiskLevel::Low,
        }
    }
}

impl AiAnalysisTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_risk(default_risk: RiskLevel) -> Self {
        Self { default_risk }
    }

    fn risk_for(&self, context: &TaskContext) -> RiskLevel {
        context
            .inputs
            .get("riskOverride")
            .and_then(Value::as_str)
            .map(RiskLevel::parse)
            .unwrap_or(self.default_risk)
    }
}

#[async_trait]
impl Tool for AiAnalysisTool {
    fn id(&self) -> &str {
        "ai_analysis"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::AiAnalysis
    }

    async fn execute(
        &self,
        step: &PlannedStep,
        inputs: &ResolvedInputs,
        context: &TaskContext,
    ) -> Result<StepOutput> {
        let subject = inputs
            .get_str("request")
            .or_else(|| inputs.get_str("query"))
            .unwrap_or("task data")
            .to_string();

        // Rough token accounting: input payload size plus a fixed prompt.
        let input_chars: usize = inputs
            .values()
            .values()
            .map(|v| v.to_string().len())
            .sum();
        let token_usage = (input_chars / 4 + 50) as u64;

        let mut outputs = BTreeMap::new();
        for key in &step.expected_outputs {
            let value = match key.as_str() {
                "risk" => {
                    let risk = self.risk_for(context);
                    json!(format!("{:?}", risk).to_lowercase())
                }
                "transactionParams" => json!({
                    "instructions": [{"program": "system", "action": "transfer"}],
                    "derivedFrom": subject,
                }),
                "metrics" => json!({"dataPoints": inputs.values().len(), "coverage": 1.0}),
                other => json!(format!("{} for '{}'", other, subject)),
            };
            outputs.insert(key.clone(), value);
        }

        Ok(StepOutput {
            outputs,
            token_usage,
        })
    }
}

/// In-process data shaping (`data_transformation`).
#[derive(Debug, Clone, Default)]
pub struct DataTransformationTool;

#[async_trait]
impl Tool for DataTransformationTool {
    fn id(&self) -> &str {
        "data_transformation"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::DataTransformation
    }

    async fn execute(
        &self,
        step: &PlannedStep,
        inputs: &ResolvedInputs,
        _context: &TaskContext,
    ) -> Result<StepOutput> {
        let data = inputs.get("data").ok_or_else(|| OrchidError::ToolExecution {
            tool_id: self.id().to_string(),
            step_id: step.step_id.clone(),
            message: inputs
                .missing_reason("data")
                .unwrap_or("missing input 'data'")
                .to_string(),
        })?;

        let mut outputs = BTreeMap::new();
        for key in &step.expected_outputs {
            let value = match key.as_str() {
                "processedData" => json!({"normalized": data}),
                "trends" => json!([]),
                _ => data.clone(),
            };
            outputs.insert(key.clone(), value);
        }
        if outputs.is_empty() {
            outputs.insert("processedData".to_string(), json!({"normalized": data}));
        }

        Ok(StepOutput {
            outputs,
            token_usage: 0,
        })
    }
}

/// Boolean gate (`conditional`).
///
/// Modes: `risk_below` compares ordered risk levels (`low < medium < high`);
/// `equals` compares the value with the threshold string. A missing value is
/// a missing-input condition and evaluates to unmet, never a crash.
#[derive(Debug, Clone, Default)]
pub struct ConditionalTool;

#[async_trait]
impl Tool for ConditionalTool {
    fn id(&self) -> &str {
        "conditional"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Conditional
    }

    async fn execute(
        &self,
        _step: &PlannedStep,
        inputs: &ResolvedInputs,
        _context: &TaskContext,
    ) -> Result<StepOutput> {
        let threshold = inputs.get_str("threshold").unwrap_or("high");
        let mode = inputs.get_str("mode").unwrap_or("equals");

        let condition_met = match inputs.get("value") {
            None => false,
            Some(value) => match mode {
                "risk_below" => {
                    let rating = value.as_str().map(RiskLevel::parse).unwrap_or(RiskLevel::High);
                    rating < RiskLevel::parse(threshold)
                }
                _ => value.as_str() == Some(threshold),
            },
        };

        let mut outputs = BTreeMap::new();
        outputs.insert("conditionMet".to_string(), json!(condition_met));
        outputs.insert(
            "value".to_string(),
            inputs.get("value").cloned().unwrap_or(Value::Null),
        );
        outputs.insert("threshold".to_string(), json!(threshold));

        Ok(StepOutput {
            outputs,
            token_usage: 0,
        })
    }
}

/// Environment snapshot projection (`environment_sensing`).
///
/// The orchestrator senses the environment before planning; this tool
/// projects that snapshot into step outputs so later steps can reference it
/// through `previous_step` sources. When no snapshot exists it emits a
/// degraded payload rather than failing.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentSensingTool;

#[async_trait]
impl Tool for EnvironmentSensingTool {
    fn id(&self) -> &str {
        "environment_sensing"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::EnvironmentSensing
    }

    async fn execute(
        &self,
        step: &PlannedStep,
        _inputs: &ResolvedInputs,
        context: &TaskContext,
    ) -> Result<StepOutput> {
        let payload = if context.environment.is_null() {
            json!({
                "timestamp": Utc::now().to_rfc3339(),
                "error": true,
                "errorMessage": "environment unavailable",
            })
        } else {
            context.environment.clone()
        };

        Ok(StepOutput {
            outputs: fill_expected(step, "environmentData", payload),
            token_usage: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::InProcessChainClient;
    use crate::resolve::resolve_inputs;
    use orchid_core::InputValue;

    fn context() -> TaskContext {
        TaskContext::new("user-1", BTreeMap::new())
    }

    #[tokio::test]
    async fn test_api_call_fills_expected_outputs() {
        let tool = ApiCallTool;
        let step = PlannedStep::new("step_2", "api_call")
            .with_input("query", InputValue::literal("price of SOL"))
            .with_outputs(&["apiData"]);
        let ctx = context();
        let resolved = resolve_inputs(&step, &ctx);

        let output = tool.execute(&step, &resolved, &ctx).await.unwrap();
        assert_eq!(output.outputs["apiData"]["query"], json!("price of SOL"));
    }

    #[tokio::test]
    async fn test_transaction_tool_requires_params() {
        let tool = SolanaTransactionTool::new(InProcessChainClient::shared());
        let step = PlannedStep::new("step_4", "solana_transaction")
            .with_input("params", InputValue::step_output("never_ran", "transactionParams"));
        let ctx = context();
        let resolved = resolve_inputs(&step, &ctx);

        let err = tool.execute(&step, &resolved, &ctx).await.unwrap_err();
        assert!(matches!(err, OrchidError::ToolExecution { .. }));
        assert!(err.to_string().contains("never_ran"));
    }

    #[tokio::test]
    async fn test_transaction_tool_submits_and_reports_signature() {
        let chain = InProcessChainClient::shared();
        let tool = SolanaTransactionTool::new(chain.clone());
        let step = PlannedStep::new("step_4", "solana_transaction")
            .with_input("params", InputValue::literal(json!({"instructions": []})));
        let ctx = context();
        let resolved = resolve_inputs(&step, &ctx);

        let output = tool.execute(&step, &resolved, &ctx).await.unwrap();
        assert!(output.outputs["signature"].as_str().unwrap().starts_with("sig_"));
        assert_eq!(chain.submitted_signatures().await.len(), 1);
    }

    #[tokio::test]
    async fn test_ai_analysis_tracks_tokens_and_risk() {
        let tool = AiAnalysisTool::new();
        let step = PlannedStep::new("step_2", "ai_analysis")
            .with_input("request", InputValue::literal("send 5 SOL"))
            .with_outputs(&["transactionParams", "risk"]);
        let ctx = context();
        let resolved = resolve_inputs(&step, &ctx);

        let output = tool.execute(&step, &resolved, &ctx).await.unwrap();
        assert_eq!(output.outputs["risk"], json!("low"));
        assert!(output.outputs["transactionParams"]["instructions"].is_array());
        assert!(output.token_usage > 0);
    }

    #[tokio::test]
    async fn test_ai_analysis_honors_risk_override() {
        let tool = AiAnalysisTool::new();
        let step = PlannedStep::new("step_2", "ai_analysis").with_outputs(&["risk"]);
        let mut inputs = BTreeMap::new();
        inputs.insert("riskOverride".to_string(), json!("high"));
        let ctx = TaskContext::new("user-1", inputs);
        let resolved = resolve_inputs(&step, &ctx);

        let output = tool.execute(&step, &resolved, &ctx).await.unwrap();
        assert_eq!(output.outputs["risk"], json!("high"));
    }

    #[tokio::test]
    async fn test_transform_fails_cleanly_on_missing_data() {
        let tool = DataTransformationTool;
        let step = PlannedStep::new("step_3", "data_transformation")
            .with_input("data", InputValue::step_output("skipped_step", "apiData"))
            .with_outputs(&["processedData", "trends"]);
        let ctx = context();
        let resolved = resolve_inputs(&step, &ctx);

        let err = tool.execute(&step, &resolved, &ctx).await.unwrap_err();
        assert!(err.to_string().contains("skipped_step"));
    }

    #[tokio::test]
    async fn test_conditional_risk_below() {
        let tool = ConditionalTool;
        let ctx = context();

        let step = PlannedStep::new("step_3", "conditional")
            .with_input("value", InputValue::literal("low"))
            .with_input("threshold", InputValue::literal("high"))
            .with_input("mode", InputValue::literal("risk_below"));
        let resolved = resolve_inputs(&step, &ctx);
        let output = tool.execute(&step, &resolved, &ctx).await.unwrap();
        assert_eq!(output.outputs["conditionMet"], json!(true));

        let step = PlannedStep::new("step_3", "conditional")
            .with_input("value", InputValue::literal("high"))
            .with_input("threshold", InputValue::literal("high"))
            .with_input("mode", InputValue::literal("risk_below"));
        let resolved = resolve_inputs(&step, &ctx);
        let output = tool.execute(&step, &resolved, &ctx).await.unwrap();
        assert_eq!(output.outputs["conditionMet"], json!(false));
    }

    #[tokio::test]
    async fn test_conditional_missing_value_is_unmet() {
        let tool = ConditionalTool;
        let ctx = context();
        let step = PlannedStep::new("step_3", "conditional")
            .with_input("value", InputValue::step_output("never_ran", "risk"))
            .with_input("mode", InputValue::literal("risk_below"));
        let resolved = resolve_inputs(&step, &ctx);

        let output = tool.execute(&step, &resolved, &ctx).await.unwrap();
        assert_eq!(output.outputs["conditionMet"], json!(false));
    }

    #[tokio::test]
    async fn test_sensing_projects_environment_or_degrades() {
        let tool = EnvironmentSensingTool;
        let step = PlannedStep::new("step_1_env_sensing", "environment_sensing")
            .with_outputs(&["environmentData"]);

        let mut ctx = context();
        ctx.environment = json!({"network": "mainnet-beta"});
        let resolved = resolve_inputs(&step, &ctx);
        let output = tool.execute(&step, &resolved, &ctx).await.unwrap();
        assert_eq!(output.outputs["environmentData"]["network"], json!("mainnet-beta"));

        let ctx = context();
        let resolved = resolve_inputs(&step, &ctx);
        let output = tool.execute(&step, &resolved, &ctx).await.unwrap();
        assert_eq!(output.outputs["environmentData"]["error"], json!(true));
    }
}
