//! Dynamic plan synthesis.
//!
//! When no registered planning template matches an intent, the planner can
//! synthesize a plan from the intent kind alone. Every synthesized plan
//! begins with an environment-sensing step whose output key is
//! `environmentData`; the rest of the chain depends on the kind.

use serde_json::{json, Value};

use orchid_core::{Intent, InputValue, IntentKind, OrchidError, PlannedStep, Result};

/// Id of the environment-sensing step prepended to every dynamic plan.
pub const ENV_SENSING_STEP_ID: &str = "step_1_env_sensing";

/// Risk threshold for dynamically planned transactions.
pub const TRANSACTION_RISK_THRESHOLD: &str = "high";

/// Synthesize a plan for the given intent, or fail with
/// [`OrchidError::UnsupportedIntentKind`].
pub fn synthesize(intent: &Intent) -> Result<Vec<PlannedStep>> {
    match &intent.kind {
        IntentKind::Query => Ok(query_plan(intent)),
        IntentKind::Transaction => Ok(transaction_plan(intent)),
        IntentKind::Analysis => Ok(analysis_plan(intent)),
        other => Err(OrchidError::UnsupportedIntentKind {
            kind: other.as_str().to_string(),
        }),
    }
}

fn sensing_step(intent: &Intent) -> PlannedStep {
    PlannedStep::new(ENV_SENSING_STEP_ID, "environment_sensing")
        .describe("Collect network and market context")
        .with_input("action", InputValue::literal(intent.action.clone()))
        .with_outputs(&["environmentData"])
}

/// query: sensing -> data retrieval -> transformation -> model analysis.
fn query_plan(intent: &Intent) -> Vec<PlannedStep> {
    let mut retrieval = PlannedStep::new("step_2_data_retrieval", "api_call")
        .describe("Fetch data for the query")
        .with_input("query", InputValue::literal(intent.content.clone()))
        .with_input(
            "environment",
            InputValue::step_output(ENV_SENSING_STEP_ID, "environmentData"),
        )
        .with_outputs(&["apiData"]);

    // Bind extracted entity values so the retrieval step can target them.
    if let Some(token) = intent.entity("token") {
        retrieval = retrieval.with_input("token", InputValue::Literal(token.value.clone()));
    }

    vec![
        sensing_step(intent),
        retrieval,
        PlannedStep::new("step_3_transform", "data_transformation")
            .describe("Normalize retrieved data")
            .with_input("data", InputValue::step_output("step_2_data_retrieval", "apiData"))
            .with_outputs(&["processedData", "trends"]),
        PlannedStep::new("step_4_analysis", "ai_analysis")
            .describe("Analyze processed data")
            .with_input("data", InputValue::step_output("step_3_transform", "processedData"))
            .with_input("trends", InputValue::step_output("step_3_transform", "trends"))
            .with_outputs(&["analysis", "summary"]),
    ]
}

/// transaction: sensing -> parameter analysis -> risk gate -> either
/// execute-and-report or a risk report. The two report steps are emitted as
/// one if/else pair gated on the same condition source and key, so exactly
/// one of them executes per run.
fn transaction_plan(intent: &Intent) -> Vec<PlannedStep> {
    let mut steps = vec![
        sensing_step(intent),
        PlannedStep::new("step_2_analysis", "ai_analysis")
            .describe("Derive transaction parameters and risk rating")
            .with_input("request", InputValue::literal(intent.content.clone()))
            .with_input(
                "environment",
                InputValue::step_output(ENV_SENSING_STEP_ID, "environmentData"),
            )
            .with_outputs(&["transactionParams", "risk"]),
        PlannedStep::new("step_3_risk_check", "conditional")
            .describe("Gate execution on acceptable risk")
            .with_input("value", InputValue::step_output("step_2_analysis", "risk"))
            .with_input("threshold", InputValue::literal(TRANSACTION_RISK_THRESHOLD))
            .with_input("mode", InputValue::literal("risk_below"))
            .with_outputs(&["conditionMet"]),
        PlannedStep::new("step_4_transaction", "solana_transaction")
            .describe("Submit the transaction")
            .with_input(
                "params",
                InputValue::step_output("step_2_analysis", "transactionParams"),
            )
            .when("step_3_risk_check", "conditionMet", json!(true))
            .with_outputs(&["signature", "confirmation"]),
    ];

    let report = PlannedStep::new("step_5_report", "ai_analysis")
        .describe("Summarize the executed transaction")
        .with_input(
            "signature",
            InputValue::step_output("step_4_transaction", "signature"),
        )
        .with_input(
            "params",
            InputValue::step_output("step_2_analysis", "transactionParams"),
        )
        .with_outputs(&["report", "summary"]);

    let risk_report = PlannedStep::new("step_5_risk_report", "ai_analysis")
        .describe("Explain why the transaction was withheld")
        .with_input("risk", InputValue::step_output("step_2_analysis", "risk"))
        .with_outputs(&["report", "summary"]);

    steps.extend(branch("step_3_risk_check", "conditionMet", report, risk_report));
    steps
}

/// analysis: sensing -> retrieval -> transformation -> two-phase model
/// analysis (initial insights feed the deep pass together with the data).
fn analysis_plan(intent: &Intent) -> Vec<PlannedStep> {
    vec![
        sensing_step(intent),
        PlannedStep::new("step_2_data_retrieval", "api_call")
            .describe("Fetch data for analysis")
            .with_input("query", InputValue::literal(intent.content.clone()))
            .with_outputs(&["apiData"]),
        PlannedStep::new("step_3_transform", "data_transformation")
            .describe("Normalize retrieved data")
            .with_input("data", InputValue::step_output("step_2_data_retrieval", "apiData"))
            .with_outputs(&["processedData", "trends"]),
        PlannedStep::new("step_4_initial_analysis", "ai_analysis")
            .describe("Initial analysis pass")
            .with_input("data", InputValue::step_output("step_3_transform", "processedData"))
            .with_outputs(&["initialInsights", "metrics"]),
        PlannedStep::new("step_5_deep_analysis", "ai_analysis")
            .describe("Deep analysis pass")
            .with_input(
                "insights",
                InputValue::step_output("step_4_initial_analysis", "initialInsights"),
            )
            .with_input(
                "metrics",
                InputValue::step_output("step_4_initial_analysis", "metrics"),
            )
            .with_input("data", InputValue::step_output("step_3_transform", "processedData"))
            .with_outputs(&["analysis", "portfolio", "summary", "impact"]),
    ]
}

/// Emit a mutually exclusive if/else pair gated on the same condition source
/// and key with opposite expected values. Keeping both arms in one builder
/// guarantees exactly one executes per run.
fn branch(
    source: &str,
    key: &str,
    on_true: PlannedStep,
    on_false: PlannedStep,
) -> [PlannedStep; 2] {
    [
        on_true.when(source, key, Value::Bool(true)),
        on_false.when(source, key, Value::Bool(false)),
    ]
}
