//! Planned step types.
//!
//! A plan is an ordered `Vec<PlannedStep>` executed strictly in array order.
//! Later steps may reference earlier steps' outputs through a [`SourceRef`];
//! references are resolved at execution time, never at plan construction.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::template::RetryPolicy;

/// A pointer describing where a step input value comes from.
///
/// Closed variant type; resolution happens through a single typed resolver
/// in the step runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SourceRef {
    /// The task's original user inputs, by name.
    UserInput { name: String },

    /// An earlier step's outputs, by step id then dotted field path.
    PreviousStep { step_id: String, path: String },

    /// The sensed environment, by dotted field path.
    Environment { path: String },

    /// A literal embedded at plan time.
    Constant { value: Value },
}

/// A step input binding: either a literal or a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Ref(SourceRef),
    Literal(Value),
}

impl InputValue {
    /// Shorthand for a constant literal binding.
    pub fn literal(value: impl Into<Value>) -> Self {
        InputValue::Literal(value.into())
    }

    /// Shorthand for a user-input reference.
    pub fn user_input(name: impl Into<String>) -> Self {
        InputValue::Ref(SourceRef::UserInput { name: name.into() })
    }

    /// Shorthand for a previous-step output reference.
    pub fn step_output(step_id: impl Into<String>, path: impl Into<String>) -> Self {
        InputValue::Ref(SourceRef::PreviousStep {
            step_id: step_id.into(),
            path: path.into(),
        })
    }

    /// Shorthand for an environment reference.
    pub fn environment(path: impl Into<String>) -> Self {
        InputValue::Ref(SourceRef::Environment { path: path.into() })
    }
}

/// Execution gate: the step runs only if the referenced step's output at
/// `key` equals `expected`. A false or unevaluable condition skips the step
/// without invoking its tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepCondition {
    /// Id of the earlier step whose outputs are inspected.
    pub source: String,

    /// Output key to compare.
    pub key: String,

    /// Value the output must equal for the step to run.
    pub expected: Value,
}

/// One unit of work in an execution plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Unique id within the plan. Later steps may reference only earlier
    /// steps' ids.
    pub step_id: String,

    /// Id or kind of the tool that executes this step.
    pub tool_id: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Named input bindings.
    #[serde(default)]
    pub inputs: BTreeMap<String, InputValue>,

    /// Output keys the tool is expected to produce.
    #[serde(default)]
    pub expected_outputs: Vec<String>,

    /// Optional execution gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<StepCondition>,

    /// Optional retry policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

impl PlannedStep {
    /// Create a step with the given id and tool.
    pub fn new(step_id: impl Into<String>, tool_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            tool_id: tool_id.into(),
            description: String::new(),
            inputs: BTreeMap::new(),
            expected_outputs: Vec::new(),
            condition: None,
            retry: None,
        }
    }

    /// Set the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an input binding.
    pub fn with_input(mut self, name: impl Into<String>, value: InputValue) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }

    /// Declare expected output keys.
    pub fn with_outputs(mut self, outputs: &[&str]) -> Self {
        self.expected_outputs = outputs.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Gate the step on an earlier step's output value.
    pub fn when(mut self, source: impl Into<String>, key: impl Into<String>, expected: Value) -> Self {
        self.condition = Some(StepCondition {
            source: source.into(),
            key: key.into(),
            expected,
        });
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Returns true if any input references the given step's outputs.
    pub fn references_step(&self, step_id: &str) -> bool {
        self.inputs.values().any(|input| {
            matches!(
                input,
                InputValue::Ref(SourceRef::PreviousStep { step_id: id, .. }) if id == step_id
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_builder() {
        let step = PlannedStep::new("step_2_data_retrieval", "api_call")
            .describe("Fetch token data")
            .with_input("token", InputValue::user_input("token"))
            .with_input("source", InputValue::literal("market_api"))
            .with_outputs(&["apiData"]);

        assert_eq!(step.step_id, "step_2_data_retrieval");
        assert_eq!(step.inputs.len(), 2);
        assert_eq!(step.expected_outputs, vec!["apiData".to_string()]);
        assert!(step.condition.is_none());
    }

    #[test]
    fn test_references_step() {
        let step = PlannedStep::new("step_3_transform", "data_transformation")
            .with_input("data", InputValue::step_output("step_2_data_retrieval", "apiData"));

        assert!(step.references_step("step_2_data_retrieval"));
        assert!(!step.references_step("step_1_env_sensing"));
    }

    #[test]
    fn test_source_ref_serialization_is_tagged() {
        let r = SourceRef::PreviousStep {
            step_id: "step_1".to_string(),
            path: "outputs.data".to_string(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["source"], json!("previous_step"));
    }

    #[test]
    fn test_input_value_untagged_roundtrip() {
        let literal: InputValue = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(literal, InputValue::Literal(json!(42)));

        let reference: InputValue =
            serde_json::from_value(json!({"source": "user_input", "name": "token"})).unwrap();
        assert_eq!(
            reference,
            InputValue::Ref(SourceRef::UserInput {
                name: "token".to_string()
            })
        );
    }
}
