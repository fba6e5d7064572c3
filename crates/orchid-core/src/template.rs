//! Task template types.
//!
//! A TaskTemplate is a declarative, versioned description of a reusable
//! multi-step task. Templates are authored externally (community or system)
//! and immutable once registered; a new version is a new object.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::plan::{InputValue, PlannedStep, StepCondition};

/// Category of a task template. Drives the default action when the user
/// supplies none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Defi,
    Dao,
    Analytics,
    Content,
    Development,
    Other(String),
}

impl TemplateCategory {
    /// The default action verb for this category.
    pub fn default_action(&self) -> Option<&'static str> {
        match self {
            TemplateCategory::Defi => Some("optimize_portfolio"),
            TemplateCategory::Dao => Some("process_governance"),
            TemplateCategory::Analytics => Some("analyze_data"),
            TemplateCategory::Content => Some("generate_content"),
            TemplateCategory::Development => Some("support_development"),
            TemplateCategory::Other(_) => None,
        }
    }
}

/// Declared input of a template. Drives entity extraction and plan input
/// binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDefinition {
    /// Input name, matched against raw user inputs.
    pub name: String,

    /// Declared value kind (e.g. "token", "wallet_address", "number").
    pub value_kind: String,

    /// Whether the input must be provided for full confidence.
    #[serde(default)]
    pub required: bool,

    /// Default value applied when the input is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Optional validation expression, interpreted by the authoring layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<String>,
}

/// Declared output of a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDefinition {
    pub name: String,
    pub value_kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Retry policy declared per step definition. Enforcement is the step
/// runner's responsibility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts including the first.
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }
}

/// One declared step of a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Step id, unique within the template. May be empty; the planner
    /// assigns `step-<index>` ids during validation.
    #[serde(default)]
    pub id: String,

    /// Id or kind of the tool that executes this step.
    pub tool_id: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Named input bindings (literals or source references).
    #[serde(default)]
    pub inputs: BTreeMap<String, InputValue>,

    /// Output keys the step is expected to produce.
    #[serde(default)]
    pub expected_outputs: Vec<String>,

    /// Optional execution gate evaluated against an earlier step's outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<StepCondition>,

    /// Optional retry policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

impl From<StepDefinition> for PlannedStep {
    /// A declared step is already plan-shaped; the fields carry over
    /// directly. Empty ids are filled in by planner validation.
    fn from(def: StepDefinition) -> Self {
        PlannedStep {
            step_id: def.id,
            tool_id: def.tool_id,
            description: def.description,
            inputs: def.inputs,
            expected_outputs: def.expected_outputs,
            condition: def.condition,
            retry: def.retry,
        }
    }
}

/// A permission the template requests at execution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRequest {
    /// The capability being requested (e.g. "sign_transaction").
    pub capability: String,

    /// Why the template needs it.
    #[serde(default)]
    pub reason: String,
}

/// Declarative description of a reusable multi-step task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: String,
    pub name: String,
    pub version: String,
    pub category: TemplateCategory,
    #[serde(default)]
    pub inputs: Vec<InputDefinition>,
    #[serde(default)]
    pub outputs: Vec<OutputDefinition>,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub permissions: Vec<PermissionRequest>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl TaskTemplate {
    /// Number of required inputs.
    pub fn required_input_count(&self) -> usize {
        self.inputs.iter().filter(|i| i.required).count()
    }

    /// Find an input definition by name.
    pub fn input(&self, name: &str) -> Option<&InputDefinition> {
        self.inputs.iter().find(|i| i.name == name)
    }
}
