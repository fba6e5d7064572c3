//! The tool capability contract.
//!
//! A tool executes one category of planned step. Tool `execute` bodies are
//! the only place in the engine permitted to perform I/O; the step runner
//! itself is side-effect-free apart from timing and result recording.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use orchid_core::{PlannedStep, Result, TaskContext};

use crate::resolve::ResolvedInputs;

/// Fixed set of step-type categories. A step may address a tool by exact id
/// or by one of these category names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// External HTTP/data retrieval.
    ApiCall,
    /// Blockchain interaction through the chain collaborator.
    SolanaTransaction,
    /// Model invocation; tracks token usage.
    AiAnalysis,
    /// In-process data shaping.
    DataTransformation,
    /// Boolean gate evaluation; reports `conditionMet`.
    Conditional,
    /// Environment snapshot projection.
    EnvironmentSensing,
}

impl ToolKind {
    /// Stable string form, matching the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::ApiCall => "api_call",
            ToolKind::SolanaTransaction => "solana_transaction",
            ToolKind::AiAnalysis => "ai_analysis",
            ToolKind::DataTransformation => "data_transformation",
            ToolKind::Conditional => "conditional",
            ToolKind::EnvironmentSensing => "environment_sensing",
        }
    }
}

/// What a tool produces on success.
#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    /// Outputs keyed by output name.
    pub outputs: BTreeMap<String, Value>,

    /// Model tokens consumed, when applicable.
    pub token_usage: u64,
}

impl StepOutput {
    /// Build an output set from key/value pairs.
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        Self {
            outputs: pairs.into_iter().collect(),
            token_usage: 0,
        }
    }

    /// Attach token usage.
    pub fn with_tokens(mut self, tokens: u64) -> Self {
        self.token_usage = tokens;
        self
    }
}

/// A named executable capability handling one step category.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique id; steps address tools by this or by the kind name.
    fn id(&self) -> &str;

    /// The category this tool handles.
    fn kind(&self) -> ToolKind;

    /// Execute one step against resolved inputs. Errors are recovered by
    /// the step runner into failure results; tools must treat
    /// [`ResolvedInputs`] missing markers as missing-input conditions, not
    /// crashes.
    async fn execute(
        &self,
        step: &PlannedStep,
        inputs: &ResolvedInputs,
        context: &TaskContext,
    ) -> Result<StepOutput>;
}
