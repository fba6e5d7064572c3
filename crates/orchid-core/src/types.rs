//! Common types used across the Orchid engine.

use serde::{Deserialize, Serialize};

/// Semantic category of a user intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Read-only data lookup (prices, balances, accounts).
    Query,
    /// An on-chain state change.
    Transaction,
    /// Multi-pass analytical work over retrieved data.
    Analysis,
    /// Content generation.
    Content,
    /// Governance processing.
    Governance,
    /// Anything else; carries the raw kind string.
    Custom(String),
}

impl IntentKind {
    /// Parse a raw kind string; unknown values become [`IntentKind::Custom`].
    pub fn parse(raw: &str) -> Self {
        match raw {
            "query" => IntentKind::Query,
            "transaction" => IntentKind::Transaction,
            "analysis" => IntentKind::Analysis,
            "content" => IntentKind::Content,
            "governance" => IntentKind::Governance,
            other => IntentKind::Custom(other.to_string()),
        }
    }

    /// Stable string form, matching the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            IntentKind::Query => "query",
            IntentKind::Transaction => "transaction",
            IntentKind::Analysis => "analysis",
            IntentKind::Content => "content",
            IntentKind::Governance => "governance",
            IntentKind::Custom(s) => s,
        }
    }
}

/// Status of a single executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failure,
    InProgress,
}

/// Terminal status of a whole task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Failure,
    InProgress,
}

/// Phase of the task lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    Created,
    Parsing,
    Sensing,
    Planning,
    Executing,
    Monitoring,
    Completed,
    Failed,
}

impl TaskPhase {
    /// Returns true if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskPhase::Completed | TaskPhase::Failed)
    }
}

/// Ordered risk level used by conditional checks and the execution monitor.
///
/// Unknown strings parse as [`RiskLevel::High`] so an unrecognized rating is
/// always treated conservatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Parse a rating string, case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}
