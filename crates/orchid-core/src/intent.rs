//! Intent types for the Orchid engine.
//!
//! An Intent is the structured representation of "what the user wants". It is
//! produced once by the intent parser and immutable thereafter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::IntentKind;

/// A tag/value pair extracted from user input or template input definitions.
///
/// Entities have no identity beyond their position in the owning intent's
/// entity list; matching is always by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Tag describing what the value is (e.g. "token", "wallet_address").
    /// Accepts `type` on the wire for externally authored payloads.
    #[serde(alias = "type")]
    pub kind: String,

    /// The extracted value.
    pub value: Value,

    /// Optional metadata about how the entity was extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
}

impl Entity {
    /// Create an entity with no metadata.
    pub fn new(kind: impl Into<String>, value: Value) -> Self {
        Self {
            kind: kind.into(),
            value,
            metadata: None,
        }
    }
}

/// Structured representation of a user's request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Unique identifier for this intent.
    pub id: Uuid,

    /// Semantic category of the request.
    pub kind: IntentKind,

    /// The raw free-text content of the request.
    pub content: String,

    /// Resolved action verb (e.g. "optimize_portfolio").
    pub action: String,

    /// Extracted entities, in insertion order.
    pub entities: Vec<Entity>,

    /// Flat parameter map merged from inputs and template metadata.
    pub parameters: BTreeMap<String, Value>,

    /// Derived confidence score in `[0, 1]`. Observational only; never a
    /// gate and never user-supplied.
    pub confidence: f32,

    /// Timestamp when the intent was parsed.
    pub timestamp: DateTime<Utc>,

    /// The requesting user.
    pub user_id: String,
}

impl Intent {
    /// Find the first entity of the given kind.
    pub fn entity(&self, kind: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.kind == kind)
    }

    /// Returns true if an entity of the given kind was extracted.
    pub fn has_entity(&self, kind: &str) -> bool {
        self.entity(kind).is_some()
    }
}
