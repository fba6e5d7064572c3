//! Intent parser.
//!
//! Converts raw user inputs plus a task template into a populated [`Intent`]
//! with a derived confidence score. Parsing never rejects an intent: low
//! confidence is observational, not a gate.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use orchid_core::{Entity, Intent, IntentKind, OrchidError, Result, TaskTemplate, TemplateCategory};

/// Action used when neither the inputs nor the template category yield one.
pub const FALLBACK_ACTION: &str = "process_task";

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Cap on extracted entities (template-defined entities are collected
    /// before raw ones).
    pub max_entities: usize,

    /// Whether to populate the intent's parameter map.
    pub extract_parameters: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_entities: 15,
            extract_parameters: true,
        }
    }
}

/// Per-call parse options.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// The requesting user; recorded on the intent.
    pub user_id: String,

    /// Caller-supplied context injected into the parameter map.
    pub context: Option<Value>,
}

/// Converts raw inputs and a template into an [`Intent`].
#[derive(Debug, Clone, Default)]
pub struct IntentParser {
    config: ParserConfig,
}

impl IntentParser {
    /// Create a parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse raw inputs against a template.
    ///
    /// Fails only when a present field has a malformed shape (e.g. an
    /// `entities` array that does not deserialize); missing optional fields
    /// never fail.
    pub fn parse(
        &self,
        inputs: &BTreeMap<String, Value>,
        template: &TaskTemplate,
        options: &ParseOptions,
    ) -> Result<Intent> {
        let kind = self.resolve_kind(inputs, template);
        let (action, action_fell_back) = self.resolve_action(inputs, &template.category);
        let entities = self.extract_entities(inputs, template)?;

        let parameters = if self.config.extract_parameters {
            self.extract_parameters(inputs, template, options)?
        } else {
            BTreeMap::new()
        };

        let confidence = self.score_confidence(&entities, action_fell_back, template);

        let content = inputs
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        debug!(
            kind = kind.as_str(),
            action,
            entities = entities.len(),
            confidence,
            "parsed intent"
        );

        Ok(Intent {
            id: Uuid::new_v4(),
            kind,
            content,
            action,
            entities,
            parameters,
            confidence,
            timestamp: Utc::now(),
            user_id: options.user_id.clone(),
        })
    }

    fn resolve_kind(&self, inputs: &BTreeMap<String, Value>, template: &TaskTemplate) -> IntentKind {
        if let Some(raw) = inputs.get("type").and_then(Value::as_str) {
            return IntentKind::parse(raw);
        }
        match &template.category {
            TemplateCategory::Analytics => IntentKind::Analysis,
            TemplateCategory::Defi => IntentKind::Transaction,
            TemplateCategory::Dao => IntentKind::Governance,
            TemplateCategory::Content => IntentKind::Content,
            _ => IntentKind::Query,
        }
    }

    /// Resolve the action verb. Returns the action and whether the
    /// `process_task` fallback was used.
    fn resolve_action(
        &self,
        inputs: &BTreeMap<String, Value>,
        category: &TemplateCategory,
    ) -> (String, bool) {
        if let Some(action) = inputs.get("action").and_then(Value::as_str) {
            return (action.to_string(), false);
        }
        if let Some(action) = category.default_action() {
            return (action.to_string(), false);
        }
        (FALLBACK_ACTION.to_string(), true)
    }

    /// Extract entities: one per matching input definition, then raw
    /// already-shaped entities, stopping at the configured cap.
    fn extract_entities(
        &self,
        inputs: &BTreeMap<String, Value>,
        template: &TaskTemplate,
    ) -> Result<Vec<Entity>> {
        let mut entities = Vec::new();

        for def in &template.inputs {
            if entities.len() >= self.config.max_entities {
                break;
            }
            if let Some(value) = inputs.get(&def.name) {
                entities.push(Entity::new(def.value_kind.clone(), value.clone()));
            }
        }

        if let Some(raw) = inputs.get("entities") {
            let parsed: Vec<Entity> = serde_json::from_value(raw.clone()).map_err(|e| {
                OrchidError::Parse {
                    message: format!("malformed entities array: {}", e),
                }
            })?;
            for entity in parsed {
                if entities.len() >= self.config.max_entities {
                    break;
                }
                entities.push(entity);
            }
        }

        Ok(entities)
    }

    fn extract_parameters(
        &self,
        inputs: &BTreeMap<String, Value>,
        template: &TaskTemplate,
        options: &ParseOptions,
    ) -> Result<BTreeMap<String, Value>> {
        let mut parameters = BTreeMap::new();

        if let Some(raw) = inputs.get("parameters") {
            let map = raw.as_object().ok_or_else(|| OrchidError::Parse {
                message: "parameters must be an object".to_string(),
            })?;
            for (key, value) in map {
                parameters.insert(key.clone(), value.clone());
            }
        }

        parameters.insert("templateId".to_string(), json!(template.id));
        parameters.insert("templateName".to_string(), json!(template.name));
        parameters.insert("templateVersion".to_string(), json!(template.version));
        if let Some(context) = &options.context {
            parameters.insert("context".to_string(), context.clone());
        }
        parameters.insert("parsedAt".to_string(), json!(Utc::now().to_rfc3339()));

        Ok(parameters)
    }

    /// Multiplicative confidence scoring, clamped to `[0, 1]`.
    fn score_confidence(
        &self,
        entities: &[Entity],
        action_fell_back: bool,
        template: &TaskTemplate,
    ) -> f32 {
        let mut confidence: f32 = 1.0;

        if entities.is_empty() {
            confidence *= 0.7;
        }
        if action_fell_back {
            confidence *= 0.8;
        }

        let required_count = template.required_input_count();
        if required_count > 0 {
            let required_names: Vec<&str> = template
                .inputs
                .iter()
                .filter(|i| i.required)
                .map(|i| i.name.as_str())
                .collect();
            let provided = entities
                .iter()
                .filter(|e| required_names.contains(&e.kind.as_str()))
                .count();
            confidence *= (provided as f32 / required_count as f32).min(1.0);
        }

        confidence.clamp(0.0, 1.0)
    }
}
