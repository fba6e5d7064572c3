//! Plan generation.
//!
//! The planner tries registered planning templates in registration order and
//! takes the first whose `matches` predicate accepts the intent. First-match
//! is a semantic contract: registration order decides ties. When nothing
//! matches, dynamic synthesis (if enabled) builds a plan from the intent kind.

use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use tracing::{debug, info, warn};

use orchid_core::{Intent, OrchidError, PlannedStep, Result, TaskContext};

use crate::dynamic;

/// A registered, reusable plan shape.
///
/// Implementations decide which intents they apply to and how to expand an
/// intent into concrete steps. Registration order matters; see [`Planner`].
pub trait PlanningTemplate: Send + Sync {
    /// Identifier for logs and diagnostics.
    fn id(&self) -> &str;

    /// Whether this template can plan the given intent.
    fn matches(&self, intent: &Intent) -> bool;

    /// Expand the intent into an ordered step list.
    fn build(&self, intent: &Intent, context: &TaskContext) -> Vec<PlannedStep>;
}

/// Planner configuration.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Maximum number of steps allowed in a plan.
    pub max_steps: usize,

    /// Whether plans may be synthesized when no template matches.
    pub dynamic_planning: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_steps: 20,
            dynamic_planning: true,
        }
    }
}

/// Generates ordered, data-dependent execution plans.
///
/// The template list sits behind a lock so stored task templates can be
/// registered at runtime through a shared planner handle.
pub struct Planner {
    config: PlannerConfig,
    templates: RwLock<Vec<Box<dyn PlanningTemplate>>>,
}

impl Planner {
    /// Create a planner with default configuration and no templates.
    pub fn new() -> Self {
        Self::with_config(PlannerConfig::default())
    }

    /// Create a planner with custom configuration.
    pub fn with_config(config: PlannerConfig) -> Self {
        Self {
            config,
            templates: RwLock::new(Vec::new()),
        }
    }

    /// Register a planning template. Templates are tried in registration
    /// order; the first match wins. A duplicate id overwrites the existing
    /// registration in place.
    pub fn register_template(&self, template: Box<dyn PlanningTemplate>) {
        let mut templates = self
            .templates
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = templates.iter_mut().find(|t| t.id() == template.id()) {
            warn!(template = template.id(), "overwriting existing planning template");
            *existing = template;
            return;
        }
        debug!(template = template.id(), "registered planning template");
        templates.push(template);
    }

    /// Number of registered templates.
    pub fn template_count(&self) -> usize {
        self.templates().len()
    }

    fn templates(&self) -> RwLockReadGuard<'_, Vec<Box<dyn PlanningTemplate>>> {
        self.templates.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generate a plan for the intent.
    ///
    /// Deterministic for a fixed (intent, context, registered templates)
    /// triple: re-running with no registry mutation yields an identical
    /// step sequence.
    pub fn generate_plan(&self, intent: &Intent, context: &TaskContext) -> Result<Vec<PlannedStep>> {
        for template in self.templates().iter() {
            if template.matches(intent) {
                info!(
                    template = template.id(),
                    intent = %intent.id,
                    "planning from registered template"
                );
                let steps = template.build(intent, context);
                return self.validate(steps);
            }
        }

        if !self.config.dynamic_planning {
            return Err(OrchidError::NoPlanFound {
                intent_id: intent.id.to_string(),
                message: "no registered template matches and dynamic planning is disabled"
                    .to_string(),
            });
        }

        info!(intent = %intent.id, kind = intent.kind.as_str(), "planning dynamically");
        let steps = dynamic::synthesize(intent)?;
        self.validate(steps)
    }

    /// Enforce the step limit and assign ids to steps that lack one.
    /// Existing ids are never altered, so validation is idempotent.
    fn validate(&self, mut steps: Vec<PlannedStep>) -> Result<Vec<PlannedStep>> {
        if steps.len() > self.config.max_steps {
            return Err(OrchidError::PlanTooLarge {
                actual: steps.len(),
                limit: self.config.max_steps,
            });
        }

        for (index, step) in steps.iter_mut().enumerate() {
            if step.step_id.is_empty() {
                step.step_id = format!("step-{}", index);
            }
        }

        let mut seen = std::collections::HashSet::new();
        for step in &steps {
            if !seen.insert(step.step_id.as_str()) {
                return Err(OrchidError::Internal(format!(
                    "duplicate step id '{}' in generated plan",
                    step.step_id
                )));
            }
        }

        Ok(steps)
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orchid_core::IntentKind;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn intent(kind: IntentKind) -> Intent {
        Intent {
            id: Uuid::new_v4(),
            kind,
            content: "price of SOL".to_string(),
            action: "analyze_data".to_string(),
            entities: vec![],
            parameters: BTreeMap::new(),
            confidence: 1.0,
            timestamp: Utc::now(),
            user_id: "user-1".to_string(),
        }
    }

    fn context() -> TaskContext {
        TaskContext::new("user-1", BTreeMap::new())
    }

    struct FixedTemplate {
        id: String,
        kind: IntentKind,
        steps: Vec<PlannedStep>,
    }

    impl PlanningTemplate for FixedTemplate {
        fn id(&self) -> &str {
            &self.id
        }

        fn matches(&self, intent: &Intent) -> bool {
            intent.kind == self.kind
        }

        fn build(&self, _intent: &Intent, _context: &TaskContext) -> Vec<PlannedStep> {
            self.steps.clone()
        }
    }

    #[test]
    fn test_first_match_wins_in_registration_order() {
        let planner = Planner::new();
        planner.register_template(Box::new(FixedTemplate {
            id: "first".to_string(),
            kind: IntentKind::Query,
            steps: vec![PlannedStep::new("from_first", "api_call")],
        }));
        planner.register_template(Box::new(FixedTemplate {
            id: "second".to_string(),
            kind: IntentKind::Query,
            steps: vec![PlannedStep::new("from_second", "api_call")],
        }));

        let steps = planner.generate_plan(&intent(IntentKind::Query), &context()).unwrap();
        assert_eq!(steps[0].step_id, "from_first");
    }

    #[test]
    fn test_no_match_without_dynamic_planning_fails() {
        let planner = Planner::with_config(PlannerConfig {
            max_steps: 20,
            dynamic_planning: false,
        });

        let err = planner
            .generate_plan(&intent(IntentKind::Query), &context())
            .unwrap_err();
        assert!(matches!(err, OrchidError::NoPlanFound { .. }));
    }

    #[test]
    fn test_dynamic_query_plan_is_four_steps() {
        let planner = Planner::new();
        let steps = planner.generate_plan(&intent(IntentKind::Query), &context()).unwrap();
        assert_eq!(steps.len(), 4);
    }

    #[test]
    fn test_plan_generation_is_deterministic() {
        let planner = Planner::new();
        let fixed = intent(IntentKind::Analysis);
        let ctx = context();

        let first = planner.generate_plan(&fixed, &ctx).unwrap();
        let second = planner.generate_plan(&fixed, &ctx).unwrap();

        let ids = |steps: &[PlannedStep]| {
            steps.iter().map(|s| s.step_id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_oversized_plan_is_rejected() {
        let planner = Planner::new();
        let steps: Vec<PlannedStep> = (0..25)
            .map(|i| PlannedStep::new(format!("step_{}", i), "api_call"))
            .collect();
        planner.register_template(Box::new(FixedTemplate {
            id: "huge".to_string(),
            kind: IntentKind::Query,
            steps,
        }));

        let err = planner
            .generate_plan(&intent(IntentKind::Query), &context())
            .unwrap_err();
        assert!(matches!(err, OrchidError::PlanTooLarge { actual: 25, limit: 20 }));
    }

    #[test]
    fn test_missing_ids_are_assigned_without_touching_existing() {
        let planner = Planner::new();
        planner.register_template(Box::new(FixedTemplate {
            id: "partial-ids".to_string(),
            kind: IntentKind::Query,
            steps: vec![
                PlannedStep::new("named", "api_call"),
                PlannedStep::new("", "data_transformation"),
            ],
        }));

        let steps = planner.generate_plan(&intent(IntentKind::Query), &context()).unwrap();
        assert_eq!(steps[0].step_id, "named");
        assert_eq!(steps[1].step_id, "step-1");
    }

    #[test]
    fn test_duplicate_registration_overwrites_in_place() {
        let planner = Planner::new();
        planner.register_template(Box::new(FixedTemplate {
            id: "same".to_string(),
            kind: IntentKind::Query,
            steps: vec![PlannedStep::new("old_step", "api_call")],
        }));
        planner.register_template(Box::new(FixedTemplate {
            id: "same".to_string(),
            kind: IntentKind::Query,
            steps: vec![PlannedStep::new("new_step", "api_call")],
        }));

        assert_eq!(planner.template_count(), 1);
        let steps = planner.generate_plan(&intent(IntentKind::Query), &context()).unwrap();
        assert_eq!(steps[0].step_id, "new_step");
    }
}
