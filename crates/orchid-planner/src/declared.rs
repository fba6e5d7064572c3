//! Planning from stored task templates.
//!
//! A task template that declares its own steps is already a plan shape.
//! [`DeclaredPlan`] adapts one into a [`PlanningTemplate`] so the planner
//! prefers the declared steps over dynamic synthesis for intents parsed
//! against that template.

use serde_json::Value;

use orchid_core::{Intent, PlannedStep, TaskContext, TaskTemplate};

use crate::planner::PlanningTemplate;

/// Plans a task from the step definitions its template declares.
///
/// Matches only intents carrying this template's id (the parser records it
/// in the intent parameters) and only when the template actually declares
/// steps; step-less templates fall through to dynamic synthesis.
pub struct DeclaredPlan {
    template: TaskTemplate,
}

impl DeclaredPlan {
    /// Wrap a stored template.
    pub fn new(template: TaskTemplate) -> Self {
        Self { template }
    }
}

impl PlanningTemplate for DeclaredPlan {
    fn id(&self) -> &str {
        &self.template.id
    }

    fn matches(&self, intent: &Intent) -> bool {
        !self.template.steps.is_empty()
            && intent.parameters.get("templateId").and_then(Value::as_str)
                == Some(self.template.id.as_str())
    }

    fn build(&self, _intent: &Intent, _context: &TaskContext) -> Vec<PlannedStep> {
        self.template
            .steps
            .iter()
            .cloned()
            .map(PlannedStep::from)
            .collect()
    }
}
