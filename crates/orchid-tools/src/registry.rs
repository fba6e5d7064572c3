//! Tool registry.
//!
//! An explicitly constructed value owned by the orchestrator and injected
//! into the step runner; registration happens at startup and runtime step
//! execution only reads it.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::tool::Tool;

/// Holds named executable capabilities and resolves which tool runs a step.
#[derive(Default)]
pub struct ToolRegistry {
    /// Tools in registration order. Order matters for kind fallback.
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A duplicate id overwrites the existing registration
    /// in place (last registration wins, no versioning).
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.id() == tool.id()) {
            warn!(tool = tool.id(), "overwriting existing tool registration");
            *existing = tool;
            return;
        }
        debug!(tool = tool.id(), kind = tool.kind().as_str(), "registered tool");
        self.tools.push(tool);
    }

    /// Resolve the tool for a step's `tool_id`: exact id match first, then
    /// the first registered tool whose kind name equals the id.
    pub fn resolve(&self, tool_id: &str) -> Option<Arc<dyn Tool>> {
        if let Some(tool) = self.tools.iter().find(|t| t.id() == tool_id) {
            return Some(tool.clone());
        }
        self.tools
            .iter()
            .find(|t| t.kind().as_str() == tool_id)
            .cloned()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ResolvedInputs;
    use crate::tool::{StepOutput, ToolKind};
    use async_trait::async_trait;
    use orchid_core::{PlannedStep, Result, TaskContext};

    struct NamedTool {
        id: String,
        kind: ToolKind,
    }

    #[async_trait]
    impl Tool for NamedTool {
        fn id(&self) -> &str {
            &self.id
        }

        fn kind(&self) -> ToolKind {
            self.kind
        }

        async fn execute(
            &self,
            _step: &PlannedStep,
            _inputs: &ResolvedInputs,
            _context: &TaskContext,
        ) -> Result<StepOutput> {
            Ok(StepOutput::default())
        }
    }

    fn tool(id: &str, kind: ToolKind) -> Arc<dyn Tool> {
        Arc::new(NamedTool {
            id: id.to_string(),
            kind,
        })
    }

    #[test]
    fn test_exact_id_match_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("api_call", ToolKind::ApiCall));
        registry.register(tool("market_api", ToolKind::ApiCall));

        let resolved = registry.resolve("api_call").unwrap();
        assert_eq!(resolved.id(), "api_call");
        let resolved = registry.resolve("market_api").unwrap();
        assert_eq!(resolved.id(), "market_api");
    }

    #[test]
    fn test_kind_fallback_picks_first_registered() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("alpha_model", ToolKind::AiAnalysis));
        registry.register(tool("beta_model", ToolKind::AiAnalysis));

        // No tool with the literal id "ai_analysis"; the category name
        // falls back to the first matching registration.
        let resolved = registry.resolve("ai_analysis").unwrap();
        assert_eq!(resolved.id(), "alpha_model");
    }

    #[test]
    fn test_unknown_tool_resolves_to_none() {
        let registry = ToolRegistry::new();
        assert!(registry.resolve("custom_missing_tool").is_none());
    }

    #[test]
    fn test_duplicate_registration_overwrites_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("api_call", ToolKind::ApiCall));
        registry.register(tool("api_call", ToolKind::DataTransformation));

        assert_eq!(registry.len(), 1);
        let resolved = registry.resolve("api_call").unwrap();
        assert_eq!(resolved.kind(), ToolKind::DataTransformation);
    }
}
