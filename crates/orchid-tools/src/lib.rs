//! # Orchid Tools
//!
//! Tool abstraction and step execution for the Orchid engine.
//!
//! - [`Tool`] / [`ToolKind`] - the capability contract, one per step category
//! - [`ToolRegistry`] - explicit, constructor-injected tool registry
//! - [`StepRunner`] - resolves input references, enforces retry/timeout,
//!   and degrades every tool failure into a failure result
//! - [`builtin`] - the built-in tool set
//! - [`chain`] - the blockchain collaborator contract

pub mod builtin;
pub mod chain;
pub mod registry;
pub mod resolve;
pub mod runner;
pub mod tool;

pub use builtin::{
    AiAnalysisTool, ApiCallTool, ConditionalTool, DataTransformationTool, EnvironmentSensingTool,
    SolanaTransactionTool,
};
pub use chain::{AccountInfo, ChainClient, InProcessChainClient, NetworkStatus};
pub use registry::ToolRegistry;
pub use resolve::{resolve_inputs, ResolvedInputs};
pub use runner::{RunnerConfig, StepRunner};
pub use tool::{StepOutput, Tool, ToolKind};

use std::sync::Arc;

/// Build a registry with every built-in tool registered, chain-backed tools
/// wired to the given client.
pub fn builtin_registry(chain: Arc<dyn ChainClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EnvironmentSensingTool));
    registry.register(Arc::new(ApiCallTool));
    registry.register(Arc::new(DataTransformationTool));
    registry.register(Arc::new(AiAnalysisTool::new()));
    registry.register(Arc::new(ConditionalTool));
    registry.register(Arc::new(SolanaTransactionTool::new(chain)));
    registry
}
