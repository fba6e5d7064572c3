//! Application state.

use std::sync::Arc;

use orchid_engine::{ChainEnvironmentSensor, TaskOrchestrator};
use orchid_planner::Planner;
use orchid_state::InMemoryStore;
use orchid_tools::{builtin_registry, ChainClient, InProcessChainClient};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Template and result persistence.
    pub store: Arc<InMemoryStore>,

    /// Chain collaborator.
    pub chain: Arc<dyn ChainClient>,

    /// The orchestrator driving task execution.
    pub orchestrator: Arc<TaskOrchestrator>,
}

impl AppState {
    /// Wire up the default in-process stack.
    pub fn new() -> Self {
        let chain = InProcessChainClient::shared();
        let store = InMemoryStore::shared();

        let orchestrator = TaskOrchestrator::new(
            Planner::new(),
            builtin_registry(chain.clone()),
            Arc::new(ChainEnvironmentSensor::new(chain.clone())),
            chain.clone(),
            store.clone(),
        );

        Self {
            store,
            chain,
            orchestrator: Arc::new(orchestrator),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
