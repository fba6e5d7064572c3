//! Chain collaborator interface.
//!
//! Blockchain interaction is an external collaborator: the engine specifies
//! only the data shapes it produces and consumes. The in-process client
//! exists for development and tests; a production deployment substitutes an
//! RPC-backed implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use orchid_core::{ExecutionProof, OrchidError, Result, TaskTemplate};

/// On-chain account summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: String,
    pub executable: bool,
    pub rent_epoch: u64,
    pub data_size: u64,
}

/// Network head position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub block_height: u64,
    pub slot: u64,
    pub epoch: u64,
}

/// Blockchain collaborator contract.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch account summaries for the given addresses.
    async fn fetch_accounts_data(
        &self,
        addresses: &[String],
    ) -> Result<BTreeMap<String, AccountInfo>>;

    /// Submit a transaction; returns its signature.
    async fn submit_transaction(&self, instructions: &Value, signers: &[String]) -> Result<String>;

    /// Current network head.
    async fn network_status(&self) -> Result<NetworkStatus>;

    /// Register a task template on-chain; returns the template id.
    async fn register_template(&self, template: &TaskTemplate, creator_id: &str) -> Result<String>;

    /// Search registered templates; returns matching template ids.
    async fn search_templates(&self, criteria: &str) -> Result<Vec<String>>;

    /// Persist an execution proof; returns the proof reference.
    async fn store_execution_proof(&self, proof: &ExecutionProof) -> Result<String>;
}

/// In-process chain client for development and tests.
#[derive(Default)]
pub struct InProcessChainClient {
    templates: RwLock<BTreeMap<String, String>>,
    submitted: RwLock<Vec<String>>,
}

impl InProcessChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared handle.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Signatures submitted so far (test observability).
    pub async fn submitted_signatures(&self) -> Vec<String> {
        self.submitted.read().await.clone()
    }
}

#[async_trait]
impl ChainClient for InProcessChainClient {
    async fn fetch_accounts_data(
        &self,
        addresses: &[String],
    ) -> Result<BTreeMap<String, AccountInfo>> {
        Ok(addresses
            .iter()
            .map(|addr| {
                (
                    addr.clone(),
                    AccountInfo {
                        lamports: 1_000_000_000,
                        owner: "11111111111111111111111111111111".to_string(),
                        executable: false,
                        rent_epoch: 361,
                        data_size: 0,
                    },
                )
            })
            .collect())
    }

    async fn submit_transaction(&self, instructions: &Value, _signers: &[String]) -> Result<String> {
        if instructions.is_null() {
            return Err(OrchidError::Chain {
                message: "cannot submit empty instructions".to_string(),
            });
        }
        let signature = format!("sig_{}", Uuid::new_v4().simple());
        self.submitted.write().await.push(signature.clone());
        Ok(signature)
    }

    async fn network_status(&self) -> Result<NetworkStatus> {
        Ok(NetworkStatus {
            block_height: 250_000_000,
            slot: 260_000_000,
            epoch: 601,
        })
    }

    async fn register_template(&self, template: &TaskTemplate, creator_id: &str) -> Result<String> {
        self.templates
            .write()
            .await
            .insert(template.id.clone(), creator_id.to_string());
        Ok(template.id.clone())
    }

    async fn search_templates(&self, criteria: &str) -> Result<Vec<String>> {
        let templates = self.templates.read().await;
        Ok(templates
            .keys()
            .filter(|id| id.contains(criteria))
            .cloned()
            .collect())
    }

    async fn store_execution_proof(&self, proof: &ExecutionProof) -> Result<String> {
        Ok(format!("proof_{}", proof.id.simple()))
    }
}
