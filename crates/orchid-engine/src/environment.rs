//! Environment collaborator.
//!
//! Environment sensing always returns a snapshot, never an error: on
//! internal failure the snapshot carries an error flag so the orchestrator
//! can proceed with degraded context rather than abort.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use orchid_core::Intent;
use orchid_tools::ChainClient;

/// Snapshot of the execution environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentData {
    /// Network head, when reachable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Value>,

    /// Account data for wallet entities named by the intent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Value>,

    /// Price snapshot for token entities named by the intent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prices: Option<Value>,

    /// Broader market context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<Value>,

    pub timestamp: DateTime<Utc>,

    /// True when sensing partially or fully failed.
    #[serde(default)]
    pub error: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl EnvironmentData {
    /// Snapshot representing a sensing failure.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            network: None,
            accounts: None,
            prices: None,
            market: None,
            timestamp: Utc::now(),
            error: true,
            error_message: Some(message.into()),
        }
    }
}

/// Environment collaborator contract. Infallible by design.
#[async_trait]
pub trait EnvironmentSensor: Send + Sync {
    /// Gather environment data relevant to the intent.
    async fn gather(&self, intent: &Intent) -> EnvironmentData;
}

/// Sensor backed by the chain collaborator.
pub struct ChainEnvironmentSensor {
    chain: Arc<dyn ChainClient>,
}

impl ChainEnvironmentSensor {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl EnvironmentSensor for ChainEnvironmentSensor {
    async fn gather(&self, intent: &Intent) -> EnvironmentData {
        let network = match self.chain.network_status().await {
            Ok(status) => match serde_json::to_value(status) {
                Ok(value) => Some(value),
                Err(_) => None,
            },
            Err(e) => {
                warn!(error = %e, "environment sensing degraded: network unreachable");
                return EnvironmentData::degraded(format!("network status unavailable: {}", e));
            }
        };

        let addresses: Vec<String> = intent
            .entities
            .iter()
            .filter(|e| e.kind == "wallet_address")
            .filter_map(|e| e.value.as_str().map(String::from))
            .collect();

        let accounts = if addresses.is_empty() {
            None
        } else {
            match self.chain.fetch_accounts_data(&addresses).await {
                Ok(accounts) => serde_json::to_value(accounts).ok(),
                Err(e) => {
                    warn!(error = %e, "environment sensing degraded: accounts unavailable");
                    None
                }
            }
        };

        let tokens: Vec<&str> = intent
            .entities
            .iter()
            .filter(|e| e.kind == "token")
            .filter_map(|e| e.value.as_str())
            .collect();

        let prices = if tokens.is_empty() {
            None
        } else {
            // Placeholder quotes; a production sensor queries a price oracle.
            Some(json!(tokens
                .iter()
                .map(|t| (t.to_string(), json!({"symbol": t})))
                .collect::<serde_json::Map<String, Value>>()))
        };

        EnvironmentData {
            network,
            accounts,
            prices,
            market: None,
            timestamp: Utc::now(),
            error: false,
            error_message: None,
        }
    }
}
