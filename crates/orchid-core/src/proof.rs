//! Execution proof.
//!
//! An ExecutionProof is a verifiable digest over a task's ordered step
//! history, submitted to the chain collaborator after a completed run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::result::StepExecutionResult;

/// Verifiable summary of one task execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionProof {
    /// Unique identifier for this proof.
    pub id: Uuid,

    /// The task this proof covers.
    pub task_id: Uuid,

    /// Root digest over the ordered step history.
    pub root: String,

    /// Number of history entries covered.
    pub step_count: usize,

    /// Timestamp when the proof was built.
    pub created_at: DateTime<Utc>,
}

impl ExecutionProof {
    /// Build a proof over the given step history.
    pub fn from_history(task_id: Uuid, history: &[StepExecutionResult]) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            root: compute_root(history),
            step_count: history.len(),
            created_at: Utc::now(),
        }
    }

    /// Verify the root against a history. True when the digest matches.
    pub fn verify(&self, history: &[StepExecutionResult]) -> bool {
        self.step_count == history.len() && self.root == compute_root(history)
    }
}

/// Compute the root digest: each history entry is hashed, then pairs are
/// folded upward until one hash remains (odd tails are duplicated).
fn compute_root(history: &[StepExecutionResult]) -> String {
    if history.is_empty() {
        return "0".repeat(64);
    }

    let mut hashes: Vec<Vec<u8>> = history
        .iter()
        .map(|result| {
            let json = serde_json::to_string(result).unwrap_or_default();
            let mut hasher = Sha256::new();
            hasher.update(json.as_bytes());
            hasher.finalize().to_vec()
        })
        .collect();

    while hashes.len() > 1 {
        let mut next_level = Vec::new();

        for chunk in hashes.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(&chunk[0]);
            if chunk.len() > 1 {
                hasher.update(&chunk[1]);
            } else {
                hasher.update(&chunk[0]);
            }
            next_level.push(hasher.finalize().to_vec());
        }

        hashes = next_level;
    }

    hashes
        .first()
        .map(|h| h.iter().map(|b| format!("{:02x}", b)).collect())
        .unwrap_or_else(|| "0".repeat(64))
}
