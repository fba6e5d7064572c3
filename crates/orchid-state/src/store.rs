//! Store implementations.
//!
//! The storage collaborator persists templates and task results. The engine
//! treats persistence failures after execution as non-fatal: they are
//! reported in result metadata, never raised into the task outcome.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use orchid_core::{Result, TaskResult, TaskTemplate};

/// A stored template with registration metadata.
#[derive(Debug, Clone)]
pub struct TemplateRecord {
    pub template: TaskTemplate,
    pub creator_id: String,
    pub registered_at: DateTime<Utc>,
}

/// Trait for template stores.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Persist a template. A new version of an existing id is a new record.
    async fn store_template(&self, template: TaskTemplate, creator_id: &str) -> Result<String>;

    /// Get the latest record for a template id.
    async fn get_template(&self, id: &str) -> Result<Option<TemplateRecord>>;

    /// List all stored templates, newest registration last.
    async fn list_templates(&self) -> Result<Vec<TemplateRecord>>;
}

/// Trait for task result stores.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a task result; returns a storage reference.
    async fn store_result(&self, result: &TaskResult) -> Result<String>;

    /// Get a stored result by task id.
    async fn get_result(&self, task_id: Uuid) -> Result<Option<TaskResult>>;
}

/// In-memory implementation of both stores.
#[derive(Default)]
pub struct InMemoryStore {
    templates: Arc<RwLock<Vec<TemplateRecord>>>,
    results: Arc<RwLock<HashMap<Uuid, TaskResult>>>,
}

impl InMemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared handle.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl TemplateStore for InMemoryStore {
    async fn store_template(&self, template: TaskTemplate, creator_id: &str) -> Result<String> {
        let id = template.id.clone();
        let record = TemplateRecord {
            template,
            creator_id: creator_id.to_string(),
            registered_at: Utc::now(),
        };
        debug!(template = %id, creator = creator_id, "stored template");
        self.templates.write().await.push(record);
        Ok(id)
    }

    async fn get_template(&self, id: &str) -> Result<Option<TemplateRecord>> {
        let templates = self.templates.read().await;
        // Latest registration wins for a given id.
        Ok(templates.iter().rev().find(|r| r.template.id == id).cloned())
    }

    async fn list_templates(&self) -> Result<Vec<TemplateRecord>> {
        Ok(self.templates.read().await.clone())
    }
}

#[async_trait]
impl ResultStore for InMemoryStore {
    async fn store_result(&self, result: &TaskResult) -> Result<String> {
        self.results
            .write()
            .await
            .insert(result.task_id, result.clone());
        Ok(format!("result_{}", result.task_id.simple()))
    }

    async fn get_result(&self, task_id: Uuid) -> Result<Option<TaskResult>> {
        Ok(self.results.read().await.get(&task_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchid_core::{TaskMetadata, TaskStatus, TemplateCategory};
    use std::collections::BTreeMap;

    fn template(id: &str, version: &str) -> TaskTemplate {
        TaskTemplate {
            id: id.to_string(),
            name: "Test".to_string(),
            version: version.to_string(),
            category: TemplateCategory::Analytics,
            inputs: vec![],
            outputs: vec![],
            steps: vec![],
            permissions: vec![],
            metadata: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_template_roundtrip() {
        let store = InMemoryStore::new();
        store.store_template(template("tpl-1", "1.0.0"), "creator-1").await.unwrap();

        let record = store.get_template("tpl-1").await.unwrap().unwrap();
        assert_eq!(record.creator_id, "creator-1");
        assert!(store.get_template("tpl-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_version_is_a_new_record_latest_wins() {
        let store = InMemoryStore::new();
        store.store_template(template("tpl-1", "1.0.0"), "creator-1").await.unwrap();
        store.store_template(template("tpl-1", "1.1.0"), "creator-1").await.unwrap();

        assert_eq!(store.list_templates().await.unwrap().len(), 2);
        let latest = store.get_template("tpl-1").await.unwrap().unwrap();
        assert_eq!(latest.template.version, "1.1.0");
    }

    #[tokio::test]
    async fn test_result_roundtrip() {
        let store = InMemoryStore::new();
        let result = TaskResult {
            task_id: Uuid::new_v4(),
            status: TaskStatus::Success,
            outputs: BTreeMap::new(),
            error: None,
            metadata: TaskMetadata::default(),
        };

        let reference = store.store_result(&result).await.unwrap();
        assert!(reference.starts_with("result_"));

        let fetched = store.get_result(result.task_id).await.unwrap().unwrap();
        assert_eq!(fetched.task_id, result.task_id);
    }
}
