//! # Orchid State
//!
//! Template and result storage for the Orchid engine. Provides the storage
//! collaborator traits plus an in-memory implementation used by the node
//! and in tests.

pub mod store;

pub use store::{InMemoryStore, ResultStore, TemplateRecord, TemplateStore};
