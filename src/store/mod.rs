pub mod document;
pub mod find;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;
use crate::models::Document;

pub use find::{Filter, FindOptions, Projection, Sort, SortDirection, SortField};
pub use memory::MemoryTaskStore;
pub use sqlite::SqliteTaskStore;

/// Name of the sequence that hands out `task_id`s.
pub const TASK_SEQUENCE: &str = "task_id";

/// Document-store operations the task service relies on.
///
/// Implementations own their connection lifecycle; callers only ever see
/// whole documents.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Stores a document, assigning `_id` when it has none. Returns the `_id`.
    async fn insert_one(&self, document: Document) -> Result<String, AppError>;

    async fn find(&self, options: &FindOptions) -> Result<Vec<Document>, AppError>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, AppError>;

    /// Sets every `(path, value)` pair on each matching document. Returns how
    /// many documents actually changed.
    async fn update_many(&self, filter: &Filter, set: &[(String, Value)]) -> Result<u64, AppError>;

    /// Removes the first matching document. Returns 0 or 1.
    async fn delete_one(&self, filter: &Filter) -> Result<u64, AppError>;

    async fn count(&self) -> Result<u64, AppError>;

    /// Atomically increments the named counter and returns the new value.
    /// The first call for a name returns 1.
    async fn next_sequence(&self, name: &str) -> Result<i64, AppError>;
}

pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
