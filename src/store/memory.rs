use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::models::Document;
use crate::models::task::ID_FIELD;
use crate::store::document::set_path;
use crate::store::{Filter, FindOptions, TaskStore, new_document_id};

#[derive(Default)]
struct Collection {
    documents: Vec<Document>,
    sequences: HashMap<String, i64>,
}

/// Process-local store keeping documents in insertion order.
#[derive(Default)]
pub struct MemoryTaskStore {
    inner: Mutex<Collection>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert_one(&self, mut document: Document) -> Result<String, AppError> {
        let id = match document.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => {
                let id = new_document_id();
                document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
        };
        self.inner.lock().await.documents.push(document);
        Ok(id)
    }

    async fn find(&self, options: &FindOptions) -> Result<Vec<Document>, AppError> {
        let collection = self.inner.lock().await;
        let mut matched: Vec<&Document> = collection
            .documents
            .iter()
            .filter(|d| options.filter.matches(d))
            .collect();

        if let Some(sort) = &options.sort {
            matched.sort_by(|a, b| sort.compare(a, b));
        }

        let take = match options.limit {
            0 => usize::MAX,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };
        Ok(matched
            .into_iter()
            .skip(usize::try_from(options.skip).unwrap_or(usize::MAX))
            .take(take)
            .map(|d| options.projection.apply(d.clone()))
            .collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, AppError> {
        let collection = self.inner.lock().await;
        Ok(collection.documents.iter().find(|d| filter.matches(d)).cloned())
    }

    async fn update_many(&self, filter: &Filter, set: &[(String, Value)]) -> Result<u64, AppError> {
        let mut collection = self.inner.lock().await;
        let mut modified = 0;
        for document in collection.documents.iter_mut().filter(|d| filter.matches(d)) {
            let before = document.clone();
            for (path, value) in set {
                set_path(document, path, value.clone());
            }
            if *document != before {
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, AppError> {
        let mut collection = self.inner.lock().await;
        match collection.documents.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                collection.documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.inner.lock().await.documents.len() as u64)
    }

    async fn next_sequence(&self, name: &str) -> Result<i64, AppError> {
        let mut collection = self.inner.lock().await;
        let value = collection.sequences.entry(name.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}
