use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::task::{DUE_DATE, ID_FIELD, LAST_MODIFIED_PATH};
use crate::models::{Document, LastModified, NewTaskRequest, TaskPatch, time};
use crate::query::{QueryConfig, ReadTarget};
use crate::services::{status, update_guard};
use crate::store::{Filter, FindOptions, TASK_SEQUENCE, TaskStore};

/// Result of an accepted conditional update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Documents changed, summed over every field written.
    pub updates: u64,
    pub last_modified: NaiveDateTime,
}

impl UpdateOutcome {
    pub fn last_modified_header(&self) -> String {
        time::format_timestamp(self.last_modified)
    }
}

/// Task operations over an injected store.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Creates a task and returns its `task_id`.
    pub async fn create(&self, request: NewTaskRequest, now: NaiveDateTime) -> Result<i64, AppError> {
        request.validate()?;

        let task_id = self.store.next_sequence(TASK_SEQUENCE).await?;
        let document = request.into_document(task_id, now);
        let id = self.store.insert_one(document).await?;

        info!(task_id, %id, "task created");
        Ok(task_id)
    }

    /// Runs a read: filter, projection, sort, skip, limit, then the due-date
    /// post-filter. Pagination happens before status filtering, so a page may
    /// come back shorter than `limit`.
    pub async fn read(
        &self,
        target: ReadTarget,
        config: &QueryConfig,
        now: NaiveDateTime,
    ) -> Result<Vec<Document>, AppError> {
        let filtering = config.status.is_active();
        // classification needs due_date even when the caller did not ask for it
        let strip_due_date = filtering && !config.projection.includes(DUE_DATE);
        let projection = if strip_due_date {
            config.projection.with_field(DUE_DATE)
        } else {
            config.projection.clone()
        };

        let options = FindOptions {
            filter: target.filter(),
            projection,
            sort: config.sort(),
            skip: config.offset,
            limit: config.limit,
        };
        let documents = self.store.find(&options).await?;
        debug!(found = documents.len(), ?options, "tasks fetched");

        let mut tasks = Vec::with_capacity(documents.len());
        for mut document in documents {
            if filtering {
                let due = status::classify(document.get(DUE_DATE), now)?;
                if !config.status.admits(due) {
                    continue;
                }
            }
            if strip_due_date {
                document.remove(DUE_DATE);
            }
            stringify_identity(&mut document);
            tasks.push(document);
        }

        Ok(tasks)
    }

    /// Applies a patch of mutable fields if the last-modified guard allows it.
    /// Nothing is written when the request is rejected.
    pub async fn try_update(
        &self,
        task_id: i64,
        patch: TaskPatch,
        now: NaiveDateTime,
    ) -> Result<UpdateOutcome, AppError> {
        if patch.is_empty() {
            return Err(AppError::BadRequest("patch has no updatable field".to_string()));
        }
        if task_id <= 0 {
            return Err(AppError::BadRequest(format!("invalid task id {task_id}")));
        }

        let filter = Filter::TaskId(task_id);
        let stored = match self.store.find_one(&filter).await? {
            Some(document) => LastModified::from_document(&document)?,
            None => LastModified::Never,
        };

        if !update_guard::admits(stored, now) {
            warn!(task_id, ?stored, %now, "update rejected: stored last-modified is ahead of now");
            return Err(AppError::BadRequest("task was modified after this request".to_string()));
        }

        let stamp = Value::String(time::format_timestamp(now));
        let mut updates = 0;
        for (field, value) in patch.changes() {
            let set = [
                (field.as_str().to_string(), value.clone()),
                (LAST_MODIFIED_PATH.to_string(), stamp.clone()),
            ];
            updates += self.store.update_many(&filter, &set).await?;
        }

        info!(task_id, updates, "task updated");
        Ok(UpdateOutcome { updates, last_modified: now })
    }

    /// Deletes by exact `task_id`. A missing task is not an error.
    pub async fn delete(&self, task_id: i64) -> Result<u64, AppError> {
        let deleted = self.store.delete_one(&Filter::TaskId(task_id)).await?;
        info!(task_id, deleted, "task delete");
        Ok(deleted)
    }

    /// Creates each entry through the normal create path, but only into an
    /// empty collection. Entries missing required fields are skipped.
    pub async fn seed(&self, entries: Vec<Document>, now: NaiveDateTime) -> Result<usize, AppError> {
        if self.store.count().await? > 0 {
            info!("collection already populated, skipping sample data");
            return Ok(0);
        }

        let mut created = 0;
        for entry in entries {
            match self.create(NewTaskRequest::from_document(entry), now).await {
                Ok(_) => created += 1,
                Err(AppError::BadRequest(msg)) => warn!("skipping sample task: {}", msg),
                Err(e) => return Err(e),
            }
        }

        info!(created, "sample data loaded");
        Ok(created)
    }
}

/// `_id` always goes out as a string.
fn stringify_identity(document: &mut Document) {
    if let Some(id) = document.get_mut(ID_FIELD) {
        if !id.is_string() {
            *id = Value::String(id.to_string());
        }
    }
}
