use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::error::AppError;
use crate::models::Document;

/// Reads sample tasks from a JSON file holding either an object of tasks
/// keyed by anything, or an array of tasks. Non-object entries are skipped.
pub async fn load_sample_data(path: &Path) -> Result<Vec<Document>, AppError> {
    let raw = tokio::fs::read(path).await?;
    parse_sample_data(&raw)
}

pub fn parse_sample_data(raw: &[u8]) -> Result<Vec<Document>, AppError> {
    let entries: Vec<Value> = match serde_json::from_slice::<Value>(raw)? {
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        Value::Array(items) => items,
        _ => {
            return Err(AppError::Config(
                "sample data must be a JSON object or array".to_string(),
            ));
        }
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(task) => Some(task),
            other => {
                warn!("ignoring non-object sample entry: {}", other);
                None
            }
        })
        .collect())
}
