use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use crate::error::AppError;
use crate::models::Document;
use crate::models::task::{ID_FIELD, TASK_ID};
use crate::store::document::set_path;
use crate::store::{Filter, FindOptions, SortDirection, SortField, TaskStore, new_document_id};

/// Tasks stored one JSON document per row, with `task_id` mirrored into its
/// own column for lookups.
#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    if let Filter::TaskId(id) = filter {
        builder.push(" WHERE task_id = ").push_bind(*id);
    }
}

/// Sort expression for an allow-listed field. Orders by JSON type, then by
/// value, matching `document::compare_values`.
fn order_by(field: SortField, direction: SortDirection) -> String {
    let path = match field {
        SortField::Priority => "$.priority",
        SortField::DueDate => "$.due_date",
    };
    let dir = match direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    };
    format!(
        " ORDER BY CASE json_type(document, '{path}') \
         WHEN 'integer' THEN 1 WHEN 'real' THEN 1 WHEN 'text' THEN 2 \
         WHEN 'object' THEN 3 WHEN 'array' THEN 4 WHEN 'true' THEN 5 WHEN 'false' THEN 5 \
         ELSE 0 END {dir}, json_extract(document, '{path}') {dir}"
    )
}

fn decode(raw: &str) -> Result<Document, AppError> {
    Ok(serde_json::from_str(raw)?)
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn insert_one(&self, mut document: Document) -> Result<String, AppError> {
        let task_id = document
            .get(TASK_ID)
            .and_then(Value::as_i64)
            .ok_or_else(|| AppError::BadRequest("document has no integer task_id".to_string()))?;

        let id = match document.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            _ => {
                let id = new_document_id();
                document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
        };

        sqlx::query("INSERT INTO tasks (id, task_id, document) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(task_id)
            .bind(serde_json::to_string(&document)?)
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    async fn find(&self, options: &FindOptions) -> Result<Vec<Document>, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT document FROM tasks");
        push_filter(&mut builder, &options.filter);
        match &options.sort {
            Some(sort) => builder.push(order_by(sort.field, sort.direction)),
            None => builder.push(" ORDER BY seq"),
        };

        // LIMIT -1 is unbounded in SQLite; larger counts saturate.
        let limit = match options.limit {
            0 => -1,
            n => i64::try_from(n).unwrap_or(i64::MAX),
        };
        builder
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(i64::try_from(options.skip).unwrap_or(i64::MAX));

        debug!("find: {}", builder.sql());
        let rows = builder.build().fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<Document, AppError> {
                let raw: String = row.try_get("document")?;
                Ok(options.projection.apply(decode(&raw)?))
            })
            .collect()
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT document FROM tasks");
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY seq LIMIT 1");

        let row = builder.build().fetch_optional(&self.pool).await?;
        match row {
            Some(row) => {
                let raw: String = row.try_get("document")?;
                Ok(Some(decode(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn update_many(&self, filter: &Filter, set: &[(String, Value)]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT seq, document FROM tasks");
        push_filter(&mut builder, filter);
        let rows = builder.build().fetch_all(&mut *tx).await?;

        let mut modified = 0;
        for row in rows {
            let seq: i64 = row.try_get("seq")?;
            let raw: String = row.try_get("document")?;
            let before = decode(&raw)?;
            let mut document = before.clone();
            for (path, value) in set {
                set_path(&mut document, path, value.clone());
            }
            if document == before {
                continue;
            }

            sqlx::query("UPDATE tasks SET document = ?1 WHERE seq = ?2")
                .bind(serde_json::to_string(&document)?)
                .bind(seq)
                .execute(&mut *tx)
                .await?;
            modified += 1;
        }

        tx.commit().await?;
        Ok(modified)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, AppError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new("DELETE FROM tasks WHERE seq = (SELECT seq FROM tasks");
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY seq LIMIT 1)");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn next_sequence(&self, name: &str) -> Result<i64, AppError> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sequences (name, value) VALUES (?1, 1)
            ON CONFLICT(name) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(value)
    }
}
