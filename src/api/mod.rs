use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Uri, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::models::{Document, NewTaskRequest, TaskPatch, time};
use crate::query::{QueryConfig, ReadTarget};
use crate::services::TaskService;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tasks", get(read_tasks).fallback(not_found))
        .route(
            "/api/tasks/task",
            post(create_task)
                .get(read_tasks)
                .patch(update_task)
                .delete(delete_task)
                .fallback(not_found),
        )
        .route("/api/tasks/", get(read_tasks).patch(update_task).delete(delete_task).fallback(not_found))
        .route(
            "/api/tasks/{segment}",
            get(read_tasks).patch(update_task).delete(delete_task).fallback(not_found),
        )
        .fallback(not_found)
        .layer(middleware::from_fn(stamp_etag))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The last path segment names the target, whichever route matched.
fn last_segment(uri: &Uri) -> &str {
    uri.path().rsplit('/').next().unwrap_or_default()
}

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Every response carries the server time as its `ETag`.
async fn stamp_etag(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&time::format_timestamp(time::now())) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

async fn read_tasks(State(state): State<AppState>, uri: Uri) -> Result<Json<Vec<Document>>, AppError> {
    let target = ReadTarget::from_segment(last_segment(&uri))?;
    let config = QueryConfig::parse(uri.query())?;

    let tasks = TaskService::new(state.store.clone())
        .read(target, &config, time::now())
        .await?;
    Ok(Json(tasks))
}

async fn create_task(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, AppError> {
    let task_id = TaskService::new(state.store.clone())
        .create(NewTaskRequest::from_body(&body), time::now())
        .await?;
    Ok(Json(json!({ "success": task_id.to_string() })))
}

async fn update_task(
    State(state): State<AppState>,
    uri: Uri,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    // Anything that is not an integer falls through to the positive-id check.
    let task_id = last_segment(&uri).parse::<i64>().unwrap_or(-1);
    let outcome = TaskService::new(state.store.clone())
        .try_update(task_id, TaskPatch::from_body(&body), time::now())
        .await?;

    Ok((
        [(header::LAST_MODIFIED, outcome.last_modified_header())],
        Json(json!({ "updates": outcome.updates })),
    ))
}

async fn delete_task(State(state): State<AppState>, uri: Uri) -> Result<Json<Value>, AppError> {
    let deleted = match last_segment(&uri).parse::<i64>() {
        Ok(task_id) => TaskService::new(state.store.clone()).delete(task_id).await?,
        Err(_) => 0,
    };
    Ok(Json(json!({ "deleted": deleted })))
}
