use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),

    /// A stored date field holds something other than a string.
    #[error("Malformed date field: {0}")]
    MalformedDate(String),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// The only body a client ever sees on failure.
#[derive(Debug, Serialize)]
pub struct FailResponse {
    #[serde(rename = "Result")]
    pub result: &'static str,
}

impl FailResponse {
    pub const FAIL: FailResponse = FailResponse { result: "fail" };
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound => return StatusCode::NOT_FOUND.into_response(),
            AppError::BadRequest(msg) => {
                debug!("bad request: {}", msg);
                StatusCode::BAD_REQUEST
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidTimestamp(e) => {
                error!("stored date could not be parsed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::MalformedDate(msg) => {
                error!("stored date has the wrong type: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            other => {
                error!("internal error: {}", other);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(FailResponse::FAIL)).into_response()
    }
}
