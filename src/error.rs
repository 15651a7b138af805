use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    /// The target exists but is in a state that does not allow the operation.
    #[error("{message}")]
    InvalidState {
        message: String,
        unavailable_items: Vec<i64>,
    },

    /// Deletion refused because other rows still reference the target.
    #[error("{message}")]
    HasDependents {
        message: String,
        count_field: &'static str,
        count: i64,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("File too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        AppError::InvalidState {
            message: message.into(),
            unavailable_items: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_)
            | AppError::InvalidState { .. }
            | AppError::HasDependents { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::InvalidInput(_) => "validation_error",
            AppError::InvalidState { .. } => "invalid_state",
            AppError::HasDependents { .. } => "has_dependents",
            AppError::Conflict(_) => "conflict",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::PayloadTooLarge { .. } => "payload_too_large",
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => "internal_error",
        }
    }

    fn body(&self) -> Value {
        let mut body = Map::new();
        let message = if self.status().is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        body.insert("message".into(), json!(message));
        body.insert("code".into(), json!(self.code()));

        match self {
            AppError::InvalidState {
                unavailable_items, ..
            } if !unavailable_items.is_empty() => {
                body.insert("unavailableItems".into(), json!(unavailable_items));
            }
            AppError::HasDependents {
                count_field, count, ..
            } => {
                body.insert((*count_field).into(), json!(count));
            }
            _ => {}
        }
        Value::Object(body)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

/// Maps a unique-key violation to `Conflict`, passing other errors through.
pub fn conflict_on_duplicate(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

/// Maps unique and foreign-key violations of a write to client errors.
pub fn map_write_error(err: sqlx::Error, duplicate: &str, foreign_key: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::InvalidInput(foreign_key.to_string())
        }
        _ => conflict_on_duplicate(err, duplicate),
    }
}

pub type AppResult<T> = Result<T, AppError>;
