pub mod audit_log_service;
pub mod auth_service;
pub mod category_service;
pub mod department_service;
pub mod designation_service;
pub mod document_service;
pub mod employee_service;
pub mod health_service;
pub mod issuance_service;
pub mod items_service;
pub mod report_service;
pub mod stock_service;
pub mod user_service;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::MySqlPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::AuthLayer;
use crate::storage::DocumentStorage;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: MySqlPool,
    pub config: Arc<Config>,
    pub storage: Arc<dyn DocumentStorage>,
}

impl AppState {
    pub fn new(pool: MySqlPool, config: Config, storage: Arc<dyn DocumentStorage>) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            storage,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any)
        .expose_headers(Any);

    // a full upload batch plus room for the multipart framing
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(state.config.max_files_per_upload)
        .saturating_add(1024 * 1024);

    Router::new()
        .merge(health_service::routes())
        .nest("/api/auth", auth_service::routes())
        .nest("/api/items", items_service::routes())
        .nest("/api/categories", category_service::routes())
        .nest("/api/issuance", issuance_service::routes())
        .nest("/api/employees", employee_service::routes())
        .nest("/api/departments", department_service::routes())
        .nest("/api/designations", designation_service::routes())
        .nest("/api/users", user_service::routes())
        .nest("/api/documents", document_service::routes())
        .nest("/api/audit-logs", audit_log_service::routes())
        .nest("/api/stock", stock_service::routes())
        .nest("/api/reports", report_service::routes())
        .nest("/api/search", report_service::search_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(AuthLayer::new(&state.config.jwt_secret))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `{ "message": ... }` with 200.
pub(crate) fn message(text: impl Into<String>) -> Json<Value> {
    Json(json!({ "message": text.into() }))
}

/// 201 with a message and the new row id under `id_field`.
pub(crate) fn created(text: impl Into<String>, id_field: &str, id: i64) -> Response {
    let mut body = serde_json::Map::new();
    body.insert("message".into(), json!(text.into()));
    body.insert(id_field.into(), json!(id));
    (StatusCode::CREATED, Json(Value::Object(body))).into_response()
}
