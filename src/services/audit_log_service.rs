use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use sqlx::{Executor, MySql};

use super::{created, message, AppState};
use crate::error::{AppError, AppResult};
use crate::extract::{ValidJson, ValidPath};
use crate::middleware::AuthenticatedUser;
use crate::models::{AuditEntry, AuditLogModel, AuditLogReq, Permission};

const AUDIT_COLUMNS: &str = "audit_id, user_id, item_id, action_performed, `timestamp`";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_audit_logs).post(create_audit_log))
        .route("/{id}", get(get_audit_log).delete(delete_audit_log))
}

/// Writes one audit row on whatever connection or transaction is given.
pub async fn insert<'e, E>(executor: E, entry: &AuditEntry) -> AppResult<i64>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        "INSERT INTO audit_logs (user_id, item_id, action_performed) VALUES (?, ?, ?)",
    )
    .bind(entry.user_id)
    .bind(entry.item_id)
    .bind(&entry.action_performed)
    .execute(executor)
    .await?;
    Ok(result.last_insert_id() as i64)
}

async fn list_audit_logs(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<AuditLogModel>>> {
    user.require(Permission::ViewAuditLogs)?;
    let logs = sqlx::query_as::<_, AuditLogModel>(&format!(
        "SELECT {} FROM audit_logs ORDER BY `timestamp` DESC, audit_id DESC",
        AUDIT_COLUMNS
    ))
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(logs))
}

async fn get_audit_log(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<AuditLogModel>> {
    user.require(Permission::ViewAuditLogs)?;
    sqlx::query_as::<_, AuditLogModel>(&format!(
        "SELECT {} FROM audit_logs WHERE audit_id = ?",
        AUDIT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound("Audit log not found".into()))
}

async fn create_audit_log(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidJson(req): ValidJson<AuditLogReq>,
) -> AppResult<Response> {
    user.require(Permission::ViewAuditLogs)?;
    let mut entry = req.validate()?;
    entry.user_id = entry.user_id.or(Some(user.user_id));
    let audit_id = insert(&state.pool, &entry).await?;
    Ok(created("Audit log created successfully!", "auditId", audit_id))
}

async fn delete_audit_log(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ViewAuditLogs)?;
    let result = sqlx::query("DELETE FROM audit_logs WHERE audit_id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Audit log not found.".into()));
    }
    tracing::info!(audit_id = id, deleted_by = user.user_id, "Audit log deleted");
    Ok(message("Audit log deleted successfully!"))
}
