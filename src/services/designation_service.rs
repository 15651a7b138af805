use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};

use super::{created, message, AppState};
use crate::error::{conflict_on_duplicate, AppError, AppResult};
use crate::extract::{ValidJson, ValidPath};
use crate::middleware::AuthenticatedUser;
use crate::models::{DesignationModel, DesignationReq, Permission};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_designations).post(create_designation))
        .route(
            "/{id}",
            get(get_designation)
                .put(update_designation)
                .delete(delete_designation),
        )
}

async fn list_designations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<DesignationModel>>> {
    user.require(Permission::ManageOrganization)?;
    let rows = sqlx::query_as::<_, DesignationModel>(
        "SELECT designation_id, designation_title FROM designations ORDER BY designation_title",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(rows))
}

async fn get_designation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<DesignationModel>> {
    user.require(Permission::ManageOrganization)?;
    sqlx::query_as::<_, DesignationModel>(
        "SELECT designation_id, designation_title FROM designations WHERE designation_id = ?",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound("Designation not found".into()))
}

async fn create_designation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidJson(req): ValidJson<DesignationReq>,
) -> AppResult<Response> {
    user.require(Permission::ManageOrganization)?;
    let title = req.validate()?;
    let result = sqlx::query("INSERT INTO designations (designation_title) VALUES (?)")
        .bind(title)
        .execute(&state.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "Designation already exists."))?;
    Ok(created(
        "Designation created successfully!",
        "designationId",
        result.last_insert_id() as i64,
    ))
}

async fn update_designation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<DesignationReq>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageOrganization)?;
    let title = req.validate()?;
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT designation_id FROM designations WHERE designation_id = ?")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Designation not found.".into()));
    }
    sqlx::query("UPDATE designations SET designation_title = ? WHERE designation_id = ?")
        .bind(title)
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "Designation already exists."))?;
    Ok(message("Designation updated successfully!"))
}

async fn delete_designation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageOrganization)?;
    let result = sqlx::query("DELETE FROM designations WHERE designation_id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Designation not found.".into()));
    }
    Ok(message("Designation deleted successfully!"))
}
