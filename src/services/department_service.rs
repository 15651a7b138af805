use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};

use super::{created, message, AppState};
use crate::error::{conflict_on_duplicate, AppError, AppResult};
use crate::extract::{ValidJson, ValidPath};
use crate::middleware::AuthenticatedUser;
use crate::models::{DepartmentModel, DepartmentReq, Permission};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route(
            "/{id}",
            get(get_department)
                .put(update_department)
                .delete(delete_department),
        )
}

async fn list_departments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<DepartmentModel>>> {
    user.require(Permission::ManageOrganization)?;
    let rows = sqlx::query_as::<_, DepartmentModel>(
        "SELECT department_id, department_name FROM departments ORDER BY department_name",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(rows))
}

async fn get_department(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<DepartmentModel>> {
    user.require(Permission::ManageOrganization)?;
    sqlx::query_as::<_, DepartmentModel>(
        "SELECT department_id, department_name FROM departments WHERE department_id = ?",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound("Department not found".into()))
}

async fn create_department(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidJson(req): ValidJson<DepartmentReq>,
) -> AppResult<Response> {
    user.require(Permission::ManageOrganization)?;
    let name = req.validate()?;
    let result = sqlx::query("INSERT INTO departments (department_name) VALUES (?)")
        .bind(name)
        .execute(&state.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "Department already exists."))?;
    Ok(created(
        "Department created successfully!",
        "departmentId",
        result.last_insert_id() as i64,
    ))
}

async fn update_department(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<DepartmentReq>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageOrganization)?;
    let name = req.validate()?;
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT department_id FROM departments WHERE department_id = ?")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Department not found.".into()));
    }
    sqlx::query("UPDATE departments SET department_name = ? WHERE department_id = ?")
        .bind(name)
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "Department already exists."))?;
    Ok(message("Department updated successfully!"))
}

async fn delete_department(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageOrganization)?;
    let result = sqlx::query("DELETE FROM departments WHERE department_id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Department not found.".into()));
    }
    Ok(message("Department deleted successfully!"))
}
