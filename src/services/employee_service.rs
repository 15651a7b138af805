use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};

use super::{created, message, AppState};
use crate::error::{AppError, AppResult};
use crate::extract::{ValidJson, ValidPath};
use crate::middleware::AuthenticatedUser;
use crate::models::{EmployeeModel, EmployeeReq, Permission};

const EMPLOYEE_COLUMNS: &str = "employee_id, employee_name, department_id, designation_id";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route("/departments", get(list_used_departments))
        .route("/designations", get(list_used_designations))
        .route(
            "/{id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

async fn list_employees(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<EmployeeModel>>> {
    user.require(Permission::ViewEmployees)?;
    let rows = sqlx::query_as::<_, EmployeeModel>(&format!(
        "SELECT {} FROM employees ORDER BY employee_name",
        EMPLOYEE_COLUMNS
    ))
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(rows))
}

/// Distinct, non-empty department values currently used by employees.
async fn list_used_departments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<String>>> {
    user.require(Permission::ViewEmployees)?;
    let values: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT department_id FROM employees \
         WHERE department_id IS NOT NULL AND department_id <> '' ORDER BY department_id",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(values))
}

async fn list_used_designations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<String>>> {
    user.require(Permission::ViewEmployees)?;
    let values: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT designation_id FROM employees \
         WHERE designation_id IS NOT NULL AND designation_id <> '' ORDER BY designation_id",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(values))
}

async fn get_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<EmployeeModel>> {
    user.require(Permission::ViewEmployees)?;
    sqlx::query_as::<_, EmployeeModel>(&format!(
        "SELECT {} FROM employees WHERE employee_id = ?",
        EMPLOYEE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound("Employee not found".into()))
}

async fn create_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidJson(req): ValidJson<EmployeeReq>,
) -> AppResult<Response> {
    user.require(Permission::ManageEmployees)?;
    req.validate()?;
    let result = sqlx::query(
        "INSERT INTO employees (employee_name, department_id, designation_id) VALUES (?, ?, ?)",
    )
    .bind(req.employee_name.trim())
    .bind(req.department_id.trim())
    .bind(req.designation_id.trim())
    .execute(&state.pool)
    .await?;
    Ok(created(
        "Employee created successfully!",
        "employeeId",
        result.last_insert_id() as i64,
    ))
}

async fn update_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<EmployeeReq>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageEmployees)?;
    req.validate()?;
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT employee_id FROM employees WHERE employee_id = ?")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Employee not found.".into()));
    }
    sqlx::query(
        "UPDATE employees SET employee_name = ?, department_id = ?, designation_id = ? \
         WHERE employee_id = ?",
    )
    .bind(req.employee_name.trim())
    .bind(req.department_id.trim())
    .bind(req.designation_id.trim())
    .bind(id)
    .execute(&state.pool)
    .await?;
    Ok(message("Employee updated successfully!"))
}

async fn delete_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageEmployees)?;
    let result = sqlx::query("DELETE FROM employees WHERE employee_id = ?")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::InvalidInput(
                "Cannot delete employee. They have issuance history.".into(),
            ),
            _ => AppError::Database(e),
        })?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Employee not found.".into()));
    }
    Ok(message("Employee deleted successfully!"))
}
