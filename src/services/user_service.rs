use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};

use super::auth_service::hash_password;
use super::{created, message, AppState};
use crate::error::{conflict_on_duplicate, AppError, AppResult};
use crate::extract::{ValidJson, ValidPath};
use crate::middleware::AuthenticatedUser;
use crate::models::{Permission, UserModel, UserReq};

const DUPLICATE_USERNAME: &str = "Username already exists.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}

async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<UserModel>>> {
    user.require(Permission::ManageUsers)?;
    let users = sqlx::query_as::<_, UserModel>(
        "SELECT user_id, username, role FROM users ORDER BY username",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<UserModel>> {
    user.require(Permission::ManageUsers)?;
    sqlx::query_as::<_, UserModel>("SELECT user_id, username, role FROM users WHERE user_id = ?")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

async fn create_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidJson(req): ValidJson<UserReq>,
) -> AppResult<Response> {
    user.require(Permission::ManageUsers)?;
    let (password, role) = req.validate_create()?;
    let password_hash = hash_password(password)?;

    let result = sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, ?)")
        .bind(req.username.trim())
        .bind(&password_hash)
        .bind(role.as_str())
        .execute(&state.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, DUPLICATE_USERNAME))?;

    let user_id = result.last_insert_id() as i64;
    tracing::info!(user_id, %role, created_by = user.user_id, "User created");
    Ok(created("User created successfully!", "userId", user_id))
}

async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<UserReq>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageUsers)?;
    let (password, role) = req.validate_update()?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT user_id FROM users WHERE user_id = ?")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("User not found.".into()));
    }

    let query = match password {
        Some(p) => sqlx::query("UPDATE users SET username = ?, role = ?, password = ? WHERE user_id = ?")
            .bind(req.username.trim())
            .bind(role.as_str())
            .bind(hash_password(p)?),
        None => sqlx::query("UPDATE users SET username = ?, role = ? WHERE user_id = ?")
            .bind(req.username.trim())
            .bind(role.as_str()),
    };
    query
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, DUPLICATE_USERNAME))?;

    Ok(message("User updated successfully!"))
}

async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageUsers)?;
    if id == user.user_id {
        return Err(AppError::InvalidInput("You cannot delete your own account.".into()));
    }
    let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found.".into()));
    }
    tracing::info!(user_id = id, deleted_by = user.user_id, "User deleted");
    Ok(message("User deleted successfully!"))
}
