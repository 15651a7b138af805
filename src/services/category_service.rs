use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::{message, AppState};
use crate::error::{conflict_on_duplicate, AppError, AppResult};
use crate::extract::{ValidJson, ValidPath};
use crate::guard::CategoryDependents;
use crate::middleware::AuthenticatedUser;
use crate::models::{CategoryModel, CategoryReq, Permission};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

async fn list_categories(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<CategoryModel>>> {
    user.require(Permission::ViewCategories)?;
    let categories = sqlx::query_as::<_, CategoryModel>(
        "SELECT category_id, category_name FROM categories ORDER BY category_name",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(categories))
}

async fn get_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<CategoryModel>> {
    user.require(Permission::ViewCategories)?;
    sqlx::query_as::<_, CategoryModel>(
        "SELECT category_id, category_name FROM categories WHERE category_id = ?",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound("Category not found".into()))
}

async fn create_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidJson(req): ValidJson<CategoryReq>,
) -> AppResult<(StatusCode, Json<CategoryModel>)> {
    user.require(Permission::ManageCategories)?;
    let name = req.validate()?;
    let result = sqlx::query("INSERT INTO categories (category_name) VALUES (?)")
        .bind(name)
        .execute(&state.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "Category already exists."))?;
    Ok((
        StatusCode::CREATED,
        Json(CategoryModel {
            category_id: result.last_insert_id() as i64,
            category_name: name.to_string(),
        }),
    ))
}

async fn update_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<CategoryReq>,
) -> AppResult<Json<CategoryModel>> {
    user.require(Permission::ManageCategories)?;
    let name = req.validate()?;
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT category_id FROM categories WHERE category_id = ?")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Category not found".into()));
    }
    sqlx::query("UPDATE categories SET category_name = ? WHERE category_id = ?")
        .bind(name)
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "Category already exists."))?;
    Ok(Json(CategoryModel {
        category_id: id,
        category_name: name.to_string(),
    }))
}

async fn delete_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::DeleteCategories)?;

    let mut tx = state.pool.begin().await?;
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT category_id FROM categories WHERE category_id = ? FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Category not found".into()));
    }

    CategoryDependents::count(&mut *tx, id)
        .await?
        .ensure_deletable()?;

    sqlx::query("DELETE FROM categories WHERE category_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(category_id = id, deleted_by = user.user_id, "Category deleted");
    Ok(message("Category deleted successfully"))
}
