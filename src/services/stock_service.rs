use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};

use super::{created, message, AppState};
use crate::error::{map_write_error, AppError, AppResult};
use crate::extract::{ValidJson, ValidPath};
use crate::middleware::AuthenticatedUser;
use crate::models::{validate_quantity, CreateStockReq, Permission, StockModel, UpdateStockReq};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stock).post(create_stock))
        .route("/{id}", get(get_stock).put(update_stock).delete(delete_stock))
}

async fn list_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<StockModel>>> {
    user.require(Permission::ManageStock)?;
    let rows = sqlx::query_as::<_, StockModel>(
        "SELECT stock_id, item_id, quantity_in_stock FROM stock ORDER BY stock_id",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(rows))
}

async fn get_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<StockModel>> {
    user.require(Permission::ManageStock)?;
    sqlx::query_as::<_, StockModel>(
        "SELECT stock_id, item_id, quantity_in_stock FROM stock WHERE stock_id = ?",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound("Stock record not found".into()))
}

async fn create_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidJson(req): ValidJson<CreateStockReq>,
) -> AppResult<Response> {
    user.require(Permission::ManageStock)?;
    let quantity = validate_quantity(req.quantity_in_stock)?;
    let result = sqlx::query("INSERT INTO stock (item_id, quantity_in_stock) VALUES (?, ?)")
        .bind(req.item_id)
        .bind(quantity)
        .execute(&state.pool)
        .await
        .map_err(|e| map_write_error(e, "Stock record already exists.", "Item not found"))?;
    Ok(created(
        "Stock record created successfully!",
        "stockId",
        result.last_insert_id() as i64,
    ))
}

async fn update_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<UpdateStockReq>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageStock)?;
    let quantity = validate_quantity(req.quantity_in_stock)?;
    let exists: Option<i64> = sqlx::query_scalar("SELECT stock_id FROM stock WHERE stock_id = ?")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Stock record not found.".into()));
    }
    sqlx::query("UPDATE stock SET quantity_in_stock = ? WHERE stock_id = ?")
        .bind(quantity)
        .bind(id)
        .execute(&state.pool)
        .await?;
    Ok(message("Stock updated successfully!"))
}

async fn delete_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageStock)?;
    let result = sqlx::query("DELETE FROM stock WHERE stock_id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Stock record not found.".into()));
    }
    Ok(message("Stock record deleted successfully!"))
}
