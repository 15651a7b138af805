use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use sqlx::{Executor, MySql, MySqlPool};

use super::{audit_log_service, created, message, AppState};
use crate::db::ItemFilter;
use crate::error::{map_write_error, AppError, AppResult};
use crate::extract::{ValidJson, ValidPath, ValidQuery};
use crate::guard::ItemDependents;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    AuditEntry, ItemModel, ItemReq, ItemStatus, Permission, ITEM_COLUMNS, PERIPHERAL_CATEGORIES,
};

const DUPLICATE_SERIAL: &str = "An item with this serial number already exists.";
const UNKNOWN_CATEGORY: &str = "Invalid category_id. Please select a valid category.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/peripherals", get(list_peripherals))
        .route("/{id}", get(get_item).put(update_item).delete(delete_item))
}

/// Items matching `filter`, ordered by id.
pub async fn fetch_items(pool: &MySqlPool, filter: &ItemFilter) -> AppResult<Vec<ItemModel>> {
    let mut qb = filter.select_query();
    let items = qb.build_query_as::<ItemModel>().fetch_all(pool).await?;
    Ok(items)
}

pub async fn find_item<'e, E>(executor: E, item_id: i64) -> AppResult<Option<ItemModel>>
where
    E: Executor<'e, Database = MySql>,
{
    let item = sqlx::query_as::<_, ItemModel>(&format!(
        "SELECT {} FROM items i LEFT JOIN categories c ON i.category_id = c.category_id \
         WHERE i.item_id = ?",
        ITEM_COLUMNS
    ))
    .bind(item_id)
    .fetch_optional(executor)
    .await?;
    Ok(item)
}

async fn list_items(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidQuery(filter): ValidQuery<ItemFilter>,
) -> AppResult<Json<Vec<ItemModel>>> {
    user.require(Permission::ViewInventory)?;
    Ok(Json(fetch_items(&state.pool, &filter).await?))
}

/// In-stock items whose category is a peripheral category.
async fn list_peripherals(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<ItemModel>>> {
    user.require(Permission::ViewInventory)?;
    let filter = ItemFilter {
        status: Some(ItemStatus::InStock),
        category_names: PERIPHERAL_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        ..Default::default()
    };
    Ok(Json(fetch_items(&state.pool, &filter).await?))
}

async fn get_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<ItemModel>> {
    user.require(Permission::ViewInventory)?;
    find_item(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Item not found.".into()))
}

async fn create_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidJson(req): ValidJson<ItemReq>,
) -> AppResult<Response> {
    user.require(Permission::ManageInventory)?;
    req.validate()?;
    let status = req.initial_status()?;

    let mut tx = state.pool.begin().await?;
    let result = sqlx::query(
        "INSERT INTO items (category_id, serial_number, brand, model, specifications, vendor, \
         date_of_purchase, warranty_end_date, status) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(req.category_id)
    .bind(req.serial_number.trim())
    .bind(req.brand.trim())
    .bind(req.model.trim())
    .bind(req.specifications())
    .bind(req.vendor())
    .bind(req.date_of_purchase)
    .bind(req.warranty_end_date)
    .bind(status.as_str())
    .execute(&mut *tx)
    .await
    .map_err(|e| map_write_error(e, DUPLICATE_SERIAL, UNKNOWN_CATEGORY))?;
    let item_id = result.last_insert_id() as i64;

    audit_log_service::insert(
        &mut *tx,
        &AuditEntry::new(
            user.user_id,
            item_id,
            format!(
                "Created item {} ({} {})",
                req.serial_number.trim(),
                req.brand.trim(),
                req.model.trim()
            ),
        ),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(item_id, created_by = user.user_id, "Item created");
    Ok(created("Item created successfully!", "itemId", item_id))
}

async fn update_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<ItemReq>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageInventory)?;
    req.validate()?;

    let mut tx = state.pool.begin().await?;
    let current: Option<String> =
        sqlx::query_scalar("SELECT status FROM items WHERE item_id = ? FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let current = current
        .ok_or_else(|| AppError::NotFound("Item not found.".into()))?
        .parse::<ItemStatus>()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let next = req.status.unwrap_or(current);
    if !current.can_edit_to(next) {
        return Err(AppError::InvalidInput(format!(
            "Cannot change status from '{}' to '{}' directly; use issue or receive",
            current, next
        )));
    }

    sqlx::query(
        "UPDATE items SET category_id = ?, serial_number = ?, brand = ?, model = ?, \
         specifications = ?, vendor = ?, date_of_purchase = ?, warranty_end_date = ?, status = ? \
         WHERE item_id = ?",
    )
    .bind(req.category_id)
    .bind(req.serial_number.trim())
    .bind(req.brand.trim())
    .bind(req.model.trim())
    .bind(req.specifications())
    .bind(req.vendor())
    .bind(req.date_of_purchase)
    .bind(req.warranty_end_date)
    .bind(next.as_str())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        map_write_error(
            e,
            "Another item with this serial number already exists.",
            UNKNOWN_CATEGORY,
        )
    })?;
    tx.commit().await?;

    Ok(message("Item updated successfully!"))
}

async fn delete_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::DeleteInventory)?;

    let mut tx = state.pool.begin().await?;
    let item = find_item(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found.".into()))?;

    let dependents = ItemDependents::count(&mut *tx, id).await?;
    if let Err(e) = dependents.ensure_deletable() {
        tracing::info!(item_id = id, ?dependents, "Item deletion refused");
        return Err(e);
    }

    sqlx::query("DELETE FROM items WHERE item_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    audit_log_service::insert(
        &mut *tx,
        &AuditEntry::new(user.user_id, id, format!("Deleted item {}", item.serial_number)),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(item_id = id, deleted_by = user.user_id, "Item deleted");
    Ok(message("Item deleted successfully."))
}
