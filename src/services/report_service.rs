use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use sqlx::{MySql, QueryBuilder};

use super::items_service::fetch_items;
use super::AppState;
use crate::db::ItemFilter;
use crate::error::{AppError, AppResult};
use crate::extract::{ValidPath, ValidQuery};
use crate::middleware::AuthenticatedUser;
use crate::models::{
    de, IssuanceLogModel, ItemModel, Permission, StatusCount, StockReport, TransactionsQuery,
    LOG_SELECT,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock", get(stock_report))
        .route("/items/{category}", get(items_by_category))
        .route("/model/{model}", get(items_by_model))
        .route("/employee/{id}", get(items_by_employee))
        .route("/transactions", get(transactions))
}

pub fn search_routes() -> Router<AppState> {
    Router::new().route("/", get(search_items))
}

async fn stock_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<StockReport>> {
    user.require(Permission::ViewReports)?;
    let counts = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM items GROUP BY status",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(StockReport::from_counts(&counts)))
}

async fn items_by_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(category): ValidPath<i64>,
) -> AppResult<Json<Vec<ItemModel>>> {
    user.require(Permission::ViewReports)?;
    let filter = ItemFilter {
        category: Some(category),
        ..Default::default()
    };
    Ok(Json(fetch_items(&state.pool, &filter).await?))
}

async fn items_by_model(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(model): ValidPath<String>,
) -> AppResult<Json<Vec<ItemModel>>> {
    user.require(Permission::ViewReports)?;
    let filter = ItemFilter {
        model: Some(model),
        ..Default::default()
    };
    Ok(Json(fetch_items(&state.pool, &filter).await?))
}

/// Items currently issued to an employee.
async fn items_by_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(employee_id): ValidPath<i64>,
) -> AppResult<Json<Vec<ItemModel>>> {
    user.require(Permission::ViewReports)?;
    let filter = ItemFilter {
        issued_to: Some(employee_id),
        ..Default::default()
    };
    Ok(Json(fetch_items(&state.pool, &filter).await?))
}

/// Issuance logs whose issue date falls in the optional range, newest first.
async fn transactions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidQuery(range): ValidQuery<TransactionsQuery>,
) -> AppResult<Json<Vec<IssuanceLogModel>>> {
    user.require(Permission::ViewReports)?;
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(AppError::InvalidInput("from must not be after to".into()));
        }
    }

    let mut qb = QueryBuilder::<MySql>::new(LOG_SELECT);
    qb.push(" WHERE 1=1");
    if let Some(from) = range.from {
        qb.push(" AND il.issue_date >= ").push_bind(from);
    }
    if let Some(to) = range.to {
        qb.push(" AND il.issue_date <= ").push_bind(to);
    }
    qb.push(" ORDER BY il.issue_date DESC, il.log_id DESC");

    let logs = qb
        .build_query_as::<IssuanceLogModel>()
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(logs))
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    keyword: Option<String>,
    brand: Option<String>,
    #[serde(default, deserialize_with = "de::optional_parsed")]
    employee: Option<i64>,
}

impl From<SearchQuery> for ItemFilter {
    fn from(q: SearchQuery) -> Self {
        ItemFilter {
            search: q.keyword,
            brand: q.brand,
            issued_to: q.employee,
            ..Default::default()
        }
    }
}

async fn search_items(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidQuery(query): ValidQuery<SearchQuery>,
) -> AppResult<Json<Vec<ItemModel>>> {
    user.require(Permission::ViewInventory)?;
    let filter = ItemFilter::from(query);
    Ok(Json(fetch_items(&state.pool, &filter).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_maps_to_filter() {
        let filter = ItemFilter::from(SearchQuery {
            keyword: Some("laptop".into()),
            brand: Some("Dell".into()),
            employee: Some(123),
        });
        assert_eq!(filter.search.as_deref(), Some("laptop"));
        assert_eq!(filter.brand.as_deref(), Some("Dell"));
        assert_eq!(filter.issued_to, Some(123));
        assert!(filter.category.is_none());
    }
}
