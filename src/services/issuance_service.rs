use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::{MySql, MySqlPool, QueryBuilder};

use super::{message, AppState};
use crate::error::AppResult;
use crate::extract::ValidJson;
use crate::issuance::{self, IssueCommand, IssueMode, LogScope, MySqlIssuanceStore};
use crate::middleware::AuthenticatedUser;
use crate::models::{
    IssuanceLogModel, IssuePeripheralsReq, IssueReq, Permission, ReceiveReq, LOG_SELECT,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/issue", post(issue_item))
        .route("/issue-peripherals", post(issue_peripherals))
        .route("/receive", post(receive_item))
        .route("/logs", get(list_logs))
        .route("/my-items", get(my_items))
}

async fn run_issue(pool: &MySqlPool, cmd: &IssueCommand) -> AppResult<issuance::IssueOutcome> {
    cmd.validate()?;
    let mut store = MySqlIssuanceStore::begin(pool).await?;
    let outcome = issuance::issue(&mut store, cmd).await?;
    store.commit().await?;
    Ok(outcome)
}

async fn issue_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidJson(req): ValidJson<IssueReq>,
) -> AppResult<(StatusCode, Json<Value>)> {
    user.require(Permission::IssueItems)?;
    req.validate()?;

    let cmd = IssueCommand {
        mode: IssueMode::Single,
        item_ids: vec![req.item_id],
        employee_id: req.employee_id,
        issue_date: req.issue_date,
        issued_by_user_id: user.user_id,
    };
    let outcome = run_issue(&state.pool, &cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Item issued successfully!",
            "logId": outcome.log_ids.first(),
        })),
    ))
}

async fn issue_peripherals(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidJson(req): ValidJson<IssuePeripheralsReq>,
) -> AppResult<(StatusCode, Json<Value>)> {
    user.require(Permission::IssueItems)?;

    let cmd = IssueCommand {
        mode: IssueMode::Peripherals,
        item_ids: req.item_ids,
        employee_id: req.employee_id,
        issue_date: req.issue_date,
        issued_by_user_id: user.user_id,
    };
    let outcome = run_issue(&state.pool, &cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("{} peripheral device(s) issued successfully!", outcome.log_ids.len()),
            "logIds": outcome.log_ids,
        })),
    ))
}

async fn receive_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidJson(req): ValidJson<ReceiveReq>,
) -> AppResult<Json<Value>> {
    user.require(Permission::IssueItems)?;
    req.validate()?;

    let mut store = MySqlIssuanceStore::begin(&state.pool).await?;
    issuance::receive(&mut store, req.log_id, req.return_date, user.user_id).await?;
    store.commit().await?;

    Ok(message("Item marked as returned!"))
}

/// Issuance logs visible under `scope`, newest issue first.
pub async fn fetch_logs(pool: &MySqlPool, scope: LogScope) -> AppResult<Vec<IssuanceLogModel>> {
    let mut qb = QueryBuilder::<MySql>::new(LOG_SELECT);
    if let LogScope::IssuedBy(user_id) = scope {
        qb.push(" WHERE il.issued_by_user_id = ").push_bind(user_id);
    }
    qb.push(" ORDER BY il.issue_date DESC, il.log_id DESC");
    let logs = qb.build_query_as::<IssuanceLogModel>().fetch_all(pool).await?;
    Ok(logs)
}

async fn list_logs(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<IssuanceLogModel>>> {
    user.require(Permission::ViewIssuance)?;
    Ok(Json(fetch_logs(&state.pool, LogScope::for_user(&user)).await?))
}

async fn my_items(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<IssuanceLogModel>>> {
    user.require(Permission::ViewIssuance)?;
    Ok(Json(
        fetch_logs(&state.pool, LogScope::IssuedBy(user.user_id)).await?,
    ))
}
