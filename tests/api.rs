//! Router tests for paths that are decided before any query runs:
//! authentication, permissions and request validation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::mysql::MySqlPoolOptions;
use tempfile::TempDir;
use tower::ServiceExt;

use na_inventory::middleware::AuthenticatedUser;
use na_inventory::models::Role;
use na_inventory::services::auth_service::issue_token;
use na_inventory::services::{router, AppState};
use na_inventory::storage::LocalDiskStorage;
use na_inventory::Config;

const SECRET: &str = "integration-secret";

async fn app_with(extra: &[(&str, &str)]) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut vars: HashMap<String, String> = HashMap::from([
        ("DATABASE_URL".to_string(), "mysql://root@127.0.0.1:1/na_inventory_test".to_string()),
        ("JWT_SECRET".to_string(), SECRET.to_string()),
        ("UPLOAD_DIR".to_string(), dir.path().display().to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    let config = Config::from_vars(|k| vars.get(k).cloned()).unwrap();

    let pool = MySqlPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy(&config.database_url)
        .unwrap();
    let storage = LocalDiskStorage::new(config.upload_dir.clone()).await.unwrap();
    (router(AppState::new(pool, config, Arc::new(storage))), dir)
}

async fn app() -> (Router, TempDir) {
    app_with(&[]).await
}

fn token(role: Role) -> String {
    let user = AuthenticatedUser {
        user_id: 1,
        username: format!("{}-user", role).to_lowercase(),
        role,
    };
    issue_token(&user, SECRET, 1).unwrap().0
}

fn get(uri: &str, role: Option<Role>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(role) = role {
        builder = builder.header("authorization", format!("Bearer {}", token(role)));
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, role: Option<Role>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(role) = role {
        builder = builder.header("authorization", format!("Bearer {}", token(role)));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(res: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn valid_item() -> Value {
    json!({
        "category_id": 1,
        "serial_number": "SN-100",
        "brand": "Dell",
        "model": "Latitude 5440",
        "date_of_purchase": "2024-01-10"
    })
}

#[tokio::test]
async fn test_health_and_welcome_are_public() {
    let (app, _dir) = app().await;

    let res = app.clone().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "ok");

    let res = app.oneshot(get("/", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (app, _dir) = app().await;
    for uri in ["/api/items", "/api/issuance/logs", "/api/reports/stock", "/api/search"] {
        let res = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body_json(res).await["code"], "unauthorized");
    }
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    let (app, _dir) = app().await;
    let user = AuthenticatedUser {
        user_id: 1,
        username: "admin".into(),
        role: Role::Admin,
    };
    let (forged, _) = issue_token(&user, "not-the-secret", 1).unwrap();
    let req = Request::builder()
        .uri("/api/items")
        .header("authorization", format!("Bearer {}", forged))
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_permissions_are_enforced() {
    let (app, _dir) = app().await;

    let res = app
        .clone()
        .oneshot(send_json("POST", "/api/items", Some(Role::Management), valid_item()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(res).await["code"], "forbidden");

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/items/4")
                .header("authorization", format!("Bearer {}", token(Role::Operator)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    for uri in ["/api/audit-logs", "/api/users"] {
        let res = app.clone().oneshot(get(uri, Some(Role::Operator))).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", uri);
    }

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/categories/1")
                .header("authorization", format!("Bearer {}", token(Role::Operator)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    for uri in ["/api/departments", "/api/designations/2"] {
        let res = app.clone().oneshot(get(uri, Some(Role::Management))).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", uri);
    }

    let res = app
        .oneshot(send_json(
            "POST",
            "/api/issuance/issue",
            Some(Role::Management),
            json!({"item_id": 3, "employee_id": 5, "issue_date": "2024-01-15"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_item_validation_errors() {
    let (app, _dir) = app().await;

    let mut missing_serial = valid_item();
    missing_serial.as_object_mut().unwrap().remove("serial_number");
    let res = app
        .clone()
        .oneshot(send_json("POST", "/api/items", Some(Role::Operator), missing_serial))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["message"], "serial_number is required");
    assert_eq!(body["code"], "validation_error");

    let mut issued = valid_item();
    issued["status"] = json!("Issued");
    let res = app
        .clone()
        .oneshot(send_json("POST", "/api/items", Some(Role::Admin), issued))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("POST")
        .uri("/api/items")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token(Role::Admin)))
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["code"], "validation_error");

    let res = app
        .oneshot(get("/api/items/abc", Some(Role::Admin)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issuance_request_validation() {
    let (app, _dir) = app().await;

    let res = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/issuance/issue-peripherals",
            Some(Role::Operator),
            json!({"item_ids": [], "employee_id": 5, "issue_date": "2024-01-15"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(res).await["message"],
        "Please provide at least one item ID"
    );

    let res = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/issuance/issue-peripherals",
            Some(Role::Operator),
            json!({"item_ids": [7, "7"], "employee_id": 5, "issue_date": "2024-01-15"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/issuance/receive",
            Some(Role::Operator),
            json!({"log_id": 11, "return_date": "2024-02-01", "status": "Issued"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(send_json(
            "POST",
            "/api/issuance/issue",
            Some(Role::Operator),
            json!({"item_id": 3, "employee_id": 5, "issue_date": "15/01/2024"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transactions_range_must_be_ordered() {
    let (app, _dir) = app().await;
    let res = app
        .oneshot(get(
            "/api/reports/transactions?from=2024-02-01&to=2024-01-01",
            Some(Role::Management),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_validation_and_switch() {
    let (app, _dir) = app().await;
    let res = app
        .oneshot(send_json(
            "POST",
            "/api/auth/signup",
            None,
            json!({"username": "op", "password": "abc", "role": "Operator"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let (app, _dir) = app_with(&[("SIGNUP_ENABLED", "false")]).await;
    let res = app
        .oneshot(send_json(
            "POST",
            "/api/auth/signup",
            None,
            json!({"username": "op", "password": "abcdef", "role": "Operator"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let (app, _dir) = app().await;
    let res = app
        .oneshot(send_json(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "admin"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_without_files_is_rejected() {
    let (app, _dir) = app().await;
    let boundary = "X-BOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\nwarranty card\r\n--{b}--\r\n",
        b = boundary
    );
    let req = Request::builder()
        .method("POST")
        .uri("/api/documents/items/3/documents")
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .header("authorization", format!("Bearer {}", token(Role::Management)))
        .body(Body::from(body))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["message"], "No files uploaded");
}

#[tokio::test]
async fn test_upload_rejects_disallowed_type() {
    let (app, _dir) = app().await;
    let boundary = "X-BOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"documents\"; filename=\"tool.exe\"\r\n\
         Content-Type: application/x-msdownload\r\n\r\nMZ\r\n--{b}--\r\n",
        b = boundary
    );
    let req = Request::builder()
        .method("POST")
        .uri("/api/documents/items/3/documents")
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .header("authorization", format!("Bearer {}", token(Role::Operator)))
        .body(Body::from(body))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
