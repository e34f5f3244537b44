#![allow(dead_code)] // each test binary uses its own subset of helpers

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use tower::ServiceExt;

use reviewdb_api::config::{Config, Environment};
use reviewdb_api::state::AppState;

/// Build the app against a fresh in-memory SQLite database with all
/// migrations applied. The connection is returned alongside the router so
/// tests can inspect or seed the store directly.
pub async fn test_app() -> (Router, DatabaseConnection) {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .unwrap_or_default();
    Migrator::up(&db, None).await.unwrap_or_default();

    let state = AppState {
        db: db.clone(),
        config: Config {
            database_url: String::new(),
            server_host: std::net::IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
            jwt_access_expiration_secs: 900,
            frontend_url: "http://localhost:3001".to_string(),
        },
    };

    (reviewdb_api::routes::router().with_state(state), db)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();
    let body_str = String::from_utf8(body.to_vec()).unwrap_or_default();

    (status, body_str)
}

/// Send a GET request and return (status, body).
pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap_or_default();

    send(app, request).await
}

/// Send a GET request with a bearer token.
pub async fn get_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap_or_default();

    send(app, request).await
}

/// Send a POST request with a JSON body.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_default();

    send(app, request).await
}

/// Send a POST request with a JSON body and a bearer token.
pub async fn post_json_with_auth(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
    token: &str,
) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap_or_default();

    send(app, request).await
}

/// Send a PUT request with a JSON body and a bearer token.
pub async fn put_json_with_auth(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
    token: &str,
) -> (StatusCode, String) {
    let request = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap_or_default();

    send(app, request).await
}

/// Send a PATCH request with a JSON body and a bearer token.
pub async fn patch_json_with_auth(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
    token: &str,
) -> (StatusCode, String) {
    let request = Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap_or_default();

    send(app, request).await
}

/// Send a DELETE request with a bearer token.
pub async fn delete_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap_or_default();

    send(app, request).await
}

/// Sign up a new user and return (token, user id).
pub async fn signup(app: &Router, username: &str) -> (String, String) {
    let (status, body) = post_json(
        app,
        "/api/v1/auth/signup",
        &serde_json::json!({
            "username": username,
            "password": "SecurePass123!",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let token = v["token"].as_str().unwrap_or_default().to_string();
    let user_id = v["user"]["id"].as_str().unwrap_or_default().to_string();
    (token, user_id)
}

/// Sign up a new user, promote it to the given role directly in the store,
/// and return a token issued after the promotion.
pub async fn signup_with_role(app: &Router, db: &DatabaseConnection, username: &str, role: &str) -> String {
    use reviewdb_api::entities::user;
    use sea_orm::ActiveValue::Set;
    use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};

    let (_, _user_id) = signup(app, username).await;

    let account = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .unwrap_or_default();
    if let Some(account) = account {
        let mut active: user::ActiveModel = account.into();
        active.role = Set(role.to_string());
        active.update(db).await.ok();
    }

    // Re-login so the token carries the new role
    let (status, body) = post_json(
        app,
        "/api/v1/auth/login",
        &serde_json::json!({
            "username": username,
            "password": "SecurePass123!",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    v["token"].as_str().unwrap_or_default().to_string()
}
