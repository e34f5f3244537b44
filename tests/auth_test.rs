mod common;

use axum::http::StatusCode;
use serde_json::json;

// ─────────────────────────────────────────────────────────────────────────────
// POST /api/v1/auth/signup
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn signup_creates_user_with_default_role() {
    let (app, _db) = common::test_app().await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/auth/signup",
        &json!({ "username": "alice", "password": "SecurePass123!", "bio": "Reads a lot." }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert!(v["token"].is_string());
    assert_eq!(v["user"]["username"], "alice");
    assert_eq!(v["user"]["role"], "user");
    assert_eq!(v["user"]["bio"], "Reads a lot.");
}

#[tokio::test]
async fn signup_duplicate_username_is_conflict() {
    let (app, _db) = common::test_app().await;
    common::signup(&app, "bob").await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/auth/signup",
        &json!({ "username": "bob", "password": "AnotherPass456!" }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[tokio::test]
async fn signup_short_password_is_rejected() {
    let (app, _db) = common::test_app().await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/signup",
        &json!({ "username": "carol", "password": "short" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─────────────────────────────────────────────────────────────────────────────
// POST /api/v1/auth/login
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_with_valid_credentials() {
    let (app, _db) = common::test_app().await;
    common::signup(&app, "dave").await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/auth/login",
        &json!({ "username": "dave", "password": "SecurePass123!" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert!(v["token"].is_string());
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let (app, _db) = common::test_app().await;
    common::signup(&app, "erin").await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/login",
        &json!({ "username": "erin", "password": "not-the-password" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─────────────────────────────────────────────────────────────────────────────
// GET /api/v1/users/me and GET /api/v1/users
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn me_requires_auth() {
    let (app, _db) = common::test_app().await;

    let (status, _) = common::get(&app, "/api/v1/users/me").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_profile() {
    let (app, _db) = common::test_app().await;
    let (token, user_id) = common::signup(&app, "frank").await;

    let (status, body) = common::get_with_auth(&app, "/api/v1/users/me", &token).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v["id"], user_id);
    assert_eq!(v["username"], "frank");
}

#[tokio::test]
async fn listing_users_is_admin_only_and_sorted_by_username_desc() {
    let (app, db) = common::test_app().await;
    let (user_token, _) = common::signup(&app, "aaa").await;
    common::signup(&app, "zzz").await;
    let admin_token = common::signup_with_role(&app, &db, "mmm", "admin").await;

    let (status, _) = common::get_with_auth(&app, "/api/v1/users", &user_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = common::get_with_auth(&app, "/api/v1/users", &admin_token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let usernames: Vec<&str> = v["data"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|r| r["username"].as_str())
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(usernames, vec!["zzz", "mmm", "aaa"]);
}
