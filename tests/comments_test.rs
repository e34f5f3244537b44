mod common;

use axum::Router;
use axum::http::StatusCode;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use reviewdb_api::entities::comment;

/// Seed an admin, a title, and one review; return (admin, title id, review id).
async fn seed_review(
    app: &Router,
    db: &DatabaseConnection,
    suffix: &str,
) -> (String, String, String) {
    let admin = common::signup_with_role(app, db, &format!("admin{suffix}"), "admin").await;

    let (status, body) = common::post_json_with_auth(
        app,
        "/api/v1/titles",
        &json!({ "name": "Stalker", "year": 1979 }),
        &admin,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "seed title failed: {body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let title_id = v["id"].as_str().unwrap_or_default().to_string();

    let (reviewer, _) = common::signup(app, &format!("reviewer{suffix}")).await;
    let (status, body) = common::post_json_with_auth(
        app,
        &format!("/api/v1/titles/{title_id}/reviews"),
        &json!({ "text": "Haunting.", "score": 9 }),
        &reviewer,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "seed review failed: {body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let review_id = v["id"].as_str().unwrap_or_default().to_string();

    (admin, title_id, review_id)
}

#[tokio::test]
async fn create_and_list_comments_scoped_to_review() {
    let (app, db) = common::test_app().await;
    let (_, title_id, review_id) = seed_review(&app, &db, "cl1").await;
    let (token, _) = common::signup(&app, "chatter").await;

    let uri = format!("/api/v1/titles/{title_id}/reviews/{review_id}/comments");

    let (status, body) =
        common::post_json_with_auth(&app, &uri, &json!({ "text": "Agreed!" }), &token).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v["author"], "chatter");
    assert_eq!(v["text"], "Agreed!");

    let (status, body) = common::get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v["total"], 1);
    assert_eq!(v["data"][0]["text"], "Agreed!");
}

#[tokio::test]
async fn commenting_under_missing_review_is_404() {
    let (app, db) = common::test_app().await;
    let (_, title_id, _) = seed_review(&app, &db, "cm1").await;
    let (token, _) = common::signup(&app, "lost").await;

    let fake = uuid::Uuid::new_v4();
    let (status, _) = common::post_json_with_auth(
        &app,
        &format!("/api/v1/titles/{title_id}/reviews/{fake}/comments"),
        &json!({ "text": "Hello?" }),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_unreachable_through_mismatched_title_path() {
    let (app, db) = common::test_app().await;
    let (admin, _title_a, review_id) = seed_review(&app, &db, "cm2").await;

    // A second title the review does not belong to
    let (status, body) = common::post_json_with_auth(
        &app,
        "/api/v1/titles",
        &json!({ "name": "Mirror", "year": 1975 }),
        &admin,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let title_b = v["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = common::get(
        &app,
        &format!("/api/v1/titles/{title_b}/reviews/{review_id}/comments"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn author_edits_own_comment_stranger_cannot() {
    let (app, db) = common::test_app().await;
    let (_, title_id, review_id) = seed_review(&app, &db, "ce1").await;
    let (author, _) = common::signup(&app, "commenter").await;
    let (stranger, _) = common::signup(&app, "lurker").await;

    let base = format!("/api/v1/titles/{title_id}/reviews/{review_id}/comments");
    let (status, body) =
        common::post_json_with_auth(&app, &base, &json!({ "text": "First draft." }), &author).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let comment_id = v["id"].as_str().unwrap_or_default().to_string();

    let uri = format!("{base}/{comment_id}");
    let (status, _) =
        common::patch_json_with_auth(&app, &uri, &json!({ "text": "Hijacked." }), &stranger).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) =
        common::patch_json_with_auth(&app, &uri, &json!({ "text": "Second draft." }), &author)
            .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v["text"], "Second draft.");
}

#[tokio::test]
async fn put_comment_replaces_text() {
    let (app, db) = common::test_app().await;
    let (_, title_id, review_id) = seed_review(&app, &db, "cp1").await;
    let (author, _) = common::signup(&app, "rewriter").await;

    let base = format!("/api/v1/titles/{title_id}/reviews/{review_id}/comments");
    let (status, body) =
        common::post_json_with_auth(&app, &base, &json!({ "text": "Rough take." }), &author).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let comment_id = v["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = common::put_json_with_auth(
        &app,
        &format!("{base}/{comment_id}"),
        &json!({ "text": "Considered take." }),
        &author,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v["text"], "Considered take.");
}

#[tokio::test]
async fn deleting_review_cascades_to_its_comments() {
    let (app, db) = common::test_app().await;
    let (_, title_id, review_id) = seed_review(&app, &db, "cd1").await;
    let (commenter, _) = common::signup(&app, "doomed").await;
    let moderator = common::signup_with_role(&app, &db, "sweeper", "moderator").await;

    let base = format!("/api/v1/titles/{title_id}/reviews/{review_id}/comments");
    for text in ["one", "two"] {
        let (status, body) =
            common::post_json_with_auth(&app, &base, &json!({ "text": text }), &commenter).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, _) = common::delete_with_auth(
        &app,
        &format!("/api/v1/titles/{title_id}/reviews/{review_id}"),
        &moderator,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let review_uuid = uuid::Uuid::parse_str(&review_id).unwrap_or_default();
    let remaining = comment::Entity::find()
        .filter(comment::Column::ReviewId.eq(review_uuid))
        .count(&db)
        .await
        .unwrap_or(u64::MAX);
    assert_eq!(remaining, 0);
}
