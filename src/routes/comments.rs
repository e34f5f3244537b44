use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::entities::{comment, user};
use crate::error::AppError;
use crate::routes::reviews::{check_author_or_moderator, find_scoped_review};
use crate::routes::titles::{PaginatedResponse, PaginationQuery};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Comment route group, nested under
/// `/titles/{title_id}/reviews/{review_id}/comments`.
///
/// Every operation resolves the (title, review) pair first; a review under a
/// different title is a 404 before any comment is touched.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route(
            "/{comment_id}",
            get(get_comment)
                .put(update_comment)
                .patch(update_comment)
                .delete(delete_comment),
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CreateCommentRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
struct UpdateCommentRequest {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentResponse {
    id: Uuid,
    text: String,
    review_id: Uuid,
    author: String,
    pub_date: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET .../comments` — Comments on one review, newest first.
async fn list_comments(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let parent = find_scoped_review(&state.db, title_id, review_id).await?;

    let scope = comment::Entity::find().filter(comment::Column::ReviewId.eq(parent.id));

    let total = scope.clone().count(&state.db).await?;

    let comments = scope
        .order_by_desc(comment::Column::PubDate)
        .offset(pagination.offset)
        .limit(pagination.limit)
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(comments.len());
    for c in comments {
        data.push(build_comment_response(&state.db, c).await?);
    }

    Ok(Json(PaginatedResponse {
        data,
        total,
        offset: pagination.offset,
        limit: pagination.limit,
    }))
}

/// `POST .../comments` — Comment on a review; author is the caller.
async fn create_comment(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let parent = find_scoped_review(&state.db, title_id, review_id).await?;

    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text is required.".to_string()));
    }

    let created = comment::ActiveModel {
        id: Set(Uuid::new_v4()),
        text: Set(req.text),
        review_id: Set(parent.id),
        author_id: Set(caller.id),
        pub_date: Set(Utc::now().into()),
    }
    .insert(&state.db)
    .await?;

    let response = build_comment_response(&state.db, created).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET .../comments/:comment_id` — Retrieve one comment.
async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_scoped_comment(&state.db, title_id, review_id, comment_id).await?;
    Ok(Json(build_comment_response(&state.db, found).await?))
}

/// `PUT`/`PATCH .../comments/:comment_id` — Edit the comment text.
///
/// Text is the only mutable field, so full and partial update coincide.
/// Allowed for the comment's author, moderators, and admins.
async fn update_comment(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path((title_id, review_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_scoped_comment(&state.db, title_id, review_id, comment_id).await?;
    check_author_or_moderator(&caller, found.author_id)?;

    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text cannot be empty.".to_string()));
    }

    let mut active: comment::ActiveModel = found.into();
    active.text = Set(req.text);

    let updated = active.update(&state.db).await?;
    Ok(Json(build_comment_response(&state.db, updated).await?))
}

/// `DELETE .../comments/:comment_id` — Remove a comment.
async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path((title_id, review_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_scoped_comment(&state.db, title_id, review_id, comment_id).await?;
    check_author_or_moderator(&caller, found.author_id)?;

    found.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

async fn find_scoped_comment(
    db: &DatabaseConnection,
    title_id: Uuid,
    review_id: Uuid,
    comment_id: Uuid,
) -> Result<comment::Model, AppError> {
    let parent = find_scoped_review(db, title_id, review_id).await?;

    comment::Entity::find_by_id(comment_id)
        .filter(comment::Column::ReviewId.eq(parent.id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found.".to_string()))
}

async fn build_comment_response(
    db: &DatabaseConnection,
    c: comment::Model,
) -> Result<CommentResponse, AppError> {
    let author = user::Entity::find_by_id(c.author_id)
        .one(db)
        .await?
        .map_or_else(String::new, |u| u.username);

    Ok(CommentResponse {
        id: c.id,
        text: c.text,
        review_id: c.review_id,
        author,
        pub_date: c.pub_date.to_string(),
    })
}
