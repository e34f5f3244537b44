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
use crate::entities::{review, user};
use crate::error::AppError;
use crate::routes::titles::{PaginatedResponse, PaginationQuery, find_title};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Review route group, nested under `/titles/{title_id}/reviews`.
///
/// Every operation resolves the parent title first; a review that exists but
/// belongs to a different title is unreachable through this path.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route(
            "/{review_id}",
            get(get_review)
                .put(replace_review)
                .patch(update_review)
                .delete(delete_review),
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CreateReviewRequest {
    text: String,
    score: i16,
}

#[derive(Debug, Deserialize)]
struct UpdateReviewRequest {
    text: Option<String>,
    score: Option<i16>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewResponse {
    id: Uuid,
    text: String,
    title_id: Uuid,
    author: String,
    score: i16,
    pub_date: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /titles/:title_id/reviews` — Reviews of one title, newest first.
async fn list_reviews(
    State(state): State<AppState>,
    Path(title_id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let parent = find_title(&state.db, title_id).await?;

    let scope = review::Entity::find().filter(review::Column::TitleId.eq(parent.id));

    let total = scope.clone().count(&state.db).await?;

    let reviews = scope
        .order_by_desc(review::Column::PubDate)
        .offset(pagination.offset)
        .limit(pagination.limit)
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(reviews.len());
    for r in reviews {
        data.push(build_review_response(&state.db, r).await?);
    }

    Ok(Json(PaginatedResponse {
        data,
        total,
        offset: pagination.offset,
        limit: pagination.limit,
    }))
}

/// `POST /titles/:title_id/reviews` — Create a review.
///
/// The author is always the authenticated caller; one review per caller per
/// title.
async fn create_review(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(title_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let parent = find_title(&state.db, title_id).await?;

    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text is required.".to_string()));
    }
    validate_score(req.score)?;

    let existing = review::Entity::find()
        .filter(review::Column::TitleId.eq(parent.id))
        .filter(review::Column::AuthorId.eq(caller.id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "You have already reviewed this title.".to_string(),
        ));
    }

    let created = review::ActiveModel {
        id: Set(Uuid::new_v4()),
        text: Set(req.text),
        title_id: Set(parent.id),
        author_id: Set(caller.id),
        score: Set(req.score),
        pub_date: Set(Utc::now().into()),
    }
    .insert(&state.db)
    .await?;

    let response = build_review_response(&state.db, created).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /titles/:title_id/reviews/:review_id` — Retrieve one review.
async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_scoped_review(&state.db, title_id, review_id).await?;
    Ok(Json(build_review_response(&state.db, found).await?))
}

/// `PUT /titles/:title_id/reviews/:review_id` — Replace text and score.
///
/// Same body shape as create; the author, title, and pub_date stay as they
/// were. Allowed for the review's author, moderators, and admins.
async fn replace_review(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_scoped_review(&state.db, title_id, review_id).await?;
    check_author_or_moderator(&caller, found.author_id)?;

    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text is required.".to_string()));
    }
    validate_score(req.score)?;

    let mut active: review::ActiveModel = found.into();
    active.text = Set(req.text);
    active.score = Set(req.score);

    let updated = active.update(&state.db).await?;
    Ok(Json(build_review_response(&state.db, updated).await?))
}

/// `PATCH /titles/:title_id/reviews/:review_id` — Edit text and/or score.
///
/// Allowed for the review's author, moderators, and admins. Author, title, and
/// pub_date are immutable.
async fn update_review(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_scoped_review(&state.db, title_id, review_id).await?;
    check_author_or_moderator(&caller, found.author_id)?;

    let mut active: review::ActiveModel = found.into();

    if let Some(text) = req.text {
        if text.trim().is_empty() {
            return Err(AppError::BadRequest("Text cannot be empty.".to_string()));
        }
        active.text = Set(text);
    }
    if let Some(score) = req.score {
        validate_score(score)?;
        active.score = Set(score);
    }

    let updated = active.update(&state.db).await?;
    Ok(Json(build_review_response(&state.db, updated).await?))
}

/// `DELETE /titles/:title_id/reviews/:review_id` — Remove a review.
///
/// Its comments go with it via the FK cascade.
async fn delete_review(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_scoped_review(&state.db, title_id, review_id).await?;
    check_author_or_moderator(&caller, found.author_id)?;

    found.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Look up a review through its parent title; a mismatched title is a 404,
/// same as a missing review.
pub(super) async fn find_scoped_review(
    db: &DatabaseConnection,
    title_id: Uuid,
    review_id: Uuid,
) -> Result<review::Model, AppError> {
    let parent = find_title(db, title_id).await?;

    review::Entity::find_by_id(review_id)
        .filter(review::Column::TitleId.eq(parent.id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found.".to_string()))
}

fn validate_score(score: i16) -> Result<(), AppError> {
    if !(1..=10).contains(&score) {
        return Err(AppError::BadRequest(
            "Score must be between 1 and 10.".to_string(),
        ));
    }
    Ok(())
}

pub(super) fn check_author_or_moderator(
    caller: &user::Model,
    author_id: Uuid,
) -> Result<(), AppError> {
    if caller.id != author_id && !caller.is_moderator() {
        return Err(AppError::Forbidden(
            "Only the author or a moderator may modify this.".to_string(),
        ));
    }
    Ok(())
}

async fn build_review_response(
    db: &DatabaseConnection,
    r: review::Model,
) -> Result<ReviewResponse, AppError> {
    let author = user::Entity::find_by_id(r.author_id)
        .one(db)
        .await?
        .map_or_else(String::new, |u| u.username);

    Ok(ReviewResponse {
        id: r.id,
        text: r.text,
        title_id: r.title_id,
        author,
        score: r.score,
        pub_date: r.pub_date.to_string(),
    })
}
