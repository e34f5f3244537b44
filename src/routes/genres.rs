use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AdminUser;
use crate::entities::genre;
use crate::error::AppError;
use crate::routes::categories::validate_slug;
use crate::state::AppState;

/// Genre route group: `/genres/...`
///
/// Reads are public; writes are admin-only. Deleting a genre cascades only to
/// its join rows, never to titles.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_genres).post(create_genre))
        .route("/{slug}", axum::routing::delete(delete_genre))
}

#[derive(Deserialize)]
struct CreateGenreRequest {
    name: String,
    slug: String,
}

#[derive(Serialize)]
struct GenreResponse {
    id: Uuid,
    name: String,
    slug: String,
}

/// `GET /genres` — List all genres, name descending.
async fn list_genres(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let genres = genre::Entity::find()
        .order_by_desc(genre::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(
        genres
            .into_iter()
            .map(to_genre_response)
            .collect::<Vec<_>>(),
    ))
}

/// `POST /genres` — Create a genre (admin only).
async fn create_genre(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<CreateGenreRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_slug(&req.slug)?;
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required.".to_string()));
    }

    let existing = genre::Entity::find()
        .filter(genre::Column::Slug.eq(&req.slug))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Genre slug '{}' is already in use.",
            req.slug
        )));
    }

    let created = genre::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name.trim().to_string()),
        slug: Set(req.slug),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(to_genre_response(created))))
}

/// `DELETE /genres/:slug` — Remove a genre (admin only).
async fn delete_genre(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let existing = genre::Entity::find()
        .filter(genre::Column::Slug.eq(&slug))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Genre not found.".to_string()))?;

    existing.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn to_genre_response(g: genre::Model) -> GenreResponse {
    GenreResponse {
        id: g.id,
        name: g.name,
        slug: g.slug,
    }
}
