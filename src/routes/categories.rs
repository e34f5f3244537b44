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
use crate::entities::category;
use crate::error::AppError;
use crate::state::AppState;

/// Category route group: `/categories/...`
///
/// Reads are public; writes are admin-only. Deleting a category leaves its
/// titles in place with a null category (weak reference).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{slug}", axum::routing::delete(delete_category))
}

#[derive(Deserialize)]
struct CreateCategoryRequest {
    name: String,
    slug: String,
}

#[derive(Serialize)]
struct CategoryResponse {
    id: Uuid,
    name: String,
    slug: String,
}

/// `GET /categories` — List all categories, name descending.
async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = category::Entity::find()
        .order_by_desc(category::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(
        categories
            .into_iter()
            .map(to_category_response)
            .collect::<Vec<_>>(),
    ))
}

/// `POST /categories` — Create a category (admin only).
async fn create_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_slug(&req.slug)?;
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required.".to_string()));
    }

    let existing = category::Entity::find()
        .filter(category::Column::Slug.eq(&req.slug))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Category slug '{}' is already in use.",
            req.slug
        )));
    }

    let created = category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name.trim().to_string()),
        slug: Set(req.slug),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(to_category_response(created))))
}

/// `DELETE /categories/:slug` — Remove a category (admin only).
async fn delete_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let existing = category::Entity::find()
        .filter(category::Column::Slug.eq(&slug))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found.".to_string()))?;

    existing.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Slugs are lowercase alphanumeric plus hyphens/underscores, at most 50 chars.
pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > 50 {
        return Err(AppError::BadRequest(
            "Slug must be between 1 and 50 characters.".to_string(),
        ));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(AppError::BadRequest(
            "Slug may only contain lowercase letters, digits, '-' and '_'.".to_string(),
        ));
    }
    Ok(())
}

fn to_category_response(c: category::Model) -> CategoryResponse {
    CategoryResponse {
        id: c.id,
        name: c.name,
        slug: c.slug,
    }
}
