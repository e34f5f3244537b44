use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Datelike;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AdminUser;
use crate::entities::{category, genre, title, title_genre};
use crate::error::AppError;
use crate::rating;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Title route group: `/titles/...`
///
/// Reads are public; writes are admin-only (see DESIGN.md for the
/// authorization decision).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_titles).post(create_title))
        .route(
            "/{title_id}",
            get(get_title)
                .put(replace_title)
                .patch(update_title)
                .delete(delete_title),
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CreateTitleRequest {
    name: String,
    year: i32,
    description: Option<String>,
    /// Category slug; must exist if provided.
    category: Option<String>,
    /// Genre slugs; every one must exist.
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateTitleRequest {
    name: Option<String>,
    year: Option<i32>,
    /// Absent = unchanged, explicit null = cleared.
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
    /// Absent = unchanged, explicit null = detached, slug = reassigned.
    #[serde(default, deserialize_with = "double_option")]
    category: Option<Option<String>>,
    /// When present, replaces the full genre set.
    genres: Option<Vec<String>>,
}

/// Distinguishes an absent field (`None`) from an explicit JSON null
/// (`Some(None)`).
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_offset")]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_offset() -> u64 {
    0
}

const fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TitleResponse {
    id: Uuid,
    name: String,
    year: i32,
    description: Option<String>,
    category: Option<SlugRef>,
    genres: Vec<SlugRef>,
    /// Rounded mean of all review scores; null when unreviewed.
    rating: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SlugRef {
    name: String,
    slug: String,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /titles` — List all titles, name descending, paginated.
async fn list_titles(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let total = title::Entity::find().count(&state.db).await?;

    let titles = title::Entity::find()
        .order_by_desc(title::Column::Name)
        .offset(pagination.offset)
        .limit(pagination.limit)
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(titles.len());
    for t in titles {
        data.push(build_title_response(&state.db, t).await?);
    }

    Ok(Json(PaginatedResponse {
        data,
        total,
        offset: pagination.offset,
        limit: pagination.limit,
    }))
}

/// `POST /titles` — Create a title (admin only).
async fn create_title(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<CreateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required.".to_string()));
    }
    validate_year(req.year)?;

    let category_model = resolve_category(&state.db, req.category.as_deref()).await?;
    let genre_models = resolve_genres(&state.db, &req.genres).await?;

    let created = title::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name.trim().to_string()),
        year: Set(req.year),
        description: Set(req.description),
        category_id: Set(category_model.as_ref().map(|c| c.id)),
    }
    .insert(&state.db)
    .await?;

    replace_title_genres(&state.db, created.id, &genre_models).await?;

    let response = build_title_response(&state.db, created).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /titles/:title_id` — Retrieve a title with category, genres, and rating.
async fn get_title(
    State(state): State<AppState>,
    Path(title_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_title(&state.db, title_id).await?;
    Ok(Json(build_title_response(&state.db, found).await?))
}

/// `PUT /titles/:title_id` — Replace a title wholesale (admin only).
///
/// Same shape as create: fields left out of the body are cleared, and the
/// genre set becomes exactly what the body lists.
async fn replace_title(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(title_id): Path<Uuid>,
    Json(req): Json<CreateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_title(&state.db, title_id).await?;

    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required.".to_string()));
    }
    validate_year(req.year)?;

    let category_model = resolve_category(&state.db, req.category.as_deref()).await?;
    let genre_models = resolve_genres(&state.db, &req.genres).await?;

    let mut active: title::ActiveModel = found.into();
    active.name = Set(req.name.trim().to_string());
    active.year = Set(req.year);
    active.description = Set(req.description);
    active.category_id = Set(category_model.as_ref().map(|c| c.id));

    let updated = active.update(&state.db).await?;

    replace_title_genres(&state.db, updated.id, &genre_models).await?;

    Ok(Json(build_title_response(&state.db, updated).await?))
}

/// `PATCH /titles/:title_id` — Update title fields (admin only).
///
/// An explicit `null` clears the description or detaches the category; an
/// absent field is left alone.
async fn update_title(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(title_id): Path<Uuid>,
    Json(req): Json<UpdateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_title(&state.db, title_id).await?;

    // Resolve references before touching the row so an unknown slug rejects
    // the whole write
    let category_change: Option<Option<category::Model>> = match &req.category {
        Some(Some(slug)) => Some(resolve_category(&state.db, Some(slug)).await?),
        Some(None) => Some(None),
        None => None,
    };
    let genre_models = match &req.genres {
        Some(slugs) => Some(resolve_genres(&state.db, slugs).await?),
        None => None,
    };

    let mut active: title::ActiveModel = found.into();

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty.".to_string()));
        }
        active.name = Set(name.trim().to_string());
    }
    if let Some(year) = req.year {
        validate_year(year)?;
        active.year = Set(year);
    }
    if let Some(description) = req.description {
        active.description = Set(description);
    }
    if let Some(resolved) = category_change {
        active.category_id = Set(resolved.map(|c| c.id));
    }

    let updated = active.update(&state.db).await?;

    if let Some(models) = genre_models {
        replace_title_genres(&state.db, updated.id, &models).await?;
    }

    Ok(Json(build_title_response(&state.db, updated).await?))
}

/// `DELETE /titles/:title_id` — Remove a title (admin only).
///
/// Reviews, their comments, and genre join rows go with it via FK cascades.
async fn delete_title(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(title_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_title(&state.db, title_id).await?;
    found.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

pub(super) async fn find_title(
    db: &DatabaseConnection,
    title_id: Uuid,
) -> Result<title::Model, AppError> {
    title::Entity::find_by_id(title_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Title not found.".to_string()))
}

/// Titles may not be dated in the future.
fn validate_year(year: i32) -> Result<(), AppError> {
    let current_year = chrono::Utc::now().year();
    if year > current_year {
        return Err(AppError::BadRequest(format!(
            "Year must not be later than {current_year}."
        )));
    }
    Ok(())
}

async fn resolve_category(
    db: &DatabaseConnection,
    slug: Option<&str>,
) -> Result<Option<category::Model>, AppError> {
    let Some(slug) = slug else {
        return Ok(None);
    };

    let found = category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Unknown category slug '{slug}'.")))?;

    Ok(Some(found))
}

async fn resolve_genres(
    db: &DatabaseConnection,
    slugs: &[String],
) -> Result<Vec<genre::Model>, AppError> {
    if slugs.is_empty() {
        return Ok(Vec::new());
    }

    let found = genre::Entity::find()
        .filter(genre::Column::Slug.is_in(slugs.iter().map(String::as_str)))
        .all(db)
        .await?;

    if found.len() != slugs.len() {
        let known: Vec<&str> = found.iter().map(|g| g.slug.as_str()).collect();
        let missing = slugs
            .iter()
            .find(|s| !known.contains(&s.as_str()))
            .map_or_else(String::new, Clone::clone);
        return Err(AppError::BadRequest(format!(
            "Unknown genre slug '{missing}'."
        )));
    }

    Ok(found)
}

/// Replace the title's genre set: delete existing join rows, insert the new set.
async fn replace_title_genres(
    db: &DatabaseConnection,
    title_id: Uuid,
    genres: &[genre::Model],
) -> Result<(), AppError> {
    title_genre::Entity::delete_many()
        .filter(title_genre::Column::TitleId.eq(title_id))
        .exec(db)
        .await?;

    for g in genres {
        title_genre::ActiveModel {
            title_id: Set(title_id),
            genre_id: Set(g.id),
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

async fn load_title_genres(
    db: &DatabaseConnection,
    title_id: Uuid,
) -> Result<Vec<SlugRef>, AppError> {
    let joins = title_genre::Entity::find()
        .filter(title_genre::Column::TitleId.eq(title_id))
        .all(db)
        .await?;

    if joins.is_empty() {
        return Ok(Vec::new());
    }

    let genre_ids: Vec<Uuid> = joins.iter().map(|j| j.genre_id).collect();
    let genres = genre::Entity::find()
        .filter(genre::Column::Id.is_in(genre_ids))
        .order_by_desc(genre::Column::Name)
        .all(db)
        .await?;

    Ok(genres
        .into_iter()
        .map(|g| SlugRef {
            name: g.name,
            slug: g.slug,
        })
        .collect())
}

async fn build_title_response(
    db: &DatabaseConnection,
    t: title::Model,
) -> Result<TitleResponse, AppError> {
    let category_ref = match t.category_id {
        Some(id) => category::Entity::find_by_id(id).one(db).await?.map(|c| SlugRef {
            name: c.name,
            slug: c.slug,
        }),
        None => None,
    };

    let genres = load_title_genres(db, t.id).await?;
    let rating = rating::title_rating(db, t.id).await?;

    Ok(TitleResponse {
        id: t.id,
        name: t.name,
        year: t.year,
        description: t.description,
        category: category_ref,
        genres,
        rating,
    })
}
