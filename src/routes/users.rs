use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::middleware::{AdminUser, AuthUser};
use crate::entities::user;
use crate::error::AppError;
use crate::routes::titles::{PaginatedResponse, PaginationQuery};
use crate::state::AppState;

/// Build the user route group: `/users/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_me))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    id: Uuid,
    username: String,
    role: String,
    bio: Option<String>,
    created_at: String,
}

/// `GET /users/me` — The authenticated caller's profile.
async fn get_me(AuthUser(caller): AuthUser) -> Json<UserResponse> {
    Json(to_user_response(caller))
}

/// `GET /users` — Admin-only account listing, username descending.
async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let total = user::Entity::find().count(&state.db).await?;

    let accounts = user::Entity::find()
        .order_by_desc(user::Column::Username)
        .offset(pagination.offset)
        .limit(pagination.limit)
        .all(&state.db)
        .await?;

    Ok(Json(PaginatedResponse {
        data: accounts.into_iter().map(to_user_response).collect(),
        total,
        offset: pagination.offset,
        limit: pagination.limit,
    }))
}

fn to_user_response(u: user::Model) -> UserResponse {
    UserResponse {
        id: u.id,
        username: u.username,
        role: u.role,
        bio: u.bio,
        created_at: u.created_at.to_string(),
    }
}
