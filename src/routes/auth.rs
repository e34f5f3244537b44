use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{jwt, password};
use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the auth route group: `/auth/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SignupRequest {
    username: String,
    password: String,
    bio: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: String,
    user: UserInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserInfo {
    id: Uuid,
    username: String,
    role: String,
    bio: Option<String>,
    created_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /auth/signup` — Register a new account with the default `user` role.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    password::validate_username(&req.username).map_err(AppError::BadRequest)?;
    password::validate_password(&req.password).map_err(AppError::BadRequest)?;

    let username = req.username.trim().to_string();

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Username is already taken.".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let account = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        password_hash: Set(password_hash),
        role: Set("user".to_string()),
        bio: Set(req.bio),
        created_at: Set(Utc::now().into()),
    };

    let account = account.insert(&state.db).await?;

    tracing::info!(username = %account.username, "New account registered");

    let token = jwt::generate_access_token(account.id, &account.role, &state.config)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: to_user_info(account),
        }),
    ))
}

/// `POST /auth/login` — Verify credentials and issue a fresh access token.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = user::Entity::find()
        .filter(user::Column::Username.eq(req.username.trim()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password.".to_string()))?;

    let matches = password::verify_password(&req.password, &account.password_hash)?;
    if !matches {
        return Err(AppError::Unauthorized(
            "Invalid username or password.".to_string(),
        ));
    }

    let token = jwt::generate_access_token(account.id, &account.role, &state.config)?;

    Ok(Json(AuthResponse {
        token,
        user: to_user_info(account),
    }))
}

fn to_user_info(u: user::Model) -> UserInfo {
    UserInfo {
        id: u.id,
        username: u.username,
        role: u.role,
        bio: u.bio,
        created_at: u.created_at.to_string(),
    }
}
