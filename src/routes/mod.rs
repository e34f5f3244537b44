mod auth;
mod categories;
mod comments;
mod genres;
mod health;
mod reviews;
mod titles;
mod users;

use axum::Router;

use crate::state::AppState;

/// Build the complete application router.
///
/// Structure:
/// - `GET /health` — liveness check with database connectivity
/// - `/api/v1/auth` — signup / login
/// - `/api/v1/users` — profiles
/// - `/api/v1/categories`, `/api/v1/genres` — catalogue taxonomy
/// - `/api/v1/titles` — titles, with reviews nested under each title and
///   comments nested under each review
pub fn router() -> Router<AppState> {
    let api_v1 = Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/categories", categories::router())
        .nest("/genres", genres::router())
        .nest("/titles", titles::router())
        .nest("/titles/{title_id}/reviews", reviews::router())
        .nest(
            "/titles/{title_id}/reviews/{review_id}/comments",
            comments::router(),
        );

    Router::new()
        .merge(health::root_router())
        .nest("/api/v1", api_v1)
}
