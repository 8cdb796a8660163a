pub mod auth;
pub mod generation;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the API route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/signup                 signup (public)
/// /auth/login                  login (public)
///
/// /generations                 create (multipart), list (?limit=N)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(generation::router())
}
