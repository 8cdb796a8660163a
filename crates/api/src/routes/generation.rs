//! Route definitions for the `/generations` resource.

use aistudio_core::generation::MAX_IMAGE_BYTES;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Headroom above the image cap for the text fields and multipart framing.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Generation routes (both require auth).
///
/// ```text
/// GET  /generations?limit=N   -> list_generations
/// POST /generations           -> create_generation (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/generations",
            get(generation::list_generations).post(generation::create_generation),
        )
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + FORM_OVERHEAD_BYTES))
}
