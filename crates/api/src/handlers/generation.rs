//! Handlers for the `/generations` resource.

use aistudio_core::error::CoreError;
use aistudio_core::generation::{
    is_allowed_image_type, resolve_history_limit, GenerationInput, MAX_IMAGE_BYTES,
};
use axum::body::Bytes;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use image::ImageFormat;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::generation::service::{GenerationRequest, GenerationResponse, IMAGE_REQUIRED};
use crate::middleware::auth::AuthUser;
use crate::response::ItemsResponse;
use crate::state::AppState;

const UNSUPPORTED_IMAGE: &str = "Only JPEG or PNG images are supported";
const IMAGE_TOO_LARGE: &str = "Image must be at most 10 MB";

/// Query parameters for `GET /generations`.
///
/// `limit` is kept raw so malformed values surface as validation errors.
#[derive(Debug, Deserialize)]
pub struct ListGenerationsQuery {
    pub limit: Option<String>,
}

/// An image part read from the multipart body.
struct ImageUpload {
    filename: String,
    bytes: Bytes,
}

/// POST /generations
///
/// Multipart fields: `prompt`, optional `style`, and `image` (JPEG or PNG).
pub async fn create_generation(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<GenerationResponse>)> {
    let (input, image) = read_generation_form(multipart).await?;
    let image =
        image.ok_or_else(|| AppError::Core(CoreError::Validation(IMAGE_REQUIRED.into())))?;
    input.validated()?;

    let staged = state
        .staging
        .stage(&image.filename, &image.bytes)
        .await
        .map_err(CoreError::from)?;

    let result = state
        .generations
        .create_generation(GenerationRequest {
            user_id: auth.user_id,
            input,
            source_path: staged.path.clone(),
        })
        .await;
    drop(staged);

    Ok((StatusCode::CREATED, Json(result?)))
}

/// GET /generations?limit=N
///
/// The caller's most recent generations, newest first.
pub async fn list_generations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListGenerationsQuery>,
) -> AppResult<Json<ItemsResponse<GenerationResponse>>> {
    let limit = resolve_history_limit(params.limit.as_deref())?;
    let items = state.generations.list_generations(auth.user_id, limit).await?;
    Ok(Json(ItemsResponse { items }))
}

// ---------------------------------------------------------------------------
// Multipart parsing
// ---------------------------------------------------------------------------

async fn read_generation_form(
    mut multipart: Multipart,
) -> AppResult<(GenerationInput, Option<ImageUpload>)> {
    let mut input = GenerationInput::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        match field.name() {
            Some("prompt") => {
                input.prompt = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
            }
            Some("style") => {
                let style = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                input.style = Some(style).filter(|s| !s.is_empty());
            }
            Some("image") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !is_allowed_image_type(&content_type) {
                    return Err(AppError::BadRequest(UNSUPPORTED_IMAGE.into()));
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                        AppError::BadRequest(IMAGE_TOO_LARGE.into())
                    } else {
                        AppError::BadRequest(e.body_text())
                    }
                })?;
                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err(AppError::BadRequest(IMAGE_TOO_LARGE.into()));
                }
                if !bytes.is_empty() && !sniffs_as_jpeg_or_png(&bytes) {
                    return Err(AppError::BadRequest(UNSUPPORTED_IMAGE.into()));
                }
                if !bytes.is_empty() {
                    image = Some(ImageUpload { filename, bytes });
                }
            }
            _ => {}
        }
    }

    Ok((input, image))
}

/// Whether the leading bytes carry a JPEG or PNG signature.
fn sniffs_as_jpeg_or_png(bytes: &[u8]) -> bool {
    matches!(
        image::guess_format(bytes),
        Ok(ImageFormat::Png | ImageFormat::Jpeg)
    )
}
