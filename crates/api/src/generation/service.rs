//! Central generation service.
//!
//! Held in [`AppState`](crate::state::AppState) as an
//! `Arc<GenerationService>`.

use std::path::PathBuf;

use aistudio_core::artifact::ArtifactStore;
use aistudio_core::error::CoreError;
use aistudio_core::generation::{GenerationInput, STATUS_COMPLETED};
use aistudio_core::simulator::GenerationSimulator;
use aistudio_core::types::{DbId, Timestamp};
use aistudio_db::models::generation::{CreateGeneration, Generation};
use aistudio_db::repositories::GenerationRepo;
use aistudio_db::DbPool;
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Message for a missing or empty source image.
pub const IMAGE_REQUIRED: &str = "Image upload is required";

/// A generation request after upload handling.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub user_id: DbId,
    pub input: GenerationInput,
    /// Staged upload to derive the artifact from.
    pub source_path: PathBuf,
}

/// Public representation of a generation record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub id: DbId,
    pub prompt: String,
    pub style: String,
    pub image_url: String,
    pub created_at: Timestamp,
    pub status: String,
}

impl From<Generation> for GenerationResponse {
    fn from(g: Generation) -> Self {
        Self {
            id: g.id,
            prompt: g.prompt,
            style: g.style,
            image_url: g.image_url,
            created_at: g.created_at,
            status: g.status,
        }
    }
}

/// Runs generations end to end.
///
/// Lifecycle of one request:
/// 1. Validate prompt and style.
/// 2. Check the source image exists and is non-empty.
/// 3. Wait out the simulated model (may fail with overload).
/// 4. Copy the source into the uploads directory.
/// 5. Persist the record as completed.
///
/// The first failure stops the run. Nothing is written before step 4, and a
/// failed insert removes the artifact written in step 4.
pub struct GenerationService {
    pool: DbPool,
    simulator: GenerationSimulator,
    artifacts: ArtifactStore,
}

impl GenerationService {
    pub fn new(pool: DbPool, simulator: GenerationSimulator, artifacts: ArtifactStore) -> Self {
        Self {
            pool,
            simulator,
            artifacts,
        }
    }

    /// Create a completed generation for `request.user_id`.
    pub async fn create_generation(
        &self,
        request: GenerationRequest,
    ) -> AppResult<GenerationResponse> {
        let (prompt, style) = request.input.validated()?;

        let source_len = tokio::fs::metadata(&request.source_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if source_len == 0 {
            return Err(AppError::Core(CoreError::Validation(IMAGE_REQUIRED.into())));
        }

        self.simulator.simulate().await.map_err(CoreError::from)?;

        let original_filename = request
            .source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let image_url = self
            .artifacts
            .store(&request.source_path, &original_filename)
            .await
            .map_err(CoreError::from)?;

        let created = GenerationRepo::create(
            &self.pool,
            &CreateGeneration {
                user_id: request.user_id,
                prompt,
                style: style.as_str().to_string(),
                image_url: image_url.clone(),
                status: STATUS_COMPLETED.to_string(),
            },
        )
        .await;

        let generation = match created {
            Ok(generation) => generation,
            Err(e) => {
                self.artifacts.remove(&image_url).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            generation_id = generation.id,
            user_id = generation.user_id,
            style = %generation.style,
            image_url = %generation.image_url,
            "Generation persisted"
        );
        Ok(generation.into())
    }

    /// The user's most recent generations, newest first.
    ///
    /// `limit` is expected to be validated by the caller.
    pub async fn list_generations(
        &self,
        user_id: DbId,
        limit: i64,
    ) -> AppResult<Vec<GenerationResponse>> {
        let rows = GenerationRepo::list_by_user(&self.pool, user_id, limit).await?;
        Ok(rows.into_iter().map(GenerationResponse::from).collect())
    }
}
