//! Generation record model and DTOs.

use aistudio_core::types::{DbId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;

/// A completed generation row from the `generations` table.
///
/// Rows are immutable once written. Failed attempts never reach this table.
#[derive(Debug, Clone, FromRow)]
pub struct Generation {
    pub id: DbId,
    pub user_id: DbId,
    pub prompt: String,
    pub style: String,
    pub image_url: String,
    pub created_at: Timestamp,
    pub status: String,
}

/// DTO for inserting a generation. `id` and `created_at` are assigned on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGeneration {
    pub user_id: DbId,
    pub prompt: String,
    pub style: String,
    pub image_url: String,
    pub status: String,
}
