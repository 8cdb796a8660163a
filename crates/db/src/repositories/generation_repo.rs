//! Repository for the `generations` table.

use aistudio_core::types::DbId;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::generation::{CreateGeneration, Generation};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, prompt, style, image_url, created_at, status";

/// Provides create and per-user listing for generation records.
///
/// Records are never updated or deleted through this repository.
pub struct GenerationRepo;

impl GenerationRepo {
    /// Insert a generation, assigning a fresh id and the current timestamp.
    pub async fn create(
        pool: &SqlitePool,
        input: &CreateGeneration,
    ) -> Result<Generation, sqlx::Error> {
        let query = format!(
            "INSERT INTO generations (user_id, prompt, style, image_url, created_at, status)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(input.user_id)
            .bind(&input.prompt)
            .bind(&input.style)
            .bind(&input.image_url)
            .bind(Utc::now())
            .bind(&input.status)
            .fetch_one(pool)
            .await
    }

    /// List a user's generations, newest first, at most `limit` rows.
    ///
    /// Equal timestamps fall back to id order so later inserts still come
    /// first. `limit` is expected to be validated by the caller.
    pub async fn list_by_user(
        pool: &SqlitePool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<Generation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generations
             WHERE user_id = ?
             ORDER BY created_at DESC, id DESC
             LIMIT ?"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
