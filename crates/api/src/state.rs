use std::sync::Arc;

use aistudio_core::artifact::{ArtifactStore, UploadStaging};
use aistudio_core::simulator::GenerationSimulator;

use crate::config::ServerConfig;
use crate::generation::service::GenerationService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: aistudio_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Generation service (simulated model, artifact store, repository).
    pub generations: Arc<GenerationService>,
    /// Writes incoming uploads to the staging directory.
    pub staging: UploadStaging,
}

impl AppState {
    /// Build state with the production simulator.
    pub fn new(pool: aistudio_db::DbPool, config: ServerConfig) -> Self {
        Self::with_simulator(pool, config, GenerationSimulator::default())
    }

    /// Build state with an injected simulator.
    pub fn with_simulator(
        pool: aistudio_db::DbPool,
        config: ServerConfig,
        simulator: GenerationSimulator,
    ) -> Self {
        let artifacts = ArtifactStore::new(config.uploads_dir.clone());
        let staging = UploadStaging::new(config.staging_dir.clone());
        let generations = Arc::new(GenerationService::new(pool.clone(), simulator, artifacts));

        Self {
            pool,
            config: Arc::new(config),
            generations,
            staging,
        }
    }
}
