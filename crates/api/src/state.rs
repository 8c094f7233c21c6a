use std::path::PathBuf;
use std::sync::Arc;

use cad3d_pipeline::Orchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool. `None` when `DATABASE_URL` is unset.
    pub pool: Option<cad3d_db::DbPool>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Conversion job orchestrator.
    pub orchestrator: Arc<Orchestrator>,
    /// Root of the local object store, served under `/storage` so local
    /// public locators resolve. `None` for remote backends.
    pub local_storage: Option<PathBuf>,
}

impl AppState {
    /// The database pool, or [`AppError::Unavailable`] when none is configured.
    ///
    /// [`AppError::Unavailable`]: crate::error::AppError::Unavailable
    pub fn require_pool(&self) -> crate::error::AppResult<&cad3d_db::DbPool> {
        self.pool.as_ref().ok_or_else(|| {
            crate::error::AppError::Unavailable("metadata storage is not configured".into())
        })
    }
}
