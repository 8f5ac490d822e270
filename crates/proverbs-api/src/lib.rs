pub mod auth;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod passages;
pub mod profile;
pub mod references;
pub mod routes;
pub mod verses;
pub mod versions;

use std::sync::Arc;

use proverbs_db::Database;
use tracing::error;

pub use error::ApiError;
pub use routes::router;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Full name of the version new profiles start with.
    pub default_version: String,
}

/// Run blocking database work off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
        })?
}
