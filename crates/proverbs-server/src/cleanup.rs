use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use proverbs_api::AppState;

/// Background task that prunes registrations nobody activated.
///
/// Runs on an interval and deletes inactive accounts whose activation key
/// has expired, together with their profiles.
pub async fn run_cleanup_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        interval.tick().await;

        let db_state = state.clone();
        let result =
            tokio::task::spawn_blocking(move || db_state.db.delete_expired_registrations(Utc::now()))
                .await;

        match result {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Cleanup: pruned {} expired registrations", count);
                }
            }
            Ok(Err(e)) => warn!("Cleanup error: {}", e),
            Err(e) => warn!("Cleanup task panicked: {}", e),
        }
    }
}
