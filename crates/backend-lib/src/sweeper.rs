// ============================
// crates/backend-lib/src/sweeper.rs
// ============================
//! Periodic removal of expired refresh tokens.
//!
//! Expired tokens are already rejected on use; the sweep only keeps the
//! session table from growing without bound.
use crate::clock::Clock;
use crate::metrics::SESSIONS_SWEPT;
use crate::store::{SessionStore, StoreError};
use metrics::counter;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

/// Run one purge pass.
pub async fn sweep_once(
    sessions: &dyn SessionStore,
    clock: &dyn Clock,
) -> Result<usize, StoreError> {
    let removed = sessions.purge_expired(clock.now()).await?;
    if removed > 0 {
        counter!(SESSIONS_SWEPT).increment(removed as u64);
        tracing::info!(removed, "purged expired sessions");
    }
    Ok(removed)
}

/// Spawn the periodic sweep. Failures are logged and the loop keeps going.
pub fn spawn(
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = sweep_once(sessions.as_ref(), clock.as_ref()).await {
                tracing::error!(%err, "session sweep failed");
            }
        }
    })
}
