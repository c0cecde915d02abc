//! Background task that periodically evicts expired sessions so the store
//! doesn't grow unbounded across long-lived deployments.

use std::sync::Arc;

use chrono::Utc;

use crate::store::SessionStore;

/// Spawn the sweeper loop on the current tokio runtime. Runs until the
/// returned handle is aborted or the process exits.
pub fn spawn_sweeper(store: Arc<SessionStore>) -> tokio::task::JoinHandle<()> {
    let interval = store.config().sweep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            store.sweep_expired(Utc::now()).await;
        }
    })
}
