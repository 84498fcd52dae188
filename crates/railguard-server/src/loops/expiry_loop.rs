//! Stale-alert sweep loop.
//!
//! Resolved and false-alarm alerts stay queryable for a retention
//! window, then get dropped from the working set so memory stays
//! bounded. Active and acknowledged alerts are never touched.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::interval;

use crate::state::AppState;

/// Run the sweep loop until shutdown is signalled.
pub async fn run(state: Arc<AppState>, sweep_secs: u64, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval(Duration::from_secs(sweep_secs.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = state.prune_retired_alerts(Utc::now());
                if removed > 0 {
                    tracing::info!(removed, "pruned retired alerts");
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
