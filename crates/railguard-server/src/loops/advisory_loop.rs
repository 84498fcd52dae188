//! Continuous advisory evaluation loop.
//!
//! Each tick snapshots the active alert set and every running train,
//! recomputes proximity from live positions, and advances each train's
//! speed tracker by one step. Ticks are serialized: the next tick cannot
//! fire until the previous body has finished, so evaluation cycles never
//! overlap.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::interval;

use crate::state::AppState;

/// Run the advisory loop until shutdown is signalled.
pub async fn run(state: Arc<AppState>, tick_secs: u64, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval(Duration::from_secs(tick_secs.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evaluated = state.run_evaluation_cycle(Utc::now());
                if evaluated > 0 {
                    tracing::debug!(trains = evaluated, "advisory cycle complete");
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
