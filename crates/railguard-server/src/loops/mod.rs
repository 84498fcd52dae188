//! Background loops for continuous processing.
//!
//! Each loop is owned by an explicit [`LoopHandle`] with a start/stop
//! lifecycle rather than a process-wide timer, so teardown is
//! deterministic and tests can drive the same code without a runtime
//! ticking underneath them.

pub mod advisory_loop;
pub mod expiry_loop;

use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a spawned background loop.
pub struct LoopHandle {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl LoopHandle {
    /// Spawn a loop body, handing it a shutdown receiver it must honor.
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(body(rx));
        tracing::debug!(loop_name = name, "background loop started");
        Self {
            name,
            shutdown,
            handle,
        }
    }

    /// Signal shutdown and wait for the loop to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.handle.await {
            tracing::warn!(loop_name = self.name, "loop task join failed: {err}");
        } else {
            tracing::debug!(loop_name = self.name, "background loop stopped");
        }
    }
}
