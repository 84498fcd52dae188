//! Exponential backoff for polling clients.
//!
//! Advisory monitors and train units poll the server on a fixed
//! interval; when the server is unreachable they widen the gap between
//! attempts instead of tight-looping, and snap back on the first
//! success.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const JITTER_RATIO: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    consecutive_failures: u32,
    next_attempt_at: Instant,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(Duration::from_millis(1));
        Self {
            base,
            max: max.max(base),
            consecutive_failures: 0,
            next_attempt_at: Instant::now(),
        }
    }

    /// Whether enough time has passed to try again.
    pub fn ready(&self) -> bool {
        Instant::now() >= self.next_attempt_at
    }

    /// Record a success: the next attempt may happen immediately.
    pub fn on_success(&mut self) {
        self.consecutive_failures = 0;
        self.next_attempt_at = Instant::now();
    }

    /// Record a failure and return the delay before the next attempt.
    pub fn on_failure(&mut self) -> Duration {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let delay = jittered(self.delay_for(self.consecutive_failures));
        self.next_attempt_at = Instant::now() + delay;
        delay
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    fn delay_for(&self, failures: u32) -> Duration {
        let exponent = failures.min(16);
        let scaled = self.base.saturating_mul(1u32 << exponent.min(31));
        scaled.min(self.max)
    }
}

// Deterministic-enough jitter from the subsecond clock; polling clients
// don't need a real RNG for this.
fn jittered(delay: Duration) -> Duration {
    let delay_ms = delay.as_millis() as u64;
    let span = ((delay_ms as f64) * JITTER_RATIO) as u64;
    if span == 0 {
        return delay;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    delay + Duration::from_millis(nanos % (span + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_ready() {
        let backoff = Backoff::new(Duration::from_millis(10), Duration::from_secs(1));
        assert!(backoff.ready());
        assert_eq!(backoff.consecutive_failures(), 0);
    }

    #[test]
    fn failure_delays_and_success_resets() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(10));

        let delay = backoff.on_failure();
        assert!(delay >= Duration::from_millis(200));
        assert!(!backoff.ready());
        assert_eq!(backoff.consecutive_failures(), 1);

        backoff.on_success();
        assert!(backoff.ready());
        assert_eq!(backoff.consecutive_failures(), 0);
    }

    #[test]
    fn delay_grows_then_saturates_at_max() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(500));

        let d1 = backoff.on_failure();
        let d2 = backoff.on_failure();
        let d3 = backoff.on_failure();
        assert!(d2 >= d1);
        // 100ms * 2^3 = 800ms, capped at 500ms plus up to 20% jitter.
        assert!(d3 >= Duration::from_millis(500));
        assert!(d3 <= Duration::from_millis(600));
    }
}
