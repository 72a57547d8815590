//! Request pacing.
//!
//! A [`RateLimiter`] spaces consecutive calls by a random delay drawn from
//! `[min_delay, max_delay]`. The last-request instant lives behind an async
//! mutex that stays locked while waiting, so every task sharing one instance
//! is serialized. Each source gets its own instance.

use rand::{Rng, rng};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    max_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// # Panics
    ///
    /// Panics if `min_delay > max_delay`.
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        assert!(min_delay <= max_delay, "min_delay must not exceed max_delay");
        Self {
            min_delay,
            max_delay,
            last_request: Mutex::new(None),
        }
    }

    /// A limiter that never waits.
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    fn next_delay(&self) -> Duration {
        if self.min_delay == self.max_delay {
            return self.min_delay;
        }
        let secs = rng().random_range(self.min_delay.as_secs_f64()..=self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Wait until the drawn delay has passed since the previous call returned.
    /// The first call returns immediately.
    pub async fn wait_if_needed(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let delay = self.next_delay();
            let elapsed = previous.elapsed();
            if elapsed < delay {
                let remaining = delay - elapsed;
                debug!(?remaining, "Rate limiting");
                sleep(remaining).await;
            }
        }
        *last = Some(Instant::now());
    }
}
