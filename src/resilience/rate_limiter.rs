use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum interval between consecutive `acquire` calls.
///
/// There is a single slot for the whole dependency. Waiters queue on a fair
/// mutex, so concurrent callers are released in call order, each at least
/// `interval` after the previous one.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_acquire: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_acquire: Mutex::new(None),
        }
    }

    /// Wait until the interval since the previous acquisition has elapsed,
    /// then record this acquisition.
    ///
    /// If the returned future is dropped while waiting, no timestamp is
    /// recorded and the next caller is not delayed on its behalf.
    pub async fn acquire(&self) {
        let mut last = self.last_acquire.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            let now = Instant::now();
            if now < ready_at {
                let wait = ready_at - now;
                debug!("Rate limit active, waiting {:.3}s", wait.as_secs_f64());
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_acquires_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        limiter.acquire().await;
        let first = Instant::now();
        limiter.acquire().await;
        assert!(first.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_has_passed() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(3)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_bounded_by_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        limiter.acquire().await;
        tokio::time::advance(Duration::from_millis(200)).await;

        let start = Instant::now();
        limiter.acquire().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(300));
        assert!(waited <= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_serialize() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(1)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap());
        }
        finished.sort();

        assert!(finished[0] - start < Duration::from_secs(1));
        assert!(finished[1] - finished[0] >= Duration::from_secs(1));
        assert!(finished[2] - finished[1] >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_acquire_records_nothing() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        limiter.acquire().await;
        let first = Instant::now();

        // Dropped while sleeping: the slot still belongs to the first call.
        let cancelled =
            tokio::time::timeout(Duration::from_millis(100), limiter.acquire()).await;
        assert!(cancelled.is_err());

        limiter.acquire().await;
        let waited = first.elapsed();
        assert!(waited >= Duration::from_secs(2));
        assert!(waited < Duration::from_millis(2100));
    }
}
