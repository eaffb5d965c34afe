//! Sliding-window rate limiter guarding calls against the simulator.
//!
//! The limiter throttles load on the remote site, not per-trade behaviour, so
//! one instance is shared (via `Arc`) by every component that talks to the
//! same site. Calls beyond the quota wait for capacity instead of failing,
//! unless a maximum wait is configured.

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::RateLimitError;
use crate::metrics;

/// Default number of admissions per window.
pub const DEFAULT_CALLS: u32 = 6;
/// Default window length.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(30);

/// Number of admissions allowed per rolling period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    calls: NonZeroU32,
    period: Duration,
}

impl Quota {
    pub fn new(calls: NonZeroU32, period: Duration) -> Self {
        Self { calls, period }
    }

    /// Quota from raw numbers. `None` if `calls` is zero.
    pub fn per_period(calls: u32, period: Duration) -> Option<Self> {
        NonZeroU32::new(calls).map(|calls| Self::new(calls, period))
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            calls: NonZeroU32::new(DEFAULT_CALLS).unwrap_or(NonZeroU32::MIN),
            period: DEFAULT_PERIOD,
        }
    }
}

/// Sliding-window limiter.
///
/// Time is read from tokio's clock, so paused-time tests control it.
/// Dropping an `acquire` future cancels the wait without consuming a slot.
#[derive(Debug)]
pub struct RateLimiter {
    quota: Quota,
    max_wait: Option<Duration>,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(quota: Quota) -> Self {
        Self {
            quota,
            max_wait: None,
            admitted: Mutex::new(VecDeque::with_capacity(quota.calls() as usize)),
        }
    }

    /// Fail instead of waiting longer than `max_wait` in total.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn quota(&self) -> Quota {
        self.quota
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait
    }

    /// Wait until the window admits one more call, then record it.
    pub async fn acquire(&self) -> Result<(), RateLimitError> {
        let started = Instant::now();
        let mut throttled = false;

        loop {
            let wait = {
                let mut admitted = self.admitted.lock().await;
                let now = Instant::now();
                self.evict_expired(&mut admitted, now);

                if admitted.len() < self.quota.calls() as usize {
                    admitted.push_back(now);
                    if throttled {
                        metrics::record_rate_limit_wait(started.elapsed());
                    }
                    return Ok(());
                }

                admitted
                    .front()
                    .map(|oldest| match oldest.checked_add(self.quota.period) {
                        Some(expiry) => expiry.saturating_duration_since(now),
                        None => self.quota.period,
                    })
                    .unwrap_or_default()
            };

            if let Some(max_wait) = self.max_wait {
                let required = started.elapsed().saturating_add(wait);
                if required > max_wait {
                    metrics::inc_rate_limit_rejections();
                    return Err(RateLimitError::WaitExceeded { required, max_wait });
                }
            }

            if !throttled {
                debug!(
                    wait_ms = wait.as_millis() as u64,
                    calls = self.quota.calls(),
                    period_s = self.quota.period.as_secs(),
                    "Rate limit reached, waiting for window"
                );
                throttled = true;
            }

            tokio::time::sleep(wait).await;
        }
    }

    /// Admissions still available in the current window.
    pub async fn available(&self) -> u32 {
        let mut admitted = self.admitted.lock().await;
        self.evict_expired(&mut admitted, Instant::now());
        self.quota.calls().saturating_sub(admitted.len() as u32)
    }

    fn evict_expired(&self, admitted: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = admitted.front() {
            if now.saturating_duration_since(*oldest) >= self.quota.period {
                admitted.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Quota::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn quota_rejects_zero_calls() {
        assert!(Quota::per_period(0, DEFAULT_PERIOD).is_none());
        let quota = Quota::default();
        assert_eq!(quota.calls(), 6);
        assert_eq!(quota.period(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn seventh_call_waits_for_the_window() {
        let limiter = RateLimiter::default();
        let start = Instant::now();

        for _ in 0..6 {
            limiter.acquire().await.unwrap();
            tokio::time::advance(Duration::from_millis(800)).await;
        }
        assert_eq!(limiter.available().await, 0);
        assert!(start.elapsed() < Duration::from_secs(5));

        limiter.acquire().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(30), "admitted after {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(31), "admitted after {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_rather_than_resets() {
        let limiter = RateLimiter::new(Quota::per_period(2, Duration::from_secs(10)).unwrap());

        limiter.acquire().await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        limiter.acquire().await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;

        // First admission has left the window, second has not.
        assert_eq!(limiter.available().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn max_wait_turns_waiting_into_an_error() {
        let limiter = RateLimiter::new(Quota::per_period(1, Duration::from_secs(30)).unwrap())
            .with_max_wait(Duration::from_secs(5));

        limiter.acquire().await.unwrap();
        let err = limiter.acquire().await.unwrap_err();
        assert_eq!(
            err,
            RateLimitError::WaitExceeded {
                required: Duration::from_secs(30),
                max_wait: Duration::from_secs(5),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn clones_of_the_arc_share_one_quota() {
        let limiter = Arc::new(RateLimiter::new(
            Quota::per_period(3, Duration::from_secs(30)).unwrap(),
        ));
        let other = Arc::clone(&limiter);

        limiter.acquire().await.unwrap();
        other.acquire().await.unwrap();
        limiter.acquire().await.unwrap();

        assert_eq!(other.available().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_window_end_does_not_panic() {
        let limiter = RateLimiter::new(Quota::per_period(1, Duration::MAX).unwrap())
            .with_max_wait(Duration::from_secs(5));

        limiter.acquire().await.unwrap();
        assert!(matches!(
            limiter.acquire().await,
            Err(RateLimitError::WaitExceeded { required, .. }) if required == Duration::MAX
        ));
    }
}
