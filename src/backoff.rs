//! Polite-crawling delays.
//!
//! DBLP asks crawlers to slow down when they receive 429 responses
//! (<https://dblp.org/faq/Am+I+allowed+to+crawl+the+dblp+website.html>).
//! Retry delays grow linearly with the retry count and carry random jitter;
//! a short random pause is also taken between requests even when they succeed.

use rand::Rng;
use std::time::Duration;

/// Delay settings for one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Retries allowed for a rate-limited request before giving up
    pub max_retries: u32,
    /// Fixed part of every retry delay
    pub base_delay: Duration,
    /// Added once per retry already made
    pub step: Duration,
    /// Upper bound of the random part of a retry delay
    pub jitter: Duration,
    /// Bounds of the pause between successive requests
    pub pause_min: Duration,
    pub pause_max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_delay: Duration::from_millis(1000),
            step: Duration::from_millis(1000),
            jitter: Duration::from_millis(500),
            pause_min: Duration::from_millis(500),
            pause_max: Duration::from_millis(1500),
        }
    }
}

impl BackoffPolicy {
    /// Policy without any waiting, for tests and dry runs against local servers.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            step: Duration::ZERO,
            jitter: Duration::ZERO,
            pause_min: Duration::ZERO,
            pause_max: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let grown = self.step.saturating_mul(retry.saturating_sub(1));
        self.base_delay
            .saturating_add(grown)
            .saturating_add(random_between(Duration::ZERO, self.jitter))
    }

    /// Whether `retries` already made exhaust the budget.
    pub fn exhausted(&self, retries: u32) -> bool {
        retries >= self.max_retries
    }

    /// Randomized pause between requests.
    pub fn pause(&self) -> Duration {
        random_between(self.pause_min, self.pause_max)
    }
}

fn random_between(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let lo = min.as_millis() as u64;
    let hi = max.as_millis() as u64;
    Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            step: Duration::from_millis(500),
            jitter: Duration::from_millis(100),
            pause_min: Duration::from_millis(200),
            pause_max: Duration::from_millis(400),
        }
    }

    #[test]
    fn test_retry_delay_grows_with_retry_count() {
        let policy = policy();
        for retry in 1..=3u32 {
            let delay = policy.retry_delay(retry);
            let floor = Duration::from_millis(1000 + 500 * (retry as u64 - 1));
            assert!(delay >= floor, "retry {retry}: {delay:?} < {floor:?}");
            assert!(delay <= floor + Duration::from_millis(100));
        }
    }

    #[test]
    fn test_pause_within_bounds() {
        let policy = policy();
        for _ in 0..50 {
            let pause = policy.pause();
            assert!(pause >= Duration::from_millis(200));
            assert!(pause <= Duration::from_millis(400));
        }
    }

    #[test]
    fn test_exhausted() {
        let policy = policy();
        assert!(!policy.exhausted(2));
        assert!(policy.exhausted(3));
        assert!(BackoffPolicy::immediate(0).exhausted(0));
    }

    #[test]
    fn test_immediate_never_waits() {
        let policy = BackoffPolicy::immediate(5);
        assert_eq!(policy.retry_delay(4), Duration::ZERO);
        assert_eq!(policy.pause(), Duration::ZERO);
    }
}
