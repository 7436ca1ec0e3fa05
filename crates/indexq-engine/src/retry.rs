//! Retry timing for failed entries.
//!
//! Backoff is linear: after its n-th failure an entry waits
//! `base_interval * n` before becoming eligible again, so consecutive
//! retries wait strictly longer than the previous one. Both bounds are
//! explicit opt-in configuration; the defaults retry forever with
//! unbounded delay growth.

use std::time::Duration;

use chrono::{DateTime, Utc};

use indexq_types::QueueConfig;

/// Default base interval between retries.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(60);

/// Retry schedule policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    base_interval: chrono::Duration,
    max_delay: Option<chrono::Duration>,
    max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_INTERVAL)
    }
}

impl RetryPolicy {
    /// Create a policy with the given base interval and no bounds.
    pub fn new(base_interval: Duration) -> Self {
        Self {
            base_interval: chrono::Duration::from_std(base_interval)
                .unwrap_or_else(|_| chrono::Duration::seconds(60)),
            max_delay: None,
            max_attempts: None,
        }
    }

    /// Build a policy from queue configuration.
    pub fn from_config(config: &QueueConfig) -> Self {
        let mut policy = Self::new(config.retry_interval());
        if let Some(max_delay) = config.max_delay() {
            policy = policy.with_max_delay(max_delay);
        }
        if let Some(max_attempts) = config.max_attempts {
            policy = policy.with_max_attempts(max_attempts);
        }
        policy
    }

    /// Cap the computed delay.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay =
            Some(chrono::Duration::from_std(max_delay).unwrap_or(chrono::Duration::MAX));
        self
    }

    /// Abandon entries once a failure would push their attempt count
    /// past this value.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Next eligible time after a failure, given the entry's attempt
    /// count including the failure just recorded.
    pub fn next_run_at(&self, now: DateTime<Utc>, attempt_count: u32) -> DateTime<Utc> {
        let mut delay = self.base_interval * attempt_count as i32;
        if let Some(cap) = self.max_delay {
            delay = delay.min(cap);
        }
        now + delay
    }

    /// Whether an entry at this attempt count should be abandoned
    /// instead of rescheduled.
    pub fn exhausted(&self, attempt_count: u32) -> bool {
        match self.max_attempts {
            Some(cap) => attempt_count > cap,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::new(Duration::from_secs(60));
        let now = Utc::now();

        assert_eq!(policy.next_run_at(now, 1), now + chrono::Duration::seconds(60));
        assert_eq!(policy.next_run_at(now, 2), now + chrono::Duration::seconds(120));
        assert_eq!(policy.next_run_at(now, 5), now + chrono::Duration::seconds(300));
    }

    #[test]
    fn test_each_retry_waits_longer() {
        let policy = RetryPolicy::new(Duration::from_secs(30));
        let now = Utc::now();

        let mut previous = now;
        for attempt in 1..10 {
            let next = policy.next_run_at(now, attempt);
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_max_delay_clamps_growth() {
        let policy =
            RetryPolicy::new(Duration::from_secs(60)).with_max_delay(Duration::from_secs(150));
        let now = Utc::now();

        assert_eq!(policy.next_run_at(now, 1), now + chrono::Duration::seconds(60));
        assert_eq!(policy.next_run_at(now, 2), now + chrono::Duration::seconds(120));
        assert_eq!(policy.next_run_at(now, 3), now + chrono::Duration::seconds(150));
        assert_eq!(policy.next_run_at(now, 100), now + chrono::Duration::seconds(150));
    }

    #[test]
    fn test_unbounded_by_default() {
        let policy = RetryPolicy::default();
        assert!(!policy.exhausted(1_000_000));
    }

    #[test]
    fn test_max_attempts_boundary() {
        let policy = RetryPolicy::default().with_max_attempts(3);
        assert!(!policy.exhausted(1));
        assert!(!policy.exhausted(3));
        assert!(policy.exhausted(4));
    }

    #[test]
    fn test_from_config() {
        let config = QueueConfig {
            retry_interval_secs: 10,
            max_attempts: Some(2),
            max_delay_secs: Some(15),
            ..Default::default()
        };
        let policy = RetryPolicy::from_config(&config);
        let now = Utc::now();

        assert_eq!(policy.next_run_at(now, 1), now + chrono::Duration::seconds(10));
        assert_eq!(policy.next_run_at(now, 2), now + chrono::Duration::seconds(15));
        assert!(policy.exhausted(3));
    }
}
