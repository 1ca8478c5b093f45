//! Bounded retry policy shared by the cluster launcher and readiness poll

use std::time::Duration;

/// Fixed-interval retry policy: at most `max_attempts` tries with a
/// constant sleep in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Whether another attempt is allowed after `attempts` tries
    pub fn allows_another(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Block for the configured interval
    pub fn sleep(&self) {
        std::thread::sleep(self.interval);
    }
}

impl Default for RetryPolicy {
    // 3 attempts matches every script variant this replaces
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_another() {
        let policy = RetryPolicy::new(3, Duration::from_secs(0));
        assert!(policy.allows_another(0));
        assert!(policy.allows_another(2));
        assert!(!policy.allows_another(3));
        assert!(!policy.allows_another(4));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.interval, Duration::from_secs(10));
    }
}
