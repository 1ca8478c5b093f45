//! Cluster launch state machine with bounded retry and cleanup
//!
//! NotStarted -> Starting -> Ready | Failed. A failed start deletes the
//! partial cluster and goes back to NotStarted; exceeding the attempt
//! bound is terminal. The loop is generic over the start/delete actions
//! so it can be exercised without subprocesses.

use crate::utils::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    NotStarted,
    Starting,
    Ready,
    Failed,
}

impl std::fmt::Display for LaunchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LaunchState::NotStarted => "not-started",
            LaunchState::Starting => "starting",
            LaunchState::Ready => "ready",
            LaunchState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// What the launch loop did, for reporting and assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub state: LaunchState,
    pub start_attempts: u32,
    pub deletes: u32,
}

impl LaunchReport {
    pub fn succeeded(&self) -> bool {
        self.state == LaunchState::Ready
    }
}

/// Run the start command with bounded retries, deleting the partial
/// cluster between attempts.
///
/// `start` runs the external start command; an Err is a failed attempt.
/// `delete` cleans up the partial cluster; its own failure is logged and
/// does not consume an attempt.
pub fn launch_with_retry<S, D>(policy: &RetryPolicy, mut start: S, mut delete: D) -> LaunchReport
where
    S: FnMut(u32) -> anyhow::Result<()>,
    D: FnMut() -> anyhow::Result<()>,
{
    let mut state;
    let mut attempts = 0u32;
    let mut deletes = 0u32;

    loop {
        attempts += 1;
        state = LaunchState::Starting;
        crate::log_info!(
            "Cluster start attempt {}/{} (state: {})",
            attempts,
            policy.max_attempts,
            state
        );

        match start(attempts) {
            Ok(()) => {
                state = LaunchState::Ready;
                return LaunchReport {
                    state,
                    start_attempts: attempts,
                    deletes,
                };
            }
            Err(e) => {
                crate::log_warn!("Start attempt {} failed: {}", attempts, e);

                if !policy.allows_another(attempts) {
                    state = LaunchState::Failed;
                    return LaunchReport {
                        state,
                        start_attempts: attempts,
                        deletes,
                    };
                }

                // Clean up the partial cluster before the next attempt
                match delete() {
                    Ok(()) => deletes += 1,
                    Err(del_err) => {
                        // Count the attempt; minikube start will complain
                        // itself if leftover state is in the way
                        deletes += 1;
                        crate::log_warn!("Cleanup delete failed: {}", del_err);
                    }
                }

                state = LaunchState::NotStarted;
                crate::log_info!(
                    "Cluster back to {}, retrying in {}s",
                    state,
                    policy.interval.as_secs()
                );
                policy.sleep();
            }
        }
    }
}

/// Poll a readiness probe at a fixed interval up to the attempt bound.
///
/// Returns true once the probe reports ready; false on exhaustion. Probe
/// errors count as "not ready yet" since the API server may still be
/// coming up. Exhaustion is non-fatal for callers by design.
pub fn poll_readiness<P>(policy: &RetryPolicy, mut probe: P) -> bool
where
    P: FnMut() -> anyhow::Result<bool>,
{
    for attempt in 1..=policy.max_attempts {
        match probe() {
            Ok(true) => {
                crate::log_info!("All nodes ready (poll attempt {})", attempt);
                return true;
            }
            Ok(false) => {
                crate::log_info!(
                    "Nodes not ready yet (poll attempt {}/{})",
                    attempt,
                    policy.max_attempts
                );
            }
            Err(e) => {
                crate::log_info!(
                    "Readiness probe failed (poll attempt {}/{}): {}",
                    attempt,
                    policy.max_attempts,
                    e
                );
            }
        }

        if attempt < policy.max_attempts {
            policy.sleep();
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(0))
    }

    #[test]
    fn test_first_attempt_succeeds() {
        let report = launch_with_retry(&fast_policy(3), |_| Ok(()), || Ok(()));

        assert_eq!(report.state, LaunchState::Ready);
        assert_eq!(report.start_attempts, 1);
        assert_eq!(report.deletes, 0);
        assert!(report.succeeded());
    }

    #[test]
    fn test_succeeds_after_one_failure() {
        let mut deletes = 0;
        let report = launch_with_retry(
            &fast_policy(3),
            |attempt| {
                if attempt == 1 {
                    Err(anyhow!("boom"))
                } else {
                    Ok(())
                }
            },
            || {
                deletes += 1;
                Ok(())
            },
        );

        assert_eq!(report.state, LaunchState::Ready);
        assert_eq!(report.start_attempts, 2);
        assert_eq!(report.deletes, 1);
        assert_eq!(deletes, 1);
    }

    #[test]
    fn test_three_failures_is_terminal_with_two_deletes() {
        let mut starts = 0;
        let mut deletes = 0;
        let report = launch_with_retry(
            &fast_policy(3),
            |_| {
                starts += 1;
                Err(anyhow!("boom"))
            },
            || {
                deletes += 1;
                Ok(())
            },
        );

        assert_eq!(report.state, LaunchState::Failed);
        assert!(!report.succeeded());
        // Never more than max_attempts starts; deletes only between attempts
        assert_eq!(starts, 3);
        assert_eq!(report.start_attempts, 3);
        assert_eq!(deletes, 2);
        assert_eq!(report.deletes, 2);
    }

    #[test]
    fn test_delete_failure_does_not_abort_retry() {
        let report = launch_with_retry(
            &fast_policy(2),
            |attempt| {
                if attempt == 1 {
                    Err(anyhow!("boom"))
                } else {
                    Ok(())
                }
            },
            || Err(anyhow!("delete failed")),
        );

        assert_eq!(report.state, LaunchState::Ready);
        assert_eq!(report.start_attempts, 2);
    }

    #[test]
    fn test_poll_readiness_success() {
        let mut calls = 0;
        let ready = poll_readiness(&fast_policy(5), || {
            calls += 1;
            Ok(calls >= 3)
        });

        assert!(ready);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_poll_readiness_exhaustion_bounded() {
        let mut calls = 0;
        let ready = poll_readiness(&fast_policy(4), || {
            calls += 1;
            Ok(false)
        });

        assert!(!ready);
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_poll_readiness_probe_errors_count_as_not_ready() {
        let mut calls = 0;
        let ready = poll_readiness(&fast_policy(3), || {
            calls += 1;
            Err(anyhow!("connection refused"))
        });

        assert!(!ready);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_launch_state_display() {
        assert_eq!(format!("{}", LaunchState::Ready), "ready");
        assert_eq!(format!("{}", LaunchState::Failed), "failed");
    }
}
