use std::time::Duration;

use settle_core::{Jitter, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter { delay: Duration, reason: RetryReason },
    Stop { reason: RetryReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    NotRetryable,
    AttemptsExhausted,
    Backoff,
}

/// Decide whether a failed attempt gets another try and how long to wait first.
///
/// - `attempt_no`: 1-based number of the attempt that just failed.
/// - `retryable`: whether the failure matched the caller's retry filter.
/// - `rand_u64`: RNG, only consulted for [`Jitter::Full`].
pub fn decide_retry(
    policy: &RetryPolicy,
    attempt_no: u32,
    retryable: bool,
    rand_u64: impl Fn() -> u64,
) -> RetryDecision {
    if !retryable {
        return RetryDecision::Stop {
            reason: RetryReason::NotRetryable,
        };
    }
    if attempt_no >= policy.max_attempts.max(1) {
        return RetryDecision::Stop {
            reason: RetryReason::AttemptsExhausted,
        };
    }

    let backoff = policy.delay_before(attempt_no.saturating_add(1));
    let delay = match policy.jitter {
        Jitter::None => backoff,
        Jitter::Full => {
            let ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX);
            if ms == 0 {
                Duration::ZERO
            } else {
                Duration::from_millis(rand_u64() % ms.saturating_add(1))
            }
        }
    };
    RetryDecision::RetryAfter {
        delay,
        reason: RetryReason::Backoff,
    }
}
