use std::time::Duration;

use crate::error::TimeoutExpired;

/// One iteration of a poll loop, handed to the condition being polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollAttempt {
    /// 1-based.
    pub attempt: u32,
    /// Time since the first attempt started.
    pub elapsed: Duration,
    /// Budget left before the poll expires.
    pub remaining: Duration,
}

impl PollAttempt {
    pub fn new(attempt: u32, elapsed: Duration, timeout: Duration) -> Self {
        Self {
            attempt,
            elapsed,
            remaining: timeout.saturating_sub(elapsed),
        }
    }

    pub fn is_first(&self) -> bool {
        self.attempt == 1
    }
}

/// Terminal result of a bounded poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded {
        attempt: u32,
        elapsed: Duration,
    },
    Expired {
        attempts_made: u32,
        elapsed: Duration,
        /// Message of the most recent failed evaluation, if the last one raised.
        last_error: Option<String>,
    },
}

/// The successful half of a [`PollOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    pub attempt: u32,
    pub elapsed: Duration,
}

impl PollOutcome {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempt, .. } => *attempt,
            Self::Expired { attempts_made, .. } => *attempts_made,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Succeeded { elapsed, .. } | Self::Expired { elapsed, .. } => *elapsed,
        }
    }

    /// Treat expiry as fatal for `resource`.
    pub fn into_result(
        self,
        resource: impl Into<String>,
        timeout: Duration,
    ) -> Result<Settled, TimeoutExpired> {
        match self {
            Self::Succeeded { attempt, elapsed } => Ok(Settled { attempt, elapsed }),
            Self::Expired {
                attempts_made,
                last_error,
                ..
            } => Err(TimeoutExpired {
                resource: resource.into(),
                timeout,
                attempts: attempts_made,
                last_observed: last_error,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_saturates_at_zero() {
        let a = PollAttempt::new(3, Duration::from_secs(12), Duration::from_secs(10));
        assert_eq!(a.remaining, Duration::ZERO);
        assert!(!a.is_first());
    }

    #[test]
    fn expired_outcome_becomes_timeout_error() {
        let outcome = PollOutcome::Expired {
            attempts_made: 4,
            elapsed: Duration::from_secs(10),
            last_error: Some("running 1/3".to_string()),
        };
        let err = outcome
            .into_result("nfs.cephfs-nfs", Duration::from_secs(10))
            .unwrap_err();
        assert_eq!(err.attempts, 4);
        assert!(err.to_string().contains("nfs.cephfs-nfs"));
        assert!(err.to_string().contains("running 1/3"));
    }
}
