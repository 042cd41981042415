use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jitter {
    /// Sleep exactly the computed backoff.
    #[default]
    None,
    /// Sleep a uniformly random duration in `[0, backoff]`.
    Full,
}

/// Bounded exponential backoff.
///
/// The delay before attempt `k` (k >= 2) is `initial_delay * backoff_multiplier^(k-2)`,
/// capped by `max_delay` when one is set. Attempt 1 never waits.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Option<Duration>,
    pub jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            max_delay: None,
            jitter: Jitter::None,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_multiplier,
            ..Default::default()
        }
    }

    /// Run the operation once, never retry.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO, 1.0)
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Backoff to sleep before `attempt` (1-based), before jitter.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exp = i32::try_from(attempt - 2).unwrap_or(i32::MAX);
        // Integral nanosecond products stay exact in f64 well past any realistic backoff.
        let nanos = self.initial_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exp);
        let raw = if nanos.is_finite() && nanos < u64::MAX as f64 {
            Duration::from_nanos(nanos.round().max(0.0) as u64)
        } else {
            Duration::MAX
        };
        match self.max_delay {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }

    /// Sum of all backoff sleeps for a run that uses every attempt.
    pub fn total_delay(&self) -> Duration {
        (2..=self.max_attempts)
            .map(|k| self.delay_before(k))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}
