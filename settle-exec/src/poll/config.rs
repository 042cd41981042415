use std::time::Duration;

use settle_core::PollSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Total budget. Zero still allows the first evaluation.
    pub timeout: Duration,
    /// Sleep between evaluations. Must be non-zero.
    pub interval: Duration,
    /// Abort on [`settle_core::ConditionError::Unexpected`] instead of retrying.
    pub fail_fast: bool,
    /// Upper bound for a single evaluation; overruns count as transient failures.
    pub probe_timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            interval: Duration::from_secs(10),
            fail_fast: false,
            probe_timeout: None,
        }
    }
}

impl PollConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            ..Default::default()
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = Some(probe_timeout);
        self
    }

    pub fn from_settings(settings: &PollSettings) -> Self {
        Self {
            timeout: settings.timeout(),
            interval: settings.interval(),
            fail_fast: settings.fail_fast,
            probe_timeout: settings.probe_timeout(),
        }
    }
}
