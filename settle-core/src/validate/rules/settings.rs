use crate::config::{PollSettings, RetrySettings, SshSettings, WorkerSettings};
use crate::types::RetryPolicy;
use crate::validate::validator::Validator;

pub(crate) fn validate_ssh(v: &mut Validator, ssh: &SshSettings, path: &str) {
    if ssh.binary.trim().is_empty() {
        v.push(format!("{path}.binary"), "must not be empty");
    }
    if ssh.command_timeout_secs == 0 {
        v.push(format!("{path}.command_timeout_secs"), "must be > 0");
    }
}

pub(crate) fn validate_poll(v: &mut Validator, poll: &PollSettings, path: &str) {
    v.non_negative_secs(&format!("{path}.timeout_secs"), poll.timeout_secs);
    // A zero interval would busy-wait.
    v.positive_secs(&format!("{path}.interval_secs"), poll.interval_secs);
    if let Some(t) = poll.probe_timeout_secs {
        v.positive_secs(&format!("{path}.probe_timeout_secs"), t);
    }
}

pub(crate) fn validate_retry(v: &mut Validator, retry: &RetrySettings, path: &str) {
    if retry.max_attempts < 1 {
        v.push(format!("{path}.max_attempts"), "must be >= 1");
    }
    v.non_negative_secs(&format!("{path}.initial_delay_secs"), retry.initial_delay_secs);
    if !retry.backoff_multiplier.is_finite() || retry.backoff_multiplier < 1.0 {
        v.push(format!("{path}.backoff_multiplier"), "must be >= 1");
    }
    if let Some(max) = retry.max_delay_secs {
        v.non_negative_secs(&format!("{path}.max_delay_secs"), max);
    }
}

pub(crate) fn validate_policy(v: &mut Validator, policy: &RetryPolicy, path: &str) {
    if policy.max_attempts < 1 {
        v.push(format!("{path}.max_attempts"), "must be >= 1");
    }
    if !policy.backoff_multiplier.is_finite() || policy.backoff_multiplier < 1.0 {
        v.push(format!("{path}.backoff_multiplier"), "must be >= 1");
    }
}

pub(crate) fn validate_workers(v: &mut Validator, workers: &WorkerSettings, path: &str) {
    if workers.max == Some(0) {
        v.push(format!("{path}.max"), "must be >= 1");
    }
    if workers.unbounded && workers.max.is_some() {
        v.push(path, "set either `max` or `unbounded`, not both");
    }
}
