use std::sync::LazyLock;

use regex::Regex;

use crate::config::RunConfig;
use crate::error::{ValidationError, Violation};

use super::rules;

pub(crate) static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid"));

pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.violations))
        }
    }

    pub fn validate_config(&mut self, config: &RunConfig) {
        rules::nodes::validate_nodes(self, &config.nodes, "nodes");
        rules::settings::validate_ssh(self, &config.ssh, "ssh");
        rules::settings::validate_poll(self, &config.poll, "poll");
        rules::settings::validate_retry(self, &config.retry, "retry");
        rules::settings::validate_workers(self, &config.workers, "workers");
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    pub(crate) fn non_negative_secs(&mut self, path: &str, value: f64) {
        if !value.is_finite() || value < 0.0 {
            self.push(path, "must be a finite number of seconds >= 0");
        }
    }

    pub(crate) fn positive_secs(&mut self, path: &str, value: f64) {
        if !value.is_finite() || value <= 0.0 {
            self.push(path, "must be a finite number of seconds > 0");
        }
    }
}
