use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::types::{ResourceKind, ResourceState};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
#[error("run config failed validation ({violations_len} violations)")]
pub struct ValidationError {
    pub violations: Vec<Violation>,
    violations_len: usize,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        let violations_len = violations.len();
        Self {
            violations,
            violations_len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Failure reported by a poll condition.
///
/// `Transient` is the normal "not converged yet" signal and never ends a poll on its own.
/// `Unexpected` covers everything the probe did not anticipate; pollers swallow it unless
/// they were configured to fail fast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("{0}")]
    Transient(String),
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl ConditionError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transient(m) | Self::Unexpected(m) => m,
        }
    }
}

/// A readiness or absence wait that ran out of budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{resource} did not settle within {timeout:?} after {attempts} attempts (last observed: {})",
    .last_observed.as_deref().unwrap_or("condition not satisfied")
)]
pub struct TimeoutExpired {
    pub resource: String,
    pub timeout: Duration,
    pub attempts: u32,
    pub last_observed: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskErrorKind {
    /// The task ran and returned an error.
    Failed,
    /// The task panicked.
    Panicked,
    /// The task never ran because the batch was already failing.
    Skipped,
}

impl TaskErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::Panicked => "panicked",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TaskErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-target failure captured by the parallel runner. Never raised by itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{kind}: {message}")]
pub struct TaskExecutionError {
    pub kind: TaskErrorKind,
    pub message: String,
}

impl TaskExecutionError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            kind: TaskErrorKind::Failed,
            message: message.into(),
        }
    }

    pub fn panicked(message: impl Into<String>) -> Self {
        Self {
            kind: TaskErrorKind::Panicked,
            message: message.into(),
        }
    }

    pub fn skipped() -> Self {
        Self {
            kind: TaskErrorKind::Skipped,
            message: "not started after an earlier target failed".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} of {total} targets failed: {}", .failures.len(), render_failures(.failures))]
pub struct BatchFailed {
    pub total: usize,
    /// `(target, error)` pairs in submission order.
    pub failures: Vec<(String, TaskExecutionError)>,
}

fn render_failures(failures: &[(String, TaskExecutionError)]) -> String {
    failures
        .iter()
        .map(|(target, err)| format!("{target} ({err})"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} {name}: illegal transition {from} -> {to}")]
pub struct InvalidTransition {
    pub kind: ResourceKind,
    pub name: String,
    pub from: ResourceState,
    pub to: ResourceState,
}
