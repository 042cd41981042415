//! Running shell commands on cluster nodes.

mod local;
mod process;
mod ssh;

use std::time::Duration;

use async_trait::async_trait;
use settle_core::Node;

pub use local::LocalExecutor;
pub use ssh::{shell_quote, SshExecutor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOptions {
    /// Run the command through `sudo`.
    pub sudo: bool,
    /// Per-call deadline. Falls back to the executor default when unset.
    pub timeout: Option<Duration>,
    /// Disable the executor's default deadline.
    pub long_running: bool,
    /// Turn a non-zero exit status into [`ExecutionError::NonZeroExit`].
    pub check_status: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            sudo: false,
            timeout: None,
            long_running: false,
            check_status: true,
        }
    }
}

impl ExecOptions {
    pub fn sudo() -> Self {
        Self {
            sudo: true,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn long_running(mut self) -> Self {
        self.long_running = true;
        self
    }

    pub fn unchecked(mut self) -> Self {
        self.check_status = false;
        self
    }

    /// Deadline to enforce given the executor's `default`.
    pub fn effective_timeout(&self, default: Option<Duration>) -> Option<Duration> {
        match self.timeout {
            Some(t) => Some(t),
            None if self.long_running => None,
            None => default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("{node}: `{command}` timed out after {timeout:?}")]
    Timeout {
        node: String,
        command: String,
        timeout: Duration,
    },
    #[error("{node}: failed to spawn `{program}`: {message}")]
    Spawn {
        node: String,
        program: String,
        message: String,
    },
    #[error("{node}: `{command}` exited with {}: {}", display_code(.exit_code), .stderr.trim())]
    NonZeroExit {
        node: String,
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("{node}: connection failed: {}", .stderr.trim())]
    Connection { node: String, stderr: String },
    #[error("{node}: i/o error: {message}")]
    Io { node: String, message: String },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}

impl ExecutionError {
    /// Failures worth retrying: deadlines and dropped connections.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connection { .. })
    }

    pub fn is_nonzero_exit(&self) -> bool {
        matches!(self, Self::NonZeroExit { .. })
    }
}

#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn exec(
        &self,
        node: &Node,
        command: &str,
        options: &ExecOptions,
    ) -> Result<ExecOutput, ExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_running_drops_default_timeout() {
        let default = Some(Duration::from_secs(600));
        assert_eq!(ExecOptions::default().effective_timeout(default), default);
        assert_eq!(ExecOptions::default().long_running().effective_timeout(default), None);
        assert_eq!(
            ExecOptions::default()
                .long_running()
                .with_timeout(Duration::from_secs(5))
                .effective_timeout(default),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn only_timeouts_and_connection_failures_are_transient() {
        let timeout = ExecutionError::Timeout {
            node: "n1".into(),
            command: "true".into(),
            timeout: Duration::from_secs(1),
        };
        let exit = ExecutionError::NonZeroExit {
            node: "n1".into(),
            command: "false".into(),
            exit_code: Some(1),
            stderr: String::new(),
        };
        assert!(timeout.is_transient());
        assert!(!exit.is_transient());
        assert!(exit.is_nonzero_exit());
        assert_eq!(exit.to_string(), "n1: `false` exited with status 1: ");
    }
}
