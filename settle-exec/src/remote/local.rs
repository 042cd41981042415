use std::time::Duration;

use async_trait::async_trait;
use settle_core::Node;
use tokio::process::Command;

use crate::remote::{process, ExecOptions, ExecOutput, ExecutionError, RemoteExecutor};

/// Runs every command on this machine with `sh -c`, ignoring the node's address.
///
/// Useful for dry runs and tests; `sudo` is honored the same way as over ssh.
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor {
    default_timeout: Option<Duration>,
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl RemoteExecutor for LocalExecutor {
    async fn exec(
        &self,
        node: &Node,
        command: &str,
        options: &ExecOptions,
    ) -> Result<ExecOutput, ExecutionError> {
        let mut cmd = if options.sudo {
            let mut c = Command::new("sudo");
            c.args(["sh", "-c", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.env("SETTLE_NODE", &node.name);

        let deadline = options.effective_timeout(self.default_timeout);
        let output = process::run(&node.name, command, cmd, deadline).await?;
        if options.check_status {
            process::check_status(&node.name, command, output)
        } else {
            Ok(output)
        }
    }
}
