use std::time::Duration;

use async_trait::async_trait;
use settle_core::{Node, SshSettings};
use tokio::process::Command;

use crate::remote::{process, ExecOptions, ExecOutput, ExecutionError, RemoteExecutor};

/// `ssh` reserves this status for its own failures.
const SSH_CONNECTION_FAILURE: i32 = 255;

/// Runs commands on nodes through the system `ssh` client in batch mode.
#[derive(Debug, Clone, Default)]
pub struct SshExecutor {
    settings: SshSettings,
}

impl SshExecutor {
    pub fn new(settings: SshSettings) -> Self {
        Self { settings }
    }

    fn default_timeout(&self) -> Option<Duration> {
        match self.settings.command_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Argument vector passed to the ssh binary, destination and remote command last.
    pub fn ssh_args(&self, node: &Node, command: &str, sudo: bool) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.settings.connect_timeout_secs),
        ];
        if let Some(identity) = &self.settings.identity_file {
            args.push("-i".to_string());
            args.push(identity.clone());
        }
        if let Some(port) = node.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        for option in &self.settings.options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        args.push(node.destination());
        args.push(remote_command(command, sudo));
        args
    }
}

fn remote_command(command: &str, sudo: bool) -> String {
    if sudo {
        format!("sudo sh -c {}", shell_quote(command))
    } else {
        command.to_string()
    }
}

/// Single-quote `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn exec(
        &self,
        node: &Node,
        command: &str,
        options: &ExecOptions,
    ) -> Result<ExecOutput, ExecutionError> {
        let mut cmd = Command::new(&self.settings.binary);
        cmd.args(self.ssh_args(node, command, options.sudo));

        let deadline = options.effective_timeout(self.default_timeout());
        let output = process::run(&node.name, command, cmd, deadline).await?;
        if output.exit_code == Some(SSH_CONNECTION_FAILURE) {
            return Err(ExecutionError::Connection {
                node: node.name.clone(),
                stderr: output.stderr,
            });
        }
        if options.check_status {
            process::check_status(&node.name, command, output)
        } else {
            Ok(output)
        }
    }
}
