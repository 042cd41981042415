use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::remote::{ExecOutput, ExecutionError};

/// Spawn `command`, wait for it under `deadline` and capture its output.
///
/// The child is killed if the deadline passes or the future is dropped.
pub(crate) async fn run(
    node: &str,
    display: &str,
    mut command: Command,
    deadline: Option<Duration>,
) -> Result<ExecOutput, ExecutionError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let program = command.as_std().get_program().to_string_lossy().into_owned();
    let child = command.spawn().map_err(|e| ExecutionError::Spawn {
        node: node.to_string(),
        program,
        message: e.to_string(),
    })?;

    let command_line = display;
    debug!(node, command = %command_line, ?deadline, "running command");
    let wait = child.wait_with_output();
    let output = match deadline {
        Some(limit) => match tokio::time::timeout(limit, wait).await {
            Ok(result) => result,
            Err(_) => {
                return Err(ExecutionError::Timeout {
                    node: node.to_string(),
                    command: display.to_string(),
                    timeout: limit,
                })
            }
        },
        None => wait.await,
    }
    .map_err(|e| ExecutionError::Io {
        node: node.to_string(),
        message: e.to_string(),
    })?;

    Ok(ExecOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
    })
}

pub(crate) fn check_status(
    node: &str,
    display: &str,
    output: ExecOutput,
) -> Result<ExecOutput, ExecutionError> {
    if output.success() {
        return Ok(output);
    }
    Err(ExecutionError::NonZeroExit {
        node: node.to_string(),
        command: display.to_string(),
        exit_code: output.exit_code,
        stderr: output.stderr,
    })
}
