use serde::Serialize;
use settle_core::{ConditionError, Node, PollOutcome};
use settle_exec::remote::{ExecOptions, ExecutionError, RemoteExecutor};

use super::setup::{self, Session};
use super::{finish, Failure};
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{ConfigArgs, OutputArgs, PollArgs, TargetArgs};

#[derive(Serialize)]
struct WaitResult {
    label: String,
    settled: bool,
    attempts: u32,
    elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_observed: Option<String>,
}

/// Succeeds once `command` exits 0 on every node in the same round.
async fn command_succeeds(
    exec: &dyn RemoteExecutor,
    nodes: &[Node],
    command: &str,
    options: &ExecOptions,
) -> Result<bool, ConditionError> {
    for node in nodes {
        match exec.exec(node, command, options).await {
            Ok(_) => {}
            // Nothing to wait for if the command cannot even be started.
            Err(e @ ExecutionError::Spawn { .. }) => {
                return Err(ConditionError::unexpected(e.to_string()))
            }
            Err(e) => return Err(ConditionError::transient(e.to_string())),
        }
    }
    Ok(true)
}

pub async fn wait_cmd(
    label: &str,
    sudo: bool,
    config: ConfigArgs,
    target: TargetArgs,
    poll: PollArgs,
    output: OutputArgs,
    command: &[String],
) -> i32 {
    let result = run(label, sudo, &config, &target, &poll, &output, command).await;
    finish(&output, result)
}

async fn run(
    label: &str,
    sudo: bool,
    config: &ConfigArgs,
    target: &TargetArgs,
    poll: &PollArgs,
    output: &OutputArgs,
    command: &[String],
) -> Result<i32, Failure> {
    let mut config = setup::read_config(config)?;
    setup::apply_poll(&mut config, poll);
    let session = Session::open(setup::validated(config)?, target.local);
    let nodes = session.nodes(target, None)?;

    let command = command.join(" ");
    let options = if sudo {
        ExecOptions::sudo()
    } else {
        ExecOptions::default()
    };
    let poller = session
        .ctx
        .poller(label)
        .map_err(|e| Failure::validation(e.to_string()))?;
    let timeout = poller.config().timeout;

    let outcome = poller
        .poll(|_| command_succeeds(session.exec.as_ref(), &nodes, &command, &options))
        .await;
    session.finish().await;
    let outcome = outcome.map_err(|e| Failure::run(e.to_string()))?;

    let result = WaitResult {
        label: label.to_string(),
        settled: outcome.is_succeeded(),
        attempts: outcome.attempts(),
        elapsed_secs: outcome.elapsed().as_secs_f64(),
        last_observed: match &outcome {
            PollOutcome::Expired { last_error, .. } => last_error.clone(),
            PollOutcome::Succeeded { .. } => None,
        },
    };
    let text = output.format == OutputFormat::Text;

    match outcome.into_result(label, timeout) {
        Ok(settled) => {
            if text && !output.quiet {
                println!(
                    "ok: {label} settled after {} attempts ({:?})",
                    settled.attempt, settled.elapsed
                );
            } else {
                print_result(output.format, output.quiet, &result);
            }
            Ok(exit_codes::SUCCESS)
        }
        Err(expired) => {
            if text {
                print_error(output.format, output.quiet, &expired.to_string());
            } else {
                print_result(output.format, output.quiet, &result);
            }
            Ok(exit_codes::RUN_FAILED)
        }
    }
}
