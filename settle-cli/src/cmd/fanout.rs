use serde::Serialize;
use settle_core::BatchOutcome;
use settle_exec::remote::{ExecOptions, ExecOutput, ExecutionError};
use settle_exec::{retrying, RetryError};

use super::setup::{self, Session};
use super::{finish, Failure};
use crate::exit_codes;
use crate::output::{print_result, OutputFormat};
use crate::{ConfigArgs, OutputArgs, RetryArgs, TargetArgs, WorkerArgs};

#[derive(Debug, Serialize)]
struct CommandOutput {
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
}

impl From<ExecOutput> for CommandOutput {
    fn from(out: ExecOutput) -> Self {
        Self {
            stdout: out.stdout.trim_end().to_string(),
            stderr: out.stderr.trim_end().to_string(),
            exit_code: out.exit_code,
        }
    }
}

pub async fn fanout_cmd(
    sudo: bool,
    config: ConfigArgs,
    target: TargetArgs,
    retry: RetryArgs,
    workers: WorkerArgs,
    output: OutputArgs,
    command: &[String],
) -> i32 {
    let result = run(sudo, &config, &target, &retry, &workers, &output, command).await;
    finish(&output, result)
}

async fn run(
    sudo: bool,
    config: &ConfigArgs,
    target: &TargetArgs,
    retry: &RetryArgs,
    workers: &WorkerArgs,
    output: &OutputArgs,
    command: &[String],
) -> Result<i32, Failure> {
    let mut config = setup::read_config(config)?;
    setup::apply_retry(&mut config, retry);
    setup::apply_workers(&mut config, workers);
    let session = Session::open(setup::validated(config)?, target.local);
    let nodes = session.nodes(target, None)?;

    let command = command.join(" ");
    let options = if sudo {
        ExecOptions::sudo()
    } else {
        ExecOptions::default()
    };
    let exec = session.exec.clone();
    let policy = session.ctx.retry.clone();
    let sink = session.ctx.sink();

    let outcome: BatchOutcome<String, CommandOutput> = session
        .ctx
        .runner()
        .with_fail_fast(workers.stop_on_failure)
        .run_all(nodes, move |node| {
            let exec = exec.clone();
            let policy = policy.clone();
            let sink = sink.clone();
            let command = command.clone();
            let options = options.clone();
            async move {
                let label = format!("`{command}` on {node}");
                // Only transport failures are retried; a non-zero exit is the command's answer.
                let out = retrying(policy, ExecutionError::is_transient, |_| {
                    let exec = exec.clone();
                    let node = node.clone();
                    let command = command.clone();
                    let options = options.clone();
                    async move { exec.exec(&node, &command, &options).await }
                })
                .with_label(label)
                .with_sink(sink)
                .run()
                .await?;
                Ok::<_, RetryError<ExecutionError>>(CommandOutput::from(out))
            }
        })
        .await
        .map_targets(|node| node.name);
    session.finish().await;

    if output.format == OutputFormat::Text && !output.quiet {
        for r in outcome.results() {
            match (r.value(), r.error()) {
                (Some(out), _) => println!("{}: {}", r.target, out.stdout),
                (None, Some(err)) => eprintln!("{}: {err}", r.target),
                (None, None) => {}
            }
        }
    } else {
        print_result(output.format, output.quiet, &outcome);
    }

    if outcome.all_succeeded() {
        Ok(exit_codes::SUCCESS)
    } else {
        Ok(exit_codes::RUN_FAILED)
    }
}
