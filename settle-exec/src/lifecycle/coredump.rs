use std::sync::Arc;

use serde::Serialize;
use settle_core::Node;
use tracing::warn;

use crate::lifecycle::{LifecycleError, RunContext};
use crate::remote::{ExecOptions, RemoteExecutor};

pub const COREDUMP_DIR: &str = "/var/lib/systemd/coredump";
const COREDUMP_CONF: &str = "/etc/systemd/coredump.conf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeCoredumps {
    pub node: String,
    pub files: Vec<String>,
}

/// Configure systemd-coredump to keep full dumps on every node.
pub async fn enable_coredumps(
    ctx: &RunContext,
    exec: Arc<dyn RemoteExecutor>,
    nodes: Vec<Node>,
) -> Result<(), LifecycleError> {
    let command = format!(
        "echo Storage=external >> {COREDUMP_CONF} && \
         echo DefaultLimitCORE=infinity >> {COREDUMP_CONF} && \
         systemctl daemon-reexec"
    );
    ctx.runner()
        .run_all(nodes, move |node: Node| {
            let exec = exec.clone();
            let command = command.clone();
            async move { exec.exec(&node, &command, &ExecOptions::sudo()).await }
        })
        .await
        .into_values()?;
    Ok(())
}

/// Fail if any node wrote a core dump since the run started.
pub async fn check_coredumps(
    ctx: &RunContext,
    exec: Arc<dyn RemoteExecutor>,
    nodes: Vec<Node>,
) -> Result<(), LifecycleError> {
    // A missing directory is not an error, so the exit status is ignored.
    let command = format!(
        "find {COREDUMP_DIR} -type f -newermt '@{}'",
        ctx.started_at.timestamp()
    );
    let found = ctx
        .runner()
        .run_all(nodes, move |node: Node| {
            let exec = exec.clone();
            let command = command.clone();
            async move {
                let out = exec
                    .exec(&node, &command, &ExecOptions::sudo().unchecked())
                    .await?;
                let files: Vec<String> = out
                    .stdout
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
                Ok::<_, LifecycleError>(NodeCoredumps {
                    node: node.name,
                    files,
                })
            }
        })
        .await
        .into_values()?;

    let dumps: Vec<NodeCoredumps> = found.into_iter().filter(|d| !d.files.is_empty()).collect();
    if dumps.is_empty() {
        return Ok(());
    }
    for d in &dumps {
        warn!(node = %d.node, files = ?d.files, "core dumps found");
    }
    Err(LifecycleError::Coredump(dumps))
}
