use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use settle_core::{BatchOutcome, ConditionError, Node};
use tracing::info;

use crate::lifecycle::{LifecycleError, RunContext};
use crate::poll::BoundedPoller;
use crate::remote::{ExecOptions, ExecutionError, RemoteExecutor};
use crate::retry::retrying;

/// Exports a client mounts, paired index by index with their mount points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAssignment {
    pub client: Node,
    pub exports: Vec<String>,
    pub mounts: Vec<String>,
    /// Overrides [`MountSpec::version`] for this client.
    pub version: Option<String>,
}

impl ClientAssignment {
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.exports
            .iter()
            .zip(&self.mounts)
            .map(|(e, m)| (e.as_str(), m.as_str()))
    }
}

impl fmt::Display for ClientAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.client.fmt(f)
    }
}

/// Split `count` exports named `{export_prefix}_{i}` (mounted at `{mount_prefix}_{i}`) across
/// `clients` in contiguous runs. The first `count % clients.len()` clients get one extra.
pub fn distribute_exports(
    clients: &[Node],
    export_prefix: &str,
    mount_prefix: &str,
    count: usize,
) -> Vec<ClientAssignment> {
    if clients.is_empty() {
        return Vec::new();
    }
    let per_client = count / clients.len();
    let remainder = count % clients.len();

    let mut start = 0;
    clients
        .iter()
        .enumerate()
        .map(|(i, client)| {
            let end = start + per_client + usize::from(i < remainder);
            let assignment = ClientAssignment {
                client: client.clone(),
                exports: (start..end).map(|n| format!("{export_prefix}_{n}")).collect(),
                mounts: (start..end).map(|n| format!("{mount_prefix}_{n}")).collect(),
                version: None,
            };
            start = end;
            assignment
        })
        .collect()
}

/// `clients` consecutive clients mount with NFS `version`. Parses from `4.1:2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionShare {
    pub version: String,
    pub clients: usize,
}

impl FromStr for VersionShare {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (version, clients) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <version>:<clients>, got `{s}`"))?;
        let version = version.trim();
        if version.is_empty() {
            return Err(format!("missing nfs version in `{s}`"));
        }
        let clients = clients
            .trim()
            .parse()
            .map_err(|e| format!("invalid client count in `{s}`: {e}"))?;
        Ok(Self {
            version: version.to_string(),
            clients,
        })
    }
}

/// Hand out NFS versions to assignments in order, e.g. `[4.1:2, 3:1]` gives the first two
/// clients 4.1 and the third 3. Clients past the listed counts keep the mount default.
pub fn assign_versions(assignments: &mut [ClientAssignment], shares: &[VersionShare]) {
    let versions = shares
        .iter()
        .flat_map(|share| std::iter::repeat(&share.version).take(share.clients));
    for (assignment, version) in assignments.iter_mut().zip(versions) {
        assignment.version = Some(version.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    pub server: String,
    pub port: u16,
    /// NFS protocol version passed as `vers=`.
    pub version: String,
}

impl MountSpec {
    pub fn command(&self, export: &str, mount: &str) -> String {
        format!(
            "mount -t nfs -o vers={},port={} {}:{} {}",
            self.version, self.port, self.server, export, mount
        )
    }
}

fn mount_is_retryable(err: &ExecutionError) -> bool {
    err.is_transient() || err.is_nonzero_exit()
}

/// Mount every assigned export on every client, clients in parallel.
///
/// Clients mount with their assignment's version when one is set. Each mount is retried
/// under the context's retry policy. The outcome reports the number of mounts per client.
pub async fn mount_all(
    ctx: &RunContext,
    exec: Arc<dyn RemoteExecutor>,
    assignments: Vec<ClientAssignment>,
    spec: MountSpec,
) -> BatchOutcome<ClientAssignment, usize> {
    let policy = ctx.retry.clone();
    let sink = ctx.sink();
    ctx.runner()
        .run_all(assignments, move |assignment: ClientAssignment| {
            let exec = exec.clone();
            let policy = policy.clone();
            let sink = sink.clone();
            let spec = match &assignment.version {
                Some(version) => MountSpec {
                    version: version.clone(),
                    ..spec.clone()
                },
                None => spec.clone(),
            };
            async move {
                let node = &assignment.client;
                for (export, mount) in assignment.pairs() {
                    exec.exec(node, &format!("mkdir -p {mount}"), &ExecOptions::sudo())
                        .await?;
                    let command = spec.command(export, mount);
                    let exec = exec.clone();
                    let target = node.clone();
                    retrying(policy.clone(), mount_is_retryable, move |_| {
                        let exec = exec.clone();
                        let target = target.clone();
                        let command = command.clone();
                        async move { exec.exec(&target, &command, &ExecOptions::sudo()).await }
                    })
                    .with_label(format!("mount {export} on {node}"))
                    .with_sink(sink.clone())
                    .run()
                    .await?;
                    info!(client = %node, export, mount, "mounted");
                }
                Ok::<_, LifecycleError>(assignment.exports.len())
            }
        })
        .await
}

async fn clean_mount(
    poller: &BoundedPoller,
    exec: &Arc<dyn RemoteExecutor>,
    node: &Node,
    mount: &str,
) -> Result<(), LifecycleError> {
    let wipe = format!("rm -rf {mount}/*");
    // rm can fail while the export still reports entries; repeat until it succeeds.
    poller
        .poll_until(|_| {
            let exec = exec.clone();
            let wipe = wipe.clone();
            async move {
                exec.exec(node, &wipe, &ExecOptions::sudo().long_running())
                    .await
                    .map(|_| true)
                    .map_err(|e| ConditionError::transient(e.to_string()))
            }
        })
        .await?;
    exec.exec(node, &format!("umount {mount}"), &ExecOptions::sudo())
        .await?;
    exec.exec(node, &format!("rm -rf {mount}"), &ExecOptions::sudo())
        .await?;
    info!(client = %node, mount, "mount cleaned up");
    Ok(())
}

/// Empty, unmount and remove `mount` on every client, clients in parallel.
pub async fn cleanup_mounts(
    ctx: &RunContext,
    exec: Arc<dyn RemoteExecutor>,
    clients: Vec<Node>,
    mount: &str,
) -> Result<(), LifecycleError> {
    let assignments = clients
        .into_iter()
        .map(|client| ClientAssignment {
            client,
            exports: Vec::new(),
            mounts: vec![mount.to_string()],
            version: None,
        })
        .collect();
    cleanup_assignments(ctx, exec, assignments).await
}

/// [`cleanup_mounts`] for every mount point of every assignment.
pub async fn cleanup_assignments(
    ctx: &RunContext,
    exec: Arc<dyn RemoteExecutor>,
    assignments: Vec<ClientAssignment>,
) -> Result<(), LifecycleError> {
    let poller = ctx.poller("mount cleanup")?;
    ctx.runner()
        .run_all(assignments, move |assignment: ClientAssignment| {
            let exec = exec.clone();
            let poller = poller.clone();
            async move {
                for mount in &assignment.mounts {
                    let poller = poller
                        .clone()
                        .with_label(format!("cleanup {mount} on {}", assignment.client));
                    clean_mount(&poller, &exec, &assignment.client, mount).await?;
                }
                Ok::<_, LifecycleError>(())
            }
        })
        .await
        .into_values()?;
    Ok(())
}
