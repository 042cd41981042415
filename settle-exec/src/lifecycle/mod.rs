//! NFS gateway lifecycle procedures built from the poller, the retry decorator and the
//! parallel runner.

mod context;
mod coredump;
mod failover;
mod mounts;
mod nfs;
mod services;

use settle_core::{BatchFailed, InvalidTransition};

use crate::cluster::ClusterError;
use crate::poll::PollError;
use crate::remote::ExecutionError;
use crate::retry::RetryError;

pub use context::RunContext;
pub use coredump::{check_coredumps, enable_coredumps, NodeCoredumps, COREDUMP_DIR};
pub use failover::{parse_ipv4_addrs, strip_vip_prefix, validate_failover};
pub use mounts::{
    assign_versions, cleanup_assignments, cleanup_mounts, distribute_exports, mount_all,
    ClientAssignment, MountSpec, VersionShare,
};
pub use nfs::{
    create_exports, create_nfs_cluster, delete_exports, delete_nfs_clusters,
    remove_subvolume_group, teardown_nfs_cluster,
};
pub use services::{
    wait_for_named_services_absent, wait_for_named_services_ready, wait_for_services_absent,
    wait_for_services_ready,
};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    #[error(transparent)]
    Exec(#[from] ExecutionError),
    #[error(transparent)]
    Retry(#[from] RetryError<ExecutionError>),
    #[error(transparent)]
    Batch(#[from] BatchFailed),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("setup of {resource} failed: {source}")]
    Setup {
        resource: String,
        #[source]
        source: Box<LifecycleError>,
    },
    #[error("{resource} is {state}, expected active")]
    NotActive { resource: String, state: String },
    #[error("core dumps generated during the run: {}", render_dumps(.0))]
    Coredump(Vec<NodeCoredumps>),
    #[error("no node with role `{0}` in the inventory")]
    MissingRole(String),
    #[error("reboot of {node} did not complete: {message}")]
    Reboot { node: String, message: String },
}

fn render_dumps(dumps: &[NodeCoredumps]) -> String {
    dumps
        .iter()
        .map(|d| format!("{} ({} files)", d.node, d.files.len()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl LifecycleError {
    fn setup(resource: impl Into<String>, source: LifecycleError) -> Self {
        Self::Setup {
            resource: resource.into(),
            source: Box::new(source),
        }
    }
}
