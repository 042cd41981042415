//! Cluster control plane: the commands lifecycle procedures issue and probe.

mod ceph;

use async_trait::async_trait;
use serde::Serialize;
use settle_core::ServiceStatus;

use crate::remote::ExecutionError;

pub use ceph::CephCli;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClusterError {
    #[error(transparent)]
    Exec(#[from] ExecutionError),
    #[error("could not decode output of `{command}`: {message}")]
    Decode { command: String, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NfsClusterSpec {
    pub name: String,
    /// Hosts the gateway daemons are placed on.
    pub placement: Vec<String>,
    pub port: Option<u16>,
    /// Enables an ingress service in front of the gateways, e.g. `10.8.128.100/21`.
    pub virtual_ip: Option<String>,
    /// Ingress mode such as `keepalive-only`; only meaningful with `virtual_ip`.
    pub ingress_mode: Option<String>,
}

impl NfsClusterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_placement(mut self, hosts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.placement = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_virtual_ip(mut self, vip: impl Into<String>) -> Self {
        self.virtual_ip = Some(vip.into());
        self
    }

    /// Orchestrator services this cluster deploys.
    pub fn service_names(&self) -> Vec<String> {
        nfs_service_names(&self.name, self.virtual_ip.is_some())
    }
}

/// `nfs.<cluster>`, plus `ingress.nfs.<cluster>` when the cluster sits behind a virtual IP.
pub fn nfs_service_names(cluster: &str, ingress: bool) -> Vec<String> {
    let mut names = vec![format!("nfs.{cluster}")];
    if ingress {
        names.push(format!("ingress.nfs.{cluster}"));
    }
    names
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSpec {
    pub cluster: String,
    pub pseudo_path: String,
    pub fs_name: String,
    /// Path inside the filesystem; the filesystem root when unset.
    pub path: Option<String>,
}

#[async_trait]
pub trait ClusterControl: Send + Sync {
    async fn enable_mgr_module(&self, module: &str) -> Result<(), ClusterError>;
    async fn nfs_cluster_create(&self, spec: &NfsClusterSpec) -> Result<(), ClusterError>;
    async fn nfs_cluster_ls(&self) -> Result<Vec<String>, ClusterError>;
    async fn nfs_cluster_delete(&self, name: &str) -> Result<(), ClusterError>;
    async fn nfs_export_create(&self, spec: &ExportSpec) -> Result<(), ClusterError>;
    async fn nfs_export_delete(&self, cluster: &str, pseudo_path: &str)
        -> Result<(), ClusterError>;
    /// Services known to the orchestrator, optionally filtered by type.
    async fn orch_ls(&self, service_type: Option<&str>) -> Result<Vec<ServiceStatus>, ClusterError>;
    async fn fs_subvolume_ls(&self, fs_name: &str, group: &str)
        -> Result<Vec<String>, ClusterError>;
    async fn fs_subvolume_rm(
        &self,
        fs_name: &str,
        subvolume: &str,
        group: &str,
    ) -> Result<(), ClusterError>;
    /// Removes the group even if it still holds subvolumes.
    async fn fs_subvolumegroup_rm(&self, fs_name: &str, group: &str) -> Result<(), ClusterError>;
}
