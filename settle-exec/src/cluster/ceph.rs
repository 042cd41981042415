use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use settle_core::{parse_service_list, CephSettings, Node, ServiceStatus};
use tracing::debug;

use crate::cluster::{ClusterControl, ClusterError, ExportSpec, NfsClusterSpec};
use crate::remote::{shell_quote, ExecOptions, RemoteExecutor};

/// [`ClusterControl`] over the `ceph` CLI, run with sudo on an admin node.
pub struct CephCli {
    executor: Arc<dyn RemoteExecutor>,
    admin: Node,
    settings: CephSettings,
}

impl CephCli {
    pub fn new(executor: Arc<dyn RemoteExecutor>, admin: Node, settings: CephSettings) -> Self {
        Self {
            executor,
            admin,
            settings,
        }
    }

    pub fn admin(&self) -> &Node {
        &self.admin
    }

    /// Full command line for `ceph <args>`, behind the configured shell prefix.
    pub fn command_line(&self, args: &str) -> String {
        match &self.settings.shell_prefix {
            Some(prefix) => format!("{} {} {}", prefix.trim(), self.settings.binary, args),
            None => format!("{} {}", self.settings.binary, args),
        }
    }

    async fn run(&self, args: &str) -> Result<String, ClusterError> {
        let line = self.command_line(args);
        debug!(node = %self.admin.name, command = %line, "cluster command");
        let output = self
            .executor
            .exec(&self.admin, &line, &ExecOptions::sudo())
            .await?;
        Ok(output.stdout)
    }
}

fn create_cluster_args(spec: &NfsClusterSpec) -> String {
    let mut args = format!("nfs cluster create {}", spec.name);
    if !spec.placement.is_empty() {
        args.push(' ');
        args.push_str(&shell_quote(&spec.placement.join(" ")));
    }
    if let Some(vip) = &spec.virtual_ip {
        args.push_str(&format!(" --ingress --virtual_ip {vip}"));
        if let Some(mode) = &spec.ingress_mode {
            args.push_str(&format!(" --ingress-mode {mode}"));
        }
    }
    if let Some(port) = spec.port {
        args.push_str(&format!(" --port {port}"));
    }
    args
}

fn create_export_args(spec: &ExportSpec) -> String {
    let mut args = format!(
        "nfs export create cephfs --cluster-id {} --pseudo-path {} --fsname {}",
        spec.cluster, spec.pseudo_path, spec.fs_name
    );
    if let Some(path) = &spec.path {
        args.push_str(&format!(" --path {path}"));
    }
    args
}

/// `nfs cluster ls` prints a JSON array on recent releases and one name per line before that.
fn parse_cluster_names(output: &str) -> Result<Vec<String>, ClusterError> {
    let trimmed = output.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| ClusterError::Decode {
            command: "nfs cluster ls".to_string(),
            message: e.to_string(),
        });
    }
    Ok(trimmed
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

#[derive(Deserialize)]
struct SubvolumeEntry {
    name: String,
}

fn parse_subvolume_names(command: &str, output: &str) -> Result<Vec<String>, ClusterError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<SubvolumeEntry> =
        serde_json::from_str(trimmed).map_err(|e| ClusterError::Decode {
            command: command.to_string(),
            message: e.to_string(),
        })?;
    Ok(entries.into_iter().map(|e| e.name).collect())
}

#[async_trait]
impl ClusterControl for CephCli {
    async fn enable_mgr_module(&self, module: &str) -> Result<(), ClusterError> {
        self.run(&format!("mgr module enable {module} --force"))
            .await
            .map(drop)
    }

    async fn nfs_cluster_create(&self, spec: &NfsClusterSpec) -> Result<(), ClusterError> {
        self.run(&create_cluster_args(spec)).await.map(drop)
    }

    async fn nfs_cluster_ls(&self) -> Result<Vec<String>, ClusterError> {
        let out = self.run("nfs cluster ls").await?;
        parse_cluster_names(&out)
    }

    async fn nfs_cluster_delete(&self, name: &str) -> Result<(), ClusterError> {
        self.run(&format!("nfs cluster rm {name}")).await.map(drop)
    }

    async fn nfs_export_create(&self, spec: &ExportSpec) -> Result<(), ClusterError> {
        self.run(&create_export_args(spec)).await.map(drop)
    }

    async fn nfs_export_delete(
        &self,
        cluster: &str,
        pseudo_path: &str,
    ) -> Result<(), ClusterError> {
        self.run(&format!("nfs export rm {cluster} {pseudo_path}"))
            .await
            .map(drop)
    }

    async fn orch_ls(&self, service_type: Option<&str>) -> Result<Vec<ServiceStatus>, ClusterError> {
        let args = match service_type {
            Some(ty) => format!("orch ls --service_type {ty} --format json"),
            None => "orch ls --format json".to_string(),
        };
        let out = self.run(&args).await?;
        parse_service_list(&out).map_err(|e| ClusterError::Decode {
            command: args,
            message: e.to_string(),
        })
    }

    async fn fs_subvolume_ls(
        &self,
        fs_name: &str,
        group: &str,
    ) -> Result<Vec<String>, ClusterError> {
        let args = format!("fs subvolume ls {fs_name} --group_name {group} --format json");
        let out = self.run(&args).await?;
        parse_subvolume_names(&args, &out)
    }

    async fn fs_subvolume_rm(
        &self,
        fs_name: &str,
        subvolume: &str,
        group: &str,
    ) -> Result<(), ClusterError> {
        self.run(&format!("fs subvolume rm {fs_name} {subvolume} --group_name {group}"))
            .await
            .map(drop)
    }

    async fn fs_subvolumegroup_rm(&self, fs_name: &str, group: &str) -> Result<(), ClusterError> {
        self.run(&format!("fs subvolumegroup rm {fs_name} {group} --force"))
            .await
            .map(drop)
    }
}
