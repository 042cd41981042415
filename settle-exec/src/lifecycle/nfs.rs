use std::sync::Arc;

use settle_core::{Resource, ResourceKind, ResourceState};
use tracing::info;

use crate::cluster::{nfs_service_names, ClusterControl, ExportSpec, NfsClusterSpec};
use crate::lifecycle::{
    wait_for_named_services_absent, wait_for_named_services_ready, wait_for_services_absent,
    LifecycleError, RunContext,
};

const NFS_SERVICE_TYPE: &str = "nfs";

/// Bring up an NFS cluster and wait for its daemons.
///
/// Only this cluster's services gate readiness: `nfs.<name>`, and `ingress.nfs.<name>` when a
/// virtual IP is set. The returned resource is `active`. On any failure it is rolled back to
/// `absent` and the error names the cluster.
pub async fn create_nfs_cluster(
    ctx: &RunContext,
    ctl: &dyn ClusterControl,
    spec: &NfsClusterSpec,
) -> Result<Resource, LifecycleError> {
    let mut cluster = Resource::new(ResourceKind::Cluster, &spec.name);
    ctx.transition(&mut cluster, ResourceState::Creating).await?;

    let services = spec.service_names();
    let label = cluster.to_string();
    let setup = async {
        ctl.enable_mgr_module(NFS_SERVICE_TYPE).await?;
        ctl.nfs_cluster_create(spec).await?;
        wait_for_named_services_ready(ctx, ctl, label, &services).await
    };
    match setup.await {
        Ok(settled) => {
            info!(cluster = %spec.name, attempts = settled.attempt, elapsed = ?settled.elapsed, "nfs cluster ready");
            ctx.transition(&mut cluster, ResourceState::Active).await?;
            Ok(cluster)
        }
        Err(err) => {
            ctx.transition(&mut cluster, ResourceState::Absent).await?;
            Err(LifecycleError::setup(cluster.to_string(), err))
        }
    }
}

fn ensure_active(resource: &Resource) -> Result<(), LifecycleError> {
    match resource.state() {
        ResourceState::Active => Ok(()),
        state => Err(LifecycleError::NotActive {
            resource: resource.to_string(),
            state: state.to_string(),
        }),
    }
}

/// Create one cephfs export per pseudo path on an active cluster.
pub async fn create_exports(
    ctx: &RunContext,
    ctl: &dyn ClusterControl,
    cluster: &Resource,
    fs_name: &str,
    pseudo_paths: &[String],
) -> Result<Vec<Resource>, LifecycleError> {
    ensure_active(cluster)?;
    let mut exports = Vec::with_capacity(pseudo_paths.len());
    for pseudo_path in pseudo_paths {
        let mut export = Resource::new(ResourceKind::Export, pseudo_path);
        ctx.transition(&mut export, ResourceState::Creating).await?;
        let spec = ExportSpec {
            cluster: cluster.name.clone(),
            pseudo_path: pseudo_path.clone(),
            fs_name: fs_name.to_string(),
            path: None,
        };
        if let Err(err) = ctl.nfs_export_create(&spec).await {
            ctx.transition(&mut export, ResourceState::Absent).await?;
            return Err(LifecycleError::setup(export.to_string(), err.into()));
        }
        ctx.transition(&mut export, ResourceState::Active).await?;
        exports.push(export);
    }
    Ok(exports)
}

pub async fn delete_exports(
    ctx: &RunContext,
    ctl: &dyn ClusterControl,
    cluster: &Resource,
    exports: &mut [Resource],
) -> Result<(), LifecycleError> {
    for export in exports.iter_mut() {
        ctx.transition(export, ResourceState::Deleting).await?;
        ctl.nfs_export_delete(&cluster.name, &export.name).await?;
        ctx.transition(export, ResourceState::Absent).await?;
    }
    Ok(())
}

/// Delete one cluster created by [`create_nfs_cluster`] and wait until its daemons are gone.
///
/// Services of other clusters may keep running.
pub async fn teardown_nfs_cluster(
    ctx: &RunContext,
    ctl: &dyn ClusterControl,
    cluster: &mut Resource,
) -> Result<(), LifecycleError> {
    ctx.transition(cluster, ResourceState::Deleting).await?;
    ctl.nfs_cluster_delete(&cluster.name).await?;
    let services = nfs_service_names(&cluster.name, true);
    wait_for_named_services_absent(ctx, ctl, cluster.to_string(), &services).await?;
    ctx.transition(cluster, ResourceState::Absent).await
}

/// Delete every NFS cluster in parallel, then wait for all NFS daemons to stop.
///
/// Returns the names of the deleted clusters.
pub async fn delete_nfs_clusters(
    ctx: &RunContext,
    ctl: Arc<dyn ClusterControl>,
) -> Result<Vec<String>, LifecycleError> {
    let names = ctl.nfs_cluster_ls().await?;
    info!(clusters = names.len(), "deleting nfs clusters");

    let deleter = ctl.clone();
    ctx.runner()
        .run_all(names.clone(), move |name: String| {
            let ctl = deleter.clone();
            async move { ctl.nfs_cluster_delete(&name).await }
        })
        .await
        .into_values()?;

    wait_for_services_absent(ctx, ctl.as_ref(), NFS_SERVICE_TYPE).await?;
    Ok(names)
}

/// Remove every subvolume in `group` of `fs_name`, then the group itself.
///
/// Returns the removed subvolumes.
pub async fn remove_subvolume_group(
    ctl: &dyn ClusterControl,
    fs_name: &str,
    group: &str,
) -> Result<Vec<String>, LifecycleError> {
    let subvolumes = ctl.fs_subvolume_ls(fs_name, group).await?;
    for subvolume in &subvolumes {
        ctl.fs_subvolume_rm(fs_name, subvolume, group).await?;
    }
    ctl.fs_subvolumegroup_rm(fs_name, group).await?;
    info!(fs = fs_name, group, subvolumes = subvolumes.len(), "subvolume group removed");
    Ok(subvolumes)
}
