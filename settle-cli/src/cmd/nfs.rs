use chrono::DateTime;
use serde::Serialize;
use settle_core::{Resource, ServiceStatus};
use settle_exec::cluster::{ClusterControl, NfsClusterSpec};
use settle_exec::lifecycle::{
    assign_versions, check_coredumps, cleanup_assignments, cleanup_mounts, create_exports,
    create_nfs_cluster, delete_nfs_clusters, distribute_exports, enable_coredumps, mount_all,
    remove_subvolume_group, validate_failover, LifecycleError, MountSpec, NodeCoredumps,
};

use super::setup::{self, Session};
use super::{finish, Failure};
use crate::commands::NfsCommand;
use crate::exit_codes;
use crate::output::{print_result, OutputFormat};
use crate::OutputArgs;

const CLIENT_ROLE: &str = "client";

#[derive(Serialize)]
struct CreateResult {
    cluster: Resource,
    exports: Vec<Resource>,
}

#[derive(Serialize)]
struct DeleteResult {
    clusters: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    subvolumes: Vec<String>,
}

#[derive(Serialize)]
struct MountReport {
    client: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    exports: Vec<String>,
    mounted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct FailoverResult {
    vip: String,
    rebooted: String,
    holder: String,
}

#[derive(Serialize)]
struct CoredumpResult {
    clean: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dumps: Vec<NodeCoredumps>,
}

fn text(output: &OutputArgs) -> bool {
    output.format == OutputFormat::Text && !output.quiet
}

pub async fn nfs_cmd(command: NfsCommand) -> i32 {
    let output = match &command {
        NfsCommand::Create { output, .. }
        | NfsCommand::Delete { output, .. }
        | NfsCommand::Status { output, .. }
        | NfsCommand::Mount { output, .. }
        | NfsCommand::Cleanup { output, .. }
        | NfsCommand::Failover { output, .. }
        | NfsCommand::Coredumps { output, .. } => output.clone(),
    };
    let result = run(command).await;
    finish(&output, result)
}

async fn run(command: NfsCommand) -> Result<i32, Failure> {
    match command {
        NfsCommand::Create {
            name,
            placement,
            port,
            virtual_ip,
            ingress_mode,
            fs_name,
            exports,
            export_prefix,
            config,
            poll,
            output,
        } => {
            let mut config = setup::read_config(&config)?;
            setup::apply_poll(&mut config, &poll);
            let session = Session::open(setup::validated(config)?, false);
            let ceph = session.cluster()?;

            let mut spec = NfsClusterSpec::new(name).with_placement(placement);
            spec.port = port;
            spec.virtual_ip = virtual_ip;
            spec.ingress_mode = ingress_mode;
            let pseudo_paths: Vec<String> =
                (0..exports).map(|i| format!("{export_prefix}_{i}")).collect();

            let cluster = create_nfs_cluster(&session.ctx, ceph.as_ref(), &spec).await?;
            let exports =
                create_exports(&session.ctx, ceph.as_ref(), &cluster, &fs_name, &pseudo_paths)
                    .await?;
            session.finish().await;

            if text(&output) {
                println!("ok: {cluster} is active with {} exports", exports.len());
            } else {
                print_result(output.format, output.quiet, &CreateResult { cluster, exports });
            }
            Ok(exit_codes::SUCCESS)
        }
        NfsCommand::Delete {
            subvolume_group,
            fs_name,
            config,
            poll,
            workers,
            output,
        } => {
            let mut config = setup::read_config(&config)?;
            setup::apply_poll(&mut config, &poll);
            setup::apply_workers(&mut config, &workers);
            let session = Session::open(setup::validated(config)?, false);
            let ceph = session.cluster()?;

            let clusters = delete_nfs_clusters(&session.ctx, ceph.clone()).await?;
            let subvolumes = match &subvolume_group {
                Some(group) => remove_subvolume_group(ceph.as_ref(), &fs_name, group).await?,
                None => Vec::new(),
            };
            session.finish().await;

            if text(&output) {
                println!("ok: deleted {} nfs clusters", clusters.len());
                if let Some(group) = &subvolume_group {
                    println!("ok: removed {group} with {} subvolumes", subvolumes.len());
                }
            } else {
                let result = DeleteResult {
                    clusters,
                    subvolumes,
                };
                print_result(output.format, output.quiet, &result);
            }
            Ok(exit_codes::SUCCESS)
        }
        NfsCommand::Status {
            service_type,
            config,
            output,
        } => {
            let config = setup::validated(setup::read_config(&config)?)?;
            let session = Session::open(config, false);
            let ceph = session.cluster()?;

            let services: Vec<ServiceStatus> = ceph
                .orch_ls(Some(&service_type))
                .await
                .map_err(|e| Failure::run(e.to_string()))?;

            if text(&output) {
                for s in &services {
                    println!("{}", s.summary());
                }
            } else {
                print_result(output.format, output.quiet, &services);
            }
            Ok(exit_codes::SUCCESS)
        }
        NfsCommand::Mount {
            server,
            port,
            nfs_version,
            versions,
            exports,
            export_prefix,
            mount_prefix,
            config,
            target,
            retry,
            workers,
            output,
        } => {
            let mut config = setup::read_config(&config)?;
            setup::apply_retry(&mut config, &retry);
            setup::apply_workers(&mut config, &workers);
            let session = Session::open(setup::validated(config)?, target.local);
            let clients = session.nodes(&target, Some(CLIENT_ROLE))?;

            let mut assignments =
                distribute_exports(&clients, &export_prefix, &mount_prefix, exports);
            assign_versions(&mut assignments, &versions);
            let spec = MountSpec {
                server,
                port,
                version: nfs_version,
            };
            let outcome = mount_all(&session.ctx, session.exec.clone(), assignments, spec).await;
            session.finish().await;

            let reports: Vec<MountReport> = outcome
                .results()
                .iter()
                .map(|r| MountReport {
                    client: r.target.client.name.clone(),
                    version: r.target.version.clone(),
                    exports: r.target.exports.clone(),
                    mounted: r.value().copied().unwrap_or(0),
                    error: r.error().map(ToString::to_string),
                })
                .collect();
            if text(&output) {
                for r in &reports {
                    match &r.error {
                        None => println!("{}: mounted {}", r.client, r.mounted),
                        Some(e) => eprintln!("{}: {e}", r.client),
                    }
                }
            } else {
                print_result(output.format, output.quiet, &reports);
            }
            if outcome.all_succeeded() {
                Ok(exit_codes::SUCCESS)
            } else {
                Ok(exit_codes::RUN_FAILED)
            }
        }
        NfsCommand::Cleanup {
            exports,
            mount_prefix,
            config,
            target,
            poll,
            workers,
            output,
        } => {
            let mut config = setup::read_config(&config)?;
            setup::apply_poll(&mut config, &poll);
            setup::apply_workers(&mut config, &workers);
            let session = Session::open(setup::validated(config)?, target.local);
            let clients = session.nodes(&target, Some(CLIENT_ROLE))?;
            let count = clients.len();

            match exports {
                Some(n) => {
                    let assignments = distribute_exports(&clients, "/export", &mount_prefix, n);
                    cleanup_assignments(&session.ctx, session.exec.clone(), assignments).await?
                }
                None => {
                    cleanup_mounts(&session.ctx, session.exec.clone(), clients, &mount_prefix)
                        .await?
                }
            }
            session.finish().await;

            if text(&output) {
                println!("ok: cleaned mounts on {count} clients");
            } else {
                let result = serde_json::json!({ "clients": count });
                print_result(output.format, output.quiet, &result);
            }
            Ok(exit_codes::SUCCESS)
        }
        NfsCommand::Failover {
            vip,
            failed,
            gateway_role,
            config,
            poll,
            output,
        } => {
            let mut config = setup::read_config(&config)?;
            setup::apply_poll(&mut config, &poll);
            let session = Session::open(setup::validated(config)?, false);
            let gateways = session.ctx.nodes_with_role(&gateway_role)?;
            let failed = session.node(&failed)?;

            let holder =
                validate_failover(&session.ctx, session.exec.clone(), &gateways, &failed, &vip)
                    .await?;
            session.finish().await;

            if text(&output) {
                println!("ok: {vip} moved from {failed} to {holder}");
            } else {
                let result = FailoverResult {
                    vip,
                    rebooted: failed.name,
                    holder: holder.name,
                };
                print_result(output.format, output.quiet, &result);
            }
            Ok(exit_codes::SUCCESS)
        }
        NfsCommand::Coredumps {
            enable,
            since,
            config,
            target,
            workers,
            output,
        } => {
            let mut config = setup::read_config(&config)?;
            setup::apply_workers(&mut config, &workers);
            let mut session = Session::open(setup::validated(config)?, target.local);
            let nodes = session.nodes(&target, None)?;

            if enable {
                enable_coredumps(&session.ctx, session.exec.clone(), nodes).await?;
                session.finish().await;
                if text(&output) {
                    println!("ok: core dumps enabled");
                }
                return Ok(exit_codes::SUCCESS);
            }

            if let Some(secs) = since {
                session.ctx.started_at = DateTime::from_timestamp(secs, 0)
                    .ok_or_else(|| Failure::validation(format!("invalid timestamp {secs}")))?;
            }
            let checked = check_coredumps(&session.ctx, session.exec.clone(), nodes).await;
            session.finish().await;

            let (result, code) = match checked {
                Ok(()) => (
                    CoredumpResult {
                        clean: true,
                        dumps: Vec::new(),
                    },
                    exit_codes::SUCCESS,
                ),
                Err(LifecycleError::Coredump(dumps)) => (
                    CoredumpResult {
                        clean: false,
                        dumps,
                    },
                    exit_codes::RUN_FAILED,
                ),
                Err(e) => return Err(e.into()),
            };
            if text(&output) {
                if result.clean {
                    println!("ok: no core dumps");
                }
                for d in &result.dumps {
                    eprintln!("{}: {}", d.node, d.files.join(", "));
                }
            } else {
                print_result(output.format, output.quiet, &result);
            }
            Ok(code)
        }
    }
}
