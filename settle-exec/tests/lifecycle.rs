use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use settle_core::{
    CephSettings, Inventory, Node, Resource, ResourceKind, ResourceState, RetryPolicy,
    ServiceCounts, ServiceStatus,
};
use settle_exec::cluster::{CephCli, ClusterControl, ClusterError, ExportSpec, NfsClusterSpec};
use settle_exec::lifecycle::{
    assign_versions, check_coredumps, cleanup_mounts, create_exports, create_nfs_cluster,
    delete_nfs_clusters, distribute_exports, mount_all, remove_subvolume_group,
    teardown_nfs_cluster, validate_failover, wait_for_services_absent, wait_for_services_ready,
    LifecycleError, MountSpec, RunContext, VersionShare,
};
use settle_exec::remote::{ExecOptions, ExecOutput, ExecutionError, RemoteExecutor};
use settle_exec::{Event, EventSink, PollConfig, PollError};

fn service(name: &str, running: u32, size: u32) -> ServiceStatus {
    ServiceStatus {
        service_name: name.to_string(),
        service_type: Some("nfs".to_string()),
        status: ServiceCounts { running, size },
    }
}

/// Replays scripted `orch ls` snapshots; the last one repeats forever.
#[derive(Default)]
struct FakeCluster {
    calls: Mutex<Vec<String>>,
    snapshots: Mutex<VecDeque<Vec<ServiceStatus>>>,
    clusters: Vec<String>,
    subvolumes: Vec<String>,
    fail_exports: bool,
}

impl FakeCluster {
    fn with_snapshots(snapshots: Vec<Vec<ServiceStatus>>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into()),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ClusterControl for FakeCluster {
    async fn enable_mgr_module(&self, module: &str) -> Result<(), ClusterError> {
        self.record(format!("enable {module}"));
        Ok(())
    }

    async fn nfs_cluster_create(&self, spec: &NfsClusterSpec) -> Result<(), ClusterError> {
        self.record(format!("create {}", spec.name));
        Ok(())
    }

    async fn nfs_cluster_ls(&self) -> Result<Vec<String>, ClusterError> {
        Ok(self.clusters.clone())
    }

    async fn nfs_cluster_delete(&self, name: &str) -> Result<(), ClusterError> {
        self.record(format!("delete {name}"));
        Ok(())
    }

    async fn nfs_export_create(&self, spec: &ExportSpec) -> Result<(), ClusterError> {
        self.record(format!("export {} {}", spec.cluster, spec.pseudo_path));
        if self.fail_exports {
            return Err(ClusterError::Decode {
                command: "nfs export create".to_string(),
                message: "rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn nfs_export_delete(&self, cluster: &str, pseudo_path: &str) -> Result<(), ClusterError> {
        self.record(format!("unexport {cluster} {pseudo_path}"));
        Ok(())
    }

    async fn orch_ls(&self, _service_type: Option<&str>) -> Result<Vec<ServiceStatus>, ClusterError> {
        let mut snapshots = self.snapshots.lock().unwrap();
        let current = if snapshots.len() > 1 {
            snapshots.pop_front().unwrap_or_default()
        } else {
            snapshots.front().cloned().unwrap_or_default()
        };
        Ok(current)
    }

    async fn fs_subvolume_ls(
        &self,
        fs_name: &str,
        group: &str,
    ) -> Result<Vec<String>, ClusterError> {
        self.record(format!("subvolume ls {fs_name} {group}"));
        Ok(self.subvolumes.clone())
    }

    async fn fs_subvolume_rm(
        &self,
        _fs_name: &str,
        subvolume: &str,
        _group: &str,
    ) -> Result<(), ClusterError> {
        self.record(format!("subvolume rm {subvolume}"));
        Ok(())
    }

    async fn fs_subvolumegroup_rm(&self, _fs_name: &str, group: &str) -> Result<(), ClusterError> {
        self.record(format!("subvolumegroup rm {group}"));
        Ok(())
    }
}

type Handler = dyn Fn(&Node, &str, u32) -> Result<ExecOutput, ExecutionError> + Send + Sync;

/// Answers commands through `handler`, which also sees how often the same command already
/// ran on that node (1-based).
struct ScriptedExecutor {
    seen: Mutex<HashMap<(String, String), u32>>,
    log: Mutex<Vec<(String, String)>>,
    handler: Box<Handler>,
}

impl ScriptedExecutor {
    fn new(
        handler: impl Fn(&Node, &str, u32) -> Result<ExecOutput, ExecutionError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::default(),
            log: Mutex::default(),
            handler: Box::new(handler),
        })
    }

    fn commands_on(&self, node: &str) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == node)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

#[async_trait]
impl RemoteExecutor for ScriptedExecutor {
    async fn exec(
        &self,
        node: &Node,
        command: &str,
        _options: &ExecOptions,
    ) -> Result<ExecOutput, ExecutionError> {
        let count = {
            let mut seen = self.seen.lock().unwrap();
            let n = seen
                .entry((node.name.clone(), command.to_string()))
                .or_default();
            *n += 1;
            *n
        };
        self.log
            .lock()
            .unwrap()
            .push((node.name.clone(), command.to_string()));
        (self.handler)(node, command, count)
    }
}

fn ok(stdout: &str) -> Result<ExecOutput, ExecutionError> {
    Ok(ExecOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
    })
}

fn exit_1(node: &Node, command: &str) -> Result<ExecOutput, ExecutionError> {
    Err(ExecutionError::NonZeroExit {
        node: node.name.clone(),
        command: command.to_string(),
        exit_code: Some(1),
        stderr: "busy".to_string(),
    })
}

#[derive(Default)]
struct Transitions(Mutex<Vec<(String, ResourceState, ResourceState)>>);

#[async_trait]
impl EventSink for Transitions {
    async fn emit(&self, event: Event) {
        if let Event::ResourceTransition { name, from, to, .. } = event {
            self.0.lock().unwrap().push((name, from, to));
        }
    }
}

fn nodes(prefix: &str, n: usize) -> Vec<Node> {
    (1..=n)
        .map(|i| Node::new(format!("{prefix}{i}"), format!("10.0.0.{i}")))
        .collect()
}

const BOOT_ID: &str = "cat /proc/sys/kernel/random/boot_id";

const NO_VIP: &str = "2: eth0    inet 10.0.0.9/24 scope global eth0\n";
const WITH_VIP: &str = "2: eth0    inet 10.0.0.2/24 scope global eth0\n\
                        2: eth0    inet 10.8.128.100/21 scope global secondary eth0\n";

fn context() -> RunContext {
    RunContext::new(Inventory::new(nodes("client", 3)))
        .with_poll(PollConfig::new(Duration::from_secs(60), Duration::from_secs(5)))
        .with_retry(RetryPolicy::new(4, Duration::from_secs(1), 2.0))
}

#[tokio::test(start_paused = true)]
async fn ready_waits_for_every_service_to_converge() {
    let ctl = FakeCluster::with_snapshots(vec![
        vec![],
        vec![service("nfs.a", 1, 2), service("nfs.b", 2, 2)],
        vec![service("nfs.a", 2, 2), service("nfs.b", 2, 2)],
    ]);
    let settled = wait_for_services_ready(&context(), &ctl, "nfs").await.unwrap();
    assert_eq!(settled.attempt, 3);
    assert_eq!(settled.elapsed, Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn ready_expiry_reports_last_observed_state() {
    let ctl = FakeCluster::with_snapshots(vec![vec![service("nfs.a", 1, 3)]]);
    let err = wait_for_services_ready(&context(), &ctl, "nfs")
        .await
        .unwrap_err();
    match err {
        LifecycleError::Poll(PollError::Expired(expired)) => {
            assert_eq!(expired.resource, "nfs services ready");
            assert_eq!(expired.last_observed.as_deref(), Some("nfs.a running 1/3"));
        }
        other => panic!("expected expiry, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn absent_accepts_empty_or_stopped_services() {
    let ctl = FakeCluster::with_snapshots(vec![
        vec![service("nfs.a", 1, 1)],
        vec![service("nfs.a", 0, 1)],
    ]);
    let settled = wait_for_services_absent(&context(), &ctl, "nfs").await.unwrap();
    assert_eq!(settled.attempt, 2);

    let empty = FakeCluster::default();
    let settled = wait_for_services_absent(&context(), &empty, "nfs").await.unwrap();
    assert_eq!(settled.attempt, 1);
}

#[tokio::test(start_paused = true)]
async fn create_cluster_walks_to_active() {
    let transitions = Arc::new(Transitions::default());
    let ctx = context().with_sink(transitions.clone());
    let ctl = FakeCluster::with_snapshots(vec![
        vec![service("nfs.cephfs-nfs", 0, 1)],
        vec![service("nfs.cephfs-nfs", 1, 1)],
    ]);

    let cluster = create_nfs_cluster(&ctx, &ctl, &NfsClusterSpec::new("cephfs-nfs"))
        .await
        .unwrap();

    assert_eq!(cluster.state(), ResourceState::Active);
    assert_eq!(ctl.calls(), vec!["enable nfs", "create cephfs-nfs"]);
    assert_eq!(
        *transitions.0.lock().unwrap(),
        vec![
            ("cephfs-nfs".to_string(), ResourceState::Absent, ResourceState::Creating),
            ("cephfs-nfs".to_string(), ResourceState::Creating, ResourceState::Active),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn create_cluster_rolls_back_when_never_ready() {
    let transitions = Arc::new(Transitions::default());
    let ctx = context().with_sink(transitions.clone());
    let ctl = FakeCluster::with_snapshots(vec![vec![service("nfs.cephfs-nfs", 0, 2)]]);

    let err = create_nfs_cluster(&ctx, &ctl, &NfsClusterSpec::new("cephfs-nfs"))
        .await
        .unwrap_err();

    match &err {
        LifecycleError::Setup { resource, source } => {
            assert_eq!(resource, "cluster cephfs-nfs");
            assert!(matches!(**source, LifecycleError::Poll(PollError::Expired(_))));
        }
        other => panic!("expected setup failure, got {other:?}"),
    }
    let last = transitions.0.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last.2, ResourceState::Absent);
}

#[tokio::test]
async fn exports_require_an_active_cluster() {
    let ctl = FakeCluster::default();
    let cluster = Resource::new(ResourceKind::Cluster, "cephfs-nfs");
    let err = create_exports(&context(), &ctl, &cluster, "cephfs", &["/export_0".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotActive { .. }));
    assert!(ctl.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn export_failure_is_a_setup_error() {
    let ctx = context();
    let ctl = FakeCluster {
        fail_exports: true,
        ..FakeCluster::with_snapshots(vec![vec![service("nfs.c", 1, 1)]])
    };
    let cluster = create_nfs_cluster(&ctx, &ctl, &NfsClusterSpec::new("c"))
        .await
        .unwrap();

    let err = create_exports(&ctx, &ctl, &cluster, "cephfs", &["/export_0".to_string()])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("export /export_0"));
}

#[tokio::test(start_paused = true)]
async fn teardown_returns_cluster_to_absent() {
    let ctx = context();
    let ctl = FakeCluster::with_snapshots(vec![
        vec![service("nfs.c", 1, 1)],
        vec![service("nfs.c", 1, 1)],
        vec![],
    ]);
    let mut cluster = create_nfs_cluster(&ctx, &ctl, &NfsClusterSpec::new("c"))
        .await
        .unwrap();
    teardown_nfs_cluster(&ctx, &ctl, &mut cluster).await.unwrap();
    assert_eq!(cluster.state(), ResourceState::Absent);
    assert!(ctl.calls().contains(&"delete c".to_string()));
}

#[tokio::test(start_paused = true)]
async fn delete_clusters_removes_every_cluster() {
    let ctl = Arc::new(FakeCluster {
        clusters: vec!["a".to_string(), "b".to_string()],
        ..Default::default()
    });
    let deleted = delete_nfs_clusters(&context(), ctl.clone()).await.unwrap();
    assert_eq!(deleted, vec!["a", "b"]);
    let mut calls = ctl.calls();
    calls.sort();
    assert_eq!(calls, vec!["delete a", "delete b"]);
}

#[tokio::test(start_paused = true)]
async fn mounts_are_retried_per_client() {
    let exec = ScriptedExecutor::new(|node, command, count| {
        if command.starts_with("mount") && node.name == "client2" && count == 1 {
            exit_1(node, command)
        } else {
            ok("")
        }
    });
    let clients = nodes("client", 2);
    let assignments = distribute_exports(&clients, "/export", "/mnt/nfs", 3);
    let spec = MountSpec {
        server: "10.0.0.100".to_string(),
        port: 2049,
        version: "4.1".to_string(),
    };

    let outcome = mount_all(&context(), exec.clone(), assignments, spec).await;

    assert!(outcome.all_succeeded());
    assert_eq!(outcome.into_values().unwrap(), vec![2, 1]);
    let mounts: Vec<String> = exec
        .commands_on("client2")
        .into_iter()
        .filter(|c| c.starts_with("mount"))
        .collect();
    assert_eq!(
        mounts,
        vec![
            "mount -t nfs -o vers=4.1,port=2049 10.0.0.100:/export_2 /mnt/nfs_2",
            "mount -t nfs -o vers=4.1,port=2049 10.0.0.100:/export_2 /mnt/nfs_2",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cleanup_repeats_rm_until_it_succeeds() {
    let exec = ScriptedExecutor::new(|node, command, count| {
        if command == "rm -rf /mnt/nfs/*" && count < 3 {
            exit_1(node, command)
        } else {
            ok("")
        }
    });
    cleanup_mounts(&context(), exec.clone(), nodes("client", 1), "/mnt/nfs")
        .await
        .unwrap();
    assert_eq!(
        exec.commands_on("client1"),
        vec![
            "rm -rf /mnt/nfs/*",
            "rm -rf /mnt/nfs/*",
            "rm -rf /mnt/nfs/*",
            "umount /mnt/nfs",
            "rm -rf /mnt/nfs",
        ]
    );
}

#[tokio::test]
async fn core_dumps_fail_the_run() {
    let exec = ScriptedExecutor::new(|node, _command, _count| {
        if node.name == "nfs2" {
            ok("/var/lib/systemd/coredump/core.ganesha.nfsd.0.zst\n")
        } else {
            ok("")
        }
    });
    let err = check_coredumps(&context(), exec, nodes("nfs", 3))
        .await
        .unwrap_err();
    match err {
        LifecycleError::Coredump(dumps) => {
            assert_eq!(dumps.len(), 1);
            assert_eq!(dumps[0].node, "nfs2");
        }
        other => panic!("expected core dumps, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn failover_finds_the_new_vip_holder() {
    let exec = ScriptedExecutor::new(|node, command, count| match command {
        "systemctl reboot" => Err(ExecutionError::Connection {
            node: node.name.clone(),
            stderr: "closed by remote host".to_string(),
        }),
        BOOT_ID => match count {
            1 => ok("boot-1\n"),
            2 => Err(ExecutionError::Connection {
                node: node.name.clone(),
                stderr: "no route to host".to_string(),
            }),
            _ => ok("boot-2\n"),
        },
        "ip -o addr show" if node.name == "nfs3" && count >= 2 => {
            ok("2: eth0    inet 10.0.0.3/24 scope global eth0\n2: eth0    inet 10.8.128.100/21 scope global secondary eth0\n")
        }
        "ip -o addr show" => ok("2: eth0    inet 10.0.0.9/24 scope global eth0\n"),
        _ => ok(""),
    });
    let all = nodes("nfs", 3);

    let holder = validate_failover(&context(), exec.clone(), &all, &all[0], "10.8.128.100/21")
        .await
        .unwrap();

    assert_eq!(holder.name, "nfs3");
    let boot_reads = exec.commands_on("nfs1").iter().filter(|c| *c == BOOT_ID).count();
    assert_eq!(boot_reads, 3);
    assert!(!exec.commands_on("nfs1").contains(&"ip -o addr show".to_string()));
}

#[tokio::test(start_paused = true)]
async fn cluster_readiness_ignores_other_clusters() {
    let ctx = context();
    let ctl = FakeCluster::with_snapshots(vec![
        vec![service("nfs.a", 1, 1), service("nfs.b", 0, 2)],
        vec![service("nfs.b", 2, 2)],
    ]);
    let started = tokio::time::Instant::now();

    let mut cluster = create_nfs_cluster(&ctx, &ctl, &NfsClusterSpec::new("a"))
        .await
        .unwrap();
    teardown_nfs_cluster(&ctx, &ctl, &mut cluster).await.unwrap();

    assert_eq!(cluster.state(), ResourceState::Absent);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn teardown_expiry_names_the_cluster() {
    let ctx = context();
    let ctl = FakeCluster::with_snapshots(vec![vec![
        service("nfs.a", 1, 1),
        service("nfs.b", 1, 1),
    ]]);
    let mut cluster = create_nfs_cluster(&ctx, &ctl, &NfsClusterSpec::new("a"))
        .await
        .unwrap();

    let err = teardown_nfs_cluster(&ctx, &ctl, &mut cluster).await.unwrap_err();
    match err {
        LifecycleError::Poll(PollError::Expired(expired)) => {
            assert_eq!(expired.resource, "cluster a");
            assert_eq!(expired.last_observed.as_deref(), Some("nfs.a running 1/1"));
        }
        other => panic!("expected expiry, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn ha_cluster_waits_for_its_ingress_service() {
    let ctl = FakeCluster::with_snapshots(vec![
        vec![service("nfs.h", 2, 2)],
        vec![service("nfs.h", 2, 2), service("ingress.nfs.h", 0, 2)],
        vec![service("nfs.h", 2, 2), service("ingress.nfs.h", 2, 2)],
    ]);
    let spec = NfsClusterSpec::new("h").with_virtual_ip("10.8.128.100/21");
    let started = tokio::time::Instant::now();

    let cluster = create_nfs_cluster(&context(), &ctl, &spec).await.unwrap();

    assert_eq!(cluster.state(), ResourceState::Active);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn unrecognized_orch_output_never_counts_as_absent() {
    let exec = ScriptedExecutor::new(|_node, _command, _count| {
        ok("Error: orchestrator backend unavailable\n")
    });
    let ceph = CephCli::new(
        exec,
        Node::new("installer", "10.0.0.10"),
        CephSettings::default(),
    );

    let err = wait_for_services_absent(&context(), &ceph, "nfs")
        .await
        .unwrap_err();
    match err {
        LifecycleError::Poll(PollError::Expired(expired)) => {
            let observed = expired.last_observed.unwrap_or_default();
            assert!(observed.contains("could not decode"), "{observed}");
        }
        other => panic!("expected expiry, got {other:?}"),
    }
}

#[tokio::test]
async fn subvolume_group_is_emptied_then_removed() {
    let ctl = FakeCluster {
        subvolumes: vec!["sv0".to_string(), "sv1".to_string()],
        ..Default::default()
    };
    let removed = remove_subvolume_group(&ctl, "cephfs", "ganeshagroup")
        .await
        .unwrap();
    assert_eq!(removed, vec!["sv0", "sv1"]);
    assert_eq!(
        ctl.calls(),
        vec![
            "subvolume ls cephfs ganeshagroup",
            "subvolume rm sv0",
            "subvolume rm sv1",
            "subvolumegroup rm ganeshagroup",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn mounts_use_each_clients_version() {
    let exec = ScriptedExecutor::new(|_node, _command, _count| ok(""));
    let mut assignments = distribute_exports(&nodes("client", 3), "/export", "/mnt/nfs", 3);
    let shares: Vec<VersionShare> =
        ["4.1:2", "3:1"].iter().map(|s| s.parse().unwrap()).collect();
    assign_versions(&mut assignments, &shares);
    let spec = MountSpec {
        server: "10.0.0.100".to_string(),
        port: 2049,
        version: "4.2".to_string(),
    };

    let outcome = mount_all(&context(), exec.clone(), assignments, spec).await;

    assert!(outcome.all_succeeded());
    let mount_on = |client: &str| -> Vec<String> {
        exec.commands_on(client)
            .into_iter()
            .filter(|c| c.starts_with("mount"))
            .collect()
    };
    assert_eq!(
        mount_on("client1"),
        vec!["mount -t nfs -o vers=4.1,port=2049 10.0.0.100:/export_0 /mnt/nfs_0"]
    );
    assert_eq!(
        mount_on("client3"),
        vec!["mount -t nfs -o vers=3,port=2049 10.0.0.100:/export_2 /mnt/nfs_2"]
    );
}

#[tokio::test(start_paused = true)]
async fn failover_waits_for_a_new_boot_id() {
    let exec = ScriptedExecutor::new(|node, command, count| match command {
        BOOT_ID if count <= 3 => ok("boot-1\n"),
        BOOT_ID => ok("boot-2\n"),
        "ip -o addr show" if node.name == "nfs2" => ok(WITH_VIP),
        "ip -o addr show" => ok(NO_VIP),
        _ => ok(""),
    });
    let all = nodes("nfs", 3);
    let started = tokio::time::Instant::now();

    let holder = validate_failover(&context(), exec.clone(), &all, &all[0], "10.8.128.100/21")
        .await
        .unwrap();

    assert_eq!(holder.name, "nfs2");
    // One read before the reboot, then polls at 0s, 5s and 10s.
    let boot_reads = exec.commands_on("nfs1").iter().filter(|c| *c == BOOT_ID).count();
    assert_eq!(boot_reads, 4);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn failover_fails_when_the_node_never_goes_down() {
    let exec = ScriptedExecutor::new(|node, command, _count| match command {
        BOOT_ID => ok("boot-1\n"),
        "ip -o addr show" if node.name == "nfs2" => ok(WITH_VIP),
        "ip -o addr show" => ok(NO_VIP),
        _ => ok(""),
    });
    let all = nodes("nfs", 3);

    let err = validate_failover(&context(), exec, &all, &all[0], "10.8.128.100/21")
        .await
        .unwrap_err();
    match err {
        LifecycleError::Poll(PollError::Expired(expired)) => {
            assert_eq!(expired.resource, "nfs1 back after reboot");
            assert_eq!(expired.last_observed.as_deref(), Some("nfs1 has not gone down yet"));
        }
        other => panic!("expected expiry, got {other:?}"),
    }
}

/// `systemctl reboot` hangs for ten minutes; the VIP never moves.
struct HangingReboot;

#[async_trait]
impl RemoteExecutor for HangingReboot {
    async fn exec(
        &self,
        _node: &Node,
        command: &str,
        _options: &ExecOptions,
    ) -> Result<ExecOutput, ExecutionError> {
        match command {
            "systemctl reboot" => {
                tokio::time::sleep(Duration::from_secs(600)).await;
                ok("")
            }
            "ip -o addr show" => ok(NO_VIP),
            _ => ok("boot-1\n"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn failed_takeover_returns_without_waiting_for_the_reboot() {
    let all = nodes("nfs", 3);
    let started = tokio::time::Instant::now();

    let err = validate_failover(
        &context(),
        Arc::new(HangingReboot),
        &all,
        &all[0],
        "10.8.128.100/21",
    )
    .await
    .unwrap_err();

    match err {
        LifecycleError::Poll(PollError::Expired(expired)) => {
            assert_eq!(expired.resource, "failover of 10.8.128.100");
        }
        other => panic!("expected expiry, got {other:?}"),
    }
    assert_eq!(started.elapsed(), Duration::from_secs(60));
}
