use std::path::PathBuf;

use clap::Subcommand;
use settle_exec::lifecycle::VersionShare;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse and validate a run config.
    Check {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Repeat a command until it exits 0 on every selected node, or the timeout expires.
    Wait {
        /// Name used in logs and in the expiry message.
        #[arg(long, default_value = "command")]
        label: String,
        #[arg(long)]
        sudo: bool,
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        poll: PollArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[arg(last = true, required = true, value_name = "COMMAND")]
        command: Vec<String>,
    },
    /// Run a command on every selected node in parallel, retrying transport failures.
    Fanout {
        #[arg(long)]
        sudo: bool,
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        retry: RetryArgs,
        #[command(flatten)]
        workers: WorkerArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[arg(last = true, required = true, value_name = "COMMAND")]
        command: Vec<String>,
    },
    /// NFS gateway lifecycle against a ceph cluster.
    Nfs {
        #[command(subcommand)]
        command: NfsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum NfsCommand {
    /// Create a cluster, wait for its daemons and create exports on it.
    Create {
        name: String,
        /// Hosts for the gateway daemons.
        #[arg(long = "placement", value_name = "HOST")]
        placement: Vec<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        virtual_ip: Option<String>,
        #[arg(long, requires = "virtual_ip")]
        ingress_mode: Option<String>,
        #[arg(long, default_value = "cephfs")]
        fs_name: String,
        /// Number of exports, named `{export_prefix}_{i}`.
        #[arg(long, default_value_t = 0)]
        exports: usize,
        #[arg(long, default_value = "/export")]
        export_prefix: String,
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        poll: PollArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Delete every NFS cluster and wait until no gateway daemon runs.
    Delete {
        /// Also remove this cephfs subvolume group and every subvolume in it.
        #[arg(long)]
        subvolume_group: Option<String>,
        #[arg(long, default_value = "cephfs")]
        fs_name: String,
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        poll: PollArgs,
        #[command(flatten)]
        workers: WorkerArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show orchestrator services.
    Status {
        #[arg(long, default_value = "nfs")]
        service_type: String,
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Spread exports over client nodes and mount them.
    Mount {
        /// Address clients mount from, usually the virtual IP.
        #[arg(long)]
        server: String,
        #[arg(long, default_value_t = 2049)]
        port: u16,
        #[arg(long = "nfs-version", default_value = "4.1")]
        nfs_version: String,
        /// Per-client versions in client order, e.g. `4.1:2,3:1`; remaining clients use
        /// `--nfs-version`.
        #[arg(long, value_delimiter = ',')]
        versions: Vec<VersionShare>,
        #[arg(long)]
        exports: usize,
        #[arg(long, default_value = "/export")]
        export_prefix: String,
        #[arg(long, default_value = "/mnt/nfs")]
        mount_prefix: String,
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        retry: RetryArgs,
        #[command(flatten)]
        workers: WorkerArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Empty, unmount and remove client mount points.
    Cleanup {
        /// Clean `{mount_prefix}_{i}` as laid out by `mount --exports N`; otherwise clean
        /// `mount_prefix` itself.
        #[arg(long)]
        exports: Option<usize>,
        #[arg(long, default_value = "/mnt/nfs")]
        mount_prefix: String,
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        poll: PollArgs,
        #[command(flatten)]
        workers: WorkerArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Reboot a gateway and check that another one takes over the virtual IP.
    Failover {
        #[arg(long)]
        vip: String,
        /// Node to reboot.
        #[arg(long)]
        failed: String,
        /// Role of the gateway nodes.
        #[arg(long = "gateway-role", default_value = "nfs")]
        gateway_role: String,
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        poll: PollArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Enable core dump collection, or fail if any node wrote one.
    Coredumps {
        #[arg(long)]
        enable: bool,
        /// Only count dumps newer than this Unix timestamp. Defaults to now.
        #[arg(long, value_name = "EPOCH_SECS")]
        since: Option<i64>,
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        workers: WorkerArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}
