//! Turns CLI arguments into a validated [`RunConfig`] and the runtime pieces built from it.

use std::sync::Arc;
use std::time::Duration;

use settle_core::{parse_config_str, validate_config, ConfigFormat, Node, ParseError, RunConfig};
use settle_exec::cluster::CephCli;
use settle_exec::lifecycle::{LifecycleError, RunContext};
use settle_exec::remote::{LocalExecutor, RemoteExecutor, SshExecutor};
use settle_exec::{MetricsCollector, MetricsEventSink, TracingEventSink};
use tracing::info;

use super::Failure;
use crate::{ConfigArgs, PollArgs, RetryArgs, TargetArgs, WorkerArgs};

/// Name of the implicit node used by `--local` when the config has none.
pub const LOCAL_NODE: &str = "localhost";

/// Read `--config` without validating it, so CLI overrides can be applied first.
pub fn read_config(args: &ConfigArgs) -> Result<RunConfig, Failure> {
    let Some(path) = &args.config else {
        return Ok(RunConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| Failure::runtime(format!("failed to read {}: {e}", path.display())))?;
    parse_config_str(&content, ConfigFormat::Auto)
        .map(|parsed| parsed.config)
        .map_err(|e| match e {
            ParseError::Json(e) => Failure::validation(format!("JSON parse failed: {e}")),
            ParseError::Yaml(e) => Failure::validation(format!("YAML parse failed: {e}")),
        })
}

pub fn apply_poll(config: &mut RunConfig, args: &PollArgs) {
    if let Some(t) = args.timeout {
        config.poll.timeout_secs = t;
    }
    if let Some(i) = args.interval {
        config.poll.interval_secs = i;
    }
    if args.probe_timeout.is_some() {
        config.poll.probe_timeout_secs = args.probe_timeout;
    }
    config.poll.fail_fast |= args.fail_fast;
}

pub fn apply_retry(config: &mut RunConfig, args: &RetryArgs) {
    if let Some(n) = args.retry_max_attempts {
        config.retry.max_attempts = n;
    }
    if let Some(d) = args.retry_initial_delay {
        config.retry.initial_delay_secs = d;
    }
    if let Some(m) = args.retry_multiplier {
        config.retry.backoff_multiplier = m;
    }
}

pub fn apply_workers(config: &mut RunConfig, args: &WorkerArgs) {
    if args.unbounded {
        config.workers.unbounded = true;
        config.workers.max = None;
    } else if let Some(max) = args.max_workers {
        config.workers.unbounded = false;
        config.workers.max = Some(max);
    }
}

pub fn validated(config: RunConfig) -> Result<RunConfig, Failure> {
    validate_config(&config).map_err(|err| {
        let details: Vec<String> = err.violations.iter().map(ToString::to_string).collect();
        Failure::validation(format!("{err}: {}", details.join("; ")))
    })?;
    Ok(config)
}

/// Everything a command needs after its config is settled.
pub struct Session {
    pub config: RunConfig,
    pub ctx: RunContext,
    pub exec: Arc<dyn RemoteExecutor>,
    metrics: MetricsCollector,
}

impl Session {
    pub fn open(config: RunConfig, local: bool) -> Self {
        let exec: Arc<dyn RemoteExecutor> = if local {
            Arc::new(LocalExecutor::new().with_default_timeout(Duration::from_secs(
                config.ssh.command_timeout_secs,
            )))
        } else {
            Arc::new(SshExecutor::new(config.ssh.clone()))
        };
        let metrics = MetricsCollector::new();
        let sink = Arc::new(MetricsEventSink::new(metrics.clone(), Arc::new(TracingEventSink)));
        let ctx = RunContext::from_config(&config).with_sink(sink);
        info!(run_id = %ctx.run_id, local, nodes = config.nodes.len(), "session opened");
        Self {
            config,
            ctx,
            exec,
            metrics,
        }
    }

    /// Nodes picked by `--node`/`--role`, falling back to `default_role` and then to every node.
    ///
    /// With `--local` and an empty inventory this is a single [`LOCAL_NODE`].
    pub fn nodes(
        &self,
        target: &TargetArgs,
        default_role: Option<&str>,
    ) -> Result<Vec<Node>, Failure> {
        if self.config.nodes.is_empty() && target.local {
            return Ok(vec![Node::new(LOCAL_NODE, "127.0.0.1")]);
        }
        let inventory = &self.ctx.inventory;
        let selected: Vec<Node> = if !target.nodes.is_empty() {
            let mut picked = Vec::with_capacity(target.nodes.len());
            for name in &target.nodes {
                let node = inventory
                    .get(name)
                    .ok_or_else(|| Failure::validation(format!("unknown node `{name}`")))?;
                picked.push(node.clone());
            }
            picked
        } else if let Some(role) = target.role.as_deref().or(default_role) {
            inventory.with_role(role)
        } else {
            self.config.nodes.clone()
        };
        if selected.is_empty() {
            return Err(Failure::validation("no nodes selected"));
        }
        Ok(selected)
    }

    pub fn node(&self, name: &str) -> Result<Node, Failure> {
        self.ctx
            .inventory
            .get(name)
            .cloned()
            .ok_or_else(|| Failure::validation(format!("unknown node `{name}`")))
    }

    /// Cluster commands go through the first node with the configured admin role.
    pub fn cluster(&self) -> Result<Arc<CephCli>, Failure> {
        let role = &self.config.ceph.admin_role;
        let admin = self
            .ctx
            .inventory
            .first_with_role(role)
            .cloned()
            .ok_or_else(|| Failure::from(LifecycleError::MissingRole(role.clone())))?;
        Ok(Arc::new(CephCli::new(
            self.exec.clone(),
            admin,
            self.config.ceph.clone(),
        )))
    }

    pub async fn finish(&self) {
        self.metrics.finish().await;
        let m = self.metrics.get_metrics().await;
        info!(
            run_id = %self.ctx.run_id,
            poll_attempts = m.poll_attempts,
            retries = m.retries_scheduled,
            tasks_failed = m.tasks_failed,
            transitions = m.transitions,
            duration = ?m.total_duration,
            "session finished"
        );
    }
}
