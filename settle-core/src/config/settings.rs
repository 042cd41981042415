use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{Inventory, Jitter, Node, RetryPolicy};

/// Worker bound used when a config names neither `max` nor `unbounded`.
pub const DEFAULT_MAX_WORKERS: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub ssh: SshSettings,
    #[serde(default)]
    pub poll: PollSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub workers: WorkerSettings,
    #[serde(default)]
    pub ceph: CephSettings,
}

impl RunConfig {
    pub fn inventory(&self) -> Inventory {
        Inventory::new(self.nodes.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshSettings {
    #[serde(default = "default_ssh_binary")]
    pub binary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Applied to every command that is not marked long-running.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    /// Extra arguments passed verbatim before the destination.
    #[serde(default)]
    pub options: Vec<String>,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            binary: default_ssh_binary(),
            identity_file: None,
            connect_timeout_secs: default_connect_timeout(),
            command_timeout_secs: default_command_timeout(),
            options: Vec::new(),
        }
    }
}

fn default_ssh_binary() -> String {
    "ssh".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_command_timeout() -> u64 {
    600
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollSettings {
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: f64,
    #[serde(default = "default_poll_interval")]
    pub interval_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_timeout_secs: Option<f64>,
    #[serde(default)]
    pub fail_fast: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_poll_timeout(),
            interval_secs: default_poll_interval(),
            probe_timeout_secs: None,
            fail_fast: false,
        }
    }
}

impl PollSettings {
    pub fn timeout(&self) -> Duration {
        secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        secs(self.interval_secs)
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_secs.map(secs)
    }
}

fn default_poll_timeout() -> f64 {
    600.0
}

fn default_poll_interval() -> f64 {
    10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: f64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_secs: Option<f64>,
    #[serde(default)]
    pub jitter: Jitter,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_secs: default_initial_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_secs: None,
            jitter: Jitter::None,
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: secs(self.initial_delay_secs),
            backoff_multiplier: self.backoff_multiplier,
            max_delay: self.max_delay_secs.map(secs),
            jitter: self.jitter,
        }
    }
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_delay() -> f64 {
    5.0
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// `max` bounds the pool; `unbounded: true` runs one worker per target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    #[serde(default)]
    pub unbounded: bool,
}

impl WorkerSettings {
    /// `None` means unbounded.
    pub fn limit(&self) -> Option<usize> {
        if self.unbounded {
            None
        } else {
            Some(self.max.unwrap_or(DEFAULT_MAX_WORKERS))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CephSettings {
    #[serde(default = "default_ceph_binary")]
    pub binary: String,
    /// e.g. `cephadm shell --`, prepended to every cluster command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_prefix: Option<String>,
    /// Role of the node cluster commands run on.
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
}

impl Default for CephSettings {
    fn default() -> Self {
        Self {
            binary: default_ceph_binary(),
            shell_prefix: None,
            admin_role: default_admin_role(),
        }
    }
}

fn default_ceph_binary() -> String {
    "ceph".to_string()
}

fn default_admin_role() -> String {
    "installer".to_string()
}

// Negative and non-finite values fail validation and map to zero here.
fn secs(v: f64) -> Duration {
    Duration::try_from_secs_f64(v).unwrap_or(Duration::ZERO)
}
