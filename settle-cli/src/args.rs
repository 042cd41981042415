use std::path::PathBuf;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    /// Run config (JSON or YAML). Built-in defaults and no nodes when omitted.
    #[arg(long, short = 'c', env = "SETTLE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TargetArgs {
    /// Run commands on this machine instead of over ssh.
    #[arg(long)]
    pub local: bool,
    /// Only nodes carrying this role.
    #[arg(long)]
    pub role: Option<String>,
    /// Only these nodes, by name.
    #[arg(long = "node", value_name = "NAME")]
    pub nodes: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct PollArgs {
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,
    #[arg(long, value_name = "SECS")]
    pub interval: Option<f64>,
    /// Give up on a single probe after this long and count it as not ready.
    #[arg(long, value_name = "SECS")]
    pub probe_timeout: Option<f64>,
    /// Abort on the first unexpected probe error instead of polling on.
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RetryArgs {
    #[arg(long)]
    pub retry_max_attempts: Option<u32>,
    #[arg(long, value_name = "SECS")]
    pub retry_initial_delay: Option<f64>,
    #[arg(long)]
    pub retry_multiplier: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct WorkerArgs {
    #[arg(long, conflicts_with = "unbounded")]
    pub max_workers: Option<usize>,
    /// One worker per target.
    #[arg(long)]
    pub unbounded: bool,
    /// Skip targets that have not started once one has failed.
    #[arg(long)]
    pub stop_on_failure: bool,
}
