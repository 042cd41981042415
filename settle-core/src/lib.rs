#![forbid(unsafe_code)]

//! Value types, error taxonomy and run configuration shared by the `settle` crates.
//!
//! Nothing in here performs I/O or sleeps; the runtime pieces live in `settle-exec`.

pub mod config;
pub mod error;
pub mod types;
pub mod validate;

pub use crate::config::{
    load_config, parse_config_str, CephSettings, ConfigFormat, ParsedConfig, PollSettings,
    RetrySettings, RunConfig, SshSettings, WorkerSettings, DEFAULT_MAX_WORKERS,
};
pub use crate::error::{
    BatchFailed, ConditionError, ConfigError, InvalidTransition, ParseError, TaskErrorKind,
    TaskExecutionError, TimeoutExpired, ValidationError, Violation,
};
pub use crate::types::{
    parse_service_list, BatchOutcome, Inventory, Jitter, Node, PollAttempt, PollOutcome,
    Resource, ResourceKind, ResourceState, RetryPolicy, ServiceCounts, ServiceStatus, Settled,
    TaskResult,
};
pub use crate::validate::{validate_config, Validate};
