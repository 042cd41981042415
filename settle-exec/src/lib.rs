#![forbid(unsafe_code)]

//! Runtime engine for `settle`: bounded polling, retry with backoff and parallel fan-out,
//! plus the remote executors and NFS lifecycle procedures built on top of them.

pub mod cluster;
pub mod events;
pub mod lifecycle;
pub mod metrics;
pub mod poll;
pub mod remote;
pub mod retry;
pub mod runner;

pub use crate::events::{
    CompositeEventSink, Event, EventSink, NoOpEventSink, StdoutEventSink, TracingEventSink,
};
pub use crate::metrics::{MetricsCollector, MetricsEventSink, RunMetrics};
pub use crate::poll::{BoundedPoller, PollConfig, PollError};
pub use crate::retry::{retrying, RetryError, Retrying};
pub use crate::runner::{ParallelTaskRunner, WorkerLimit};
