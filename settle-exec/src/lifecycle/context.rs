use std::sync::Arc;

use chrono::{DateTime, Utc};
use settle_core::{Inventory, Node, Resource, ResourceState, RetryPolicy, RunConfig};
use tracing::info;
use uuid::Uuid;

use crate::events::{Event, EventSink, TracingEventSink};
use crate::lifecycle::LifecycleError;
use crate::poll::{BoundedPoller, PollConfig, PollError};
use crate::runner::{ParallelTaskRunner, WorkerLimit};

/// Everything a lifecycle procedure needs to know about the current run.
///
/// Created once per run and passed by reference into every procedure.
#[derive(Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    /// Lower bound for artifacts (such as core dumps) attributed to this run.
    pub started_at: DateTime<Utc>,
    pub inventory: Inventory,
    pub poll: PollConfig,
    pub retry: RetryPolicy,
    pub workers: WorkerLimit,
    sink: Arc<dyn EventSink>,
}

impl RunContext {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            inventory,
            poll: PollConfig::default(),
            retry: RetryPolicy::default(),
            workers: WorkerLimit::default(),
            sink: Arc::new(TracingEventSink),
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            poll: PollConfig::from_settings(&config.poll),
            retry: config.retry.to_policy(),
            workers: WorkerLimit::from_settings(config.workers.limit()),
            ..Self::new(config.inventory())
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_workers(mut self, workers: WorkerLimit) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn sink(&self) -> Arc<dyn EventSink> {
        self.sink.clone()
    }

    pub fn poller(&self, label: impl Into<String>) -> Result<BoundedPoller, PollError> {
        Ok(BoundedPoller::new(self.poll.clone())?
            .with_label(label)
            .with_sink(self.sink.clone()))
    }

    pub fn runner(&self) -> ParallelTaskRunner {
        ParallelTaskRunner::new(self.workers).with_sink(self.sink.clone())
    }

    pub fn nodes_with_role(&self, role: &str) -> Result<Vec<Node>, LifecycleError> {
        let nodes = self.inventory.with_role(role);
        if nodes.is_empty() {
            return Err(LifecycleError::MissingRole(role.to_string()));
        }
        Ok(nodes)
    }

    /// Move `resource` to `to`, recording the edge.
    pub async fn transition(
        &self,
        resource: &mut Resource,
        to: ResourceState,
    ) -> Result<(), LifecycleError> {
        let from = resource.transition(to)?;
        info!(run_id = %self.run_id, resource = %resource, %from, %to, "state change");
        self.sink
            .emit(Event::ResourceTransition {
                kind: resource.kind,
                name: resource.name.clone(),
                from,
                to,
            })
            .await;
        Ok(())
    }
}
