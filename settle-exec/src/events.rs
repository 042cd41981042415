use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use settle_core::{ResourceKind, ResourceState};

#[derive(Debug, Clone)]
pub enum Event {
    PollAttempt {
        label: String,
        attempt: u32,
        elapsed: Duration,
        remaining: Duration,
    },
    PollSucceeded {
        label: String,
        attempt: u32,
        elapsed: Duration,
    },
    PollExpired {
        label: String,
        attempts: u32,
        elapsed: Duration,
    },
    RetryScheduled {
        label: String,
        /// The attempt that just failed.
        attempt: u32,
        delay: Duration,
        error: String,
    },
    RetryExhausted {
        label: String,
        attempts: u32,
        error: String,
    },
    TaskStarted {
        target: String,
    },
    TaskFinished {
        target: String,
        succeeded: bool,
    },
    BatchFinished {
        total: usize,
        failed: usize,
    },
    ResourceTransition {
        kind: ResourceKind,
        name: String,
        from: ResourceState,
        to: ResourceState,
    },
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::PollAttempt { .. } => "poll.attempt",
            Event::PollSucceeded { .. } => "poll.succeeded",
            Event::PollExpired { .. } => "poll.expired",
            Event::RetryScheduled { .. } => "retry.scheduled",
            Event::RetryExhausted { .. } => "retry.exhausted",
            Event::TaskStarted { .. } => "task.started",
            Event::TaskFinished { .. } => "task.finished",
            Event::BatchFinished { .. } => "batch.finished",
            Event::ResourceTransition { .. } => "resource.transition",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let ty = self.event_type();
        match self {
            Event::PollAttempt { label, attempt, elapsed, remaining } => json!({
                "type": ty, "label": label, "attempt": attempt,
                "elapsed_ms": elapsed.as_millis() as u64, "remaining_ms": remaining.as_millis() as u64,
            }),
            Event::PollSucceeded { label, attempt, elapsed } => json!({
                "type": ty, "label": label, "attempt": attempt, "elapsed_ms": elapsed.as_millis() as u64,
            }),
            Event::PollExpired { label, attempts, elapsed } => json!({
                "type": ty, "label": label, "attempts": attempts, "elapsed_ms": elapsed.as_millis() as u64,
            }),
            Event::RetryScheduled { label, attempt, delay, error } => json!({
                "type": ty, "label": label, "attempt": attempt,
                "delay_ms": delay.as_millis() as u64, "error": error,
            }),
            Event::RetryExhausted { label, attempts, error } => json!({
                "type": ty, "label": label, "attempts": attempts, "error": error,
            }),
            Event::TaskStarted { target } => json!({ "type": ty, "target": target }),
            Event::TaskFinished { target, succeeded } => json!({
                "type": ty, "target": target, "succeeded": succeeded,
            }),
            Event::BatchFinished { total, failed } => json!({
                "type": ty, "total": total, "failed": failed,
            }),
            Event::ResourceTransition { kind, name, from, to } => json!({
                "type": ty, "kind": kind.as_str(), "name": name,
                "from": from.as_str(), "to": to.as_str(),
            }),
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

pub struct CompositeEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

/// One JSON object per line on stdout.
pub struct StdoutEventSink;

#[async_trait]
impl EventSink for StdoutEventSink {
    async fn emit(&self, event: Event) {
        println!("{}", serde_json::to_string(&event.to_json()).unwrap_or_default());
    }
}

/// Forwards every event to `tracing` at debug level under the `settle::events` target.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: Event) {
        tracing::debug!(target: "settle::events", event = %event.to_json(), "{}", event.event_type());
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recording(Arc<Mutex<Vec<&'static str>>>);

    #[async_trait]
    impl EventSink for Recording {
        async fn emit(&self, event: Event) {
            self.0.lock().unwrap().push(event.event_type());
        }
    }

    #[tokio::test]
    async fn composite_forwards_to_every_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut sink = CompositeEventSink::new();
        sink.add(Box::new(Recording(seen.clone())));
        sink.add(Box::new(NoOpEventSink));
        sink.add(Box::new(Recording(seen.clone())));
        sink.emit(Event::BatchFinished { total: 3, failed: 1 }).await;
        assert_eq!(*seen.lock().unwrap(), vec!["batch.finished", "batch.finished"]);
    }

    #[test]
    fn transition_json_uses_state_names() {
        let event = Event::ResourceTransition {
            kind: ResourceKind::Cluster,
            name: "cephfs-nfs".to_string(),
            from: ResourceState::Creating,
            to: ResourceState::Active,
        };
        let v = event.to_json();
        assert_eq!(v["type"], "resource.transition");
        assert_eq!(v["from"], "creating");
        assert_eq!(v["to"], "active");
    }
}
