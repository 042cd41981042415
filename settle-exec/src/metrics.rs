use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::events::{Event, EventSink};

#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub total_duration: Option<Duration>,
    pub poll_attempts: usize,
    pub polls_succeeded: usize,
    pub polls_expired: usize,
    pub retries_scheduled: usize,
    pub retries_exhausted: usize,
    pub tasks_started: usize,
    pub tasks_succeeded: usize,
    pub tasks_failed: usize,
    pub transitions: usize,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn record(&mut self, event: &Event) {
        match event {
            Event::PollAttempt { .. } => self.poll_attempts += 1,
            Event::PollSucceeded { .. } => self.polls_succeeded += 1,
            Event::PollExpired { .. } => self.polls_expired += 1,
            Event::RetryScheduled { .. } => self.retries_scheduled += 1,
            Event::RetryExhausted { .. } => self.retries_exhausted += 1,
            Event::TaskStarted { .. } => self.tasks_started += 1,
            Event::TaskFinished { succeeded: true, .. } => self.tasks_succeeded += 1,
            Event::TaskFinished { succeeded: false, .. } => self.tasks_failed += 1,
            Event::ResourceTransition { .. } => self.transitions += 1,
            Event::BatchFinished { .. } => {}
        }
    }

    pub fn finish(&mut self) {
        let finished = Instant::now();
        self.finished_at = Some(finished);
        if let Some(started) = self.started_at {
            self.total_duration = Some(finished.duration_since(started));
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "duration_ms": self.total_duration.map(|d| d.as_millis() as u64),
            "polls": {
                "attempts": self.poll_attempts,
                "succeeded": self.polls_succeeded,
                "expired": self.polls_expired,
            },
            "retries": {
                "scheduled": self.retries_scheduled,
                "exhausted": self.retries_exhausted,
            },
            "tasks": {
                "started": self.tasks_started,
                "succeeded": self.tasks_succeeded,
                "failed": self.tasks_failed,
            },
            "transitions": self.transitions,
        })
    }
}

#[derive(Clone)]
pub struct MetricsCollector {
    metrics: Arc<Mutex<RunMetrics>>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(Mutex::new(RunMetrics::new())),
        }
    }

    pub async fn record(&self, event: &Event) {
        self.metrics.lock().await.record(event);
    }

    pub async fn finish(&self) {
        self.metrics.lock().await.finish();
    }

    pub async fn get_metrics(&self) -> RunMetrics {
        self.metrics.lock().await.clone()
    }
}

/// Counts events before forwarding them to `base`.
pub struct MetricsEventSink {
    collector: MetricsCollector,
    base: Arc<dyn EventSink>,
}

impl MetricsEventSink {
    pub fn new(collector: MetricsCollector, base: Arc<dyn EventSink>) -> Self {
        Self { collector, base }
    }
}

#[async_trait]
impl EventSink for MetricsEventSink {
    async fn emit(&self, event: Event) {
        self.collector.record(&event).await;
        self.base.emit(event).await;
    }
}
