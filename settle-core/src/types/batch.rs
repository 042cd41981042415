use std::fmt::Display;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{BatchFailed, TaskExecutionError};

/// Outcome of one task in a parallel batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult<G, T> {
    pub target: G,
    pub outcome: Result<T, TaskExecutionError>,
}

impl<G, T> TaskResult<G, T> {
    pub fn success(target: G, value: T) -> Self {
        Self {
            target,
            outcome: Ok(value),
        }
    }

    pub fn failure(target: G, error: TaskExecutionError) -> Self {
        Self {
            target,
            outcome: Err(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&TaskExecutionError> {
        self.outcome.as_ref().err()
    }
}

impl<G: Serialize, T: Serialize> Serialize for TaskResult<G, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TaskResult", 4)?;
        s.serialize_field("target", &self.target)?;
        s.serialize_field("success", &self.succeeded())?;
        s.serialize_field("value", &self.value())?;
        s.serialize_field("error", &self.error())?;
        s.end()
    }
}

/// Aggregate of a whole batch, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<G, T> {
    results: Vec<TaskResult<G, T>>,
}

impl<G, T> Default for BatchOutcome<G, T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

impl<G, T> BatchOutcome<G, T> {
    /// `results` must already be in submission order.
    pub fn new(results: Vec<TaskResult<G, T>>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[TaskResult<G, T>] {
        &self.results
    }

    pub fn into_results(self) -> Vec<TaskResult<G, T>> {
        self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Vacuously true for an empty batch.
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(TaskResult::succeeded)
    }

    pub fn failures(&self) -> Vec<&TaskResult<G, T>> {
        self.results.iter().filter(|r| !r.succeeded()).collect()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.succeeded()).count()
    }

    /// Re-key every result, e.g. from nodes to node names. Order is kept.
    pub fn map_targets<H>(self, mut f: impl FnMut(G) -> H) -> BatchOutcome<H, T> {
        BatchOutcome {
            results: self
                .results
                .into_iter()
                .map(|r| TaskResult {
                    target: f(r.target),
                    outcome: r.outcome,
                })
                .collect(),
        }
    }

    /// Values in submission order, or [`BatchFailed`] naming every failed target.
    pub fn into_values(self) -> Result<Vec<T>, BatchFailed>
    where
        G: Display,
    {
        let total = self.results.len();
        let mut values = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for r in self.results {
            match r.outcome {
                Ok(v) => values.push(v),
                Err(e) => failures.push((r.target.to_string(), e)),
            }
        }
        if failures.is_empty() {
            Ok(values)
        } else {
            Err(BatchFailed { total, failures })
        }
    }
}

impl<G: Serialize, T: Serialize> Serialize for BatchOutcome<G, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("BatchOutcome", 3)?;
        s.serialize_field("all_succeeded", &self.all_succeeded())?;
        s.serialize_field("failed", &self.failed_count())?;
        s.serialize_field("results", &self.results)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_vacuously_successful() {
        let b: BatchOutcome<String, ()> = BatchOutcome::default();
        assert!(b.all_succeeded());
        assert!(b.failures().is_empty());
        assert_eq!(b.into_values().unwrap(), Vec::<()>::new());
    }

    #[test]
    fn map_targets_keeps_order_and_outcomes() {
        let b = BatchOutcome::new(vec![
            TaskResult::success(2u32, "a"),
            TaskResult::failure(1u32, TaskExecutionError::skipped()),
        ])
        .map_targets(|n| format!("node{n}"));
        assert_eq!(b.results()[0].target, "node2");
        assert_eq!(b.results()[1].target, "node1");
        assert_eq!(b.failed_count(), 1);
    }

    #[test]
    fn into_values_reports_failed_targets() {
        let b = BatchOutcome::new(vec![
            TaskResult::success("client1".to_string(), 1),
            TaskResult::failure("client2".to_string(), TaskExecutionError::failed("mount: exit 32")),
        ]);
        let err = b.into_values().unwrap_err();
        assert_eq!(err.total, 2);
        assert_eq!(err.failures.len(), 1);
        assert!(err.to_string().contains("client2"));
    }

    #[test]
    fn serializes_task_result_fields() {
        let r: TaskResult<&str, u32> = TaskResult::success("n1", 7);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["target"], "n1");
        assert_eq!(v["success"], true);
        assert_eq!(v["value"], 7);
        assert!(v["error"].is_null());
    }
}
