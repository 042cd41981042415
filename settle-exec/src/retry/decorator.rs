use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use settle_core::RetryPolicy;
use tracing::{debug, warn};

use crate::events::{Event, EventSink};
use crate::retry::decision::{decide_retry, RetryDecision, RetryReason};

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The error did not match the retry filter; no further attempts were made.
    #[error("attempt {attempt} failed with a non-retryable error: {source}")]
    Permanent { attempt: u32, source: E },
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryError<E> {
    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Permanent { attempt, .. } => *attempt,
            Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub fn into_inner(self) -> E {
        match self {
            Self::Permanent { source, .. } => source,
            Self::Exhausted { last, .. } => last,
        }
    }
}

/// An operation bound to a retry policy. Built with [`retrying`].
pub struct Retrying<Op, P> {
    policy: RetryPolicy,
    retryable: P,
    op: Op,
    label: String,
    sink: Option<Arc<dyn EventSink>>,
}

/// Wrap `op` so that failures matching `retryable` are retried under `policy`.
///
/// `op` receives the 1-based attempt number.
pub fn retrying<Op, P, T, E, Fut>(policy: RetryPolicy, retryable: P, op: Op) -> Retrying<Op, P>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    Retrying {
        policy,
        retryable,
        op,
        label: "operation".to_string(),
        sink: None,
    }
}

impl<Op, P> Retrying<Op, P> {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn run<T, E, Fut>(&mut self) -> Result<T, RetryError<E>>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt: u32 = 1;
        loop {
            let err = match (self.op)(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let retryable = (self.retryable)(&err);
            match decide_retry(&self.policy, attempt, retryable, || fastrand::u64(..)) {
                RetryDecision::RetryAfter { delay, .. } => {
                    debug!(label = %self.label, attempt, ?delay, error = %err, "retrying after failure");
                    self.emit(Event::RetryScheduled {
                        label: self.label.clone(),
                        attempt,
                        delay,
                        error: err.to_string(),
                    })
                    .await;
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::Stop {
                    reason: RetryReason::NotRetryable,
                } => {
                    debug!(label = %self.label, attempt, error = %err, "non-retryable failure");
                    return Err(RetryError::Permanent {
                        attempt,
                        source: err,
                    });
                }
                RetryDecision::Stop { .. } => {
                    warn!(label = %self.label, attempts = attempt, error = %err, "retries exhausted");
                    self.emit(Event::RetryExhausted {
                        label: self.label.clone(),
                        attempts: attempt,
                        error: err.to_string(),
                    })
                    .await;
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }
            }
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(sink) = &self.sink {
            sink.emit(event).await;
        }
    }
}
