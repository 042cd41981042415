use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use settle_core::{ConditionError, PollAttempt, PollOutcome, Settled, TimeoutExpired};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::events::{Event, EventSink, NoOpEventSink};
use crate::poll::PollConfig;

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("{label}: aborted on attempt {attempt}: {source}")]
    Aborted {
        label: String,
        attempt: u32,
        #[source]
        source: ConditionError,
    },
    #[error(transparent)]
    Expired(#[from] TimeoutExpired),
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

/// Re-evaluates a condition until it holds, the timeout passes, or it fails fast.
///
/// The first evaluation happens immediately. Between evaluations the poller sleeps
/// `min(interval, remaining)`, and it never starts a new evaluation once the budget is
/// spent. Evaluations are strictly sequential.
#[derive(Clone)]
pub struct BoundedPoller {
    config: PollConfig,
    label: String,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for BoundedPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedPoller")
            .field("config", &self.config)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl BoundedPoller {
    pub fn new(config: PollConfig) -> Result<Self, PollError> {
        if config.interval.is_zero() {
            return Err(PollError::ZeroInterval);
        }
        Ok(Self {
            config,
            label: "condition".to_string(),
            sink: Arc::new(NoOpEventSink),
        })
    }

    /// Name used in logs, events and timeout errors.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Poll `condition` and report how it ended.
    ///
    /// `Ok(true)` ends the poll. `Ok(false)` and [`ConditionError::Transient`] keep polling.
    /// [`ConditionError::Unexpected`] keeps polling too unless `fail_fast` is set, in which
    /// case the poll returns [`PollError::Aborted`].
    pub async fn poll<F, Fut>(&self, mut condition: F) -> Result<PollOutcome, PollError>
    where
        F: FnMut(PollAttempt) -> Fut,
        Fut: Future<Output = Result<bool, ConditionError>>,
    {
        let timeout = self.config.timeout;
        let start = Instant::now();
        let mut attempt: u32 = 0;

        let last_error = loop {
            attempt = attempt.saturating_add(1);
            let current = PollAttempt::new(attempt, start.elapsed(), timeout);
            self.sink
                .emit(Event::PollAttempt {
                    label: self.label.clone(),
                    attempt,
                    elapsed: current.elapsed,
                    remaining: current.remaining,
                })
                .await;

            let observed = match self.evaluate(&mut condition, current).await {
                Ok(true) => {
                    let elapsed = start.elapsed();
                    info!(label = %self.label, attempt, ?elapsed, "condition satisfied");
                    self.sink
                        .emit(Event::PollSucceeded {
                            label: self.label.clone(),
                            attempt,
                            elapsed,
                        })
                        .await;
                    return Ok(PollOutcome::Succeeded { attempt, elapsed });
                }
                Ok(false) => {
                    debug!(label = %self.label, attempt, remaining = ?current.remaining, "condition not satisfied");
                    None
                }
                Err(err @ ConditionError::Transient(_)) => {
                    debug!(label = %self.label, attempt, remaining = ?current.remaining, error = %err, "condition not satisfied");
                    Some(err.message().to_string())
                }
                Err(err) => {
                    if self.config.fail_fast {
                        warn!(label = %self.label, attempt, error = %err, "aborting poll");
                        return Err(PollError::Aborted {
                            label: self.label.clone(),
                            attempt,
                            source: err,
                        });
                    }
                    warn!(label = %self.label, attempt, error = %err, "condition raised, retrying");
                    Some(err.to_string())
                }
            };

            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break observed;
            }
            tokio::time::sleep(self.config.interval.min(remaining)).await;
            if start.elapsed() >= timeout {
                break observed;
            }
        };

        let elapsed = start.elapsed();
        warn!(label = %self.label, attempts = attempt, ?elapsed, last_error = ?last_error, "poll expired");
        self.sink
            .emit(Event::PollExpired {
                label: self.label.clone(),
                attempts: attempt,
                elapsed,
            })
            .await;
        Ok(PollOutcome::Expired {
            attempts_made: attempt,
            elapsed,
            last_error,
        })
    }

    /// Like [`Self::poll`], but expiry is an error naming this poller's label.
    pub async fn poll_until<F, Fut>(&self, condition: F) -> Result<Settled, PollError>
    where
        F: FnMut(PollAttempt) -> Fut,
        Fut: Future<Output = Result<bool, ConditionError>>,
    {
        let outcome = self.poll(condition).await?;
        Ok(outcome.into_result(self.label.clone(), self.config.timeout)?)
    }

    async fn evaluate<F, Fut>(
        &self,
        condition: &mut F,
        attempt: PollAttempt,
    ) -> Result<bool, ConditionError>
    where
        F: FnMut(PollAttempt) -> Fut,
        Fut: Future<Output = Result<bool, ConditionError>>,
    {
        match self.config.probe_timeout {
            Some(limit) => match tokio::time::timeout(limit, condition(attempt)).await {
                Ok(result) => result,
                Err(_) => Err(ConditionError::transient(probe_overrun(limit))),
            },
            None => condition(attempt).await,
        }
    }
}

fn probe_overrun(limit: Duration) -> String {
    format!("probe did not finish within {limit:?}")
}
