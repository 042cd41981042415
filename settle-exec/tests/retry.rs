use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use settle_core::{ConditionError, RetryPolicy};
use settle_exec::metrics::{MetricsCollector, MetricsEventSink};
use settle_exec::retry::{decide_retry, RetryDecision, RetryReason};
use settle_exec::{retrying, NoOpEventSink, RetryError};
use tokio::time::Instant;

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_secs(5), 2.0)
}

#[tokio::test(start_paused = true)]
async fn sleeps_follow_the_backoff_formula() {
    let start = Instant::now();
    let offsets = Mutex::new(Vec::new());
    let offsets = &offsets;

    let err = retrying(policy(4), ConditionError::is_transient, move |_| async move {
        offsets.lock().unwrap().push(start.elapsed());
        Err::<(), _>(ConditionError::transient("mount busy"))
    })
    .run()
    .await
    .unwrap_err();

    assert!(err.is_exhausted());
    // Sleeps of 5, 10 and 20 seconds before attempts 2, 3 and 4.
    assert_eq!(
        *offsets.lock().unwrap(),
        vec![
            Duration::ZERO,
            Duration::from_secs(5),
            Duration::from_secs(15),
            Duration::from_secs(35),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn always_retryable_failure_exhausts_attempts() {
    let calls = AtomicU32::new(0);
    let calls = &calls;

    let err = retrying(policy(4), ConditionError::is_transient, move |_| async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(ConditionError::transient("connection reset"))
    })
    .run()
    .await
    .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    match err {
        RetryError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 4);
            assert_eq!(last, ConditionError::transient("connection reset"));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn non_retryable_error_propagates_immediately() {
    let calls = AtomicU32::new(0);
    let calls = &calls;
    let start = Instant::now();

    let err = retrying(policy(4), ConditionError::is_transient, move |_| async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(ConditionError::unexpected("permission denied"))
    })
    .run()
    .await
    .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.attempts(), 1);
    assert!(matches!(err, RetryError::Permanent { attempt: 1, .. }));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn recovers_after_transient_failures() {
    let value = retrying(policy(4), ConditionError::is_transient, |attempt| async move {
        if attempt < 3 {
            Err(ConditionError::transient("not yet"))
        } else {
            Ok(attempt * 10)
        }
    })
    .run()
    .await
    .unwrap();
    assert_eq!(value, 30);
}

#[tokio::test(start_paused = true)]
async fn single_attempt_policy_never_sleeps() {
    let start = Instant::now();
    let err = retrying(RetryPolicy::once(), |_: &ConditionError| true, |_| async {
        Err::<(), _>(ConditionError::transient("busy"))
    })
    .run()
    .await
    .unwrap_err();
    assert!(matches!(err, RetryError::Exhausted { attempts: 1, .. }));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn retry_events_are_emitted() {
    let collector = MetricsCollector::new();
    let sink = Arc::new(MetricsEventSink::new(collector.clone(), Arc::new(NoOpEventSink)));

    let _ = retrying(policy(3), ConditionError::is_transient, |_| async {
        Err::<(), _>(ConditionError::transient("busy"))
    })
    .with_label("mount /export_0")
    .with_sink(sink)
    .run()
    .await;

    let metrics = collector.get_metrics().await;
    assert_eq!(metrics.retries_scheduled, 2);
    assert_eq!(metrics.retries_exhausted, 1);
}

#[test]
fn decision_stops_when_attempts_are_used_up() {
    let p = policy(4);
    assert_eq!(
        decide_retry(&p, 3, true, || 0),
        RetryDecision::RetryAfter {
            delay: Duration::from_secs(20),
            reason: RetryReason::Backoff,
        }
    );
    assert_eq!(
        decide_retry(&p, 4, true, || 0),
        RetryDecision::Stop {
            reason: RetryReason::AttemptsExhausted,
        }
    );
}
