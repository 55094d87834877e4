mod common;

use common::{face, frame, ScriptedClassifier};
use pathos::error::InferenceError;
use pathos::inference::{CancelToken, InferenceClient, Region, RetryPolicy, SequenceGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct AlwaysCurrent;

impl SequenceGuard for AlwaysCurrent {
    fn is_current(&self, _seq: u64) -> bool {
        true
    }
}

/// Current for the first `n` checks only
struct CurrentFor {
    remaining: AtomicUsize,
}

impl CurrentFor {
    fn new(n: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(n),
        }
    }
}

impl SequenceGuard for CurrentFor {
    fn is_current(&self, _seq: u64) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1000),
        attempt_timeout: Duration::from_secs(15),
    }
}

fn network() -> InferenceError {
    InferenceError::Network("connection reset".to_string())
}

#[tokio::test(start_paused = true)]
async fn test_network_errors_exhaust_attempts_with_linear_backoff() {
    let classifier = Arc::new(ScriptedClassifier::new(Err(network())));
    let client = InferenceClient::new(classifier.clone(), policy(3));

    let result = client
        .submit(&frame(640, 480), 1, &AlwaysCurrent, &CancelToken::new())
        .await;

    assert_eq!(result, Err(network()));

    let calls = classifier.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[1] - calls[0] >= Duration::from_millis(1000));
    assert!(calls[2] - calls[1] >= Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_then_success() {
    let happy = face("happy", 90.0, Region::new(10, 10, 40, 40));
    let classifier = Arc::new(
        ScriptedClassifier::new(Ok(vec![happy.clone()])).then(Err(network())),
    );
    let client = InferenceClient::new(classifier.clone(), policy(3));

    let result = client
        .submit(&frame(640, 480), 1, &AlwaysCurrent, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(result, vec![happy]);
    assert_eq!(classifier.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_backend_status_is_not_retried() {
    let classifier = Arc::new(ScriptedClassifier::new(Err(InferenceError::Backend(500))));
    let client = InferenceClient::new(classifier.clone(), policy(3));

    let result = client
        .submit(&frame(640, 480), 1, &AlwaysCurrent, &CancelToken::new())
        .await;

    assert_eq!(result, Err(InferenceError::Backend(500)));
    assert_eq!(classifier.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_response_is_not_retried() {
    let classifier = Arc::new(ScriptedClassifier::new(Err(InferenceError::Malformed(
        "expected array".to_string(),
    ))));
    let client = InferenceClient::new(classifier.clone(), policy(3));

    let result = client
        .submit(&frame(640, 480), 1, &AlwaysCurrent, &CancelToken::new())
        .await;

    assert!(matches!(result, Err(InferenceError::Malformed(_))));
    assert_eq!(classifier.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_attempts_time_out() {
    let classifier = Arc::new(
        ScriptedClassifier::new(Ok(Vec::new())).with_delay(Duration::from_secs(20)),
    );
    let client = InferenceClient::new(classifier.clone(), policy(2));

    let result = client
        .submit(&frame(640, 480), 1, &AlwaysCurrent, &CancelToken::new())
        .await;

    assert_eq!(result, Err(InferenceError::Timeout(15_000)));
    assert_eq!(classifier.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_attempt() {
    let classifier = Arc::new(
        ScriptedClassifier::new(Ok(Vec::new())).with_delay(Duration::from_secs(10)),
    );
    let client = Arc::new(InferenceClient::new(classifier.clone(), policy(3)));
    let cancel = CancelToken::new();

    let task = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            client
                .submit(&frame(640, 480), 1, &AlwaysCurrent, &cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();

    assert_eq!(task.await.unwrap(), Err(InferenceError::Cancelled));
    assert_eq!(classifier.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff() {
    let classifier = Arc::new(ScriptedClassifier::new(Err(network())));
    let client = Arc::new(InferenceClient::new(classifier.clone(), policy(3)));
    let cancel = CancelToken::new();

    let task = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            client
                .submit(&frame(640, 480), 1, &AlwaysCurrent, &cancel)
                .await
        })
    };

    // First attempt fails at once, then a 1s backoff starts
    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();

    assert_eq!(task.await.unwrap(), Err(InferenceError::Cancelled));
    assert_eq!(classifier.calls().len(), 1);
}

#[tokio::test]
async fn test_cancelled_token_skips_classifier() {
    let classifier = Arc::new(ScriptedClassifier::new(Ok(Vec::new())));
    let client = InferenceClient::new(classifier.clone(), policy(3));
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = client
        .submit(&frame(640, 480), 1, &AlwaysCurrent, &cancel)
        .await;

    assert_eq!(result, Err(InferenceError::Cancelled));
    assert!(classifier.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_superseded_request_stops_retrying() {
    let classifier = Arc::new(ScriptedClassifier::new(Err(network())));
    let client = InferenceClient::new(classifier.clone(), policy(3));
    let guard = CurrentFor::new(1);

    let result = client
        .submit(&frame(640, 480), 7, &guard, &CancelToken::new())
        .await;

    assert_eq!(result, Err(InferenceError::Outdated));
    assert_eq!(classifier.calls().len(), 1);
}
