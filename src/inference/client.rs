use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::cancel::CancelToken;
use super::classifier::Classifier;
use super::model::DetectionResult;
use crate::capture::Frame;
use crate::error::InferenceError;

/// Retry and timeout settings for one submit call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Linear backoff unit
    pub base_delay: Duration,

    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Delay inserted after the `failed_attempts`-th failure
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        self.base_delay * failed_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(15),
        }
    }
}

/// Tells the client whether a sequence number is still the one awaiting a result
pub trait SequenceGuard: Send + Sync {
    fn is_current(&self, seq: u64) -> bool;
}

/// Submits frames to a classifier with bounded retries, timeouts and cancellation
pub struct InferenceClient {
    classifier: Arc<dyn Classifier>,
    policy: RetryPolicy,
}

impl InferenceClient {
    pub fn new(classifier: Arc<dyn Classifier>, policy: RetryPolicy) -> Self {
        Self { classifier, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Classify `frame` on behalf of request `seq`
    ///
    /// Network and timeout failures are retried up to the policy's attempt budget;
    /// every other failure is returned at once. A cancelled token yields
    /// `Cancelled`, a superseded sequence number yields `Outdated`.
    pub async fn submit(
        &self,
        frame: &Frame,
        seq: u64,
        guard: &dyn SequenceGuard,
        cancel: &CancelToken,
    ) -> Result<DetectionResult, InferenceError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(InferenceError::Cancelled);
            }
            if !guard.is_current(seq) {
                debug!("Request #{} outdated before attempt {}", seq, attempt);
                return Err(InferenceError::Outdated);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(InferenceError::Cancelled),
                result = tokio::time::timeout(
                    self.policy.attempt_timeout,
                    self.classifier.classify(frame),
                ) => match result {
                    Ok(result) => result,
                    Err(_) => Err(InferenceError::Timeout(
                        self.policy.attempt_timeout.as_millis() as u64,
                    )),
                },
            };

            match outcome {
                Ok(result) => {
                    debug!(
                        "Request #{} classified on attempt {} ({} face(s))",
                        seq,
                        attempt,
                        result.len()
                    );
                    return Ok(result);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        "Request #{} attempt {}/{} failed: {} (retrying in {:?})",
                        seq, attempt, max_attempts, e, delay
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(InferenceError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }

                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            attempt_timeout: Duration::from_secs(15),
        };

        assert_eq!(policy.backoff(1), Duration::from_millis(250));
        assert_eq!(policy.backoff(2), Duration::from_millis(500));
        assert_eq!(policy.backoff(4), Duration::from_millis(1000));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(15));
    }
}
