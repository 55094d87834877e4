use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{BackendConfig, DetectionConfig};
use crate::inference::RetryPolicy;

/// Configuration for a detection session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minimum time between two capture starts
    /// Default: 3 seconds
    pub min_interval: Duration,

    /// How often the scheduler wakes up to tick
    pub tick_interval: Duration,

    /// Attempts per inference request, including the first
    pub max_attempts: u32,

    /// Linear backoff unit between attempts
    pub retry_base_delay: Duration,

    /// Deadline for one inference attempt
    pub attempt_timeout: Duration,

    /// Upper bound on the capability probe during start
    pub probe_timeout: Duration,

    /// Fall back to a local classifier when the backend probe fails
    pub local_fallback: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(3),
            tick_interval: Duration::from_millis(50),
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(5),
            local_fallback: false,
        }
    }
}

impl SessionConfig {
    pub fn from_settings(detection: &DetectionConfig, backend: &BackendConfig) -> Self {
        Self {
            min_interval: Duration::from_millis(detection.min_interval_ms),
            tick_interval: Duration::from_millis(detection.tick_interval_ms.max(1)),
            max_attempts: detection.max_attempts.max(1),
            retry_base_delay: Duration::from_millis(detection.retry_base_delay_ms),
            attempt_timeout: Duration::from_millis(backend.request_timeout_ms),
            probe_timeout: Duration::from_millis(backend.health_timeout_ms),
            local_fallback: detection.local_fallback,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.retry_base_delay,
            attempt_timeout: self.attempt_timeout,
        }
    }
}
