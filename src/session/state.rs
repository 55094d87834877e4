use serde::{Deserialize, Serialize};
use std::fmt;

use super::stats::SessionStats;

/// Lifecycle of a detection session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Running => "running",
            SessionState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Snapshot returned by `getStatus`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionStatus {
    pub state: SessionState,

    /// Result of the most recent backend probe
    pub backend_available: bool,

    /// Classifier in use for the current session
    pub classifier: Option<String>,

    pub backend_url: Option<String>,

    pub session_id: Option<String>,

    pub stats: SessionStats,
}

impl DetectionStatus {
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }
}
