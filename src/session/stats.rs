use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Statistics about a detection session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// When the session started running
    pub started_at: Option<DateTime<Utc>>,

    /// Time since start in seconds
    pub duration_secs: f64,

    /// Capture/infer requests issued
    pub cycles_issued: u64,

    /// Results that reached the overlay
    pub results_rendered: u64,

    /// Results dropped because a newer request or a stop superseded them
    pub stale_discarded: u64,

    /// Capture or inference failures surfaced to the sequencer
    pub failures: u64,

    /// Faces drawn for the latest rendered frame
    pub faces_last_frame: usize,

    pub last_error: Option<String>,
}

/// Lock-free counters updated from the request cycle
#[derive(Debug, Default)]
pub struct StatsRecorder {
    cycles_issued: AtomicU64,
    results_rendered: AtomicU64,
    stale_discarded: AtomicU64,
    failures: AtomicU64,
    faces_last_frame: AtomicUsize,
    last_error: Mutex<Option<String>>,
}

impl StatsRecorder {
    pub fn record_issued(&self) {
        self.cycles_issued.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_rendered(&self, faces: usize) {
        self.results_rendered.fetch_add(1, Ordering::SeqCst);
        self.faces_last_frame.store(faces, Ordering::SeqCst);
    }

    pub fn record_stale(&self) {
        self.stale_discarded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failure(&self, error: impl ToString) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error.to_string());
    }

    pub fn reset(&self) {
        self.cycles_issued.store(0, Ordering::SeqCst);
        self.results_rendered.store(0, Ordering::SeqCst);
        self.stale_discarded.store(0, Ordering::SeqCst);
        self.failures.store(0, Ordering::SeqCst);
        self.faces_last_frame.store(0, Ordering::SeqCst);
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn snapshot(&self, started_at: Option<DateTime<Utc>>) -> SessionStats {
        let duration_secs = started_at
            .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        SessionStats {
            started_at,
            duration_secs,
            cycles_issued: self.cycles_issued.load(Ordering::SeqCst),
            results_rendered: self.results_rendered.load(Ordering::SeqCst),
            stale_discarded: self.stale_discarded.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            faces_last_frame: self.faces_last_frame.load(Ordering::SeqCst),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}
