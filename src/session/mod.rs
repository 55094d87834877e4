//! Detection session management
//!
//! This module provides the `DetectionController` that manages:
//! - Session lifecycle (idle, starting, running, stopping)
//! - Classifier selection (remote backend, optional local fallback)
//! - The request sequencer that paces capture → infer → render cycles
//! - Session statistics and status reporting

mod config;
mod controller;
mod sequencer;
mod state;
mod stats;

pub use config::SessionConfig;
pub use controller::DetectionController;
pub use sequencer::{
    RequestSequencer, RequestTicket, SequenceLedger, SequencerConfig, TickDecision, TickOutcome,
};
pub use state::{DetectionStatus, SessionState};
pub use stats::{SessionStats, StatsRecorder};
