use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::config::SessionConfig;
use super::sequencer::{RequestSequencer, SequenceLedger, SequencerConfig};
use super::state::{DetectionStatus, SessionState};
use super::stats::StatsRecorder;
use crate::capture::FrameSource;
use crate::error::{ControllerError, InitializationError};
use crate::inference::{CancelToken, Classifier, InferenceClient};
use crate::overlay::OverlayRenderer;

#[derive(Default)]
struct ControllerInner {
    state: SessionState,
    session_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    backend_available: bool,
    classifier: Option<String>,
    cancel: Option<CancelToken>,
    run_handle: Option<JoinHandle<()>>,
    sequencer: Option<Arc<RequestSequencer>>,
}

impl ControllerInner {
    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.session_id = None;
        self.started_at = None;
        self.classifier = None;
        self.cancel = None;
        self.run_handle = None;
        self.sequencer = None;
    }
}

/// Owns the detection session and drives it through
/// Idle → Starting → Running → Stopping → Idle
pub struct DetectionController {
    config: SessionConfig,
    source: Arc<dyn FrameSource>,
    remote: Arc<dyn Classifier>,
    local: Option<Arc<dyn Classifier>>,
    renderer: Arc<OverlayRenderer>,
    ledger: Arc<SequenceLedger>,
    stats: Arc<StatsRecorder>,
    inner: Mutex<ControllerInner>,
}

impl DetectionController {
    pub fn new(
        config: SessionConfig,
        source: Arc<dyn FrameSource>,
        remote: Arc<dyn Classifier>,
        renderer: Arc<OverlayRenderer>,
    ) -> Self {
        Self {
            config,
            source,
            remote,
            local: None,
            renderer,
            ledger: Arc::new(SequenceLedger::new()),
            stats: Arc::new(StatsRecorder::default()),
            inner: Mutex::new(ControllerInner::default()),
        }
    }

    /// Register an in-process classifier used when the backend is unavailable
    /// and `local_fallback` is enabled
    pub fn with_local_classifier(mut self, local: Arc<dyn Classifier>) -> Self {
        self.local = Some(local);
        self
    }

    pub fn ledger(&self) -> &Arc<SequenceLedger> {
        &self.ledger
    }

    /// Start detection
    ///
    /// Probes the classifier, then starts the request sequencer. Calling it while
    /// a session is starting or running is a no-op.
    pub async fn start(&self) -> Result<DetectionStatus, ControllerError> {
        let (session_id, cancel) = {
            let mut inner = self.lock();
            match inner.state {
                SessionState::Running | SessionState::Starting => {
                    warn!("Detection already {}", inner.state);
                    return Ok(self.status_of(&inner));
                }
                SessionState::Stopping => {
                    return Err(ControllerError::InvalidTransition {
                        action: "start",
                        state: inner.state,
                    });
                }
                SessionState::Idle => {}
            }

            let session_id = format!("session-{}", uuid::Uuid::new_v4());
            let cancel = CancelToken::new();

            inner.state = SessionState::Starting;
            inner.session_id = Some(session_id.clone());
            inner.cancel = Some(cancel.clone());

            (session_id, cancel)
        };

        info!("Starting detection session: {}", session_id);

        let selection = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(InitializationError::Aborted),
            selection = self.select_classifier() => selection,
        };

        let mut inner = self.lock();

        let still_starting = inner.state == SessionState::Starting
            && inner.session_id.as_deref() == Some(session_id.as_str());
        if !still_starting {
            info!("Start of session {} aborted by stop", session_id);
            return Err(InitializationError::Aborted.into());
        }

        let (classifier, backend_available) = match selection {
            Ok(selected) => selected,
            Err(e) => {
                error!("Failed to start detection: {}", e);
                inner.backend_available = false;
                inner.reset();
                return Err(e.into());
            }
        };

        self.ledger.resume();
        self.stats.reset();

        let client = Arc::new(InferenceClient::new(
            Arc::clone(&classifier),
            self.config.retry_policy(),
        ));
        let sequencer = Arc::new(RequestSequencer::new(
            SequencerConfig {
                min_interval: self.config.min_interval,
                tick_interval: self.config.tick_interval,
            },
            Arc::clone(&self.source),
            client,
            Arc::clone(&self.renderer),
            Arc::clone(&self.ledger),
            Arc::clone(&self.stats),
        ));

        let run_handle = tokio::spawn(Arc::clone(&sequencer).run(cancel));

        inner.state = SessionState::Running;
        inner.started_at = Some(Utc::now());
        inner.backend_available = backend_available;
        inner.classifier = Some(classifier.name().to_string());
        inner.run_handle = Some(run_handle);
        inner.sequencer = Some(sequencer);

        info!(
            "Detection session {} running with {}",
            session_id,
            classifier.name()
        );

        Ok(self.status_of(&inner))
    }

    /// Stop detection
    ///
    /// Cancels the tick loop and any pending request, then clears the overlay.
    /// Calling it while idle is a no-op.
    pub async fn stop(&self) -> Result<DetectionStatus, ControllerError> {
        let (cancel, run_handle, sequencer) = {
            let mut inner = self.lock();
            match inner.state {
                SessionState::Idle | SessionState::Stopping => {
                    warn!("Detection not active ({})", inner.state);
                    return Ok(self.status_of(&inner));
                }
                SessionState::Starting | SessionState::Running => {}
            }

            info!(
                "Stopping detection session: {}",
                inner.session_id.as_deref().unwrap_or("-")
            );

            inner.state = SessionState::Stopping;
            (
                inner.cancel.take(),
                inner.run_handle.take(),
                inner.sequencer.take(),
            )
        };

        // No further ticks once the loop has exited
        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(handle) = run_handle {
            if let Err(e) = handle.await {
                error!("Sequencer task panicked: {}", e);
            }
        }

        match sequencer {
            Some(sequencer) => sequencer.halt().await,
            None => {
                self.ledger.halt(|| self.renderer.clear());
            }
        }

        let mut inner = self.lock();
        inner.reset();

        info!("Detection stopped");

        Ok(self.status_of(&inner))
    }

    /// Current state; no side effects
    pub fn status(&self) -> DetectionStatus {
        let inner = self.lock();
        self.status_of(&inner)
    }

    /// Point the remote classifier at another backend; only while idle
    pub fn set_backend_url(&self, url: &str) -> Result<DetectionStatus, ControllerError> {
        let inner = self.lock();
        if inner.state != SessionState::Idle {
            return Err(ControllerError::InvalidTransition {
                action: "change backend",
                state: inner.state,
            });
        }

        self.remote.set_endpoint(url)?;
        Ok(self.status_of(&inner))
    }

    async fn select_classifier(&self) -> Result<(Arc<dyn Classifier>, bool), InitializationError> {
        let probe = tokio::time::timeout(self.config.probe_timeout, self.remote.probe())
            .await
            .unwrap_or_else(|_| {
                Err(InitializationError::BackendUnavailable(format!(
                    "health check timed out after {:?}",
                    self.config.probe_timeout
                )))
            });

        let backend_error = match probe {
            Ok(()) => return Ok((Arc::clone(&self.remote), true)),
            Err(e) => e,
        };

        match &self.local {
            Some(local) if self.config.local_fallback => {
                warn!(
                    "Backend unavailable ({}), falling back to {}",
                    backend_error,
                    local.name()
                );
                tokio::time::timeout(self.config.probe_timeout, local.probe())
                    .await
                    .unwrap_or_else(|_| {
                        Err(InitializationError::LocalModel(format!(
                            "bootstrap timed out after {:?}",
                            self.config.probe_timeout
                        )))
                    })
                    .map_err(|e| match e {
                        InitializationError::LocalModel(_) => e,
                        other => InitializationError::LocalModel(other.to_string()),
                    })?;
                Ok((Arc::clone(local), false))
            }
            _ => Err(backend_error),
        }
    }

    fn status_of(&self, inner: &ControllerInner) -> DetectionStatus {
        DetectionStatus {
            state: inner.state,
            backend_available: inner.backend_available,
            classifier: inner.classifier.clone(),
            backend_url: self.remote.endpoint(),
            session_id: inner.session_id.clone(),
            stats: self.stats.snapshot(inner.started_at),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
