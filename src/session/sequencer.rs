use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::stats::StatsRecorder;
use crate::capture::{Frame, FrameSource};
use crate::error::CaptureError;
use crate::inference::{CancelToken, InferenceClient, SequenceGuard};
use crate::overlay::OverlayRenderer;

// ============================================================================
// Ledger
// ============================================================================

#[derive(Debug)]
struct Pending {
    seq: u64,
    cancel: CancelToken,
}

#[derive(Debug, Default)]
struct LedgerState {
    last_issued: u64,
    pending: Option<Pending>,
    last_capture_start: Option<Instant>,
    halted: bool,
}

/// Permission to run one capture/infer cycle
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub seq: u64,
    pub cancel: CancelToken,
}

/// What a tick is allowed to do
#[derive(Debug)]
pub enum TickDecision {
    /// The session is stopped
    Halted,
    /// Too soon after the last capture start
    Throttled(Duration),
    /// Another request is awaiting its result
    Busy(u64),
    Issue(RequestTicket),
}

/// Sequence numbers and the single pending marker
///
/// Sequence numbers keep increasing across halt/resume, so a request from a
/// previous session can never be mistaken for the current one.
#[derive(Debug, Default)]
pub struct SequenceLedger {
    state: Mutex<LedgerState>,
}

impl SequenceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check throttle and pending, and issue the next number if both allow it
    pub fn try_issue(&self, now: Instant, min_interval: Duration) -> TickDecision {
        let mut state = self.lock();

        if state.halted {
            return TickDecision::Halted;
        }

        if let Some(last) = state.last_capture_start {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < min_interval {
                return TickDecision::Throttled(min_interval - elapsed);
            }
        }

        if let Some(pending) = &state.pending {
            return TickDecision::Busy(pending.seq);
        }

        state.last_issued += 1;
        state.last_capture_start = Some(now);

        let ticket = RequestTicket {
            seq: state.last_issued,
            cancel: CancelToken::new(),
        };
        state.pending = Some(Pending {
            seq: ticket.seq,
            cancel: ticket.cancel.clone(),
        });

        TickDecision::Issue(ticket)
    }

    /// Clear the pending marker for `seq` and run `on_current` under the ledger lock
    ///
    /// Returns `None` (without running the closure) when `seq` was superseded.
    pub fn settle<R>(&self, seq: u64, on_current: impl FnOnce() -> R) -> Option<R> {
        let mut state = self.lock();

        match &state.pending {
            Some(pending) if pending.seq == seq && !state.halted => {
                state.pending = None;
                Some(on_current())
            }
            _ => None,
        }
    }

    /// Like `settle`, for a cycle that never obtained a frame
    ///
    /// The throttle anchor is released too, so the next tick captures straight away.
    pub fn settle_uncaptured<R>(&self, seq: u64, on_current: impl FnOnce() -> R) -> Option<R> {
        let mut state = self.lock();

        match &state.pending {
            Some(pending) if pending.seq == seq && !state.halted => {
                state.pending = None;
                state.last_capture_start = None;
                Some(on_current())
            }
            _ => None,
        }
    }

    /// Stop accepting ticks, cancel the pending request and run `on_halt` under the lock
    ///
    /// Returns the sequence number that was pending, if any.
    pub fn halt(&self, on_halt: impl FnOnce()) -> Option<u64> {
        let mut state = self.lock();
        state.halted = true;

        let cancelled = state.pending.take().map(|pending| {
            pending.cancel.cancel();
            pending.seq
        });

        on_halt();
        cancelled
    }

    /// Accept ticks again; the throttle starts fresh
    pub fn resume(&self) {
        let mut state = self.lock();
        state.halted = false;
        state.last_capture_start = None;
    }

    pub fn pending(&self) -> Option<u64> {
        self.lock().pending.as_ref().map(|p| p.seq)
    }

    pub fn last_issued(&self) -> u64 {
        self.lock().last_issued
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SequenceGuard for SequenceLedger {
    fn is_current(&self, seq: u64) -> bool {
        let state = self.lock();
        !state.halted && state.pending.as_ref().is_some_and(|p| p.seq == seq)
    }
}

// ============================================================================
// Sequencer
// ============================================================================

/// Pacing for the tick loop
#[derive(Debug, Clone, Copy)]
pub struct SequencerConfig {
    pub min_interval: Duration,
    pub tick_interval: Duration,
}

/// Result of one `tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Issued(u64),
    Throttled,
    Busy(u64),
    Halted,
}

/// Drives the capture → infer → render cycle with single-flight semantics
pub struct RequestSequencer {
    config: SequencerConfig,
    source: Arc<dyn FrameSource>,
    client: Arc<InferenceClient>,
    renderer: Arc<OverlayRenderer>,
    ledger: Arc<SequenceLedger>,
    stats: Arc<StatsRecorder>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl RequestSequencer {
    pub fn new(
        config: SequencerConfig,
        source: Arc<dyn FrameSource>,
        client: Arc<InferenceClient>,
        renderer: Arc<OverlayRenderer>,
        ledger: Arc<SequenceLedger>,
        stats: Arc<StatsRecorder>,
    ) -> Self {
        Self {
            config,
            source,
            client,
            renderer,
            ledger,
            stats,
            in_flight: Mutex::new(None),
        }
    }

    pub fn ledger(&self) -> &Arc<SequenceLedger> {
        &self.ledger
    }

    /// One scheduler wake-up; spawns a cycle task when throttle and single-flight allow
    pub fn tick(self: &Arc<Self>) -> TickOutcome {
        match self.ledger.try_issue(Instant::now(), self.config.min_interval) {
            TickDecision::Halted => TickOutcome::Halted,
            TickDecision::Throttled(remaining) => {
                trace!("Tick throttled ({:?} remaining)", remaining);
                TickOutcome::Throttled
            }
            TickDecision::Busy(seq) => {
                trace!("Tick skipped, request #{} pending", seq);
                TickOutcome::Busy(seq)
            }
            TickDecision::Issue(ticket) => {
                let seq = ticket.seq;
                debug!("Issuing request #{}", seq);
                self.stats.record_issued();

                let handle = tokio::spawn(Arc::clone(self).run_cycle(ticket));
                *self.in_flight_slot() = Some(handle);

                TickOutcome::Issued(seq)
            }
        }
    }

    /// Tick every `tick_interval` until `stop` is cancelled
    pub async fn run(self: Arc<Self>, stop: CancelToken) {
        info!(
            "Request sequencer started (min interval {:?}, tick {:?})",
            self.config.min_interval, self.config.tick_interval
        );

        loop {
            if stop.is_cancelled() {
                break;
            }

            self.tick();

            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = tokio::time::sleep(self.config.tick_interval) => {}
            }
        }

        info!("Request sequencer stopped");
    }

    /// Cancel the in-flight request, clear the overlay and refuse further ticks
    pub async fn halt(&self) {
        if let Some(seq) = self.ledger.halt(|| self.renderer.clear()) {
            info!("Cancelled in-flight request #{}", seq);
        }

        let handle = self.in_flight_slot().take();
        if let Some(handle) = handle {
            handle.abort();
            // An aborted task reports a cancellation JoinError
            let _ = handle.await;
        }
    }

    /// Wait for the most recently spawned cycle to finish
    pub async fn wait_in_flight(&self) {
        let handle = self.in_flight_slot().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    warn!("Request cycle panicked: {}", e);
                }
            }
        }
    }

    async fn run_cycle(self: Arc<Self>, ticket: RequestTicket) {
        let RequestTicket { seq, cancel } = ticket;

        let frame = match self.capture(seq, &cancel).await {
            Ok(frame) => frame,
            Err(e) => {
                let current = self
                    .ledger
                    .settle_uncaptured(seq, || {
                        warn!("Request #{} capture failed: {}", seq, e);
                        self.stats.record_failure(&e);
                    })
                    .is_some();
                if !current {
                    self.stats.record_stale();
                }
                return;
            }
        };

        let size = frame.size();
        let outcome = self
            .client
            .submit(&frame, seq, self.ledger.as_ref(), &cancel)
            .await;

        let applied = self.ledger.settle(seq, || match &outcome {
            Ok(result) => {
                let drawn = self.renderer.render(result, size);
                self.stats.record_rendered(drawn);
            }
            Err(e) => {
                warn!("Request #{} failed: {}", seq, e);
                self.stats.record_failure(e);
            }
        });

        if applied.is_none() {
            debug!("Discarding result of superseded request #{}", seq);
            self.stats.record_stale();
        }
    }

    /// Acquire a frame, retrying failed captures with the inference retry policy
    async fn capture(&self, seq: u64, cancel: &CancelToken) -> Result<Frame, CaptureError> {
        let policy = self.client.policy();
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let captured = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CaptureError::Cancelled),
                frame = self.source.capture() => frame,
            };

            match captured {
                Ok(frame) => return Ok(frame),
                Err(e) if attempt < max_attempts => {
                    let delay = policy.backoff(attempt);
                    debug!(
                        "Request #{} capture attempt {}/{} failed: {} (retrying in {:?})",
                        seq, attempt, max_attempts, e, delay
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(CaptureError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }

                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn in_flight_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
