#![allow(dead_code)]

use async_trait::async_trait;
use pathos::capture::{Frame, FrameSize, FrameSource, ImageFormat};
use pathos::error::{CaptureError, InferenceError, InitializationError};
use pathos::inference::{Classifier, DetectionResult, FaceDetection, Region};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

pub fn frame(width: u32, height: u32) -> Frame {
    Frame::from_parts(ImageFormat::Jpeg, vec![0xFF, 0xD8, 0xFF], FrameSize::new(width, height))
        .unwrap()
}

pub fn face(emotion: &str, score: f32, region: Region) -> FaceDetection {
    let mut scores = BTreeMap::new();
    scores.insert(emotion.to_string(), score);
    FaceDetection::new(region, scores)
}

/// Always returns a 640x480 frame
pub struct FixedSource {
    pub captures: AtomicUsize,
}

impl FixedSource {
    pub fn new() -> Self {
        Self {
            captures: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameSource for FixedSource {
    async fn capture(&self) -> Result<Frame, CaptureError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(frame(640, 480))
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Fails the captures whose (zero-based) index is listed, returns a 640x480 frame otherwise
pub struct FlakySource {
    failing: Vec<usize>,
    fail_after: Option<usize>,
    pub captures: AtomicUsize,
}

impl FlakySource {
    pub fn failing_at(failing: &[usize]) -> Self {
        Self {
            failing: failing.to_vec(),
            fail_after: None,
            captures: AtomicUsize::new(0),
        }
    }

    /// Succeeds `n` times, then fails every capture
    pub fn failing_after(n: usize) -> Self {
        Self {
            failing: Vec::new(),
            fail_after: Some(n),
            captures: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameSource for FlakySource {
    async fn capture(&self) -> Result<Frame, CaptureError> {
        let index = self.captures.fetch_add(1, Ordering::SeqCst);
        let fails = self.failing.contains(&index) || self.fail_after.is_some_and(|n| index >= n);
        if fails {
            Err(CaptureError::NoFrameAvailable)
        } else {
            Ok(frame(640, 480))
        }
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Replays scripted classify outcomes; once the script is exhausted it returns `fallback`
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<Result<DetectionResult, InferenceError>>>,
    fallback: Result<DetectionResult, InferenceError>,
    probe: Result<(), InitializationError>,
    delay: Duration,
    calls: Mutex<Vec<Instant>>,
    name: String,
}

impl ScriptedClassifier {
    pub fn new(fallback: Result<DetectionResult, InferenceError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            probe: Ok(()),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            name: "scripted".to_string(),
        }
    }

    pub fn then(self, outcome: Result<DetectionResult, InferenceError>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn with_probe(mut self, probe: Result<(), InitializationError>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn probe(&self) -> Result<(), InitializationError> {
        self.probe.clone()
    }

    async fn classify(&self, _frame: &Frame) -> Result<DetectionResult, InferenceError> {
        self.calls.lock().unwrap().push(Instant::now());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Blocks every classify call until a permit is released
pub struct GatedClassifier {
    gate: Semaphore,
    result: DetectionResult,
    started: AtomicUsize,
}

impl GatedClassifier {
    pub fn new(result: DetectionResult) -> Self {
        Self {
            gate: Semaphore::new(0),
            result,
            started: AtomicUsize::new(0),
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for GatedClassifier {
    async fn probe(&self) -> Result<(), InitializationError> {
        Ok(())
    }

    async fn classify(&self, _frame: &Frame) -> Result<DetectionResult, InferenceError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;
        permit.forget();
        Ok(self.result.clone())
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Probe that never answers
pub struct HangingProbe;

#[async_trait]
impl Classifier for HangingProbe {
    async fn probe(&self) -> Result<(), InitializationError> {
        std::future::pending().await
    }

    async fn classify(&self, _frame: &Frame) -> Result<DetectionResult, InferenceError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "hanging"
    }
}
