//! Landmark service seam and a replay implementation

use async_trait::async_trait;
use facial_affect_common::{AffectError, Blendshape, Result};
use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Anything that turns a camera frame into blendshape scores
#[async_trait]
pub trait LandmarkService: Send + Sync {
    /// Frame type accepted by `detect`
    type Frame: Send + Sync;

    /// Load models and open resources; may be slow
    async fn initialize(&self) -> Result<()>;

    /// Score one frame. An empty list means no face was found.
    async fn detect(&self, frame: &Self::Frame) -> Result<Vec<Blendshape>>;

    /// Release resources. Must be idempotent.
    fn close(&self);
}

/// Service that replays pre-recorded blendshape frames.
///
/// Each frame already carries its detection output; `detect` hands it back
/// after an optional latency.
#[derive(Debug, Default)]
pub struct ReplayLandmarkService {
    startup_delay: Duration,
    startup_failure: Option<String>,
    detect_latency: Duration,
    closed: AtomicBool,
}

impl ReplayLandmarkService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay `initialize` by `delay`
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    /// Make `initialize` fail with `cause`
    pub fn with_startup_failure(mut self, cause: impl Into<String>) -> Self {
        self.startup_failure = Some(cause.into());
        self
    }

    /// Delay every `detect` call by `latency`
    pub fn with_detect_latency(mut self, latency: Duration) -> Self {
        self.detect_latency = latency;
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl LandmarkService for ReplayLandmarkService {
    type Frame = Vec<Blendshape>;

    async fn initialize(&self) -> Result<()> {
        if !self.startup_delay.is_zero() {
            tokio::time::sleep(self.startup_delay).await;
        }
        if let Some(cause) = &self.startup_failure {
            return Err(AffectError::InitializationFailed(cause.clone()));
        }
        if self.is_closed() {
            return Err(AffectError::Disposed);
        }
        debug!("Replay service ready");
        Ok(())
    }

    async fn detect(&self, frame: &Self::Frame) -> Result<Vec<Blendshape>> {
        if self.is_closed() {
            return Err(AffectError::Service("service closed".to_string()));
        }
        if !self.detect_latency.is_zero() {
            tokio::time::sleep(self.detect_latency).await;
        }
        Ok(frame.clone())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Replay service closed");
        }
    }
}

/// Parse recorded frames: one JSON array of `{name, score}` per line.
///
/// Blank lines and `#` comments are skipped; `[]` records a frame with no face.
pub fn parse_jsonl(reader: impl BufRead) -> Result<Vec<Vec<Blendshape>>> {
    let mut frames = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let frame: Vec<Blendshape> = serde_json::from_str(trimmed).map_err(|e| {
            warn!(line = number + 1, error = %e, "Malformed frame");
            e
        })?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Load recorded frames from a JSONL file
pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Vec<Vec<Blendshape>>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let frames = parse_jsonl(std::io::BufReader::new(file))?;
    info!(path = %path.display(), frames = frames.len(), "Loaded recorded frames");
    Ok(frames)
}
