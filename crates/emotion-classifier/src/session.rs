//! Asynchronous detection session
//!
//! Wraps a [`LandmarkService`] and one [`EmotionClassifier`]. Initialization
//! is bounded by a timeout, ticks never overlap, and disposal wakes any tick
//! still waiting on the service so its late result is discarded.

use crate::classifier::{EmotionClassifier, FrameOutcome};
use crate::config::SessionConfig;
use crate::service::LandmarkService;
use facial_affect_common::{AffectError, ClassificationResult, EmotionLabel, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// What happened on one detection tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A face was scored (placeholder while calibrating)
    Classified(ClassificationResult),
    /// The service found no face; classifier state untouched
    NoFace,
    /// A previous tick was still in flight
    Skipped,
    /// The session was disposed while the service was working
    Abandoned,
}

/// Counters for one [`DetectionSession::run`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: usize,
    pub classified: usize,
    pub no_face: usize,
    pub skipped: usize,
    pub abandoned: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Classified(_) => self.classified += 1,
            TickOutcome::NoFace => self.no_face += 1,
            TickOutcome::Skipped => self.skipped += 1,
            TickOutcome::Abandoned => self.abandoned += 1,
        }
    }
}

struct SessionInner<S: LandmarkService> {
    service: S,
    config: SessionConfig,
    classifier: Mutex<Option<EmotionClassifier>>,
    init_lock: tokio::sync::Mutex<()>,
    in_flight: AtomicBool,
    disposed: watch::Sender<bool>,
}

/// Handle to a detection session; clones share the same session
pub struct DetectionSession<S: LandmarkService> {
    inner: Arc<SessionInner<S>>,
}

impl<S: LandmarkService> Clone for DetectionSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Marks a tick as in flight until dropped
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: LandmarkService> DetectionSession<S> {
    pub fn new(service: S, config: SessionConfig) -> Self {
        let (disposed, _) = watch::channel(false);
        Self {
            inner: Arc::new(SessionInner {
                service,
                config,
                classifier: Mutex::new(None),
                init_lock: tokio::sync::Mutex::new(()),
                in_flight: AtomicBool::new(false),
                disposed,
            }),
        }
    }

    /// Start the landmark service and create a fresh classifier.
    ///
    /// The service handshake is abandoned after `init_timeout`. Calling this
    /// on a ready session is a no-op.
    pub async fn initialize(&self) -> Result<()> {
        let _init = self.inner.init_lock.lock().await;
        if self.is_disposed() {
            return Err(AffectError::Disposed);
        }
        if self.is_initialized() {
            return Ok(());
        }

        let classifier = EmotionClassifier::new(self.inner.config.classifier.clone())?;
        let timeout = self.inner.config.init_timeout();
        info!(?timeout, "Initializing landmark service");

        let mut disposed = self.inner.disposed.subscribe();
        let handshake = tokio::time::timeout(timeout, self.inner.service.initialize());
        let outcome = tokio::select! {
            biased;
            _ = disposed.wait_for(|d| *d) => return Err(AffectError::Disposed),
            outcome = handshake => outcome,
        };

        match outcome {
            Err(_) => {
                warn!(?timeout, "Landmark service initialization timed out");
                Err(AffectError::InitializationTimeout(timeout))
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Landmark service failed to initialize");
                Err(match e {
                    AffectError::InitializationFailed(cause) => {
                        AffectError::InitializationFailed(cause)
                    }
                    other => AffectError::InitializationFailed(other.to_string()),
                })
            }
            Ok(Ok(())) => {
                let mut slot = self.lock_classifier();
                if self.is_disposed() {
                    return Err(AffectError::Disposed);
                }
                *slot = Some(classifier);
                info!("Detection session ready");
                Ok(())
            }
        }
    }

    /// Run detection and classification on one frame.
    ///
    /// Returns `Skipped` if a previous tick has not finished and `Abandoned`
    /// if the session was disposed while the service was working.
    pub async fn tick(&self, frame: &S::Frame) -> Result<TickOutcome> {
        if self.is_disposed() {
            return Err(AffectError::Disposed);
        }
        if !self.is_initialized() {
            return Err(AffectError::NotInitialized);
        }
        let Some(_flight) = InFlight::acquire(&self.inner.in_flight) else {
            debug!("Previous tick still in flight, skipping");
            return Ok(TickOutcome::Skipped);
        };

        let mut disposed = self.inner.disposed.subscribe();
        let blendshapes = tokio::select! {
            biased;
            _ = disposed.wait_for(|d| *d) => {
                debug!("Session disposed during detection");
                return Ok(TickOutcome::Abandoned);
            }
            detected = self.inner.service.detect(frame) => detected?,
        };

        let mut slot = self.lock_classifier();
        let classifier = match slot.as_mut() {
            Some(classifier) if !self.is_disposed() => classifier,
            _ => return Ok(TickOutcome::Abandoned),
        };
        Ok(match classifier.classify(&blendshapes) {
            FrameOutcome::Classified(result) => TickOutcome::Classified(result),
            FrameOutcome::NoFace => TickOutcome::NoFace,
        })
    }

    /// Tick once per `period` over `frames`, handing every outcome to `sink`.
    ///
    /// Missed ticks are skipped rather than bunched up. Service errors are
    /// logged and counted; the run stops at the end of `frames` or when the
    /// session is disposed.
    pub async fn run<I, F>(&self, frames: I, period: Duration, mut sink: F) -> Result<RunSummary>
    where
        I: IntoIterator<Item = S::Frame>,
        F: FnMut(&TickOutcome),
    {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut disposed = self.inner.disposed.subscribe();
        let mut summary = RunSummary::default();

        for frame in frames {
            tokio::select! {
                biased;
                _ = disposed.wait_for(|d| *d) => break,
                _ = interval.tick() => {}
            }

            summary.ticks += 1;
            match self.tick(&frame).await {
                Ok(outcome) => {
                    summary.record(&outcome);
                    sink(&outcome);
                }
                Err(AffectError::Disposed) => break,
                Err(AffectError::NotInitialized) => return Err(AffectError::NotInitialized),
                Err(e) => {
                    warn!(error = %e, "Detection tick failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            ticks = summary.ticks,
            classified = summary.classified,
            no_face = summary.no_face,
            failed = summary.failed,
            "Detection run finished"
        );
        Ok(summary)
    }

    /// Stop the session: close the service and drop classifier state.
    ///
    /// Safe to call more than once and from any clone.
    pub fn dispose(&self) {
        if self.inner.disposed.send_replace(true) {
            return;
        }
        self.inner.service.close();
        let classifier = self.lock_classifier().take();
        info!(
            frames = classifier.map_or(0, |c| c.frames_classified()),
            "Detection session disposed"
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.lock_classifier().is_some()
    }

    pub fn is_disposed(&self) -> bool {
        *self.inner.disposed.borrow()
    }

    /// Currently reported label, if the session is ready
    pub fn current_emotion(&self) -> Option<EmotionLabel> {
        self.lock_classifier().as_ref().map(|c| c.current_emotion())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn service(&self) -> &S {
        &self.inner.service
    }

    fn lock_classifier(&self) -> MutexGuard<'_, Option<EmotionClassifier>> {
        self.inner
            .classifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: LandmarkService> Drop for SessionInner<S> {
    fn drop(&mut self) {
        self.service.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ReplayLandmarkService;
    use facial_affect_common::Blendshape;

    fn config(init_timeout_ms: u64, calibration_frames: usize) -> SessionConfig {
        let mut config = SessionConfig {
            init_timeout_ms,
            ..Default::default()
        };
        config.classifier.calibration_frames = calibration_frames;
        config
    }

    fn smile() -> Vec<Blendshape> {
        vec![
            Blendshape::new("mouthSmileLeft", 0.9),
            Blendshape::new("cheekSquintLeft", 0.8),
        ]
    }

    #[tokio::test]
    async fn test_initialize_times_out() {
        let service = ReplayLandmarkService::new().with_startup_delay(Duration::from_secs(10));
        let session = DetectionSession::new(service, config(50, 1));

        let err = session.initialize().await.unwrap_err();
        assert!(matches!(
            err,
            AffectError::InitializationTimeout(t) if t == Duration::from_millis(50)
        ));
        assert!(!session.is_initialized());
    }

    #[tokio::test]
    async fn test_initialize_failure_carries_cause() {
        let service = ReplayLandmarkService::new().with_startup_failure("camera unavailable");
        let session = DetectionSession::new(service, SessionConfig::default());

        let err = session.initialize().await.unwrap_err();
        assert!(matches!(err, AffectError::InitializationFailed(c) if c == "camera unavailable"));
    }

    #[tokio::test]
    async fn test_tick_before_initialize() {
        let session = DetectionSession::new(ReplayLandmarkService::new(), SessionConfig::default());
        assert!(matches!(
            session.tick(&smile()).await,
            Err(AffectError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_calibrate_then_classify() {
        let session = DetectionSession::new(ReplayLandmarkService::new(), config(1000, 3));
        session.initialize().await.unwrap();
        session.initialize().await.unwrap();

        let rest: Vec<Blendshape> = vec![Blendshape::new("jawOpen", 0.0)];
        for _ in 0..3 {
            match session.tick(&rest).await.unwrap() {
                TickOutcome::Classified(result) => assert!(result.calibrating),
                other => panic!("unexpected {other:?}"),
            }
        }

        assert_eq!(session.tick(&Vec::new()).await.unwrap(), TickOutcome::NoFace);

        match session.tick(&smile()).await.unwrap() {
            TickOutcome::Classified(result) => {
                assert!(!result.calibrating);
                assert_eq!(result.emotion, EmotionLabel::Happy);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(session.current_emotion(), Some(EmotionLabel::Happy));
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let service = ReplayLandmarkService::new().with_detect_latency(Duration::from_millis(200));
        let session = DetectionSession::new(service, config(1000, 1));
        session.initialize().await.unwrap();

        let frame = smile();
        let (first, second) = tokio::join!(session.tick(&frame), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            session.tick(&frame).await
        });

        assert!(matches!(first.unwrap(), TickOutcome::Classified(_)));
        assert_eq!(second.unwrap(), TickOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_dispose_abandons_in_flight_tick() {
        let service = ReplayLandmarkService::new().with_detect_latency(Duration::from_secs(5));
        let session = DetectionSession::new(service, config(1000, 1));
        session.initialize().await.unwrap();

        let frame = smile();
        let (outcome, _) = tokio::join!(session.tick(&frame), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            session.dispose();
        });

        assert_eq!(outcome.unwrap(), TickOutcome::Abandoned);
        assert!(session.service().is_closed());
        assert!(!session.is_initialized());

        session.dispose();
        assert!(matches!(session.tick(&frame).await, Err(AffectError::Disposed)));
        assert!(matches!(session.initialize().await, Err(AffectError::Disposed)));
    }

    #[tokio::test]
    async fn test_run_counts_outcomes() {
        let session = DetectionSession::new(ReplayLandmarkService::new(), config(1000, 2));
        session.initialize().await.unwrap();

        let frames = vec![smile(), smile(), Vec::new(), smile(), Vec::new()];
        let mut seen = Vec::new();
        let summary = session
            .run(frames, Duration::from_millis(1), |outcome| seen.push(outcome.clone()))
            .await
            .unwrap();

        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.classified, 3);
        assert_eq!(summary.no_face, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[2], TickOutcome::NoFace);
    }

    #[tokio::test]
    async fn test_run_stops_after_dispose() {
        let session = DetectionSession::new(ReplayLandmarkService::new(), config(1000, 1));
        session.initialize().await.unwrap();
        let handle = session.clone();

        let frames = vec![smile(); 10];
        let summary = session
            .run(frames, Duration::from_millis(1), |_| handle.dispose())
            .await
            .unwrap();

        assert_eq!(summary.ticks, 1);
        assert!(session.is_disposed());
    }
}
