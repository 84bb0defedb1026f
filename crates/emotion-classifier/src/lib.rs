//! Real-time facial emotion classification from blendshape scores.
//!
//! Classifies each camera frame into one of six emotions:
//! - Neutral
//! - Happy
//! - Sad
//! - Angry
//! - Surprised
//! - Fear
//!
//! Pipeline per frame: personal baseline calibration (first K frames),
//! weighted action scoring, sharpened softmax, temporal smoothing and
//! hysteresis label selection. [`DetectionSession`] wraps a
//! [`LandmarkService`] with startup timeout, tick overlap and disposal
//! handling.
//!
//! ```no_run
//! use facial_affect_classifier::{EmotionClassifier, FrameOutcome};
//! use facial_affect_common::Blendshape;
//!
//! let mut classifier = EmotionClassifier::default();
//! let frame = vec![Blendshape::new("mouthSmileLeft", 0.9)];
//! if let FrameOutcome::Classified(result) = classifier.classify(&frame) {
//!     println!("{} ({:.2})", result.emotion, result.confidence);
//! }
//! ```

pub mod aggregate;
pub mod calibration;
pub mod classifier;
pub mod config;
pub mod normalize;
pub mod scorer;
pub mod selector;
pub mod service;
pub mod session;
pub mod stabilizer;

pub use aggregate::{FaceLost, MoodAggregator, MoodReading, NoFaceMonitor};
pub use calibration::{Baseline, BaselineCalibrator, CalibrationStatus};
pub use classifier::{EmotionClassifier, FrameOutcome};
pub use config::{
    ClassifierConfig, ConfigError, HysteresisConfig, MarginMode, SessionConfig,
    SmoothingStrategy,
};
pub use normalize::normalize;
pub use scorer::EmotionScorer;
pub use selector::DominantLabelSelector;
pub use service::{load_jsonl, parse_jsonl, LandmarkService, ReplayLandmarkService};
pub use session::{DetectionSession, RunSummary, TickOutcome};
pub use stabilizer::TemporalStabilizer;
