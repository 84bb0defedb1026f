//! Per-session classifier facade
//!
//! Owns the calibrator, scorer, stabilizer and selector for one detection
//! session. All steps are synchronous; the async boundary lives in
//! [`crate::session`].

use crate::calibration::{Baseline, BaselineCalibrator, CalibrationStatus};
use crate::config::{ClassifierConfig, ConfigError};
use crate::normalize::normalize;
use crate::scorer::EmotionScorer;
use crate::selector::DominantLabelSelector;
use crate::stabilizer::TemporalStabilizer;
use facial_affect_common::{
    Blendshape, ClassificationResult, EmotionLabel, FeatureVector, ProbabilityVector,
};
use tracing::debug;

/// Result of feeding one frame to the classifier
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// A face was present; placeholder during calibration
    Classified(ClassificationResult),
    /// The service reported no face; no state was touched
    NoFace,
}

impl FrameOutcome {
    #[must_use]
    pub fn result(&self) -> Option<&ClassificationResult> {
        match self {
            FrameOutcome::Classified(result) => Some(result),
            FrameOutcome::NoFace => None,
        }
    }
}

/// Stateful emotion classifier for one detection session
#[derive(Debug, Clone)]
pub struct EmotionClassifier {
    config: ClassifierConfig,
    calibrator: BaselineCalibrator,
    scorer: EmotionScorer,
    stabilizer: TemporalStabilizer,
    selector: DominantLabelSelector,
    frames_classified: u64,
}

impl Default for EmotionClassifier {
    fn default() -> Self {
        Self::build(ClassifierConfig::default())
    }
}

impl EmotionClassifier {
    /// Create a classifier, rejecting invalid configuration
    pub fn new(config: ClassifierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ClassifierConfig) -> Self {
        Self {
            calibrator: BaselineCalibrator::new(config.calibration_frames),
            scorer: EmotionScorer::new(&config),
            stabilizer: TemporalStabilizer::new(config.smoothing),
            selector: DominantLabelSelector::new(config.hysteresis),
            frames_classified: 0,
            config,
        }
    }

    /// Classify the service's `{name, score}` list for one frame.
    ///
    /// An empty list means no face and leaves all state untouched.
    pub fn classify(&mut self, blendshapes: &[Blendshape]) -> FrameOutcome {
        if blendshapes.is_empty() {
            debug!("No face in frame");
            return FrameOutcome::NoFace;
        }
        FrameOutcome::Classified(self.classify_features(&FeatureVector::from_blendshapes(
            blendshapes,
        )))
    }

    /// Classify an already-resolved feature vector (face assumed present)
    pub fn classify_features(&mut self, features: &FeatureVector) -> ClassificationResult {
        let baseline = match self.calibrator.baseline() {
            Some(baseline) => *baseline,
            None => {
                self.calibrator.observe(features);
                return ClassificationResult::calibration_placeholder(
                    self.config.placeholder_confidence,
                );
            }
        };

        let raw = self.scorer.score(features, &baseline);
        let probabilities = normalize(&raw, self.config.softmax_sharpness);
        let smoothed = self.stabilizer.update(&probabilities);
        let emotion = self.selector.select(&smoothed);
        self.frames_classified += 1;

        debug!(
            %emotion,
            confidence = smoothed[emotion],
            frame = self.frames_classified,
            "Frame classified"
        );

        ClassificationResult {
            emotion,
            confidence: smoothed[emotion],
            all_scores: smoothed,
            calibrating: false,
        }
    }

    #[must_use]
    pub fn calibration_status(&self) -> CalibrationStatus {
        self.calibrator.status()
    }

    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_complete()
    }

    #[must_use]
    pub fn baseline(&self) -> Option<&Baseline> {
        self.calibrator.baseline()
    }

    /// Currently reported label (`neutral` until something clears the margin)
    #[must_use]
    pub fn current_emotion(&self) -> EmotionLabel {
        self.selector.current()
    }

    /// Latest smoothed distribution, `None` until the first post-calibration frame
    #[must_use]
    pub fn smoothed(&self) -> Option<ProbabilityVector> {
        self.stabilizer.current()
    }

    /// Unsmoothed distribution for one frame under the current baseline
    #[must_use]
    pub fn instant_distribution(&self, features: &FeatureVector) -> ProbabilityVector {
        let baseline = self.baseline().copied().unwrap_or_default();
        normalize(
            &self.scorer.score(features, &baseline),
            self.config.softmax_sharpness,
        )
    }

    /// Frames classified after calibration
    #[must_use]
    pub fn frames_classified(&self) -> u64 {
        self.frames_classified
    }

    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}
