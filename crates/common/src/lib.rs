/// Common types for facial-affect classification
pub mod action;
pub mod emotion;
pub mod error;

use serde::{Deserialize, Serialize};

pub use action::{Blendshape, FacialAction, FeatureVector};
pub use emotion::{EmotionLabel, EmotionScores, ProbabilityVector};
pub use error::{AffectError, Result};

/// Classification reported for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Currently reported (dominant) emotion
    pub emotion: EmotionLabel,
    /// Smoothed probability of `emotion` (0.0 - 1.0)
    pub confidence: f32,
    /// Smoothed probability of every label, summing to 1
    pub all_scores: ProbabilityVector,
    /// Set while the personal baseline is still being collected
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub calibrating: bool,
}

impl ClassificationResult {
    /// Fixed near-neutral result returned during calibration.
    ///
    /// `neutral` carries `confidence`; the remainder is split evenly across
    /// the other labels so `all_scores` still sums to 1.
    #[must_use]
    pub fn calibration_placeholder(confidence: f32) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        let rest = (1.0 - confidence) / (EmotionLabel::COUNT - 1) as f32;
        let all_scores = EmotionScores::from_fn(|label| {
            if label == EmotionLabel::Neutral {
                confidence
            } else {
                rest
            }
        });
        Self {
            emotion: EmotionLabel::Neutral,
            confidence,
            all_scores,
            calibrating: true,
        }
    }
}
