//! Raw per-emotion scores from baseline-adjusted facial actions
//!
//! No single action reliably signals an emotion, so each score is a weighted
//! combination of grouped actions. Surprise and fear share eye-widening and
//! brow-raising cues; a tie-break on jaw opening vs. mouth stretch separates
//! them. Neutral is scored inversely to the strongest competitor so a calm
//! face is not outvoted by small noise elsewhere.

use crate::calibration::Baseline;
use crate::config::{ClassifierConfig, DisambiguationConfig, EmotionWeights, NeutralConfig};
use facial_affect_common::FacialAction::*;
use facial_affect_common::{EmotionLabel, EmotionScores, FacialAction, FeatureVector};
use tracing::trace;

/// Turns feature vectors into raw emotion scores
#[derive(Debug, Clone)]
pub struct EmotionScorer {
    damping: f32,
    weights: EmotionWeights,
    disambiguation: DisambiguationConfig,
    neutral: NeutralConfig,
}

impl EmotionScorer {
    #[must_use]
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            damping: config.baseline_damping,
            weights: config.weights,
            disambiguation: config.disambiguation,
            neutral: config.neutral,
        }
    }

    /// Subtract a damped baseline from every action, flooring at 0
    #[must_use]
    pub fn adjust(&self, vector: &FeatureVector, baseline: &Baseline) -> FeatureVector {
        let mut adjusted = FeatureVector::zeros();
        for (action, score) in vector.iter() {
            adjusted.set(action, (score - self.damping * baseline.get(action)).max(0.0));
        }
        adjusted
    }

    /// Raw (unnormalized, non-negative) score for every emotion
    #[must_use]
    pub fn score(&self, vector: &FeatureVector, baseline: &Baseline) -> EmotionScores {
        let s = self.adjust(vector, baseline);
        let w = &self.weights;

        let eye_squint = s.mean_of(&[EyeSquintLeft, EyeSquintRight]);
        let brow_down = s.mean_of(&[BrowDownLeft, BrowDownRight]);
        let stretch = s.mean_of(&[MouthStretchLeft, MouthStretchRight]);
        let eye_wide = s.mean_of(&[EyeWideLeft, EyeWideRight]);
        let brow_inner_up = s[BrowInnerUp];
        let jaw_open = s[JawOpen];

        let mut raw = EmotionScores::zeros();

        raw[EmotionLabel::Happy] = w.happy.smile * s.max_of(MouthSmileLeft, MouthSmileRight)
            + w.happy.cheek_squint * s.mean_of(&[CheekSquintLeft, CheekSquintRight])
            + w.happy.dimple * s.mean_of(&[MouthDimpleLeft, MouthDimpleRight])
            - w.happy.stretch_penalty * stretch;

        raw[EmotionLabel::Sad] = w.sad.frown * s.max_of(MouthFrownLeft, MouthFrownRight)
            + w.sad.brow_inner_up * brow_inner_up
            + w.sad.brow_down * brow_down
            + w.sad.shrug * s.mean_of(&[MouthShrugLower, MouthShrugUpper])
            + w.sad.chin_raise * chin_raise(&s)
            + w.sad.eye_squint * eye_squint;

        raw[EmotionLabel::Angry] = w.angry.brow_down * brow_down
            + w.angry.eye_squint * eye_squint
            + w.angry.mouth_press * s.mean_of(&[MouthPressLeft, MouthPressRight])
            + w.angry.nose_sneer * s.mean_of(&[NoseSneerLeft, NoseSneerRight])
            + w.angry.mouth_pucker * s[MouthPucker]
            + w.angry.eye_look_down * s.mean_of(&[EyeLookDownLeft, EyeLookDownRight]);

        raw[EmotionLabel::Surprised] = w.surprised.eye_wide * eye_wide
            + w.surprised.brow_raise * s.mean_of(&[BrowInnerUp, BrowOuterUpLeft, BrowOuterUpRight])
            + w.surprised.jaw_open * jaw_open;

        raw[EmotionLabel::Fear] = w.fear.eye_wide * eye_wide
            + w.fear.brow_inner_up * brow_inner_up
            + w.fear.mouth_stretch * stretch;

        self.disambiguate(&mut raw, jaw_open, stretch);

        for label in EmotionLabel::ALL {
            raw[label] = raw[label].max(0.0);
        }

        let strongest = raw.max_excluding(EmotionLabel::Neutral);
        raw[EmotionLabel::Neutral] = self.neutral.bias / (1.0 + self.neutral.falloff * strongest);

        trace!(?raw, "Raw emotion scores");
        raw
    }

    /// Surprise vs. fear tie-break on jaw opening and mouth stretch
    fn disambiguate(&self, raw: &mut EmotionScores, jaw_open: f32, stretch: f32) {
        let d = &self.disambiguation;
        if raw[EmotionLabel::Surprised] <= d.surprised_threshold
            || raw[EmotionLabel::Fear] <= d.fear_threshold
        {
            return;
        }

        if jaw_open > d.jaw_open_min && stretch < d.stretch_max_for_surprise {
            raw[EmotionLabel::Surprised] += d.surprise_boost;
            raw[EmotionLabel::Fear] -= d.surprise_fear_penalty;
        } else if stretch > d.stretch_min_for_fear {
            raw[EmotionLabel::Fear] += d.fear_boost;
            raw[EmotionLabel::Surprised] -= d.fear_surprise_penalty;
        }
    }
}

/// Lower-lip depression: left side if active, otherwise right side
fn chin_raise(s: &FeatureVector) -> f32 {
    let left = s[FacialAction::MouthLowerDownLeft];
    if left > 0.0 {
        left
    } else {
        s[FacialAction::MouthLowerDownRight]
    }
}
