//! Hysteresis selection of the reported emotion

use crate::config::{HysteresisConfig, MarginMode};
use facial_affect_common::{EmotionLabel, ProbabilityVector};
use tracing::debug;

impl HysteresisConfig {
    /// Whether `challenger` beats `incumbent` by the configured margin
    #[must_use]
    pub fn clears_margin(&self, challenger: f32, incumbent: f32) -> bool {
        let by_ratio = challenger > incumbent * self.ratio;
        match self.mode {
            MarginMode::RatioOnly => by_ratio,
            MarginMode::RatioOrOffset => by_ratio || challenger > incumbent + self.offset,
        }
    }

    /// Pick the label to report given the previous one.
    ///
    /// The previous label is kept unless another label clears the margin
    /// over it; among labels that do, the most probable wins.
    #[must_use]
    pub fn select(&self, smoothed: &ProbabilityVector, previous: EmotionLabel) -> EmotionLabel {
        let incumbent = smoothed[previous];
        smoothed
            .iter()
            .filter(|&(label, score)| label != previous && self.clears_margin(score, incumbent))
            .fold(None, |best: Option<(EmotionLabel, f32)>, (label, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((label, score)),
            })
            .map_or(previous, |(label, _)| label)
    }
}

/// Stateful dominant-label selector; starts at `neutral`
#[derive(Debug, Clone, PartialEq)]
pub struct DominantLabelSelector {
    hysteresis: HysteresisConfig,
    last_dominant: EmotionLabel,
}

impl DominantLabelSelector {
    #[must_use]
    pub fn new(hysteresis: HysteresisConfig) -> Self {
        Self {
            hysteresis,
            last_dominant: EmotionLabel::Neutral,
        }
    }

    /// Apply the switch rule to a new smoothed distribution
    pub fn select(&mut self, smoothed: &ProbabilityVector) -> EmotionLabel {
        let next = self.hysteresis.select(smoothed, self.last_dominant);
        if next != self.last_dominant {
            debug!(from = %self.last_dominant, to = %next, "Dominant emotion switched");
            self.last_dominant = next;
        }
        next
    }

    /// Currently reported label
    #[must_use]
    pub fn current(&self) -> EmotionLabel {
        self.last_dominant
    }
}
