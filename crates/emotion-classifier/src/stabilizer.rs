//! Temporal smoothing of per-frame distributions

use crate::config::SmoothingStrategy;
use facial_affect_common::{EmotionScores, ProbabilityVector};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
enum State {
    Ema {
        blend: f32,
        smoothed: Option<ProbabilityVector>,
    },
    Window {
        size: usize,
        frames: VecDeque<ProbabilityVector>,
    },
}

/// Running average of normalized distributions across frames.
///
/// The first update seeds the state directly from its input so there is no
/// startup bias toward any label. Both strategies take convex combinations
/// of probability vectors, so the output still sums to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalStabilizer {
    state: State,
}

impl TemporalStabilizer {
    #[must_use]
    pub fn new(strategy: SmoothingStrategy) -> Self {
        let state = match strategy {
            SmoothingStrategy::Ema { blend } => State::Ema {
                blend,
                smoothed: None,
            },
            SmoothingStrategy::SlidingWindow { size } => State::Window {
                size: size.max(1),
                frames: VecDeque::with_capacity(size.max(1)),
            },
        };
        Self { state }
    }

    /// Fold one frame in and return the smoothed distribution
    pub fn update(&mut self, current: &ProbabilityVector) -> ProbabilityVector {
        match &mut self.state {
            State::Ema { blend, smoothed } => {
                let next = match smoothed {
                    None => *current,
                    Some(prev) => EmotionScores::from_fn(|label| {
                        *blend * current[label] + (1.0 - *blend) * prev[label]
                    }),
                };
                *smoothed = Some(next);
                next
            }
            State::Window { size, frames } => {
                if frames.len() == *size {
                    frames.pop_front();
                }
                frames.push_back(*current);
                let n = frames.len() as f32;
                EmotionScores::from_fn(|label| frames.iter().map(|f| f[label]).sum::<f32>() / n)
            }
        }
    }

    /// Latest smoothed distribution, `None` before the first update
    #[must_use]
    pub fn current(&self) -> Option<ProbabilityVector> {
        match &self.state {
            State::Ema { smoothed, .. } => *smoothed,
            State::Window { frames, .. } if frames.is_empty() => None,
            State::Window { frames, .. } => {
                let n = frames.len() as f32;
                Some(EmotionScores::from_fn(|label| {
                    frames.iter().map(|f| f[label]).sum::<f32>() / n
                }))
            }
        }
    }
}
