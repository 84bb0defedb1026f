//! Temperature-sharpened softmax over raw emotion scores

use facial_affect_common::{EmotionScores, ProbabilityVector};

/// Map raw scores to a distribution summing to 1.
///
/// `sharpness` scales the gap to the top score before exponentiation; larger
/// values let the leading emotion dominate more decisively. Non-finite raw
/// values are treated as 0. All-equal input yields a uniform distribution.
#[must_use]
pub fn normalize(raw: &EmotionScores, sharpness: f32) -> ProbabilityVector {
    let values = raw.as_array().map(|v| if v.is_finite() { v } else { 0.0 });
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let exps = values.map(|v| ((v - max) * sharpness).exp());
    // The max entry contributes exp(0) = 1, so the sum is at least 1.
    let sum: f32 = exps.iter().sum();

    EmotionScores::from_array(exps.map(|e| e / sum))
}
