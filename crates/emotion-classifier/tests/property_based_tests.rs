//! Property-Based Tests
//!
//! Invariants that must hold for arbitrary scores and frames:
//! - Normalized distributions are non-negative and sum to 1
//! - Smoothed distributions stay on the simplex
//! - Classification confidence matches the reported label's score

use facial_affect_classifier::{
    normalize, ClassifierConfig, EmotionClassifier, FrameOutcome, SmoothingStrategy,
    TemporalStabilizer,
};
use facial_affect_common::{Blendshape, EmotionScores, FacialAction};
use proptest::prelude::*;

fn blendshape_frame() -> impl Strategy<Value = Vec<Blendshape>> {
    prop::collection::vec((0..FacialAction::COUNT, 0.0f32..=1.0), 1..24).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(i, score)| Blendshape::new(FacialAction::ALL[i].name(), score))
            .collect()
    })
}

/// Property: softmax output is a probability distribution
#[test]
fn proptest_normalize_sums_to_one() {
    proptest!(|(raw in prop::array::uniform6(-50.0f32..50.0), sharpness in 0.1f32..20.0)| {
        let probs = normalize(&EmotionScores::from_array(raw), sharpness);
        prop_assert!((probs.sum() - 1.0).abs() < 1e-6, "sum was {}", probs.sum());
        for (_, p) in probs.iter() {
            prop_assert!((0.0..=1.0).contains(&p));
        }
    });
}

/// Property: smoothing never leaves the simplex
#[test]
fn proptest_stabilizer_preserves_distribution() {
    proptest!(|(frames in prop::collection::vec(prop::array::uniform6(0.0f32..5.0), 1..30),
                blend in 0.05f32..=1.0,
                size in 1usize..8)| {
        for strategy in [SmoothingStrategy::Ema { blend }, SmoothingStrategy::SlidingWindow { size }] {
            let mut stabilizer = TemporalStabilizer::new(strategy);
            for raw in &frames {
                let smoothed = stabilizer.update(&normalize(&EmotionScores::from_array(*raw), 5.0));
                prop_assert!((smoothed.sum() - 1.0).abs() < 1e-5);
            }
        }
    });
}

/// Property: every classified frame reports a consistent distribution
#[test]
fn proptest_classifier_output_consistent() {
    proptest!(|(frames in prop::collection::vec(blendshape_frame(), 1..20))| {
        let mut classifier = EmotionClassifier::new(ClassifierConfig {
            calibration_frames: 3,
            ..Default::default()
        })
        .unwrap();

        for frame in &frames {
            match classifier.classify(frame) {
                FrameOutcome::Classified(result) => {
                    prop_assert!((result.all_scores.sum() - 1.0).abs() < 1e-5);
                    prop_assert!((0.0..=1.0).contains(&result.confidence));
                    prop_assert_eq!(result.confidence, result.all_scores[result.emotion]);
                }
                FrameOutcome::NoFace => prop_assert!(false, "frames are never empty"),
            }
        }
    });
}
