//! Integration tests for the emotion classifier

use facial_affect_classifier::{
    ClassifierConfig, EmotionClassifier, FrameOutcome, HysteresisConfig, MoodAggregator,
    SmoothingStrategy,
};
use facial_affect_common::{Blendshape, EmotionLabel, EmotionScores, FacialAction, FeatureVector};

fn frame(pairs: &[(&str, f32)]) -> Vec<Blendshape> {
    pairs
        .iter()
        .map(|&(name, score)| Blendshape::new(name, score))
        .collect()
}

/// Calibrate against a resting face so the baseline is all zeros
fn calibrated(config: ClassifierConfig) -> EmotionClassifier {
    let mut classifier = EmotionClassifier::new(config).unwrap();
    let rest = frame(&[("jawOpen", 0.0)]);
    while !classifier.is_calibrated() {
        classifier.classify(&rest);
    }
    classifier
}

fn classified(outcome: FrameOutcome) -> facial_affect_common::ClassificationResult {
    match outcome {
        FrameOutcome::Classified(result) => result,
        FrameOutcome::NoFace => panic!("expected a classification"),
    }
}

#[test]
fn test_placeholder_during_calibration() {
    let mut classifier = EmotionClassifier::default();
    let inputs = [
        frame(&[("mouthSmileLeft", 1.0), ("mouthSmileRight", 1.0)]),
        frame(&[("browDownLeft", 0.9), ("noseSneerLeft", 0.8)]),
        frame(&[("eyeWideLeft", 1.0), ("jawOpen", 1.0)]),
    ];

    for i in 0..10 {
        let result = classified(classifier.classify(&inputs[i % inputs.len()]));
        assert_eq!(result.emotion, EmotionLabel::Neutral);
        assert_eq!(result.confidence, 0.35);
        assert!((result.all_scores.sum() - 1.0).abs() < 1e-6);
    }

    let result = classified(classifier.classify(&inputs[0]));
    assert!(!result.calibrating);
}

#[test]
fn test_smile_classified_happy() {
    let mut classifier = calibrated(ClassifierConfig::default());
    let result = classified(
        classifier.classify(&frame(&[("mouthSmileLeft", 0.9), ("cheekSquintLeft", 0.8)])),
    );
    assert_eq!(result.emotion, EmotionLabel::Happy);
    assert!(result.confidence > 0.5);
    for label in EmotionLabel::ALL {
        assert!(result.all_scores[label] >= 0.0);
    }
}

#[test]
fn test_hysteresis_holds_and_switches() {
    let config = HysteresisConfig::default();
    let scores = |neutral: f32, happy: f32| {
        let rest = (1.0 - neutral - happy) / 4.0;
        EmotionScores::from_array([neutral, happy, rest, rest, rest, rest])
    };

    // Neutral 5% above happy
    assert_eq!(
        config.select(&scores(0.42, 0.40), EmotionLabel::Happy),
        EmotionLabel::Happy
    );
    // Neutral 20% above happy
    assert_eq!(
        config.select(&scores(0.48, 0.40), EmotionLabel::Happy),
        EmotionLabel::Neutral
    );
}

#[test]
fn test_borderline_neutral_lead_respects_switch_margin() {
    let mut classifier = calibrated(ClassifierConfig::default());
    let result = classified(classifier.classify(&frame(&[("mouthSmileLeft", 0.9)])));
    assert_eq!(result.emotion, EmotionLabel::Happy);

    // A fading smile settles with neutral ahead of happy by about 10%
    let fading = frame(&[("mouthSmileLeft", 0.39)]);
    let mut last = None;
    for _ in 0..15 {
        let result = classified(classifier.classify(&fading));
        assert_eq!(result.emotion, EmotionLabel::Happy);
        last = Some(result);
    }
    let scores = last.unwrap().all_scores;
    let (neutral, happy) = (scores[EmotionLabel::Neutral], scores[EmotionLabel::Happy]);
    assert!(neutral > happy, "neutral {neutral} happy {happy}");
    assert!(neutral < happy * 1.15, "neutral {neutral} happy {happy}");

    // Slightly weaker and the lead clears the ratio margin
    let fainter = frame(&[("mouthSmileLeft", 0.38)]);
    let mut result = None;
    for _ in 0..20 {
        result = Some(classified(classifier.classify(&fainter)));
    }
    let result = result.unwrap();
    assert_eq!(result.emotion, EmotionLabel::Neutral);
    let scores = result.all_scores;
    assert!(scores[EmotionLabel::Neutral] > scores[EmotionLabel::Happy] * 1.15);
}

#[test]
fn test_repeated_frame_converges_to_instant_distribution() {
    for smoothing in [
        SmoothingStrategy::Ema { blend: 0.7 },
        SmoothingStrategy::SlidingWindow { size: 5 },
    ] {
        let mut classifier = calibrated(ClassifierConfig {
            smoothing,
            ..Default::default()
        });
        classifier.classify(&frame(&[("browDownLeft", 0.9), ("browDownRight", 0.9)]));

        let input = frame(&[("mouthFrownLeft", 0.7), ("browInnerUp", 0.6)]);
        let target = classifier.instant_distribution(&FeatureVector::from_blendshapes(&input));

        let mut result = None;
        for _ in 0..smoothing.settling_frames() {
            result = Some(classified(classifier.classify(&input)));
        }
        let smoothed = result.unwrap().all_scores;
        for label in EmotionLabel::ALL {
            assert!(
                (smoothed[label] - target[label]).abs() < 1e-3,
                "{smoothing:?} {label}: {} vs {}",
                smoothed[label],
                target[label]
            );
        }
    }
}

#[test]
fn test_no_face_leaves_state_unchanged() {
    let mut classifier = calibrated(ClassifierConfig::default());
    classifier.classify(&frame(&[("mouthSmileLeft", 0.9)]));
    let before = classifier.clone();

    assert_eq!(classifier.classify(&[]), FrameOutcome::NoFace);
    assert_eq!(classifier.smoothed(), before.smoothed());
    assert_eq!(classifier.current_emotion(), before.current_emotion());
    assert_eq!(classifier.frames_classified(), before.frames_classified());
}

#[test]
fn test_surprise_and_fear_disambiguation() {
    let mut classifier = calibrated(ClassifierConfig::default());
    let surprised = classified(classifier.classify(&frame(&[
        ("eyeWideLeft", 0.6),
        ("eyeWideRight", 0.6),
        ("browInnerUp", 0.5),
        ("jawOpen", 0.5),
        ("mouthStretchLeft", 0.05),
        ("mouthStretchRight", 0.05),
    ])));
    assert_eq!(surprised.emotion, EmotionLabel::Surprised);

    let mut classifier = calibrated(ClassifierConfig::default());
    let fear = classified(classifier.classify(&frame(&[
        ("eyeWideLeft", 0.6),
        ("eyeWideRight", 0.6),
        ("browInnerUp", 0.5),
        ("jawOpen", 0.05),
        ("mouthStretchLeft", 0.5),
        ("mouthStretchRight", 0.5),
    ])));
    assert_eq!(fear.emotion, EmotionLabel::Fear);
}

#[test]
fn test_resting_expression_is_absorbed_by_baseline() {
    let mut classifier = EmotionClassifier::default();
    let resting_frown = frame(&[("browDownLeft", 0.5), ("browDownRight", 0.5)]);
    while !classifier.is_calibrated() {
        classifier.classify(&resting_frown);
    }

    let result = classified(classifier.classify(&resting_frown));
    assert_eq!(result.emotion, EmotionLabel::Neutral);
}

#[test]
fn test_unknown_names_are_ignored() {
    let mut classifier = calibrated(ClassifierConfig::default());
    let result = classified(classifier.classify(&frame(&[("notAnAction", 1.0)])));
    assert_eq!(result.emotion, EmotionLabel::Neutral);
    assert_eq!(FacialAction::from_name("notAnAction"), None);
}

#[test]
fn test_mood_from_classified_stream() {
    let mut classifier = calibrated(ClassifierConfig::default());
    let mut aggregator = MoodAggregator::new(4);
    let smile = frame(&[("mouthSmileLeft", 0.9), ("cheekSquintLeft", 0.8)]);

    let mut reading = None;
    for _ in 0..4 {
        let result = classified(classifier.classify(&smile));
        reading = aggregator.push(result.emotion);
    }
    let reading = reading.unwrap();
    assert_eq!(reading.emotion, EmotionLabel::Happy);
    assert_eq!(reading.confidence, 1.0);
}
