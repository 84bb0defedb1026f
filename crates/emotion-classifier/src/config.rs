//! Tunable constants for the classifier pipeline
//!
//! Every heuristic number used by scoring, smoothing and label selection
//! lives here so it can be recalibrated from YAML without touching the
//! algorithms. Missing YAML fields fall back to the defaults below.

use facial_affect_common::AffectError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("calibration_frames must be at least 1")]
    EmptyCalibrationWindow,
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("sliding window size must be at least 1")]
    EmptySmoothingWindow,
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

impl From<ConfigError> for AffectError {
    fn from(err: ConfigError) -> Self {
        AffectError::Config(err.to_string())
    }
}

/// Classifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Frames averaged into the personal baseline (K)
    pub calibration_frames: usize,
    /// Fraction of the baseline subtracted from each action score (alpha)
    pub baseline_damping: f32,
    /// Softmax sharpening factor
    pub softmax_sharpness: f32,
    /// Neutral confidence reported while calibrating
    pub placeholder_confidence: f32,
    /// Temporal smoothing strategy
    pub smoothing: SmoothingStrategy,
    /// Label switching margins
    pub hysteresis: HysteresisConfig,
    /// Neutral score shaping
    pub neutral: NeutralConfig,
    /// Surprise/fear tie-breaking
    pub disambiguation: DisambiguationConfig,
    /// Per-emotion action weights
    pub weights: EmotionWeights,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            calibration_frames: 10,
            baseline_damping: 0.8,
            softmax_sharpness: 5.0,
            placeholder_confidence: 0.35,
            smoothing: SmoothingStrategy::default(),
            hysteresis: HysteresisConfig::default(),
            neutral: NeutralConfig::default(),
            disambiguation: DisambiguationConfig::default(),
            weights: EmotionWeights::default(),
        }
    }
}

impl ClassifierConfig {
    /// Parse from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AffectError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, AffectError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String, AffectError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calibration_frames == 0 {
            return Err(ConfigError::EmptyCalibrationWindow);
        }
        check_range("baseline_damping", self.baseline_damping, 0.0, 1.0)?;
        check_range("softmax_sharpness", self.softmax_sharpness, f32::EPSILON, 100.0)?;
        check_range(
            "placeholder_confidence",
            self.placeholder_confidence,
            0.0,
            1.0,
        )?;
        match self.smoothing {
            SmoothingStrategy::Ema { blend } => {
                check_range("smoothing.blend", blend, f32::EPSILON, 1.0)?;
            }
            SmoothingStrategy::SlidingWindow { size } => {
                if size == 0 {
                    return Err(ConfigError::EmptySmoothingWindow);
                }
            }
        }
        check_range("hysteresis.ratio", self.hysteresis.ratio, 1.0, 10.0)?;
        check_range("hysteresis.offset", self.hysteresis.offset, 0.0, 1.0)?;
        check_range("neutral.bias", self.neutral.bias, 0.0, 10.0)?;
        check_range("neutral.falloff", self.neutral.falloff, 0.0, 100.0)?;
        Ok(())
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

/// How per-frame distributions are averaged over time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SmoothingStrategy {
    /// `smoothed = blend * current + (1 - blend) * previous`
    Ema {
        #[serde(default = "default_blend")]
        blend: f32,
    },
    /// Plain mean of the last `size` distributions
    SlidingWindow {
        #[serde(default = "default_window")]
        size: usize,
    },
}

fn default_blend() -> f32 {
    0.7
}

fn default_window() -> usize {
    6
}

impl Default for SmoothingStrategy {
    fn default() -> Self {
        SmoothingStrategy::Ema {
            blend: default_blend(),
        }
    }
}

impl SmoothingStrategy {
    /// Frames of identical input after which the smoothed output has settled
    #[must_use]
    pub fn settling_frames(&self) -> usize {
        match *self {
            // Residual shrinks by (1 - blend) per frame; 1e-3 is the target.
            SmoothingStrategy::Ema { blend } => {
                let decay = 1.0 - blend;
                if decay <= f32::EPSILON {
                    1
                } else {
                    (1e-3f32.ln() / decay.ln()).ceil().max(1.0) as usize
                }
            }
            SmoothingStrategy::SlidingWindow { size } => size.max(1),
        }
    }
}

/// Which margin rule lets a challenger replace the current label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarginMode {
    /// Challenger must beat `score * ratio` or `score + offset`
    #[default]
    RatioOrOffset,
    /// Challenger must beat `score * ratio`
    RatioOnly,
}

/// Hysteresis margins for the dominant-label selector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    pub mode: MarginMode,
    pub ratio: f32,
    pub offset: f32,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            mode: MarginMode::RatioOrOffset,
            ratio: 1.15,
            offset: 0.15,
        }
    }
}

/// Neutral raw score: `bias / (1 + falloff * strongest_other)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutralConfig {
    pub bias: f32,
    pub falloff: f32,
}

impl Default for NeutralConfig {
    fn default() -> Self {
        Self {
            bias: 0.5,
            falloff: 1.0,
        }
    }
}

/// Thresholds and adjustments separating surprise from fear
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisambiguationConfig {
    /// Rule applies only when surprised exceeds this
    pub surprised_threshold: f32,
    /// ...and fear exceeds this
    pub fear_threshold: f32,
    /// Jaw opening above this (with a slack mouth) reads as surprise
    pub jaw_open_min: f32,
    /// Mouth stretch must stay below this for the surprise branch
    pub stretch_max_for_surprise: f32,
    /// Mouth stretch above this reads as fear
    pub stretch_min_for_fear: f32,
    pub surprise_boost: f32,
    pub surprise_fear_penalty: f32,
    pub fear_boost: f32,
    pub fear_surprise_penalty: f32,
}

impl Default for DisambiguationConfig {
    fn default() -> Self {
        Self {
            surprised_threshold: 0.3,
            fear_threshold: 0.2,
            jaw_open_min: 0.3,
            stretch_max_for_surprise: 0.2,
            stretch_min_for_fear: 0.3,
            surprise_boost: 0.2,
            surprise_fear_penalty: 0.1,
            fear_boost: 0.25,
            fear_surprise_penalty: 0.15,
        }
    }
}

/// Per-emotion linear weights over grouped facial actions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmotionWeights {
    pub happy: HappyWeights,
    pub sad: SadWeights,
    pub angry: AngryWeights,
    pub surprised: SurprisedWeights,
    pub fear: FearWeights,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HappyWeights {
    /// max(mouthSmileLeft, mouthSmileRight)
    pub smile: f32,
    /// avg(cheekSquintLeft, cheekSquintRight)
    pub cheek_squint: f32,
    /// avg(mouthDimpleLeft, mouthDimpleRight)
    pub dimple: f32,
    /// avg(mouthStretchLeft, mouthStretchRight), subtracted
    pub stretch_penalty: f32,
}

impl Default for HappyWeights {
    fn default() -> Self {
        Self {
            smile: 0.9,
            cheek_squint: 0.4,
            dimple: 0.2,
            stretch_penalty: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SadWeights {
    /// max(mouthFrownLeft, mouthFrownRight)
    pub frown: f32,
    pub brow_inner_up: f32,
    /// avg(browDownLeft, browDownRight)
    pub brow_down: f32,
    /// avg(mouthShrugLower, mouthShrugUpper)
    pub shrug: f32,
    /// mouthLowerDownLeft, falling back to mouthLowerDownRight
    pub chin_raise: f32,
    /// avg(eyeSquintLeft, eyeSquintRight)
    pub eye_squint: f32,
}

impl Default for SadWeights {
    fn default() -> Self {
        Self {
            frown: 0.7,
            brow_inner_up: 0.6,
            brow_down: 0.3,
            shrug: 0.4,
            chin_raise: 0.3,
            eye_squint: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngryWeights {
    /// avg(browDownLeft, browDownRight)
    pub brow_down: f32,
    /// avg(eyeSquintLeft, eyeSquintRight)
    pub eye_squint: f32,
    /// avg(mouthPressLeft, mouthPressRight)
    pub mouth_press: f32,
    /// avg(noseSneerLeft, noseSneerRight)
    pub nose_sneer: f32,
    pub mouth_pucker: f32,
    /// avg(eyeLookDownLeft, eyeLookDownRight)
    pub eye_look_down: f32,
}

impl Default for AngryWeights {
    fn default() -> Self {
        Self {
            brow_down: 1.0,
            eye_squint: 0.3,
            mouth_press: 0.5,
            nose_sneer: 0.5,
            mouth_pucker: 0.3,
            eye_look_down: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurprisedWeights {
    /// avg(eyeWideLeft, eyeWideRight)
    pub eye_wide: f32,
    /// avg(browInnerUp, browOuterUpLeft, browOuterUpRight)
    pub brow_raise: f32,
    pub jaw_open: f32,
}

impl Default for SurprisedWeights {
    fn default() -> Self {
        Self {
            eye_wide: 0.8,
            brow_raise: 0.5,
            jaw_open: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FearWeights {
    /// avg(eyeWideLeft, eyeWideRight)
    pub eye_wide: f32,
    pub brow_inner_up: f32,
    /// avg(mouthStretchLeft, mouthStretchRight)
    pub mouth_stretch: f32,
}

impl Default for FearWeights {
    fn default() -> Self {
        Self {
            eye_wide: 0.6,
            brow_inner_up: 0.5,
            mouth_stretch: 0.7,
        }
    }
}

/// Detection session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound on landmark service startup, in milliseconds
    pub init_timeout_ms: u64,
    /// Period between detection ticks, in milliseconds
    pub tick_interval_ms: u64,
    pub classifier: ClassifierConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            init_timeout_ms: 15_000,
            tick_interval_ms: 1_000,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Parse from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AffectError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, AffectError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    pub fn to_yaml(&self) -> Result<String, AffectError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.init_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("init_timeout_ms"));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("tick_interval_ms"));
        }
        self.classifier.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClassifierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.calibration_frames, 10);
        assert_eq!(config.smoothing, SmoothingStrategy::Ema { blend: 0.7 });
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
calibration_frames: 5
smoothing:
  strategy: sliding_window
  size: 4
weights:
  happy:
    smile: 0.7
"#;
        let config = ClassifierConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.calibration_frames, 5);
        assert_eq!(config.smoothing, SmoothingStrategy::SlidingWindow { size: 4 });
        assert_eq!(config.weights.happy.smile, 0.7);
        assert_eq!(config.weights.happy.cheek_squint, 0.4);
        assert_eq!(config.hysteresis, HysteresisConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = ClassifierConfig {
            calibration_frames: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyCalibrationWindow));

        let config = ClassifierConfig {
            smoothing: SmoothingStrategy::Ema { blend: 0.0 },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "smoothing.blend", .. })
        ));

        let config = ClassifierConfig {
            smoothing: SmoothingStrategy::SlidingWindow { size: 0 },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptySmoothingWindow));

        let yaml = "softmax_sharpness: -1.0\n";
        assert!(matches!(
            ClassifierConfig::from_yaml_str(yaml),
            Err(AffectError::Config(_))
        ));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let config = ClassifierConfig {
            calibration_frames: 3,
            hysteresis: HysteresisConfig {
                mode: MarginMode::RatioOnly,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_yaml().unwrap().as_bytes()).unwrap();

        let loaded = ClassifierConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_strategy_fields_default() {
        let yaml = "smoothing:\n  strategy: sliding_window\n";
        let config = ClassifierConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.smoothing, SmoothingStrategy::SlidingWindow { size: 6 });
    }

    #[test]
    fn test_settling_frames() {
        assert_eq!(SmoothingStrategy::Ema { blend: 0.7 }.settling_frames(), 6);
        assert_eq!(SmoothingStrategy::Ema { blend: 1.0 }.settling_frames(), 1);
        assert_eq!(SmoothingStrategy::SlidingWindow { size: 6 }.settling_frames(), 6);
    }

    #[test]
    fn test_session_config_yaml() {
        let yaml = r#"
init_timeout_ms: 500
classifier:
  calibration_frames: 4
"#;
        let config = SessionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.init_timeout(), Duration::from_millis(500));
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.classifier.calibration_frames, 4);

        assert_eq!(SessionConfig::default().init_timeout(), Duration::from_secs(15));
        assert!(matches!(
            SessionConfig::from_yaml_str("tick_interval_ms: 0\n"),
            Err(AffectError::Config(_))
        ));
    }
}
