//! Personal neutral-face baseline
//!
//! The first K frames of a session are averaged into a per-action baseline.
//! Once finalized the baseline never changes; a new baseline needs a new
//! classifier.

use facial_affect_common::{FacialAction, FeatureVector};
use tracing::{debug, info};

/// Progress of the calibration window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    /// Still collecting; `observed` of `required` frames seen
    InProgress { observed: usize, required: usize },
    /// Baseline finalized
    Complete,
}

/// Average resting-face activation per facial action
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Baseline(FeatureVector);

impl Baseline {
    /// Baseline with every action at rest
    #[must_use]
    pub const fn zero() -> Self {
        Self(FeatureVector::zeros())
    }

    #[must_use]
    #[inline]
    pub fn get(&self, action: FacialAction) -> f32 {
        self.0.get(action)
    }
}

/// Accumulates the baseline over a fixed number of frames
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    required: usize,
    observed: usize,
    sums: [f64; FacialAction::COUNT],
    baseline: Option<Baseline>,
}

impl BaselineCalibrator {
    /// Create a calibrator for a `required`-frame window.
    ///
    /// A zero-length window completes immediately with a zero baseline.
    #[must_use]
    pub fn new(required: usize) -> Self {
        Self {
            required,
            observed: 0,
            sums: [0.0; FacialAction::COUNT],
            baseline: (required == 0).then(Baseline::zero),
        }
    }

    /// Add one frame to the window.
    ///
    /// Returns `InProgress` until the K-th frame, which finalizes the
    /// baseline and returns `Complete`. Calls after that are no-ops.
    pub fn observe(&mut self, vector: &FeatureVector) -> CalibrationStatus {
        if self.baseline.is_some() {
            return CalibrationStatus::Complete;
        }

        for (action, score) in vector.iter() {
            self.sums[action.index()] += f64::from(score);
        }
        self.observed += 1;

        if self.observed < self.required {
            debug!(
                observed = self.observed,
                required = self.required,
                "Calibration frame recorded"
            );
            return CalibrationStatus::InProgress {
                observed: self.observed,
                required: self.required,
            };
        }

        let mut averages = FeatureVector::zeros();
        for action in FacialAction::ALL {
            averages.set(action, (self.sums[action.index()] / self.observed as f64) as f32);
        }
        self.baseline = Some(Baseline(averages));
        info!(frames = self.observed, "Baseline calibration finalized");
        CalibrationStatus::Complete
    }

    /// Current status without observing a frame
    #[must_use]
    pub fn status(&self) -> CalibrationStatus {
        if self.baseline.is_some() {
            CalibrationStatus::Complete
        } else {
            CalibrationStatus::InProgress {
                observed: self.observed,
                required: self.required,
            }
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.baseline.is_some()
    }

    /// Finalized baseline, if calibration is complete
    #[must_use]
    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }
}
