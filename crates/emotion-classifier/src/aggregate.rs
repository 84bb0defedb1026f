//! Coarse mood readings and face-loss tracking over many ticks

use facial_affect_common::EmotionLabel;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default number of labels per mood reading
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default number of consecutive no-face ticks before the face counts as lost
pub const DEFAULT_NO_FACE_THRESHOLD: usize = 5;

/// Majority-vote summary of one batch of labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodReading {
    pub emotion: EmotionLabel,
    /// Share of the batch that voted for `emotion`
    pub confidence: f32,
    pub readings: usize,
}

/// Collects reported labels into fixed-size batches
#[derive(Debug, Clone)]
pub struct MoodAggregator {
    batch_size: usize,
    labels: Vec<EmotionLabel>,
}

impl Default for MoodAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl MoodAggregator {
    /// A zero batch size is treated as 1
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            labels: Vec::with_capacity(batch_size),
        }
    }

    /// Record one label; returns a reading when the batch fills up
    pub fn push(&mut self, label: EmotionLabel) -> Option<MoodReading> {
        self.labels.push(label);
        if self.labels.len() < self.batch_size {
            return None;
        }
        let reading = self.flush();
        if let Some(reading) = &reading {
            info!(
                emotion = %reading.emotion,
                confidence = reading.confidence,
                "Mood reading"
            );
        }
        reading
    }

    /// Summarize whatever has been collected so far and start a new batch
    pub fn flush(&mut self) -> Option<MoodReading> {
        if self.labels.is_empty() {
            return None;
        }
        let mut counts = [0usize; EmotionLabel::COUNT];
        for label in &self.labels {
            counts[label.index()] += 1;
        }

        // Ties go to the tied label whose first appearance is latest
        let top = counts.iter().copied().max().unwrap_or(0);
        let mut first_seen: Vec<EmotionLabel> = Vec::with_capacity(EmotionLabel::COUNT);
        for &label in &self.labels {
            if !first_seen.contains(&label) {
                first_seen.push(label);
            }
        }
        let emotion = first_seen
            .into_iter()
            .rev()
            .find(|label| counts[label.index()] == top)
            .unwrap_or_default();

        let readings = self.labels.len();
        self.labels.clear();
        Some(MoodReading {
            emotion,
            confidence: top as f32 / readings as f32,
            readings,
        })
    }

    /// Labels collected toward the current batch
    pub fn pending(&self) -> usize {
        self.labels.len()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Raised once when consecutive no-face ticks reach the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceLost {
    pub consecutive: usize,
}

/// Counts consecutive ticks without a face
#[derive(Debug, Clone)]
pub struct NoFaceMonitor {
    threshold: usize,
    consecutive: usize,
}

impl Default for NoFaceMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_NO_FACE_THRESHOLD)
    }
}

impl NoFaceMonitor {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: 0,
        }
    }

    /// Record a tick without a face
    pub fn no_face(&mut self) -> Option<FaceLost> {
        self.consecutive += 1;
        if self.consecutive == self.threshold {
            warn!(
                consecutive = self.consecutive,
                "No face detected, check lighting and camera position"
            );
            return Some(FaceLost {
                consecutive: self.consecutive,
            });
        }
        None
    }

    /// Record a tick with a face
    pub fn face_seen(&mut self) {
        self.consecutive = 0;
    }

    pub fn consecutive(&self) -> usize {
        self.consecutive
    }
}
