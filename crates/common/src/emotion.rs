//! Emotion labels and per-label score tables

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Emotion categories reported by the classifier
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Surprised,
    Fear,
}

impl EmotionLabel {
    /// Number of labels
    pub const COUNT: usize = 6;

    /// All labels in table order
    pub const ALL: [EmotionLabel; Self::COUNT] = [
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Surprised,
        EmotionLabel::Fear,
    ];

    /// Position of this label in score tables
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            EmotionLabel::Neutral => 0,
            EmotionLabel::Happy => 1,
            EmotionLabel::Sad => 2,
            EmotionLabel::Angry => 3,
            EmotionLabel::Surprised => 4,
            EmotionLabel::Fear => 5,
        }
    }

    /// Get label from table index
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Get label as string
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Surprised => "surprised",
            EmotionLabel::Fear => "fear",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown emotion label: {s}"))
    }
}

/// One value per [`EmotionLabel`].
///
/// Used both for raw (unnormalized) scores and for probability vectors. A
/// probability vector is non-negative and sums to 1 within floating-point
/// tolerance; the normalizer and stabilizer preserve that invariant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmotionScores([f32; EmotionLabel::COUNT]);

/// Distribution over emotion labels, summing to 1
pub type ProbabilityVector = EmotionScores;

impl EmotionScores {
    /// All scores zero
    #[must_use]
    pub const fn zeros() -> Self {
        Self([0.0; EmotionLabel::COUNT])
    }

    /// Build from a per-label function
    #[must_use]
    pub fn from_fn(mut f: impl FnMut(EmotionLabel) -> f32) -> Self {
        let mut values = [0.0; EmotionLabel::COUNT];
        for label in EmotionLabel::ALL {
            values[label.index()] = f(label);
        }
        Self(values)
    }

    /// Build from raw values in table order
    #[must_use]
    pub const fn from_array(values: [f32; EmotionLabel::COUNT]) -> Self {
        Self(values)
    }

    /// Raw values in table order
    #[must_use]
    pub const fn as_array(&self) -> &[f32; EmotionLabel::COUNT] {
        &self.0
    }

    /// Score for one label
    #[must_use]
    #[inline]
    pub fn get(&self, label: EmotionLabel) -> f32 {
        self.0[label.index()]
    }

    /// Iterate `(label, score)` pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f32)> + '_ {
        EmotionLabel::ALL.iter().map(move |&label| (label, self.get(label)))
    }

    /// Sum of all scores
    #[must_use]
    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    /// Label with the largest score; the earliest label wins ties
    #[must_use]
    pub fn argmax(&self) -> EmotionLabel {
        let mut best = EmotionLabel::Neutral;
        for (label, score) in self.iter() {
            if score > self.get(best) {
                best = label;
            }
        }
        best
    }

    /// Largest score among every label except `excluded`
    #[must_use]
    pub fn max_excluding(&self, excluded: EmotionLabel) -> f32 {
        self.iter()
            .filter(|(label, _)| *label != excluded)
            .map(|(_, score)| score)
            .fold(0.0, f32::max)
    }
}

impl Index<EmotionLabel> for EmotionScores {
    type Output = f32;

    #[inline]
    fn index(&self, label: EmotionLabel) -> &f32 {
        &self.0[label.index()]
    }
}

impl IndexMut<EmotionLabel> for EmotionScores {
    #[inline]
    fn index_mut(&mut self, label: EmotionLabel) -> &mut f32 {
        &mut self.0[label.index()]
    }
}

// Serialized as a `{label: score}` map so JSON consumers see `allScores.happy`.
impl Serialize for EmotionScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(EmotionLabel::COUNT))?;
        for (label, score) in self.iter() {
            map.serialize_entry(label.as_str(), &score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EmotionScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoresVisitor;

        impl<'de> Visitor<'de> for ScoresVisitor {
            type Value = EmotionScores;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of emotion label to score")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut scores = EmotionScores::zeros();
                while let Some((label, score)) = access.next_entry::<EmotionLabel, f32>()? {
                    scores[label] = score;
                }
                Ok(scores)
            }
        }

        deserializer.deserialize_map(ScoresVisitor)
    }
}
