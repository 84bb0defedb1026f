//! Facial-action vocabulary and per-frame feature vectors
//!
//! The landmark service reports one activation score in [0, 1] per named
//! facial action (the 52 MediaPipe face blendshapes). Names are resolved once
//! into [`FacialAction`] so scoring code indexes a dense table instead of
//! looking up strings.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Index;
use tracing::trace;

/// Named facial actions supplied by the landmark service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacialAction {
    Neutral,
    BrowDownLeft,
    BrowDownRight,
    BrowInnerUp,
    BrowOuterUpLeft,
    BrowOuterUpRight,
    CheekPuff,
    CheekSquintLeft,
    CheekSquintRight,
    EyeBlinkLeft,
    EyeBlinkRight,
    EyeLookDownLeft,
    EyeLookDownRight,
    EyeLookInLeft,
    EyeLookInRight,
    EyeLookOutLeft,
    EyeLookOutRight,
    EyeLookUpLeft,
    EyeLookUpRight,
    EyeSquintLeft,
    EyeSquintRight,
    EyeWideLeft,
    EyeWideRight,
    JawForward,
    JawLeft,
    JawOpen,
    JawRight,
    MouthClose,
    MouthDimpleLeft,
    MouthDimpleRight,
    MouthFrownLeft,
    MouthFrownRight,
    MouthFunnel,
    MouthLeft,
    MouthLowerDownLeft,
    MouthLowerDownRight,
    MouthPressLeft,
    MouthPressRight,
    MouthPucker,
    MouthRight,
    MouthRollLower,
    MouthRollUpper,
    MouthShrugLower,
    MouthShrugUpper,
    MouthSmileLeft,
    MouthSmileRight,
    MouthStretchLeft,
    MouthStretchRight,
    MouthUpperUpLeft,
    MouthUpperUpRight,
    NoseSneerLeft,
    NoseSneerRight,
}

use FacialAction::*;

impl FacialAction {
    /// Size of the vocabulary
    pub const COUNT: usize = 52;

    /// Every action in table order (matches the service's category order)
    pub const ALL: [FacialAction; Self::COUNT] = [
        Neutral,
        BrowDownLeft,
        BrowDownRight,
        BrowInnerUp,
        BrowOuterUpLeft,
        BrowOuterUpRight,
        CheekPuff,
        CheekSquintLeft,
        CheekSquintRight,
        EyeBlinkLeft,
        EyeBlinkRight,
        EyeLookDownLeft,
        EyeLookDownRight,
        EyeLookInLeft,
        EyeLookInRight,
        EyeLookOutLeft,
        EyeLookOutRight,
        EyeLookUpLeft,
        EyeLookUpRight,
        EyeSquintLeft,
        EyeSquintRight,
        EyeWideLeft,
        EyeWideRight,
        JawForward,
        JawLeft,
        JawOpen,
        JawRight,
        MouthClose,
        MouthDimpleLeft,
        MouthDimpleRight,
        MouthFrownLeft,
        MouthFrownRight,
        MouthFunnel,
        MouthLeft,
        MouthLowerDownLeft,
        MouthLowerDownRight,
        MouthPressLeft,
        MouthPressRight,
        MouthPucker,
        MouthRight,
        MouthRollLower,
        MouthRollUpper,
        MouthShrugLower,
        MouthShrugUpper,
        MouthSmileLeft,
        MouthSmileRight,
        MouthStretchLeft,
        MouthStretchRight,
        MouthUpperUpLeft,
        MouthUpperUpRight,
        NoseSneerLeft,
        NoseSneerRight,
    ];

    /// Position of this action in feature tables
    #[must_use]
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used by the landmark service
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Neutral => "_neutral",
            BrowDownLeft => "browDownLeft",
            BrowDownRight => "browDownRight",
            BrowInnerUp => "browInnerUp",
            BrowOuterUpLeft => "browOuterUpLeft",
            BrowOuterUpRight => "browOuterUpRight",
            CheekPuff => "cheekPuff",
            CheekSquintLeft => "cheekSquintLeft",
            CheekSquintRight => "cheekSquintRight",
            EyeBlinkLeft => "eyeBlinkLeft",
            EyeBlinkRight => "eyeBlinkRight",
            EyeLookDownLeft => "eyeLookDownLeft",
            EyeLookDownRight => "eyeLookDownRight",
            EyeLookInLeft => "eyeLookInLeft",
            EyeLookInRight => "eyeLookInRight",
            EyeLookOutLeft => "eyeLookOutLeft",
            EyeLookOutRight => "eyeLookOutRight",
            EyeLookUpLeft => "eyeLookUpLeft",
            EyeLookUpRight => "eyeLookUpRight",
            EyeSquintLeft => "eyeSquintLeft",
            EyeSquintRight => "eyeSquintRight",
            EyeWideLeft => "eyeWideLeft",
            EyeWideRight => "eyeWideRight",
            JawForward => "jawForward",
            JawLeft => "jawLeft",
            JawOpen => "jawOpen",
            JawRight => "jawRight",
            MouthClose => "mouthClose",
            MouthDimpleLeft => "mouthDimpleLeft",
            MouthDimpleRight => "mouthDimpleRight",
            MouthFrownLeft => "mouthFrownLeft",
            MouthFrownRight => "mouthFrownRight",
            MouthFunnel => "mouthFunnel",
            MouthLeft => "mouthLeft",
            MouthLowerDownLeft => "mouthLowerDownLeft",
            MouthLowerDownRight => "mouthLowerDownRight",
            MouthPressLeft => "mouthPressLeft",
            MouthPressRight => "mouthPressRight",
            MouthPucker => "mouthPucker",
            MouthRight => "mouthRight",
            MouthRollLower => "mouthRollLower",
            MouthRollUpper => "mouthRollUpper",
            MouthShrugLower => "mouthShrugLower",
            MouthShrugUpper => "mouthShrugUpper",
            MouthSmileLeft => "mouthSmileLeft",
            MouthSmileRight => "mouthSmileRight",
            MouthStretchLeft => "mouthStretchLeft",
            MouthStretchRight => "mouthStretchRight",
            MouthUpperUpLeft => "mouthUpperUpLeft",
            MouthUpperUpRight => "mouthUpperUpRight",
            NoseSneerLeft => "noseSneerLeft",
            NoseSneerRight => "noseSneerRight",
        }
    }

    /// Resolve a service category name; `None` for names outside the vocabulary
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ACTIONS_BY_NAME.get(name).copied()
    }
}

static ACTIONS_BY_NAME: Lazy<HashMap<&'static str, FacialAction>> = Lazy::new(|| {
    FacialAction::ALL
        .iter()
        .map(|&action| (action.name(), action))
        .collect()
});

/// One `{name, score}` entry as produced by the landmark service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blendshape {
    /// Facial action name (`categoryName` in MediaPipe output)
    #[serde(alias = "categoryName")]
    pub name: String,
    /// Activation score in [0, 1]
    pub score: f32,
}

impl Blendshape {
    pub fn new(name: impl Into<String>, score: f32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Dense per-frame activation table, one score per [`FacialAction`].
///
/// Actions absent from the service output read as 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; FacialAction::COUNT]);

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeros()
    }
}

impl FeatureVector {
    /// All actions at rest
    #[must_use]
    pub const fn zeros() -> Self {
        Self([0.0; FacialAction::COUNT])
    }

    /// Build from the service's `{name, score}` list.
    ///
    /// Unknown names are skipped, scores are clamped to [0, 1] and
    /// non-finite scores count as 0. Later duplicates overwrite earlier ones.
    #[must_use]
    pub fn from_blendshapes(blendshapes: &[Blendshape]) -> Self {
        let mut vector = Self::zeros();
        for blendshape in blendshapes {
            match FacialAction::from_name(&blendshape.name) {
                Some(action) => vector.set(action, blendshape.score),
                None => trace!(name = %blendshape.name, "Ignoring unknown facial action"),
            }
        }
        vector
    }

    /// Build from `(action, score)` pairs
    #[must_use]
    pub fn from_pairs(pairs: &[(FacialAction, f32)]) -> Self {
        let mut vector = Self::zeros();
        for &(action, score) in pairs {
            vector.set(action, score);
        }
        vector
    }

    /// Score for one action
    #[must_use]
    #[inline]
    pub fn get(&self, action: FacialAction) -> f32 {
        self.0[action.index()]
    }

    /// Set one action's score, clamped to [0, 1]
    #[inline]
    pub fn set(&mut self, action: FacialAction, score: f32) {
        self.0[action.index()] = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Larger of two actions
    #[must_use]
    #[inline]
    pub fn max_of(&self, a: FacialAction, b: FacialAction) -> f32 {
        self.get(a).max(self.get(b))
    }

    /// Mean over a group of actions
    #[must_use]
    pub fn mean_of(&self, actions: &[FacialAction]) -> f32 {
        if actions.is_empty() {
            return 0.0;
        }
        actions.iter().map(|&a| self.get(a)).sum::<f32>() / actions.len() as f32
    }

    /// Iterate `(action, score)` pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (FacialAction, f32)> + '_ {
        FacialAction::ALL.iter().map(move |&a| (a, self.get(a)))
    }
}

impl Index<FacialAction> for FeatureVector {
    type Output = f32;

    #[inline]
    fn index(&self, action: FacialAction) -> &f32 {
        &self.0[action.index()]
    }
}
