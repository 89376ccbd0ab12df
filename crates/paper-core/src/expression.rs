//! Unified expression channels
//!
//! The host animation system exposes a fixed array of expression shapes.
//! Every channel here indexes exactly one slot of that array; the eye engine
//! writes the eye and brow channels, the expression router writes the rest.

use std::fmt;

/// Unified expression channel identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum UnifiedExpression {
    // Eye (emulated from lid openness)
    EyeWideLeft = 0,
    EyeWideRight,
    EyeSquintLeft,
    EyeSquintRight,

    // Brow (emulated from lid openness)
    BrowLowererLeft,
    BrowLowererRight,
    BrowOuterUpLeft,
    BrowOuterUpRight,

    // Cheek and nose
    CheekPuffLeft,
    CheekPuffRight,
    CheekSquintLeft,
    CheekSquintRight,
    NoseSneerLeft,
    NoseSneerRight,

    // Jaw
    JawOpen,
    JawForward,
    JawLeft,
    JawRight,

    // Lips
    LipFunnel,
    LipPucker,
    MouthLeft,
    MouthRight,
    MouthRollUpper,
    MouthRollLower,
    MouthShrugUpper,
    MouthShrugLower,
    MouthClosed,

    // Mouth corners
    MouthSmileLeft,
    MouthSmileRight,
    MouthFrownLeft,
    MouthFrownRight,
    MouthDimpleLeft,
    MouthDimpleRight,
    MouthUpperUpLeft,
    MouthUpperUpRight,
    MouthLowerDownLeft,
    MouthLowerDownRight,
    MouthPressLeft,
    MouthPressRight,
    MouthStretchLeft,
    MouthStretchRight,

    // Tongue
    TongueOut,
    TongueUp,
    TongueDown,
    TongueLeft,
    TongueRight,
}

impl UnifiedExpression {
    /// Number of channels in the host shape array
    pub const COUNT: usize = 46;

    /// Every channel in index order
    pub const ALL: [UnifiedExpression; Self::COUNT] = [
        UnifiedExpression::EyeWideLeft,
        UnifiedExpression::EyeWideRight,
        UnifiedExpression::EyeSquintLeft,
        UnifiedExpression::EyeSquintRight,
        UnifiedExpression::BrowLowererLeft,
        UnifiedExpression::BrowLowererRight,
        UnifiedExpression::BrowOuterUpLeft,
        UnifiedExpression::BrowOuterUpRight,
        UnifiedExpression::CheekPuffLeft,
        UnifiedExpression::CheekPuffRight,
        UnifiedExpression::CheekSquintLeft,
        UnifiedExpression::CheekSquintRight,
        UnifiedExpression::NoseSneerLeft,
        UnifiedExpression::NoseSneerRight,
        UnifiedExpression::JawOpen,
        UnifiedExpression::JawForward,
        UnifiedExpression::JawLeft,
        UnifiedExpression::JawRight,
        UnifiedExpression::LipFunnel,
        UnifiedExpression::LipPucker,
        UnifiedExpression::MouthLeft,
        UnifiedExpression::MouthRight,
        UnifiedExpression::MouthRollUpper,
        UnifiedExpression::MouthRollLower,
        UnifiedExpression::MouthShrugUpper,
        UnifiedExpression::MouthShrugLower,
        UnifiedExpression::MouthClosed,
        UnifiedExpression::MouthSmileLeft,
        UnifiedExpression::MouthSmileRight,
        UnifiedExpression::MouthFrownLeft,
        UnifiedExpression::MouthFrownRight,
        UnifiedExpression::MouthDimpleLeft,
        UnifiedExpression::MouthDimpleRight,
        UnifiedExpression::MouthUpperUpLeft,
        UnifiedExpression::MouthUpperUpRight,
        UnifiedExpression::MouthLowerDownLeft,
        UnifiedExpression::MouthLowerDownRight,
        UnifiedExpression::MouthPressLeft,
        UnifiedExpression::MouthPressRight,
        UnifiedExpression::MouthStretchLeft,
        UnifiedExpression::MouthStretchRight,
        UnifiedExpression::TongueOut,
        UnifiedExpression::TongueUp,
        UnifiedExpression::TongueDown,
        UnifiedExpression::TongueLeft,
        UnifiedExpression::TongueRight,
    ];

    /// Slot in the host shape array
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Channel from a shape array slot
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Is this channel driven by the eye engine rather than the face stream?
    pub fn is_eye_driven(self) -> bool {
        self.index() <= UnifiedExpression::BrowOuterUpRight.index()
    }
}

impl fmt::Display for UnifiedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
