//! Host-facing output data
//!
//! The per-tick pull copies mapped values into these structures. They mirror
//! what the host animation system consumes: a gaze/pupil/openness triple per
//! eye and one weight per unified expression channel.

use crate::UnifiedExpression;

/// 2D gaze direction, normalized tracker units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Vector2 { x, y }
    }
}

/// Output state for a single eye
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleEyeData {
    /// Gaze direction
    pub gaze: Vector2,
    /// Pupil diameter as reported by the tracker
    pub pupil_diameter_mm: f32,
    /// Lid aperture, 0 = closed, 1 = open (emulation may push it past 1)
    pub openness: f32,
}

impl Default for SingleEyeData {
    fn default() -> Self {
        SingleEyeData {
            gaze: Vector2::ZERO,
            pupil_diameter_mm: 0.0,
            openness: 1.0,
        }
    }
}

/// Output state for both eyes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UnifiedEyeData {
    pub left: SingleEyeData,
    pub right: SingleEyeData,
}

/// Complete host output: eyes plus the expression shape array
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedTrackingData {
    pub eye: UnifiedEyeData,
    pub shapes: [f32; UnifiedExpression::COUNT],
}

impl UnifiedTrackingData {
    pub fn new() -> Self {
        UnifiedTrackingData {
            eye: UnifiedEyeData::default(),
            shapes: [0.0; UnifiedExpression::COUNT],
        }
    }

    /// Weight of an expression channel
    #[inline]
    pub fn weight(&self, expression: UnifiedExpression) -> f32 {
        self.shapes[expression.index()]
    }

    /// Set the weight of an expression channel
    #[inline]
    pub fn set_weight(&mut self, expression: UnifiedExpression, weight: f32) {
        self.shapes[expression.index()] = weight;
    }
}

impl Default for UnifiedTrackingData {
    fn default() -> Self {
        UnifiedTrackingData::new()
    }
}
