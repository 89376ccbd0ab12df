//! Eye mapping
//!
//! Two wire dialects reach the eye port:
//! - V1: `/LeftEyeX`, `/EyesY`, `/LeftEyeLidExpandedSqueeze`, ...
//! - V2: `/v2/EyeLeftX`, `/v2/EyeLid`, `/v2/PupilDilation`, ...
//!
//! [`EyeTrackingEngine`] feeds each message to the matching mapper and keeps
//! the one that last received a message as the active output source.

pub mod engine;
pub mod v1;
pub mod v2;

pub use engine::*;
pub use v1::*;
pub use v2::*;

use std::fmt;

use paper_core::{smoothstep, EyeTrackingConfig, UnifiedExpression, UnifiedTrackingData};
use paper_filter::OneEuroFilter;
use paper_wire::OscMessage;

/// Minimum cutoff of the lid openness filters
pub const LID_MIN_CUTOFF: f64 = 0.1;

/// Speed coefficient of the lid openness filters
pub const LID_BETA: f64 = 15.0;

/// Lid filters advance one sample per pull
pub const LID_SAMPLE_RATE: f64 = 1.0;

/// Wire dialect of the eye stream
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    V1,
    V2,
}

impl ProtocolVersion {
    /// Dialect an address belongs to
    pub fn of_address(address: &str) -> Self {
        if address.contains("/v2/") {
            ProtocolVersion::V2
        } else {
            ProtocolVersion::V1
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V1 => write!(f, "V1"),
            ProtocolVersion::V2 => write!(f, "V2"),
        }
    }
}

/// Capability set shared by both dialect mappers
pub trait EyeMapper: Send {
    /// Dialect handled by this mapper
    fn version(&self) -> ProtocolVersion;

    /// Store a parameter from the stream.
    ///
    /// Returns `false` when the parameter name is unknown or the value is not
    /// a float; neither case is an error.
    fn process_message(&mut self, message: &OscMessage) -> bool;

    /// Per-tick pull: write gaze, pupil, openness and emulated shapes
    fn compute_output(&mut self, output: &mut UnifiedTrackingData);

    /// Replace the configuration snapshot
    fn update_config(&mut self, config: &EyeTrackingConfig);
}

/// Left and right lid filters
#[derive(Debug, Clone)]
pub struct LidFilters {
    pub left: OneEuroFilter,
    pub right: OneEuroFilter,
}

impl LidFilters {
    pub fn new() -> Self {
        LidFilters {
            left: OneEuroFilter::new(LID_MIN_CUTOFF, LID_BETA),
            right: OneEuroFilter::new(LID_MIN_CUTOFF, LID_BETA),
        }
    }
}

impl Default for LidFilters {
    fn default() -> Self {
        LidFilters::new()
    }
}

/// Push one raw openness sample through a lid filter
#[inline]
pub(crate) fn filter_lid(filter: &mut OneEuroFilter, raw: f32) -> f32 {
    filter.filter(raw as f64, LID_SAMPLE_RATE) as f32
}

/// Which side of the face a brow pair belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    fn brow_outer_up(self) -> UnifiedExpression {
        match self {
            Side::Left => UnifiedExpression::BrowOuterUpLeft,
            Side::Right => UnifiedExpression::BrowOuterUpRight,
        }
    }

    fn brow_lowerer(self) -> UnifiedExpression {
        match self {
            Side::Left => UnifiedExpression::BrowLowererLeft,
            Side::Right => UnifiedExpression::BrowLowererRight,
        }
    }
}

/// Raise or lower one brow from the filtered openness of the eye below it.
///
/// Above the rising threshold the outer brow lifts towards 1 as the eye opens
/// fully. Below the lowering threshold the brow lowerer grows towards 1 as the
/// eye closes. Between the two both channels rest at 0.
pub(crate) fn emulate_eyebrow(
    config: &EyeTrackingConfig,
    output: &mut UnifiedTrackingData,
    side: Side,
    filtered_openness: f32,
) {
    if !config.should_emulate_eyebrows {
        return;
    }

    let rise = config.eyebrow_threshold_rising;
    let lower = config.eyebrow_threshold_lowering;

    let outer_up = if filtered_openness >= rise {
        smoothstep(rise, 1.0, filtered_openness)
    } else {
        0.0
    };

    // Edge runs from `lower` down to 0; an upper edge of 1 would keep this
    // branch at 0 for every openness it admits
    let lowerer = if filtered_openness <= lower {
        smoothstep(lower, 0.0, filtered_openness)
    } else {
        0.0
    };

    output.set_weight(side.brow_outer_up(), outer_up);
    output.set_weight(side.brow_lowerer(), lowerer);
}
