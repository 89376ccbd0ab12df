//! V2 eye dialect
//!
//! Addresses live under `/v2/`. The tracker sends either combined values
//! (`EyeX`, `EyeY`, `EyeLid`) or per-eye values (`EyeLeftX`, `EyeLidRight`,
//! ...); the last accepted parameter decides which set drives the output.
//! Widen and squint perturb the openness value itself instead of driving
//! expression shapes.

use paper_core::{smoothstep, EyeTrackingConfig, UnifiedTrackingData, Vector2};
use paper_wire::OscMessage;

use crate::eye::{emulate_eyebrow, filter_lid, EyeMapper, LidFilters, ProtocolVersion, Side};

/// Latest raw V2 values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct V2Parameters {
    pub eye_x: f32,
    pub eye_y: f32,
    pub eye_lid: f32,
    pub eye_left_x: f32,
    pub eye_left_y: f32,
    pub eye_right_x: f32,
    pub eye_right_y: f32,
    pub eye_lid_left: f32,
    pub eye_lid_right: f32,
    pub pupil_dilation: f32,
}

impl V2Parameters {
    /// Wire names, in table order
    pub const NAMES: [&'static str; 10] = [
        "EyeX",
        "EyeY",
        "EyeLid",
        "EyeLeftX",
        "EyeLeftY",
        "EyeRightX",
        "EyeRightY",
        "EyeLidLeft",
        "EyeLidRight",
        "PupilDilation",
    ];

    /// Parameters that switch the mapper into combined (single-eye) mode
    pub const COMBINED: [&'static str; 3] = ["EyeX", "EyeY", "EyeLid"];

    /// Slot for a wire parameter name
    pub fn slot_mut(&mut self, name: &str) -> Option<&mut f32> {
        match name {
            "EyeX" => Some(&mut self.eye_x),
            "EyeY" => Some(&mut self.eye_y),
            "EyeLid" => Some(&mut self.eye_lid),
            "EyeLeftX" => Some(&mut self.eye_left_x),
            "EyeLeftY" => Some(&mut self.eye_left_y),
            "EyeRightX" => Some(&mut self.eye_right_x),
            "EyeRightY" => Some(&mut self.eye_right_y),
            "EyeLidLeft" => Some(&mut self.eye_lid_left),
            "EyeLidRight" => Some(&mut self.eye_lid_right),
            "PupilDilation" => Some(&mut self.pupil_dilation),
            _ => None,
        }
    }
}

impl Default for V2Parameters {
    fn default() -> Self {
        V2Parameters {
            eye_x: 0.0,
            eye_y: 0.0,
            eye_lid: 1.0,
            eye_left_x: 0.0,
            eye_left_y: 0.0,
            eye_right_x: 0.0,
            eye_right_y: 0.0,
            eye_lid_left: 1.0,
            eye_lid_right: 1.0,
            pupil_dilation: 0.0,
        }
    }
}

/// Mapper for the V2 dialect
#[derive(Debug, Clone)]
pub struct V2EyeMapper {
    config: EyeTrackingConfig,
    params: V2Parameters,
    filters: LidFilters,
    single_eye_mode: bool,
}

impl V2EyeMapper {
    pub fn new(config: EyeTrackingConfig) -> Self {
        V2EyeMapper {
            config,
            params: V2Parameters::default(),
            filters: LidFilters::new(),
            single_eye_mode: false,
        }
    }

    pub fn parameters(&self) -> &V2Parameters {
        &self.params
    }

    /// Are the combined parameters driving both eyes?
    pub fn is_single_eye_mode(&self) -> bool {
        self.single_eye_mode
    }

    fn emulate_openness(&self, openness: f32) -> f32 {
        let [widen_low, widen_high] = self.config.widen_threshold_v2();
        let [squeeze_low, squeeze_high] = self.config.squeeze_threshold_v2();
        let multiplier = self.config.output_multiplier();

        let mut result = openness;

        if self.config.should_emulate_eye_widen && openness >= widen_low {
            result = openness + smoothstep(widen_low, widen_high, openness) * multiplier;
        }

        if self.config.should_emulate_eye_squint && openness <= squeeze_low {
            result = openness - smoothstep(squeeze_low, squeeze_high, openness) * multiplier;
        }

        result
    }
}

impl EyeMapper for V2EyeMapper {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V2
    }

    fn process_message(&mut self, message: &OscMessage) -> bool {
        let Some(value) = message.value.as_float() else {
            return false;
        };
        let name = message.parameter_name();
        match self.params.slot_mut(name) {
            Some(slot) => {
                *slot = value;
                self.single_eye_mode = V2Parameters::COMBINED.contains(&name);
                true
            }
            None => false,
        }
    }

    fn compute_output(&mut self, output: &mut UnifiedTrackingData) {
        let p = self.params;

        if self.single_eye_mode {
            let gaze = Vector2::new(p.eye_x, p.eye_y);
            output.eye.left.gaze = gaze;
            output.eye.right.gaze = gaze;
        } else {
            output.eye.left.gaze = Vector2::new(p.eye_left_x, p.eye_left_y);
            output.eye.right.gaze = Vector2::new(p.eye_right_x, p.eye_right_y);
        }

        output.eye.left.pupil_diameter_mm = p.pupil_dilation;
        output.eye.right.pupil_diameter_mm = p.pupil_dilation;

        // Combined mode runs the shared lid through the left filter only
        let (left, right) = if self.single_eye_mode {
            let lid = filter_lid(&mut self.filters.left, p.eye_lid);
            (lid, lid)
        } else {
            (
                filter_lid(&mut self.filters.left, p.eye_lid_left),
                filter_lid(&mut self.filters.right, p.eye_lid_right),
            )
        };

        output.eye.left.openness = self.emulate_openness(left);
        output.eye.right.openness = self.emulate_openness(right);

        emulate_eyebrow(&self.config, output, Side::Left, left);
        emulate_eyebrow(&self.config, output, Side::Right, right);
    }

    fn update_config(&mut self, config: &EyeTrackingConfig) {
        self.config = config.clone();
    }
}
