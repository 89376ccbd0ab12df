//! V1 eye dialect
//!
//! Per-eye horizontal gaze, one shared vertical gaze, per-eye lid openness
//! and a shared dilation value. Widen and squint are reported as discrete
//! expression shapes; openness is capped while widening.

use paper_core::{
    smoothstep, EyeTrackingConfig, SingleEyeData, UnifiedExpression, UnifiedTrackingData, Vector2,
};
use paper_wire::OscMessage;

use crate::eye::{emulate_eyebrow, filter_lid, EyeMapper, LidFilters, ProtocolVersion, Side};

/// Openness reported while the widen shape is active
pub const V1_WIDEN_OPENNESS: f32 = 0.8;

/// Latest raw V1 values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct V1Parameters {
    pub left_eye_lid_expanded_squeeze: f32,
    pub right_eye_lid_expanded_squeeze: f32,
    pub left_eye_x: f32,
    pub right_eye_x: f32,
    pub eyes_y: f32,
    pub eyes_dilation: f32,
}

impl V1Parameters {
    /// Wire names, in table order
    pub const NAMES: [&'static str; 6] = [
        "LeftEyeLidExpandedSqueeze",
        "RightEyeLidExpandedSqueeze",
        "LeftEyeX",
        "RightEyeX",
        "EyesY",
        "EyesDilation",
    ];

    /// Slot for a wire parameter name
    pub fn slot_mut(&mut self, name: &str) -> Option<&mut f32> {
        match name {
            "LeftEyeLidExpandedSqueeze" => Some(&mut self.left_eye_lid_expanded_squeeze),
            "RightEyeLidExpandedSqueeze" => Some(&mut self.right_eye_lid_expanded_squeeze),
            "LeftEyeX" => Some(&mut self.left_eye_x),
            "RightEyeX" => Some(&mut self.right_eye_x),
            "EyesY" => Some(&mut self.eyes_y),
            "EyesDilation" => Some(&mut self.eyes_dilation),
            _ => None,
        }
    }
}

impl Default for V1Parameters {
    fn default() -> Self {
        V1Parameters {
            left_eye_lid_expanded_squeeze: 1.0,
            right_eye_lid_expanded_squeeze: 1.0,
            left_eye_x: 0.0,
            right_eye_x: 0.0,
            eyes_y: 0.0,
            eyes_dilation: 0.0,
        }
    }
}

/// Mapper for the V1 dialect
#[derive(Debug, Clone)]
pub struct V1EyeMapper {
    config: EyeTrackingConfig,
    params: V1Parameters,
    filters: LidFilters,
}

impl V1EyeMapper {
    pub fn new(config: EyeTrackingConfig) -> Self {
        V1EyeMapper {
            config,
            params: V1Parameters::default(),
            filters: LidFilters::new(),
        }
    }

    pub fn parameters(&self) -> &V1Parameters {
        &self.params
    }

    fn apply_openness(
        &self,
        eye: &mut SingleEyeData,
        output: &mut UnifiedTrackingData,
        widen: UnifiedExpression,
        squint: UnifiedExpression,
        openness: f32,
    ) {
        let [widen_low, widen_high] = self.config.widen_threshold_v1();
        let [squeeze_low, squeeze_high] = self.config.squeeze_threshold_v1();
        let multiplier = self.config.output_multiplier();

        eye.openness = openness;

        let widen_weight = if self.config.should_emulate_eye_widen && openness >= widen_low {
            eye.openness = V1_WIDEN_OPENNESS;
            smoothstep(widen_low, widen_high, openness) * multiplier
        } else {
            0.0
        };
        output.set_weight(widen, widen_weight);

        let squint_weight = if self.config.should_emulate_eye_squint && openness <= squeeze_low {
            smoothstep(squeeze_high, squeeze_low, openness) * multiplier
        } else {
            0.0
        };
        output.set_weight(squint, squint_weight);
    }
}

impl EyeMapper for V1EyeMapper {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V1
    }

    fn process_message(&mut self, message: &OscMessage) -> bool {
        let Some(value) = message.value.as_float() else {
            return false;
        };
        match self.params.slot_mut(message.parameter_name()) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn compute_output(&mut self, output: &mut UnifiedTrackingData) {
        let p = self.params;

        output.eye.left.gaze = Vector2::new(p.left_eye_x, p.eyes_y);
        output.eye.right.gaze = Vector2::new(p.right_eye_x, p.eyes_y);

        output.eye.left.pupil_diameter_mm = p.eyes_dilation;
        output.eye.right.pupil_diameter_mm = p.eyes_dilation;

        let left = filter_lid(&mut self.filters.left, p.left_eye_lid_expanded_squeeze);
        let right = filter_lid(&mut self.filters.right, p.right_eye_lid_expanded_squeeze);

        let mut left_eye = output.eye.left;
        let mut right_eye = output.eye.right;
        self.apply_openness(
            &mut left_eye,
            output,
            UnifiedExpression::EyeWideLeft,
            UnifiedExpression::EyeSquintLeft,
            left,
        );
        self.apply_openness(
            &mut right_eye,
            output,
            UnifiedExpression::EyeWideRight,
            UnifiedExpression::EyeSquintRight,
            right,
        );
        output.eye.left = left_eye;
        output.eye.right = right_eye;

        emulate_eyebrow(&self.config, output, Side::Left, left);
        emulate_eyebrow(&self.config, output, Side::Right, right);
    }

    fn update_config(&mut self, config: &EyeTrackingConfig) {
        self.config = config.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper_wire::OscValue;

    fn float(address: &str, value: f32) -> OscMessage {
        OscMessage::new(address, OscValue::Float(value))
    }

    #[test]
    fn test_defaults_are_neutral() {
        let mut mapper = V1EyeMapper::new(EyeTrackingConfig::default());
        let mut out = UnifiedTrackingData::new();
        mapper.compute_output(&mut out);

        assert_eq!(out.eye.left.openness, 1.0);
        assert_eq!(out.eye.right.openness, 1.0);
        assert_eq!(out.eye.left.gaze, Vector2::ZERO);
        assert_eq!(out.eye.left.pupil_diameter_mm, 0.0);
    }

    #[test]
    fn test_gaze_and_dilation() {
        let mut mapper = V1EyeMapper::new(EyeTrackingConfig::default());
        assert!(mapper.process_message(&float("/LeftEyeX", -0.1)));
        assert!(mapper.process_message(&float("/RightEyeX", 0.1)));
        assert!(mapper.process_message(&float("/EyesY", 0.2)));
        assert!(mapper.process_message(&float("/EyesDilation", 0.6)));

        let mut out = UnifiedTrackingData::new();
        mapper.compute_output(&mut out);
        assert_eq!(out.eye.left.gaze, Vector2::new(-0.1, 0.2));
        assert_eq!(out.eye.right.gaze, Vector2::new(0.1, 0.2));
        assert_eq!(out.eye.left.pupil_diameter_mm, 0.6);
        assert_eq!(out.eye.right.pupil_diameter_mm, 0.6);
    }

    #[test]
    fn test_ignores_unknown_and_non_float() {
        let mut mapper = V1EyeMapper::new(EyeTrackingConfig::default());
        assert!(!mapper.process_message(&float("/EyeLid", 0.3)));
        assert!(!mapper.process_message(&OscMessage::new("/EyesY", OscValue::Integer(1))));
        assert_eq!(*mapper.parameters(), V1Parameters::default());
    }

    #[test]
    fn test_widen_caps_openness() {
        let mut config = EyeTrackingConfig::default();
        config.should_emulate_eye_widen = true;
        let mut mapper = V1EyeMapper::new(config);
        let mut out = UnifiedTrackingData::new();
        // Default lid is 1.0, at the top of [0.6, 1.0]
        mapper.compute_output(&mut out);

        assert_eq!(out.eye.left.openness, V1_WIDEN_OPENNESS);
        assert_eq!(out.weight(UnifiedExpression::EyeWideLeft), 1.0);
        assert_eq!(out.weight(UnifiedExpression::EyeWideRight), 1.0);
    }

    #[test]
    fn test_widen_scaled_by_multiplier() {
        let mut config = EyeTrackingConfig::default();
        config.should_emulate_eye_widen = true;
        config.set_output_multiplier(0.5);
        let mut mapper = V1EyeMapper::new(config);
        let mut out = UnifiedTrackingData::new();
        mapper.compute_output(&mut out);
        assert_eq!(out.weight(UnifiedExpression::EyeWideLeft), 0.5);
    }

    #[test]
    fn test_squint_when_nearly_closed() {
        let mut config = EyeTrackingConfig::default();
        config.should_emulate_eye_squint = true;
        let mut mapper = V1EyeMapper::new(config);
        mapper.process_message(&float("/LeftEyeLidExpandedSqueeze", 0.0));

        let mut out = UnifiedTrackingData::new();
        out.set_weight(UnifiedExpression::EyeSquintRight, 0.9);
        mapper.compute_output(&mut out);

        assert_eq!(out.eye.left.openness, 0.0);
        assert_eq!(out.weight(UnifiedExpression::EyeSquintLeft), 1.0);
        // Right eye is open: stale weight is cleared
        assert_eq!(out.weight(UnifiedExpression::EyeSquintRight), 0.0);
    }

    #[test]
    fn test_emulation_off_clears_shapes() {
        let mut mapper = V1EyeMapper::new(EyeTrackingConfig::default());
        let mut out = UnifiedTrackingData::new();
        out.set_weight(UnifiedExpression::EyeWideLeft, 0.7);
        mapper.compute_output(&mut out);
        assert_eq!(out.weight(UnifiedExpression::EyeWideLeft), 0.0);
        assert_eq!(out.eye.left.openness, 1.0);
    }

    #[test]
    fn test_update_config_takes_effect() {
        let mut mapper = V1EyeMapper::new(EyeTrackingConfig::default());
        let mut out = UnifiedTrackingData::new();
        mapper.compute_output(&mut out);
        assert_eq!(out.weight(UnifiedExpression::EyeWideLeft), 0.0);

        let mut config = EyeTrackingConfig::default();
        config.should_emulate_eye_widen = true;
        mapper.update_config(&config);
        mapper.compute_output(&mut out);
        assert_eq!(out.weight(UnifiedExpression::EyeWideLeft), 1.0);
    }
}
