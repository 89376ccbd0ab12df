//! Dialect-switching eye engine

use paper_core::{EyeTrackingConfig, UnifiedTrackingData};
use paper_wire::OscMessage;

use crate::eye::{EyeMapper, ProtocolVersion, V1EyeMapper, V2EyeMapper};

/// Owns both dialect mappers and routes each message by address.
///
/// The mapper that received the most recent message is the active one; the
/// per-tick pull reads from it only.
#[derive(Debug, Clone)]
pub struct EyeTrackingEngine {
    v1: V1EyeMapper,
    v2: V2EyeMapper,
    active: ProtocolVersion,
}

impl EyeTrackingEngine {
    pub fn new(config: &EyeTrackingConfig) -> Self {
        EyeTrackingEngine {
            v1: V1EyeMapper::new(config.clone()),
            v2: V2EyeMapper::new(config.clone()),
            active: ProtocolVersion::V1,
        }
    }

    /// Dialect of the most recent message
    pub fn active_version(&self) -> ProtocolVersion {
        self.active
    }

    pub fn v1(&self) -> &V1EyeMapper {
        &self.v1
    }

    pub fn v2(&self) -> &V2EyeMapper {
        &self.v2
    }

    fn mapper_mut(&mut self, version: ProtocolVersion) -> &mut dyn EyeMapper {
        match version {
            ProtocolVersion::V1 => &mut self.v1,
            ProtocolVersion::V2 => &mut self.v2,
        }
    }

    /// Route a decoded message; failed decodes are ignored
    pub fn process_message(&mut self, message: &OscMessage) {
        if !message.success {
            return;
        }

        let version = ProtocolVersion::of_address(&message.address);
        if version != self.active {
            tracing::debug!("Eye stream switched to {} ({})", version, message.address);
        }
        self.active = version;

        if !self.mapper_mut(version).process_message(message) {
            tracing::trace!("Ignoring eye parameter {} = {}", message.address, message.value);
        }
    }

    /// Per-tick pull from the active mapper
    pub fn update(&mut self, output: &mut UnifiedTrackingData) {
        let active = self.active;
        self.mapper_mut(active).compute_output(output);
    }

    /// Push a new configuration snapshot to both mappers
    pub fn update_config(&mut self, config: &EyeTrackingConfig) {
        self.v1.update_config(config);
        self.v2.update_config(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper_core::Vector2;
    use paper_wire::OscValue;

    fn float(address: &str, value: f32) -> OscMessage {
        OscMessage::new(address, OscValue::Float(value))
    }

    #[test]
    fn test_starts_on_v1() {
        let engine = EyeTrackingEngine::new(&EyeTrackingConfig::default());
        assert_eq!(engine.active_version(), ProtocolVersion::V1);
    }

    #[test]
    fn test_active_mapper_flips_per_message() {
        let mut engine = EyeTrackingEngine::new(&EyeTrackingConfig::default());
        engine.process_message(&float("/v2/EyeLeftX", 0.5));
        assert_eq!(engine.active_version(), ProtocolVersion::V2);

        engine.process_message(&float("/LeftEyeX", -0.5));
        assert_eq!(engine.active_version(), ProtocolVersion::V1);

        let mut out = UnifiedTrackingData::new();
        engine.update(&mut out);
        assert_eq!(out.eye.left.gaze, Vector2::new(-0.5, 0.0));

        // Both mappers kept their own values
        assert_eq!(engine.v2().parameters().eye_left_x, 0.5);
    }

    #[test]
    fn test_unknown_address_still_selects_dialect() {
        let mut engine = EyeTrackingEngine::new(&EyeTrackingConfig::default());
        engine.process_message(&float("/v2/Battery", 0.5));
        assert_eq!(engine.active_version(), ProtocolVersion::V2);
    }

    #[test]
    fn test_failed_message_ignored() {
        let mut engine = EyeTrackingEngine::new(&EyeTrackingConfig::default());
        engine.process_message(&OscMessage::failed("/v2/EyeLid"));
        assert_eq!(engine.active_version(), ProtocolVersion::V1);
        assert_eq!(engine.v2().parameters().eye_lid, 1.0);
    }

    #[test]
    fn test_v2_lids_end_to_end() {
        let mut engine = EyeTrackingEngine::new(&EyeTrackingConfig::default());
        engine.process_message(&float("/v2/EyeLidLeft", 0.9));
        engine.process_message(&float("/v2/EyeLidRight", 0.2));

        let mut out = UnifiedTrackingData::new();
        engine.update(&mut out);
        assert!((out.eye.left.openness - 0.9).abs() < 1e-6);
        assert!((out.eye.right.openness - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_update_config_reaches_both_mappers() {
        let mut engine = EyeTrackingEngine::new(&EyeTrackingConfig::default());
        let mut config = EyeTrackingConfig::default();
        config.should_emulate_eye_widen = true;
        engine.update_config(&config);

        let mut out = UnifiedTrackingData::new();
        engine.update(&mut out);
        assert_eq!(out.eye.left.openness, 0.8);

        engine.process_message(&float("/v2/EyeLid", 1.0));
        engine.update(&mut out);
        assert!(out.eye.left.openness > 1.0);
    }
}
