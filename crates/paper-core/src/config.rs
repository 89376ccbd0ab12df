//! Configuration snapshots
//!
//! A snapshot is a plain value: components receive it at construction or on
//! update and never observe it changing underneath them. Threshold pairs are
//! `[low, high]` and are clamped on every assignment, including when they are
//! decoded from disk.
//!
//! JSON field names stay PascalCase so existing `UnifiedTrackerConfig.json`
//! files keep loading.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::{PaperError, PaperResult};

/// Default UDP port for the eye channel
pub const DEFAULT_EYE_PORT: u16 = 8889;

/// Default host for the face channel
pub const DEFAULT_FACE_HOST: &str = "127.0.0.1";

/// Default UDP port for the face channel
pub const DEFAULT_FACE_PORT: u16 = 8888;

/// How OSC strings are laid out on the wire
///
/// The tracker firmware emits strings without the 4-byte alignment padding
/// required by the OSC 1.0 specification. `Aligned` accepts standard senders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OscFraming {
    #[default]
    Unpadded,
    Aligned,
}

/// The four clamped `[low, high]` threshold pairs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThresholdKind {
    WidenV1,
    WidenV2,
    SqueezeV1,
    SqueezeV2,
}

impl ThresholdKind {
    /// Allowed range of the low element
    pub const LOW_RANGE: (f32, f32) = (0.0, 1.0);

    /// Allowed range of the high element
    pub fn high_range(self) -> (f32, f32) {
        match self {
            ThresholdKind::WidenV1 => (0.0, 2.0),
            ThresholdKind::WidenV2 => (0.0, 2.0),
            ThresholdKind::SqueezeV1 => (0.0, 2.0),
            ThresholdKind::SqueezeV2 => (-2.0, 0.0),
        }
    }

    /// Clamp a pair into this threshold's ranges
    pub fn clamp(self, pair: [f32; 2]) -> [f32; 2] {
        let (lo_min, lo_max) = Self::LOW_RANGE;
        let (hi_min, hi_max) = self.high_range();
        [
            clamp_finite(pair[0], lo_min, lo_max),
            clamp_finite(pair[1], hi_min, hi_max),
        ]
    }

    /// Config field name, as written in the JSON document
    pub fn field_name(self) -> &'static str {
        match self {
            ThresholdKind::WidenV1 => "WidenThresholdV1",
            ThresholdKind::WidenV2 => "WidenThresholdV2",
            ThresholdKind::SqueezeV1 => "SqueezeThresholdV1",
            ThresholdKind::SqueezeV2 => "SqueezeThresholdV2",
        }
    }
}

/// Allowed range of the output multiplier
pub const OUTPUT_MULTIPLIER_RANGE: (f32, f32) = (0.0, 2.0);

// NaN would survive f32::clamp and poison every downstream smoothstep
fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Eye channel configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "EyeTrackingConfigRepr", into = "EyeTrackingConfigRepr")]
pub struct EyeTrackingConfig {
    pub listening_address: IpAddr,
    pub port_number: u16,
    pub should_emulate_eye_widen: bool,
    pub should_emulate_eye_squint: bool,
    pub should_emulate_eyebrows: bool,
    pub eyebrow_threshold_rising: f32,
    pub eyebrow_threshold_lowering: f32,
    squeeze_threshold_v1: [f32; 2],
    widen_threshold_v1: [f32; 2],
    squeeze_threshold_v2: [f32; 2],
    widen_threshold_v2: [f32; 2],
    output_multiplier: f32,
}

impl EyeTrackingConfig {
    /// Socket address the eye listener binds
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listening_address, self.port_number)
    }

    /// Read a threshold pair
    pub fn threshold(&self, kind: ThresholdKind) -> [f32; 2] {
        match kind {
            ThresholdKind::WidenV1 => self.widen_threshold_v1,
            ThresholdKind::WidenV2 => self.widen_threshold_v2,
            ThresholdKind::SqueezeV1 => self.squeeze_threshold_v1,
            ThresholdKind::SqueezeV2 => self.squeeze_threshold_v2,
        }
    }

    /// Assign a threshold pair, clamping each element
    pub fn set_threshold(&mut self, kind: ThresholdKind, pair: [f32; 2]) {
        let clamped = kind.clamp(pair);
        match kind {
            ThresholdKind::WidenV1 => self.widen_threshold_v1 = clamped,
            ThresholdKind::WidenV2 => self.widen_threshold_v2 = clamped,
            ThresholdKind::SqueezeV1 => self.squeeze_threshold_v1 = clamped,
            ThresholdKind::SqueezeV2 => self.squeeze_threshold_v2 = clamped,
        }
    }

    #[inline]
    pub fn widen_threshold_v1(&self) -> [f32; 2] {
        self.widen_threshold_v1
    }

    #[inline]
    pub fn widen_threshold_v2(&self) -> [f32; 2] {
        self.widen_threshold_v2
    }

    #[inline]
    pub fn squeeze_threshold_v1(&self) -> [f32; 2] {
        self.squeeze_threshold_v1
    }

    #[inline]
    pub fn squeeze_threshold_v2(&self) -> [f32; 2] {
        self.squeeze_threshold_v2
    }

    pub fn set_widen_threshold_v1(&mut self, pair: [f32; 2]) {
        self.set_threshold(ThresholdKind::WidenV1, pair);
    }

    pub fn set_widen_threshold_v2(&mut self, pair: [f32; 2]) {
        self.set_threshold(ThresholdKind::WidenV2, pair);
    }

    pub fn set_squeeze_threshold_v1(&mut self, pair: [f32; 2]) {
        self.set_threshold(ThresholdKind::SqueezeV1, pair);
    }

    pub fn set_squeeze_threshold_v2(&mut self, pair: [f32; 2]) {
        self.set_threshold(ThresholdKind::SqueezeV2, pair);
    }

    #[inline]
    pub fn output_multiplier(&self) -> f32 {
        self.output_multiplier
    }

    pub fn set_output_multiplier(&mut self, value: f32) {
        let (min, max) = OUTPUT_MULTIPLIER_RANGE;
        self.output_multiplier = clamp_finite(value, min, max);
    }
}

impl Default for EyeTrackingConfig {
    fn default() -> Self {
        let mut config = EyeTrackingConfig {
            listening_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port_number: DEFAULT_EYE_PORT,
            should_emulate_eye_widen: false,
            should_emulate_eye_squint: false,
            should_emulate_eyebrows: false,
            eyebrow_threshold_rising: 0.8,
            eyebrow_threshold_lowering: 0.15,
            squeeze_threshold_v1: [0.0; 2],
            widen_threshold_v1: [0.0; 2],
            squeeze_threshold_v2: [0.0; 2],
            widen_threshold_v2: [0.0; 2],
            output_multiplier: 1.0,
        };
        config.set_widen_threshold_v1([0.60, 1.0]);
        config.set_widen_threshold_v2([0.60, 1.05]);
        config.set_squeeze_threshold_v1([0.07, 0.5]);
        config.set_squeeze_threshold_v2([0.07, -1.0]);
        config
    }
}

/// On-disk shape of [`EyeTrackingConfig`]; every field goes through the
/// clamping setters on the way in.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct EyeTrackingConfigRepr {
    #[serde(with = "listening_address")]
    listening_address: IpAddr,
    port_number: u16,
    should_emulate_eye_widen: bool,
    should_emulate_eye_squint: bool,
    should_emulate_eyebrows: bool,
    #[serde(rename = "SqueezeThresholdV1")]
    squeeze_threshold_v1: [f32; 2],
    #[serde(rename = "WidenThresholdV1")]
    widen_threshold_v1: [f32; 2],
    #[serde(rename = "SqueezeThresholdV2")]
    squeeze_threshold_v2: [f32; 2],
    #[serde(rename = "WidenThresholdV2")]
    widen_threshold_v2: [f32; 2],
    output_multiplier: f32,
    eyebrow_threshold_rising: f32,
    eyebrow_threshold_lowering: f32,
}

impl Default for EyeTrackingConfigRepr {
    fn default() -> Self {
        EyeTrackingConfig::default().into()
    }
}

impl From<EyeTrackingConfigRepr> for EyeTrackingConfig {
    fn from(repr: EyeTrackingConfigRepr) -> Self {
        let mut config = EyeTrackingConfig {
            listening_address: repr.listening_address,
            port_number: repr.port_number,
            should_emulate_eye_widen: repr.should_emulate_eye_widen,
            should_emulate_eye_squint: repr.should_emulate_eye_squint,
            should_emulate_eyebrows: repr.should_emulate_eyebrows,
            eyebrow_threshold_rising: repr.eyebrow_threshold_rising,
            eyebrow_threshold_lowering: repr.eyebrow_threshold_lowering,
            ..EyeTrackingConfig::default()
        };
        config.set_squeeze_threshold_v1(repr.squeeze_threshold_v1);
        config.set_widen_threshold_v1(repr.widen_threshold_v1);
        config.set_squeeze_threshold_v2(repr.squeeze_threshold_v2);
        config.set_widen_threshold_v2(repr.widen_threshold_v2);
        config.set_output_multiplier(repr.output_multiplier);
        config
    }
}

impl From<EyeTrackingConfig> for EyeTrackingConfigRepr {
    fn from(config: EyeTrackingConfig) -> Self {
        EyeTrackingConfigRepr {
            listening_address: config.listening_address,
            port_number: config.port_number,
            should_emulate_eye_widen: config.should_emulate_eye_widen,
            should_emulate_eye_squint: config.should_emulate_eye_squint,
            should_emulate_eyebrows: config.should_emulate_eyebrows,
            squeeze_threshold_v1: config.squeeze_threshold_v1,
            widen_threshold_v1: config.widen_threshold_v1,
            squeeze_threshold_v2: config.squeeze_threshold_v2,
            widen_threshold_v2: config.widen_threshold_v2,
            output_multiplier: config.output_multiplier,
            eyebrow_threshold_rising: config.eyebrow_threshold_rising,
            eyebrow_threshold_lowering: config.eyebrow_threshold_lowering,
        }
    }
}

/// Listening addresses are stored as strings; anything unreadable means "any".
mod listening_address {
    use std::net::{IpAddr, Ipv4Addr};

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(addr: &IpAddr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(addr)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<IpAddr, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(str::trim)
            .and_then(|s| s.parse().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
    }
}

/// Face channel configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FaceTrackingConfig {
    pub face_host: String,
    pub face_port: u16,
}

impl FaceTrackingConfig {
    /// Socket address the face listener binds
    pub fn socket_addr(&self) -> PaperResult<SocketAddr> {
        let ip: IpAddr = self
            .face_host
            .trim()
            .parse()
            .map_err(|_| PaperError::InvalidAddress(self.face_host.clone()))?;
        Ok(SocketAddr::new(ip, self.face_port))
    }
}

impl Default for FaceTrackingConfig {
    fn default() -> Self {
        FaceTrackingConfig {
            face_host: DEFAULT_FACE_HOST.to_string(),
            face_port: DEFAULT_FACE_PORT,
        }
    }
}

/// Complete configuration document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UnifiedConfig {
    pub eye_tracking: EyeTrackingConfig,
    pub face_tracking: FaceTrackingConfig,
    pub enable_eye_tracking: bool,
    pub enable_face_tracking: bool,
    pub osc_framing: OscFraming,
}

impl Default for UnifiedConfig {
    fn default() -> Self {
        UnifiedConfig {
            eye_tracking: EyeTrackingConfig::default(),
            face_tracking: FaceTrackingConfig::default(),
            enable_eye_tracking: true,
            enable_face_tracking: true,
            osc_framing: OscFraming::Unpadded,
        }
    }
}
