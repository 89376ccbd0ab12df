//! Config command channel
//!
//! The eye stream may carry `/command/set/<field>` messages that adjust live
//! thresholds. `<field>` is one of the names in [`CONFIG_FIELDS`]; each entry
//! binds to a typed setter on [`EyeTrackingConfig`]. Paired-half fields
//! (`..._min` / `..._max`) update one end of a threshold pair and keep the
//! other end from the current snapshot.

use std::fmt;

use paper_core::{EyeTrackingConfig, PaperError, PaperResult, UnifiedConfig};
use paper_wire::OscValue;

/// Marker that routes an eye-port address to the command channel
pub const COMMAND_MARKER: &str = "/command/";

/// Does this address belong to the command namespace?
pub fn is_command_address(address: &str) -> bool {
    address.contains(COMMAND_MARKER)
}

/// Extract `<field>` from `/command/set/<field>[/...]`
///
/// The verb is matched case-insensitively; any other verb yields `None`.
pub fn parse_command_address(address: &str) -> Option<&str> {
    let parts: Vec<&str> = address.split('/').collect();
    if parts.len() >= 4 && parts[2].eq_ignore_ascii_case("set") && !parts[3].is_empty() {
        Some(parts[3])
    } else {
        None
    }
}

/// Which end of a threshold pair a half-field writes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Half {
    Min,
    Max,
}

impl Half {
    /// `_min` selects the low end; anything else the high end
    pub fn of_field(osc_name: &str) -> Self {
        match osc_name.rsplit('_').next() {
            Some("min") => Half::Min,
            _ => Half::Max,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Half::Min => 0,
            Half::Max => 1,
        }
    }
}

/// Typed access to one configuration field
#[derive(Clone, Copy)]
pub enum FieldBinding {
    Port(fn(&mut EyeTrackingConfig, u16)),
    Flag(fn(&mut EyeTrackingConfig, bool)),
    Scalar(fn(&mut EyeTrackingConfig, f32)),
    /// One end of a `[low, high]` pair
    Half {
        get: fn(&EyeTrackingConfig) -> [f32; 2],
        set: fn(&mut EyeTrackingConfig, [f32; 2]),
    },
}

impl FieldBinding {
    fn expected(&self) -> &'static str {
        match self {
            FieldBinding::Port(_) => "a port number",
            FieldBinding::Flag(_) => "a boolean",
            FieldBinding::Scalar(_) | FieldBinding::Half { .. } => "a number",
        }
    }
}

impl fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            FieldBinding::Port(_) => "Port",
            FieldBinding::Flag(_) => "Flag",
            FieldBinding::Scalar(_) => "Scalar",
            FieldBinding::Half { .. } => "Half",
        };
        f.write_str(kind)
    }
}

/// One row of the command table
#[derive(Clone, Copy, Debug)]
pub struct ConfigField {
    /// Name carried in the OSC address
    pub osc_name: &'static str,
    /// Name of the field in the configuration document
    pub config_name: &'static str,
    pub binding: FieldBinding,
}

const fn half(
    osc_name: &'static str,
    config_name: &'static str,
    get: fn(&EyeTrackingConfig) -> [f32; 2],
    set: fn(&mut EyeTrackingConfig, [f32; 2]),
) -> ConfigField {
    ConfigField {
        osc_name,
        config_name,
        binding: FieldBinding::Half { get, set },
    }
}

/// Every field the command channel can write
pub static CONFIG_FIELDS: &[ConfigField] = &[
    ConfigField {
        osc_name: "gui_VRCFTModulePort",
        config_name: "PortNumber",
        binding: FieldBinding::Port(|c, v| c.port_number = v),
    },
    ConfigField {
        osc_name: "gui_ShouldEmulateEyeWiden",
        config_name: "ShouldEmulateEyeWiden",
        binding: FieldBinding::Flag(|c, v| c.should_emulate_eye_widen = v),
    },
    ConfigField {
        osc_name: "gui_ShouldEmulateEyeSquint",
        config_name: "ShouldEmulateEyeSquint",
        binding: FieldBinding::Flag(|c, v| c.should_emulate_eye_squint = v),
    },
    ConfigField {
        osc_name: "gui_ShouldEmulateEyebrows",
        config_name: "ShouldEmulateEyebrows",
        binding: FieldBinding::Flag(|c, v| c.should_emulate_eyebrows = v),
    },
    half(
        "gui_WidenThresholdV1_min",
        "WidenThresholdV1",
        EyeTrackingConfig::widen_threshold_v1,
        EyeTrackingConfig::set_widen_threshold_v1,
    ),
    half(
        "gui_WidenThresholdV1_max",
        "WidenThresholdV1",
        EyeTrackingConfig::widen_threshold_v1,
        EyeTrackingConfig::set_widen_threshold_v1,
    ),
    half(
        "gui_WidenThresholdV2_min",
        "WidenThresholdV2",
        EyeTrackingConfig::widen_threshold_v2,
        EyeTrackingConfig::set_widen_threshold_v2,
    ),
    half(
        "gui_WidenThresholdV2_max",
        "WidenThresholdV2",
        EyeTrackingConfig::widen_threshold_v2,
        EyeTrackingConfig::set_widen_threshold_v2,
    ),
    half(
        "gui_SqueezeThresholdV1_min",
        "SqueezeThresholdV1",
        EyeTrackingConfig::squeeze_threshold_v1,
        EyeTrackingConfig::set_squeeze_threshold_v1,
    ),
    half(
        "gui_SqueezeThresholdV1_max",
        "SqueezeThresholdV1",
        EyeTrackingConfig::squeeze_threshold_v1,
        EyeTrackingConfig::set_squeeze_threshold_v1,
    ),
    half(
        "gui_SqueezeThresholdV2_min",
        "SqueezeThresholdV2",
        EyeTrackingConfig::squeeze_threshold_v2,
        EyeTrackingConfig::set_squeeze_threshold_v2,
    ),
    half(
        "gui_SqueezeThresholdV2_max",
        "SqueezeThresholdV2",
        EyeTrackingConfig::squeeze_threshold_v2,
        EyeTrackingConfig::set_squeeze_threshold_v2,
    ),
    ConfigField {
        osc_name: "gui_EyebrowThresholdRising",
        config_name: "EyebrowThresholdRising",
        binding: FieldBinding::Scalar(|c, v| c.eyebrow_threshold_rising = v),
    },
    ConfigField {
        osc_name: "gui_EyebrowThresholdLowering",
        config_name: "EyebrowThresholdLowering",
        binding: FieldBinding::Scalar(|c, v| c.eyebrow_threshold_lowering = v),
    },
    ConfigField {
        osc_name: "gui_OutputMultiplier",
        config_name: "OutputMultiplier",
        binding: FieldBinding::Scalar(EyeTrackingConfig::set_output_multiplier),
    },
];

/// Look up a command field by its OSC name
pub fn lookup_field(osc_name: &str) -> Option<&'static ConfigField> {
    CONFIG_FIELDS.iter().find(|f| f.osc_name == osc_name)
}

fn coerce_f32(value: &OscValue) -> Option<f32> {
    match value {
        OscValue::Float(v) => Some(*v),
        OscValue::Integer(v) => Some(*v as f32),
        OscValue::String(s) => s.trim().parse().ok(),
        OscValue::Bool(_) | OscValue::IpAddress(_) => None,
    }
}

fn coerce_bool(value: &OscValue) -> Option<bool> {
    match value {
        OscValue::Bool(v) => Some(*v),
        OscValue::Integer(v) => Some(*v != 0),
        OscValue::Float(v) => Some(*v != 0.0),
        OscValue::String(_) | OscValue::IpAddress(_) => None,
    }
}

fn coerce_port(value: &OscValue) -> Option<u16> {
    match value {
        OscValue::Integer(v) => u16::try_from(*v).ok(),
        OscValue::Float(v) if v.fract() == 0.0 && (0.0..=u16::MAX as f32).contains(v) => {
            Some(*v as u16)
        }
        _ => None,
    }
}

/// A validated mutation, ready to be applied to a snapshot
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigUpdate {
    Port(u16),
    Flag(bool),
    Scalar(f32),
    Half(Half, f32),
}

impl fmt::Display for ConfigUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigUpdate::Port(v) => write!(f, "{}", v),
            ConfigUpdate::Flag(v) => write!(f, "{}", v),
            ConfigUpdate::Scalar(v) => write!(f, "{}", v),
            ConfigUpdate::Half(half, v) => write!(f, "{:?} half = {}", half, v),
        }
    }
}

/// Coerce an OSC value for `field` without touching any configuration
pub fn validate(field: &ConfigField, value: &OscValue) -> PaperResult<ConfigUpdate> {
    let update = match field.binding {
        FieldBinding::Port(_) => coerce_port(value).map(ConfigUpdate::Port),
        FieldBinding::Flag(_) => coerce_bool(value).map(ConfigUpdate::Flag),
        FieldBinding::Scalar(_) => coerce_f32(value).map(ConfigUpdate::Scalar),
        FieldBinding::Half { .. } => {
            coerce_f32(value).map(|v| ConfigUpdate::Half(Half::of_field(field.osc_name), v))
        }
    };

    update.ok_or(PaperError::ConfigTypeMismatch {
        field: field.config_name,
        expected: field.binding.expected(),
    })
}

/// Produce a new snapshot with `osc_name` set to `value`.
///
/// The field and value are validated before anything is written, so an
/// error leaves no partial change behind. The returned string describes the
/// stored value for logging.
pub fn apply_command(
    current: &UnifiedConfig,
    osc_name: &str,
    value: &OscValue,
) -> PaperResult<(UnifiedConfig, String)> {
    let field =
        lookup_field(osc_name).ok_or_else(|| PaperError::UnknownConfigField(osc_name.to_string()))?;
    let update = validate(field, value)?;

    let mut next = current.clone();
    let eye = &mut next.eye_tracking;

    let described = match (field.binding, update) {
        (FieldBinding::Port(set), ConfigUpdate::Port(v)) => {
            set(eye, v);
            v.to_string()
        }
        (FieldBinding::Flag(set), ConfigUpdate::Flag(v)) => {
            set(eye, v);
            v.to_string()
        }
        (FieldBinding::Scalar(set), ConfigUpdate::Scalar(v)) => {
            set(eye, v);
            v.to_string()
        }
        (FieldBinding::Half { get, set }, ConfigUpdate::Half(half, v)) => {
            let mut pair = get(eye);
            pair[half.index()] = v;
            set(eye, pair);
            let stored = get(eye);
            format!("[{}, {}]", stored[0], stored[1])
        }
        _ => {
            return Err(PaperError::ConfigTypeMismatch {
                field: field.config_name,
                expected: field.binding.expected(),
            })
        }
    };

    Ok((next, described))
}
