//! OSC message model
//!
//! Only the single-argument subset the trackers emit is modelled: one address,
//! one type tag, one value.

use std::fmt;
use std::net::IpAddr;

/// OSC type tag characters understood by the decoder
pub mod tag {
    pub const STRING: u8 = b's';
    pub const INTEGER: u8 = b'i';
    pub const FLOAT: u8 = b'f';
    pub const TRUE: u8 = b'T';
    pub const FALSE: u8 = b'F';
    /// Separator that opens the type-tag string
    pub const COMMA: u8 = b',';
    /// First byte of every address
    pub const SLASH: u8 = b'/';
}

/// Decoded OSC argument
#[derive(Clone, Debug, PartialEq)]
pub enum OscValue {
    String(String),
    Integer(i32),
    Float(f32),
    Bool(bool),
    /// A string argument that parsed as an IP literal
    IpAddress(IpAddr),
}

impl OscValue {
    /// Wire type tag this value travels under
    pub fn type_tag(&self) -> u8 {
        match self {
            OscValue::String(_) | OscValue::IpAddress(_) => tag::STRING,
            OscValue::Integer(_) => tag::INTEGER,
            OscValue::Float(_) => tag::FLOAT,
            OscValue::Bool(true) => tag::TRUE,
            OscValue::Bool(false) => tag::FALSE,
        }
    }

    /// Classify a decoded string argument
    pub fn from_osc_string(value: String) -> Self {
        match value.parse::<IpAddr>() {
            Ok(ip) => OscValue::IpAddress(ip),
            Err(_) => OscValue::String(value),
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            OscValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Short name of the variant, used in logs and coercion errors
    pub fn kind(&self) -> &'static str {
        match self {
            OscValue::String(_) => "string",
            OscValue::Integer(_) => "integer",
            OscValue::Float(_) => "float",
            OscValue::Bool(_) => "bool",
            OscValue::IpAddress(_) => "ip-address",
        }
    }
}

impl fmt::Display for OscValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscValue::String(s) => write!(f, "{:?}", s),
            OscValue::Integer(i) => write!(f, "{}", i),
            OscValue::Float(v) => write!(f, "{}", v),
            OscValue::Bool(b) => write!(f, "{}", b),
            OscValue::IpAddress(ip) => write!(f, "{}", ip),
        }
    }
}

/// A decoded datagram
///
/// `success == false` marks a datagram the decoder rejected. Its `address`
/// may be partially filled and its `value` is a placeholder; such messages
/// are never routed.
#[derive(Clone, Debug, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub success: bool,
    pub value: OscValue,
}

impl OscMessage {
    /// A successfully decoded message
    pub fn new(address: impl Into<String>, value: OscValue) -> Self {
        OscMessage {
            address: address.into(),
            success: true,
            value,
        }
    }

    /// A rejected datagram
    pub fn failed(address: impl Into<String>) -> Self {
        OscMessage {
            address: address.into(),
            success: false,
            value: OscValue::Bool(false),
        }
    }

    /// Trailing path segment, e.g. `EyeLidLeft` for `/v2/EyeLidLeft`
    pub fn parameter_name(&self) -> &str {
        self.address.rsplit('/').next().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_reclassification() {
        assert!(matches!(
            OscValue::from_osc_string("10.0.0.5".into()),
            OscValue::IpAddress(_)
        ));
        assert!(matches!(
            OscValue::from_osc_string("::1".into()),
            OscValue::IpAddress(_)
        ));
        assert_eq!(
            OscValue::from_osc_string("hello".into()),
            OscValue::String("hello".into())
        );
        assert_eq!(
            OscValue::from_osc_string(String::new()),
            OscValue::String(String::new())
        );
    }

    #[test]
    fn test_parameter_name() {
        assert_eq!(OscMessage::new("/v2/EyeLidLeft", OscValue::Float(0.0)).parameter_name(), "EyeLidLeft");
        assert_eq!(OscMessage::new("/EyesY", OscValue::Float(0.0)).parameter_name(), "EyesY");
        assert_eq!(OscMessage::new("/a/b/", OscValue::Float(0.0)).parameter_name(), "");
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(OscValue::Float(1.0).type_tag(), b'f');
        assert_eq!(OscValue::Bool(true).type_tag(), b'T');
        assert_eq!(OscValue::Bool(false).type_tag(), b'F');
        assert_eq!(OscValue::IpAddress("1.2.3.4".parse().unwrap()).type_tag(), b's');
    }
}
