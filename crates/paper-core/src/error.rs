//! Error types for the tracking pipeline

use std::net::SocketAddr;

use thiserror::Error;

/// Core PaperTracker errors
#[derive(Error, Debug)]
pub enum PaperError {
    // Wire errors
    #[error("Invalid wire format: {0}")]
    InvalidWireFormat(String),

    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Unsupported OSC type tag: {0:?}")]
    UnsupportedTypeTag(String),

    // Transport errors
    #[error("Listener already registered on port {0}")]
    ListenerExists(u16),

    #[error("Address already in use: {0}")]
    AddressInUse(SocketAddr),

    #[error("Failed to bind {addr}: {reason}")]
    BindFailed { addr: SocketAddr, reason: String },

    #[error("Transport error: {0}")]
    TransportError(String),

    // Configuration errors
    #[error("Unknown config field: {0}")]
    UnknownConfigField(String),

    #[error("Config field {field} expects {expected}")]
    ConfigTypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Config I/O error: {0}")]
    ConfigIo(String),

    #[error("Config decode error: {0}")]
    ConfigDecode(String),

    #[error("Invalid network address: {0}")]
    InvalidAddress(String),
}

impl PaperError {
    /// Wire errors are expected on a noisy UDP stream and never escalate
    pub fn is_wire(&self) -> bool {
        matches!(
            self,
            PaperError::InvalidWireFormat(_)
                | PaperError::BufferTooShort { .. }
                | PaperError::UnsupportedTypeTag(_)
        )
    }
}

/// Result type for PaperTracker operations
pub type PaperResult<T> = Result<T, PaperError>;
