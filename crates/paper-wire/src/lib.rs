//! PaperTracker OSC wire layer
//!
//! This crate contains:
//! - The single-argument OSC message model
//! - Datagram decoding (unpadded and 4-byte aligned framing)
//! - Datagram encoding for senders and tests

pub mod decode;
pub mod encode;
pub mod message;

pub use decode::*;
pub use encode::*;
pub use message::*;

/// Largest datagram the listeners read; longer datagrams are truncated by
/// the socket and then fail to decode.
pub const MAX_DATAGRAM_SIZE: usize = 4096;
