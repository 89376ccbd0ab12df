//! OSC datagram encoding
//!
//! Used by the probe sender and by tests; the tracking pipeline itself only
//! receives.

use bytes::{BufMut, BytesMut};

use paper_core::{OscFraming, PaperError, PaperResult};

use crate::{tag, OscMessage, OscValue, MAX_DATAGRAM_SIZE};

/// Encode a single-argument message with the given framing
pub fn encode(message: &OscMessage, framing: OscFraming) -> PaperResult<BytesMut> {
    if !message.address.starts_with('/') {
        return Err(PaperError::InvalidWireFormat(format!(
            "Address must start with '/': {:?}",
            message.address
        )));
    }
    if message.address.as_bytes().contains(&0) {
        return Err(PaperError::InvalidWireFormat(
            "Address contains NUL".into(),
        ));
    }

    let mut buf = BytesMut::with_capacity(message.address.len() + 16);

    put_string(&mut buf, message.address.as_bytes(), framing);
    put_string(&mut buf, &[tag::COMMA, message.value.type_tag()], framing);

    match &message.value {
        OscValue::String(s) => put_string(&mut buf, s.as_bytes(), framing),
        OscValue::IpAddress(ip) => put_string(&mut buf, ip.to_string().as_bytes(), framing),
        OscValue::Integer(v) => buf.put_i32(*v),
        OscValue::Float(v) => buf.put_f32(*v),
        OscValue::Bool(_) => {}
    }

    if buf.len() > MAX_DATAGRAM_SIZE {
        return Err(PaperError::InvalidWireFormat(format!(
            "Encoded message is {} bytes, limit is {}",
            buf.len(),
            MAX_DATAGRAM_SIZE
        )));
    }

    Ok(buf)
}

/// Convenience for the common float case
pub fn encode_float(address: &str, value: f32, framing: OscFraming) -> PaperResult<BytesMut> {
    encode(&OscMessage::new(address, OscValue::Float(value)), framing)
}

fn put_string(buf: &mut BytesMut, bytes: &[u8], framing: OscFraming) {
    buf.put_slice(bytes);
    buf.put_u8(0);
    if framing == OscFraming::Aligned {
        let written = bytes.len() + 1;
        let padding = (4 - written % 4) % 4;
        buf.put_bytes(0, padding);
    }
}
