//! OSC datagram decoding
//!
//! Datagram layout (one message, one argument):
//! - Address: `/`-prefixed, NUL-terminated string
//! - Type tags: `,` followed by a NUL-terminated tag string (`s`, `i`, `f`, `T`, `F`)
//! - Argument: NUL-terminated string, big-endian i32/f32, or nothing for `T`/`F`
//!
//! With [`OscFraming::Unpadded`] each string ends right after its terminator.
//! With [`OscFraming::Aligned`] strings are padded to a 4-byte boundary as
//! OSC 1.0 requires.

use bytes::Buf;

use paper_core::{OscFraming, PaperError, PaperResult};

use crate::{tag, OscMessage, OscValue};

/// Decode a datagram, never failing loudly
///
/// Rejected datagrams come back with `success == false`.
pub fn decode(buf: &[u8], framing: OscFraming) -> OscMessage {
    let mut address = String::new();
    match decode_into(buf, framing, &mut address) {
        Ok(value) => OscMessage::new(address, value),
        Err(e) => {
            tracing::debug!("Dropping OSC datagram from {:?}: {}", address, e);
            OscMessage::failed(address)
        }
    }
}

/// Decode a datagram, reporting why it was rejected
pub fn try_decode(buf: &[u8], framing: OscFraming) -> PaperResult<OscMessage> {
    let mut address = String::new();
    let value = decode_into(buf, framing, &mut address)?;
    Ok(OscMessage::new(address, value))
}

fn decode_into(buf: &[u8], framing: OscFraming, address: &mut String) -> PaperResult<OscValue> {
    if buf.first() != Some(&tag::SLASH) {
        return Err(PaperError::InvalidWireFormat(
            "Address must start with '/'".into(),
        ));
    }

    let mut cursor = WireCursor::new(buf, framing);

    *address = cursor.read_string()?;

    if cursor.peek() != Some(tag::COMMA) {
        return Err(PaperError::InvalidWireFormat(
            "Missing ',' before type tags".into(),
        ));
    }
    cursor.advance(1);

    // The comma belongs to the type-tag string for alignment purposes
    let types = cursor.read_string_from(1)?;

    match types.as_bytes() {
        [tag::STRING] => Ok(OscValue::from_osc_string(cursor.read_string()?)),
        [tag::INTEGER] => Ok(OscValue::Integer(cursor.read_i32()?)),
        [tag::FLOAT] => Ok(OscValue::Float(cursor.read_f32()?)),
        [tag::TRUE] => Ok(OscValue::Bool(true)),
        [tag::FALSE] => Ok(OscValue::Bool(false)),
        _ => Err(PaperError::UnsupportedTypeTag(types)),
    }
}

/// Read position over a datagram
struct WireCursor<'a> {
    remaining: &'a [u8],
    consumed: usize,
    framing: OscFraming,
}

impl<'a> WireCursor<'a> {
    fn new(buf: &'a [u8], framing: OscFraming) -> Self {
        WireCursor {
            remaining: buf,
            consumed: 0,
            framing,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.remaining.first().copied()
    }

    fn advance(&mut self, n: usize) {
        self.remaining.advance(n);
        self.consumed += n;
    }

    fn read_string(&mut self) -> PaperResult<String> {
        self.read_string_from(0)
    }

    /// Read a NUL-terminated string whose first `already_read` bytes were
    /// consumed by the caller.
    fn read_string_from(&mut self, already_read: usize) -> PaperResult<String> {
        let end = self
            .remaining
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| PaperError::InvalidWireFormat("Unterminated string".into()))?;

        let value = String::from_utf8_lossy(&self.remaining[..end]).into_owned();
        self.advance(end + 1);

        if self.framing == OscFraming::Aligned {
            let written = already_read + end + 1;
            let padding = (4 - written % 4) % 4;
            // Trailing padding on the last string may be cut short by senders
            self.advance(padding.min(self.remaining.len()));
        }

        Ok(value)
    }

    fn require(&self, n: usize) -> PaperResult<()> {
        if self.remaining.remaining() < n {
            return Err(PaperError::BufferTooShort {
                expected: self.consumed + n,
                actual: self.consumed + self.remaining.remaining(),
            });
        }
        Ok(())
    }

    fn read_i32(&mut self) -> PaperResult<i32> {
        self.require(4)?;
        self.consumed += 4;
        Ok(self.remaining.get_i32())
    }

    fn read_f32(&mut self) -> PaperResult<f32> {
        self.require(4)?;
        self.consumed += 4;
        Ok(self.remaining.get_f32())
    }
}
