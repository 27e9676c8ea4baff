//! Pass-through capture for values whose decode may fail on unknown variant tags.
//!
//! On failure the bytes from the start of the value to the end of the frame are kept verbatim,
//! logged, and written back unchanged when the owning packet is re-encoded.

use crate::buffer::PacketBuffer;
use crate::codec::Codec;
use bytes::Bytes;
use glider_common::{ProtocolVersion, Result};
use std::fmt::Write as _;

/// Either a decoded value or the raw bytes it could not be decoded from.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Value(T),
    Raw(Bytes),
}

impl<T> Decoded<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Decoded::Value(value) => Some(value),
            Decoded::Raw(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Decoded::Value(value) => Some(value),
            Decoded::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&Bytes> {
        match self {
            Decoded::Raw(raw) => Some(raw),
            Decoded::Value(_) => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Decoded::Raw(_))
    }

    /// Writes the value with `write`, or the captured bytes as they were received.
    pub fn write_with<F>(&self, buffer: &mut PacketBuffer, write: F) -> Result<()>
    where
        F: FnOnce(&T, &mut PacketBuffer) -> Result<()>,
    {
        match self {
            Decoded::Value(value) => write(value, buffer),
            Decoded::Raw(raw) => {
                buffer.write_bytes_raw(raw);
                Ok(())
            }
        }
    }
}

impl<T> From<T> for Decoded<T> {
    fn from(value: T) -> Self {
        Decoded::Value(value)
    }
}

/// Runs `read`; if it fails, rewinds and captures everything up to the end of the frame.
pub fn capture<T, F>(
    buffer: &mut PacketBuffer,
    packet: &'static str,
    version: ProtocolVersion,
    read: F,
) -> Decoded<T>
where
    F: FnOnce(&mut PacketBuffer) -> Result<T>,
{
    let start = buffer.get_cursor();
    match read(buffer) {
        Ok(value) => Decoded::Value(value),
        Err(err) => {
            buffer.set_cursor(start);
            let raw = buffer.read_remaining();
            tracing::warn!(
                packet,
                version = %version,
                error = %err,
                length = raw.len(),
                bytes = %hex_dump(&raw),
                "could not decode value, forwarding raw bytes"
            );
            Decoded::Raw(raw)
        }
    }
}

/// Wraps a codec so decode failures are captured instead of returned. Only valid for the last
/// field of a packet, since the capture runs to the end of the frame.
pub struct PassThrough<C> {
    inner: C,
    packet: &'static str,
}

pub fn pass_through<C>(packet: &'static str, inner: C) -> PassThrough<C> {
    PassThrough { inner, packet }
}

impl<T, C: Codec<T>> Codec<Decoded<T>> for PassThrough<C> {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<Decoded<T>> {
        Ok(capture(buf, self.packet, version, |b| self.inner.decode(b, version)))
    }

    fn encode(&self, value: &Decoded<T>, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        value.write_with(buf, |v, b| self.inner.encode(v, b, version))
    }
}

/// Space separated lowercase hex.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (index, byte) in bytes.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
