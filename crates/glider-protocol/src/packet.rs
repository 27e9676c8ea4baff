use crate::buffer::PacketBuffer;
use glider_common::{ProtocolError, ProtocolVersion, Result};
use std::any::Any;
use std::fmt;

/// Type-erasure helper. Implemented for every sized `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

/// Packet trait. A packet knows how to read and write its body for a given protocol version;
/// the numeric id comes from the packet registry and is written by the frame codec.
pub trait Packet: AsAny + Send + Sync + fmt::Debug {
    /// Human readable name used in logs.
    fn packet_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Reads the packet body. The default is used for packets this side only ever sends.
    fn read_from_buffer(_buffer: &mut PacketBuffer, _version: ProtocolVersion) -> Result<Self>
    where
        Self: Sized,
    {
        Err(ProtocolError::invalid(format!(
            "{} is encode-only",
            short_type_name(std::any::type_name::<Self>())
        )))
    }

    /// Writes the packet body. The default is used for packets this side only ever receives.
    fn write_to_buffer(&self, _buffer: &mut PacketBuffer, _version: ProtocolVersion) -> Result<()> {
        Err(ProtocolError::invalid(format!(
            "{} is decode-only",
            self.packet_name()
        )))
    }
}

impl dyn Packet {
    pub fn downcast_ref<P: Packet>(&self) -> Option<&P> {
        self.as_any().downcast_ref::<P>()
    }

    pub fn is<P: Packet>(&self) -> bool {
        self.as_any().is::<P>()
    }

    pub fn downcast<P: Packet>(self: Box<Self>) -> std::result::Result<Box<P>, Box<dyn Any + Send + Sync>> {
        self.into_any().downcast::<P>()
    }
}

pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}
