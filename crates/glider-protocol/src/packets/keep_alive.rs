use crate::buffer::PacketBuffer;
use crate::codec::primitives::{I32, I64, VAR_INT};
use crate::codec::{composite1, BoxedCodec, Codec, CodecExt, VersionSwitch};
use crate::packet::Packet;
use glider_common::{ProtocolError, ProtocolVersion, Result};
use once_cell::sync::Lazy;

/// Sent by both sides; the receiver echoes the id back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAlivePacket {
    /// Narrowed to an int on versions before 1.12.2; ids that do not fit fail to encode.
    pub keep_alive_id: i64,
}

impl KeepAlivePacket {
    /// Creates a keep alive carrying `keep_alive_id`.
    pub fn new(keep_alive_id: i64) -> Self {
        Self { keep_alive_id }
    }
}

fn narrow(value: &i64) -> Result<i32> {
    i32::try_from(*value)
        .map_err(|_| ProtocolError::invalid(format!("keep alive id {} needs 1.12.2", value)))
}

static CODEC: Lazy<BoxedCodec<KeepAlivePacket>> = Lazy::new(|| {
    // int in 1.7, VarInt until 1.12.1, long afterwards
    let id = VersionSwitch::new()
        .from(
            ProtocolVersion::V1_7_2,
            I32.try_map(|v: i32| Ok(v as i64), narrow).boxed(),
        )
        .from(
            ProtocolVersion::V1_8,
            VAR_INT.try_map(|v: i32| Ok(v as i64), narrow).boxed(),
        )
        .from(ProtocolVersion::V1_12_2, I64.boxed());
    composite1(
        id,
        |p: &KeepAlivePacket| &p.keep_alive_id,
        |keep_alive_id| KeepAlivePacket { keep_alive_id },
    )
    .boxed()
});

impl Packet for KeepAlivePacket {
    fn read_from_buffer(buffer: &mut PacketBuffer, version: ProtocolVersion) -> Result<Self> {
        CODEC.decode(buffer, version)
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        CODEC.encode(self, buffer, version)
    }
}
