use crate::buffer::PacketBuffer;
use crate::codec::primitives::{I32, VAR_INT};
use crate::codec::{composite2, versioned, BoxedCodec, Codec, CodecExt};
use crate::metadata::{EntityMetadata, METADATA};
use crate::packet::Packet;
use crate::passthrough::{pass_through, Decoded};
use glider_common::{ProtocolVersion, Result};
use once_cell::sync::Lazy;

/// Updates one or more metadata fields of an entity.
///
/// A metadata list this crate cannot decode is kept as raw bytes and re-sent unchanged; the
/// entity id is always decoded and a failure there fails the packet.
#[derive(Debug, Clone, PartialEq)]
pub struct SetEntityMetadataPacket {
    /// Entity id, an int before 1.8 and a VarInt after.
    pub entity_id: i32,
    /// Decoded entries, or the raw bytes of a list that failed to decode.
    pub metadata: Decoded<EntityMetadata>,
}

impl SetEntityMetadataPacket {
    /// Creates a packet carrying decoded metadata for `entity_id`.
    pub fn new(entity_id: i32, metadata: EntityMetadata) -> Self {
        Self {
            entity_id,
            metadata: Decoded::Value(metadata),
        }
    }
}

static CODEC: Lazy<BoxedCodec<SetEntityMetadataPacket>> = Lazy::new(|| {
    composite2(
        versioned(ProtocolVersion::V1_8, I32, VAR_INT),
        |p: &SetEntityMetadataPacket| &p.entity_id,
        pass_through("SetEntityMetadata", METADATA),
        |p: &SetEntityMetadataPacket| &p.metadata,
        |entity_id, metadata| SetEntityMetadataPacket {
            entity_id,
            metadata,
        },
    )
    .boxed()
});

impl Packet for SetEntityMetadataPacket {
    fn read_from_buffer(buffer: &mut PacketBuffer, version: ProtocolVersion) -> Result<Self> {
        CODEC.decode(buffer, version)
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        CODEC.encode(self, buffer, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MetadataEntry, MetadataValue};

    fn encode(packet: &SetEntityMetadataPacket, version: ProtocolVersion) -> Vec<u8> {
        let mut buffer = PacketBuffer::new();
        packet.write_to_buffer(&mut buffer, version).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_entity_id_width() {
        let packet = SetEntityMetadataPacket::new(7, EntityMetadata::default());
        assert_eq!(encode(&packet, ProtocolVersion::V1_7_6), vec![0, 0, 0, 7, 0x7F]);
        assert_eq!(encode(&packet, ProtocolVersion::V1_8), vec![7, 0x7F]);
        assert_eq!(encode(&packet, ProtocolVersion::V1_9), vec![7, 0xFF]);
    }

    #[test]
    fn test_decodes_known_metadata() {
        let packet = SetEntityMetadataPacket::new(
            1,
            EntityMetadata::new(vec![MetadataEntry::new(0, MetadataValue::Byte(2))]),
        );
        let bytes = encode(&packet, ProtocolVersion::V1_18);
        let mut buffer = PacketBuffer::from_bytes(bytes);
        let decoded = SetEntityMetadataPacket::read_from_buffer(&mut buffer, ProtocolVersion::V1_18).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_unknown_tag_passes_through() {
        // entity 5, index 0, tag 90 (unknown in 1.16), two payload bytes, end marker
        let wire = vec![5, 0, 90, 0xAA, 0xBB, 0xFF];
        let mut buffer = PacketBuffer::from_bytes(wire.clone());
        let packet = SetEntityMetadataPacket::read_from_buffer(&mut buffer, ProtocolVersion::V1_16).unwrap();
        assert_eq!(packet.entity_id, 5);
        assert_eq!(packet.metadata.raw().unwrap().as_ref(), &wire[1..]);
        assert_eq!(encode(&packet, ProtocolVersion::V1_16), wire);
    }

    #[test]
    fn test_bad_entity_id_is_fatal() {
        let mut buffer = PacketBuffer::from_bytes(vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x80]);
        assert!(SetEntityMetadataPacket::read_from_buffer(&mut buffer, ProtocolVersion::V1_16).is_err());
    }
}
