//! Chunk data and update light packets. Both are only ever sent by the server, so neither
//! has a decoder.

use crate::column::ChunkSnapshot;
use crate::serializer::{ChunkSerializer, Selection};
use glider_common::{ProtocolVersion, Result};
use glider_protocol::buffer::PacketBuffer;
use glider_protocol::packet::Packet;
use std::fmt;
use std::sync::Arc;

/// Chunk Data packet
/// Sends a column (or part of one before 1.17) from a world snapshot.
pub struct ChunkDataPacket {
    /// Column to send, read when the packet is written.
    pub snapshot: Arc<dyn ChunkSnapshot>,
    /// Shared serializer holding the mapping tables and config.
    pub serializer: Arc<ChunkSerializer>,
    /// Sections to include. Ignored from 1.17, where every chunk is full.
    pub selection: Selection,
}

impl ChunkDataPacket {
    /// Creates a packet for the full column.
    pub fn new(snapshot: Arc<dyn ChunkSnapshot>, serializer: Arc<ChunkSerializer>) -> Self {
        Self {
            snapshot,
            serializer,
            selection: Selection::Full,
        }
    }

    /// Restricts the packet to `selection`.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }
}

impl fmt::Debug for ChunkDataPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkDataPacket")
            .field("x", &self.snapshot.x())
            .field("z", &self.snapshot.z())
            .field("selection", &self.selection)
            .finish()
    }
}

impl Packet for ChunkDataPacket {
    fn write_to_buffer(&self, buffer: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        self.serializer
            .write_chunk(self.snapshot.as_ref(), self.selection, buffer, version)
    }
}

/// Update Light packet
/// Light of a column, sent separately from the chunk between 1.14 and 1.17.1.
pub struct UpdateLightPacket {
    /// Column whose light sections are sent.
    pub snapshot: Arc<dyn ChunkSnapshot>,
    pub serializer: Arc<ChunkSerializer>,
}

impl UpdateLightPacket {
    /// Creates a light packet for the column. Writing it fails outside 1.14 to 1.17.1.
    pub fn new(snapshot: Arc<dyn ChunkSnapshot>, serializer: Arc<ChunkSerializer>) -> Self {
        Self { snapshot, serializer }
    }
}

impl fmt::Debug for UpdateLightPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateLightPacket")
            .field("x", &self.snapshot.x())
            .field("z", &self.snapshot.z())
            .finish()
    }
}

impl Packet for UpdateLightPacket {
    fn write_to_buffer(&self, buffer: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        self.serializer
            .write_light(self.snapshot.as_ref(), buffer, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::SimpleProperties;
    use crate::column::{ChunkColumn, Dimension};
    use glider_common::{CodecConfig, IdentityMappings};

    fn packets() -> (ChunkDataPacket, UpdateLightPacket) {
        let snapshot: Arc<dyn ChunkSnapshot> = Arc::new(ChunkColumn::new(7, -7, Dimension::LEGACY_OVERWORLD));
        let serializer = Arc::new(ChunkSerializer::new(
            Arc::new(IdentityMappings),
            Arc::new(SimpleProperties),
            CodecConfig::default(),
        ));
        (
            ChunkDataPacket::new(snapshot.clone(), serializer.clone()),
            UpdateLightPacket::new(snapshot, serializer),
        )
    }

    #[test]
    fn test_packet_names() {
        let (chunk, light) = packets();
        assert_eq!(chunk.packet_name(), "ChunkDataPacket");
        assert_eq!(light.packet_name(), "UpdateLightPacket");
    }

    #[test]
    fn test_encode_only() {
        let mut buffer = PacketBuffer::new();
        assert!(ChunkDataPacket::read_from_buffer(&mut buffer, ProtocolVersion::V1_16).is_err());
        assert!(UpdateLightPacket::read_from_buffer(&mut buffer, ProtocolVersion::V1_16).is_err());
    }

    #[test]
    fn test_light_packet_only_between_1_14_and_1_17_1() {
        let (_, light) = packets();
        let mut buffer = PacketBuffer::new();
        assert!(light.write_to_buffer(&mut buffer, ProtocolVersion::V1_13_2).is_err());
        assert!(light.write_to_buffer(&mut buffer, ProtocolVersion::V1_18).is_err());
        assert!(light.write_to_buffer(&mut buffer, ProtocolVersion::V1_17_1).is_ok());
    }

    #[test]
    fn test_chunk_packet_writes_serializer_output() {
        let (chunk, _) = packets();
        let mut direct = PacketBuffer::new();
        chunk
            .serializer
            .write_chunk(chunk.snapshot.as_ref(), Selection::Full, &mut direct, ProtocolVersion::V1_15_2)
            .unwrap();
        let mut via_packet = PacketBuffer::new();
        chunk.write_to_buffer(&mut via_packet, ProtocolVersion::V1_15_2).unwrap();
        assert_eq!(direct.into_inner(), via_packet.into_inner());
    }
}
