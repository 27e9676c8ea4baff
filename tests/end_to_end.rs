use bytes::{Bytes, BytesMut};
use futures::SinkExt;
use glider::registry::CHUNK_DATA;
use glider::Engine;
use glider_common::{CodecConfig, Direction, IdentityMappings, ProtocolVersion};
use glider_nbt::Tag;
use glider_protocol::packets::KeepAlivePacket;
use glider_protocol::{Inbound, Packet, PacketBuffer};
use glider_world::{BlockState, ChunkColumn, ChunkSection, ChunkSnapshot, Dimension, Selection, SimpleProperties};
use std::sync::Arc;
use tokio_util::codec::{Decoder, Encoder, FramedWrite};

fn engine(config: CodecConfig) -> Engine {
    Engine::new(config, Arc::new(IdentityMappings), Arc::new(SimpleProperties)).unwrap()
}

/// One full ground section of a single block, nothing else.
fn ground() -> Arc<dyn ChunkSnapshot> {
    let mut column = ChunkColumn::new(1, -1, Dimension::LEGACY_OVERWORLD);
    column.set_section(0, Some(ChunkSection::filled(BlockState(1 << 4), 1)));
    Arc::new(column)
}

/// Sends a chunk through the server codec and reads the frame back on the client side.
fn round_trip_chunk(engine: &Engine, version: ProtocolVersion) -> (i32, Bytes) {
    let mut wire = BytesMut::new();
    let packet: Box<dyn Packet> = Box::new(engine.chunk_packet(ground(), Selection::Full));
    engine
        .codec(Direction::Serverbound, version)
        .encode(packet, &mut wire)
        .unwrap();

    let mut client = engine.codec(Direction::Clientbound, version);
    match client.decode(&mut wire).unwrap() {
        Some(Inbound::Unknown { id, body }) => (id, body),
        other => panic!("expected an opaque chunk frame, got {:?}", other),
    }
}

fn spanning(longs: &[i64], bits: usize, index: usize) -> u64 {
    let bit = index * bits;
    let (long, offset) = (bit / 64, bit % 64);
    let mut value = (longs[long] as u64) >> offset;
    if offset + bits > 64 {
        value |= (longs[long + 1] as u64) << (64 - offset);
    }
    value & ((1 << bits) - 1)
}

fn padded(longs: &[i64], bits: usize, index: usize) -> u64 {
    let per_long = 64 / bits;
    let offset = (index % per_long) * bits;
    ((longs[index / per_long] as u64) >> offset) & ((1 << bits) - 1)
}

fn heightmap(tag: Tag, kind: &str) -> Vec<i64> {
    match tag {
        Tag::Compound(mut compound) => match compound.shift_remove(kind) {
            Some(Tag::LongArray(longs)) => longs,
            other => panic!("{} is {:?}", kind, other),
        },
        other => panic!("heightmaps are {:?}", other),
    }
}

#[test]
fn test_ground_section_across_epochs() {
    let engine = engine(CodecConfig::default());

    let (id, legacy) = round_trip_chunk(&engine, ProtocolVersion::V1_15_2);
    assert_eq!(id, 0x22);
    let (id, modern) = round_trip_chunk(&engine, ProtocolVersion::V1_18_2);
    assert_eq!(id, 0x22);
    assert_ne!(legacy, modern);

    // 1.15.2: x, z, full, mask, heightmaps with values spanning longs
    let mut body = PacketBuffer::from_bytes(legacy.to_vec());
    assert_eq!(body.read_i32().unwrap(), 1);
    assert_eq!(body.read_i32().unwrap(), -1);
    assert!(body.read_bool().unwrap());
    assert_eq!(body.read_varint().unwrap(), 1);
    let heightmaps = body.read_nbt(ProtocolVersion::V1_15_2).unwrap().unwrap();
    for kind in ["MOTION_BLOCKING", "WORLD_SURFACE"] {
        let longs = heightmap(heightmaps.clone(), kind);
        assert_eq!(longs.len(), 36);
        for index in 0..256 {
            assert_eq!(spanning(&longs, 9, index), 16, "{} at {}", kind, index);
        }
    }

    // 1.18.2: x, z, heightmaps with values padded to whole longs
    let mut body = PacketBuffer::from_bytes(modern.to_vec());
    body.advance_cursor(8);
    let heightmaps = body.read_nbt(ProtocolVersion::V1_18_2).unwrap().unwrap();
    for kind in ["MOTION_BLOCKING", "WORLD_SURFACE"] {
        let longs = heightmap(heightmaps.clone(), kind);
        assert_eq!(longs.len(), 37);
        for index in 0..256 {
            assert_eq!(padded(&longs, 9, index), 16, "{} at {}", kind, index);
        }
    }

    // the single-block section is a single value container from 1.18
    body.read_varint().unwrap();
    assert_eq!(body.read_i16().unwrap(), 4096);
    assert_eq!(body.read_u8().unwrap(), 0);
    assert_eq!(body.read_varint().unwrap(), 1 << 4);
    assert_eq!(body.read_varint().unwrap(), 0);
    // biomes: single value 1
    assert_eq!(body.read_u8().unwrap(), 0);
    assert_eq!(body.read_varint().unwrap(), 1);
}

#[test]
fn test_chunk_ids_follow_the_table() {
    let engine = engine(CodecConfig::default());
    for mapping in CHUNK_DATA {
        let (id, _) = round_trip_chunk(&engine, mapping.from);
        assert_eq!(id, mapping.id, "{}", mapping.from);
    }
}

#[test]
fn test_keep_alive_survives_compression() {
    let config = CodecConfig {
        compression_threshold: Some(0),
        ..CodecConfig::default()
    };
    let engine = engine(config);
    let mut wire = BytesMut::new();
    let packet: Box<dyn Packet> = Box::new(KeepAlivePacket::new(0x0102_0304_0506));
    engine
        .codec(Direction::Clientbound, ProtocolVersion::V1_20_5)
        .encode(packet, &mut wire)
        .unwrap();

    let mut server = engine.codec(Direction::Serverbound, ProtocolVersion::V1_20_5);
    match server.decode(&mut wire).unwrap() {
        Some(Inbound::Known(packet)) => {
            let keep_alive = packet.downcast_ref::<KeepAlivePacket>().unwrap();
            assert_eq!(keep_alive.keep_alive_id, 0x0102_0304_0506);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(wire.is_empty());
}

#[tokio::test]
async fn test_chunk_written_to_a_stream() {
    let engine = engine(CodecConfig::default());
    let version = ProtocolVersion::V1_8;

    let mut expected = BytesMut::new();
    let packet: Box<dyn Packet> = Box::new(engine.chunk_packet(ground(), Selection::Full));
    engine
        .codec(Direction::Serverbound, version)
        .encode(packet, &mut expected)
        .unwrap();

    let mock = tokio_test::io::Builder::new().write(&expected).build();
    let mut framed = FramedWrite::new(mock, engine.codec(Direction::Serverbound, version));
    let packet: Box<dyn Packet> = Box::new(engine.chunk_packet(ground(), Selection::Full));
    framed.send(packet).await.unwrap();
}
