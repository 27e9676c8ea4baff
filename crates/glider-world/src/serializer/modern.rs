//! 1.18 onwards: every section is sent, each as a block container and a biome container, with
//! the light data appended to the chunk packet.

use super::{light, ChunkSerializer, ContainerFormat, ContainerPlan, DEFAULT_BIOME};
use crate::column::ChunkSnapshot;
use crate::heightmap::{Heightmap, HeightmapKind};
use glider_common::{ProtocolVersion, Result};
use glider_nbt::{Compound, Tag};
use glider_protocol::buffer::PacketBuffer;

pub(super) fn write(
    serializer: &ChunkSerializer,
    snapshot: &dyn ChunkSnapshot,
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
) -> Result<()> {
    buf.write_i32(snapshot.x());
    buf.write_i32(snapshot.z());
    write_heightmaps(serializer, snapshot, buf, version)?;

    let blocks = ContainerFormat::blocks(version);
    let biomes = ContainerFormat::biomes(version, serializer.biome_registry_size);
    let mut data = PacketBuffer::new();
    let mut expected = 0;

    for index in 0..snapshot.dimension().section_count() {
        let (count, block_plan, biome_plan) = match snapshot.section(index) {
            Some(section) => {
                let states = serializer.wire_blocks(section, version);
                let cells: Vec<u32> = section.biomes().values().collect();
                (
                    section.block_count(serializer.properties()),
                    ContainerPlan::build(&states, blocks),
                    ContainerPlan::build(&cells, biomes),
                )
            }
            None => (0, ContainerPlan::Single(0), ContainerPlan::Single(DEFAULT_BIOME)),
        };
        data.write_i16(count as i16);
        block_plan.write(&mut data, blocks);
        biome_plan.write(&mut data, biomes);
        expected += 2 + block_plan.encoded_size(blocks) + biome_plan.encoded_size(biomes);
    }

    serializer.check_length(expected, data.len(), version)?;
    buf.write_varint(data.len() as i32);
    buf.write_bytes_raw(&data.buffer);

    write_block_entities(serializer, snapshot, buf, version)?;
    light::write_embedded(snapshot, buf, version)
}

fn write_heightmaps(
    serializer: &ChunkSerializer,
    snapshot: &dyn ChunkSnapshot,
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
) -> Result<()> {
    let bits = Heightmap::bits(snapshot.dimension());
    let maps = HeightmapKind::SENT.map(|kind| Heightmap::compute(snapshot, serializer.properties(), kind));

    if version >= ProtocolVersion::V1_21_5 {
        buf.write_varint(maps.len() as i32);
        for map in &maps {
            let longs = map.pack(bits, true);
            buf.write_varint(map.kind.type_id());
            buf.write_varint(longs.len() as i32);
            for long in longs {
                buf.write_i64(long as i64);
            }
        }
        return Ok(());
    }

    let mut compound = Compound::new();
    for map in &maps {
        let longs = map.pack(bits, true).into_iter().map(|long| long as i64).collect();
        compound.insert(map.kind.name().into(), Tag::LongArray(longs));
    }
    buf.write_nbt(Some(&Tag::Compound(compound)), version)
}

fn write_block_entities(
    serializer: &ChunkSerializer,
    snapshot: &dyn ChunkSnapshot,
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
) -> Result<()> {
    let entities: Vec<_> = snapshot
        .block_entities()
        .iter()
        .filter_map(|entity| {
            let Ok(y) = i16::try_from(entity.position.y) else {
                tracing::debug!(
                    id = %entity.id,
                    y = entity.position.y,
                    "block entity height out of range, skipping"
                );
                return None;
            };
            Some((entity, y, serializer.block_entity_type(entity, version)?))
        })
        .collect();

    buf.write_varint(entities.len() as i32);
    for (entity, y, kind) in entities {
        let position = entity.position;
        buf.write_u8((((position.x & 15) << 4) | (position.z & 15)) as u8);
        buf.write_i16(y);
        buf.write_varint(kind);
        if entity.data.is_empty() {
            buf.write_nbt(None, version)?;
        } else {
            buf.write_nbt(Some(&Tag::Compound(entity.data.clone())), version)?;
        }
    }
    Ok(())
}
