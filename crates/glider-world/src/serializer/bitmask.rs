//! 1.9 to 1.17.1: paletted sections selected by a VarInt (later BitSet) section mask.

use super::{flat_biomes, positioned_nbt, shim, volume_biomes, ChunkSerializer, ContainerFormat, ContainerPlan, Selection};
use crate::column::{BlockEntity, ChunkSnapshot};
use crate::heightmap::{Heightmap, HeightmapKind};
use crate::light::{LightSection, LIGHT_SECTION_SIZE};
use glider_common::{ProtocolVersion, Result};
use glider_nbt::{Compound, Tag};
use glider_protocol::buffer::PacketBuffer;

pub(super) fn write(
    serializer: &ChunkSerializer,
    snapshot: &dyn ChunkSnapshot,
    selection: Selection,
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
) -> Result<()> {
    use ProtocolVersion as V;

    // Partial chunks were removed in 1.17.
    let selection = if version >= V::V1_17 { Selection::Full } else { selection };
    let full = selection.is_full();
    let dimension = snapshot.dimension();

    let mut mask = vec![0u64; dimension.section_count().div_ceil(64)];
    let mut sections = Vec::new();
    for index in 0..dimension.section_count() {
        if !selection.contains(index) {
            continue;
        }
        if let Some(section) = snapshot.section(index) {
            mask[index / 64] |= 1 << (index % 64);
            sections.push((index, section));
        }
    }

    buf.write_i32(snapshot.x());
    buf.write_i32(snapshot.z());
    if version < V::V1_17 {
        buf.write_bool(full);
    }
    if version >= V::V1_16 && version < V::V1_16_2 {
        // ignore old data
        buf.write_bool(true);
    }
    if version < V::V1_17 {
        buf.write_varint(mask.first().copied().unwrap_or(0) as i32);
    } else {
        while mask.last() == Some(&0) {
            mask.pop();
        }
        buf.write_bitset(&mask)?;
    }

    if version >= V::V1_14 {
        write_heightmaps(serializer, snapshot, buf, version)?;
    }
    if full && version >= V::V1_15 {
        let biomes = volume_biomes(snapshot);
        if version < V::V1_16_2 {
            for biome in biomes {
                buf.write_i32(biome as i32);
            }
        } else {
            buf.write_varint(biomes.len() as i32);
            for biome in biomes {
                buf.write_varint(biome as i32);
            }
        }
    }

    let format = ContainerFormat::blocks(version);
    let embedded_light = version < V::V1_14;
    let sky = dimension.has_sky_light;
    let mut data = PacketBuffer::new();
    let mut expected = 0;

    for &(index, section) in &sections {
        if version >= V::V1_14 {
            data.write_i16(section.block_count(serializer.properties()) as i16);
            expected += 2;
        }
        let plan = ContainerPlan::build(&serializer.wire_blocks(section, version), format);
        plan.write(&mut data, format);
        expected += plan.encoded_size(format);

        if embedded_light {
            write_light_array(&mut data, snapshot.block_light(index + 1), 0);
            expected += LIGHT_SECTION_SIZE;
            if sky {
                write_light_array(&mut data, snapshot.sky_light(index + 1), 0xFF);
                expected += LIGHT_SECTION_SIZE;
            }
        }
    }

    if full && version < V::V1_15 {
        let biomes = flat_biomes(snapshot);
        if version < V::V1_13 {
            for biome in biomes {
                data.write_u8(biome as u8);
            }
            expected += 256;
        } else {
            for biome in biomes {
                data.write_i32(biome as i32);
            }
            expected += 1024;
        }
    }

    serializer.check_length(expected, data.len(), version)?;
    buf.write_varint(data.len() as i32);
    buf.write_bytes_raw(&data.buffer);

    if version >= V::V1_9_4 {
        let entities = block_entities(serializer, snapshot, selection, version);
        buf.write_varint(entities.len() as i32);
        for entity in &entities {
            buf.write_nbt(Some(&positioned_nbt(entity)), version)?;
        }
    }
    Ok(())
}

/// A light array as embedded before 1.14. Missing light is written as `fill`.
fn write_light_array(data: &mut PacketBuffer, light: Option<&LightSection>, fill: u8) {
    match light {
        Some(light) => data.write_bytes_raw(light.as_bytes()),
        None => data.write_bytes_raw(&[fill; LIGHT_SECTION_SIZE]),
    }
}

fn write_heightmaps(
    serializer: &ChunkSerializer,
    snapshot: &dyn ChunkSnapshot,
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
) -> Result<()> {
    let bits = Heightmap::bits(snapshot.dimension());
    let padded = version >= ProtocolVersion::V1_16;
    let mut compound = Compound::new();
    for kind in HeightmapKind::SENT {
        let map = Heightmap::compute(snapshot, serializer.properties(), kind);
        let longs = map.pack(bits, padded).into_iter().map(|long| long as i64).collect();
        compound.insert(kind.name().into(), Tag::LongArray(longs));
    }
    buf.write_nbt(Some(&Tag::Compound(compound)), version)
}

/// Block entities inside the selected sections, plus the derived ones old clients need.
fn block_entities(
    serializer: &ChunkSerializer,
    snapshot: &dyn ChunkSnapshot,
    selection: Selection,
    version: ProtocolVersion,
) -> Vec<BlockEntity> {
    let min_y = snapshot.dimension().min_y;
    let mut entities: Vec<BlockEntity> = snapshot
        .block_entities()
        .iter()
        .filter(|entity| {
            let relative = entity.position.y - min_y;
            relative >= 0 && selection.contains((relative >> 4) as usize)
        })
        .cloned()
        .collect();
    if shim::applies(version) {
        entities.extend(shim::synthesize(serializer, snapshot, selection, version));
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::super::tests::serializer;
    use super::*;
    use crate::block::BlockState;
    use crate::column::{ChunkColumn, Dimension};
    use glider_common::BlockPos;

    fn encode(column: &ChunkColumn, selection: Selection, version: ProtocolVersion) -> PacketBuffer {
        let mut buf = PacketBuffer::new();
        serializer(true)
            .write_chunk(column, selection, &mut buf, version)
            .unwrap();
        PacketBuffer::from_bytes(buf.into_inner())
    }

    fn stone_floor() -> ChunkColumn {
        let mut column = ChunkColumn::new(4, 5, Dimension::LEGACY_OVERWORLD);
        for x in 0..16 {
            for z in 0..16 {
                column.set_block_state(x, 0, z, BlockState(1 << 4));
            }
        }
        column
    }

    #[test]
    fn test_1_12_section_with_embedded_light() {
        let mut buf = encode(&stone_floor(), Selection::Full, ProtocolVersion::V1_12_2);
        assert_eq!(buf.read_i32().unwrap(), 4);
        assert_eq!(buf.read_i32().unwrap(), 5);
        assert!(buf.read_bool().unwrap());
        assert_eq!(buf.read_varint().unwrap(), 1);

        let size = buf.read_varint().unwrap() as usize;
        // bits, palette of two, long count, 256 longs, two light arrays, biome bytes
        assert_eq!(size, 1 + 1 + 2 + 2 + 256 * 8 + 2048 * 2 + 256);
        assert_eq!(buf.read_u8().unwrap(), 4);
        assert_eq!(buf.read_varint().unwrap(), 2);
        // palette in first-seen order: stone at index 0, then air
        assert_eq!(buf.read_varint().unwrap(), 16);
        assert_eq!(buf.read_varint().unwrap(), 0);
        buf.advance_cursor(size - 4);
        // no block entities
        assert_eq!(buf.read_varint().unwrap(), 0);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_1_9_has_no_block_entity_list() {
        let buf = encode(&stone_floor(), Selection::Full, ProtocolVersion::V1_9);
        let with = encode(&stone_floor(), Selection::Full, ProtocolVersion::V1_9_4);
        assert_eq!(buf.len() + 1, with.len());
    }

    #[test]
    fn test_1_14_heightmaps_and_block_count() {
        let mut buf = encode(&stone_floor(), Selection::Full, ProtocolVersion::V1_14);
        buf.advance_cursor(9);
        assert_eq!(buf.read_varint().unwrap(), 1);
        let heightmaps = buf.read_nbt(ProtocolVersion::V1_14).unwrap().unwrap();
        let compound = match heightmaps {
            Tag::Compound(compound) => compound,
            other => panic!("unexpected heightmaps {:?}", other),
        };
        // 9 bits spanning: 256 * 9 / 64 = 36 longs, every value 1
        match compound.get("WORLD_SURFACE") {
            Some(Tag::LongArray(longs)) => {
                assert_eq!(longs.len(), 36);
                assert_eq!(longs[0] as u64 & 0x1FF, 1);
            }
            other => panic!("unexpected WORLD_SURFACE {:?}", other),
        }
        assert!(compound.contains_key("MOTION_BLOCKING"));

        let size = buf.read_varint().unwrap() as usize;
        // block count, then the section; biomes are 256 ints and there is no light
        assert_eq!(size, 2 + 1 + 1 + 2 + 2 + 256 * 8 + 1024);
        assert_eq!(buf.read_i16().unwrap(), 256);
    }

    #[test]
    fn test_1_16_writes_ignore_old_data_and_int_biomes() {
        let mut buf = encode(&stone_floor(), Selection::Full, ProtocolVersion::V1_16);
        buf.advance_cursor(9);
        assert!(buf.read_bool().unwrap());
        assert_eq!(buf.read_varint().unwrap(), 1);
        buf.read_nbt(ProtocolVersion::V1_16).unwrap();
        // 1024 biome ints ahead of the data
        buf.advance_cursor(4096);
        let size = buf.read_varint().unwrap() as usize;
        assert_eq!(size, 2 + 1 + 1 + 2 + 2 + 256 * 8);
    }

    #[test]
    fn test_1_17_bitset_mask_and_forced_full() {
        let mut column = ChunkColumn::new(0, 0, Dimension::OVERWORLD);
        column.set_block_state(0, 300, 0, BlockState(1 << 4));
        let mut buf = encode(&column, Selection::Sections(0b1), ProtocolVersion::V1_17);
        buf.advance_cursor(8);
        // section 22 is present even though only section 0 was asked for
        assert_eq!(buf.read_bitset(4).unwrap(), vec![1 << 22]);
        buf.read_nbt(ProtocolVersion::V1_17).unwrap();
        assert_eq!(buf.read_varint().unwrap(), 24 * 64);
    }

    #[test]
    fn test_partial_chunk_has_no_biomes() {
        let mut buf = encode(&stone_floor(), Selection::Sections(0b1), ProtocolVersion::V1_12_2);
        buf.advance_cursor(8);
        assert!(!buf.read_bool().unwrap());
        assert_eq!(buf.read_varint().unwrap(), 1);
        let size = buf.read_varint().unwrap() as usize;
        assert_eq!(size, 1 + 1 + 2 + 2 + 256 * 8 + 2048 * 2);
    }

    #[test]
    fn test_block_entities_carry_position_nbt() {
        let mut column = stone_floor();
        let mut chest = BlockEntity::new(BlockPos::new(64, 1, 80), 3, "minecraft:chest");
        chest.data.insert("Lock".into(), Tag::String(String::new()));
        column.add_block_entity(chest);
        // a banner with no stored entity gets one derived
        column.set_block_state(2, 1, 2, BlockState(176 << 4));

        let serializer = serializer(true);
        let entities = block_entities(&serializer, &column, Selection::Full, ProtocolVersion::V1_12_2);
        assert_eq!(entities.len(), 2);
        match positioned_nbt(&entities[0]) {
            Tag::Compound(compound) => {
                assert_eq!(compound.get("x"), Some(&Tag::Int(64)));
                assert_eq!(compound.get("id"), Some(&Tag::String("minecraft:chest".into())));
                assert!(compound.contains_key("Lock"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(entities[1].id, "minecraft:banner");

        let flattened = block_entities(&serializer, &column, Selection::Full, ProtocolVersion::V1_13);
        assert_eq!(flattened.len(), 1);

        let above = block_entities(&serializer, &column, Selection::Sections(0b10), ProtocolVersion::V1_12_2);
        assert!(above.is_empty());
    }

    #[test]
    fn test_rejects_tall_columns_before_1_17() {
        let column = ChunkColumn::new(0, 0, Dimension::OVERWORLD);
        let mut buf = PacketBuffer::new();
        assert!(serializer(true)
            .write_chunk(&column, Selection::Full, &mut buf, ProtocolVersion::V1_16_4)
            .is_err());
    }
}
