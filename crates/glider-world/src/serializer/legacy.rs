//! 1.7 and 1.8 chunk layouts. Both use u16 section masks and fixed-size per-block arrays.

use super::{flat_biomes, nibbles, ChunkSerializer, Selection};
use crate::column::ChunkSnapshot;
use crate::light::LightSection;
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use glider_common::{ProtocolVersion, Result};
use glider_protocol::buffer::PacketBuffer;
use std::io::Write;

/// A section as the legacy formats need it: wire ids and the two light layers.
struct LegacySection<'a> {
    index: usize,
    blocks: Vec<u32>,
    block_light: Option<&'a LightSection>,
    sky_light: Option<&'a LightSection>,
}

fn collect<'a>(
    serializer: &ChunkSerializer,
    snapshot: &'a dyn ChunkSnapshot,
    selection: Selection,
    version: ProtocolVersion,
) -> (u16, Vec<LegacySection<'a>>) {
    let mut mask = 0u16;
    let mut sections = Vec::new();
    for index in 0..snapshot.dimension().section_count().min(16) {
        if !selection.contains(index) {
            continue;
        }
        if let Some(section) = snapshot.section(index) {
            mask |= 1 << index;
            sections.push(LegacySection {
                index,
                blocks: serializer.wire_blocks(section, version),
                block_light: snapshot.block_light(index + 1),
                sky_light: snapshot.sky_light(index + 1),
            });
        }
    }

    // An all-zero mask on a full chunk reads as "unload" to these clients; send one air
    // section instead.
    if mask == 0 && selection.is_full() {
        mask = 1;
        sections.push(LegacySection {
            index: 0,
            blocks: vec![0; 4096],
            block_light: None,
            sky_light: None,
        });
    }
    (mask, sections)
}

fn block_light_bytes(section: &LegacySection<'_>) -> Vec<u8> {
    match section.block_light {
        Some(light) => light.as_bytes().to_vec(),
        None => vec![0; 2048],
    }
}

fn sky_light_bytes(section: &LegacySection<'_>) -> Vec<u8> {
    match section.sky_light {
        Some(light) => light.as_bytes().to_vec(),
        None => vec![0xFF; 2048],
    }
}

pub(super) fn write(
    serializer: &ChunkSerializer,
    snapshot: &dyn ChunkSnapshot,
    selection: Selection,
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
) -> Result<()> {
    let (mask, sections) = collect(serializer, snapshot, selection, version);
    let sky = snapshot.dimension().has_sky_light;
    let full = selection.is_full();

    buf.write_i32(snapshot.x());
    buf.write_i32(snapshot.z());
    buf.write_bool(full);
    buf.write_u16(mask);

    if version < ProtocolVersion::V1_8 {
        write_1_7(serializer, snapshot, &sections, full, sky, buf, version)
    } else {
        write_1_8(serializer, snapshot, &sections, full, sky, buf, version)
    }
}

fn write_1_7(
    serializer: &ChunkSerializer,
    snapshot: &dyn ChunkSnapshot,
    sections: &[LegacySection<'_>],
    full: bool,
    sky: bool,
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
) -> Result<()> {
    let mut add_mask = 0u16;
    let mut data = Vec::new();

    for section in sections {
        data.extend(section.blocks.iter().map(|&wire| (wire >> 4) as u8));
    }
    for section in sections {
        data.extend(nibbles(|index| (section.blocks[index] & 0x0F) as u8));
    }
    for section in sections {
        data.extend(block_light_bytes(section));
    }
    if sky {
        for section in sections {
            data.extend(sky_light_bytes(section));
        }
    }
    let mut adds = 0;
    for section in sections {
        if section.blocks.iter().any(|&wire| wire >> 12 != 0) {
            add_mask |= 1 << section.index;
            adds += 1;
            data.extend(nibbles(|index| (section.blocks[index] >> 12) as u8));
        }
    }
    if full {
        data.extend(flat_biomes(snapshot).into_iter().map(|biome| biome as u8));
    }

    let per_section = 4096 + 2048 + 2048 + if sky { 2048 } else { 0 };
    let expected = sections.len() * per_section + adds * 2048 + if full { 256 } else { 0 };
    serializer.check_length(expected, data.len(), version)?;

    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(data.len() / 4),
        Compression::new(serializer.config().compression_level),
    );
    encoder.write_all(&data)?;
    let compressed = encoder.finish()?;

    buf.write_u16(add_mask);
    buf.write_i32(compressed.len() as i32);
    buf.write_bytes_raw(&compressed);
    Ok(())
}

fn write_1_8(
    serializer: &ChunkSerializer,
    snapshot: &dyn ChunkSnapshot,
    sections: &[LegacySection<'_>],
    full: bool,
    sky: bool,
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
) -> Result<()> {
    let mut data = PacketBuffer::new();
    for section in sections {
        for &wire in &section.blocks {
            WriteBytesExt::write_u16::<LittleEndian>(&mut data, wire as u16)?;
        }
    }
    for section in sections {
        data.write_bytes_raw(&block_light_bytes(section));
    }
    if sky {
        for section in sections {
            data.write_bytes_raw(&sky_light_bytes(section));
        }
    }
    if full {
        for biome in flat_biomes(snapshot) {
            data.write_u8(biome as u8);
        }
    }

    let per_section = 8192 + 2048 + if sky { 2048 } else { 0 };
    let expected = sections.len() * per_section + if full { 256 } else { 0 };
    serializer.check_length(expected, data.len(), version)?;

    buf.write_varint(data.len() as i32);
    buf.write_bytes_raw(&data.buffer);
    Ok(())
}
