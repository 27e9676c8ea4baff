//! Light masks and arrays, for the update light packet (1.14 to 1.17.1) and the light block
//! appended to chunk packets from 1.18.

use crate::column::ChunkSnapshot;
use crate::light::{LightSection, LIGHT_SECTION_SIZE};
use glider_common::{ProtocolVersion, Result};
use glider_protocol::buffer::PacketBuffer;

/// Which light sections are sent. Bit `i` is light index `i`, the boundary below the column
/// being bit 0.
#[derive(Debug, Default, Clone)]
pub struct LightMasks<'a> {
    pub sky: Vec<u64>,
    pub block: Vec<u64>,
    /// Present but all zero. These sections carry no array.
    pub empty_sky: Vec<u64>,
    pub empty_block: Vec<u64>,
    pub sky_arrays: Vec<&'a LightSection>,
    pub block_arrays: Vec<&'a LightSection>,
}

fn set_bit(mask: &mut Vec<u64>, bit: usize) {
    let long = bit / 64;
    if mask.len() <= long {
        mask.resize(long + 1, 0);
    }
    mask[long] |= 1 << (bit % 64);
}

impl<'a> LightMasks<'a> {
    pub fn collect(snapshot: &'a dyn ChunkSnapshot) -> Self {
        let dimension = snapshot.dimension();
        let mut masks = LightMasks::default();
        for index in 0..dimension.light_section_count() {
            if let Some(light) = snapshot.block_light(index) {
                if light.is_empty() {
                    set_bit(&mut masks.empty_block, index);
                } else {
                    set_bit(&mut masks.block, index);
                    masks.block_arrays.push(light);
                }
            }
            if !dimension.has_sky_light {
                continue;
            }
            if let Some(light) = snapshot.sky_light(index) {
                if light.is_empty() {
                    set_bit(&mut masks.empty_sky, index);
                } else {
                    set_bit(&mut masks.sky, index);
                    masks.sky_arrays.push(light);
                }
            }
        }
        masks
    }
}

/// First long of a mask as the VarInt used before 1.17 (18 bits at most).
fn varint_mask(mask: &[u64]) -> i32 {
    mask.first().copied().unwrap_or(0) as i32
}

fn write_arrays(buf: &mut PacketBuffer, arrays: &[&LightSection]) {
    for light in arrays {
        buf.write_varint(LIGHT_SECTION_SIZE as i32);
        buf.write_bytes_raw(light.as_bytes());
    }
}

/// Masks and arrays in the BitSet form (1.17 onwards).
fn write_bitset_form(masks: &LightMasks<'_>, buf: &mut PacketBuffer) -> Result<()> {
    buf.write_bitset(&masks.sky)?;
    buf.write_bitset(&masks.block)?;
    buf.write_bitset(&masks.empty_sky)?;
    buf.write_bitset(&masks.empty_block)?;
    buf.write_varint(masks.sky_arrays.len() as i32);
    write_arrays(buf, &masks.sky_arrays);
    buf.write_varint(masks.block_arrays.len() as i32);
    write_arrays(buf, &masks.block_arrays);
    Ok(())
}

/// Body of the update light packet.
pub(super) fn write_update(snapshot: &dyn ChunkSnapshot, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
    let masks = LightMasks::collect(snapshot);
    buf.write_varint(snapshot.x());
    buf.write_varint(snapshot.z());
    if version >= ProtocolVersion::V1_16 {
        buf.write_bool(true);
    }
    if version >= ProtocolVersion::V1_17 {
        return write_bitset_form(&masks, buf);
    }
    buf.write_varint(varint_mask(&masks.sky));
    buf.write_varint(varint_mask(&masks.block));
    buf.write_varint(varint_mask(&masks.empty_sky));
    buf.write_varint(varint_mask(&masks.empty_block));
    write_arrays(buf, &masks.sky_arrays);
    write_arrays(buf, &masks.block_arrays);
    Ok(())
}

/// Light block at the end of chunk packets from 1.18.
pub(super) fn write_embedded(snapshot: &dyn ChunkSnapshot, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
    let masks = LightMasks::collect(snapshot);
    if version < ProtocolVersion::V1_20 {
        buf.write_bool(true);
    }
    write_bitset_form(&masks, buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ChunkColumn, Dimension};

    fn lit_column(dimension: Dimension) -> ChunkColumn {
        let mut column = ChunkColumn::new(2, 3, dimension);
        let mut light = LightSection::new();
        light.set(0, 0, 0, 15);
        column.set_block_light(1, Some(light));
        column.set_block_light(2, Some(LightSection::new()));
        column.set_sky_light(17, Some(LightSection::filled(15)));
        column
    }

    #[test]
    fn test_masks() {
        let column = lit_column(Dimension::LEGACY_OVERWORLD);
        let masks = LightMasks::collect(&column);
        assert_eq!(masks.block, vec![0b10]);
        assert_eq!(masks.empty_block, vec![0b100]);
        assert_eq!(masks.sky, vec![1 << 17]);
        assert!(masks.empty_sky.is_empty());
        assert_eq!(masks.block_arrays.len(), 1);
        assert_eq!(masks.sky_arrays.len(), 1);
    }

    #[test]
    fn test_no_sky_in_nether() {
        let column = lit_column(Dimension::NETHER);
        let masks = LightMasks::collect(&column);
        assert!(masks.sky.is_empty());
        assert!(masks.sky_arrays.is_empty());
    }

    #[test]
    fn test_update_layouts() {
        let column = lit_column(Dimension::LEGACY_OVERWORLD);

        let mut old = PacketBuffer::new();
        write_update(&column, &mut old, ProtocolVersion::V1_14).unwrap();
        // x, z, four masks (sky is 3 bytes), two arrays
        assert_eq!(old.buffer[..2], [2, 3]);
        assert_eq!(old.len(), 1 + 1 + 3 + 1 + 1 + 1 + 2 * (2 + 2048));

        let mut trusted = PacketBuffer::new();
        write_update(&column, &mut trusted, ProtocolVersion::V1_16).unwrap();
        assert_eq!(trusted.len(), old.len() + 1);

        let mut bitset = PacketBuffer::new();
        write_update(&column, &mut bitset, ProtocolVersion::V1_17).unwrap();
        // x, z, trust, masks of 1 long (empty sky 0 longs), two counts, two arrays
        assert_eq!(bitset.len(), 1 + 1 + 1 + 9 + 9 + 1 + 9 + 1 + 1 + 2 * (2 + 2048));
    }

    #[test]
    fn test_embedded_trust_edges_until_1_20() {
        let column = lit_column(Dimension::LEGACY_OVERWORLD);
        let mut with_flag = PacketBuffer::new();
        write_embedded(&column, &mut with_flag, ProtocolVersion::V1_19_4).unwrap();
        let mut without = PacketBuffer::new();
        write_embedded(&column, &mut without, ProtocolVersion::V1_20).unwrap();
        assert_eq!(with_flag.len(), without.len() + 1);
        assert_eq!(with_flag.buffer[0], 1);
    }
}
