//! Wire form of paletted containers.

use crate::bitstorage::{bits_for, BitStorage};
use glider_protocol::buffer::{varint_size, PacketBuffer};
use glider_common::ProtocolVersion;

/// How one era writes a paletted container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerFormat {
    /// A single distinct value is sent with 0 bits and no data.
    pub single_value: bool,
    pub min_bits: u8,
    /// Widest indirect palette; anything wider goes direct.
    pub max_indirect_bits: u8,
    pub direct_bits: u8,
    pub padded: bool,
    /// Direct containers still carry a palette length of 0 (1.9 to 1.12.2).
    pub direct_palette_length: bool,
    /// Data is prefixed with its long count (everything before 1.21.5).
    pub long_count: bool,
}

impl ContainerFormat {
    pub fn blocks(version: ProtocolVersion) -> Self {
        use ProtocolVersion as V;
        let direct_bits = if version < V::V1_13 {
            13
        } else if version < V::V1_16 {
            14
        } else {
            15
        };
        ContainerFormat {
            single_value: version >= V::V1_18,
            min_bits: 4,
            max_indirect_bits: 8,
            direct_bits,
            padded: version >= V::V1_16,
            direct_palette_length: version < V::V1_13,
            long_count: version < V::V1_21_5,
        }
    }

    /// Biome containers, 1.18 onwards.
    pub fn biomes(version: ProtocolVersion, registry_size: usize) -> Self {
        ContainerFormat {
            single_value: true,
            min_bits: 1,
            max_indirect_bits: 3,
            direct_bits: bits_for(registry_size).max(1),
            padded: true,
            direct_palette_length: false,
            long_count: version < ProtocolVersion::V1_21_5,
        }
    }
}

/// A container laid out for one format, ready to size or write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerPlan {
    Single(u32),
    Indirect { palette: Vec<u32>, storage: BitStorage },
    Direct { storage: BitStorage },
}

impl ContainerPlan {
    /// Lays out `values` (wire ids, one per entry) for `format`.
    pub fn build(values: &[u32], format: ContainerFormat) -> Self {
        let mut palette: Vec<u32> = Vec::new();
        let mut indices = Vec::with_capacity(values.len());
        for &value in values {
            let index = match palette.iter().position(|&v| v == value) {
                Some(index) => index,
                None => {
                    palette.push(value);
                    palette.len() - 1
                }
            };
            indices.push(index as u32);
        }

        if format.single_value && palette.len() <= 1 {
            return ContainerPlan::Single(palette.first().copied().unwrap_or(0));
        }

        let bits = bits_for(palette.len()).max(format.min_bits);
        if bits > format.max_indirect_bits {
            let mut storage = BitStorage::new(format.direct_bits, values.len(), format.padded);
            for (index, &value) in values.iter().enumerate() {
                storage.set(index, value);
            }
            return ContainerPlan::Direct { storage };
        }

        let mut storage = BitStorage::new(bits, values.len(), format.padded);
        for (index, &palette_index) in indices.iter().enumerate() {
            storage.set(index, palette_index);
        }
        ContainerPlan::Indirect { palette, storage }
    }

    pub fn bits(&self) -> u8 {
        match self {
            ContainerPlan::Single(_) => 0,
            ContainerPlan::Indirect { storage, .. } | ContainerPlan::Direct { storage } => storage.bits(),
        }
    }

    fn longs(&self) -> &[u64] {
        match self {
            ContainerPlan::Single(_) => &[],
            ContainerPlan::Indirect { storage, .. } | ContainerPlan::Direct { storage } => storage.data(),
        }
    }

    /// Bytes [`ContainerPlan::write`] produces, worked out from the layout alone.
    pub fn encoded_size(&self, format: ContainerFormat) -> usize {
        let palette = match self {
            ContainerPlan::Single(value) => varint_size(*value as i32),
            ContainerPlan::Indirect { palette, .. } => {
                varint_size(palette.len() as i32)
                    + palette.iter().map(|&v| varint_size(v as i32)).sum::<usize>()
            }
            ContainerPlan::Direct { .. } if format.direct_palette_length => 1,
            ContainerPlan::Direct { .. } => 0,
        };
        let longs = self.longs().len();
        let count = if format.long_count { varint_size(longs as i32) } else { 0 };
        1 + palette + count + longs * 8
    }

    pub fn write(&self, buf: &mut PacketBuffer, format: ContainerFormat) {
        buf.write_u8(self.bits());
        match self {
            ContainerPlan::Single(value) => buf.write_varint(*value as i32),
            ContainerPlan::Indirect { palette, .. } => {
                buf.write_varint(palette.len() as i32);
                for &value in palette {
                    buf.write_varint(value as i32);
                }
            }
            ContainerPlan::Direct { .. } => {
                if format.direct_palette_length {
                    buf.write_varint(0);
                }
            }
        }
        let longs = self.longs();
        if format.long_count {
            buf.write_varint(longs.len() as i32);
        }
        for &long in longs {
            buf.write_i64(long as i64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(plan: &ContainerPlan, format: ContainerFormat) -> Vec<u8> {
        let mut buf = PacketBuffer::new();
        plan.write(&mut buf, format);
        assert_eq!(buf.len(), plan.encoded_size(format));
        buf.into_inner()
    }

    #[test]
    fn test_single_value_only_from_1_18() {
        let values = vec![1u32; 4096];
        let modern = ContainerFormat::blocks(ProtocolVersion::V1_18);
        let plan = ContainerPlan::build(&values, modern);
        assert_eq!(plan, ContainerPlan::Single(1));
        assert_eq!(written(&plan, modern), vec![0, 1, 0]);

        let old = ContainerFormat::blocks(ProtocolVersion::V1_12_2);
        let plan = ContainerPlan::build(&values, old);
        assert_eq!(plan.bits(), 4);
        assert_eq!(written(&plan, old).len(), 1 + 2 + 2 + 256 * 8);
    }

    #[test]
    fn test_direct_when_palette_too_wide() {
        let values: Vec<u32> = (0..4096).map(|v| v % 300).collect();
        for (version, bits, len_prefix) in [
            (ProtocolVersion::V1_12_2, 13, 1),
            (ProtocolVersion::V1_13, 14, 0),
            (ProtocolVersion::V1_16, 15, 0),
        ] {
            let format = ContainerFormat::blocks(version);
            let plan = ContainerPlan::build(&values, format);
            assert_matches::assert_matches!(plan, ContainerPlan::Direct { .. });
            assert_eq!(plan.bits(), bits);
            let longs = BitStorage::longs_for(bits, 4096, format.padded);
            assert_eq!(
                written(&plan, format).len(),
                1 + len_prefix + varint_size(longs as i32) + longs * 8
            );
        }
    }

    #[test]
    fn test_no_long_count_from_1_21_5() {
        let values: Vec<u32> = (0..4096).map(|v| v % 2).collect();
        let format = ContainerFormat::blocks(ProtocolVersion::V1_21_5);
        let plan = ContainerPlan::build(&values, format);
        let bytes = written(&plan, format);
        assert_eq!(bytes[..4], [4, 2, 0, 1]);
        assert_eq!(bytes.len(), 4 + 256 * 8);
    }

    #[test]
    fn test_biome_widths() {
        let values: Vec<u32> = (0..64).map(|v| v % 3).collect();
        let format = ContainerFormat::biomes(ProtocolVersion::V1_18, 64);
        let plan = ContainerPlan::build(&values, format);
        assert_eq!(plan.bits(), 2);

        let wide: Vec<u32> = (0..64).collect();
        let plan = ContainerPlan::build(&wide, format);
        assert_matches::assert_matches!(plan, ContainerPlan::Direct { .. });
        assert_eq!(plan.bits(), 6);
    }
}
