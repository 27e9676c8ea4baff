//! Heightmaps derived from the column contents.

use crate::bitstorage::{bits_for, BitStorage};
use crate::block::{BlockProperties, BlockState};
use crate::column::{ChunkSnapshot, Dimension};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightmapKind {
    /// Highest block that blocks motion or holds fluid.
    MotionBlocking,
    /// Highest block that is not air.
    WorldSurface,
}

impl HeightmapKind {
    pub const SENT: [HeightmapKind; 2] = [HeightmapKind::MotionBlocking, HeightmapKind::WorldSurface];

    /// Key in the NBT form.
    pub fn name(self) -> &'static str {
        match self {
            HeightmapKind::MotionBlocking => "MOTION_BLOCKING",
            HeightmapKind::WorldSurface => "WORLD_SURFACE",
        }
    }

    /// Type id in the 1.21.5 typed list.
    pub fn type_id(self) -> i32 {
        match self {
            HeightmapKind::WorldSurface => 1,
            HeightmapKind::MotionBlocking => 4,
        }
    }

    fn matches(self, properties: &dyn BlockProperties, state: BlockState) -> bool {
        match self {
            HeightmapKind::MotionBlocking => properties.is_motion_blocking(state),
            HeightmapKind::WorldSurface => !properties.is_air(state),
        }
    }
}

/// One value per column, `x + z * 16`: height above the dimension floor of the top matching
/// block plus one, or 0 when no block matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heightmap {
    pub kind: HeightmapKind,
    pub heights: [u16; 256],
}

impl Heightmap {
    pub fn compute(snapshot: &dyn ChunkSnapshot, properties: &dyn BlockProperties, kind: HeightmapKind) -> Self {
        let mut heights = [0u16; 256];
        let sections = snapshot.dimension().section_count();
        for z in 0..16 {
            for x in 0..16 {
                heights[x + z * 16] = Self::scan(snapshot, properties, kind, sections, x, z);
            }
        }
        Heightmap { kind, heights }
    }

    fn scan(
        snapshot: &dyn ChunkSnapshot,
        properties: &dyn BlockProperties,
        kind: HeightmapKind,
        sections: usize,
        x: usize,
        z: usize,
    ) -> u16 {
        for section_y in (0..sections).rev() {
            let section = match snapshot.section(section_y) {
                Some(section) => section,
                None => continue,
            };
            for y in (0..16).rev() {
                if kind.matches(properties, section.get_block_state(x, y, z)) {
                    return (section_y * 16 + y + 1) as u16;
                }
            }
        }
        0
    }

    /// Bits per value for a dimension of this height.
    pub fn bits(dimension: Dimension) -> u8 {
        bits_for(dimension.height as usize + 1)
    }

    pub fn get(&self, x: usize, z: usize) -> u16 {
        self.heights[(x & 15) + (z & 15) * 16]
    }

    pub fn pack(&self, bits: u8, padded: bool) -> Vec<u64> {
        let mut storage = BitStorage::new(bits, self.heights.len(), padded);
        for (index, &height) in self.heights.iter().enumerate() {
            storage.set(index, height as u32);
        }
        storage.into_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::SimpleProperties;
    use crate::column::ChunkColumn;

    /// Motion blocking is everything except state 2.
    struct Glass;

    impl BlockProperties for Glass {
        fn is_air(&self, state: BlockState) -> bool {
            state.is_air()
        }

        fn is_motion_blocking(&self, state: BlockState) -> bool {
            !state.is_air() && state != BlockState(2)
        }
    }

    #[test]
    fn test_empty_column_is_zero() {
        let column = ChunkColumn::new(0, 0, Dimension::LEGACY_OVERWORLD);
        let map = Heightmap::compute(&column, &SimpleProperties, HeightmapKind::WorldSurface);
        assert!(map.heights.iter().all(|&h| h == 0));
    }

    #[test]
    fn test_heights_relative_to_floor() {
        let mut column = ChunkColumn::new(0, 0, Dimension::OVERWORLD);
        column.set_block_state(0, -64, 0, BlockState(1));
        column.set_block_state(5, 70, 7, BlockState(1));
        column.set_block_state(5, 71, 7, BlockState(2));

        let surface = Heightmap::compute(&column, &Glass, HeightmapKind::WorldSurface);
        assert_eq!(surface.get(0, 0), 1);
        assert_eq!(surface.get(5, 7), (71 + 64 + 1) as u16);
        assert_eq!(surface.get(1, 1), 0);

        let motion = Heightmap::compute(&column, &Glass, HeightmapKind::MotionBlocking);
        assert_eq!(motion.get(5, 7), (70 + 64 + 1) as u16);
    }

    #[test]
    fn test_packing_widths() {
        assert_eq!(Heightmap::bits(Dimension::LEGACY_OVERWORLD), 9);
        assert_eq!(Heightmap::bits(Dimension::OVERWORLD), 9);

        let mut column = ChunkColumn::new(0, 0, Dimension::LEGACY_OVERWORLD);
        column.set_block_state(7, 64, 0, BlockState(1));
        let map = Heightmap::compute(&column, &SimpleProperties, HeightmapKind::WorldSurface);

        let spanning = map.pack(9, false);
        assert_eq!(spanning.len(), 36);
        // index 7 starts at bit 63 and carries on into the next long
        assert_eq!(spanning[0], 1 << 63);
        assert_eq!(spanning[1], 32);

        let padded = map.pack(9, true);
        assert_eq!(padded.len(), 37);
        assert_eq!(padded[0], 0);
        assert_eq!(padded[1], 65);
    }
}
