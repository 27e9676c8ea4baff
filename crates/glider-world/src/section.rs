use crate::block::{BlockProperties, BlockState};
use crate::palette::PalettedContainer;

pub const SECTION_VOLUME: usize = 4096;
/// Biome cells per section: 4x4x4.
pub const BIOME_VOLUME: usize = 64;

/// A 16x16x16 slice of a chunk column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSection {
    blocks: PalettedContainer,
    biomes: PalettedContainer,
}

impl Default for ChunkSection {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkSection {
    /// All air, biome 0.
    pub fn new() -> Self {
        Self::filled(BlockState::AIR, 0)
    }

    pub fn filled(state: BlockState, biome: u32) -> Self {
        Self {
            blocks: PalettedContainer::single(SECTION_VOLUME, state.get_global_id()),
            biomes: PalettedContainer::single(BIOME_VOLUME, biome),
        }
    }

    /// Index of a block, `y` major then `z` then `x`.
    pub fn block_index(x: usize, y: usize, z: usize) -> usize {
        ((y & 15) << 8) | ((z & 15) << 4) | (x & 15)
    }

    pub fn biome_index(x: usize, y: usize, z: usize) -> usize {
        ((y & 3) << 4) | ((z & 3) << 2) | (x & 3)
    }

    pub fn get_block_state(&self, x: usize, y: usize, z: usize) -> BlockState {
        BlockState(self.blocks.get(Self::block_index(x, y, z)))
    }

    pub fn set_block_state(&mut self, x: usize, y: usize, z: usize, state: BlockState) {
        self.blocks.set(Self::block_index(x, y, z), state.get_global_id());
    }

    pub fn fill(&mut self, state: BlockState) {
        self.blocks.fill(state.get_global_id());
    }

    /// Biome of the 4x4x4 cell at cell coordinates `x, y, z` (0..4).
    pub fn get_biome(&self, x: usize, y: usize, z: usize) -> u32 {
        self.biomes.get(Self::biome_index(x, y, z))
    }

    pub fn set_biome(&mut self, x: usize, y: usize, z: usize, biome: u32) {
        self.biomes.set(Self::biome_index(x, y, z), biome);
    }

    pub fn blocks(&self) -> &PalettedContainer {
        &self.blocks
    }

    pub fn biomes(&self) -> &PalettedContainer {
        &self.biomes
    }

    /// Number of blocks that are not air.
    pub fn block_count(&self, properties: &dyn BlockProperties) -> u16 {
        let air: Vec<bool> = self
            .blocks
            .palette()
            .iter()
            .map(|&state| properties.is_air(BlockState(state)))
            .collect();
        (0..SECTION_VOLUME)
            .filter(|&index| !air[self.blocks.palette_index(index)])
            .count() as u16
    }

    pub fn is_empty(&self, properties: &dyn BlockProperties) -> bool {
        self.block_count(properties) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::SimpleProperties;

    #[test]
    fn test_block_access() {
        let mut section = ChunkSection::new();
        section.set_block_state(1, 2, 3, BlockState(5));
        assert_eq!(section.get_block_state(1, 2, 3), BlockState(5));
        assert_eq!(section.get_block_state(3, 2, 1), BlockState::AIR);
        assert_eq!(section.block_count(&SimpleProperties), 1);
    }

    #[test]
    fn test_filled_section_counts_all() {
        let section = ChunkSection::filled(BlockState(1), 0);
        assert_eq!(section.block_count(&SimpleProperties), 4096);
        assert!(ChunkSection::new().is_empty(&SimpleProperties));
    }

    #[test]
    fn test_biome_cells() {
        let mut section = ChunkSection::new();
        section.set_biome(3, 0, 2, 6);
        assert_eq!(section.get_biome(3, 0, 2), 6);
        assert_eq!(section.get_biome(0, 0, 0), 0);
        assert_eq!(ChunkSection::biome_index(3, 3, 3), 63);
    }
}
