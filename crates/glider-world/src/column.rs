//! Chunk columns as the serializer sees them.

use crate::block::BlockState;
use crate::light::LightSection;
use crate::section::ChunkSection;
use glider_common::BlockPos;
use glider_nbt::Compound;

/// Vertical extent of a dimension and whether it has sky light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    pub min_y: i32,
    pub height: u32,
    pub has_sky_light: bool,
}

impl Dimension {
    /// Overworld before 1.18, and the layout every pre-1.18 version expects.
    pub const LEGACY_OVERWORLD: Dimension = Dimension {
        min_y: 0,
        height: 256,
        has_sky_light: true,
    };
    pub const OVERWORLD: Dimension = Dimension {
        min_y: -64,
        height: 384,
        has_sky_light: true,
    };
    pub const NETHER: Dimension = Dimension {
        min_y: 0,
        height: 256,
        has_sky_light: false,
    };

    pub fn section_count(&self) -> usize {
        (self.height / 16) as usize
    }

    /// Light sections: one per block section plus one below and one above.
    pub fn light_section_count(&self) -> usize {
        self.section_count() + 2
    }
}

/// A block entity as stored by the world. Positions are absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntity {
    pub position: BlockPos,
    /// Engine key of the block entity type, translated through the mapping table.
    pub kind: u32,
    /// Namespaced id written into the NBT before 1.18, e.g. `minecraft:chest`.
    pub id: String,
    pub data: Compound,
}

impl BlockEntity {
    pub fn new(position: BlockPos, kind: u32, id: impl Into<String>) -> Self {
        Self {
            position,
            kind,
            id: id.into(),
            data: Compound::new(),
        }
    }
}

/// Read-only view of one chunk column.
///
/// Section index 0 is the lowest section of the dimension. Light index 0 is the boundary
/// section below it; light index `section_count() + 1` is the boundary above the top.
pub trait ChunkSnapshot: Send + Sync {
    fn x(&self) -> i32;

    fn z(&self) -> i32;

    fn dimension(&self) -> Dimension;

    fn section(&self, index: usize) -> Option<&ChunkSection>;

    fn block_light(&self, index: usize) -> Option<&LightSection>;

    fn sky_light(&self, index: usize) -> Option<&LightSection>;

    fn block_entities(&self) -> &[BlockEntity];
}

/// Owned chunk column.
#[derive(Debug, Clone)]
pub struct ChunkColumn {
    x: i32,
    z: i32,
    dimension: Dimension,
    sections: Vec<Option<ChunkSection>>,
    block_light: Vec<Option<LightSection>>,
    sky_light: Vec<Option<LightSection>>,
    block_entities: Vec<BlockEntity>,
}

impl ChunkColumn {
    pub fn new(x: i32, z: i32, dimension: Dimension) -> Self {
        ChunkColumn {
            x,
            z,
            dimension,
            sections: vec![None; dimension.section_count()],
            block_light: vec![None; dimension.light_section_count()],
            sky_light: vec![None; dimension.light_section_count()],
            block_entities: Vec::new(),
        }
    }

    pub fn get_section_mut(&mut self, index: usize) -> Option<&mut ChunkSection> {
        let slot = self.sections.get_mut(index)?;
        Some(slot.get_or_insert_with(ChunkSection::new))
    }

    pub fn set_section(&mut self, index: usize, section: Option<ChunkSection>) {
        if let Some(slot) = self.sections.get_mut(index) {
            *slot = section;
        }
    }

    pub fn set_block_light(&mut self, index: usize, light: Option<LightSection>) {
        if let Some(slot) = self.block_light.get_mut(index) {
            *slot = light;
        }
    }

    pub fn set_sky_light(&mut self, index: usize, light: Option<LightSection>) {
        if let Some(slot) = self.sky_light.get_mut(index) {
            *slot = light;
        }
    }

    pub fn add_block_entity(&mut self, block_entity: BlockEntity) {
        self.block_entities
            .retain(|existing| existing.position != block_entity.position);
        self.block_entities.push(block_entity);
    }

    /// Section index holding absolute height `y`.
    pub fn section_index(&self, y: i32) -> Option<usize> {
        let relative = y - self.dimension.min_y;
        if relative < 0 || relative >= self.dimension.height as i32 {
            return None;
        }
        Some((relative >> 4) as usize)
    }

    pub fn set_block_state(&mut self, x: usize, y: i32, z: usize, state: BlockState) {
        if let Some(index) = self.section_index(y) {
            if let Some(section) = self.get_section_mut(index) {
                section.set_block_state(x, (y & 15) as usize, z, state);
            }
        }
    }

    pub fn get_block_state(&self, x: usize, y: i32, z: usize) -> BlockState {
        self.section_index(y)
            .and_then(|index| self.section(index))
            .map(|section| section.get_block_state(x, (y & 15) as usize, z))
            .unwrap_or_default()
    }
}

impl ChunkSnapshot for ChunkColumn {
    fn x(&self) -> i32 {
        self.x
    }

    fn z(&self) -> i32 {
        self.z
    }

    fn dimension(&self) -> Dimension {
        self.dimension
    }

    fn section(&self, index: usize) -> Option<&ChunkSection> {
        self.sections.get(index)?.as_ref()
    }

    fn block_light(&self, index: usize) -> Option<&LightSection> {
        self.block_light.get(index)?.as_ref()
    }

    fn sky_light(&self, index: usize) -> Option<&LightSection> {
        self.sky_light.get(index)?.as_ref()
    }

    fn block_entities(&self) -> &[BlockEntity] {
        &self.block_entities
    }
}
