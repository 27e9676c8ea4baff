//! Per-version chunk and light serialization.
//!
//! Four eras with incompatible layouts:
//! - 1.7: u16 section masks, per-type arrays, whole payload zlib'd in the packet ([`legacy`])
//! - 1.8: u16 masks, packed `(id << 4) | meta` shorts ([`legacy`])
//! - 1.9 to 1.17.1: VarInt or BitSet masks with paletted sections ([`bitmask`])
//! - 1.18 onwards: every section sent, paletted block and biome containers ([`modern`])

mod bitmask;
mod container;
mod legacy;
pub mod light;
mod modern;
mod shim;

pub use container::{ContainerFormat, ContainerPlan};

use crate::block::{BlockProperties, BlockState};
use crate::column::{BlockEntity, ChunkSnapshot};
use crate::section::ChunkSection;
use glider_common::{CodecConfig, MappingKind, MappingTable, ProtocolError, ProtocolVersion, Result};
use glider_nbt::Tag;
use glider_protocol::buffer::PacketBuffer;
use std::fmt;
use std::sync::Arc;

/// Biome written where a column has no section to take one from.
pub const DEFAULT_BIOME: u32 = 0;
/// Biome registry size assumed when sizing direct biome containers.
pub const DEFAULT_BIOME_REGISTRY_SIZE: usize = 64;

/// Which sections of a column a chunk packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Every section plus biomes. Replaces whatever the client had.
    Full,
    /// Only the sections whose bit is set. From 1.17 the protocol has no partial chunks and this
    /// is sent as a full chunk.
    Sections(u64),
}

impl Selection {
    pub fn is_full(self) -> bool {
        matches!(self, Selection::Full)
    }

    pub fn contains(self, index: usize) -> bool {
        match self {
            Selection::Full => true,
            Selection::Sections(mask) => index < 64 && mask & (1 << index) != 0,
        }
    }
}

/// Turns chunk snapshots into chunk and light packet bodies.
///
/// Block states and block entity types are translated through the mapping table; anything the
/// table has no id for is written as air (or skipped, for block entities).
pub struct ChunkSerializer {
    mappings: Arc<dyn MappingTable>,
    properties: Arc<dyn BlockProperties>,
    config: CodecConfig,
    biome_registry_size: usize,
}

impl fmt::Debug for ChunkSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkSerializer")
            .field("config", &self.config)
            .field("biome_registry_size", &self.biome_registry_size)
            .finish()
    }
}

impl ChunkSerializer {
    pub fn new(
        mappings: Arc<dyn MappingTable>,
        properties: Arc<dyn BlockProperties>,
        config: CodecConfig,
    ) -> Self {
        Self {
            mappings,
            properties,
            config,
            biome_registry_size: DEFAULT_BIOME_REGISTRY_SIZE,
        }
    }

    pub fn with_biome_registry_size(mut self, size: usize) -> Self {
        self.biome_registry_size = size.max(1);
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn properties(&self) -> &dyn BlockProperties {
        self.properties.as_ref()
    }

    /// Writes a chunk data packet body for `version`.
    pub fn write_chunk(
        &self,
        snapshot: &dyn ChunkSnapshot,
        selection: Selection,
        buf: &mut PacketBuffer,
        version: ProtocolVersion,
    ) -> Result<()> {
        let sections = snapshot.dimension().section_count();
        if version < ProtocolVersion::V1_17 && sections > 16 {
            return Err(ProtocolError::UnsupportedValue {
                domain: "chunk",
                kind: format!("column of {} sections", sections),
                version,
            });
        }

        if version < ProtocolVersion::V1_9 {
            legacy::write(self, snapshot, selection, buf, version)
        } else if version < ProtocolVersion::V1_18 {
            bitmask::write(self, snapshot, selection, buf, version)
        } else {
            modern::write(self, snapshot, buf, version)
        }
    }

    /// Writes an update light packet body (1.14 to 1.17.1).
    pub fn write_light(
        &self,
        snapshot: &dyn ChunkSnapshot,
        buf: &mut PacketBuffer,
        version: ProtocolVersion,
    ) -> Result<()> {
        if version < ProtocolVersion::V1_14 || version >= ProtocolVersion::V1_18 {
            return Err(ProtocolError::UnsupportedValue {
                domain: "chunk",
                kind: "separate light update".into(),
                version,
            });
        }
        light::write_update(snapshot, buf, version)
    }

    /// Wire id of a block state, air when the table has none.
    pub fn block_id(&self, state: BlockState, version: ProtocolVersion) -> u32 {
        self.mappings
            .id_for(MappingKind::Block, state.get_global_id(), version)
            .and_then(|id| u32::try_from(id).ok())
            .unwrap_or_else(|| {
                tracing::debug!(state = state.get_global_id(), version = %version, "unmapped block state, sending air");
                0
            })
    }

    /// The 4096 wire ids of a section, in block index order.
    pub fn wire_blocks(&self, section: &ChunkSection, version: ProtocolVersion) -> Vec<u32> {
        let blocks = section.blocks();
        let mapped: Vec<u32> = blocks
            .palette()
            .iter()
            .map(|&state| self.block_id(BlockState(state), version))
            .collect();
        (0..blocks.len())
            .map(|index| mapped[blocks.palette_index(index)])
            .collect()
    }

    pub fn block_entity_type(&self, entity: &BlockEntity, version: ProtocolVersion) -> Option<i32> {
        let id = self.mappings.id_for(MappingKind::BlockEntity, entity.kind, version);
        if id.is_none() {
            tracing::debug!(
                kind = entity.kind,
                id = %entity.id,
                version = %version,
                "unmapped block entity type, skipping"
            );
        }
        id
    }

    /// Compares the computed size of the section data with what was written.
    fn check_length(&self, expected: usize, actual: usize, version: ProtocolVersion) -> Result<()> {
        if expected == actual {
            return Ok(());
        }
        tracing::warn!(expected, actual, version = %version, "chunk section data length mismatch");
        if self.config.strict_length_checks {
            return Err(ProtocolError::LengthMismatch { expected, actual });
        }
        Ok(())
    }
}

/// Block entity NBT as sent before 1.18: the stored data plus position and id.
fn positioned_nbt(entity: &BlockEntity) -> Tag {
    let mut compound = entity.data.clone();
    compound.insert("x".into(), Tag::Int(entity.position.x));
    compound.insert("y".into(), Tag::Int(entity.position.y));
    compound.insert("z".into(), Tag::Int(entity.position.z));
    compound.insert("id".into(), Tag::String(entity.id.clone()));
    Tag::Compound(compound)
}

/// 2048 bytes of nibbles, `value(index)` for every block index, low nibble first.
fn nibbles(value: impl Fn(usize) -> u8) -> Vec<u8> {
    (0..2048)
        .map(|byte| (value(byte * 2) & 0x0F) | ((value(byte * 2 + 1) & 0x0F) << 4))
        .collect()
}

/// Column biome for the 2D biome arrays used before 1.15, `z * 16 + x` order.
fn flat_biomes(snapshot: &dyn ChunkSnapshot) -> Vec<u32> {
    let bottom = (0..snapshot.dimension().section_count()).find_map(|index| snapshot.section(index));
    let mut biomes = Vec::with_capacity(256);
    for z in 0..16 {
        for x in 0..16 {
            biomes.push(bottom.map_or(DEFAULT_BIOME, |section| section.get_biome(x >> 2, 0, z >> 2)));
        }
    }
    biomes
}

/// Biome cells of the whole column, bottom up, `(y << 4) | (z << 2) | x` within each section.
fn volume_biomes(snapshot: &dyn ChunkSnapshot) -> Vec<u32> {
    let sections = snapshot.dimension().section_count();
    let mut biomes = Vec::with_capacity(sections * 64);
    for index in 0..sections {
        match snapshot.section(index) {
            Some(section) => biomes.extend(section.biomes().values()),
            None => biomes.extend(std::iter::repeat(DEFAULT_BIOME).take(64)),
        }
    }
    biomes
}
