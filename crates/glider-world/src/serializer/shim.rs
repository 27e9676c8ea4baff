//! Block entities that 1.9.4 to 1.12.2 clients need to render beds, flower pots, skulls and
//! banners. Worlds built from flattened data do not store them, so they are derived from the
//! block ids in the section.

use super::{ChunkSerializer, Selection};
use crate::column::{BlockEntity, ChunkSnapshot};
use glider_common::{BlockPos, ProtocolVersion};
use glider_nbt::Tag;

const BED: u32 = 26;
const FLOWER_POT: u32 = 140;
const SKULL: u32 = 144;
const STANDING_BANNER: u32 = 176;
const WALL_BANNER: u32 = 177;

/// Whether `version` needs the derived block entities.
pub(super) fn applies(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_9_4 && version < ProtocolVersion::V1_13
}

/// Default block entity for a legacy block id, if it needs one.
fn default_for(legacy_id: u32, position: BlockPos) -> Option<BlockEntity> {
    let mut entity = match legacy_id {
        BED => BlockEntity::new(position, 0, "minecraft:bed"),
        FLOWER_POT => BlockEntity::new(position, 0, "minecraft:flower_pot"),
        SKULL => BlockEntity::new(position, 0, "minecraft:skull"),
        STANDING_BANNER | WALL_BANNER => BlockEntity::new(position, 0, "minecraft:banner"),
        _ => return None,
    };
    let data = &mut entity.data;
    match legacy_id {
        // red, the only bed before 1.12 had colours
        BED => {
            data.insert("color".into(), Tag::Int(14));
        }
        FLOWER_POT => {
            data.insert("Item".into(), Tag::String("minecraft:air".into()));
            data.insert("Data".into(), Tag::Int(0));
        }
        SKULL => {
            data.insert("SkullType".into(), Tag::Byte(0));
            data.insert("Rot".into(), Tag::Byte(0));
        }
        _ => {
            data.insert("Base".into(), Tag::Int(15));
        }
    }
    Some(entity)
}

/// Derived block entities for the selected sections, skipping positions that already hold one.
pub(super) fn synthesize(
    serializer: &ChunkSerializer,
    snapshot: &dyn ChunkSnapshot,
    selection: Selection,
    version: ProtocolVersion,
) -> Vec<BlockEntity> {
    let dimension = snapshot.dimension();
    let existing = snapshot.block_entities();
    let mut derived = Vec::new();

    for index in 0..dimension.section_count() {
        if !selection.contains(index) {
            continue;
        }
        let section = match snapshot.section(index) {
            Some(section) => section,
            None => continue,
        };
        for (block, wire) in serializer.wire_blocks(section, version).into_iter().enumerate() {
            let legacy_id = wire >> 4;
            if !matches!(legacy_id, BED | FLOWER_POT | SKULL | STANDING_BANNER | WALL_BANNER) {
                continue;
            }
            let position = BlockPos::new(
                snapshot.x() * 16 + (block & 15) as i32,
                dimension.min_y + (index * 16 + (block >> 8)) as i32,
                snapshot.z() * 16 + ((block >> 4) & 15) as i32,
            );
            if existing.iter().any(|entity| entity.position == position) {
                continue;
            }
            derived.extend(default_for(legacy_id, position));
        }
    }

    if !derived.is_empty() {
        tracing::trace!(count = derived.len(), version = %version, "derived legacy block entities");
    }
    derived
}

#[cfg(test)]
mod tests {
    use super::super::tests::serializer;
    use super::*;
    use crate::block::BlockState;
    use crate::column::{ChunkColumn, Dimension};

    #[test]
    fn test_version_window() {
        assert!(!applies(ProtocolVersion::V1_9_2));
        assert!(applies(ProtocolVersion::V1_9_4));
        assert!(applies(ProtocolVersion::V1_12_2));
        assert!(!applies(ProtocolVersion::V1_13));
    }

    #[test]
    fn test_derives_defaults_at_absolute_positions() {
        let mut column = ChunkColumn::new(-1, 2, Dimension::LEGACY_OVERWORLD);
        column.set_block_state(3, 70, 4, BlockState(FLOWER_POT << 4));
        column.set_block_state(0, 0, 0, BlockState((BED << 4) | 2));
        column.set_block_state(5, 5, 5, BlockState(1 << 4));

        let derived = synthesize(&serializer(true), &column, Selection::Full, ProtocolVersion::V1_12_2);
        assert_eq!(derived.len(), 2);

        let bed = &derived[0];
        assert_eq!(bed.id, "minecraft:bed");
        assert_eq!(bed.position, BlockPos::new(-16, 0, 32));
        assert_eq!(bed.data.get("color"), Some(&Tag::Int(14)));

        let pot = &derived[1];
        assert_eq!(pot.id, "minecraft:flower_pot");
        assert_eq!(pot.position, BlockPos::new(-13, 70, 36));
        assert_eq!(pot.data.get("Item"), Some(&Tag::String("minecraft:air".into())));
    }

    #[test]
    fn test_existing_entities_win() {
        let mut column = ChunkColumn::new(0, 0, Dimension::LEGACY_OVERWORLD);
        column.set_block_state(1, 1, 1, BlockState(WALL_BANNER << 4));
        column.set_block_state(2, 1, 1, BlockState(SKULL << 4));
        column.add_block_entity(BlockEntity::new(BlockPos::new(1, 1, 1), 0, "minecraft:banner"));

        let derived = synthesize(&serializer(true), &column, Selection::Full, ProtocolVersion::V1_11);
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].id, "minecraft:skull");
    }

    #[test]
    fn test_only_selected_sections() {
        let mut column = ChunkColumn::new(0, 0, Dimension::LEGACY_OVERWORLD);
        column.set_block_state(0, 20, 0, BlockState(STANDING_BANNER << 4));
        let serializer = serializer(true);
        assert!(synthesize(&serializer, &column, Selection::Sections(0b1), ProtocolVersion::V1_10).is_empty());
        assert_eq!(
            synthesize(&serializer, &column, Selection::Sections(0b10), ProtocolVersion::V1_10).len(),
            1
        );
    }
}
