//! Entity metadata: an index-keyed list of typed values terminated by a sentinel.
//!
//! Values do not carry their wire tag. The tag is derived from the value's kind through the
//! table of the version's epoch, because both the set of kinds and their numbering changed
//! many times.

mod epochs;

pub use epochs::{Epoch, SlotHeader};

use crate::buffer::PacketBuffer;
use crate::codec::Codec;
use crate::item::{slot, ItemStack};
use crate::particle::{Particle, PARTICLE};
use crate::text::{TextComponent, TEXT};
use glider_common::{BlockPos, ProtocolError, ProtocolVersion, Result};
use glider_nbt::Tag;
use uuid::Uuid;

const MAX_ENTRIES: usize = 256;
const MAX_PARTICLES: usize = 256;
const LEGACY_MAX_INDEX: u8 = 0x1F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Byte,
    Short,
    Int,
    VarInt,
    VarLong,
    Float,
    String,
    Chat,
    OptChat,
    Item,
    Bool,
    Rotation,
    Coordinates,
    Position,
    OptPosition,
    Direction,
    OptUuid,
    BlockState,
    OptBlockState,
    Nbt,
    Particle,
    ParticleList,
    VillagerData,
    OptVarInt,
    Pose,
    CatVariant,
    CowVariant,
    WolfVariant,
    WolfSoundVariant,
    FrogVariant,
    PigVariant,
    ChickenVariant,
    OptGlobalPos,
    PaintingVariant,
    SnifferState,
    ArmadilloState,
    Vector3,
    Quaternion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VillagerData {
    pub kind: i32,
    pub profession: i32,
    pub level: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalPos {
    pub dimension: String,
    pub pos: BlockPos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    Short(i16),
    /// Fixed-width int of the legacy format.
    Int(i32),
    VarInt(i32),
    VarLong(i64),
    Float(f32),
    String(String),
    Chat(TextComponent),
    OptChat(Option<TextComponent>),
    Item(Option<ItemStack>),
    Bool(bool),
    Rotation([f32; 3]),
    /// Three ints, the legacy position form.
    Coordinates(BlockPos),
    Position(BlockPos),
    OptPosition(Option<BlockPos>),
    Direction(i32),
    OptUuid(Option<Uuid>),
    BlockState(i32),
    /// Block state id; 0 means absent.
    OptBlockState(i32),
    Nbt(Option<Tag>),
    Particle(Particle),
    ParticleList(Vec<Particle>),
    VillagerData(VillagerData),
    OptVarInt(Option<i32>),
    Pose(i32),
    CatVariant(i32),
    CowVariant(i32),
    WolfVariant(i32),
    WolfSoundVariant(i32),
    FrogVariant(i32),
    PigVariant(i32),
    ChickenVariant(i32),
    OptGlobalPos(Option<GlobalPos>),
    /// Painting variant registry id.
    PaintingVariant(i32),
    SnifferState(i32),
    ArmadilloState(i32),
    Vector3([f32; 3]),
    Quaternion([f32; 4]),
}

impl MetadataValue {
    pub fn kind(&self) -> MetadataKind {
        match self {
            MetadataValue::Byte(_) => MetadataKind::Byte,
            MetadataValue::Short(_) => MetadataKind::Short,
            MetadataValue::Int(_) => MetadataKind::Int,
            MetadataValue::VarInt(_) => MetadataKind::VarInt,
            MetadataValue::VarLong(_) => MetadataKind::VarLong,
            MetadataValue::Float(_) => MetadataKind::Float,
            MetadataValue::String(_) => MetadataKind::String,
            MetadataValue::Chat(_) => MetadataKind::Chat,
            MetadataValue::OptChat(_) => MetadataKind::OptChat,
            MetadataValue::Item(_) => MetadataKind::Item,
            MetadataValue::Bool(_) => MetadataKind::Bool,
            MetadataValue::Rotation(_) => MetadataKind::Rotation,
            MetadataValue::Coordinates(_) => MetadataKind::Coordinates,
            MetadataValue::Position(_) => MetadataKind::Position,
            MetadataValue::OptPosition(_) => MetadataKind::OptPosition,
            MetadataValue::Direction(_) => MetadataKind::Direction,
            MetadataValue::OptUuid(_) => MetadataKind::OptUuid,
            MetadataValue::BlockState(_) => MetadataKind::BlockState,
            MetadataValue::OptBlockState(_) => MetadataKind::OptBlockState,
            MetadataValue::Nbt(_) => MetadataKind::Nbt,
            MetadataValue::Particle(_) => MetadataKind::Particle,
            MetadataValue::ParticleList(_) => MetadataKind::ParticleList,
            MetadataValue::VillagerData(_) => MetadataKind::VillagerData,
            MetadataValue::OptVarInt(_) => MetadataKind::OptVarInt,
            MetadataValue::Pose(_) => MetadataKind::Pose,
            MetadataValue::CatVariant(_) => MetadataKind::CatVariant,
            MetadataValue::CowVariant(_) => MetadataKind::CowVariant,
            MetadataValue::WolfVariant(_) => MetadataKind::WolfVariant,
            MetadataValue::WolfSoundVariant(_) => MetadataKind::WolfSoundVariant,
            MetadataValue::FrogVariant(_) => MetadataKind::FrogVariant,
            MetadataValue::PigVariant(_) => MetadataKind::PigVariant,
            MetadataValue::ChickenVariant(_) => MetadataKind::ChickenVariant,
            MetadataValue::OptGlobalPos(_) => MetadataKind::OptGlobalPos,
            MetadataValue::PaintingVariant(_) => MetadataKind::PaintingVariant,
            MetadataValue::SnifferState(_) => MetadataKind::SnifferState,
            MetadataValue::ArmadilloState(_) => MetadataKind::ArmadilloState,
            MetadataValue::Vector3(_) => MetadataKind::Vector3,
            MetadataValue::Quaternion(_) => MetadataKind::Quaternion,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub index: u8,
    pub value: MetadataValue,
}

impl MetadataEntry {
    pub fn new(index: u8, value: MetadataValue) -> Self {
        Self { index, value }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityMetadata {
    pub entries: Vec<MetadataEntry>,
}

impl EntityMetadata {
    pub fn new(entries: Vec<MetadataEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, index: u8) -> Option<&MetadataValue> {
        self.entries
            .iter()
            .find(|entry| entry.index == index)
            .map(|entry| &entry.value)
    }
}

/// Holder-encoded since 1.21: registry id plus one, zero introducing an inline definition.
fn painting_is_holder(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_21
}

fn read_floats<const N: usize>(buf: &mut PacketBuffer) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    for value in out.iter_mut() {
        *value = buf.read_f32()?;
    }
    Ok(out)
}

fn write_floats(values: &[f32], buf: &mut PacketBuffer) {
    for value in values {
        buf.write_f32(*value);
    }
}

fn read_value(
    kind: MetadataKind,
    tag: i32,
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
) -> Result<MetadataValue> {
    use MetadataKind as K;
    use MetadataValue as V;
    let value = match kind {
        K::Byte => V::Byte(buf.read_i8()?),
        K::Short => V::Short(buf.read_i16()?),
        K::Int => V::Int(buf.read_i32()?),
        K::VarInt => V::VarInt(buf.read_varint()?),
        K::VarLong => V::VarLong(buf.read_varlong()?),
        K::Float => V::Float(buf.read_f32()?),
        K::String => V::String(buf.read_string()?),
        K::Chat => V::Chat(TEXT.decode(buf, version)?),
        K::OptChat => V::OptChat(if buf.read_bool()? {
            Some(TEXT.decode(buf, version)?)
        } else {
            None
        }),
        K::Item => V::Item(slot().decode(buf, version)?),
        K::Bool => V::Bool(buf.read_bool()?),
        K::Rotation => V::Rotation(read_floats(buf)?),
        K::Coordinates => V::Coordinates(BlockPos::new(
            buf.read_i32()?,
            buf.read_i32()?,
            buf.read_i32()?,
        )),
        K::Position => V::Position(buf.read_position(version)?),
        K::OptPosition => V::OptPosition(if buf.read_bool()? {
            Some(buf.read_position(version)?)
        } else {
            None
        }),
        K::Direction => V::Direction(buf.read_varint()?),
        K::OptUuid => V::OptUuid(if buf.read_bool()? {
            Some(buf.read_uuid()?)
        } else {
            None
        }),
        K::BlockState => V::BlockState(buf.read_varint()?),
        K::OptBlockState => V::OptBlockState(buf.read_varint()?),
        K::Nbt => V::Nbt(buf.read_nbt(version)?),
        K::Particle => V::Particle(PARTICLE.decode(buf, version)?),
        K::ParticleList => {
            let count = buf.read_length(MAX_PARTICLES)?;
            let mut particles = Vec::with_capacity(count);
            for _ in 0..count {
                particles.push(PARTICLE.decode(buf, version)?);
            }
            V::ParticleList(particles)
        }
        K::VillagerData => V::VillagerData(VillagerData {
            kind: buf.read_varint()?,
            profession: buf.read_varint()?,
            level: buf.read_varint()?,
        }),
        K::OptVarInt => V::OptVarInt(match buf.read_varint()? {
            0 => None,
            n => Some(n - 1),
        }),
        K::Pose => V::Pose(buf.read_varint()?),
        K::CatVariant => V::CatVariant(buf.read_varint()?),
        K::CowVariant => V::CowVariant(buf.read_varint()?),
        K::WolfVariant => V::WolfVariant(buf.read_varint()?),
        K::WolfSoundVariant => V::WolfSoundVariant(buf.read_varint()?),
        K::FrogVariant => V::FrogVariant(buf.read_varint()?),
        K::PigVariant => V::PigVariant(buf.read_varint()?),
        K::ChickenVariant => V::ChickenVariant(buf.read_varint()?),
        K::OptGlobalPos => V::OptGlobalPos(if buf.read_bool()? {
            Some(GlobalPos {
                dimension: buf.read_string()?,
                pos: buf.read_position(version)?,
            })
        } else {
            None
        }),
        K::PaintingVariant if painting_is_holder(version) => match buf.read_varint()? {
            // Inline painting definitions are not modelled.
            0 => {
                return Err(ProtocolError::UnknownVariant {
                    domain: "painting variant",
                    tag,
                    version,
                })
            }
            id => V::PaintingVariant(id - 1),
        },
        K::PaintingVariant => V::PaintingVariant(buf.read_varint()?),
        K::SnifferState => V::SnifferState(buf.read_varint()?),
        K::ArmadilloState => V::ArmadilloState(buf.read_varint()?),
        K::Vector3 => V::Vector3(read_floats(buf)?),
        K::Quaternion => V::Quaternion(read_floats(buf)?),
    };
    Ok(value)
}

fn write_value(value: &MetadataValue, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
    use MetadataValue as V;
    match value {
        V::Byte(v) => buf.write_i8(*v),
        V::Short(v) => buf.write_i16(*v),
        V::Int(v) => buf.write_i32(*v),
        V::VarInt(v)
        | V::Direction(v)
        | V::BlockState(v)
        | V::OptBlockState(v)
        | V::Pose(v)
        | V::CatVariant(v)
        | V::CowVariant(v)
        | V::WolfVariant(v)
        | V::WolfSoundVariant(v)
        | V::FrogVariant(v)
        | V::PigVariant(v)
        | V::ChickenVariant(v)
        | V::SnifferState(v)
        | V::ArmadilloState(v) => buf.write_varint(*v),
        V::VarLong(v) => buf.write_varlong(*v),
        V::Float(v) => buf.write_f32(*v),
        V::String(v) => buf.write_string(v)?,
        V::Chat(text) => TEXT.encode(text, buf, version)?,
        V::OptChat(text) => {
            buf.write_bool(text.is_some());
            if let Some(text) = text {
                TEXT.encode(text, buf, version)?;
            }
        }
        V::Item(item) => slot().encode(item, buf, version)?,
        V::Bool(v) => buf.write_bool(*v),
        V::Rotation(v) | V::Vector3(v) => write_floats(v, buf),
        V::Quaternion(v) => write_floats(v, buf),
        V::Coordinates(pos) => {
            buf.write_i32(pos.x);
            buf.write_i32(pos.y);
            buf.write_i32(pos.z);
        }
        V::Position(pos) => buf.write_position(*pos, version),
        V::OptPosition(pos) => {
            buf.write_bool(pos.is_some());
            if let Some(pos) = pos {
                buf.write_position(*pos, version);
            }
        }
        V::OptUuid(uuid) => {
            buf.write_bool(uuid.is_some());
            if let Some(uuid) = uuid {
                buf.write_uuid(*uuid);
            }
        }
        V::Nbt(tag) => buf.write_nbt(tag.as_ref(), version)?,
        V::Particle(particle) => PARTICLE.encode(particle, buf, version)?,
        V::ParticleList(particles) => {
            buf.write_length(particles.len(), MAX_PARTICLES)?;
            for particle in particles {
                PARTICLE.encode(particle, buf, version)?;
            }
        }
        V::VillagerData(data) => {
            buf.write_varint(data.kind);
            buf.write_varint(data.profession);
            buf.write_varint(data.level);
        }
        V::OptVarInt(v) => buf.write_varint(v.map_or(0, |n| n + 1)),
        V::OptGlobalPos(pos) => {
            buf.write_bool(pos.is_some());
            if let Some(pos) = pos {
                buf.write_string(&pos.dimension)?;
                buf.write_position(pos.pos, version);
            }
        }
        V::PaintingVariant(id) if painting_is_holder(version) => buf.write_varint(id + 1),
        V::PaintingVariant(id) => buf.write_varint(*id),
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataCodec;

pub const METADATA: MetadataCodec = MetadataCodec;

impl Codec<EntityMetadata> for MetadataCodec {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<EntityMetadata> {
        let epoch = Epoch::for_version(version);
        let mut entries = Vec::new();
        loop {
            let first = buf.read_u8()?;
            if first == epoch.end {
                break;
            }
            if entries.len() == MAX_ENTRIES {
                return Err(ProtocolError::CollectionTooLarge {
                    count: entries.len() as i64 + 1,
                    max: MAX_ENTRIES,
                });
            }
            let (index, tag) = match epoch.header {
                SlotHeader::Packed => (first & LEGACY_MAX_INDEX, (first >> 5) as i32),
                SlotHeader::ByteTag => (first, buf.read_i8()? as i32),
                SlotHeader::VarIntTag => (first, buf.read_varint()?),
            };
            let kind = epoch.kind(tag).ok_or(ProtocolError::UnknownVariant {
                domain: "entity metadata",
                tag,
                version,
            })?;
            let value = read_value(kind, tag, buf, version)?;
            entries.push(MetadataEntry { index, value });
        }
        Ok(EntityMetadata { entries })
    }

    fn encode(&self, value: &EntityMetadata, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        let epoch = Epoch::for_version(version);
        for entry in &value.entries {
            let kind = entry.value.kind();
            let tag = epoch.tag(kind).ok_or_else(|| ProtocolError::UnsupportedValue {
                domain: "entity metadata",
                kind: format!("{:?}", kind),
                version,
            })?;
            match epoch.header {
                SlotHeader::Packed => {
                    let header = ((tag as u8) << 5) | (entry.index & LEGACY_MAX_INDEX);
                    if entry.index > LEGACY_MAX_INDEX || header == epoch.end {
                        return Err(ProtocolError::invalid(format!(
                            "metadata index {} cannot be sent to {}",
                            entry.index, version
                        )));
                    }
                    buf.write_u8(header);
                }
                SlotHeader::ByteTag | SlotHeader::VarIntTag => {
                    if entry.index == epoch.end {
                        return Err(ProtocolError::invalid(format!(
                            "metadata index {} is the end marker",
                            entry.index
                        )));
                    }
                    buf.write_u8(entry.index);
                    if epoch.header == SlotHeader::ByteTag {
                        buf.write_i8(tag as i8);
                    } else {
                        buf.write_varint(tag);
                    }
                }
            }
            write_value(&entry.value, buf, version)?;
        }
        buf.write_u8(epoch.end);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_from, encode_to_vec};
    use assert_matches::assert_matches;
    use ProtocolVersion::*;

    fn round_trip(metadata: &EntityMetadata, version: ProtocolVersion) -> Vec<u8> {
        let bytes = encode_to_vec(&METADATA, metadata, version).unwrap();
        assert_eq!(&decode_from(&METADATA, &bytes, version).unwrap(), metadata, "{}", version);
        bytes
    }

    fn entries(values: Vec<(u8, MetadataValue)>) -> EntityMetadata {
        EntityMetadata::new(
            values
                .into_iter()
                .map(|(index, value)| MetadataEntry::new(index, value))
                .collect(),
        )
    }

    #[test]
    fn test_legacy_packed_header() {
        let metadata = entries(vec![
            (0, MetadataValue::Byte(0x20)),
            (6, MetadataValue::Float(20.0)),
            (2, MetadataValue::String("Steve".into())),
            (17, MetadataValue::Coordinates(BlockPos::new(1, 2, 3))),
        ]);
        let bytes = round_trip(&metadata, V1_8);
        assert_eq!(&bytes[..2], &[0x00, 0x20]);
        assert_eq!(bytes[2], (3 << 5) | 6);
        assert_eq!(*bytes.last().unwrap(), 0x7F);
    }

    #[test]
    fn test_legacy_rejects_sentinel_collision() {
        let metadata = entries(vec![(31, MetadataValue::Float(1.0))]);
        assert!(encode_to_vec(&METADATA, &metadata, V1_7_6).is_err());
        let metadata = entries(vec![(40, MetadataValue::Byte(1))]);
        assert!(encode_to_vec(&METADATA, &metadata, V1_8).is_err());
    }

    #[test]
    fn test_rotation_needs_1_8() {
        let metadata = entries(vec![(7, MetadataValue::Rotation([0.0, 90.0, 0.0]))]);
        assert_matches!(
            encode_to_vec(&METADATA, &metadata, V1_7_6),
            Err(ProtocolError::UnsupportedValue { .. })
        );
        let bytes = round_trip(&metadata, V1_8);
        assert_eq!(bytes[0], (7 << 5) | 7);
        // tag 7 is not a 1.7 kind
        assert_matches!(
            decode_from(&METADATA, &bytes, V1_7_6),
            Err(ProtocolError::UnknownVariant { .. })
        );
    }

    #[test]
    fn test_byte_tag_epoch() {
        let metadata = entries(vec![
            (0, MetadataValue::Byte(0)),
            (1, MetadataValue::VarInt(300)),
            (6, MetadataValue::Bool(true)),
        ]);
        let bytes = round_trip(&metadata, V1_9);
        assert_eq!(bytes, vec![0, 0, 0, 1, 1, 0xAC, 0x02, 6, 6, 1, 0xFF]);
        round_trip(&entries(vec![(3, MetadataValue::Nbt(Some(Tag::compound())))]), V1_12_2);
    }

    #[test]
    fn test_same_kind_different_tags() {
        let metadata = entries(vec![(4, MetadataValue::Float(1.0))]);
        assert_eq!(encode_to_vec(&METADATA, &metadata, V1_19_1).unwrap()[1], 2);
        assert_eq!(encode_to_vec(&METADATA, &metadata, V1_19_3).unwrap()[1], 3);
    }

    #[test]
    fn test_modern_values() {
        let metadata = entries(vec![
            (2, MetadataValue::OptChat(Some(TextComponent::Nbt(Tag::String("Bob".into()))))),
            (3, MetadataValue::OptVarInt(Some(0))),
            (4, MetadataValue::OptVarInt(None)),
            (5, MetadataValue::Position(BlockPos::new(-5, 64, 12))),
            (6, MetadataValue::OptUuid(Some(Uuid::from_u128(0x1234)))),
            (7, MetadataValue::VillagerData(VillagerData {
                kind: 1,
                profession: 2,
                level: 3,
            })),
            (8, MetadataValue::Quaternion([0.0, 0.0, 0.0, 1.0])),
            (9, MetadataValue::BlockState(18)),
            (
                10,
                MetadataValue::OptGlobalPos(Some(GlobalPos {
                    dimension: "minecraft:overworld".into(),
                    pos: BlockPos::new(1, 2, 3),
                })),
            ),
            (11, MetadataValue::Item(Some(ItemStack::new(5, 1)))),
        ]);
        round_trip(&metadata, V1_20_5);
        round_trip(&metadata, V1_21_5);
    }

    #[test]
    fn test_painting_holder_from_1_21() {
        let metadata = entries(vec![(8, MetadataValue::PaintingVariant(4))]);
        let old = round_trip(&metadata, V1_20_5);
        let new = round_trip(&metadata, V1_21);
        assert_eq!(old[2], 4);
        assert_eq!(new[2], 5);

        let painting = Epoch::for_version(V1_21).tag(MetadataKind::PaintingVariant).unwrap() as u8;
        assert_matches!(
            decode_from(&METADATA, &[8, painting, 0, 0xFF], V1_21),
            Err(ProtocolError::UnknownVariant { .. })
        );
    }

    #[test]
    fn test_unknown_tag() {
        assert_matches!(
            decode_from(&METADATA, &[0, 99, 0, 0xFF], V1_16),
            Err(ProtocolError::UnknownVariant { domain: "entity metadata", tag: 99, .. })
        );
    }

    #[test]
    fn test_kind_missing_from_epoch() {
        let metadata = entries(vec![(0, MetadataValue::VarLong(1))]);
        assert_matches!(
            encode_to_vec(&METADATA, &metadata, V1_19),
            Err(ProtocolError::UnsupportedValue { .. })
        );
        let metadata = entries(vec![(0, MetadataValue::Short(1))]);
        assert_matches!(
            encode_to_vec(&METADATA, &metadata, V1_9),
            Err(ProtocolError::UnsupportedValue { .. })
        );
    }

    #[test]
    fn test_every_epoch_round_trips() {
        for version in ProtocolVersion::all().iter().copied() {
            let epoch = Epoch::for_version(version);
            let mut values = vec![(0, MetadataValue::Byte(1)), (1, MetadataValue::Float(0.5))];
            if epoch.tag(MetadataKind::VarInt).is_some() {
                values.push((2, MetadataValue::VarInt(-1)));
                values.push((3, MetadataValue::Item(None)));
            } else {
                values.push((2, MetadataValue::Int(-1)));
                values.push((3, MetadataValue::Coordinates(BlockPos::new(4, 5, 6))));
            }
            if epoch.tag(MetadataKind::Rotation).is_some() {
                values.push((4, MetadataValue::Rotation([1.0, 2.0, 3.0])));
            }
            round_trip(&entries(values), version);
        }
    }
}
