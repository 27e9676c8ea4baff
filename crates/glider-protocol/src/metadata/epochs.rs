//! Serializer tables. The wire tag of a value kind is its position in the epoch's table.

use super::MetadataKind::{self, *};
use glider_common::ProtocolVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotHeader {
    /// One byte: `(tag << 5) | index`.
    Packed,
    /// Index byte then a signed byte tag.
    ByteTag,
    /// Index byte then a VarInt tag.
    VarIntTag,
}

#[derive(Debug)]
pub struct Epoch {
    pub name: &'static str,
    pub header: SlotHeader,
    pub end: u8,
    pub kinds: &'static [MetadataKind],
}

impl Epoch {
    pub fn for_version(version: ProtocolVersion) -> &'static Epoch {
        use ProtocolVersion as V;
        match version {
            v if v < V::V1_8 => &V1_7,
            v if v < V::V1_9 => &V1_8,
            v if v < V::V1_12 => &V1_9,
            v if v < V::V1_13 => &V1_12,
            v if v < V::V1_14 => &V1_13,
            v if v < V::V1_19 => &V1_14,
            v if v < V::V1_19_3 => &V1_19,
            v if v < V::V1_19_4 => &V1_19_3,
            v if v < V::V1_20_5 => &V1_19_4,
            v if v < V::V1_21_5 => &V1_20_5,
            _ => &V1_21_5,
        }
    }

    pub fn kind(&self, tag: i32) -> Option<MetadataKind> {
        usize::try_from(tag).ok().and_then(|i| self.kinds.get(i)).copied()
    }

    pub fn tag(&self, kind: MetadataKind) -> Option<i32> {
        self.kinds.iter().position(|k| *k == kind).map(|i| i as i32)
    }
}

pub static V1_7: Epoch = Epoch {
    name: "1.7",
    header: SlotHeader::Packed,
    end: 0x7F,
    kinds: &[Byte, Short, Int, Float, String, Item, Coordinates],
};

/// 1.7 plus rotations.
pub static V1_8: Epoch = Epoch {
    name: "1.8",
    header: SlotHeader::Packed,
    end: 0x7F,
    kinds: &[Byte, Short, Int, Float, String, Item, Coordinates, Rotation],
};

pub static V1_9: Epoch = Epoch {
    name: "1.9",
    header: SlotHeader::ByteTag,
    end: 0xFF,
    kinds: &[
        Byte, VarInt, Float, String, Chat, Item, Bool, Rotation, Position, OptPosition,
        Direction, OptUuid, OptBlockState,
    ],
};

pub static V1_12: Epoch = Epoch {
    name: "1.12",
    header: SlotHeader::ByteTag,
    end: 0xFF,
    kinds: &[
        Byte, VarInt, Float, String, Chat, Item, Bool, Rotation, Position, OptPosition,
        Direction, OptUuid, OptBlockState, Nbt,
    ],
};

pub static V1_13: Epoch = Epoch {
    name: "1.13",
    header: SlotHeader::VarIntTag,
    end: 0xFF,
    kinds: &[
        Byte, VarInt, Float, String, Chat, OptChat, Item, Bool, Rotation, Position,
        OptPosition, Direction, OptUuid, OptBlockState, Nbt, Particle,
    ],
};

pub static V1_14: Epoch = Epoch {
    name: "1.14",
    header: SlotHeader::VarIntTag,
    end: 0xFF,
    kinds: &[
        Byte, VarInt, Float, String, Chat, OptChat, Item, Bool, Rotation, Position,
        OptPosition, Direction, OptUuid, OptBlockState, Nbt, Particle, VillagerData, OptVarInt,
        Pose,
    ],
};

pub static V1_19: Epoch = Epoch {
    name: "1.19",
    header: SlotHeader::VarIntTag,
    end: 0xFF,
    kinds: &[
        Byte, VarInt, Float, String, Chat, OptChat, Item, Bool, Rotation, Position,
        OptPosition, Direction, OptUuid, OptBlockState, Nbt, Particle, VillagerData, OptVarInt,
        Pose, CatVariant, FrogVariant, OptGlobalPos, PaintingVariant,
    ],
};

pub static V1_19_3: Epoch = Epoch {
    name: "1.19.3",
    header: SlotHeader::VarIntTag,
    end: 0xFF,
    kinds: &[
        Byte, VarInt, VarLong, Float, String, Chat, OptChat, Item, Bool, Rotation, Position,
        OptPosition, Direction, OptUuid, OptBlockState, Nbt, Particle, VillagerData, OptVarInt,
        Pose, CatVariant, FrogVariant, OptGlobalPos, PaintingVariant,
    ],
};

pub static V1_19_4: Epoch = Epoch {
    name: "1.19.4",
    header: SlotHeader::VarIntTag,
    end: 0xFF,
    kinds: &[
        Byte, VarInt, VarLong, Float, String, Chat, OptChat, Item, Bool, Rotation, Position,
        OptPosition, Direction, OptUuid, BlockState, OptBlockState, Nbt, Particle, VillagerData,
        OptVarInt, Pose, CatVariant, FrogVariant, OptGlobalPos, PaintingVariant, SnifferState,
        Vector3, Quaternion,
    ],
};

pub static V1_20_5: Epoch = Epoch {
    name: "1.20.5",
    header: SlotHeader::VarIntTag,
    end: 0xFF,
    kinds: &[
        Byte, VarInt, VarLong, Float, String, Chat, OptChat, Item, Bool, Rotation, Position,
        OptPosition, Direction, OptUuid, BlockState, OptBlockState, Nbt, Particle, ParticleList,
        VillagerData, OptVarInt, Pose, CatVariant, WolfVariant, FrogVariant, OptGlobalPos,
        PaintingVariant, SnifferState, ArmadilloState, Vector3, Quaternion,
    ],
};

pub static V1_21_5: Epoch = Epoch {
    name: "1.21.5",
    header: SlotHeader::VarIntTag,
    end: 0xFF,
    kinds: &[
        Byte, VarInt, VarLong, Float, String, Chat, OptChat, Item, Bool, Rotation, Position,
        OptPosition, Direction, OptUuid, BlockState, OptBlockState, Nbt, Particle, ParticleList,
        VillagerData, OptVarInt, Pose, CatVariant, CowVariant, WolfVariant, WolfSoundVariant,
        FrogVariant, PigVariant, ChickenVariant, OptGlobalPos, PaintingVariant, SnifferState,
        ArmadilloState, Vector3, Quaternion,
    ],
};
