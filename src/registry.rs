//! Play state id tables for every packet this workspace implements.

use glider_common::{ConnectionState, Direction, ProtocolVersion as V, RegistryError};
use glider_protocol::packets::{KeepAlivePacket, PlayerPositionPacket, SetEntityMetadataPacket, SetSlotPacket};
use glider_protocol::registry::{map, PacketMapping, PacketRegistryBuilder, StateRegistry};
use glider_world::{ChunkDataPacket, UpdateLightPacket};

pub const CLIENTBOUND_KEEP_ALIVE: &[PacketMapping] = &[
    map(0x00, V::V1_7_2),
    map(0x1F, V::V1_9),
    map(0x21, V::V1_13),
    map(0x20, V::V1_14),
    map(0x21, V::V1_15),
    map(0x20, V::V1_16),
    map(0x1F, V::V1_16_2),
    map(0x21, V::V1_17),
    map(0x1E, V::V1_19),
    map(0x20, V::V1_19_1),
    map(0x1F, V::V1_19_3),
    map(0x23, V::V1_19_4),
    map(0x24, V::V1_20_2),
    map(0x26, V::V1_20_5),
    map(0x27, V::V1_21_2),
    map(0x26, V::V1_21_5),
];

pub const SERVERBOUND_KEEP_ALIVE: &[PacketMapping] = &[
    map(0x00, V::V1_7_2),
    map(0x0B, V::V1_9),
    map(0x0C, V::V1_12),
    map(0x0B, V::V1_12_1),
    map(0x0E, V::V1_13),
    map(0x0F, V::V1_14),
    map(0x10, V::V1_16),
    map(0x0F, V::V1_17),
    map(0x11, V::V1_19),
    map(0x12, V::V1_19_1),
    map(0x11, V::V1_19_3),
    map(0x12, V::V1_19_4),
    map(0x14, V::V1_20_2),
    map(0x15, V::V1_20_3),
    map(0x18, V::V1_20_5),
    map(0x1A, V::V1_21_2),
    map(0x1B, V::V1_21_5),
];

pub const CHUNK_DATA: &[PacketMapping] = &[
    map(0x21, V::V1_7_2).encode_only(),
    map(0x20, V::V1_9).encode_only(),
    map(0x22, V::V1_13).encode_only(),
    map(0x21, V::V1_14).encode_only(),
    map(0x22, V::V1_15).encode_only(),
    map(0x21, V::V1_16).encode_only(),
    map(0x20, V::V1_16_2).encode_only(),
    map(0x22, V::V1_17).encode_only(),
    map(0x1F, V::V1_19).encode_only(),
    map(0x21, V::V1_19_1).encode_only(),
    map(0x20, V::V1_19_3).encode_only(),
    map(0x24, V::V1_19_4).encode_only(),
    map(0x25, V::V1_20_2).encode_only(),
    map(0x27, V::V1_20_5).encode_only(),
    map(0x28, V::V1_21_2).encode_only(),
    map(0x27, V::V1_21_5).encode_only(),
];

/// Only the separate light packet of 1.14 to 1.17.1; later light rides in the chunk packet.
pub const UPDATE_LIGHT: &[PacketMapping] = &[
    map(0x24, V::V1_14).encode_only(),
    map(0x25, V::V1_15).encode_only(),
    map(0x24, V::V1_16).encode_only(),
    map(0x23, V::V1_16_2).encode_only(),
    map(0x25, V::V1_17).until(V::V1_17_1).encode_only(),
];

pub const SET_ENTITY_METADATA: &[PacketMapping] = &[
    map(0x1C, V::V1_7_2),
    map(0x39, V::V1_9),
    map(0x3B, V::V1_12),
    map(0x3C, V::V1_12_1),
    map(0x3F, V::V1_13),
    map(0x43, V::V1_14),
    map(0x44, V::V1_15),
    map(0x4D, V::V1_17),
    map(0x50, V::V1_19_1),
    map(0x4E, V::V1_19_3),
    map(0x52, V::V1_19_4),
    map(0x54, V::V1_20_2),
    map(0x56, V::V1_20_3),
    map(0x58, V::V1_20_5),
    map(0x5D, V::V1_21_2),
    map(0x5C, V::V1_21_5),
];

pub const SET_SLOT: &[PacketMapping] = &[
    map(0x2F, V::V1_7_2),
    map(0x16, V::V1_9),
    map(0x17, V::V1_13),
    map(0x16, V::V1_14),
    map(0x17, V::V1_15),
    map(0x16, V::V1_16),
    map(0x15, V::V1_16_2),
    map(0x16, V::V1_17),
    map(0x13, V::V1_19),
    map(0x12, V::V1_19_3),
    map(0x14, V::V1_19_4),
    map(0x15, V::V1_20_2),
    map(0x14, V::V1_21_2),
];

pub const PLAYER_POSITION: &[PacketMapping] = &[
    map(0x08, V::V1_7_2),
    map(0x2E, V::V1_9),
    map(0x2F, V::V1_12_1),
    map(0x32, V::V1_13),
    map(0x35, V::V1_14),
    map(0x36, V::V1_15),
    map(0x35, V::V1_16),
    map(0x34, V::V1_16_2),
    map(0x38, V::V1_17),
    map(0x36, V::V1_19),
    map(0x39, V::V1_19_1),
    map(0x38, V::V1_19_3),
    map(0x3C, V::V1_19_4),
    map(0x3E, V::V1_20_2),
    map(0x40, V::V1_20_5),
    map(0x42, V::V1_21_2),
    map(0x41, V::V1_21_5),
];

/// Builds the play state registry. Any inconsistency in the tables above is returned as an
/// error; callers should treat it as fatal at startup.
pub fn play_registry(fallback: bool) -> Result<StateRegistry, RegistryError> {
    let mut clientbound = PacketRegistryBuilder::new(Direction::Clientbound).fallback(fallback);
    clientbound
        .register::<KeepAlivePacket>(CLIENTBOUND_KEEP_ALIVE)?
        .register::<ChunkDataPacket>(CHUNK_DATA)?
        .register::<UpdateLightPacket>(UPDATE_LIGHT)?
        .register::<SetEntityMetadataPacket>(SET_ENTITY_METADATA)?
        .register::<SetSlotPacket>(SET_SLOT)?
        .register::<PlayerPositionPacket>(PLAYER_POSITION)?;

    let mut serverbound = PacketRegistryBuilder::new(Direction::Serverbound).fallback(fallback);
    serverbound.register::<KeepAlivePacket>(SERVERBOUND_KEEP_ALIVE)?;

    Ok(StateRegistry::new(
        ConnectionState::Play,
        clientbound.build(),
        serverbound.build(),
    ))
}
