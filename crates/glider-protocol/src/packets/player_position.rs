use crate::buffer::PacketBuffer;
use crate::codec::primitives::{BOOL, F32, F64, I32, I8, VAR_INT};
use crate::codec::{composite2, composite3, composite5, composite6, gate, versioned, BoxedCodec, Codec, CodecExt};
use crate::packet::Packet;
use glider_common::{ProtocolVersion, Result, Rotation, Vec3, VersionPredicate};
use once_cell::sync::Lazy;

/// Bits of the teleport flags marking a field as relative to the current value.
pub struct RelativeFlags;

impl RelativeFlags {
    pub const X: i32 = 0x01;
    pub const Y: i32 = 0x02;
    pub const Z: i32 = 0x04;
    pub const YAW: i32 = 0x08;
    pub const PITCH: i32 = 0x10;
}

/// Teleports the client. Clients confirm with the teleport id from 1.9 on.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPositionPacket {
    /// Target position, or an offset for fields flagged relative.
    pub position: Vec3,
    /// Sent from 1.21.2.
    pub velocity: Vec3,
    /// Yaw and pitch in degrees.
    pub rotation: Rotation,
    /// [`RelativeFlags`] bits, from 1.8.
    pub flags: i32,
    /// Echoed by the client's teleport confirmation, from 1.9.
    pub teleport_id: i32,
    /// Sent from 1.17 until 1.19.4.
    pub dismount_vehicle: bool,
    /// Sent only before 1.8.
    pub on_ground: bool,
}

impl PlayerPositionPacket {
    /// Creates an absolute teleport with no velocity and no relative fields.
    pub fn new(position: Vec3, rotation: Rotation, teleport_id: i32) -> Self {
        Self {
            position,
            velocity: Vec3::default(),
            rotation,
            flags: 0,
            teleport_id,
            dismount_vehicle: false,
            on_ground: false,
        }
    }
}

fn vec3() -> BoxedCodec<Vec3> {
    composite3(
        F64,
        |v: &Vec3| &v.x,
        F64,
        |v: &Vec3| &v.y,
        F64,
        |v: &Vec3| &v.z,
        Vec3::new,
    )
    .boxed()
}

fn rotation() -> BoxedCodec<Rotation> {
    composite2(
        F32,
        |r: &Rotation| &r.yaw,
        F32,
        |r: &Rotation| &r.pitch,
        |yaw, pitch| Rotation { yaw, pitch },
    )
    .boxed()
}

/// Everything before 1.21.2: absolute position and look, fields added one by one.
fn legacy() -> BoxedCodec<PlayerPositionPacket> {
    let flags = I8
        .map(|v: i8| v as i32, |v: &i32| *v as i8)
        .since(ProtocolVersion::V1_8, 0);
    let dismount = gate(
        VersionPredicate::at_least(ProtocolVersion::V1_17),
        BOOL.until(ProtocolVersion::V1_19_4, false),
        false,
    );
    composite6(
        vec3(),
        |p: &PlayerPositionPacket| &p.position,
        rotation(),
        |p: &PlayerPositionPacket| &p.rotation,
        BOOL.until(ProtocolVersion::V1_8, false),
        |p: &PlayerPositionPacket| &p.on_ground,
        flags,
        |p: &PlayerPositionPacket| &p.flags,
        VAR_INT.since(ProtocolVersion::V1_9, 0),
        |p: &PlayerPositionPacket| &p.teleport_id,
        dismount,
        |p: &PlayerPositionPacket| &p.dismount_vehicle,
        |position, rotation, on_ground, flags, teleport_id, dismount_vehicle| PlayerPositionPacket {
            position,
            velocity: Vec3::default(),
            rotation,
            flags,
            teleport_id,
            dismount_vehicle,
            on_ground,
        },
    )
    .boxed()
}

/// 1.21.2 rework: teleport id first, velocity added, flags widened to an int.
fn reworked() -> BoxedCodec<PlayerPositionPacket> {
    composite5(
        VAR_INT,
        |p: &PlayerPositionPacket| &p.teleport_id,
        vec3(),
        |p: &PlayerPositionPacket| &p.position,
        vec3(),
        |p: &PlayerPositionPacket| &p.velocity,
        rotation(),
        |p: &PlayerPositionPacket| &p.rotation,
        I32,
        |p: &PlayerPositionPacket| &p.flags,
        |teleport_id, position, velocity, rotation, flags| PlayerPositionPacket {
            position,
            velocity,
            rotation,
            flags,
            teleport_id,
            dismount_vehicle: false,
            on_ground: false,
        },
    )
    .boxed()
}

static CODEC: Lazy<BoxedCodec<PlayerPositionPacket>> =
    Lazy::new(|| versioned(ProtocolVersion::V1_21_2, legacy(), reworked()).boxed());

impl Packet for PlayerPositionPacket {
    fn read_from_buffer(buffer: &mut PacketBuffer, version: ProtocolVersion) -> Result<Self> {
        CODEC.decode(buffer, version)
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        CODEC.encode(self, buffer, version)
    }
}
