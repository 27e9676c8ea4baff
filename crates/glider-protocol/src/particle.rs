//! Particles as carried by entity metadata (1.13+): VarInt type id, then a payload whose shape
//! depends on the type.

use crate::buffer::PacketBuffer;
use crate::codec::Codec;
use crate::item::{slot, ItemStack};
use glider_common::{ProtocolError, ProtocolVersion, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleColor {
    /// Float components in 0..=1, used until 1.21.2.
    Rgb([f32; 3]),
    /// `0xRRGGBB`, used from 1.21.2.
    Packed(i32),
}

impl ParticleColor {
    pub fn to_rgb(self) -> [f32; 3] {
        match self {
            ParticleColor::Rgb(rgb) => rgb,
            ParticleColor::Packed(packed) => [
                ((packed >> 16) & 0xFF) as f32 / 255.0,
                ((packed >> 8) & 0xFF) as f32 / 255.0,
                (packed & 0xFF) as f32 / 255.0,
            ],
        }
    }

    pub fn to_packed(self) -> i32 {
        match self {
            ParticleColor::Packed(packed) => packed,
            ParticleColor::Rgb(rgb) => {
                let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as i32;
                (channel(rgb[0]) << 16) | (channel(rgb[1]) << 8) | channel(rgb[2])
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParticleData {
    None,
    Block(i32),
    Dust {
        color: ParticleColor,
        scale: f32,
    },
    DustColorTransition {
        from: ParticleColor,
        to: ParticleColor,
        scale: f32,
    },
    Item(Option<ItemStack>),
    SculkCharge(f32),
    Shriek(i32),
    EntityEffect(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: i32,
    pub data: ParticleData,
}

impl Particle {
    pub fn simple(id: i32) -> Self {
        Self {
            id,
            data: ParticleData::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Block,
    Dust,
    DustColorTransition,
    Item,
    SculkCharge,
    Shriek,
    EntityEffect,
    /// Has a payload we do not decode (vibration, trail).
    Opaque,
}

use Shape::*;

/// Particle types with a payload, per first version of each registry layout.
const ERAS: &[(ProtocolVersion, &[(i32, Shape)])] = &[
    (ProtocolVersion::V1_13, &[(3, Block), (11, Dust), (20, Block), (27, Item)]),
    (ProtocolVersion::V1_14, &[(3, Block), (14, Dust), (23, Block), (32, Item)]),
    (ProtocolVersion::V1_16, &[(3, Block), (14, Dust), (23, Block), (34, Item)]),
    (
        ProtocolVersion::V1_17,
        &[(4, Block), (15, Dust), (16, DustColorTransition), (25, Block), (36, Item), (37, Opaque)],
    ),
    (
        ProtocolVersion::V1_18,
        &[(2, Block), (3, Block), (14, Dust), (15, DustColorTransition), (24, Block), (35, Item), (36, Opaque)],
    ),
    (
        ProtocolVersion::V1_19,
        &[
            (2, Block), (3, Block), (14, Dust), (15, DustColorTransition), (25, Block),
            (30, SculkCharge), (39, Item), (40, Opaque), (97, Shriek),
        ],
    ),
    (
        ProtocolVersion::V1_19_4,
        &[
            (2, Block), (3, Block), (14, Dust), (15, DustColorTransition), (25, Block),
            (30, SculkCharge), (41, Item), (42, Opaque), (99, Shriek),
        ],
    ),
    (
        ProtocolVersion::V1_20_5,
        &[
            (1, Block), (2, Block), (13, Dust), (14, DustColorTransition), (20, EntityEffect),
            (27, Block), (28, Block), (36, SculkCharge), (44, Item), (45, Opaque), (101, Shriek),
        ],
    ),
    (
        ProtocolVersion::V1_21_2,
        &[
            (1, Block), (2, Block), (13, Dust), (14, DustColorTransition), (20, EntityEffect),
            (28, Block), (29, Block), (37, SculkCharge), (46, Item), (47, Opaque), (48, Opaque),
            (104, Shriek), (109, Block),
        ],
    ),
];

fn shape(id: i32, version: ProtocolVersion) -> Result<Option<Shape>> {
    let era = ERAS
        .iter()
        .rev()
        .find(|(from, _)| *from <= version)
        .ok_or_else(|| ProtocolError::UnsupportedValue {
            domain: "particle",
            kind: format!("particle {}", id),
            version,
        })?;
    Ok(era.1.iter().find(|(known, _)| *known == id).map(|(_, s)| *s))
}

fn packed_colors(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_21_2
}

fn read_color(buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<ParticleColor> {
    if packed_colors(version) {
        return Ok(ParticleColor::Packed(buf.read_i32()?));
    }
    Ok(ParticleColor::Rgb([buf.read_f32()?, buf.read_f32()?, buf.read_f32()?]))
}

fn write_color(color: ParticleColor, buf: &mut PacketBuffer, version: ProtocolVersion) {
    if packed_colors(version) {
        buf.write_i32(color.to_packed());
    } else {
        for channel in color.to_rgb() {
            buf.write_f32(channel);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParticleCodec;

pub const PARTICLE: ParticleCodec = ParticleCodec;

impl Codec<Particle> for ParticleCodec {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<Particle> {
        let id = buf.read_varint()?;
        let data = match shape(id, version)? {
            None => ParticleData::None,
            Some(Block) => ParticleData::Block(buf.read_varint()?),
            Some(Dust) => {
                let color = read_color(buf, version)?;
                ParticleData::Dust {
                    color,
                    scale: buf.read_f32()?,
                }
            }
            Some(DustColorTransition) if packed_colors(version) => {
                let from = read_color(buf, version)?;
                let to = read_color(buf, version)?;
                ParticleData::DustColorTransition {
                    from,
                    to,
                    scale: buf.read_f32()?,
                }
            }
            Some(DustColorTransition) => {
                let from = read_color(buf, version)?;
                let scale = buf.read_f32()?;
                let to = read_color(buf, version)?;
                ParticleData::DustColorTransition { from, to, scale }
            }
            Some(Item) => ParticleData::Item(slot().decode(buf, version)?),
            Some(SculkCharge) => ParticleData::SculkCharge(buf.read_f32()?),
            Some(Shriek) => ParticleData::Shriek(buf.read_varint()?),
            Some(EntityEffect) => ParticleData::EntityEffect(buf.read_i32()?),
            Some(Opaque) => {
                return Err(ProtocolError::UnknownVariant {
                    domain: "particle",
                    tag: id,
                    version,
                })
            }
        };
        Ok(Particle { id, data })
    }

    fn encode(&self, value: &Particle, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        let expected = shape(value.id, version)?;
        let mismatch = || ProtocolError::UnsupportedValue {
            domain: "particle",
            kind: format!("{} with {:?}", value.id, value.data),
            version,
        };
        buf.write_varint(value.id);
        match (&value.data, expected) {
            (ParticleData::None, None) => {}
            (ParticleData::Block(state), Some(Block)) => buf.write_varint(*state),
            (ParticleData::Dust { color, scale }, Some(Dust)) => {
                write_color(*color, buf, version);
                buf.write_f32(*scale);
            }
            (ParticleData::DustColorTransition { from, to, scale }, Some(DustColorTransition)) => {
                write_color(*from, buf, version);
                if packed_colors(version) {
                    write_color(*to, buf, version);
                    buf.write_f32(*scale);
                } else {
                    buf.write_f32(*scale);
                    write_color(*to, buf, version);
                }
            }
            (ParticleData::Item(item), Some(Item)) => slot().encode(item, buf, version)?,
            (ParticleData::SculkCharge(roll), Some(SculkCharge)) => buf.write_f32(*roll),
            (ParticleData::Shriek(delay), Some(Shriek)) => buf.write_varint(*delay),
            (ParticleData::EntityEffect(color), Some(EntityEffect)) => buf.write_i32(*color),
            _ => return Err(mismatch()),
        }
        Ok(())
    }
}
