//! Stateless codecs for the scalar wire types. Each one forwards to the matching
//! [`PacketBuffer`] method.

use super::Codec;
use crate::buffer::PacketBuffer;
use glider_common::config::DEFAULT_MAX_STRING_CHARS;
use glider_common::{BlockPos, ProtocolError, ProtocolVersion, Result};
use glider_nbt::Tag;

macro_rules! scalar_codec {
    ($(#[$doc:meta])* $name:ident, $constant:ident, $ty:ty, $read:ident, $write:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        pub const $constant: $name = $name;

        impl Codec<$ty> for $name {
            fn decode(&self, buf: &mut PacketBuffer, _version: ProtocolVersion) -> Result<$ty> {
                buf.$read()
            }

            fn encode(
                &self,
                value: &$ty,
                buf: &mut PacketBuffer,
                _version: ProtocolVersion,
            ) -> Result<()> {
                buf.$write(*value);
                Ok(())
            }
        }
    };
}

scalar_codec!(
    /// 7-bit groups, at most five.
    VarIntCodec, VAR_INT, i32, read_varint, write_varint
);
scalar_codec!(
    /// 7-bit groups, at most ten.
    VarLongCodec, VAR_LONG, i64, read_varlong, write_varlong
);
scalar_codec!(BoolCodec, BOOL, bool, read_bool, write_bool);
scalar_codec!(U8Codec, U8, u8, read_u8, write_u8);
scalar_codec!(I8Codec, I8, i8, read_i8, write_i8);
scalar_codec!(U16Codec, U16, u16, read_u16, write_u16);
scalar_codec!(I16Codec, I16, i16, read_i16, write_i16);
scalar_codec!(I32Codec, I32, i32, read_i32, write_i32);
scalar_codec!(I64Codec, I64, i64, read_i64, write_i64);
scalar_codec!(F32Codec, F32, f32, read_f32, write_f32);
scalar_codec!(F64Codec, F64, f64, read_f64, write_f64);
scalar_codec!(UuidCodec, UUID, uuid::Uuid, read_uuid, write_uuid);

/// Length-prefixed UTF-8 string with a character bound.
#[derive(Debug, Clone, Copy)]
pub struct StringCodec {
    pub max_chars: usize,
}

pub const STRING: StringCodec = StringCodec::bounded(DEFAULT_MAX_STRING_CHARS);

/// Namespaced identifiers such as `minecraft:stone`.
pub const IDENTIFIER: StringCodec = StringCodec::bounded(32_767);

impl StringCodec {
    pub const fn bounded(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Codec<String> for StringCodec {
    fn decode(&self, buf: &mut PacketBuffer, _version: ProtocolVersion) -> Result<String> {
        buf.read_string_bounded(self.max_chars)
    }

    fn encode(&self, value: &String, buf: &mut PacketBuffer, _version: ProtocolVersion) -> Result<()> {
        buf.write_string_bounded(value, self.max_chars)
    }
}

/// VarInt-prefixed raw bytes.
#[derive(Debug, Clone, Copy)]
pub struct ByteArrayCodec {
    pub max: usize,
}

impl Codec<Vec<u8>> for ByteArrayCodec {
    fn decode(&self, buf: &mut PacketBuffer, _version: ProtocolVersion) -> Result<Vec<u8>> {
        buf.read_byte_array(self.max)
    }

    fn encode(&self, value: &Vec<u8>, buf: &mut PacketBuffer, _version: ProtocolVersion) -> Result<()> {
        if value.len() > self.max {
            return Err(ProtocolError::CollectionTooLarge {
                count: value.len() as i64,
                max: self.max,
            });
        }
        buf.write_byte_array(value)
    }
}

/// Block position, packed according to the version.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionCodec;

pub const POSITION: PositionCodec = PositionCodec;

impl Codec<BlockPos> for PositionCodec {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<BlockPos> {
        buf.read_position(version)
    }

    fn encode(&self, value: &BlockPos, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        buf.write_position(*value, version);
        Ok(())
    }
}

/// Optional NBT blob; `None` is the version's absent marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct NbtCodec;

pub const NBT: NbtCodec = NbtCodec;

impl Codec<Option<Tag>> for NbtCodec {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<Option<Tag>> {
        buf.read_nbt(version)
    }

    fn encode(&self, value: &Option<Tag>, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        buf.write_nbt(value.as_ref(), version)
    }
}

/// NBT blob that must be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredNbtCodec;

pub const REQUIRED_NBT: RequiredNbtCodec = RequiredNbtCodec;

impl Codec<Tag> for RequiredNbtCodec {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<Tag> {
        buf.read_nbt(version)?
            .ok_or_else(|| ProtocolError::invalid("expected an NBT tag, found the absent marker"))
    }

    fn encode(&self, value: &Tag, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        buf.write_nbt(Some(value), version)
    }
}

/// VarInt-counted long array, the network form of a `BitSet`.
#[derive(Debug, Clone, Copy)]
pub struct BitSetCodec {
    pub max_longs: usize,
}

impl Codec<Vec<u64>> for BitSetCodec {
    fn decode(&self, buf: &mut PacketBuffer, _version: ProtocolVersion) -> Result<Vec<u64>> {
        buf.read_bitset(self.max_longs)
    }

    fn encode(&self, value: &Vec<u64>, buf: &mut PacketBuffer, _version: ProtocolVersion) -> Result<()> {
        buf.write_length(value.len(), self.max_longs)?;
        for &long in value {
            buf.write_i64(long as i64);
        }
        Ok(())
    }
}
