use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use glider_common::config::DEFAULT_MAX_STRING_CHARS;
use glider_common::{BlockPos, ProtocolError, ProtocolVersion, Result};
use glider_nbt::{NbtFile, Tag, DEFAULT_MAX_DEPTH};
use std::io::{self, Read, Write};

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// Number of bytes `value` takes as a VarInt.
pub fn varint_size(value: i32) -> usize {
    let value = value as u32;
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}

/// How a version frames an NBT blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NbtFormat {
    /// 1.7: i16 byte length (-1 when absent) followed by a gzip'd named compound.
    LegacyGzip,
    /// 1.8 to 1.20.1: named root; a lone `TAG_End` means absent.
    Named,
    /// 1.20.2 onwards: root with no name; a lone `TAG_End` means absent.
    Nameless,
}

impl NbtFormat {
    pub fn for_version(version: ProtocolVersion) -> Self {
        if version < ProtocolVersion::V1_8 {
            NbtFormat::LegacyGzip
        } else if version < ProtocolVersion::V1_20_2 {
            NbtFormat::Named
        } else {
            NbtFormat::Nameless
        }
    }
}

/// Packet buffer. Holds the bytes of one packet body and a read cursor.
///
/// Writes always append; reads advance the cursor and never go past the end of the buffer.
#[derive(Debug, Default, Clone)]
pub struct PacketBuffer {
    pub buffer: Vec<u8>,
    cursor: usize,
    depth: usize,
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Creates a buffer positioned at the start of `bytes`.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            buffer: bytes,
            ..Self::default()
        }
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.buffer.get(self.cursor).copied()
    }

    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor, clamped to the buffer length.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.buffer.len());
    }

    pub fn advance_cursor(&mut self, amount: usize) {
        self.set_cursor(self.cursor + amount);
    }

    pub fn get_buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    /// Increments the nesting depth used by recursive codecs.
    pub fn enter_nested(&mut self, max_depth: usize) -> Result<()> {
        if self.depth >= max_depth {
            return Err(ProtocolError::invalid(format!(
                "values nested deeper than {}",
                max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn exit_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn take(&mut self, length: usize, what: &'static str) -> Result<&[u8]> {
        if self.remaining() < length {
            return Err(ProtocolError::UnexpectedEof(what));
        }
        let start = self.cursor;
        self.cursor += length;
        Ok(&self.buffer[start..start + length])
    }

    /// Writes a VarInt: 7 bits per byte, least significant group first, high bit set on every
    /// byte but the last.
    pub fn write_varint(&mut self, value: i32) {
        let mut value = value as u32;
        while value & !(SEGMENT_BITS as u32) != 0 {
            self.buffer.push(((value & SEGMENT_BITS as u32) as u8) | CONTINUE_BIT);
            value >>= 7;
        }
        self.buffer.push(value as u8);
    }

    /// Reads a VarInt. More than five groups is a framing error.
    pub fn read_varint(&mut self) -> Result<i32> {
        let mut result: u32 = 0;
        for group in 0..5 {
            let byte = self.read_u8_as("VarInt")?;
            result |= ((byte & SEGMENT_BITS) as u32) << (7 * group);
            if byte & CONTINUE_BIT == 0 {
                return Ok(result as i32);
            }
        }
        Err(ProtocolError::VarIntTooLong)
    }

    pub fn write_varlong(&mut self, value: i64) {
        let mut value = value as u64;
        while value & !(SEGMENT_BITS as u64) != 0 {
            self.buffer.push(((value & SEGMENT_BITS as u64) as u8) | CONTINUE_BIT);
            value >>= 7;
        }
        self.buffer.push(value as u8);
    }

    /// Reads a VarLong. More than ten groups is a framing error.
    pub fn read_varlong(&mut self) -> Result<i64> {
        let mut result: u64 = 0;
        for group in 0..10 {
            let byte = self.read_u8_as("VarLong")?;
            result |= ((byte & SEGMENT_BITS) as u64) << (7 * group);
            if byte & CONTINUE_BIT == 0 {
                return Ok(result as i64);
            }
        }
        Err(ProtocolError::VarLongTooLong)
    }

    /// Reads a VarInt length prefix and checks it against `max`.
    pub fn read_length(&mut self, max: usize) -> Result<usize> {
        let count = self.read_varint()?;
        if count < 0 {
            return Err(ProtocolError::NegativeLength(count as i64));
        }
        let count = count as usize;
        if count > max {
            return Err(ProtocolError::CollectionTooLarge {
                count: count as i64,
                max,
            });
        }
        Ok(count)
    }

    /// Writes a VarInt length prefix, refusing lengths above `max`.
    pub fn write_length(&mut self, length: usize, max: usize) -> Result<()> {
        if length > max || length > i32::MAX as usize {
            return Err(ProtocolError::CollectionTooLarge {
                count: length as i64,
                max,
            });
        }
        self.write_varint(length as i32);
        Ok(())
    }

    fn read_u8_as(&mut self, what: &'static str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(value as u8);
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8_as("bool")? != 0)
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_u8_as("u8")
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buffer.push(value as u8);
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8_as("i8")? as i8)
    }

    // Write an u16 in network (big-endian) order.
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    // Read an u16 in network (big-endian) order.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2, "u16")?))
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(BigEndian::read_i16(self.take(2, "i16")?))
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4, "i32")?))
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(self.take(8, "i64")?))
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.take(4, "f32")?))
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.take(8, "f64")?))
    }

    pub fn write_bytes_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>> {
        Ok(self.take(length, "byte array")?.to_vec())
    }

    /// Everything from the cursor to the end of the buffer.
    pub fn read_remaining(&mut self) -> Bytes {
        let rest = Bytes::copy_from_slice(&self.buffer[self.cursor..]);
        self.cursor = self.buffer.len();
        rest
    }

    /// VarInt-prefixed byte array.
    pub fn write_byte_array(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_length(bytes.len(), i32::MAX as usize)?;
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    pub fn read_byte_array(&mut self, max: usize) -> Result<Vec<u8>> {
        let length = self.read_length(max)?;
        self.read_bytes(length)
    }

    /// Writes a string with the default character bound.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_string_bounded(value, DEFAULT_MAX_STRING_CHARS)
    }

    /// VarInt byte length then UTF-8. Fails when the string has more than `max_chars`
    /// characters or more than `max_chars * 3` bytes.
    pub fn write_string_bounded(&mut self, value: &str, max_chars: usize) -> Result<()> {
        let max_bytes = max_chars.saturating_mul(3);
        if value.len() > max_bytes {
            return Err(ProtocolError::StringTooLong {
                length: value.len(),
                max: max_bytes,
                unit: "bytes",
            });
        }
        let chars = utf16_len(value);
        if chars > max_chars {
            return Err(ProtocolError::StringTooLong {
                length: chars,
                max: max_chars,
                unit: "characters",
            });
        }
        self.write_byte_array(value.as_bytes())
    }

    pub fn read_string(&mut self) -> Result<String> {
        self.read_string_bounded(DEFAULT_MAX_STRING_CHARS)
    }

    pub fn read_string_bounded(&mut self, max_chars: usize) -> Result<String> {
        let max_bytes = max_chars.saturating_mul(3);
        let length = self.read_varint()?;
        if length < 0 {
            return Err(ProtocolError::NegativeLength(length as i64));
        }
        let length = length as usize;
        if length > max_bytes {
            return Err(ProtocolError::StringTooLong {
                length,
                max: max_bytes,
                unit: "bytes",
            });
        }
        let bytes = self.take(length, "string")?;
        let value = std::str::from_utf8(bytes)
            .map_err(|_| ProtocolError::invalid("Failed to convert bytes to UTF-8 string"))?
            .to_owned();
        let chars = utf16_len(&value);
        if chars > max_chars {
            return Err(ProtocolError::StringTooLong {
                length: chars,
                max: max_chars,
                unit: "characters",
            });
        }
        Ok(value)
    }

    /// Writes a UUID as two big-endian longs.
    pub fn write_uuid(&mut self, value: uuid::Uuid) {
        self.buffer.extend_from_slice(value.as_bytes());
    }

    pub fn read_uuid(&mut self) -> Result<uuid::Uuid> {
        let bytes = self.take(16, "UUID")?;
        uuid::Uuid::from_slice(bytes).map_err(|e| ProtocolError::invalid(e.to_string()))
    }

    /// Writes a block position in the layout `version` expects.
    pub fn write_position(&mut self, pos: BlockPos, version: ProtocolVersion) {
        if version < ProtocolVersion::V1_8 {
            self.write_i32(pos.x);
            self.write_i32(pos.y);
            self.write_i32(pos.z);
            return;
        }
        let x = (pos.x as i64 & 0x3FF_FFFF) << 38;
        let y = pos.y as i64 & 0xFFF;
        let z = pos.z as i64 & 0x3FF_FFFF;
        let packed = if version < ProtocolVersion::V1_14 {
            x | (y << 26) | z
        } else {
            x | (z << 12) | y
        };
        self.write_i64(packed);
    }

    pub fn read_position(&mut self, version: ProtocolVersion) -> Result<BlockPos> {
        if version < ProtocolVersion::V1_8 {
            let x = self.read_i32()?;
            let y = self.read_i32()?;
            let z = self.read_i32()?;
            return Ok(BlockPos::new(x, y, z));
        }
        let packed = self.read_i64()?;
        let x = (packed >> 38) as i32;
        let (y, z) = if version < ProtocolVersion::V1_14 {
            (((packed << 26) >> 52) as i32, ((packed << 38) >> 38) as i32)
        } else {
            (((packed << 52) >> 52) as i32, ((packed << 26) >> 38) as i32)
        };
        Ok(BlockPos::new(x, y, z))
    }

    /// VarInt long count followed by the longs.
    pub fn write_bitset(&mut self, longs: &[u64]) -> Result<()> {
        self.write_length(longs.len(), i32::MAX as usize)?;
        for &long in longs {
            self.write_i64(long as i64);
        }
        Ok(())
    }

    pub fn read_bitset(&mut self, max_longs: usize) -> Result<Vec<u64>> {
        let count = self.read_length(max_longs)?;
        let mut longs = Vec::with_capacity(count);
        for _ in 0..count {
            longs.push(self.read_i64()? as u64);
        }
        Ok(longs)
    }

    /// Writes an optional NBT blob in the format of `version`.
    pub fn write_nbt(&mut self, tag: Option<&Tag>, version: ProtocolVersion) -> Result<()> {
        match (NbtFormat::for_version(version), tag) {
            (NbtFormat::LegacyGzip, None) => self.write_i16(-1),
            (NbtFormat::LegacyGzip, Some(tag)) => {
                let mut compressed = Vec::new();
                let file = NbtFile::new(String::new(), tag.clone());
                let mut encoder = GzEncoder::new(&mut compressed, Compression::default());
                file.write(&mut encoder).map_err(ProtocolError::Nbt)?;
                encoder.finish().map_err(ProtocolError::Nbt)?;
                let length = i16::try_from(compressed.len()).map_err(|_| {
                    ProtocolError::invalid(format!(
                        "compressed NBT of {} bytes does not fit a short length",
                        compressed.len()
                    ))
                })?;
                self.write_i16(length);
                self.write_bytes_raw(&compressed);
            }
            (_, None) | (_, Some(Tag::End)) => self.write_u8(0),
            (NbtFormat::Named, Some(tag)) => tag.write(self, "").map_err(ProtocolError::Nbt)?,
            (NbtFormat::Nameless, Some(tag)) => {
                tag.write_nameless(self).map_err(ProtocolError::Nbt)?
            }
        }
        Ok(())
    }

    /// Reads an optional NBT blob in the format of `version`. `None` means the absent marker.
    pub fn read_nbt(&mut self, version: ProtocolVersion) -> Result<Option<Tag>> {
        match NbtFormat::for_version(version) {
            NbtFormat::LegacyGzip => {
                let length = self.read_i16()?;
                if length < 0 {
                    return Ok(None);
                }
                let compressed = self.take(length as usize, "gzip NBT")?;
                let file = NbtFile::read(&mut GzDecoder::new(compressed)).map_err(nbt_error)?;
                Ok(Some(file.root))
            }
            NbtFormat::Named => {
                if self.peek_byte() == Some(0) {
                    self.cursor += 1;
                    return Ok(None);
                }
                let (_, tag) = Tag::read_with_depth(self, DEFAULT_MAX_DEPTH).map_err(nbt_error)?;
                Ok(Some(tag))
            }
            NbtFormat::Nameless => match Tag::read_nameless(self, DEFAULT_MAX_DEPTH)
                .map_err(nbt_error)?
            {
                Tag::End => Ok(None),
                tag => Ok(Some(tag)),
            },
        }
    }
}

fn nbt_error(err: io::Error) -> ProtocolError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ProtocolError::UnexpectedEof("NBT")
    } else {
        ProtocolError::Nbt(err)
    }
}

/// Length in UTF-16 code units, which is what the game counts.
fn utf16_len(value: &str) -> usize {
    value.chars().map(char::len_utf16).sum()
}

impl Read for PacketBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let to_read = buf.len().min(self.remaining());
        buf[..to_read].copy_from_slice(&self.buffer[self.cursor..self.cursor + to_read]);
        self.cursor += to_read;
        Ok(to_read)
    }
}

impl Write for PacketBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes `value` as a VarInt into any writer. Used where sizes are computed before a buffer
/// exists.
pub fn write_varint_to<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    let mut value = value as u32;
    while value & !(SEGMENT_BITS as u32) != 0 {
        writer.write_u8(((value & SEGMENT_BITS as u32) as u8) | CONTINUE_BIT)?;
        value >>= 7;
    }
    writer.write_u8(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use uuid::Uuid;

    fn reader(buffer: PacketBuffer) -> PacketBuffer {
        PacketBuffer::from_bytes(buffer.buffer)
    }

    #[test]
    fn test_peek_byte() {
        let buffer = PacketBuffer::from_bytes(vec![1, 2, 3]);
        assert_eq!(buffer.peek_byte(), Some(1));
        assert_eq!(PacketBuffer::new().peek_byte(), None);
    }

    #[test]
    fn test_varint() {
        let test_cases = vec![0, 1, 127, 128, 255, 25565, 2147483647, -1, -2147483648];

        for value in test_cases {
            let mut buffer = PacketBuffer::new();
            buffer.write_varint(value);
            assert_eq!(buffer.len(), varint_size(value));

            let mut read_buffer = reader(buffer);
            assert_eq!(read_buffer.read_varint().unwrap(), value);
            assert_eq!(read_buffer.remaining(), 0);
        }
    }

    #[test]
    fn test_varint_known_bytes() {
        let mut buffer = PacketBuffer::new();
        buffer.write_varint(128);
        assert_eq!(buffer.buffer, vec![0x80, 0x01]);

        let mut buffer = PacketBuffer::new();
        buffer.write_varint(-1);
        assert_eq!(buffer.buffer, vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_varint_error_handling() {
        let mut buffer = PacketBuffer::from_bytes(vec![0xFF; 6]);
        assert_matches!(buffer.read_varint(), Err(ProtocolError::VarIntTooLong));

        let mut buffer = PacketBuffer::from_bytes(vec![0x80]);
        assert_matches!(buffer.read_varint(), Err(ProtocolError::UnexpectedEof(_)));
    }

    #[test]
    fn test_varlong() {
        for value in [0i64, 127, 128, i32::MAX as i64, i64::MAX, -1, i64::MIN] {
            let mut buffer = PacketBuffer::new();
            buffer.write_varlong(value);
            assert!(buffer.len() <= 10);
            assert_eq!(reader(buffer).read_varlong().unwrap(), value);
        }

        let mut buffer = PacketBuffer::from_bytes(vec![0xFF; 11]);
        assert_matches!(buffer.read_varlong(), Err(ProtocolError::VarLongTooLong));
    }

    #[test]
    fn test_string() {
        for string in ["", "Hello", "Hello, World!", "🦀", "こんにちは"] {
            let mut buffer = PacketBuffer::new();
            buffer.write_string(string).unwrap();
            assert_eq!(reader(buffer).read_string().unwrap(), string);
        }
    }

    #[test]
    fn test_string_bounds() {
        let mut buffer = PacketBuffer::new();
        assert_matches!(
            buffer.write_string_bounded("abcdef", 5),
            Err(ProtocolError::StringTooLong { unit: "characters", .. })
        );
        assert!(buffer.is_empty());

        let mut buffer = PacketBuffer::new();
        buffer.write_string("abcdef").unwrap();
        assert_matches!(
            reader(buffer).read_string_bounded(5),
            Err(ProtocolError::StringTooLong { .. })
        );

        // Declared byte length above the bound is rejected before reading the payload.
        let mut buffer = PacketBuffer::new();
        buffer.write_varint(100);
        assert_matches!(
            buffer.read_string_bounded(4),
            Err(ProtocolError::StringTooLong { unit: "bytes", .. })
        );
    }

    #[test]
    fn test_string_error_handling() {
        let mut buffer = PacketBuffer::new();
        buffer.write_varint(1);
        buffer.buffer.push(0xFF);
        assert_matches!(buffer.read_string(), Err(ProtocolError::InvalidData(_)));

        let mut buffer = PacketBuffer::new();
        buffer.write_varint(100);
        buffer.buffer.push(0x41);
        assert_matches!(buffer.read_string(), Err(ProtocolError::UnexpectedEof(_)));
    }

    #[test]
    fn test_uuid() {
        let uuid = Uuid::new_v3(&Uuid::NAMESPACE_DNS, "wow".as_ref());
        let mut buffer = PacketBuffer::new();
        buffer.write_uuid(uuid);
        assert_eq!(reader(buffer).read_uuid().unwrap(), uuid);

        let mut short = PacketBuffer::from_bytes(vec![0; 8]);
        assert!(short.read_uuid().is_err());
    }

    #[test]
    fn test_fixed_width() {
        let mut buffer = PacketBuffer::new();
        buffer.write_u16(65535);
        buffer.write_i16(-2);
        buffer.write_i32(-70000);
        buffer.write_i64(i64::MIN);
        buffer.write_f32(1.5);
        buffer.write_f64(-0.25);

        let mut read = reader(buffer);
        assert_eq!(read.read_u16().unwrap(), 65535);
        assert_eq!(read.read_i16().unwrap(), -2);
        assert_eq!(read.read_i32().unwrap(), -70000);
        assert_eq!(read.read_i64().unwrap(), i64::MIN);
        assert_eq!(read.read_f32().unwrap(), 1.5);
        assert_eq!(read.read_f64().unwrap(), -0.25);
        assert_matches!(read.read_u16(), Err(ProtocolError::UnexpectedEof("u16")));
    }

    #[test]
    fn test_position_layouts() {
        let pos = BlockPos::new(-18357644, -831, 33554431);
        for version in [
            ProtocolVersion::V1_7_2,
            ProtocolVersion::V1_8,
            ProtocolVersion::V1_13_2,
            ProtocolVersion::V1_14,
            ProtocolVersion::V1_21_5,
        ] {
            let mut buffer = PacketBuffer::new();
            buffer.write_position(pos, version);
            assert_eq!(reader(buffer).read_position(version).unwrap(), pos);
        }
    }

    #[test]
    fn test_position_bit_order() {
        let pos = BlockPos::new(1, 2, 3);

        let mut old = PacketBuffer::new();
        old.write_position(pos, ProtocolVersion::V1_12_2);
        assert_eq!(reader(old).read_i64().unwrap(), (1 << 38) | (2 << 26) | 3);

        let mut new = PacketBuffer::new();
        new.write_position(pos, ProtocolVersion::V1_14);
        assert_eq!(reader(new).read_i64().unwrap(), (1 << 38) | (3 << 12) | 2);
    }

    fn sample_nbt() -> Tag {
        let mut compound = glider_nbt::Compound::new();
        compound.insert("Damage".into(), Tag::Short(3));
        Tag::Compound(compound)
    }

    #[test]
    fn test_nbt_formats() {
        for version in [
            ProtocolVersion::V1_7_6,
            ProtocolVersion::V1_12_2,
            ProtocolVersion::V1_20_2,
        ] {
            let mut buffer = PacketBuffer::new();
            buffer.write_nbt(Some(&sample_nbt()), version).unwrap();
            buffer.write_nbt(None, version).unwrap();

            let mut read = reader(buffer);
            assert_eq!(read.read_nbt(version).unwrap(), Some(sample_nbt()));
            assert_eq!(read.read_nbt(version).unwrap(), None);
            assert_eq!(read.remaining(), 0);
        }
    }

    #[test]
    fn test_nbt_absent_markers() {
        let mut buffer = PacketBuffer::new();
        buffer.write_nbt(None, ProtocolVersion::V1_7_2).unwrap();
        assert_eq!(buffer.buffer, vec![0xFF, 0xFF]);

        let mut buffer = PacketBuffer::new();
        buffer.write_nbt(None, ProtocolVersion::V1_16).unwrap();
        assert_eq!(buffer.buffer, vec![0x00]);
    }

    #[test]
    fn test_nameless_nbt_has_no_root_name() {
        let mut named = PacketBuffer::new();
        named.write_nbt(Some(&sample_nbt()), ProtocolVersion::V1_20).unwrap();
        let mut nameless = PacketBuffer::new();
        nameless
            .write_nbt(Some(&sample_nbt()), ProtocolVersion::V1_20_2)
            .unwrap();
        assert_eq!(named.len(), nameless.len() + 2);
    }

    #[test]
    fn test_truncated_nbt_is_eof() {
        let mut buffer = PacketBuffer::new();
        buffer
            .write_nbt(Some(&sample_nbt()), ProtocolVersion::V1_16)
            .unwrap();
        buffer.buffer.truncate(buffer.len() - 2);
        assert_matches!(
            reader(buffer).read_nbt(ProtocolVersion::V1_16),
            Err(ProtocolError::UnexpectedEof("NBT"))
        );
    }

    #[test]
    fn test_bitset() {
        let mut buffer = PacketBuffer::new();
        buffer.write_bitset(&[0b101, u64::MAX]).unwrap();
        let mut read = reader(buffer);
        assert_eq!(read.read_bitset(4).unwrap(), vec![0b101, u64::MAX]);

        let mut buffer = PacketBuffer::new();
        buffer.write_bitset(&[1, 2, 3]).unwrap();
        assert_matches!(
            reader(buffer).read_bitset(2),
            Err(ProtocolError::CollectionTooLarge { count: 3, max: 2 })
        );
    }

    #[test]
    fn test_length_prefix_refuses_oversize() {
        let mut buffer = PacketBuffer::new();
        assert_matches!(
            buffer.write_length(i32::MAX as usize + 1, usize::MAX),
            Err(ProtocolError::CollectionTooLarge { .. })
        );
        assert_matches!(
            buffer.write_length(5, 4),
            Err(ProtocolError::CollectionTooLarge { count: 5, max: 4 })
        );
        assert!(buffer.is_empty());

        buffer.write_byte_array(&[7, 8]).unwrap();
        assert_eq!(reader(buffer).read_byte_array(2).unwrap(), vec![7, 8]);
    }

    #[test]
    fn test_read_remaining() {
        let mut buffer = PacketBuffer::from_bytes(vec![1, 2, 3, 4]);
        buffer.read_u8().unwrap();
        assert_eq!(&buffer.read_remaining()[..], &[2, 3, 4]);
        assert_eq!(buffer.remaining(), 0);
    }
}
