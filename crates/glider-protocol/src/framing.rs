//! Length-prefixed packet framing over a byte stream, with optional zlib transport compression.
//!
//! Uncompressed frame: `VarInt length, VarInt id, body`. Once compression is on:
//! `VarInt length, VarInt data length, zlib(id, body)`, where a data length of 0 marks a
//! payload sent as is because it was below the threshold.

use crate::buffer::{varint_size, PacketBuffer};
use crate::packet::Packet;
use crate::registry::StateRegistry;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use glider_common::config::MAX_UNCOMPRESSED_SIZE;
use glider_common::{CodecConfig, Direction, ProtocolError, ProtocolVersion, Result};
use std::io::{Read, Write};
use std::sync::Arc;
use tokio_util::codec::{Decoder, Encoder};

/// A decoded frame.
#[derive(Debug)]
pub enum Inbound {
    Known(Box<dyn Packet>),
    /// No decoder for this id in the negotiated version. Forwarded opaquely.
    Unknown { id: i32, body: Bytes },
}

/// Frame codec for one side of one connection.
pub struct MinecraftCodec {
    registry: Arc<StateRegistry>,
    inbound: Direction,
    version: ProtocolVersion,
    config: CodecConfig,
    compression: Option<usize>,
}

impl MinecraftCodec {
    /// `inbound` is the direction of packets this side receives; it sends the opposite one.
    pub fn new(
        registry: Arc<StateRegistry>,
        inbound: Direction,
        version: ProtocolVersion,
        config: CodecConfig,
    ) -> Self {
        let compression = config.compression_threshold;
        Self {
            registry,
            inbound,
            version,
            config,
            compression,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn compression(&self) -> Option<usize> {
        self.compression
    }

    /// Switches transport compression on (or off with `None`) for every following frame.
    pub fn set_compression(&mut self, threshold: Option<usize>) {
        tracing::debug!(threshold = ?threshold, "transport compression changed");
        self.compression = threshold;
    }

    fn decompress(&self, mut frame: Bytes) -> Result<Bytes> {
        let data_length = read_varint(&mut frame)?;
        if data_length == 0 {
            return Ok(frame);
        }
        let data_length = usize::try_from(data_length)
            .map_err(|_| ProtocolError::NegativeLength(data_length as i64))?;
        if data_length > MAX_UNCOMPRESSED_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: data_length,
                max: MAX_UNCOMPRESSED_SIZE,
            });
        }

        let mut inflated = Vec::with_capacity(data_length);
        ZlibDecoder::new(frame.as_ref())
            .take(data_length as u64 + 1)
            .read_to_end(&mut inflated)?;
        if inflated.len() != data_length {
            return Err(ProtocolError::invalid(format!(
                "compressed frame declared {} bytes but inflated to {}",
                data_length,
                inflated.len()
            )));
        }
        Ok(Bytes::from(inflated))
    }

    fn write_frame(&self, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
        let frame = match self.compression {
            None => payload.to_vec(),
            Some(threshold) if payload.len() < threshold => {
                let mut frame = Vec::with_capacity(payload.len() + 1);
                frame.push(0);
                frame.extend_from_slice(payload);
                frame
            }
            Some(_) => {
                let mut frame = PacketBuffer::with_capacity(payload.len() / 2 + 5);
                frame.write_varint(payload.len() as i32);
                let mut encoder =
                    ZlibEncoder::new(frame.into_inner(), Compression::new(self.config.compression_level));
                encoder.write_all(payload)?;
                encoder.finish()?
            }
        };

        if frame.len() > self.config.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: frame.len(),
                max: self.config.max_frame_size,
            });
        }
        let mut prefix = PacketBuffer::with_capacity(3);
        prefix.write_varint(frame.len() as i32);
        dst.reserve(prefix.len() + frame.len());
        dst.put_slice(&prefix.buffer);
        dst.put_slice(&frame);
        Ok(())
    }

    fn encode_raw(&self, id: i32, body: &[u8], dst: &mut BytesMut) -> Result<()> {
        let mut payload = PacketBuffer::with_capacity(varint_size(id) + body.len());
        payload.write_varint(id);
        payload.write_bytes_raw(body);
        self.write_frame(&payload.buffer, dst)
    }
}

/// Reads a VarInt off the front of `bytes`.
fn read_varint(bytes: &mut Bytes) -> Result<i32> {
    match peek_varint(bytes, 5)? {
        Some((value, size)) => {
            bytes.advance(size);
            Ok(value)
        }
        None => Err(ProtocolError::UnexpectedEof("VarInt")),
    }
}

/// VarInt at the start of `bytes` and its encoded size, or `None` if more bytes are needed.
fn peek_varint(bytes: &[u8], max_bytes: usize) -> Result<Option<(i32, usize)>> {
    let mut value: i32 = 0;
    for (position, byte) in bytes.iter().enumerate() {
        if position >= max_bytes {
            return Err(ProtocolError::VarIntTooLong);
        }
        value |= ((byte & 0x7F) as i32) << (7 * position);
        if byte & 0x80 == 0 {
            return Ok(Some((value, position + 1)));
        }
    }
    if bytes.len() >= max_bytes {
        return Err(ProtocolError::VarIntTooLong);
    }
    Ok(None)
}

impl Decoder for MinecraftCodec {
    type Item = Inbound;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Inbound>> {
        let (length, header) = match peek_varint(src, 3) {
            Ok(Some(prefix)) => prefix,
            Ok(None) => return Ok(None),
            Err(_) => {
                return Err(ProtocolError::FrameTooLarge {
                    size: src.len(),
                    max: self.config.max_frame_size,
                })
            }
        };
        let length =
            usize::try_from(length).map_err(|_| ProtocolError::NegativeLength(length as i64))?;
        if length > self.config.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: length,
                max: self.config.max_frame_size,
            });
        }
        if src.len() < header + length {
            src.reserve(header + length - src.len());
            return Ok(None);
        }

        src.advance(header);
        let mut frame = src.split_to(length).freeze();
        if self.compression.is_some() {
            frame = self.decompress(frame)?;
        }
        let id = read_varint(&mut frame)?;

        let registry = match self.registry.direction(self.inbound).registry_for(self.version) {
            Some(registry) => registry,
            None => return Ok(Some(Inbound::Unknown { id, body: frame })),
        };
        let mut buffer = PacketBuffer::from_bytes(frame.to_vec());
        match registry.decode(id, &mut buffer, self.version) {
            None => Ok(Some(Inbound::Unknown { id, body: frame })),
            Some(packet) => {
                let packet = packet?;
                if buffer.remaining() > 0 {
                    tracing::warn!(
                        packet = packet.packet_name(),
                        version = %self.version,
                        trailing = buffer.remaining(),
                        "packet left bytes unread"
                    );
                }
                Ok(Some(Inbound::Known(packet)))
            }
        }
    }
}

impl Encoder<Box<dyn Packet>> for MinecraftCodec {
    type Error = ProtocolError;

    fn encode(&mut self, packet: Box<dyn Packet>, dst: &mut BytesMut) -> Result<()> {
        let outbound = self.inbound.opposite();
        let registry = self
            .registry
            .direction(outbound)
            .require(self.version)
            .map_err(|err| ProtocolError::invalid(err.to_string()))?;
        let id = registry.id_of_packet(packet.as_ref()).ok_or_else(|| {
            ProtocolError::invalid(format!(
                "{} has no {:?} id in {}",
                packet.packet_name(),
                outbound,
                self.version
            ))
        })?;

        let mut payload = PacketBuffer::new();
        payload.write_varint(id);
        packet.write_to_buffer(&mut payload, self.version)?;
        tracing::trace!(
            packet = packet.packet_name(),
            id,
            length = payload.len(),
            "encoding packet"
        );
        self.write_frame(&payload.buffer, dst)
    }
}

impl Encoder<Inbound> for MinecraftCodec {
    type Error = ProtocolError;

    /// Forwards a decoded frame, re-encoding known packets and copying unknown ones.
    fn encode(&mut self, frame: Inbound, dst: &mut BytesMut) -> Result<()> {
        match frame {
            Inbound::Known(packet) => <Self as Encoder<Box<dyn Packet>>>::encode(self, packet, dst),
            Inbound::Unknown { id, body } => self.encode_raw(id, &body, dst),
        }
    }
}
