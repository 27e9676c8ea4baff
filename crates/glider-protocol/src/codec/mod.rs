//! Version-parameterised codecs and the combinators that build packet layouts out of them.
//!
//! A codec turns a value into bytes for one protocol version and back. Codecs hold no mutable
//! state and can be shared between threads; every call gets its own [`PacketBuffer`].

mod combinators;
mod composite;
pub mod primitives;

pub use combinators::{
    gate, optional, recursive, versioned, AssocMapCodec, CollectionCodec, MapCodec,
    OptionalCodec, RecursiveCodec, TryMapCodec, VersionGate, VersionSwitch, Versioned,
    MAX_RECURSION_DEPTH,
};
pub use composite::*;

use crate::buffer::PacketBuffer;
use glider_common::{Comparison, ProtocolVersion, Result, VersionPredicate};
use std::sync::Arc;

pub trait Codec<T>: Send + Sync {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<T>;

    fn encode(&self, value: &T, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()>;
}

/// Shared, type-erased codec.
pub type BoxedCodec<T> = Arc<dyn Codec<T>>;

impl<T, C: Codec<T> + ?Sized> Codec<T> for Arc<C> {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<T> {
        (**self).decode(buf, version)
    }

    fn encode(&self, value: &T, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        (**self).encode(value, buf, version)
    }
}

impl<T, C: Codec<T> + ?Sized> Codec<T> for &C {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<T> {
        (**self).decode(buf, version)
    }

    fn encode(&self, value: &T, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        (**self).encode(value, buf, version)
    }
}

/// Builder methods available on every codec.
pub trait CodecExt<T>: Codec<T> + Sized {
    fn map<B, F, G>(self, decode: F, encode: G) -> MapCodec<Self, T, F, G>
    where
        F: Fn(T) -> B + Send + Sync,
        G: Fn(&B) -> T + Send + Sync,
    {
        MapCodec::new(self, decode, encode)
    }

    fn try_map<B, F, G>(self, decode: F, encode: G) -> TryMapCodec<Self, T, F, G>
    where
        F: Fn(T) -> Result<B> + Send + Sync,
        G: Fn(&B) -> Result<T> + Send + Sync,
    {
        TryMapCodec::new(self, decode, encode)
    }

    fn optional(self) -> OptionalCodec<Self> {
        OptionalCodec::new(self)
    }

    fn list(self, max: usize) -> CollectionCodec<Self> {
        CollectionCodec::new(self, max)
    }

    /// Present from `version` onwards; older versions decode `fallback`.
    fn since(self, version: ProtocolVersion, fallback: T) -> VersionGate<Self, T>
    where
        T: Clone + Send + Sync,
    {
        gate(VersionPredicate::new(Comparison::Ge, version), self, fallback)
    }

    /// Present before `version`; newer versions decode `fallback`.
    fn until(self, version: ProtocolVersion, fallback: T) -> VersionGate<Self, T>
    where
        T: Clone + Send + Sync,
    {
        gate(VersionPredicate::new(Comparison::Lt, version), self, fallback)
    }

    fn boxed(self) -> BoxedCodec<T>
    where
        Self: 'static,
    {
        Arc::new(self)
    }
}

impl<T, C: Codec<T>> CodecExt<T> for C {}

/// VarInt-counted list of `element`.
pub fn collection<C>(element: C, max: usize) -> CollectionCodec<C> {
    CollectionCodec::new(element, max)
}

/// VarInt-counted key/value pairs.
pub fn assoc_map<KC, VC>(key: KC, value: VC, max: usize) -> AssocMapCodec<KC, VC> {
    AssocMapCodec::new(key, value, max)
}

/// Convenience for decoding one value from a complete byte slice.
pub fn decode_from<T, C: Codec<T>>(codec: &C, bytes: &[u8], version: ProtocolVersion) -> Result<T> {
    let mut buf = PacketBuffer::from_bytes(bytes.to_vec());
    codec.decode(&mut buf, version)
}

/// Convenience for encoding one value into a fresh byte vector.
pub fn encode_to_vec<T, C: Codec<T>>(
    codec: &C,
    value: &T,
    version: ProtocolVersion,
) -> Result<Vec<u8>> {
    let mut buf = PacketBuffer::new();
    codec.encode(value, &mut buf, version)?;
    Ok(buf.into_inner())
}
