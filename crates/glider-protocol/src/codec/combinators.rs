use super::{BoxedCodec, Codec};
use crate::buffer::PacketBuffer;
use glider_common::{ProtocolError, ProtocolVersion, Result, VersionPredicate};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

/// Nesting limit for values decoded through [`recursive`] codecs.
pub const MAX_RECURSION_DEPTH: usize = 64;

/// Adapts a codec of `A` into a codec of `B` with two infallible conversions.
pub struct MapCodec<C, A, F, G> {
    inner: C,
    decode: F,
    encode: G,
    _marker: PhantomData<fn() -> A>,
}

impl<C, A, F, G> MapCodec<C, A, F, G> {
    pub fn new(inner: C, decode: F, encode: G) -> Self {
        Self {
            inner,
            decode,
            encode,
            _marker: PhantomData,
        }
    }
}

impl<A, B, C, F, G> Codec<B> for MapCodec<C, A, F, G>
where
    C: Codec<A>,
    F: Fn(A) -> B + Send + Sync,
    G: Fn(&B) -> A + Send + Sync,
{
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<B> {
        self.inner.decode(buf, version).map(&self.decode)
    }

    fn encode(&self, value: &B, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        self.inner.encode(&(self.encode)(value), buf, version)
    }
}

/// Like [`MapCodec`] but either conversion may reject the value.
pub struct TryMapCodec<C, A, F, G> {
    inner: C,
    decode: F,
    encode: G,
    _marker: PhantomData<fn() -> A>,
}

impl<C, A, F, G> TryMapCodec<C, A, F, G> {
    pub fn new(inner: C, decode: F, encode: G) -> Self {
        Self {
            inner,
            decode,
            encode,
            _marker: PhantomData,
        }
    }
}

impl<A, B, C, F, G> Codec<B> for TryMapCodec<C, A, F, G>
where
    C: Codec<A>,
    F: Fn(A) -> Result<B> + Send + Sync,
    G: Fn(&B) -> Result<A> + Send + Sync,
{
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<B> {
        (self.decode)(self.inner.decode(buf, version)?)
    }

    fn encode(&self, value: &B, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        self.inner.encode(&(self.encode)(value)?, buf, version)
    }
}

/// Reads and writes `inner` only where `predicate` holds. Elsewhere decoding yields `fallback`
/// and encoding writes nothing.
pub struct VersionGate<C, T> {
    predicate: VersionPredicate,
    inner: C,
    fallback: T,
}

pub fn gate<T, C>(predicate: VersionPredicate, inner: C, fallback: T) -> VersionGate<C, T>
where
    T: Clone + Send + Sync,
    C: Codec<T>,
{
    VersionGate {
        predicate,
        inner,
        fallback,
    }
}

impl<T, C> Codec<T> for VersionGate<C, T>
where
    T: Clone + Send + Sync,
    C: Codec<T>,
{
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<T> {
        if self.predicate.matches(version) {
            self.inner.decode(buf, version)
        } else {
            Ok(self.fallback.clone())
        }
    }

    fn encode(&self, value: &T, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        if self.predicate.matches(version) {
            self.inner.encode(value, buf, version)
        } else {
            Ok(())
        }
    }
}

/// Uses `before` below `threshold` and `after` from it onwards.
pub struct Versioned<A, B> {
    threshold: ProtocolVersion,
    before: A,
    after: B,
}

pub fn versioned<A, B>(threshold: ProtocolVersion, before: A, after: B) -> Versioned<A, B> {
    Versioned {
        threshold,
        before,
        after,
    }
}

impl<T, A: Codec<T>, B: Codec<T>> Codec<T> for Versioned<A, B> {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<T> {
        if version < self.threshold {
            self.before.decode(buf, version)
        } else {
            self.after.decode(buf, version)
        }
    }

    fn encode(&self, value: &T, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        if version < self.threshold {
            self.before.encode(value, buf, version)
        } else {
            self.after.encode(value, buf, version)
        }
    }
}

/// Picks a layout by the newest arm whose starting version is not after the requested one.
pub struct VersionSwitch<T> {
    arms: Vec<(ProtocolVersion, BoxedCodec<T>)>,
}

impl<T> VersionSwitch<T> {
    pub fn new() -> Self {
        Self { arms: Vec::new() }
    }

    /// Adds a layout used from `from` until the next arm starts.
    pub fn from(mut self, from: ProtocolVersion, codec: BoxedCodec<T>) -> Self {
        let at = self.arms.partition_point(|(start, _)| *start < from);
        self.arms.insert(at, (from, codec));
        self
    }

    fn select(&self, version: ProtocolVersion) -> Result<&BoxedCodec<T>> {
        self.arms
            .iter()
            .rev()
            .find(|(from, _)| *from <= version)
            .map(|(_, codec)| codec)
            .ok_or_else(|| ProtocolError::invalid(format!("no layout defined for {}", version)))
    }
}

impl<T> Default for VersionSwitch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for VersionSwitch<T> {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<T> {
        self.select(version)?.decode(buf, version)
    }

    fn encode(&self, value: &T, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        self.select(version)?.encode(value, buf, version)
    }
}

/// Boolean presence flag followed by the payload when set.
pub struct OptionalCodec<C> {
    inner: C,
}

impl<C> OptionalCodec<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

pub fn optional<C>(inner: C) -> OptionalCodec<C> {
    OptionalCodec::new(inner)
}

impl<T, C: Codec<T>> Codec<Option<T>> for OptionalCodec<C> {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<Option<T>> {
        if buf.read_bool()? {
            Ok(Some(self.inner.decode(buf, version)?))
        } else {
            Ok(None)
        }
    }

    fn encode(
        &self,
        value: &Option<T>,
        buf: &mut PacketBuffer,
        version: ProtocolVersion,
    ) -> Result<()> {
        buf.write_bool(value.is_some());
        match value {
            Some(inner) => self.inner.encode(inner, buf, version),
            None => Ok(()),
        }
    }
}

/// VarInt count then that many elements. A count above `max` is a framing error.
pub struct CollectionCodec<C> {
    element: C,
    max: usize,
}

impl<C> CollectionCodec<C> {
    pub fn new(element: C, max: usize) -> Self {
        Self { element, max }
    }
}

impl<T, C: Codec<T>> Codec<Vec<T>> for CollectionCodec<C> {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<Vec<T>> {
        let count = buf.read_length(self.max)?;
        // Cap the preallocation; the count has not been checked against the bytes left.
        let mut values = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            values.push(self.element.decode(buf, version)?);
        }
        Ok(values)
    }

    fn encode(&self, value: &Vec<T>, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        buf.write_length(value.len(), self.max)?;
        for element in value {
            self.element.encode(element, buf, version)?;
        }
        Ok(())
    }
}

/// VarInt count then key/value pairs. Duplicate keys are rejected.
pub struct AssocMapCodec<KC, VC> {
    key: KC,
    value: VC,
    max: usize,
}

impl<KC, VC> AssocMapCodec<KC, VC> {
    pub fn new(key: KC, value: VC, max: usize) -> Self {
        Self { key, value, max }
    }
}

impl<K, V, KC, VC> Codec<HashMap<K, V>> for AssocMapCodec<KC, VC>
where
    K: Eq + Hash,
    KC: Codec<K>,
    VC: Codec<V>,
{
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<HashMap<K, V>> {
        let count = buf.read_length(self.max)?;
        let mut map = HashMap::with_capacity(count.min(1024));
        for _ in 0..count {
            let key = self.key.decode(buf, version)?;
            let value = self.value.decode(buf, version)?;
            if map.insert(key, value).is_some() {
                return Err(ProtocolError::invalid("duplicate key in map"));
            }
        }
        Ok(map)
    }

    fn encode(
        &self,
        value: &HashMap<K, V>,
        buf: &mut PacketBuffer,
        version: ProtocolVersion,
    ) -> Result<()> {
        buf.write_length(value.len(), self.max)?;
        for (key, entry) in value {
            self.key.encode(key, buf, version)?;
            self.value.encode(entry, buf, version)?;
        }
        Ok(())
    }
}

/// Deferred handle to a codec that is still being built. Holds a weak reference so the finished
/// codec does not keep itself alive.
pub struct RecursiveCodec<T> {
    target: Weak<OnceCell<BoxedCodec<T>>>,
}

impl<T> Clone for RecursiveCodec<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T> RecursiveCodec<T> {
    fn resolve(&self) -> Result<BoxedCodec<T>> {
        self.target
            .upgrade()
            .and_then(|cell| cell.get().cloned())
            .ok_or_else(|| ProtocolError::invalid("recursive codec used outside its definition"))
    }
}

impl<T> Codec<T> for RecursiveCodec<T> {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<T> {
        let codec = self.resolve()?;
        buf.enter_nested(MAX_RECURSION_DEPTH)?;
        let result = codec.decode(buf, version);
        buf.exit_nested();
        result
    }

    fn encode(&self, value: &T, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        let codec = self.resolve()?;
        buf.enter_nested(MAX_RECURSION_DEPTH)?;
        let result = codec.encode(value, buf, version);
        buf.exit_nested();
        result
    }
}

struct RecursiveRoot<T> {
    cell: Arc<OnceCell<BoxedCodec<T>>>,
}

impl<T> Codec<T> for RecursiveRoot<T> {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<T> {
        match self.cell.get() {
            Some(codec) => codec.decode(buf, version),
            None => Err(ProtocolError::invalid("recursive codec is not initialised")),
        }
    }

    fn encode(&self, value: &T, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        match self.cell.get() {
            Some(codec) => codec.encode(value, buf, version),
            None => Err(ProtocolError::invalid("recursive codec is not initialised")),
        }
    }
}

/// Builds a self-referential codec. `builder` receives a handle that stands for the codec being
/// built and may embed it anywhere inside.
pub fn recursive<T, F>(builder: F) -> BoxedCodec<T>
where
    T: 'static,
    F: FnOnce(RecursiveCodec<T>) -> BoxedCodec<T>,
{
    let cell = Arc::new(OnceCell::new());
    let handle = RecursiveCodec {
        target: Arc::downgrade(&cell),
    };
    let built = builder(handle);
    // The cell was created above and nothing else can have filled it.
    let _ = cell.set(built);
    Arc::new(RecursiveRoot { cell })
}
