//! Packet id registry.
//!
//! Each packet type is registered once with the list of ids it had over the protocol history.
//! The builder expands those windows into one table per version; the finished registry is
//! immutable and answers id and type lookups in constant time.

use crate::buffer::PacketBuffer;
use crate::packet::{short_type_name, Packet};
use glider_common::{ConnectionState, Direction, ProtocolVersion, RegistryError, Result};
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

/// Decodes a packet body into a boxed packet.
pub type PacketFactory = fn(&mut PacketBuffer, ProtocolVersion) -> Result<Box<dyn Packet>>;

fn factory<P: Packet>(buffer: &mut PacketBuffer, version: ProtocolVersion) -> Result<Box<dyn Packet>> {
    Ok(Box::new(P::read_from_buffer(buffer, version)?))
}

/// One id binding: `id` is used from `from` until the next mapping of the same packet starts,
/// or through `to` (inclusive) on the last mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketMapping {
    pub id: i32,
    pub from: ProtocolVersion,
    pub to: Option<ProtocolVersion>,
    /// Only ever sent by this side; no decoder is registered.
    pub encode_only: bool,
}

/// Shorthand for an open-ended mapping.
pub const fn map(id: i32, from: ProtocolVersion) -> PacketMapping {
    PacketMapping {
        id,
        from,
        to: None,
        encode_only: false,
    }
}

impl PacketMapping {
    pub const fn until(mut self, to: ProtocolVersion) -> Self {
        self.to = Some(to);
        self
    }

    pub const fn encode_only(mut self) -> Self {
        self.encode_only = true;
        self
    }
}

struct Decoder {
    factory: PacketFactory,
    name: &'static str,
}

/// Id tables of one direction for a single protocol version.
pub struct ProtocolRegistry {
    version: ProtocolVersion,
    decoders: HashMap<i32, Decoder>,
    ids: HashMap<TypeId, i32>,
    owners: HashMap<i32, &'static str>,
}

impl ProtocolRegistry {
    fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            decoders: HashMap::new(),
            ids: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn id_of<P: Packet>(&self) -> Option<i32> {
        self.ids.get(&TypeId::of::<P>()).copied()
    }

    pub fn id_of_packet(&self, packet: &dyn Packet) -> Option<i32> {
        self.ids.get(&packet.as_any().type_id()).copied()
    }

    /// Decoder registered for `id`, if any.
    pub fn create_for(&self, id: i32) -> Option<PacketFactory> {
        self.decoders.get(&id).map(|d| d.factory)
    }

    /// Decodes the body of packet `id`. `None` when the id has no decoder in this version.
    pub fn decode(
        &self,
        id: i32,
        buffer: &mut PacketBuffer,
        version: ProtocolVersion,
    ) -> Option<Result<Box<dyn Packet>>> {
        self.decoders
            .get(&id)
            .map(|decoder| (decoder.factory)(buffer, version))
    }

    pub fn name_of(&self, id: i32) -> Option<&'static str> {
        self.owners.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Fails if `id` or `type_id` is already taken in this version.
    fn check(&self, packet: &'static str, type_id: TypeId, id: i32) -> std::result::Result<(), RegistryError> {
        if let Some(existing) = self.owners.get(&id) {
            return Err(RegistryError::DuplicateId {
                packet,
                existing,
                id,
                version: self.version,
            });
        }
        if self.ids.contains_key(&type_id) {
            return Err(RegistryError::DuplicateType {
                packet,
                version: self.version,
            });
        }
        Ok(())
    }

    fn insert(&mut self, packet: &'static str, type_id: TypeId, id: i32, decoder: Option<PacketFactory>) {
        self.owners.insert(id, packet);
        self.ids.insert(type_id, id);
        if let Some(factory) = decoder {
            self.decoders.insert(id, Decoder {
                factory,
                name: packet,
            });
        }
    }
}

impl std::fmt::Debug for ProtocolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut decoders: Vec<_> = self.decoders.iter().map(|(id, d)| (*id, d.name)).collect();
        decoders.sort_unstable();
        f.debug_struct("ProtocolRegistry")
            .field("version", &self.version)
            .field("packets", &self.ids.len())
            .field("decoders", &decoders)
            .finish()
    }
}

/// Collects registrations for one direction, then freezes them into a [`PacketRegistry`].
#[derive(Debug)]
pub struct PacketRegistryBuilder {
    direction: Direction,
    tables: BTreeMap<ProtocolVersion, ProtocolRegistry>,
    fallback: bool,
}

impl PacketRegistryBuilder {
    /// Builder covering every supported version.
    pub fn new(direction: Direction) -> Self {
        Self::with_versions(direction, ProtocolVersion::all().iter().copied())
    }

    /// Builder covering only `versions`. Mapping windows that reach other versions skip them.
    pub fn with_versions(direction: Direction, versions: impl IntoIterator<Item = ProtocolVersion>) -> Self {
        Self {
            direction,
            tables: versions
                .into_iter()
                .map(|v| (v, ProtocolRegistry::new(v)))
                .collect(),
            fallback: false,
        }
    }

    /// Substitute the oldest table for versions without one.
    pub fn fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }

    /// Registers `P` under `mappings`, which must be sorted oldest first.
    pub fn register<P: Packet>(&mut self, mappings: &[PacketMapping]) -> std::result::Result<&mut Self, RegistryError> {
        let packet = short_type_name(std::any::type_name::<P>());
        if mappings.is_empty() {
            return Err(RegistryError::NoMappings { packet });
        }

        for (index, current) in mappings.iter().enumerate() {
            let next = mappings.get(index + 1);
            if let Some(to) = current.to {
                if next.is_some() {
                    return Err(RegistryError::BoundedMappingNotLast {
                        packet,
                        id: current.id,
                    });
                }
                if to < current.from {
                    return Err(RegistryError::InvalidRange {
                        packet,
                        id: current.id,
                        from: current.from,
                        to,
                    });
                }
            }
            if let Some(next) = next {
                if next.from <= current.from {
                    return Err(RegistryError::Misordered {
                        packet,
                        previous: current.from,
                        next: next.from,
                    });
                }
            }
        }

        // Nothing is inserted until every window has passed its checks.
        let type_id = TypeId::of::<P>();
        let mut planned = Vec::new();
        for (index, current) in mappings.iter().enumerate() {
            let next = mappings.get(index + 1);
            let decoder = if current.encode_only {
                None
            } else {
                Some(factory::<P> as PacketFactory)
            };
            for (version, table) in self.tables.range(current.from..) {
                let inside = match (next, current.to) {
                    (Some(next), _) => *version < next.from,
                    (None, Some(to)) => *version <= to,
                    (None, None) => true,
                };
                if !inside {
                    break;
                }
                table.check(packet, type_id, current.id)?;
                planned.push((*version, current.id, decoder));
            }
        }
        for (version, id, decoder) in planned {
            if let Some(table) = self.tables.get_mut(&version) {
                table.insert(packet, type_id, id, decoder);
            }
        }
        Ok(self)
    }

    pub fn build(self) -> PacketRegistry {
        tracing::debug!(
            direction = ?self.direction,
            versions = self.tables.len(),
            packets = self.tables.values().map(ProtocolRegistry::len).max().unwrap_or(0),
            "built packet registry"
        );
        PacketRegistry {
            direction: self.direction,
            tables: self.tables,
            fallback: self.fallback,
        }
    }
}

/// Frozen id tables of one direction across versions.
#[derive(Debug)]
pub struct PacketRegistry {
    direction: Direction,
    tables: BTreeMap<ProtocolVersion, ProtocolRegistry>,
    fallback: bool,
}

impl PacketRegistry {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Table for exactly `version`, or the oldest table when fallback is enabled.
    pub fn registry_for(&self, version: ProtocolVersion) -> Option<&ProtocolRegistry> {
        match self.tables.get(&version) {
            Some(table) => Some(table),
            None if self.fallback => {
                let oldest = self.tables.values().next();
                if let Some(table) = oldest {
                    tracing::trace!(
                        requested = %version,
                        using = %table.version(),
                        "no packet table for version, falling back to oldest"
                    );
                }
                oldest
            }
            None => None,
        }
    }

    /// Like [`PacketRegistry::registry_for`] but reports a missing table as an error.
    pub fn require(&self, version: ProtocolVersion) -> std::result::Result<&ProtocolRegistry, RegistryError> {
        self.registry_for(version)
            .ok_or(RegistryError::UnsupportedVersion(version))
    }

    pub fn versions(&self) -> impl Iterator<Item = ProtocolVersion> + '_ {
        self.tables.keys().copied()
    }
}

/// Both directions of one connection state.
#[derive(Debug)]
pub struct StateRegistry {
    pub state: ConnectionState,
    pub clientbound: PacketRegistry,
    pub serverbound: PacketRegistry,
}

impl StateRegistry {
    pub fn new(state: ConnectionState, clientbound: PacketRegistry, serverbound: PacketRegistry) -> Self {
        Self {
            state,
            clientbound,
            serverbound,
        }
    }

    pub fn direction(&self, direction: Direction) -> &PacketRegistry {
        match direction {
            Direction::Clientbound => &self.clientbound,
            Direction::Serverbound => &self.serverbound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ProtocolVersion::*;

    #[derive(Debug)]
    struct First;
    impl Packet for First {
        fn read_from_buffer(_: &mut PacketBuffer, _: ProtocolVersion) -> Result<Self> {
            Ok(First)
        }
        fn write_to_buffer(&self, _: &mut PacketBuffer, _: ProtocolVersion) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Second;
    impl Packet for Second {
        fn read_from_buffer(_: &mut PacketBuffer, _: ProtocolVersion) -> Result<Self> {
            Ok(Second)
        }
    }

    #[derive(Debug)]
    struct Outgoing;
    impl Packet for Outgoing {}

    fn builder() -> PacketRegistryBuilder {
        PacketRegistryBuilder::new(Direction::Clientbound)
    }

    #[test]
    fn test_windows_end_at_next_mapping() {
        let mut builder = builder();
        builder
            .register::<First>(&[map(0x01, V1_8), map(0x02, V1_9_1)])
            .unwrap();
        let registry = builder.build();

        assert_eq!(registry.registry_for(V1_8).unwrap().id_of::<First>(), Some(0x01));
        assert_eq!(registry.registry_for(V1_9).unwrap().id_of::<First>(), Some(0x01));
        assert_eq!(registry.registry_for(V1_9_1).unwrap().id_of::<First>(), Some(0x02));
        assert_eq!(registry.registry_for(V1_21_5).unwrap().id_of::<First>(), Some(0x02));
        assert_eq!(registry.registry_for(V1_7_6).unwrap().id_of::<First>(), None);
    }

    #[test]
    fn test_explicit_upper_bound_is_inclusive() {
        let mut builder = builder();
        builder
            .register::<First>(&[map(0x05, V1_9), map(0x06, V1_12).until(V1_12_2)])
            .unwrap();
        let registry = builder.build();

        assert_eq!(registry.registry_for(V1_12_2).unwrap().id_of::<First>(), Some(0x06));
        assert_eq!(registry.registry_for(V1_13).unwrap().id_of::<First>(), None);
    }

    #[test]
    fn test_decode_by_id() {
        let mut builder = builder();
        builder.register::<First>(&[map(0x10, V1_8)]).unwrap();
        builder.register::<Second>(&[map(0x11, V1_8)]).unwrap();
        let registry = builder.build();
        let table = registry.registry_for(V1_16).unwrap();

        let mut buffer = PacketBuffer::new();
        let packet = table.decode(0x11, &mut buffer, V1_16).unwrap().unwrap();
        assert!(packet.is::<Second>());
        assert_eq!(table.id_of_packet(packet.as_ref()), Some(0x11));
        assert!(table.decode(0x12, &mut buffer, V1_16).is_none());
        assert_eq!(table.name_of(0x10), Some("First"));
    }

    #[test]
    fn test_encode_only_has_no_decoder() {
        let mut builder = builder();
        builder
            .register::<Outgoing>(&[map(0x20, V1_8).encode_only()])
            .unwrap();
        let registry = builder.build();
        let table = registry.registry_for(V1_8).unwrap();

        assert_eq!(table.id_of::<Outgoing>(), Some(0x20));
        assert!(table.create_for(0x20).is_none());
    }

    #[test]
    fn test_rejects_empty_mappings() {
        assert_matches!(
            builder().register::<First>(&[]),
            Err(RegistryError::NoMappings { .. })
        );
    }

    #[test]
    fn test_rejects_bounded_mapping_before_last() {
        assert_matches!(
            builder().register::<First>(&[map(0x01, V1_8).until(V1_9), map(0x02, V1_12)]),
            Err(RegistryError::BoundedMappingNotLast { id: 0x01, .. })
        );
    }

    #[test]
    fn test_rejects_inverted_range() {
        assert_matches!(
            builder().register::<First>(&[map(0x01, V1_12).until(V1_9)]),
            Err(RegistryError::InvalidRange { .. })
        );
    }

    #[test]
    fn test_rejects_misordered_mappings() {
        assert_matches!(
            builder().register::<First>(&[map(0x01, V1_12), map(0x02, V1_9)]),
            Err(RegistryError::Misordered { .. })
        );
        assert_matches!(
            builder().register::<First>(&[map(0x01, V1_12), map(0x02, V1_12)]),
            Err(RegistryError::Misordered { .. })
        );
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let mut builder = builder();
        builder.register::<First>(&[map(0x01, V1_8)]).unwrap();
        assert_matches!(
            builder.register::<Second>(&[map(0x02, V1_8), map(0x01, V1_13)]),
            Err(RegistryError::DuplicateId {
                existing: "First",
                id: 0x01,
                version: V1_13,
                ..
            })
        );
    }

    #[test]
    fn test_rejected_packet_leaves_no_ids() {
        let mut builder = builder();
        builder.register::<First>(&[map(0x01, V1_13)]).unwrap();
        assert!(builder
            .register::<Second>(&[map(0x02, V1_8), map(0x01, V1_13)])
            .is_err());
        // the earlier window of the rejected packet was not kept, so its id is still free
        builder.register::<Outgoing>(&[map(0x02, V1_8)]).unwrap();
        let registry = builder.build();
        let table = registry.registry_for(V1_12_2).unwrap();
        assert_eq!(table.id_of::<Second>(), None);
        assert_eq!(table.id_of::<Outgoing>(), Some(0x02));
        assert_eq!(table.name_of(0x02), Some("Outgoing"));
    }

    #[test]
    fn test_rejects_duplicate_type() {
        let mut builder = builder();
        builder.register::<First>(&[map(0x01, V1_8)]).unwrap();
        assert_matches!(
            builder.register::<First>(&[map(0x02, V1_8)]),
            Err(RegistryError::DuplicateType { .. })
        );
    }

    #[test]
    fn test_fallback_to_oldest() {
        let versions = [V1_12, V1_16, V1_20];
        let mut strict = PacketRegistryBuilder::with_versions(Direction::Serverbound, versions);
        strict.register::<First>(&[map(0x01, V1_8), map(0x03, V1_16)]).unwrap();
        let strict = strict.build();
        assert!(strict.registry_for(V1_13).is_none());
        assert_matches!(strict.require(V1_13), Err(RegistryError::UnsupportedVersion(V1_13)));

        let mut lenient =
            PacketRegistryBuilder::with_versions(Direction::Serverbound, versions).fallback(true);
        lenient.register::<First>(&[map(0x01, V1_8), map(0x03, V1_16)]).unwrap();
        let lenient = lenient.build();
        let table = lenient.registry_for(V1_13).unwrap();
        assert_eq!(table.version(), V1_12);
        assert_eq!(table.id_of::<First>(), Some(0x01));
        assert_eq!(lenient.versions().count(), 3);
    }
}
