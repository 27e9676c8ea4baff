//! Lookup interface over the static per-version id tables (blocks, items, entity types...).
//!
//! Keys are the engine's own stable identifiers, ids are what a given protocol version puts on
//! the wire. Tables are loaded once and only read afterwards.

use crate::error::ConfigError;
use crate::version::{ProtocolVersion, VersionRange};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    Block,
    Item,
    EntityType,
    DataComponent,
    Particle,
    BlockEntity,
}

pub trait MappingTable: Send + Sync {
    /// Wire id of `key` in `version`, if that version knows it.
    fn id_for(&self, kind: MappingKind, key: u32, version: ProtocolVersion) -> Option<i32>;

    /// Reverse of [`MappingTable::id_for`].
    fn key_for(&self, kind: MappingKind, id: i32, version: ProtocolVersion) -> Option<u32>;
}

/// Keys and ids are the same number in every version.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMappings;

impl MappingTable for IdentityMappings {
    fn id_for(&self, _kind: MappingKind, key: u32, _version: ProtocolVersion) -> Option<i32> {
        i32::try_from(key).ok()
    }

    fn key_for(&self, _kind: MappingKind, id: i32, _version: ProtocolVersion) -> Option<u32> {
        u32::try_from(id).ok()
    }
}

#[derive(Debug, Deserialize)]
struct RangeEntry {
    from: ProtocolVersion,
    to: Option<ProtocolVersion>,
    ids: HashMap<String, i32>,
}

#[derive(Debug)]
struct RangeTable {
    range: VersionRange,
    forward: HashMap<u32, i32>,
    reverse: HashMap<i32, u32>,
}

/// Mapping tables parsed from JSON.
///
/// ```json
/// { "block": [ { "from": "1.13", "to": "1.15.2", "ids": { "1": 1, "9": 10 } } ] }
/// ```
///
/// Kinds or versions with no table behave like [`IdentityMappings`]; inside a covered range a
/// missing key has no id.
#[derive(Debug, Default)]
pub struct JsonMappings {
    tables: HashMap<MappingKind, Vec<RangeTable>>,
}

impl JsonMappings {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let raw: HashMap<MappingKind, Vec<RangeEntry>> = serde_json::from_str(source)?;
        let mut tables = HashMap::new();

        for (kind, entries) in raw {
            let mut ranges: Vec<RangeTable> = Vec::with_capacity(entries.len());
            for entry in entries {
                let range =
                    VersionRange::new(entry.from, entry.to.unwrap_or_else(ProtocolVersion::newest));
                if range.to < range.from {
                    return Err(ConfigError::Invalid(format!(
                        "{:?} table ends ({}) before it starts ({})",
                        kind, range.to, range.from
                    )));
                }
                if let Some(clash) = ranges.iter().find(|t| t.range.overlaps(&range)) {
                    return Err(ConfigError::Invalid(format!(
                        "{:?} tables starting at {} and {} overlap",
                        kind, clash.range.from, range.from
                    )));
                }

                let mut forward = HashMap::with_capacity(entry.ids.len());
                let mut reverse = HashMap::with_capacity(entry.ids.len());
                for (key, id) in entry.ids {
                    let key: u32 = key.parse().map_err(|_| {
                        ConfigError::Invalid(format!("{:?} key `{}` is not a number", kind, key))
                    })?;
                    forward.insert(key, id);
                    // First key wins when several keys collapse onto one legacy id.
                    reverse.entry(id).or_insert(key);
                }
                ranges.push(RangeTable {
                    range,
                    forward,
                    reverse,
                });
            }
            tables.insert(kind, ranges);
        }

        tracing::debug!(kinds = tables.len(), "loaded mapping tables");
        Ok(Self { tables })
    }

    fn table(&self, kind: MappingKind, version: ProtocolVersion) -> Option<&RangeTable> {
        self.tables
            .get(&kind)?
            .iter()
            .find(|t| t.range.contains(version))
    }
}

impl MappingTable for JsonMappings {
    fn id_for(&self, kind: MappingKind, key: u32, version: ProtocolVersion) -> Option<i32> {
        match self.table(kind, version) {
            Some(table) => table.forward.get(&key).copied(),
            None => IdentityMappings.id_for(kind, key, version),
        }
    }

    fn key_for(&self, kind: MappingKind, id: i32, version: ProtocolVersion) -> Option<u32> {
        match self.table(kind, version) {
            Some(table) => table.reverse.get(&id).copied(),
            None => IdentityMappings.key_for(kind, id, version),
        }
    }
}
