//! Multi-version Minecraft protocol codecs: packet framing, version-aware value codecs and
//! the chunk serializer, tied together with the play state registry.

pub mod registry;

pub use glider_common as common;
pub use glider_nbt as nbt;
pub use glider_protocol as protocol;
pub use glider_world as world;

use glider_common::{CodecConfig, ConfigError, Direction, MappingTable, ProtocolVersion, RegistryError};
use glider_protocol::{MinecraftCodec, StateRegistry};
use glider_world::{BlockProperties, ChunkDataPacket, ChunkSerializer, ChunkSnapshot, Selection, UpdateLightPacket};
use std::sync::Arc;
use thiserror::Error;

/// Anything that stops the engine from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Everything built once at startup and shared by every connection.
#[derive(Debug, Clone)]
pub struct Engine {
    config: CodecConfig,
    registry: Arc<StateRegistry>,
    serializer: Arc<ChunkSerializer>,
}

impl Engine {
    pub fn new(
        config: CodecConfig,
        mappings: Arc<dyn MappingTable>,
        properties: Arc<dyn BlockProperties>,
    ) -> Result<Self, StartupError> {
        config.validate()?;
        let registry = Arc::new(registry::play_registry(config.registry_fallback)?);
        let serializer = Arc::new(ChunkSerializer::new(mappings, properties, config.clone()));
        tracing::info!(
            oldest = %ProtocolVersion::oldest(),
            newest = %ProtocolVersion::newest(),
            strict_length_checks = config.strict_length_checks,
            "codec engine ready"
        );
        Ok(Self {
            config,
            registry,
            serializer,
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }

    pub fn serializer(&self) -> &Arc<ChunkSerializer> {
        &self.serializer
    }

    /// Frame codec for one connection. `inbound` is the direction this side receives.
    pub fn codec(&self, inbound: Direction, version: ProtocolVersion) -> MinecraftCodec {
        MinecraftCodec::new(self.registry.clone(), inbound, version, self.config.clone())
    }

    pub fn chunk_packet(&self, snapshot: Arc<dyn ChunkSnapshot>, selection: Selection) -> ChunkDataPacket {
        ChunkDataPacket::new(snapshot, self.serializer.clone()).with_selection(selection)
    }

    pub fn light_packet(&self, snapshot: Arc<dyn ChunkSnapshot>) -> UpdateLightPacket {
        UpdateLightPacket::new(snapshot, self.serializer.clone())
    }
}
