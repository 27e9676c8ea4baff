//! Chunk columns and their per-version wire form.

pub mod bitstorage;
pub mod block;
pub mod column;
pub mod heightmap;
pub mod light;
pub mod packets;
pub mod palette;
pub mod section;
pub mod serializer;

pub use block::{BlockProperties, BlockState, SimpleProperties};
pub use column::{BlockEntity, ChunkColumn, ChunkSnapshot, Dimension};
pub use heightmap::{Heightmap, HeightmapKind};
pub use light::LightSection;
pub use packets::{ChunkDataPacket, UpdateLightPacket};
pub use section::ChunkSection;
pub use serializer::{ChunkSerializer, Selection};
