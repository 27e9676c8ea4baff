pub mod buffer;
pub mod codec;
pub mod framing;
pub mod item;
pub mod metadata;
pub mod packet;
pub mod packets;
pub mod particle;
pub mod passthrough;
pub mod registry;
pub mod text;

// Re-export commonly used items
pub use buffer::PacketBuffer;
pub use codec::{BoxedCodec, Codec, CodecExt};
pub use framing::{Inbound, MinecraftCodec};
pub use packet::Packet;
pub use passthrough::Decoded;
pub use registry::{map, PacketMapping, PacketRegistry, PacketRegistryBuilder, ProtocolRegistry, StateRegistry};
