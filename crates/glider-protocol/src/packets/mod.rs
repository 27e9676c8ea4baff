//! Packets whose layout lives entirely in this crate. Chunk and light packets are in
//! `glider-world`.

mod entity_metadata;
mod keep_alive;
mod player_position;
mod set_slot;

pub use entity_metadata::SetEntityMetadataPacket;
pub use keep_alive::KeepAlivePacket;
pub use player_position::{PlayerPositionPacket, RelativeFlags};
pub use set_slot::SetSlotPacket;
