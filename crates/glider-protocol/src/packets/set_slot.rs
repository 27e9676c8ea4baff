use crate::buffer::PacketBuffer;
use crate::codec::primitives::{I16, I8, VAR_INT};
use crate::codec::{composite4, versioned, BoxedCodec, Codec, CodecExt};
use crate::item::{slot, ItemStack};
use crate::packet::Packet;
use crate::passthrough::{pass_through, Decoded};
use glider_common::{ProtocolError, ProtocolVersion, Result};
use once_cell::sync::Lazy;

/// Sets one slot of an open container. Window `-1` and slot `-1` address the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct SetSlotPacket {
    /// Container window, a byte before 1.21.2 and a VarInt after.
    pub window_id: i32,
    /// Container revision, present from 1.17.1.
    pub state_id: i32,
    /// Slot index inside the window.
    pub slot: i16,
    /// The new contents, `None` for an empty slot, or raw bytes when the item failed to decode.
    pub item: Decoded<Option<ItemStack>>,
}

impl SetSlotPacket {
    /// Creates a packet with a decoded item.
    pub fn new(window_id: i32, state_id: i32, slot: i16, item: Option<ItemStack>) -> Self {
        Self {
            window_id,
            state_id,
            slot,
            item: Decoded::Value(item),
        }
    }
}

static CODEC: Lazy<BoxedCodec<SetSlotPacket>> = Lazy::new(|| {
    let window_id = versioned(
        ProtocolVersion::V1_21_2,
        I8.try_map(
            |v: i8| Ok(v as i32),
            |v: &i32| {
                i8::try_from(*v)
                    .map_err(|_| ProtocolError::invalid(format!("window id {} does not fit a byte", v)))
            },
        ),
        VAR_INT,
    );
    composite4(
        window_id,
        |p: &SetSlotPacket| &p.window_id,
        VAR_INT.since(ProtocolVersion::V1_17_1, 0),
        |p: &SetSlotPacket| &p.state_id,
        I16,
        |p: &SetSlotPacket| &p.slot,
        pass_through("SetSlot", slot().clone()),
        |p: &SetSlotPacket| &p.item,
        |window_id, state_id, slot, item| SetSlotPacket {
            window_id,
            state_id,
            slot,
            item,
        },
    )
    .boxed()
});

impl Packet for SetSlotPacket {
    fn read_from_buffer(buffer: &mut PacketBuffer, version: ProtocolVersion) -> Result<Self> {
        CODEC.decode(buffer, version)
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        CODEC.encode(self, buffer, version)
    }
}
