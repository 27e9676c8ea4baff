//! Item stacks ("slots") in the five layouts the protocol has used.

mod components;

pub use components::{ComponentKind, ComponentPatch, ComponentValue, CustomModelData, MAX_COMPONENTS};

use crate::buffer::PacketBuffer;
use crate::codec::{recursive, BoxedCodec, Codec, RecursiveCodec};
use glider_common::{ProtocolError, ProtocolVersion, Result};
use glider_nbt::Tag;
use once_cell::sync::Lazy;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub id: i32,
    pub count: i32,
    /// Durability or data value. Part of the slot until 1.13.
    pub damage: i16,
    /// Tag compound, used until 1.20.5.
    pub nbt: Option<Tag>,
    /// Component changes relative to the item's prototype, used from 1.20.5.
    pub components: ComponentPatch,
}

impl ItemStack {
    pub fn new(id: i32, count: i32) -> Self {
        Self {
            id,
            count,
            damage: 0,
            nbt: None,
            components: ComponentPatch::default(),
        }
    }

    pub fn with_damage(mut self, damage: i16) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_nbt(mut self, nbt: Tag) -> Self {
        self.nbt = Some(nbt);
        self
    }

    pub fn with_component(mut self, kind: ComponentKind, value: ComponentValue) -> Self {
        self.components.added.push((kind, value));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotLayout {
    /// 1.7 to 1.12.2: short id, byte count, short damage, NBT.
    Damaged,
    /// 1.13 and 1.13.1: damage moved into NBT.
    ShortId,
    /// 1.13.2 to 1.20.4: presence flag, VarInt id, byte count, NBT.
    Flagged,
    /// 1.20.5 onwards: VarInt count, VarInt id, component patch.
    Components,
}

impl SlotLayout {
    fn for_version(version: ProtocolVersion) -> Self {
        if version < ProtocolVersion::V1_13 {
            SlotLayout::Damaged
        } else if version < ProtocolVersion::V1_13_2 {
            SlotLayout::ShortId
        } else if version < ProtocolVersion::V1_20_5 {
            SlotLayout::Flagged
        } else {
            SlotLayout::Components
        }
    }
}

/// Slot codec. Holds a handle to itself for item stacks nested inside components.
struct SlotCodec {
    nested: RecursiveCodec<Option<ItemStack>>,
}

fn build_slot() -> BoxedCodec<Option<ItemStack>> {
    recursive(|nested| {
        let codec: BoxedCodec<Option<ItemStack>> = Arc::new(SlotCodec { nested });
        codec
    })
}

static SLOT: Lazy<BoxedCodec<Option<ItemStack>>> = Lazy::new(build_slot);

/// Codec for an optional item stack in the layout of the requested version.
pub fn slot() -> &'static BoxedCodec<Option<ItemStack>> {
    &SLOT
}

fn narrow<T: TryFrom<i32>>(value: i32, what: &str, version: ProtocolVersion) -> Result<T> {
    T::try_from(value).map_err(|_| ProtocolError::UnsupportedValue {
        domain: "item stack",
        kind: format!("{} {}", what, value),
        version,
    })
}

impl Codec<Option<ItemStack>> for SlotCodec {
    fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<Option<ItemStack>> {
        match SlotLayout::for_version(version) {
            layout @ (SlotLayout::Damaged | SlotLayout::ShortId) => {
                let id = buf.read_i16()?;
                if id < 0 {
                    return Ok(None);
                }
                let count = buf.read_i8()? as i32;
                let damage = if layout == SlotLayout::Damaged {
                    buf.read_i16()?
                } else {
                    0
                };
                let nbt = buf.read_nbt(version)?;
                Ok(Some(ItemStack {
                    id: id as i32,
                    count,
                    damage,
                    nbt,
                    components: ComponentPatch::default(),
                }))
            }
            SlotLayout::Flagged => {
                if !buf.read_bool()? {
                    return Ok(None);
                }
                let id = buf.read_varint()?;
                let count = buf.read_i8()? as i32;
                let nbt = buf.read_nbt(version)?;
                Ok(Some(ItemStack {
                    id,
                    count,
                    damage: 0,
                    nbt,
                    components: ComponentPatch::default(),
                }))
            }
            SlotLayout::Components => {
                let count = buf.read_varint()?;
                if count <= 0 {
                    return Ok(None);
                }
                let id = buf.read_varint()?;
                let components = ComponentPatch::read(buf, version, &self.nested)?;
                Ok(Some(ItemStack {
                    id,
                    count,
                    damage: 0,
                    nbt: None,
                    components,
                }))
            }
        }
    }

    fn encode(&self, value: &Option<ItemStack>, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
        let layout = SlotLayout::for_version(version);
        let stack = match value {
            Some(stack) => stack,
            None => {
                match layout {
                    SlotLayout::Damaged | SlotLayout::ShortId => buf.write_i16(-1),
                    SlotLayout::Flagged => buf.write_bool(false),
                    SlotLayout::Components => buf.write_varint(0),
                }
                return Ok(());
            }
        };

        if layout == SlotLayout::Components {
            if stack.nbt.is_some() {
                return Err(ProtocolError::UnsupportedValue {
                    domain: "item stack",
                    kind: "tag compound".into(),
                    version,
                });
            }
            if stack.count <= 0 {
                return Err(ProtocolError::invalid(format!(
                    "item stack count {} cannot be sent",
                    stack.count
                )));
            }
            buf.write_varint(stack.count);
            buf.write_varint(stack.id);
            return stack.components.write(buf, version, &self.nested);
        }

        if !stack.components.is_empty() {
            return Err(ProtocolError::UnsupportedValue {
                domain: "item stack",
                kind: "data components".into(),
                version,
            });
        }
        let count: i8 = narrow(stack.count, "count", version)?;
        match layout {
            SlotLayout::Damaged | SlotLayout::ShortId => {
                let id: i16 = narrow(stack.id, "id", version)?;
                if id < 0 {
                    return Err(ProtocolError::invalid("negative item id"));
                }
                buf.write_i16(id);
                buf.write_i8(count);
                if layout == SlotLayout::Damaged {
                    buf.write_i16(stack.damage);
                }
            }
            _ => {
                buf.write_bool(true);
                buf.write_varint(stack.id);
                buf.write_i8(count);
            }
        }
        buf.write_nbt(stack.nbt.as_ref(), version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_from, encode_to_vec};
    use crate::text::TextComponent;
    use assert_matches::assert_matches;
    use glider_nbt::Compound;
    use ProtocolVersion::*;

    fn named_compound() -> Tag {
        let mut compound = Compound::new();
        compound.insert("Damage".into(), Tag::Int(3));
        Tag::Compound(compound)
    }

    fn round_trip(stack: &Option<ItemStack>, version: ProtocolVersion) -> Vec<u8> {
        let bytes = encode_to_vec(slot(), stack, version).unwrap();
        assert_eq!(&decode_from(slot(), &bytes, version).unwrap(), stack, "{}", version);
        bytes
    }

    #[test]
    fn test_empty_slot_per_era() {
        assert_eq!(round_trip(&None, V1_7_6), vec![0xFF, 0xFF]);
        assert_eq!(round_trip(&None, V1_12_2), vec![0xFF, 0xFF]);
        assert_eq!(round_trip(&None, V1_13), vec![0xFF, 0xFF]);
        assert_eq!(round_trip(&None, V1_16_4), vec![0]);
        assert_eq!(round_trip(&None, V1_21), vec![0]);
    }

    #[test]
    fn test_legacy_layouts() {
        let stack = Some(ItemStack::new(1, 64).with_damage(2));
        assert_eq!(round_trip(&stack, V1_8), vec![0, 1, 64, 0, 2, 0]);
        round_trip(&Some(ItemStack::new(276, 1).with_nbt(named_compound())), V1_7_2);
        round_trip(&Some(ItemStack::new(276, 1).with_nbt(named_compound())), V1_12);
        assert_eq!(round_trip(&Some(ItemStack::new(1, 64)), V1_13_1), vec![0, 1, 64, 0]);
    }

    #[test]
    fn test_flagged_layout() {
        let stack = Some(ItemStack::new(300, 5));
        assert_eq!(round_trip(&stack, V1_14), vec![1, 0xAC, 0x02, 5, 0]);
        round_trip(&Some(ItemStack::new(7, 1).with_nbt(named_compound())), V1_20_2);
    }

    #[test]
    fn test_component_layout() {
        let stack = Some(ItemStack::new(7, 2));
        assert_eq!(round_trip(&stack, V1_20_5), vec![2, 7, 0, 0]);

        let named = Some(
            ItemStack::new(7, 1)
                .with_component(ComponentKind::MaxStackSize, ComponentValue::Int(16))
                .with_component(
                    ComponentKind::CustomName,
                    ComponentValue::Text(TextComponent::Nbt(Tag::String("Sword".into()))),
                ),
        );
        round_trip(&named, V1_21);
        round_trip(&named, V1_21_5);
    }

    #[test]
    fn test_nested_bundle_contents() {
        let inner = ItemStack::new(1, 3);
        let bundle = ItemStack::new(2, 1).with_component(
            ComponentKind::BundleContents,
            ComponentValue::Items(vec![
                inner.clone(),
                ItemStack::new(3, 1)
                    .with_component(ComponentKind::BundleContents, ComponentValue::Items(vec![inner])),
            ]),
        );
        round_trip(&Some(bundle), V1_21_2);
    }

    #[test]
    fn test_rejects_out_of_era_data() {
        let with_components = Some(
            ItemStack::new(1, 1).with_component(ComponentKind::Glider, ComponentValue::Unit),
        );
        assert_matches!(
            encode_to_vec(slot(), &with_components, V1_16),
            Err(ProtocolError::UnsupportedValue { .. })
        );
        let with_nbt = Some(ItemStack::new(1, 1).with_nbt(named_compound()));
        assert_matches!(
            encode_to_vec(slot(), &with_nbt, V1_21),
            Err(ProtocolError::UnsupportedValue { .. })
        );
        assert_matches!(
            encode_to_vec(slot(), &Some(ItemStack::new(1, 300)), V1_12),
            Err(ProtocolError::UnsupportedValue { .. })
        );
    }
}
