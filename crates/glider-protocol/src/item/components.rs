//! Item data components (1.20.5+).
//!
//! A stack carries a patch against its prototype: components that were added or changed and
//! components that were removed. Component type ids are positions in a registry whose order
//! changes between releases, so each epoch has its own table.

use super::ItemStack;
use crate::buffer::PacketBuffer;
use crate::codec::Codec;
use crate::text::{TextComponent, TEXT};
use glider_common::{ProtocolError, ProtocolVersion, Result};
use glider_nbt::Tag;
use std::collections::HashSet;

/// Upper bound on added or removed entries in one patch.
pub const MAX_COMPONENTS: usize = 256;
const MAX_LORE_LINES: usize = 256;
const MAX_CONTAINER_SLOTS: usize = 256;
const MAX_LIST: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    CustomData,
    MaxStackSize,
    MaxDamage,
    Damage,
    Unbreakable,
    CustomName,
    ItemName,
    ItemModel,
    Lore,
    Rarity,
    Enchantments,
    CanPlaceOn,
    CanBreak,
    AttributeModifiers,
    CustomModelData,
    HideAdditionalTooltip,
    HideTooltip,
    TooltipDisplay,
    RepairCost,
    CreativeSlotLock,
    EnchantmentGlintOverride,
    IntangibleProjectile,
    Food,
    FireResistant,
    Consumable,
    UseRemainder,
    UseCooldown,
    DamageResistant,
    Tool,
    Weapon,
    Enchantable,
    Equippable,
    Repairable,
    Glider,
    TooltipStyle,
    DeathProtection,
    BlocksAttacks,
    StoredEnchantments,
    DyedColor,
    MapColor,
    MapId,
    MapDecorations,
    MapPostProcessing,
    ChargedProjectiles,
    BundleContents,
    PotionContents,
    PotionDurationScale,
    SuspiciousStewEffects,
    WritableBookContent,
    WrittenBookContent,
    Trim,
    DebugStickState,
    EntityData,
    BucketEntityData,
    BlockEntityData,
    Instrument,
    ProvidesTrimMaterial,
    OminousBottleAmplifier,
    JukeboxPlayable,
    ProvidesBannerPattern,
    Recipes,
    LodestoneTracker,
    FireworkExplosion,
    Fireworks,
    Profile,
    NoteBlockSound,
    BannerPatterns,
    BaseColor,
    PotDecorations,
    Container,
    BlockState,
    Bees,
    Lock,
    ContainerLoot,
    BreakSound,
    VillagerVariant,
    WolfVariant,
    WolfSoundVariant,
    WolfCollar,
    FoxVariant,
    SalmonSize,
    ParrotVariant,
    TropicalFishPattern,
    TropicalFishBaseColor,
    TropicalFishPatternColor,
    MooshroomVariant,
    RabbitVariant,
    PigVariant,
    CowVariant,
    ChickenVariant,
    FrogVariant,
    HorseVariant,
    PaintingVariant,
    LlamaVariant,
    AxolotlVariant,
    CatVariant,
    CatCollar,
    SheepColor,
    ShulkerColor,
}

use ComponentKind::*;

const V1_20_5_KINDS: &[ComponentKind] = &[
    CustomData, MaxStackSize, MaxDamage, Damage, Unbreakable, CustomName, ItemName, Lore,
    Rarity, Enchantments, CanPlaceOn, CanBreak, AttributeModifiers, CustomModelData,
    HideAdditionalTooltip, HideTooltip, RepairCost, CreativeSlotLock, EnchantmentGlintOverride,
    IntangibleProjectile, Food, FireResistant, Tool, StoredEnchantments, DyedColor, MapColor,
    MapId, MapDecorations, MapPostProcessing, ChargedProjectiles, BundleContents,
    PotionContents, SuspiciousStewEffects, WritableBookContent, WrittenBookContent, Trim,
    DebugStickState, EntityData, BucketEntityData, BlockEntityData, Instrument,
    OminousBottleAmplifier, Recipes, LodestoneTracker, FireworkExplosion, Fireworks, Profile,
    NoteBlockSound, BannerPatterns, BaseColor, PotDecorations, Container, BlockState, Bees,
    Lock, ContainerLoot,
];

const V1_21_KINDS: &[ComponentKind] = &[
    CustomData, MaxStackSize, MaxDamage, Damage, Unbreakable, CustomName, ItemName, Lore,
    Rarity, Enchantments, CanPlaceOn, CanBreak, AttributeModifiers, CustomModelData,
    HideAdditionalTooltip, HideTooltip, RepairCost, CreativeSlotLock, EnchantmentGlintOverride,
    IntangibleProjectile, Food, FireResistant, Tool, StoredEnchantments, DyedColor, MapColor,
    MapId, MapDecorations, MapPostProcessing, ChargedProjectiles, BundleContents,
    PotionContents, SuspiciousStewEffects, WritableBookContent, WrittenBookContent, Trim,
    DebugStickState, EntityData, BucketEntityData, BlockEntityData, Instrument,
    OminousBottleAmplifier, JukeboxPlayable, Recipes, LodestoneTracker, FireworkExplosion,
    Fireworks, Profile, NoteBlockSound, BannerPatterns, BaseColor, PotDecorations, Container,
    BlockState, Bees, Lock, ContainerLoot,
];

/// Shared by 1.21.2 and 1.21.4.
const V1_21_2_KINDS: &[ComponentKind] = &[
    CustomData, MaxStackSize, MaxDamage, Damage, Unbreakable, CustomName, ItemName, ItemModel,
    Lore, Rarity, Enchantments, CanPlaceOn, CanBreak, AttributeModifiers, CustomModelData,
    HideAdditionalTooltip, HideTooltip, RepairCost, CreativeSlotLock, EnchantmentGlintOverride,
    IntangibleProjectile, Food, Consumable, UseRemainder, UseCooldown, DamageResistant, Tool,
    Enchantable, Equippable, Repairable, Glider, TooltipStyle, DeathProtection,
    StoredEnchantments, DyedColor, MapColor, MapId, MapDecorations, MapPostProcessing,
    ChargedProjectiles, BundleContents, PotionContents, SuspiciousStewEffects,
    WritableBookContent, WrittenBookContent, Trim, DebugStickState, EntityData,
    BucketEntityData, BlockEntityData, Instrument, OminousBottleAmplifier, JukeboxPlayable,
    Recipes, LodestoneTracker, FireworkExplosion, Fireworks, Profile, NoteBlockSound,
    BannerPatterns, BaseColor, PotDecorations, Container, BlockState, Bees, Lock,
    ContainerLoot,
];

const V1_21_5_KINDS: &[ComponentKind] = &[
    CustomData, MaxStackSize, MaxDamage, Damage, Unbreakable, CustomName, ItemName, ItemModel,
    Lore, Rarity, Enchantments, CanPlaceOn, CanBreak, AttributeModifiers, CustomModelData,
    TooltipDisplay, RepairCost, CreativeSlotLock, EnchantmentGlintOverride,
    IntangibleProjectile, Food, Consumable, UseRemainder, UseCooldown, DamageResistant, Tool,
    Weapon, Enchantable, Equippable, Repairable, Glider, TooltipStyle, DeathProtection,
    BlocksAttacks, StoredEnchantments, DyedColor, MapColor, MapId, MapDecorations,
    MapPostProcessing, ChargedProjectiles, BundleContents, PotionContents, PotionDurationScale,
    SuspiciousStewEffects, WritableBookContent, WrittenBookContent, Trim, DebugStickState,
    EntityData, BucketEntityData, BlockEntityData, Instrument, ProvidesTrimMaterial,
    OminousBottleAmplifier, JukeboxPlayable, ProvidesBannerPattern, Recipes, LodestoneTracker,
    FireworkExplosion, Fireworks, Profile, NoteBlockSound, BannerPatterns, BaseColor,
    PotDecorations, Container, BlockState, Bees, Lock, ContainerLoot, BreakSound,
    VillagerVariant, WolfVariant, WolfSoundVariant, WolfCollar, FoxVariant, SalmonSize,
    ParrotVariant, TropicalFishPattern, TropicalFishBaseColor, TropicalFishPatternColor,
    MooshroomVariant, RabbitVariant, PigVariant, CowVariant, ChickenVariant, FrogVariant,
    HorseVariant, PaintingVariant, LlamaVariant, AxolotlVariant, CatVariant, CatCollar,
    SheepColor, ShulkerColor,
];

impl ComponentKind {
    /// Component registry of `version`, or `None` before components existed.
    pub fn table(version: ProtocolVersion) -> Option<&'static [ComponentKind]> {
        use ProtocolVersion as V;
        if version >= V::V1_21_5 {
            Some(V1_21_5_KINDS)
        } else if version >= V::V1_21_2 {
            Some(V1_21_2_KINDS)
        } else if version >= V::V1_21 {
            Some(V1_21_KINDS)
        } else if version >= V::V1_20_5 {
            Some(V1_20_5_KINDS)
        } else {
            None
        }
    }

    pub fn from_id(id: i32, version: ProtocolVersion) -> Option<ComponentKind> {
        let table = Self::table(version)?;
        usize::try_from(id).ok().and_then(|i| table.get(i)).copied()
    }

    pub fn id(self, version: ProtocolVersion) -> Option<i32> {
        Self::table(version)?
            .iter()
            .position(|kind| *kind == self)
            .map(|i| i as i32)
    }
}

/// 1.21.4 form of the custom model data component.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomModelData {
    pub floats: Vec<f32>,
    pub flags: Vec<bool>,
    pub strings: Vec<String>,
    pub colors: Vec<i32>,
}

/// Payload of a component. Which variant a kind uses can depend on the version.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    /// Marker components with no payload.
    Unit,
    Bool(bool),
    Int(i32),
    Identifier(String),
    Nbt(Tag),
    Text(TextComponent),
    TextList(Vec<TextComponent>),
    Unbreakable {
        show_in_tooltip: bool,
    },
    Enchantments {
        levels: Vec<(i32, i32)>,
        show_in_tooltip: bool,
    },
    DyedColor {
        rgb: i32,
        show_in_tooltip: bool,
    },
    ModelData(CustomModelData),
    TooltipDisplay {
        hide_tooltip: bool,
        hidden: Vec<i32>,
    },
    Item(Box<ItemStack>),
    Items(Vec<ItemStack>),
    Container(Vec<Option<ItemStack>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Unit,
    Bool,
    VarInt,
    Int,
    Identifier,
    Nbt,
    Text,
    TextList,
    Unbreakable,
    Enchantments,
    DyedColor,
    ModelData,
    TooltipDisplay,
    Item,
    Items,
    Container,
}

/// Wire shape of `kind` in `version`. `None` for kinds whose payload is not modelled.
fn shape(kind: ComponentKind, version: ProtocolVersion) -> Option<Shape> {
    let shape = match kind {
        CustomData | EntityData | BucketEntityData | BlockEntityData => Shape::Nbt,
        MaxStackSize | MaxDamage | Damage | RepairCost | MapId | OminousBottleAmplifier
        | Rarity | MapPostProcessing | BaseColor | Enchantable => Shape::VarInt,
        MapColor => Shape::Int,
        Unbreakable if version >= ProtocolVersion::V1_21_5 => Shape::Unit,
        Unbreakable => Shape::Unbreakable,
        CustomName | ItemName => Shape::Text,
        Lore => Shape::TextList,
        Enchantments | StoredEnchantments => Shape::Enchantments,
        CustomModelData if version >= ProtocolVersion::V1_21_4 => Shape::ModelData,
        CustomModelData => Shape::VarInt,
        HideAdditionalTooltip | HideTooltip | CreativeSlotLock | IntangibleProjectile
        | FireResistant | Glider => Shape::Unit,
        TooltipDisplay => Shape::TooltipDisplay,
        EnchantmentGlintOverride => Shape::Bool,
        DyedColor => Shape::DyedColor,
        ChargedProjectiles | BundleContents => Shape::Items,
        Container => Shape::Container,
        UseRemainder => Shape::Item,
        NoteBlockSound | ItemModel | TooltipStyle | DamageResistant => Shape::Identifier,
        WolfCollar | FoxVariant | SalmonSize | ParrotVariant | TropicalFishPattern
        | TropicalFishBaseColor | TropicalFishPatternColor | MooshroomVariant | RabbitVariant
        | HorseVariant | LlamaVariant | AxolotlVariant | CatCollar | SheepColor | ShulkerColor => {
            Shape::VarInt
        }
        _ => return None,
    };
    Some(shape)
}

fn has_tooltip_flag(version: ProtocolVersion) -> bool {
    version < ProtocolVersion::V1_21_5
}

fn read_required_item(
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
    items: &dyn Codec<Option<ItemStack>>,
) -> Result<ItemStack> {
    items
        .decode(buf, version)?
        .ok_or_else(|| ProtocolError::invalid("empty item stack where one is required"))
}

fn read_value(
    shape: Shape,
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
    items: &dyn Codec<Option<ItemStack>>,
) -> Result<ComponentValue> {
    let value = match shape {
        Shape::Unit => ComponentValue::Unit,
        Shape::Bool => ComponentValue::Bool(buf.read_bool()?),
        Shape::VarInt => ComponentValue::Int(buf.read_varint()?),
        Shape::Int => ComponentValue::Int(buf.read_i32()?),
        Shape::Identifier => ComponentValue::Identifier(buf.read_string()?),
        Shape::Nbt => ComponentValue::Nbt(
            buf.read_nbt(version)?
                .ok_or_else(|| ProtocolError::invalid("component NBT is missing"))?,
        ),
        Shape::Text => ComponentValue::Text(TEXT.decode(buf, version)?),
        Shape::TextList => {
            let count = buf.read_length(MAX_LORE_LINES)?;
            let mut lines = Vec::with_capacity(count);
            for _ in 0..count {
                lines.push(TEXT.decode(buf, version)?);
            }
            ComponentValue::TextList(lines)
        }
        Shape::Unbreakable => ComponentValue::Unbreakable {
            show_in_tooltip: buf.read_bool()?,
        },
        Shape::Enchantments => {
            let count = buf.read_length(MAX_LIST)?;
            let mut levels = Vec::with_capacity(count);
            for _ in 0..count {
                levels.push((buf.read_varint()?, buf.read_varint()?));
            }
            let show_in_tooltip = if has_tooltip_flag(version) {
                buf.read_bool()?
            } else {
                true
            };
            ComponentValue::Enchantments {
                levels,
                show_in_tooltip,
            }
        }
        Shape::DyedColor => {
            let rgb = buf.read_i32()?;
            let show_in_tooltip = if has_tooltip_flag(version) {
                buf.read_bool()?
            } else {
                true
            };
            ComponentValue::DyedColor {
                rgb,
                show_in_tooltip,
            }
        }
        Shape::ModelData => {
            let mut data = CustomModelData::default();
            for _ in 0..buf.read_length(MAX_LIST)? {
                data.floats.push(buf.read_f32()?);
            }
            for _ in 0..buf.read_length(MAX_LIST)? {
                data.flags.push(buf.read_bool()?);
            }
            for _ in 0..buf.read_length(MAX_LIST)? {
                data.strings.push(buf.read_string()?);
            }
            for _ in 0..buf.read_length(MAX_LIST)? {
                data.colors.push(buf.read_i32()?);
            }
            ComponentValue::ModelData(data)
        }
        Shape::TooltipDisplay => {
            let hide_tooltip = buf.read_bool()?;
            let count = buf.read_length(MAX_COMPONENTS)?;
            let mut hidden = Vec::with_capacity(count);
            for _ in 0..count {
                hidden.push(buf.read_varint()?);
            }
            ComponentValue::TooltipDisplay {
                hide_tooltip,
                hidden,
            }
        }
        Shape::Item => ComponentValue::Item(Box::new(read_required_item(buf, version, items)?)),
        Shape::Items => {
            let count = buf.read_length(MAX_LIST)?;
            let mut stacks = Vec::with_capacity(count);
            for _ in 0..count {
                stacks.push(read_required_item(buf, version, items)?);
            }
            ComponentValue::Items(stacks)
        }
        Shape::Container => {
            let count = buf.read_length(MAX_CONTAINER_SLOTS)?;
            let mut slots = Vec::with_capacity(count);
            for _ in 0..count {
                slots.push(items.decode(buf, version)?);
            }
            ComponentValue::Container(slots)
        }
    };
    Ok(value)
}

fn write_value(
    kind: ComponentKind,
    shape: Shape,
    value: &ComponentValue,
    buf: &mut PacketBuffer,
    version: ProtocolVersion,
    items: &dyn Codec<Option<ItemStack>>,
) -> Result<()> {
    match (shape, value) {
        (Shape::Unit, ComponentValue::Unit) => {}
        // Unbreakable lost its tooltip flag in 1.21.5.
        (Shape::Unit, ComponentValue::Unbreakable { .. }) if kind == Unbreakable => {}
        (Shape::Bool, ComponentValue::Bool(v)) => buf.write_bool(*v),
        (Shape::VarInt, ComponentValue::Int(v)) => buf.write_varint(*v),
        (Shape::Int, ComponentValue::Int(v)) => buf.write_i32(*v),
        (Shape::Identifier, ComponentValue::Identifier(v)) => buf.write_string(v)?,
        (Shape::Nbt, ComponentValue::Nbt(tag)) => buf.write_nbt(Some(tag), version)?,
        (Shape::Text, ComponentValue::Text(text)) => TEXT.encode(text, buf, version)?,
        (Shape::TextList, ComponentValue::TextList(lines)) => {
            buf.write_length(lines.len(), MAX_LORE_LINES)?;
            for line in lines {
                TEXT.encode(line, buf, version)?;
            }
        }
        (Shape::Unbreakable, ComponentValue::Unbreakable { show_in_tooltip }) => {
            buf.write_bool(*show_in_tooltip)
        }
        (Shape::Unbreakable, ComponentValue::Unit) => buf.write_bool(true),
        (
            Shape::Enchantments,
            ComponentValue::Enchantments {
                levels,
                show_in_tooltip,
            },
        ) => {
            buf.write_length(levels.len(), MAX_LIST)?;
            for (id, level) in levels {
                buf.write_varint(*id);
                buf.write_varint(*level);
            }
            if has_tooltip_flag(version) {
                buf.write_bool(*show_in_tooltip);
            }
        }
        (
            Shape::DyedColor,
            ComponentValue::DyedColor {
                rgb,
                show_in_tooltip,
            },
        ) => {
            buf.write_i32(*rgb);
            if has_tooltip_flag(version) {
                buf.write_bool(*show_in_tooltip);
            }
        }
        (Shape::ModelData, ComponentValue::ModelData(data)) => {
            buf.write_length(data.floats.len(), MAX_LIST)?;
            for v in &data.floats {
                buf.write_f32(*v);
            }
            buf.write_length(data.flags.len(), MAX_LIST)?;
            for v in &data.flags {
                buf.write_bool(*v);
            }
            buf.write_length(data.strings.len(), MAX_LIST)?;
            for v in &data.strings {
                buf.write_string(v)?;
            }
            buf.write_length(data.colors.len(), MAX_LIST)?;
            for v in &data.colors {
                buf.write_i32(*v);
            }
        }
        (
            Shape::TooltipDisplay,
            ComponentValue::TooltipDisplay {
                hide_tooltip,
                hidden,
            },
        ) => {
            buf.write_bool(*hide_tooltip);
            buf.write_length(hidden.len(), MAX_COMPONENTS)?;
            for id in hidden {
                buf.write_varint(*id);
            }
        }
        (Shape::Item, ComponentValue::Item(stack)) => {
            items.encode(&Some(stack.as_ref().clone()), buf, version)?
        }
        (Shape::Items, ComponentValue::Items(stacks)) => {
            buf.write_length(stacks.len(), MAX_LIST)?;
            for stack in stacks {
                items.encode(&Some(stack.clone()), buf, version)?;
            }
        }
        (Shape::Container, ComponentValue::Container(slots)) => {
            buf.write_length(slots.len(), MAX_CONTAINER_SLOTS)?;
            for slot in slots {
                items.encode(slot, buf, version)?;
            }
        }
        _ => {
            return Err(ProtocolError::UnsupportedValue {
                domain: "data component",
                kind: format!("{:?} as {:?}", kind, value),
                version,
            })
        }
    }
    Ok(())
}

/// Added/changed and removed components of one stack.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentPatch {
    pub added: Vec<(ComponentKind, ComponentValue)>,
    pub removed: Vec<ComponentKind>,
}

impl ComponentPatch {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn get(&self, kind: ComponentKind) -> Option<&ComponentValue> {
        self.added.iter().find(|(k, _)| *k == kind).map(|(_, v)| v)
    }

    fn check_unique(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.added.len() + self.removed.len());
        let kinds = self.added.iter().map(|(kind, _)| kind).chain(self.removed.iter());
        for kind in kinds {
            if !seen.insert(*kind) {
                return Err(ProtocolError::invalid(format!(
                    "component {:?} appears twice in one patch",
                    kind
                )));
            }
        }
        Ok(())
    }

    fn kind_for(id: i32, version: ProtocolVersion) -> Result<ComponentKind> {
        ComponentKind::from_id(id, version).ok_or(ProtocolError::UnknownVariant {
            domain: "data component",
            tag: id,
            version,
        })
    }

    fn id_for(kind: ComponentKind, version: ProtocolVersion) -> Result<i32> {
        kind.id(version).ok_or_else(|| ProtocolError::UnsupportedValue {
            domain: "data component",
            kind: format!("{:?}", kind),
            version,
        })
    }

    /// Reads `(added count, removed count)`, the added entries with payloads, then the removed ids.
    pub fn read(
        buf: &mut PacketBuffer,
        version: ProtocolVersion,
        items: &dyn Codec<Option<ItemStack>>,
    ) -> Result<ComponentPatch> {
        let added_count = buf.read_length(MAX_COMPONENTS)?;
        let removed_count = buf.read_length(MAX_COMPONENTS)?;
        let mut patch = ComponentPatch {
            added: Vec::with_capacity(added_count),
            removed: Vec::with_capacity(removed_count),
        };
        for _ in 0..added_count {
            let id = buf.read_varint()?;
            let kind = Self::kind_for(id, version)?;
            let shape = shape(kind, version).ok_or(ProtocolError::UnknownVariant {
                domain: "data component",
                tag: id,
                version,
            })?;
            patch.added.push((kind, read_value(shape, buf, version, items)?));
        }
        for _ in 0..removed_count {
            let id = buf.read_varint()?;
            patch.removed.push(Self::kind_for(id, version)?);
        }
        patch.check_unique()?;
        Ok(patch)
    }

    pub fn write(
        &self,
        buf: &mut PacketBuffer,
        version: ProtocolVersion,
        items: &dyn Codec<Option<ItemStack>>,
    ) -> Result<()> {
        self.check_unique()?;
        buf.write_length(self.added.len(), MAX_COMPONENTS)?;
        buf.write_length(self.removed.len(), MAX_COMPONENTS)?;
        for (kind, value) in &self.added {
            let id = Self::id_for(*kind, version)?;
            let shape = shape(*kind, version).ok_or_else(|| ProtocolError::UnsupportedValue {
                domain: "data component",
                kind: format!("{:?}", kind),
                version,
            })?;
            buf.write_varint(id);
            write_value(*kind, shape, value, buf, version, items)?;
        }
        for kind in &self.removed {
            buf.write_varint(Self::id_for(*kind, version)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::slot;
    use assert_matches::assert_matches;
    use ProtocolVersion::*;

    fn encode(patch: &ComponentPatch, version: ProtocolVersion) -> Result<Vec<u8>> {
        let mut buf = PacketBuffer::new();
        patch.write(&mut buf, version, slot().as_ref())?;
        Ok(buf.into_inner())
    }

    fn decode(bytes: &[u8], version: ProtocolVersion) -> Result<ComponentPatch> {
        let mut buf = PacketBuffer::from_bytes(bytes.to_vec());
        ComponentPatch::read(&mut buf, version, slot().as_ref())
    }

    #[test]
    fn test_empty_patch_writes_two_zeros() {
        for version in [V1_20_5, V1_21, V1_21_2, V1_21_4, V1_21_5] {
            assert_eq!(encode(&ComponentPatch::default(), version).unwrap(), vec![0, 0]);
        }
    }

    #[test]
    fn test_ids_follow_epoch_table() {
        assert_eq!(ItemModel.id(V1_21), None);
        assert_eq!(ItemModel.id(V1_21_2), Some(7));
        assert_eq!(Lore.id(V1_21), Some(7));
        assert_eq!(Lore.id(V1_21_2), Some(8));
        assert_eq!(JukeboxPlayable.id(V1_20_5), None);
        assert_eq!(Recipes.id(V1_20_5), Some(42));
        assert_eq!(Recipes.id(V1_21), Some(43));
        assert_eq!(ComponentKind::from_id(15, V1_21_5), Some(TooltipDisplay));
        assert_eq!(ComponentKind::table(V1_20_3), None);
        assert_eq!(
            ComponentKind::table(V1_21_4).map(|t| t.len()),
            ComponentKind::table(V1_21_2).map(|t| t.len())
        );
    }

    #[test]
    fn test_added_then_removed() {
        let patch = ComponentPatch {
            added: vec![(MaxStackSize, ComponentValue::Int(16))],
            removed: vec![Food],
        };
        let bytes = encode(&patch, V1_20_5).unwrap();
        assert_eq!(bytes, vec![1, 1, 1, 16, 20]);
        assert_eq!(decode(&bytes, V1_20_5).unwrap(), patch);
    }

    #[test]
    fn test_tooltip_flag_dropped_in_1_21_5() {
        let patch = ComponentPatch {
            added: vec![(
                DyedColor,
                ComponentValue::DyedColor {
                    rgb: 0x00FF00,
                    show_in_tooltip: true,
                },
            )],
            removed: vec![],
        };
        let old = encode(&patch, V1_21_4).unwrap();
        let new = encode(&patch, V1_21_5).unwrap();
        assert_eq!(old.len(), new.len() + 1);
        assert_eq!(decode(&new, V1_21_5).unwrap(), patch);
    }

    #[test]
    fn test_custom_model_data_by_version() {
        let legacy = ComponentPatch {
            added: vec![(CustomModelData, ComponentValue::Int(5))],
            removed: vec![],
        };
        assert_eq!(decode(&encode(&legacy, V1_21_2).unwrap(), V1_21_2).unwrap(), legacy);
        assert_matches!(
            encode(&legacy, V1_21_4),
            Err(ProtocolError::UnsupportedValue { .. })
        );

        let modern = ComponentPatch {
            added: vec![(
                CustomModelData,
                ComponentValue::ModelData(super::CustomModelData {
                    floats: vec![1.5],
                    flags: vec![true, false],
                    strings: vec!["a".into()],
                    colors: vec![7],
                }),
            )],
            removed: vec![],
        };
        assert_eq!(decode(&encode(&modern, V1_21_4).unwrap(), V1_21_4).unwrap(), modern);
    }

    #[test]
    fn test_duplicates_rejected() {
        let patch = ComponentPatch {
            added: vec![(Glider, ComponentValue::Unit)],
            removed: vec![Glider],
        };
        assert_matches!(encode(&patch, V1_21_2), Err(ProtocolError::InvalidData(_)));
        // MaxStackSize twice
        assert_matches!(decode(&[2, 0, 1, 1, 1, 2], V1_20_5), Err(ProtocolError::InvalidData(_)));
    }

    #[test]
    fn test_unknown_component_id() {
        assert_matches!(
            decode(&[1, 0, 120, 0], V1_20_5),
            Err(ProtocolError::UnknownVariant { tag: 120, .. })
        );
        let food = Food.id(V1_20_5).unwrap() as u8;
        assert_matches!(
            decode(&[1, 0, food, 0], V1_20_5),
            Err(ProtocolError::UnknownVariant { domain: "data component", .. })
        );
    }

    #[test]
    fn test_kind_missing_from_epoch() {
        let patch = ComponentPatch {
            added: vec![(Glider, ComponentValue::Unit)],
            removed: vec![],
        };
        assert_matches!(
            encode(&patch, V1_21),
            Err(ProtocolError::UnsupportedValue { .. })
        );
    }
}
