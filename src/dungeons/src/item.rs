//! Items, enchantments and armor properties.
//!
//! An [`Item`] mirrors one entry of the save's `items` or `storageChestItems`
//! arrays. Values the game derives (invested points, glided state, in-game
//! power) are recomputed on read, and catalog lookups happen only when a
//! derived value actually needs them.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError, ItemInfo, ItemKind, Localization};
use crate::fields::{self, FieldError};
use crate::formulas;

/// Number of ordinary enchantment slots (three groups of three)
pub const ENCHANTMENT_SLOTS: usize = 9;

/// Slots per enchantment group
pub const SLOTS_PER_GROUP: usize = 3;

/// Id the game writes for an empty enchantment slot
pub const UNSET_ID: &str = "Unset";

#[derive(Error, Debug)]
pub enum ItemError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Enchantment slot {0} out of range (0-8)")]
    SlotOutOfRange(usize),

    #[error("Enchantment level {0} out of range (0-3)")]
    LevelOutOfRange(u8),

    #[error("Enchantment slot is empty")]
    EmptySlot,

    #[error("Enchantment id must not be empty or \"Unset\"")]
    InvalidEnchantmentId,
}

/// Identity of an item within one loaded document.
///
/// Ids are assigned by the document and never written to the save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) u64);

impl ItemId {
    /// Placeholder carried by items not yet owned by a document
    pub const UNASSIGNED: ItemId = ItemId(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Unique,
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => write!(f, "Common"),
            Self::Rare => write!(f, "Rare"),
            Self::Unique => write!(f, "Unique"),
        }
    }
}

impl std::str::FromStr for Rarity {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "common" => Ok(Self::Common),
            "rare" => Ok(Self::Rare),
            "unique" => Ok(Self::Unique),
            _ => Err(format!("Unknown rarity: {}", s)),
        }
    }
}

/// Rarity of an armor property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyRarity {
    Common,
    Unique,
}

/// Where an equipped item sits on the character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    MeleeGear,
    ArmorGear,
    RangedGear,
    HotbarSlot1,
    HotbarSlot2,
    HotbarSlot3,
}

impl EquipmentSlot {
    pub const GEAR: [EquipmentSlot; 3] = [Self::MeleeGear, Self::ArmorGear, Self::RangedGear];

    pub const ARTIFACTS: [EquipmentSlot; 3] =
        [Self::HotbarSlot1, Self::HotbarSlot2, Self::HotbarSlot3];

    pub const ALL: [EquipmentSlot; 6] = [
        Self::MeleeGear,
        Self::ArmorGear,
        Self::RangedGear,
        Self::HotbarSlot1,
        Self::HotbarSlot2,
        Self::HotbarSlot3,
    ];

    pub fn is_artifact(self) -> bool {
        Self::ARTIFACTS.contains(&self)
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MeleeGear => "MeleeGear",
            Self::ArmorGear => "ArmorGear",
            Self::RangedGear => "RangedGear",
            Self::HotbarSlot1 => "HotbarSlot1",
            Self::HotbarSlot2 => "HotbarSlot2",
            Self::HotbarSlot3 => "HotbarSlot3",
        };
        f.write_str(name)
    }
}

/// An enchantment with a real id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enchantment {
    id: String,
    level: u8,
    invested_points: u32,
}

impl Enchantment {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn invested_points(&self) -> u32 {
        self.invested_points
    }
}

/// One enchantment slot: empty, or holding an enchantment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnchantmentSlot {
    #[default]
    Unset,
    Set(Enchantment),
}

impl EnchantmentSlot {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    pub fn enchantment(&self) -> Option<&Enchantment> {
        match self {
            Self::Set(e) => Some(e),
            Self::Unset => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.enchantment().map(Enchantment::id)
    }

    pub fn level(&self) -> u8 {
        self.enchantment().map_or(0, Enchantment::level)
    }

    pub fn invested_points(&self) -> u32 {
        self.enchantment().map_or(0, Enchantment::invested_points)
    }
}

/// Wire form of an enchantment slot
#[derive(Serialize, Deserialize)]
struct RawEnchantment {
    id: String,
    #[serde(rename = "investedPoints", default)]
    invested_points: u32,
    #[serde(default)]
    level: u8,
}

impl Serialize for EnchantmentSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = match self {
            Self::Unset => RawEnchantment {
                id: UNSET_ID.to_string(),
                invested_points: 0,
                level: 0,
            },
            Self::Set(e) => RawEnchantment {
                id: e.id.clone(),
                invested_points: e.invested_points,
                level: e.level,
            },
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EnchantmentSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnchantment::deserialize(deserializer)?;
        if raw.id == UNSET_ID || raw.id.is_empty() {
            return Ok(Self::Unset);
        }
        Ok(Self::Set(Enchantment {
            id: raw.id,
            level: raw.level,
            invested_points: raw.invested_points,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorProperty {
    pub id: String,
    pub rarity: PropertyRarity,
}

/// Keys of an item entry that [`ItemRecord`] models
const ITEM_FIELDS: &[&str] = &[
    "type",
    "power",
    "rarity",
    "upgraded",
    "inventoryIndex",
    "equipmentSlot",
    "enchantments",
    "netheriteEnchant",
    "armorproperties",
    "modified",
    "timesmodified",
    "markedNew",
];

/// Wire form of the modeled part of an item
#[derive(Serialize, Deserialize)]
struct ItemRecord {
    #[serde(rename = "type")]
    item_type: String,
    power: f64,
    rarity: Rarity,
    upgraded: bool,
    #[serde(
        rename = "inventoryIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    inventory_index: Option<u32>,
    #[serde(
        rename = "equipmentSlot",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    equipment_slot: Option<EquipmentSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enchantments: Option<Vec<EnchantmentSlot>>,
    #[serde(
        rename = "netheriteEnchant",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    netherite_enchant: Option<EnchantmentSlot>,
    #[serde(
        rename = "armorproperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    armor_properties: Option<Vec<ArmorProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified: Option<bool>,
    #[serde(
        rename = "timesmodified",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    times_modified: Option<u32>,
    #[serde(rename = "markedNew", default, skip_serializing_if = "Option::is_none")]
    marked_new: Option<bool>,
}

/// A single piece of gear or artifact
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    id: ItemId,
    item_type: String,
    power: f64,
    rarity: Rarity,
    upgraded: bool,
    inventory_index: Option<u32>,
    equipment_slot: Option<EquipmentSlot>,
    enchantments: [EnchantmentSlot; ENCHANTMENT_SLOTS],
    /// Whether the `enchantments` key is written even when every slot is empty
    enchantments_listed: bool,
    netherite_enchant: Option<EnchantmentSlot>,
    armor_properties: Option<Vec<ArmorProperty>>,
    modified: Option<bool>,
    times_modified: Option<u32>,
    marked_new: Option<bool>,
    extra: Map<String, Value>,
}

impl Item {
    /// Build an item from one entry of a save's item array
    ///
    /// Keys the item does not model are kept verbatim and written back on
    /// export. The error names the failing field relative to the entry.
    pub(crate) fn from_object(object: Map<String, Value>) -> Result<Self, FieldError> {
        let (record, extra): (ItemRecord, _) = fields::split_known(object, ITEM_FIELDS)?;

        let enchantments_listed = record.enchantments.is_some();
        let listed = record.enchantments.unwrap_or_default();
        if listed.len() > ENCHANTMENT_SLOTS {
            return Err(FieldError::new(
                "enchantments",
                format!(
                    "item has {} enchantments, at most {} are allowed",
                    listed.len(),
                    ENCHANTMENT_SLOTS
                ),
            ));
        }

        let mut enchantments: [EnchantmentSlot; ENCHANTMENT_SLOTS] = Default::default();
        for (slot, enchantment) in enchantments.iter_mut().zip(listed) {
            *slot = enchantment;
        }

        Ok(Item {
            id: ItemId::UNASSIGNED,
            item_type: record.item_type,
            power: record.power,
            rarity: record.rarity,
            upgraded: record.upgraded,
            inventory_index: record.inventory_index,
            equipment_slot: record.equipment_slot,
            enchantments,
            enchantments_listed,
            netherite_enchant: record.netherite_enchant,
            armor_properties: record.armor_properties,
            modified: record.modified,
            times_modified: record.times_modified,
            marked_new: record.marked_new,
            extra,
        })
    }

    fn record(&self) -> ItemRecord {
        let any_set = self.enchantments.iter().any(EnchantmentSlot::is_set);
        let enchantments =
            (self.enchantments_listed || any_set).then(|| self.enchantments.to_vec());

        ItemRecord {
            item_type: self.item_type.clone(),
            power: self.power,
            rarity: self.rarity,
            upgraded: self.upgraded,
            inventory_index: self.inventory_index,
            equipment_slot: self.equipment_slot,
            enchantments,
            netherite_enchant: self.netherite_enchant.clone(),
            armor_properties: self.armor_properties.clone(),
            modified: self.modified,
            times_modified: self.times_modified,
            marked_new: self.marked_new,
        }
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            #[serde(flatten)]
            record: ItemRecord,
            #[serde(flatten)]
            extra: &'a Map<String, Value>,
        }

        Entry {
            record: self.record(),
            extra: &self.extra,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Item {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::deserialize(deserializer)?;
        Item::from_object(object).map_err(de::Error::custom)
    }
}

impl Item {
    /// Create a fresh, unenchanted item
    pub fn new(item_type: impl Into<String>, power: f64, rarity: Rarity) -> Self {
        Item {
            id: ItemId::UNASSIGNED,
            item_type: item_type.into(),
            power,
            rarity,
            upgraded: false,
            inventory_index: Some(0),
            equipment_slot: None,
            enchantments: Default::default(),
            enchantments_listed: false,
            netherite_enchant: None,
            armor_properties: None,
            modified: None,
            times_modified: None,
            marked_new: Some(true),
            extra: Map::new(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }

    /// Catalog key of the item type
    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// Serialized power as stored in the save
    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn set_power(&mut self, power: f64) {
        self.power = power.max(0.0);
    }

    /// Power as displayed in game
    pub fn in_game_power(&self) -> f64 {
        formulas::to_in_game_power(self.power)
    }

    pub fn set_in_game_power(&mut self, in_game: f64) {
        self.power = formulas::to_serialized_power(in_game);
    }

    pub fn rarity(&self) -> Rarity {
        self.rarity
    }

    pub fn set_rarity(&mut self, rarity: Rarity) {
        self.rarity = rarity;
    }

    pub fn upgraded(&self) -> bool {
        self.upgraded
    }

    pub fn set_upgraded(&mut self, upgraded: bool) {
        self.upgraded = upgraded;
    }

    pub fn inventory_index(&self) -> Option<u32> {
        self.inventory_index
    }

    pub(crate) fn set_inventory_index(&mut self, index: Option<u32>) {
        self.inventory_index = index;
    }

    pub fn equipment_slot(&self) -> Option<EquipmentSlot> {
        self.equipment_slot
    }

    pub fn is_equipped(&self) -> bool {
        self.equipment_slot.is_some()
    }

    pub(crate) fn unequip(&mut self) {
        self.equipment_slot = None;
    }

    pub fn modified(&self) -> bool {
        self.modified.unwrap_or(false)
    }

    pub fn times_modified(&self) -> u32 {
        self.times_modified.unwrap_or(0)
    }

    pub fn marked_new(&self) -> bool {
        self.marked_new.unwrap_or(false)
    }

    pub fn set_marked_new(&mut self, marked_new: bool) {
        self.marked_new = Some(marked_new);
    }

    /// Keys this model does not interpret, re-emitted verbatim
    pub fn extra_fields(&self) -> &Map<String, Value> {
        &self.extra
    }

    // Catalog-derived values

    /// Reference data for this item's type
    pub fn info<'c>(&self, catalog: &'c dyn Catalog) -> Result<&'c ItemInfo, CatalogError> {
        catalog.require_item(&self.item_type)
    }

    pub fn kind(&self, catalog: &dyn Catalog) -> Result<ItemKind, CatalogError> {
        self.info(catalog).map(|info| info.kind)
    }

    pub fn display_name<'a>(
        &self,
        catalog: &'a dyn Catalog,
        localization: &'a dyn Localization,
    ) -> Result<&'a str, CatalogError> {
        let info = self.info(catalog)?;
        Ok(localization.text_or_key(&info.name))
    }

    // Enchantments

    pub fn enchantments(&self) -> &[EnchantmentSlot; ENCHANTMENT_SLOTS] {
        &self.enchantments
    }

    pub fn enchantment(&self, slot: usize) -> Result<&EnchantmentSlot, ItemError> {
        self.enchantments
            .get(slot)
            .ok_or(ItemError::SlotOutOfRange(slot))
    }

    /// Slots of one group (0, 1 or 2)
    pub fn enchantment_group(&self, group: usize) -> Option<&[EnchantmentSlot]> {
        let start = group.checked_mul(SLOTS_PER_GROUP)?;
        self.enchantments.get(start..start + SLOTS_PER_GROUP)
    }

    /// Put `id` at `level` into a slot, computing its invested points
    pub fn set_enchantment(
        &mut self,
        slot: usize,
        id: &str,
        level: u8,
        catalog: &dyn Catalog,
    ) -> Result<(), ItemError> {
        check_slot(slot)?;
        check_level(level)?;
        if id.is_empty() || id == UNSET_ID {
            return Err(ItemError::InvalidEnchantmentId);
        }

        let powerful = catalog.is_powerful(id)?;
        let invested_points = formulas::invested_points(level, powerful, self.is_glided());
        self.enchantments[slot] = EnchantmentSlot::Set(Enchantment {
            id: id.to_string(),
            level,
            invested_points,
        });
        Ok(())
    }

    /// Change the level of a filled slot
    ///
    /// Invested points use the cost table selected by the enchantment's
    /// powerful flag and the item's glided state at the time of the call.
    pub fn set_enchantment_level(
        &mut self,
        slot: usize,
        level: u8,
        catalog: &dyn Catalog,
    ) -> Result<(), ItemError> {
        check_slot(slot)?;
        check_level(level)?;

        let glided = self.is_glided();
        let EnchantmentSlot::Set(enchantment) = &mut self.enchantments[slot] else {
            return Err(ItemError::EmptySlot);
        };

        let powerful = catalog.is_powerful(&enchantment.id)?;
        enchantment.level = level;
        enchantment.invested_points = formulas::invested_points(level, powerful, glided);
        Ok(())
    }

    pub fn clear_enchantment(&mut self, slot: usize) -> Result<(), ItemError> {
        check_slot(slot)?;
        self.enchantments[slot] = EnchantmentSlot::Unset;
        Ok(())
    }

    /// Sum of invested points over the nine ordinary slots
    pub fn total_invested_points(&self) -> u32 {
        self.enchantments
            .iter()
            .map(EnchantmentSlot::invested_points)
            .sum()
    }

    pub fn is_enchanted(&self) -> bool {
        self.total_invested_points() > 0
    }

    // Netherite enchant

    pub fn netherite_enchant(&self) -> Option<&EnchantmentSlot> {
        self.netherite_enchant.as_ref()
    }

    /// Whether the netherite slot holds a real enchantment
    pub fn is_glided(&self) -> bool {
        self.netherite_enchant
            .as_ref()
            .is_some_and(EnchantmentSlot::is_set)
    }

    /// Set the netherite enchant; it never costs invested points
    pub fn set_netherite_enchant(
        &mut self,
        id: &str,
        level: u8,
        catalog: &dyn Catalog,
    ) -> Result<(), ItemError> {
        check_level(level)?;
        if id.is_empty() || id == UNSET_ID {
            return Err(ItemError::InvalidEnchantmentId);
        }
        catalog.require_enchantment(id)?;

        self.netherite_enchant = Some(EnchantmentSlot::Set(Enchantment {
            id: id.to_string(),
            level,
            invested_points: formulas::netherite_invested_points(level),
        }));
        Ok(())
    }

    pub fn set_netherite_level(&mut self, level: u8) -> Result<(), ItemError> {
        check_level(level)?;
        let Some(EnchantmentSlot::Set(enchantment)) = &mut self.netherite_enchant else {
            return Err(ItemError::EmptySlot);
        };
        enchantment.level = level;
        enchantment.invested_points = formulas::netherite_invested_points(level);
        Ok(())
    }

    /// Empty the netherite slot, keeping the key if the save had one
    pub fn clear_netherite_enchant(&mut self) {
        if self.netherite_enchant.is_some() {
            self.netherite_enchant = Some(EnchantmentSlot::Unset);
        }
    }

    // Armor properties

    pub fn armor_properties(&self) -> &[ArmorProperty] {
        self.armor_properties.as_deref().unwrap_or(&[])
    }

    pub fn add_armor_property(
        &mut self,
        id: &str,
        rarity: PropertyRarity,
        catalog: &dyn Catalog,
    ) -> Result<(), ItemError> {
        catalog.require_armor_property(id)?;
        self.armor_properties
            .get_or_insert_with(Vec::new)
            .push(ArmorProperty {
                id: id.to_string(),
                rarity,
            });
        Ok(())
    }

    /// Remove the first property with `id`; returns whether one was removed
    pub fn remove_armor_property(&mut self, id: &str) -> bool {
        let Some(properties) = self.armor_properties.as_mut() else {
            return false;
        };
        match properties.iter().position(|p| p.id == id) {
            Some(pos) => {
                properties.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Copy for duplication.
    ///
    /// Enchantments and armor properties are deep-copied, the copy is
    /// unequipped, marked new, and carries a provisional inventory index
    /// that the collection fixes up on insert.
    pub fn duplicate(&self) -> Item {
        let mut copy = self.clone();
        copy.id = ItemId::UNASSIGNED;
        copy.equipment_slot = None;
        copy.inventory_index = Some(0);
        copy.marked_new = Some(true);
        copy
    }
}

fn check_slot(slot: usize) -> Result<(), ItemError> {
    if slot >= ENCHANTMENT_SLOTS {
        return Err(ItemError::SlotOutOfRange(slot));
    }
    Ok(())
}

fn check_level(level: u8) -> Result<(), ItemError> {
    if level > formulas::MAX_ENCHANTMENT_LEVEL {
        return Err(ItemError::LevelOutOfRange(level));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ReferenceCatalog, StringTable};
    use serde_json::json;

    fn sword_json() -> serde_json::Value {
        json!({
            "type": "Sword",
            "power": 20.0,
            "rarity": "Rare",
            "upgraded": false,
            "inventoryIndex": 4,
            "enchantments": [
                {"id": "Sharpness", "investedPoints": 6, "level": 3},
                {"id": "Unset", "investedPoints": 0, "level": 0},
                {"id": "Unset", "investedPoints": 0, "level": 0},
                {"id": "Exploding", "investedPoints": 2, "level": 1},
                {"id": "Unset", "investedPoints": 0, "level": 0},
                {"id": "Unset", "investedPoints": 0, "level": 0},
                {"id": "Unset", "investedPoints": 0, "level": 0},
                {"id": "Unset", "investedPoints": 0, "level": 0},
                {"id": "Unset", "investedPoints": 0, "level": 0}
            ],
            "giftedBy": "friend"
        })
    }

    fn sword() -> Item {
        serde_json::from_value(sword_json()).unwrap()
    }

    #[test]
    fn test_parse_item() {
        let item = sword();
        assert_eq!(item.item_type(), "Sword");
        assert_eq!(item.rarity(), Rarity::Rare);
        assert_eq!(item.inventory_index(), Some(4));
        assert!(!item.is_equipped());
        assert_eq!(item.enchantment(0).unwrap().id(), Some("Sharpness"));
        assert!(!item.enchantment(1).unwrap().is_set());
        assert_eq!(item.total_invested_points(), 8);
        assert!(item.is_enchanted());
        assert!(!item.is_glided());
    }

    #[test]
    fn test_item_roundtrip_preserves_unknown_fields() {
        let value = serde_json::to_value(sword()).unwrap();
        assert_eq!(value, sword_json());
    }

    #[test]
    fn test_short_enchantment_list_is_padded() {
        let item: Item = serde_json::from_value(json!({
            "type": "Bow", "power": 1.0, "rarity": "Common", "upgraded": false,
            "enchantments": [{"id": "Power", "investedPoints": 1, "level": 1}]
        }))
        .unwrap();
        assert_eq!(item.enchantments().len(), ENCHANTMENT_SLOTS);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["enchantments"].as_array().unwrap().len(), 9);
        assert_eq!(value["enchantments"][8]["id"], "Unset");
    }

    #[test]
    fn test_too_many_enchantments_rejected() {
        let slots = vec![json!({"id": "Unset", "investedPoints": 0, "level": 0}); 10];
        let result: Result<Item, _> = serde_json::from_value(json!({
            "type": "Bow", "power": 1.0, "rarity": "Common", "upgraded": false,
            "enchantments": slots
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let result: Result<Item, _> =
            serde_json::from_value(json!({"type": "Bow", "rarity": "Common", "upgraded": false}));
        assert!(result.is_err());
    }

    #[test]
    fn test_error_names_failing_field() {
        let err = serde_json::from_value::<Item>(json!({
            "type": "Bow", "power": 1.0, "rarity": "Common", "upgraded": false,
            "netheriteEnchant": {"id": "Chains", "investedPoints": 0, "level": -2}
        }))
        .unwrap_err();
        assert!(err.to_string().starts_with("netheriteEnchant.level: "), "{}", err);
    }

    #[test]
    fn test_unknown_numbers_keep_their_text() {
        let text = r#"{"type":"Bow","power":1.50,"rarity":"Common","upgraded":false,"ratio":2.50}"#;
        let item: Item = serde_json::from_str(text).unwrap();
        assert_eq!(item.power(), 1.5);
        assert_eq!(
            serde_json::to_string(&item).unwrap(),
            r#"{"type":"Bow","power":1.5,"rarity":"Common","upgraded":false,"ratio":2.50}"#
        );
    }

    #[test]
    fn test_artifact_without_enchantments_stays_without() {
        let original = json!({
            "type": "BootsOfSwiftness", "power": 3.0, "rarity": "Common",
            "upgraded": false, "equipmentSlot": "HotbarSlot1"
        });
        let item: Item = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(item.equipment_slot(), Some(EquipmentSlot::HotbarSlot1));
        assert_eq!(serde_json::to_value(&item).unwrap(), original);
    }

    #[test]
    fn test_set_enchantment_level_recomputes_points() {
        let catalog = ReferenceCatalog::builtin();
        let mut item = sword();

        item.set_enchantment_level(3, 3, &catalog).unwrap();
        // powerful, not glided
        assert_eq!(item.enchantment(3).unwrap().invested_points(), 9);

        item.set_enchantment_level(0, 1, &catalog).unwrap();
        assert_eq!(item.enchantment(0).unwrap().invested_points(), 1);
    }

    #[test]
    fn test_glided_state_read_at_call_time() {
        let catalog = ReferenceCatalog::builtin();
        let mut item = sword();

        item.set_netherite_enchant("Leeching", 2, &catalog).unwrap();
        assert!(item.is_glided());
        assert_eq!(item.netherite_enchant().unwrap().invested_points(), 0);

        // existing points are not recomputed until the level is touched
        assert_eq!(item.enchantment(0).unwrap().invested_points(), 6);
        item.set_enchantment_level(0, 3, &catalog).unwrap();
        assert_eq!(item.enchantment(0).unwrap().invested_points(), 9);
        item.set_enchantment_level(3, 3, &catalog).unwrap();
        assert_eq!(item.enchantment(3).unwrap().invested_points(), 12);

        item.clear_netherite_enchant();
        assert!(!item.is_glided());
        assert!(item.netherite_enchant().is_some());
        item.set_enchantment_level(0, 3, &catalog).unwrap();
        assert_eq!(item.enchantment(0).unwrap().invested_points(), 6);
    }

    #[test]
    fn test_unset_netherite_is_not_glided() {
        let mut value = sword_json();
        value["netheriteEnchant"] = json!({"id": "Unset", "investedPoints": 0, "level": 0});
        let item: Item = serde_json::from_value(value.clone()).unwrap();
        assert!(!item.is_glided());
        assert_eq!(serde_json::to_value(&item).unwrap(), value);
    }

    #[test]
    fn test_netherite_level_is_free() {
        let catalog = ReferenceCatalog::builtin();
        let mut item = sword();
        assert!(matches!(item.set_netherite_level(1), Err(ItemError::EmptySlot)));
        item.set_netherite_enchant("Chains", 1, &catalog).unwrap();
        item.set_netherite_level(3).unwrap();
        assert_eq!(item.netherite_enchant().unwrap().level(), 3);
        assert_eq!(item.netherite_enchant().unwrap().invested_points(), 0);
    }

    #[test]
    fn test_enchantment_errors() {
        let catalog = ReferenceCatalog::builtin();
        let mut item = sword();

        assert!(matches!(
            item.set_enchantment_level(9, 1, &catalog),
            Err(ItemError::SlotOutOfRange(9))
        ));
        assert!(matches!(
            item.set_enchantment_level(0, 4, &catalog),
            Err(ItemError::LevelOutOfRange(4))
        ));
        assert!(matches!(
            item.set_enchantment_level(1, 1, &catalog),
            Err(ItemError::EmptySlot)
        ));
        assert!(matches!(
            item.set_enchantment(1, "Unset", 1, &catalog),
            Err(ItemError::InvalidEnchantmentId)
        ));
        assert!(matches!(
            item.set_enchantment(1, "Bogus", 1, &catalog),
            Err(ItemError::Catalog(CatalogError::UnknownEnchantment(_)))
        ));
    }

    #[test]
    fn test_set_and_clear_enchantment() {
        let catalog = ReferenceCatalog::builtin();
        let mut item = Item::new("Axe", 5.0, Rarity::Common);
        assert!(!item.is_enchanted());

        item.set_enchantment(4, "Chains", 2, &catalog).unwrap();
        assert_eq!(item.total_invested_points(), 3);
        assert_eq!(item.enchantment_group(1).unwrap()[1].id(), Some("Chains"));

        item.clear_enchantment(4).unwrap();
        assert!(!item.is_enchanted());
        assert!(item.enchantment_group(3).is_none());
    }

    #[test]
    fn test_unknown_type_fails_only_when_read() {
        let catalog = ReferenceCatalog::builtin();
        let item = Item::new("MysteryBlade", 5.0, Rarity::Common);
        assert_eq!(item.total_invested_points(), 0);
        assert!(matches!(
            item.kind(&catalog),
            Err(CatalogError::UnknownItem(_))
        ));
    }

    #[test]
    fn test_display_name_uses_localization() {
        let catalog = ReferenceCatalog::builtin();
        let mut strings = StringTable::new();
        strings.insert("Sword", "Iron Sword");
        assert_eq!(sword().display_name(&catalog, &strings).unwrap(), "Iron Sword");
        assert_eq!(sword().kind(&catalog).unwrap(), ItemKind::Melee);
    }

    #[test]
    fn test_armor_properties() {
        let catalog = ReferenceCatalog::builtin();
        let mut armor = Item::new("ScaleMail", 10.0, Rarity::Rare);
        assert!(armor.armor_properties().is_empty());

        armor
            .add_armor_property("AreaHeal", PropertyRarity::Common, &catalog)
            .unwrap();
        armor
            .add_armor_property("SoulGathering", PropertyRarity::Unique, &catalog)
            .unwrap();
        assert!(armor
            .add_armor_property("Bogus", PropertyRarity::Common, &catalog)
            .is_err());
        assert_eq!(armor.armor_properties().len(), 2);

        assert!(armor.remove_armor_property("AreaHeal"));
        assert!(!armor.remove_armor_property("AreaHeal"));
        assert_eq!(armor.armor_properties()[0].rarity, PropertyRarity::Unique);

        let value = serde_json::to_value(&armor).unwrap();
        assert_eq!(value["armorproperties"][0]["id"], "SoulGathering");
        assert_eq!(value["armorproperties"][0]["rarity"], "Unique");
    }

    #[test]
    fn test_duplicate() {
        let mut original: Item = serde_json::from_value(json!({
            "type": "Sword", "power": 20.0, "rarity": "Rare", "upgraded": true,
            "equipmentSlot": "MeleeGear", "markedNew": false
        }))
        .unwrap();
        original.set_id(ItemId(7));

        let copy = original.duplicate();
        assert_eq!(copy.id(), ItemId::UNASSIGNED);
        assert_eq!(copy.equipment_slot(), None);
        assert_eq!(copy.inventory_index(), Some(0));
        assert!(copy.marked_new());
        assert!(copy.upgraded());
        assert_eq!(original.equipment_slot(), Some(EquipmentSlot::MeleeGear));
    }

    #[test]
    fn test_duplicate_is_deep() {
        let catalog = ReferenceCatalog::builtin();
        let original = sword();
        let mut copy = original.duplicate();
        copy.set_enchantment_level(0, 1, &catalog).unwrap();
        assert_eq!(original.enchantment(0).unwrap().level(), 3);
        assert_eq!(copy.enchantment(0).unwrap().level(), 1);
    }

    #[test]
    fn test_power_accessors() {
        let mut item = Item::new("Bow", 20.0, Rarity::Common);
        assert_eq!(item.in_game_power(), 191.0);
        item.set_in_game_power(201.0);
        assert_eq!(item.power(), 21.0);
    }

    #[test]
    fn test_rarity_from_str() {
        assert_eq!("unique".parse::<Rarity>(), Ok(Rarity::Unique));
        assert!("legendary".parse::<Rarity>().is_err());
    }
}
