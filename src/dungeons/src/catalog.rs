//! Reference data for items, enchantments and armor properties
//!
//! The editor never reads game assets itself. Display metadata and the
//! "powerful" enchantment flag come from a [`Catalog`] passed in by the
//! caller; lookups happen lazily, when a derived value is first needed.
//! [`ReferenceCatalog`] is a data-driven implementation with a built-in table
//! and YAML/JSON loaders for a complete one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Unknown item type: {0}")]
    UnknownItem(String),

    #[error("Unknown enchantment: {0}")]
    UnknownEnchantment(String),

    #[error("Unknown armor property: {0}")]
    UnknownArmorProperty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// Equipment category of an item type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Melee,
    Armor,
    Ranged,
    Artifact,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Melee => write!(f, "melee"),
            Self::Armor => write!(f, "armor"),
            Self::Ranged => write!(f, "ranged"),
            Self::Artifact => write!(f, "artifact"),
        }
    }
}

/// Display metadata for an item type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub kind: ItemKind,
    /// Localization key, also used as the fallback display text
    pub name: String,
    #[serde(default)]
    pub flavor: Option<String>,
    /// Opaque icon handle resolved by the front-end
    #[serde(default)]
    pub icon: Option<String>,
    /// Unique items always carry unique armor properties
    #[serde(default)]
    pub unique: bool,
}

/// Display metadata for an enchantment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnchantmentInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Powerful enchantments use the steeper cost tables
    #[serde(default)]
    pub powerful: bool,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Display metadata for an armor property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorPropertyInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Read-only lookup of reference data by identifier
pub trait Catalog {
    fn item(&self, item_type: &str) -> Option<&ItemInfo>;

    fn enchantment(&self, id: &str) -> Option<&EnchantmentInfo>;

    fn armor_property(&self, id: &str) -> Option<&ArmorPropertyInfo>;

    /// Like [`Catalog::item`], but an unknown type is an error
    fn require_item(&self, item_type: &str) -> Result<&ItemInfo, CatalogError> {
        self.item(item_type)
            .ok_or_else(|| CatalogError::UnknownItem(item_type.to_string()))
    }

    /// Like [`Catalog::enchantment`], but an unknown id is an error
    fn require_enchantment(&self, id: &str) -> Result<&EnchantmentInfo, CatalogError> {
        self.enchantment(id)
            .ok_or_else(|| CatalogError::UnknownEnchantment(id.to_string()))
    }

    /// Like [`Catalog::armor_property`], but an unknown id is an error
    fn require_armor_property(&self, id: &str) -> Result<&ArmorPropertyInfo, CatalogError> {
        self.armor_property(id)
            .ok_or_else(|| CatalogError::UnknownArmorProperty(id.to_string()))
    }

    /// Whether an enchantment uses the powerful cost tables
    fn is_powerful(&self, id: &str) -> Result<bool, CatalogError> {
        self.require_enchantment(id).map(|e| e.powerful)
    }
}

/// Text lookup for localization keys
pub trait Localization {
    fn text(&self, key: &str) -> Option<&str>;

    /// Localized text, or the key itself when no translation exists
    fn text_or_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.text(key).unwrap_or(key)
    }
}

/// Localization backed by a flat key/text map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StringTable {
    entries: HashMap<String, String>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a flat JSON object of key/text pairs
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(key.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Localization for StringTable {
    fn text(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Catalog built from in-memory tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    #[serde(default)]
    pub items: HashMap<String, ItemInfo>,
    #[serde(default)]
    pub enchantments: HashMap<String, EnchantmentInfo>,
    #[serde(default)]
    pub armor_properties: HashMap<String, ArmorPropertyInfo>,
}

// (type key, kind, unique)
const BUILTIN_ITEMS: &[(&str, ItemKind, bool)] = &[
    ("Sword", ItemKind::Melee, false),
    ("Axe", ItemKind::Melee, false),
    ("Claymore", ItemKind::Melee, false),
    ("Katana", ItemKind::Melee, false),
    ("Daggers", ItemKind::Melee, false),
    ("Glaive", ItemKind::Melee, false),
    ("Mace", ItemKind::Melee, false),
    ("Spear", ItemKind::Melee, false),
    ("Sickles", ItemKind::Melee, false),
    ("Hammer_Unique1", ItemKind::Melee, true),
    ("ArchersStrappings", ItemKind::Armor, false),
    ("ChampionsArmor", ItemKind::Armor, false),
    ("EvocationRobe", ItemKind::Armor, false),
    ("MercenaryArmor", ItemKind::Armor, false),
    ("ScaleMail", ItemKind::Armor, false),
    ("HuntersArmor", ItemKind::Armor, false),
    ("ScaleMail_Unique1", ItemKind::Armor, true),
    ("Bow", ItemKind::Ranged, false),
    ("Crossbow", ItemKind::Ranged, false),
    ("LongBow", ItemKind::Ranged, false),
    ("ShortBow", ItemKind::Ranged, false),
    ("PowerBow", ItemKind::Ranged, false),
    ("TrickBow", ItemKind::Ranged, false),
    ("Crossbow_Unique1", ItemKind::Ranged, true),
    ("TotemOfRegeneration", ItemKind::Artifact, false),
    ("FireworksArrowItem", ItemKind::Artifact, false),
    ("BootsOfSwiftness", ItemKind::Artifact, false),
    ("DeathCapMushroom", ItemKind::Artifact, false),
    ("IronHideAmulet", ItemKind::Artifact, false),
    ("HarvesterItem", ItemKind::Artifact, false),
];

// (id, powerful)
const BUILTIN_ENCHANTMENTS: &[(&str, bool)] = &[
    ("Sharpness", false),
    ("Looting", false),
    ("Smiting", false),
    ("Chains", false),
    ("Leeching", false),
    ("Committed", false),
    ("CriticalHit", false),
    ("FireAspect", false),
    ("Freezing", false),
    ("Stunning", false),
    ("Exploding", true),
    ("Swirling", true),
    ("Shockwave", true),
    ("Radiance", true),
    ("GravityMelee", true),
    ("AnimaConduitMelee", true),
    ("Power", false),
    ("Punch", false),
    ("Infinity", false),
    ("Multishot", false),
    ("RapidFire", false),
    ("Ricochet", false),
    ("Growing", false),
    ("ChainReaction", false),
    ("Gravity", true),
    ("AnimaConduitRanged", true),
    ("TempoTheft", true),
    ("Snowball", false),
    ("Swiftfooted", false),
    ("PotionBarrier", false),
    ("Deflecting", false),
    ("Burning", false),
    ("Cowardice", false),
    ("Explorer", false),
    ("FinalShout", true),
    ("DeathBarter", true),
];

const BUILTIN_ARMOR_PROPERTIES: &[&str] = &[
    "AllyDamageBoost",
    "AreaHeal",
    "ArrowsPerBundle",
    "HealthPotionBoost",
    "ItemCooldownDecrease",
    "MeleeAttackSpeedBoost",
    "MoveSpeedAura",
    "SoulGathering",
    "TeleportOnRoll",
    "DodgeInvulnerability",
];

impl ReferenceCatalog {
    /// Catalog seeded with the built-in tables
    pub fn builtin() -> Self {
        let items = BUILTIN_ITEMS
            .iter()
            .map(|&(key, kind, unique)| {
                let info = ItemInfo {
                    kind,
                    name: key.to_string(),
                    flavor: None,
                    icon: None,
                    unique,
                };
                (key.to_string(), info)
            })
            .collect();

        let enchantments = BUILTIN_ENCHANTMENTS
            .iter()
            .map(|&(id, powerful)| {
                let info = EnchantmentInfo {
                    name: id.to_string(),
                    description: None,
                    powerful,
                    icon: None,
                };
                (id.to_string(), info)
            })
            .collect();

        let armor_properties = BUILTIN_ARMOR_PROPERTIES
            .iter()
            .map(|&id| {
                let info = ArmorPropertyInfo {
                    name: id.to_string(),
                    description: None,
                };
                (id.to_string(), info)
            })
            .collect();

        ReferenceCatalog {
            items,
            enchantments,
            armor_properties,
        }
    }

    /// Parse a catalog from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a catalog from JSON text
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a catalog file; `.json` files are parsed as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json(&text)
        } else {
            Self::from_yaml(&text)
        }
    }

    /// Add every entry of `other`, replacing entries with the same key
    pub fn merge(&mut self, other: ReferenceCatalog) {
        self.items.extend(other.items);
        self.enchantments.extend(other.enchantments);
        self.armor_properties.extend(other.armor_properties);
    }
}

impl Catalog for ReferenceCatalog {
    fn item(&self, item_type: &str) -> Option<&ItemInfo> {
        self.items.get(item_type)
    }

    fn enchantment(&self, id: &str) -> Option<&EnchantmentInfo> {
        self.enchantments.get(id)
    }

    fn armor_property(&self, id: &str) -> Option<&ArmorPropertyInfo> {
        self.armor_properties.get(id)
    }
}
