//! Save document parsing, querying, and export.
//!
//! A [`SaveDocument`] binds the parts of the save JSON this library models
//! (`items`, `storageChestItems`, `currency`, `xp` and the tower progression
//! state) and keeps the whole original object as a passthrough remainder.
//! Export clones that remainder and overwrites only the owned keys, so every
//! other field is written back exactly as it was read.

mod collection;

pub use collection::{
    AddOutcome, ItemFilter, Location, MoveOutcome, Selection, SelectionSlot, INVENTORY_CAPACITY,
    RECENT_EQUIPPED_REGION,
};

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use crate::crypto::{self, CryptoError};
use crate::fields::{self, FieldError};
use crate::formulas;
use crate::item::{EquipmentSlot, Item, ItemId};

pub const ITEMS_KEY: &str = "items";
pub const STORAGE_KEY: &str = "storageChestItems";
pub const CURRENCY_KEY: &str = "currency";
pub const XP_KEY: &str = "xp";

/// JSON pointer to the tower progression state
pub const TOWER_POINTER: &str = "/missionStatesMap/thetower/missionStates/0";

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid save data at {path}: {message}")]
    Schema { path: String, message: String },

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

fn schema_error(path: impl Into<String>, message: impl fmt::Display) -> SaveError {
    SaveError::Schema {
        path: path.into(),
        message: message.to_string(),
    }
}

fn field_error(entry: &str, error: FieldError) -> SaveError {
    schema_error(error.located_under(entry), error.message)
}

/// One entry of the `currency` array
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Currency {
    #[serde(rename = "type")]
    pub currency_type: String,
    pub count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct CurrencyRecord {
    #[serde(rename = "type")]
    currency_type: String,
    count: u64,
}

impl Currency {
    pub fn new(currency_type: impl Into<String>, count: u64) -> Self {
        Currency {
            currency_type: currency_type.into(),
            count,
            extra: Map::new(),
        }
    }

    fn from_object(object: Map<String, Value>) -> Result<Self, FieldError> {
        let (record, extra): (CurrencyRecord, _) =
            fields::split_known(object, &["type", "count"])?;
        Ok(Currency {
            currency_type: record.currency_type,
            count: record.count,
            extra,
        })
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::deserialize(deserializer)?;
        Currency::from_object(object).map_err(de::Error::custom)
    }
}

/// Tower progression state, carried through without interpretation
#[derive(Debug, Clone, PartialEq)]
pub struct TowerProgress {
    state: Value,
    enabled: bool,
}

impl TowerProgress {
    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut Value {
        &mut self.state
    }

    /// Whether export writes this state back into the save
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// A loaded save with typed access to the fields this library owns
pub struct SaveDocument {
    pub(crate) items: Vec<Item>,
    pub(crate) storage_items: Vec<Item>,
    currencies: Vec<Currency>,
    xp: i64,
    tower: Option<TowerProgress>,
    remainder: Value,
    next_id: u64,
    revision: u64,
}

impl SaveDocument {
    /// Parse a save from decrypted JSON text
    ///
    /// Fails without producing a document if a modeled field is missing or
    /// malformed; the error names the offending location.
    pub fn from_json(text: &str) -> Result<Self, SaveError> {
        let root: Value = serde_json::from_str(text)?;
        let object = root
            .as_object()
            .ok_or_else(|| schema_error("$", "expected a JSON object"))?;

        let items = parse_items(object, ITEMS_KEY, true)?;
        let storage_items = parse_items(object, STORAGE_KEY, false)?;
        let currencies = parse_currencies(object)?;
        let xp = object
            .get(XP_KEY)
            .ok_or_else(|| schema_error(XP_KEY, "missing field"))?
            .as_i64()
            .ok_or_else(|| schema_error(XP_KEY, "expected an integer"))?;

        let tower = root.pointer(TOWER_POINTER).cloned().map(|state| TowerProgress {
            state,
            enabled: true,
        });

        let mut document = SaveDocument {
            items,
            storage_items,
            currencies,
            xp,
            tower,
            remainder: root,
            next_id: 1,
            revision: 0,
        };
        document.assign_ids();

        info!(
            items = document.items.len(),
            storage = document.storage_items.len(),
            xp = document.xp,
            "Parsed save document"
        );
        Ok(document)
    }

    /// Decrypt and parse a save container
    pub fn from_bytes(data: &[u8]) -> Result<Self, SaveError> {
        let text = crypto::decode_save(data)?;
        Self::from_json(&text)
    }

    fn assign_ids(&mut self) {
        let mut next = self.next_id;
        for item in self.items.iter_mut().chain(self.storage_items.iter_mut()) {
            item.set_id(ItemId(next));
            next += 1;
        }
        self.next_id = next;
    }

    pub(crate) fn allocate_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }

    /// Counter bumped by every mutation, for change notification
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Merge the current model into a copy of the original JSON
    pub fn export(&self) -> Result<Value, SaveError> {
        let mut root = self.remainder.clone();
        let object = root
            .as_object_mut()
            .ok_or_else(|| schema_error("$", "expected a JSON object"))?;

        object.insert(ITEMS_KEY.to_string(), serde_json::to_value(&self.items)?);
        if object.contains_key(STORAGE_KEY) || !self.storage_items.is_empty() {
            object.insert(
                STORAGE_KEY.to_string(),
                serde_json::to_value(&self.storage_items)?,
            );
        }
        if object.contains_key(CURRENCY_KEY) || !self.currencies.is_empty() {
            object.insert(
                CURRENCY_KEY.to_string(),
                serde_json::to_value(&self.currencies)?,
            );
        }
        object.insert(XP_KEY.to_string(), Value::from(self.xp));

        if let Some(tower) = self.tower.as_ref().filter(|t| t.enabled) {
            if let Some(slot) = root.pointer_mut(TOWER_POINTER) {
                *slot = tower.state.clone();
            }
        }

        debug!(revision = self.revision, "Exported save document");
        Ok(root)
    }

    /// Export as compact JSON text
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(&self.export()?)?)
    }

    /// Export and encrypt into a save container
    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveError> {
        Ok(crypto::encode_save(&self.to_json()?)?)
    }

    // Items

    /// Inventory list, including equipped items
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Storage chest list
    pub fn storage_items(&self) -> &[Item] {
        &self.storage_items
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items
            .iter()
            .chain(self.storage_items.iter())
            .find(|item| item.id() == id)
    }

    /// Mutable access to an item; counts as a mutation
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.touch();
        self.items
            .iter_mut()
            .chain(self.storage_items.iter_mut())
            .find(|item| item.id() == id)
    }

    /// The item equipped in `slot`, if any
    pub fn equipped(&self, slot: EquipmentSlot) -> Option<&Item> {
        self.items
            .iter()
            .find(|item| item.equipment_slot() == Some(slot))
    }

    pub fn equipped_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.is_equipped())
    }

    /// Displayed power of the equipped loadout
    pub fn player_power(&self) -> i64 {
        let gear = EquipmentSlot::GEAR.map(|slot| self.equipped(slot).map(Item::power));
        let artifacts = EquipmentSlot::ARTIFACTS.map(|slot| self.equipped(slot).map(Item::power));
        formulas::player_power(gear, artifacts)
    }

    // Level

    pub fn xp(&self) -> i64 {
        self.xp
    }

    pub fn set_xp(&mut self, xp: i64) {
        self.xp = xp.max(0);
        self.touch();
    }

    /// Displayed character level
    pub fn player_level(&self) -> f64 {
        formulas::to_in_game_level(self.xp)
    }

    pub fn set_player_level(&mut self, level: f64) {
        self.set_xp(formulas::to_serialized_level(level.max(1.0)));
    }

    // Currencies

    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    /// Count of a currency, zero when the save has no entry for it
    pub fn currency(&self, currency_type: &str) -> u64 {
        self.currencies
            .iter()
            .find(|c| c.currency_type == currency_type)
            .map_or(0, |c| c.count)
    }

    /// Set a currency count, adding an entry if needed
    pub fn set_currency(&mut self, currency_type: &str, count: u64) {
        match self
            .currencies
            .iter_mut()
            .find(|c| c.currency_type == currency_type)
        {
            Some(currency) => currency.count = count,
            None => self.currencies.push(Currency::new(currency_type, count)),
        }
        self.touch();
    }

    /// Remove a currency entry; returns whether one existed
    pub fn remove_currency(&mut self, currency_type: &str) -> bool {
        let before = self.currencies.len();
        self.currencies.retain(|c| c.currency_type != currency_type);
        let removed = self.currencies.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    // Tower progression

    pub fn tower(&self) -> Option<&TowerProgress> {
        self.tower.as_ref()
    }

    pub fn tower_mut(&mut self) -> Option<&mut TowerProgress> {
        self.touch();
        self.tower.as_mut()
    }

    /// Read-only view of the JSON as originally parsed
    pub fn original(&self) -> &Value {
        &self.remainder
    }
}

impl fmt::Debug for SaveDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveDocument")
            .field("items", &self.items.len())
            .field("storage_items", &self.storage_items.len())
            .field("currencies", &self.currencies)
            .field("xp", &self.xp)
            .field("player_level", &self.player_level())
            .field("tower", &self.tower.is_some())
            .field("revision", &self.revision)
            .finish()
    }
}

// Internal helper functions

fn parse_items(
    object: &Map<String, Value>,
    key: &str,
    required: bool,
) -> Result<Vec<Item>, SaveError> {
    let Some(value) = object.get(key) else {
        if required {
            return Err(schema_error(key, "missing field"));
        }
        return Ok(Vec::new());
    };

    let entries = value
        .as_array()
        .ok_or_else(|| schema_error(key, "expected an array"))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            fields::expect_object(entry)
                .and_then(Item::from_object)
                .map_err(|e| field_error(&format!("{}[{}]", key, i), e))
        })
        .collect()
}

fn parse_currencies(object: &Map<String, Value>) -> Result<Vec<Currency>, SaveError> {
    let Some(value) = object.get(CURRENCY_KEY) else {
        return Ok(Vec::new());
    };

    let entries = value
        .as_array()
        .ok_or_else(|| schema_error(CURRENCY_KEY, "expected an array"))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            fields::expect_object(entry)
                .and_then(Currency::from_object)
                .map_err(|e| field_error(&format!("{}[{}]", CURRENCY_KEY, i), e))
        })
        .collect()
}
