//! # dungeons
//!
//! Minecraft Dungeons save editor library - container codec, item model and
//! round-trip export.
//!
//! This library provides functionality to:
//! - Decrypt and encrypt `.dat` character saves
//! - Parse the save JSON into typed items, currencies and levels
//! - Add, delete, duplicate and transfer items between inventory and storage
//! - Write edits back without disturbing fields it does not model
//!
//! ## Example
//!
//! ```no_run
//! use dungeons::{Location, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::load("Characters/2533274900000000.dat")?;
//!
//! // Query and modify save data
//! println!("Level: {}", session.document().player_level());
//! println!("Emeralds: {}", session.document().currency("Emerald"));
//!
//! session.document_mut().set_currency("Emerald", 99_999);
//! session.document_mut().set_player_level(50.0);
//!
//! // Move the first storage item into the inventory
//! session.set_active_view(Location::Storage);
//! if let Some(id) = session.document().storage_items().first().map(|item| item.id()) {
//!     session.transfer(id);
//! }
//!
//! // Back up the original file and write the edited one
//! let backup = session.save()?;
//! println!("Backup written to {}", backup.display());
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod catalog;
pub mod crypto;
mod fields;
pub mod formulas;
pub mod item;
pub mod save;
pub mod session;

// Re-export commonly used items
#[doc(inline)]
pub use backup::{backup_path, save_with_backup, write_atomic, BackupError};
#[doc(inline)]
pub use catalog::{
    Catalog, CatalogError, ItemKind, Localization, ReferenceCatalog, StringTable,
};
#[doc(inline)]
pub use crypto::{decode, decode_save, encode, encode_save, CryptoError};
#[doc(inline)]
pub use item::{
    ArmorProperty, Enchantment, EnchantmentSlot, EquipmentSlot, Item, ItemError, ItemId,
    PropertyRarity, Rarity,
};
#[doc(inline)]
pub use save::{
    AddOutcome, Currency, ItemFilter, Location, MoveOutcome, SaveDocument, SaveError, Selection,
    SelectionSlot, INVENTORY_CAPACITY,
};
#[doc(inline)]
pub use session::{Editor, Session, SessionError};
