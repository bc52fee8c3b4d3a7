//! Item command handlers

use anyhow::{bail, Context, Result};
use std::path::Path;

use dungeons::{
    AddOutcome, Catalog, Item, ItemFilter, ItemId, Localization, Location, MoveOutcome,
    ReferenceCatalog, SaveDocument, StringTable,
};

use crate::cli::ItemTarget;
use crate::commands::save::{backup_enabled, load, write_session};
use crate::config::Config;

/// Built-in catalog, with the configured catalog file merged over it
pub fn load_catalog(config: &Config) -> Result<ReferenceCatalog> {
    let mut catalog = ReferenceCatalog::builtin();
    if let Some(path) = config.catalog() {
        let extra = ReferenceCatalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?;
        catalog.merge(extra);
    }
    Ok(catalog)
}

fn location_name(location: Location) -> &'static str {
    match location {
        Location::Inventory => "inventory",
        Location::Storage => "storage chest",
    }
}

/// Id of the item at `index` in a list
pub fn find(document: &SaveDocument, location: Location, index: u32) -> Result<ItemId> {
    document
        .item_at(location, index)
        .map(Item::id)
        .with_context(|| format!("No item at index {} in the {}", index, location_name(location)))
}

/// One-line summary of an item
pub fn describe(item: &Item, catalog: &dyn Catalog, localization: &dyn Localization) -> String {
    let name = item
        .display_name(catalog, localization)
        .unwrap_or_else(|_| item.item_type());
    let kind = item
        .kind(catalog)
        .map_or_else(|_| "unknown".to_string(), |kind| kind.to_string());

    let mut line = format!(
        "{:>3}  {:<28} {:<8} {:<7} power {:.0}",
        item.inventory_index().map_or_else(|| "-".to_string(), |i| i.to_string()),
        name,
        kind,
        item.rarity().to_string(),
        item.in_game_power()
    );
    let points = item.total_invested_points();
    if points > 0 {
        line.push_str(&format!("  {} pts", points));
    }
    if item.is_glided() {
        line.push_str("  glided");
    }
    line
}

/// Handle `items list` command
pub fn list(input: &Path, storage: bool, filter: ItemFilter) -> Result<()> {
    let catalog = load_catalog(&Config::load()?)?;
    let localization = StringTable::new();
    let session = load(input)?;
    let location = if storage {
        Location::Storage
    } else {
        Location::Inventory
    };

    let items = session.document().view(location, filter, &catalog);
    for item in &items {
        println!("{}", describe(item, &catalog, &localization));
    }
    println!("{} item(s) in the {}", items.len(), location_name(location));
    Ok(())
}

/// Handle `items transfer` command
pub fn transfer(target: &ItemTarget) -> Result<()> {
    let mut session = load(&target.input)?;
    let from = target.location();
    let id = find(session.document(), from, target.index)?;

    session.set_active_view(from);
    match session.transfer(id) {
        MoveOutcome::Moved { to, .. } => {
            write_session(&session, backup_enabled(target.no_backup)?)?;
            println!(
                "Moved item {} from the {} to the {}",
                target.index,
                location_name(from),
                location_name(to)
            );
        }
        MoveOutcome::CapacityExceeded => bail!("Inventory is full"),
        MoveOutcome::NotMovable => bail!("Item {} cannot be moved", target.index),
    }
    Ok(())
}

/// Handle `items delete` command
pub fn delete(target: &ItemTarget) -> Result<()> {
    let mut session = load(&target.input)?;
    let location = target.location();
    let id = find(session.document(), location, target.index)?;

    let Some(removed) = session.delete_item(id) else {
        bail!("Item {} cannot be deleted", target.index);
    };
    write_session(&session, backup_enabled(target.no_backup)?)?;
    println!(
        "Deleted {} from the {}",
        removed.item_type(),
        location_name(location)
    );
    Ok(())
}

/// Handle `items duplicate` command
pub fn duplicate(target: &ItemTarget) -> Result<()> {
    let mut session = load(&target.input)?;
    let location = target.location();
    let id = find(session.document(), location, target.index)?;

    match session.duplicate_item(id) {
        Some(AddOutcome::Added(copy)) => {
            let index = session
                .document()
                .item(copy)
                .and_then(Item::inventory_index)
                .unwrap_or_default();
            write_session(&session, backup_enabled(target.no_backup)?)?;
            println!("Duplicated item {} to index {}", target.index, index);
        }
        Some(AddOutcome::CapacityExceeded) => bail!("Inventory is full"),
        None => bail!("Item {} not found", target.index),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeons::Rarity;
    use serde_json::json;

    fn document() -> SaveDocument {
        let text = json!({
            "items": [
                {"type": "Sword", "power": 3.0, "rarity": "Rare", "upgraded": false,
                 "inventoryIndex": 0}
            ],
            "storageChestItems": [
                {"type": "MysteryBlade", "power": 1.0, "rarity": "Common", "upgraded": false,
                 "inventoryIndex": 0}
            ],
            "xp": 0
        })
        .to_string();
        SaveDocument::from_json(&text).unwrap()
    }

    #[test]
    fn test_find_by_index() {
        let doc = document();
        let id = find(&doc, Location::Inventory, 0).unwrap();
        assert_eq!(doc.item(id).unwrap().item_type(), "Sword");
        assert!(find(&doc, Location::Inventory, 1).is_err());
        assert!(find(&doc, Location::Storage, 0).is_ok());
    }

    #[test]
    fn test_describe_known_and_unknown() {
        let catalog = ReferenceCatalog::builtin();
        let mut strings = StringTable::new();
        let doc = document();

        let sword = &doc.items()[0];
        let name = catalog.item("Sword").unwrap().name.clone();
        strings.insert(name, "Iron Sword");
        let line = describe(sword, &catalog, &strings);
        assert!(line.contains("Iron Sword"));
        assert!(line.contains("melee"));
        assert!(line.contains("power 21"));

        let unknown = &doc.storage_items()[0];
        let line = describe(unknown, &catalog, &strings);
        assert!(line.contains("MysteryBlade"));
        assert!(line.contains("unknown"));
    }

    #[test]
    fn test_describe_new_item_has_index() {
        let catalog = ReferenceCatalog::builtin();
        let item = Item::new("Axe", 1.0, Rarity::Common);
        let line = describe(&item, &catalog, &StringTable::new());
        assert!(line.trim_start().starts_with('0'));
    }

    #[test]
    fn test_load_catalog_default() {
        let catalog = load_catalog(&Config::default()).unwrap();
        assert!(catalog.item("Sword").is_some());
    }
}
