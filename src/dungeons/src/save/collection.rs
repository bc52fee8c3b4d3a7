//! Inventory and storage management.
//!
//! Both lists keep `inventoryIndex` dense (`0..n`) over their unequipped
//! items after every add, delete and transfer. Equipped items live in the
//! inventory list but are not index-managed. A [`Selection`] names up to
//! two items by id and is kept consistent as items move or disappear.

use tracing::{debug, warn};

use super::SaveDocument;
use crate::catalog::{Catalog, ItemKind};
use crate::item::{Item, ItemId};

/// Maximum number of unequipped items the inventory can hold
pub const INVENTORY_CAPACITY: usize = 300;

/// New inventory items are inserted no further back than this position
pub const RECENT_EQUIPPED_REGION: usize = 6;

/// The two index-managed lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Inventory,
    Storage,
}

impl Location {
    pub fn other(self) -> Location {
        match self {
            Self::Inventory => Self::Storage,
            Self::Storage => Self::Inventory,
        }
    }
}

/// Result of an add or duplicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(ItemId),
    /// The inventory is full; nothing was changed
    CapacityExceeded,
}

/// Result of a transfer between inventory and storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: Location, to: Location },
    /// The inventory is full; nothing was changed
    CapacityExceeded,
    /// The item is equipped or not in either list
    NotMovable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSlot {
    Primary,
    Secondary,
}

/// Primary and secondary item references used for comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    primary: Option<ItemId>,
    secondary: Option<ItemId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary(&self) -> Option<ItemId> {
        self.primary
    }

    pub fn secondary(&self) -> Option<ItemId> {
        self.secondary
    }

    pub fn get(&self, slot: SelectionSlot) -> Option<ItemId> {
        match slot {
            SelectionSlot::Primary => self.primary,
            SelectionSlot::Secondary => self.secondary,
        }
    }

    pub fn set(&mut self, slot: SelectionSlot, id: Option<ItemId>) {
        match slot {
            SelectionSlot::Primary => self.primary = id,
            SelectionSlot::Secondary => self.secondary = id,
        }
    }

    pub fn select_primary(&mut self, id: ItemId) {
        self.primary = Some(id);
    }

    pub fn select_secondary(&mut self, id: ItemId) {
        self.secondary = Some(id);
    }

    pub fn clear(&mut self) {
        self.primary = None;
        self.secondary = None;
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.slot_of(id).is_some()
    }

    /// First slot holding `id`
    pub fn slot_of(&self, id: ItemId) -> Option<SelectionSlot> {
        if self.primary == Some(id) {
            Some(SelectionSlot::Primary)
        } else if self.secondary == Some(id) {
            Some(SelectionSlot::Secondary)
        } else {
            None
        }
    }

    /// Point every slot holding `old` at `new`; returns whether any did
    pub fn replace(&mut self, old: ItemId, new: ItemId) -> bool {
        let mut replaced = false;
        for slot in [&mut self.primary, &mut self.secondary] {
            if *slot == Some(old) {
                *slot = Some(new);
                replaced = true;
            }
        }
        replaced
    }

    /// Clear every slot holding `id`; returns whether any did
    pub fn forget(&mut self, id: ItemId) -> bool {
        let mut cleared = false;
        for slot in [&mut self.primary, &mut self.secondary] {
            if *slot == Some(id) {
                *slot = None;
                cleared = true;
            }
        }
        cleared
    }
}

/// Inventory tabs of the editor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemFilter {
    #[default]
    All,
    Melee,
    Armor,
    Ranged,
    Artifact,
    Enchanted,
}

impl ItemFilter {
    /// Whether `item` belongs in this tab.
    ///
    /// Items whose type the catalog does not know only show up under
    /// `All` and `Enchanted`.
    pub fn matches(self, item: &Item, catalog: &dyn Catalog) -> bool {
        let kind = match self {
            Self::All => return true,
            Self::Enchanted => return item.is_enchanted(),
            Self::Melee => ItemKind::Melee,
            Self::Armor => ItemKind::Armor,
            Self::Ranged => ItemKind::Ranged,
            Self::Artifact => ItemKind::Artifact,
        };
        match item.kind(catalog) {
            Ok(k) => k == kind,
            Err(e) => {
                debug!(item = %item.id(), error = %e, "Item excluded from filtered view");
                false
            }
        }
    }
}

/// Position of `list[vec_pos]` among the list's unequipped items
fn managed_position(list: &[Item], vec_pos: usize) -> usize {
    list[..vec_pos]
        .iter()
        .filter(|item| !item.is_equipped())
        .count()
}

fn renumber_list(list: &mut [Item]) {
    let mut next = 0u32;
    for item in list.iter_mut().filter(|item| !item.is_equipped()) {
        item.set_inventory_index(Some(next));
        next += 1;
    }
}

impl SaveDocument {
    pub fn list(&self, location: Location) -> &[Item] {
        match location {
            Location::Inventory => &self.items,
            Location::Storage => &self.storage_items,
        }
    }

    fn list_mut(&mut self, location: Location) -> &mut Vec<Item> {
        match location {
            Location::Inventory => &mut self.items,
            Location::Storage => &mut self.storage_items,
        }
    }

    /// Which list holds `id`, and at which vector position
    pub fn location_of(&self, id: ItemId) -> Option<(Location, usize)> {
        [Location::Inventory, Location::Storage]
            .into_iter()
            .find_map(|location| {
                self.list(location)
                    .iter()
                    .position(|item| item.id() == id)
                    .map(|pos| (location, pos))
            })
    }

    /// Number of unequipped items in the inventory
    pub fn inventory_count(&self) -> usize {
        self.items.iter().filter(|item| !item.is_equipped()).count()
    }

    pub fn is_inventory_full(&self) -> bool {
        self.inventory_count() >= INVENTORY_CAPACITY
    }

    /// Unequipped items of a list that pass `filter`, in list order
    pub fn view(
        &self,
        location: Location,
        filter: ItemFilter,
        catalog: &dyn Catalog,
    ) -> Vec<&Item> {
        self.list(location)
            .iter()
            .filter(|item| !item.is_equipped() && filter.matches(item, catalog))
            .collect()
    }

    /// Item at a given `inventoryIndex` of a list
    pub fn item_at(&self, location: Location, index: u32) -> Option<&Item> {
        self.list(location)
            .iter()
            .find(|item| item.inventory_index() == Some(index))
    }

    /// Reassign `inventoryIndex` densely over a list's unequipped items
    pub fn renumber(&mut self, location: Location) {
        renumber_list(self.list_mut(location));
    }

    /// Insert a new item.
    ///
    /// With `copied_from`, the item goes to the source item's list and
    /// takes the source's place in the selection. Otherwise it goes to
    /// `target` and becomes the only selected item. Inventory inserts land
    /// at most at position [`RECENT_EQUIPPED_REGION`], storage inserts at
    /// the front.
    pub fn add_item(
        &mut self,
        target: Location,
        mut item: Item,
        copied_from: Option<ItemId>,
        selection: &mut Selection,
    ) -> AddOutcome {
        let location = copied_from
            .and_then(|source| self.location_of(source))
            .map_or(target, |(location, _)| location);

        if location == Location::Inventory && self.is_inventory_full() {
            warn!(
                capacity = INVENTORY_CAPACITY,
                "Inventory is full, item not added"
            );
            return AddOutcome::CapacityExceeded;
        }

        let id = self.allocate_id();
        item.set_id(id);
        item.unequip();

        let list = self.list_mut(location);
        let position = match location {
            Location::Inventory => RECENT_EQUIPPED_REGION.min(list.len()),
            Location::Storage => 0,
        };
        list.insert(position, item);
        renumber_list(list);

        match copied_from {
            Some(source) => {
                selection.replace(source, id);
            }
            None => {
                selection.clear();
                selection.select_primary(id);
            }
        }

        self.touch();
        debug!(item = %id, ?location, position, "Added item");
        AddOutcome::Added(id)
    }

    /// Insert a copy of `source` next to it; `None` if `source` is unknown
    pub fn duplicate_item(
        &mut self,
        source: ItemId,
        selection: &mut Selection,
    ) -> Option<AddOutcome> {
        let (location, _) = self.location_of(source)?;
        let copy = self.item(source)?.duplicate();
        Some(self.add_item(location, copy, Some(source), selection))
    }

    /// Remove an item from whichever list holds it.
    ///
    /// Equipped items and unknown ids are left alone and yield `None`.
    pub fn delete_item(&mut self, id: ItemId, selection: &mut Selection) -> Option<Item> {
        let (location, pos) = self.location_of(id)?;
        if self.list(location)[pos].is_equipped() {
            debug!(item = %id, "Equipped items cannot be deleted");
            return None;
        }

        let list = self.list_mut(location);
        let removed = list.remove(pos);
        renumber_list(list);
        selection.forget(id);

        self.touch();
        debug!(item = %id, ?location, "Deleted item");
        Some(removed)
    }

    /// Move an item between inventory and storage.
    ///
    /// The item goes to the front of the other list and both lists are
    /// renumbered. If it was selected while `active_view` shows the list it
    /// left, its selection slot moves to whichever item now holds its old
    /// index in that list (or clears if none does): selection follows the
    /// position on screen rather than the item.
    pub fn transfer(
        &mut self,
        id: ItemId,
        active_view: Location,
        selection: &mut Selection,
    ) -> MoveOutcome {
        let Some((from, pos)) = self.location_of(id) else {
            return MoveOutcome::NotMovable;
        };
        if self.list(from)[pos].is_equipped() {
            return MoveOutcome::NotMovable;
        }

        let to = from.other();
        if to == Location::Inventory && self.is_inventory_full() {
            warn!(
                capacity = INVENTORY_CAPACITY,
                "Inventory is full, item not transferred"
            );
            return MoveOutcome::CapacityExceeded;
        }

        let old_index = managed_position(self.list(from), pos) as u32;
        let item = self.list_mut(from).remove(pos);
        self.list_mut(to).insert(0, item);
        self.renumber(from);
        self.renumber(to);

        if let Some(slot) = selection.slot_of(id) {
            if active_view == from {
                let successor = self.item_at(from, old_index).map(Item::id);
                selection.set(slot, successor);
            }
        }

        self.touch();
        debug!(item = %id, ?from, ?to, "Transferred item");
        MoveOutcome::Moved { from, to }
    }
}
