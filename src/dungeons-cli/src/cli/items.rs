//! Item command CLI definitions

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use dungeons::{ItemFilter, Location};

/// Which item to operate on
#[derive(Args)]
pub struct ItemTarget {
    /// Path to .dat file
    pub input: PathBuf,

    /// inventoryIndex of the item
    pub index: u32,

    /// Look the index up in the storage chest instead of the inventory
    #[arg(short, long)]
    pub storage: bool,

    /// Skip the timestamped backup for this write
    #[arg(long)]
    pub no_backup: bool,
}

impl ItemTarget {
    pub fn location(&self) -> Location {
        if self.storage {
            Location::Storage
        } else {
            Location::Inventory
        }
    }
}

#[derive(Subcommand)]
pub enum ItemsCommand {
    /// List unequipped items
    List {
        /// Path to .dat file
        input: PathBuf,

        /// List the storage chest instead of the inventory
        #[arg(short, long)]
        storage: bool,

        /// Only show one tab
        #[arg(short, long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },

    /// Move an item between inventory and storage chest
    Transfer(ItemTarget),

    /// Delete an item
    Delete(ItemTarget),

    /// Duplicate an item in place
    Duplicate(ItemTarget),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FilterArg {
    All,
    Melee,
    Armor,
    Ranged,
    Artifact,
    Enchanted,
}

impl From<FilterArg> for ItemFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => ItemFilter::All,
            FilterArg::Melee => ItemFilter::Melee,
            FilterArg::Armor => ItemFilter::Armor,
            FilterArg::Ranged => ItemFilter::Ranged,
            FilterArg::Artifact => ItemFilter::Artifact,
            FilterArg::Enchanted => ItemFilter::Enchanted,
        }
    }
}
