//! Core CLI definitions

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use super::items::ItemsCommand;
use super::save::SaveCommand;

#[derive(Parser)]
#[command(name = "dungeons")]
#[command(about = "Minecraft Dungeons Save Editor", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save file operations (decrypt, encrypt, set)
    #[command(visible_alias = "s")]
    Save {
        #[command(subcommand)]
        command: SaveCommand,
    },

    /// Inspect a save file (level, power, currencies, equipment)
    #[command(visible_alias = "i")]
    Inspect {
        /// Path to .dat file
        input: PathBuf,

        /// Show full JSON output
        #[arg(short, long)]
        full: bool,
    },

    /// Inventory and storage chest operations
    #[command(visible_alias = "it")]
    Items {
        #[command(subcommand)]
        command: ItemsCommand,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Reference catalog file (YAML or JSON) used for item names and kinds
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Enable or disable timestamped backups when saving
        #[arg(long)]
        backup: Option<bool>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
