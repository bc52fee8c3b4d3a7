//! CLI argument definitions for dungeons
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;
mod items;
mod save;

pub use core::{Cli, Commands};
pub use items::{FilterArg, ItemTarget, ItemsCommand};
pub use save::SaveCommand;
